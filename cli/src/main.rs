mod process;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sous")]
#[command(about = "Normalize scraped recipes with a completion service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse raw ingredient lines into structured recipe variants
    Ingredients {
        /// YAML list of scraped recipes
        #[arg(long)]
        input: PathBuf,
        /// Skip recipes whose source URL appears in this YAML list
        #[arg(long)]
        exclude: Option<PathBuf>,
        /// Process a random sample of at most this many recipes
        #[arg(long)]
        limit: Option<usize>,
        /// Number of concurrent workers
        #[arg(long, default_value = "3")]
        workers: usize,
        #[arg(long, default_value = "recipes")]
        output_dir: PathBuf,
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
        /// Also classify each variant's dietary restrictions (one extra request per recipe)
        #[arg(long)]
        classify_variants: bool,
    },
    /// Recompute dietary flags for structured recipes, grouped by source page
    Attributes {
        /// YAML stream of structured recipes
        #[arg(long)]
        input: PathBuf,
        /// Number of concurrent workers
        #[arg(long, default_value = "2")]
        workers: usize,
        #[arg(long, default_value = "recipes")]
        output_dir: PathBuf,
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },
    /// Show how many completions are cached on disk
    CacheStats {
        /// Cache directory (default: SOUS_CACHE_DIR or ~/.sous/llm-cache)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingredients {
            input,
            exclude,
            limit,
            workers,
            output_dir,
            log_dir,
            classify_variants,
        } => {
            process::ingredients(process::IngredientsArgs {
                input,
                exclude,
                limit,
                workers,
                output_dir,
                log_dir,
                classify_variants,
            })
            .await?;
        }
        Commands::Attributes {
            input,
            workers,
            output_dir,
            log_dir,
        } => {
            process::attributes(&input, workers, &output_dir, &log_dir).await?;
        }
        Commands::CacheStats { cache_dir } => {
            process::cache_stats(cache_dir);
        }
    }

    Ok(())
}
