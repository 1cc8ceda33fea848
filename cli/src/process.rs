use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use sous_core::llm::CacheStats;
use sous_core::{
    create_provider, exclude_sources, group_by_source_url, load_raw_recipes, load_recipes,
    sample, AttributeTransformer, CompletionProvider, Coordinator, LlmConfig, RecipeTransformer,
    RunSummary, SinkPaths, Sinks,
};

pub struct IngredientsArgs {
    pub input: PathBuf,
    pub exclude: Option<PathBuf>,
    pub limit: Option<usize>,
    pub workers: usize,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub classify_variants: bool,
}

fn provider() -> Result<Arc<dyn CompletionProvider>> {
    let config = LlmConfig::from_env().context("Failed to load completion service config")?;
    let provider = create_provider(&config).context("Failed to create completion provider")?;

    tracing::info!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        cache_dir = ?config.cache_dir,
        "completion provider ready"
    );
    Ok(Arc::from(provider))
}

fn open_sinks(output_dir: &Path, prefix: &str, log_dir: &Path) -> Result<(Arc<Sinks>, PathBuf)> {
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let output = output_dir.join(format!("{}_{}.yaml", prefix, timestamp));
    let paths = SinkPaths::new(output.clone(), log_dir);

    let sinks = Sinks::open(&paths).context("Failed to open output files")?;
    Ok((Arc::new(sinks), output))
}

fn report(summary: &RunSummary, output: &Path) {
    println!(
        "Processed {} items: {} succeeded, {} failed, {} recipes written to {}",
        summary.items,
        summary.succeeded,
        summary.failed,
        summary.recipes_written,
        output.display()
    );
}

pub async fn ingredients(args: IngredientsArgs) -> Result<()> {
    let mut recipes = load_raw_recipes(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    if let Some(exclude) = &args.exclude {
        let reference = load_raw_recipes(exclude)
            .with_context(|| format!("Failed to load {}", exclude.display()))?;
        let before = recipes.len();
        recipes = exclude_sources(recipes, &reference);
        tracing::info!(
            excluded = before - recipes.len(),
            remaining = recipes.len(),
            "filtered already-processed recipes"
        );
    }

    if let Some(limit) = args.limit {
        recipes = sample(recipes, limit, &mut rand::rng());
    }

    let provider = provider()?;
    let (sinks, output) = open_sinks(&args.output_dir, "ing_proc_recipes", &args.log_dir)?;

    let transformer =
        RecipeTransformer::new(provider).with_variant_classification(args.classify_variants);
    let summary = Coordinator::new(transformer, sinks)
        .run(recipes, args.workers)
        .await;

    report(&summary, &output);
    Ok(())
}

pub async fn attributes(input: &Path, workers: usize, output_dir: &Path, log_dir: &Path) -> Result<()> {
    let recipes =
        load_recipes(input).with_context(|| format!("Failed to load {}", input.display()))?;
    let groups = group_by_source_url(recipes);
    tracing::info!(groups = groups.len(), "grouped recipes by source URL");

    let provider = provider()?;
    let (sinks, output) = open_sinks(output_dir, "attr_proc_recipes", log_dir)?;

    let summary = Coordinator::new(AttributeTransformer::new(provider), sinks)
        .run(groups, workers)
        .await;

    report(&summary, &output);
    Ok(())
}

pub fn cache_stats(cache_dir: Option<PathBuf>) {
    let dir = match cache_dir.or_else(|| std::env::var("SOUS_CACHE_DIR").ok().map(PathBuf::from)) {
        Some(dir) if dir.as_os_str().eq_ignore_ascii_case("none") => {
            println!("Completion caching is disabled");
            return;
        }
        Some(dir) => dir,
        None => LlmConfig::default_cache_dir(),
    };

    let stats = CacheStats::scan(&dir);
    println!("{} cached completions in {}", stats.cached_responses, dir.display());
}
