//! Shared output destinations for a processing run.
//!
//! Three independent writers, each behind its own lock: the recipe output
//! stream, the diagnostic log and the success log. Locks are held only for
//! a synchronous write and flush, never across an await point.

use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::types::Recipe;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode recipe {name:?}: {source}")]
    Encoding {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Where a run writes its files.
#[derive(Debug, Clone)]
pub struct SinkPaths {
    pub output: PathBuf,
    pub diagnostic_log: PathBuf,
    pub success_log: PathBuf,
}

impl SinkPaths {
    /// `<log_dir>/processor.log` and `<log_dir>/processor_success.log`
    /// alongside the given output file.
    pub fn new(output: PathBuf, log_dir: &Path) -> Self {
        Self {
            output,
            diagnostic_log: log_dir.join("processor.log"),
            success_log: log_dir.join("processor_success.log"),
        }
    }
}

type Writer = Box<dyn Write + Send>;

/// The three shared writers of a run.
pub struct Sinks {
    output: Mutex<Writer>,
    diagnostic: Mutex<Writer>,
    success: Mutex<Writer>,
}

impl std::fmt::Debug for Sinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sinks").finish_non_exhaustive()
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicked writer leaves at worst a partial line behind
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ensure_parent(path: &Path) -> Result<(), SinkError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|source| SinkError::Open {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

impl Sinks {
    /// Open the run's files. The output file and diagnostic log are
    /// truncated; the success log is appended to across runs.
    pub fn open(paths: &SinkPaths) -> Result<Self, SinkError> {
        let create = |path: &Path| -> Result<File, SinkError> {
            ensure_parent(path)?;
            File::create(path).map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })
        };

        let output = create(&paths.output)?;
        let diagnostic = create(&paths.diagnostic_log)?;

        ensure_parent(&paths.success_log)?;
        let success = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.success_log)
            .map_err(|source| SinkError::Open {
                path: paths.success_log.clone(),
                source,
            })?;

        Ok(Self::from_writers(output, diagnostic, success))
    }

    pub fn from_writers(
        output: impl Write + Send + 'static,
        diagnostic: impl Write + Send + 'static,
        success: impl Write + Send + 'static,
    ) -> Self {
        Self {
            output: Mutex::new(Box::new(output)),
            diagnostic: Mutex::new(Box::new(diagnostic)),
            success: Mutex::new(Box::new(success)),
        }
    }

    fn write_line(mutex: &Mutex<Writer>, line: &str) {
        let mut writer = lock(mutex);
        let result = writeln!(writer, "{}", line).and_then(|()| writer.flush());
        drop(writer);

        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write log line");
        }
    }

    /// Free-form diagnostic message.
    pub fn info(&self, message: &str) {
        Self::write_line(&self.diagnostic, &format!("INFO::{}", message));
    }

    /// Diagnostic record of a failed item.
    pub fn record_failure(&self, worker: usize, name: &str, error: &dyn Display) {
        Self::write_line(
            &self.diagnostic,
            &format!("ERROR::{}: processing recipe {}: {}", worker, name, error),
        );
    }

    /// Diagnostic record of a recipe that could not be written.
    pub fn record_write_failure(&self, worker: usize, error: &SinkError) {
        Self::write_line(&self.diagnostic, &format!("ERROR::{}: {}", worker, error));
    }

    /// Success record of a finished item.
    pub fn record_success(&self, worker: usize, name: &str, source_url: &str) {
        Self::write_line(&self.success, &format!("{}:{}::{}", worker, name, source_url));
    }

    /// Append recipes to the output, each as its own single-element YAML
    /// list document.
    ///
    /// All recipes go out under one lock acquisition so an item's variants
    /// stay contiguous. A recipe that fails to encode or write is skipped and
    /// reported; the rest are still written. Returns how many were written.
    pub fn write_recipes(&self, recipes: &[Recipe]) -> (usize, Vec<SinkError>) {
        let mut written = 0;
        let mut errors = Vec::new();

        let mut output = lock(&self.output);
        for recipe in recipes {
            let document = match serde_yaml::to_string(std::slice::from_ref(recipe)) {
                Ok(document) => document,
                Err(source) => {
                    errors.push(SinkError::Encoding {
                        name: recipe.name.clone(),
                        source,
                    });
                    continue;
                }
            };

            match output
                .write_all(b"---\n")
                .and_then(|()| output.write_all(document.as_bytes()))
            {
                Ok(()) => written += 1,
                Err(e) => errors.push(e.into()),
            }
        }
        if let Err(e) = output.flush() {
            errors.push(e.into());
        }
        drop(output);

        (written, errors)
    }
}

/// In-memory writer whose contents can be read back while a clone is owned
/// by a `Sinks`.
#[derive(Debug, Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.0)).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_recipe_stream;
    use tempfile::TempDir;

    fn memory_sinks() -> (Sinks, MemorySink, MemorySink, MemorySink) {
        let output = MemorySink::new();
        let diagnostic = MemorySink::new();
        let success = MemorySink::new();
        let sinks = Sinks::from_writers(output.clone(), diagnostic.clone(), success.clone());
        (sinks, output, diagnostic, success)
    }

    fn recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_log_line_formats() {
        let (sinks, _, diagnostic, success) = memory_sinks();
        sinks.info("0: Input:\n0, beef\n");
        sinks.record_failure(2, "Stew", &"empty response");
        sinks.record_success(1, "Stew", "https://example.com/stew");

        assert_eq!(
            diagnostic.contents(),
            "INFO::0: Input:\n0, beef\n\nERROR::2: processing recipe Stew: empty response\n"
        );
        assert_eq!(success.contents(), "1:Stew::https://example.com/stew\n");
    }

    #[test]
    fn test_recipes_written_as_single_element_documents() {
        let (sinks, output, _, _) = memory_sinks();
        let (written, errors) = sinks.write_recipes(&[recipe("Beef Stew"), recipe("Pork Stew")]);
        assert_eq!(written, 2);
        assert!(errors.is_empty());

        let text = output.contents();
        assert_eq!(text.matches("---\n").count(), 2);
        assert!(text.contains("- name: Beef Stew"));

        let decoded = parse_recipe_stream(&text).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].name, "Pork Stew");
    }

    #[test]
    fn test_open_truncates_diagnostic_and_appends_success() {
        let dir = TempDir::new().unwrap();
        let paths = SinkPaths::new(dir.path().join("recipes/out.yaml"), &dir.path().join("logs"));

        {
            let sinks = Sinks::open(&paths).unwrap();
            sinks.info("first run");
            sinks.record_success(0, "A", "https://example.com/a");
        }
        {
            let sinks = Sinks::open(&paths).unwrap();
            sinks.info("second run");
            sinks.record_success(0, "B", "https://example.com/b");
        }

        let diagnostic = fs::read_to_string(&paths.diagnostic_log).unwrap();
        assert_eq!(diagnostic, "INFO::second run\n");

        let success = fs::read_to_string(&paths.success_log).unwrap();
        assert_eq!(success, "0:A::https://example.com/a\n0:B::https://example.com/b\n");
        assert!(paths.output.exists());
    }

    #[test]
    fn test_open_reports_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        // a regular file cannot act as a directory
        let paths = SinkPaths::new(blocker.join("out.yaml"), dir.path());
        assert!(matches!(Sinks::open(&paths), Err(SinkError::Open { .. })));
    }
}
