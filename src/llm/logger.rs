//! Optional prompt/response logging.
//!
//! Logging is fire-and-forget: the generation service hands a [`LogEntry`]
//! to a blocking task and never waits for it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Everything recorded for one backend exchange.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub backend: String,
    pub diff: String,
    pub prompt: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(backend: &str, diff: &str, prompt: &str, response: &str) -> Self {
        Self {
            backend: backend.to_string(),
            diff: diff.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn render(&self) -> String {
        format!(
            "[Backend]\n{}\n\n[Timestamp]\n{}\n\n[Diff]\n{}\n\n[Prompt]\n{}\n\n[Response]\n{}\n",
            self.backend,
            self.timestamp.to_rfc3339(),
            self.diff,
            self.prompt,
            self.response
        )
    }
}

/// Sink for prompt/response logs.
#[cfg_attr(test, mockall::automock)]
pub trait ResponseLogger: Send + Sync {
    fn log(&self, entry: &LogEntry) -> io::Result<()>;
}

/// Writes one file per exchange into a directory.
#[derive(Debug, Clone)]
pub struct FileResponseLogger {
    dir: PathBuf,
}

impl FileResponseLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Log directory from `COMMITCRAFT_LOG_DIR`, else `<tmp>/commitcraft-logs`.
    pub fn default_dir() -> PathBuf {
        std::env::var_os(crate::config::LOG_DIR_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("commitcraft-logs"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(entry: &LogEntry) -> String {
        let backend: String = entry
            .backend
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        format!(
            "{}_{}.log",
            entry.timestamp.format("%Y%m%d_%H%M%S%.3f"),
            backend
        )
    }
}

impl ResponseLogger for FileResponseLogger {
    /// Write atomically: temp file in the target directory, then rename.
    fn log(&self, entry: &LogEntry) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(entry));

        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(entry.render().as_bytes())?;
        file.persist(&path).map_err(|e| e.error)?;

        debug!("Wrote generation log to {}", path.display());
        Ok(())
    }
}

/// Hand `entry` to `logger` on a blocking task without waiting for it.
pub fn spawn_log(logger: Arc<dyn ResponseLogger>, entry: LogEntry) {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = logger.log(&entry) {
            warn!("Failed to write generation log: {}", e);
        }
    });
}
