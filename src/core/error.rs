use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the relauncher.
/// Every module returns `Result<T, RelaunchError>`.
#[derive(Debug, Error)]
pub enum RelaunchError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Formats ─────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Relaunch pipeline ───────────────────────────────
    #[error("Unable to query releases and no cached releases found: {0}")]
    CatalogUnavailable(String),

    #[error("Unable to resolve release {release}: {reason}")]
    VersionResolution { release: String, reason: String },

    #[error("Unable to extract wrapper into {path:?}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("Unable to launch child process: {0}")]
    Launch(String),

    #[error("Configuration I/O failed at {path:?}: {reason}")]
    ConfigIo { path: PathBuf, reason: String },

    #[error("Configuration aborted: {0}")]
    ConfigurationAborted(String),

    // ── Java ────────────────────────────────────────────
    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type RelaunchResult<T> = Result<T, RelaunchError>;

impl From<std::io::Error> for RelaunchError {
    fn from(source: std::io::Error) -> Self {
        RelaunchError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl RelaunchError {
    /// Whether this error aborts the relaunch attempt.
    ///
    /// Configuration I/O is the only recoverable kind: defaults are
    /// substituted and the run continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RelaunchError::ConfigIo { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RelaunchError::Io {
            path: path.into(),
            source,
        }
    }
}
