use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire installer backend.
/// Every module returns `Result<T, InstallerError>`.
#[derive(Debug, Error)]
pub enum InstallerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    // ── Pack locator ────────────────────────────────────
    #[error("Unsupported modpack locator: {0}")]
    UnsupportedLocator(String),

    // ── Manifest ────────────────────────────────────────
    #[error("Invalid pack manifest: {0}")]
    InvalidManifest(String),

    #[error("Unsupported pack manifest: {0}")]
    UnsupportedManifest(String),

    // ── Instance ────────────────────────────────────────
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Instance already exists: {0}")]
    InstanceExists(String),

    // ── Loader ──────────────────────────────────────────
    #[error("Loader install failed: {0}")]
    DependencyInstallFailed(String),

    // ── Overlay ─────────────────────────────────────────
    #[error("Overlay write failed at {path:?}: {reason}")]
    OverlayWriteFailed { path: PathBuf, reason: String },

    // ── Mod metadata ────────────────────────────────────
    #[error("Metadata resolution failed for {project_id}/{file_id}: {reason}")]
    MetadataResolutionFailed {
        project_id: u32,
        file_id: u32,
        reason: String,
    },

    // ── Download integrity ──────────────────────────────
    #[error("Size mismatch for {path:?}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type InstallerResult<T> = Result<T, InstallerError>;

impl From<std::io::Error> for InstallerError {
    fn from(source: std::io::Error) -> Self {
        InstallerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
