//! Error types for brewdeck

use thiserror::Error;

/// Main result type used throughout the brewdeck library.
///
/// This is a convenience type alias that uses `BrewDeckError` as the error
/// type. Most functions in this library return this result type.
pub type Result<T> = std::result::Result<T, BrewDeckError>;

/// Main error type for the brewdeck library.
///
/// This enum encompasses all possible errors that can occur within the
/// library, providing a unified error handling interface with automatic
/// conversions from the underlying error types.
#[derive(Error, Debug)]
pub enum BrewDeckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Errors related to configuration loading, parsing, and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {path}")]
    InvalidFile { path: std::path::PathBuf },

    #[error("Invalid catalog URL: {url}")]
    InvalidCatalogUrl { url: String },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Host package manager not available: {message}")]
    HostManagerUnavailable { message: String },
}

/// Errors raised by source fetchers.
///
/// A fetch failure is recoverable at the orchestrator level: a failed
/// source degrades to an empty document at boot instead of aborting the
/// whole refresh. The fetcher itself never retries.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Command failed: {program} {args}: {message}")]
    CommandFailed {
        program: String,
        args: String,
        message: String,
    },

    #[error("Command exited with status {status}: {program}")]
    NonZeroExit { program: String, status: i32 },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed payload from {source_name}: {message}")]
    MalformedPayload {
        source_name: String,
        message: String,
    },
}

/// Errors raised by the disk cache.
///
/// Cache write failures are always non-fatal to callers; this type exists
/// so they can be logged with context before being swallowed.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache directory unavailable: {path}")]
    DirectoryUnavailable { path: std::path::PathBuf },

    #[error("Cache write failed for {name}: {message}")]
    WriteFailed { name: String, message: String },
}

/// Errors related to manifest reading and parsing.
///
/// Fatal at boot (there is no meaningful package list without the
/// manifest); non-fatal during background re-parses, which keep the
/// previous result.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {path}")]
    NotFound { path: String },

    #[error("Cannot read manifest {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Failed to download manifest from {url}: {message}")]
    DownloadFailed { url: String, message: String },
}

/// Errors raised by package mutations (install/update/remove).
///
/// Batch operations report these per item and keep going.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Failed to {operation} {name}: {message}")]
    OperationFailed {
        operation: String,
        name: String,
        message: String,
    },

    #[error("Tap installation failed: {tap}: {message}")]
    TapInstallFailed { tap: String, message: String },
}

/// Trait for validating configuration and data structures.
pub trait Validate {
    type Error;
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
