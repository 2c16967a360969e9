use std::path::PathBuf;

/// Errors that can occur across the gap toolkit.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary surfaces it through `miette` diagnostics.
///
/// # Examples
///
/// ```
/// use gap_core::GapError;
///
/// let err = GapError::InvalidProbability(1.5);
/// assert!(err.to_string().contains("1.5"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum GapError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Malformed identity mapping file.
    #[error("mapping error on line {line}: {message}")]
    #[diagnostic(help("each line must hold two values: `name,identity` (use IGNORE as identity to drop a name)"))]
    Mapping {
        /// 1-based line number in the mapping file.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Not enough durations to fit a survival curve.
    #[error("insufficient data: {available} duration(s) available, at least 1 required")]
    #[diagnostic(help("an author needs at least two distinct activity dates"))]
    InsufficientData {
        /// Number of durations that were supplied.
        available: usize,
    },

    /// A probability outside `[0, 1]` (or NaN) was requested.
    #[error("invalid probability: {0} (expected a value in [0, 1])")]
    InvalidProbability(f64),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
