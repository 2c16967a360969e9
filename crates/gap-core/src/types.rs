use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use gap_core::OutputFormat;
///
/// let fmt: OutputFormat = "csv".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Csv);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable aligned table.
    #[default]
    Text,
    /// Comma-separated values with a header row.
    Csv,
    /// JSON object keyed by author.
    Json,
    /// GitHub-flavored Markdown table.
    Markdown,
    /// Terminal chart of past activity and forecast bands.
    Timeline,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Timeline => write!(f, "timeline"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "timeline" | "plot" => Ok(OutputFormat::Timeline),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
