use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GapError;
use crate::Result;

/// Top-level configuration loaded from `.gap.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use gap_core::GapConfig;
///
/// let config = GapConfig::default();
/// assert_eq!(config.model.window_size, 20);
/// assert_eq!(config.report.active_within_days, 30);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapConfig {
    /// Predictive model settings.
    #[serde(default)]
    pub model: ModelConfig,
    /// Git history settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Report filtering settings.
    #[serde(default)]
    pub report: ReportConfig,
}

impl GapConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::FileNotFound`] if `path` does not exist,
    /// [`GapError::Io`] if the file cannot be read, or [`GapError::Toml`]
    /// if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gap_core::GapConfig;
    /// use std::path::Path;
    ///
    /// let config = GapConfig::from_file(Path::new(".gap.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GapError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use gap_core::GapConfig;
    ///
    /// let toml = r#"
    /// [model]
    /// window_size = 10
    /// "#;
    /// let config = GapConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.model.window_size, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Check value ranges that TOML types alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::Config`] if `window_size` is zero or a
    /// probability lies outside `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gap_core::GapConfig;
    ///
    /// let mut config = GapConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.model.window_size = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.model.window_size == 0 {
            return Err(GapError::Config(
                "model.window_size must be a positive integer".into(),
            ));
        }
        if let Some(p) = self
            .model
            .probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(GapError::Config(format!(
                "model.probabilities must lie in [0, 1], got {p}"
            )));
        }
        Ok(())
    }
}

/// Predictive model configuration.
///
/// # Examples
///
/// ```
/// use gap_core::ModelConfig;
///
/// let config = ModelConfig::default();
/// assert_eq!(config.window_size, 20);
/// assert_eq!(config.probabilities, vec![0.5, 0.7, 0.9]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of most recent gaps that define the model (default: 20).
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Probabilities to answer, in `[0, 1]` (default: 0.5, 0.7, 0.9).
    #[serde(default = "default_probabilities")]
    pub probabilities: Vec<f64>,
}

fn default_window_size() -> usize {
    20
}

fn default_probabilities() -> Vec<f64> {
    vec![0.5, 0.7, 0.9]
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            probabilities: default_probabilities(),
        }
    }
}

/// Git history configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Branches to analyse; empty means every ref.
    #[serde(default)]
    pub branches: Vec<String>,
    /// CSV file merging author names into identities.
    pub mapping: Option<PathBuf>,
}

/// Report filtering configuration.
///
/// # Examples
///
/// ```
/// use gap_core::ReportConfig;
///
/// assert_eq!(ReportConfig::default().active_within_days, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Only report authors active during the last N days (default: 30).
    #[serde(default = "default_active_within_days")]
    pub active_within_days: u32,
}

fn default_active_within_days() -> u32 {
    30
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            active_within_days: default_active_within_days(),
        }
    }
}
