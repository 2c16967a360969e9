//! Core types, configuration, and error handling for the gap toolkit.
//!
//! This crate provides the shared foundation used by all other gap crates:
//! - [`GapError`] — unified error type using `thiserror` and `miette`
//! - [`GapConfig`] — configuration loaded from `.gap.toml`
//! - Shared types: [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{GapConfig, HistoryConfig, ModelConfig, ReportConfig};
pub use error::GapError;
pub use types::OutputFormat;

/// A convenience `Result` type for gap operations.
pub type Result<T> = std::result::Result<T, GapError>;
