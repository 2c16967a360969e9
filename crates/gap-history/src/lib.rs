//! Git history input: per-author activity dates.
//!
//! Mines commit history using git2, merges author names into identities
//! from a mapping file, and groups the resulting activity dates per
//! identity, ready for the predictive model.

pub mod activity;
pub mod identity;
pub mod mining;
