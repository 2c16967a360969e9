//! Predictive model: inter-activity gaps and their survival analysis.
//!
//! Turns a contributor's activity dates into a bounded sample of gaps
//! ([`window`]), fits a Kaplan-Meier survival curve over that sample
//! ([`survival`]), and combines the resulting duration quantiles with the
//! last known activity into calendar forecasts ([`forecast`]).
//!
//! Everything here is pure: no I/O, no shared state between authors.

pub mod forecast;
pub mod survival;
pub mod window;
