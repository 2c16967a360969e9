//! Kaplan-Meier survival estimation over fully observed gaps.
//!
//! The curve is a right-continuous step function `S(t)`, the estimated
//! probability that a gap exceeds `t` days. With no censored observations
//! every at-risk item at the largest gap is an event, so the final
//! survival value is exactly `0.0`.
//!
//! # Examples
//!
//! ```
//! use gap_model::survival::{Quantile, SurvivalCurve};
//! use gap_model::window::DurationSample;
//!
//! let sample = DurationSample::from(vec![1, 2, 2, 3, 5]);
//! let curve = SurvivalCurve::fit(&sample).unwrap();
//!
//! assert_eq!(curve.quantile(0.5).unwrap(), Quantile::Resolved(2));
//! assert_eq!(curve.quantile(0.99).unwrap(), Quantile::Resolved(5));
//! ```

use std::fmt;

use gap_core::{GapError, Result};
use serde::Serialize;

use crate::window::DurationSample;

/// Slack allowed when comparing `S(t)` against `1 - p`.
///
/// Absorbs rounding accumulated by the cumulative product so that, e.g.,
/// `S(t) = 0.4` satisfies `S(t) <= 1 - 0.6`.
const TOLERANCE: f64 = 1e-12;

/// One step of the survival curve, at a distinct observed gap.
///
/// # Examples
///
/// ```
/// use gap_model::survival::SurvivalStep;
///
/// let step = SurvivalStep { duration: 2, at_risk: 4, events: 2, survival: 0.4 };
/// assert_eq!(step.at_risk - step.events, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalStep {
    /// Gap length in days.
    pub duration: u64,
    /// Gaps with length `>= duration`.
    pub at_risk: usize,
    /// Gaps with length `== duration`.
    pub events: usize,
    /// `S(duration)`, the cumulative product up to this step.
    pub survival: f64,
}

/// Result of inverting the survival curve at a probability.
///
/// Serializes as the number of days, or `null` when unresolved.
///
/// # Examples
///
/// ```
/// use gap_model::survival::Quantile;
///
/// assert_eq!(Quantile::Resolved(3).days(), Some(3));
/// assert_eq!(Quantile::Unresolved.days(), None);
/// assert_eq!(Quantile::Unresolved.to_string(), "unresolved");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "Option<u64>")]
pub enum Quantile {
    /// Smallest observed gap `t` with `S(t) <= 1 - p`.
    Resolved(u64),
    /// The requested probability lies beyond what the sample supports.
    Unresolved,
}

impl Quantile {
    /// The resolved number of days, if any.
    pub fn days(self) -> Option<u64> {
        match self {
            Quantile::Resolved(days) => Some(days),
            Quantile::Unresolved => None,
        }
    }
}

impl From<Quantile> for Option<u64> {
    fn from(quantile: Quantile) -> Self {
        quantile.days()
    }
}

impl fmt::Display for Quantile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantile::Resolved(days) => write!(f, "{days}"),
            Quantile::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Kaplan-Meier survival curve fitted on a [`DurationSample`].
///
/// Built once, then only queried. Steps are ordered by strictly
/// increasing duration and have non-increasing survival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivalCurve {
    steps: Vec<SurvivalStep>,
}

impl SurvivalCurve {
    /// Fit the curve, treating every gap as an observed event.
    ///
    /// Equal gaps are aggregated into a single step. At each distinct gap
    /// `t_i` the survival is multiplied by `1 - d_i / n_i`, where `d_i`
    /// counts gaps equal to `t_i` and `n_i` counts gaps `>= t_i`.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::InsufficientData`] if the sample is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use gap_model::survival::SurvivalCurve;
    /// use gap_model::window::DurationSample;
    ///
    /// let curve = SurvivalCurve::fit(&DurationSample::from(vec![1, 2, 2, 3, 5])).unwrap();
    /// let survival: Vec<f64> = curve.steps().iter().map(|s| s.survival).collect();
    /// assert_eq!(survival.len(), 4);
    /// assert_eq!(survival[3], 0.0);
    ///
    /// assert!(SurvivalCurve::fit(&DurationSample::default()).is_err());
    /// ```
    pub fn fit(sample: &DurationSample) -> Result<Self> {
        if sample.is_empty() {
            return Err(GapError::InsufficientData { available: 0 });
        }

        let mut sorted = sample.as_slice().to_vec();
        sorted.sort_unstable();

        let total = sorted.len();
        let mut steps = Vec::new();
        let mut survival = 1.0;

        let mut i = 0;
        while i < total {
            let duration = sorted[i];
            let at_risk = total - i;

            let mut j = i;
            while j < total && sorted[j] == duration {
                j += 1;
            }
            let events = j - i;

            survival *= 1.0 - (events as f64 / at_risk as f64);
            steps.push(SurvivalStep {
                duration,
                at_risk,
                events,
                survival,
            });

            i = j;
        }

        tracing::trace!(gaps = total, steps = steps.len(), "fitted survival curve");

        Ok(Self { steps })
    }

    /// The steps of the curve, by increasing duration.
    pub fn steps(&self) -> &[SurvivalStep] {
        &self.steps
    }

    /// Evaluate `S(t)`.
    ///
    /// Returns `1.0` below the smallest observed gap and holds the value of
    /// the last step at or before `t` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use gap_model::survival::SurvivalCurve;
    /// use gap_model::window::DurationSample;
    ///
    /// let curve = SurvivalCurve::fit(&DurationSample::from(vec![2, 4])).unwrap();
    /// assert_eq!(curve.survival_at(1), 1.0);
    /// assert_eq!(curve.survival_at(3), 0.5);
    /// assert_eq!(curve.survival_at(10), 0.0);
    /// ```
    pub fn survival_at(&self, time: u64) -> f64 {
        let upto = self.steps.partition_point(|step| step.duration <= time);
        match upto {
            0 => 1.0,
            n => self.steps[n - 1].survival,
        }
    }

    /// Smallest observed gap `t` such that `S(t) <= 1 - p`.
    ///
    /// Boundaries: `p == 0` resolves to `0` days, since `S(0) <= 1` always
    /// holds. `p == 1` is [`Quantile::Unresolved`]: a finite sample cannot
    /// promise certain activity, even though its last step reaches zero.
    /// When no step drops low enough the answer is also unresolved, never
    /// the largest observed gap.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::InvalidProbability`] if `p` is NaN or outside
    /// `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gap_model::survival::{Quantile, SurvivalCurve};
    /// use gap_model::window::DurationSample;
    ///
    /// let curve = SurvivalCurve::fit(&DurationSample::from(vec![1, 2, 2, 3, 5])).unwrap();
    /// assert_eq!(curve.quantile(0.8).unwrap(), Quantile::Resolved(3));
    /// assert_eq!(curve.quantile(0.0).unwrap(), Quantile::Resolved(0));
    /// assert_eq!(curve.quantile(1.0).unwrap(), Quantile::Unresolved);
    /// assert!(curve.quantile(-0.1).is_err());
    /// ```
    pub fn quantile(&self, p: f64) -> Result<Quantile> {
        if !(0.0..=1.0).contains(&p) {
            return Err(GapError::InvalidProbability(p));
        }
        if p == 0.0 {
            return Ok(Quantile::Resolved(0));
        }
        if p == 1.0 {
            return Ok(Quantile::Unresolved);
        }

        let target = 1.0 - p;
        let found = self
            .steps
            .iter()
            .find(|step| step.survival <= target + TOLERANCE)
            .map_or(Quantile::Unresolved, |step| {
                Quantile::Resolved(step.duration)
            });

        Ok(found)
    }

    /// Answer several probabilities at once, in request order.
    ///
    /// Probabilities need not be sorted; duplicates are answered
    /// independently.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::InvalidProbability`] for the first invalid entry.
    pub fn quantiles(&self, probabilities: &[f64]) -> Result<Vec<Quantile>> {
        probabilities.iter().map(|&p| self.quantile(p)).collect()
    }

    /// Median gap, i.e. the quantile at `p = 0.5`.
    pub fn median(&self) -> Quantile {
        self.quantile(0.5).unwrap_or(Quantile::Unresolved)
    }
}
