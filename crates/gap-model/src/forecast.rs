//! Per-author forecasts: calendar dates of likely next activity.
//!
//! For each author, activity up to the `as_of` date is reduced to its most
//! recent gaps, a survival curve is fitted, and every requested probability
//! is turned into a date counted from the author's last activity. Authors
//! with too few gaps, or inactive for too long, are left out.

use chrono::{Days, NaiveDate};
use gap_core::{GapConfig, GapError, Result};
use serde::Serialize;

use crate::survival::{Quantile, SurvivalCurve};
use crate::window::{extract, DurationSample};

/// Options driving [`forecast_all`] and [`forecast_author`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gap_model::forecast::ForecastOptions;
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let opts = ForecastOptions::new(as_of);
/// assert_eq!(opts.window_size, 20);
/// assert_eq!(opts.probabilities, vec![0.5, 0.7, 0.9]);
/// assert_eq!(opts.active_within_days, 30);
/// ```
#[derive(Debug, Clone)]
pub struct ForecastOptions {
    /// Date predictions are made from; later activity is ignored.
    pub as_of: NaiveDate,
    /// Number of recent gaps required and used per author.
    pub window_size: usize,
    /// Probabilities to answer, in request order.
    pub probabilities: Vec<f64>,
    /// Drop authors whose last activity is older than this many days.
    pub active_within_days: u32,
}

impl ForecastOptions {
    /// Options with the default model and report settings.
    pub fn new(as_of: NaiveDate) -> Self {
        Self::from_config(&GapConfig::default(), as_of)
    }

    /// Options taken from a loaded configuration.
    pub fn from_config(config: &GapConfig, as_of: NaiveDate) -> Self {
        Self {
            as_of,
            window_size: config.model.window_size,
            probabilities: config.model.probabilities.clone(),
            active_within_days: config.report.active_within_days,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(GapError::Config(
                "window size must be a positive integer".into(),
            ));
        }
        if let Some(&p) = self
            .probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(GapError::InvalidProbability(p));
        }
        Ok(())
    }

    fn active_since(&self) -> NaiveDate {
        self.as_of
            .checked_sub_days(Days::new(u64::from(self.active_within_days)))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// A single answered probability.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gap_model::forecast::Prediction;
/// use gap_model::survival::Quantile;
///
/// let prediction = Prediction {
///     probability: 0.5,
///     quantile: Quantile::Resolved(3),
///     date: NaiveDate::from_ymd_opt(2024, 6, 4),
/// };
/// assert_eq!(prediction.quantile.days(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Requested probability.
    pub probability: f64,
    /// Gap quantile in days.
    pub quantile: Quantile,
    /// Last activity plus the quantile; `None` when unresolved.
    pub date: Option<NaiveDate>,
}

/// Forecast for one author.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    /// Author identity.
    pub author: String,
    /// Most recent activity on or before `as_of`.
    pub last_activity: NaiveDate,
    /// Distinct activity dates on or before `as_of`, ascending.
    pub activity: Vec<NaiveDate>,
    /// Gaps the model was fitted on.
    pub gaps: DurationSample,
    /// One prediction per requested probability, in request order.
    pub predictions: Vec<Prediction>,
}

/// Forecast a single author.
///
/// Returns `Ok(None)` when the author is left out of the report: no
/// activity on or before `as_of`, fewer than `window_size` gaps, or last
/// activity before `as_of - active_within_days`.
///
/// # Errors
///
/// Returns [`GapError::Config`] for a zero window size and
/// [`GapError::InvalidProbability`] for probabilities outside `[0, 1]`.
///
/// # Examples
///
/// ```
/// use chrono::{Days, NaiveDate};
/// use gap_model::forecast::{forecast_author, ForecastOptions};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// // Active every third day.
/// let dates: Vec<NaiveDate> = (0..10).map(|i| start + Days::new(i * 3)).collect();
///
/// let mut opts = ForecastOptions::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
/// opts.window_size = 5;
///
/// let forecast = forecast_author("alice", &dates, &opts).unwrap().unwrap();
/// assert_eq!(forecast.last_activity, NaiveDate::from_ymd_opt(2024, 1, 28).unwrap());
/// assert_eq!(forecast.predictions[0].quantile.days(), Some(2));
/// assert_eq!(forecast.predictions[0].date, NaiveDate::from_ymd_opt(2024, 1, 30));
/// ```
pub fn forecast_author(
    author: &str,
    dates: &[NaiveDate],
    options: &ForecastOptions,
) -> Result<Option<Forecast>> {
    options.validate()?;

    let mut activity: Vec<NaiveDate> = dates
        .iter()
        .copied()
        .filter(|date| *date <= options.as_of)
        .collect();
    activity.sort_unstable();
    activity.dedup();

    let Some(&last_activity) = activity.last() else {
        tracing::debug!(author, "no activity on or before {}", options.as_of);
        return Ok(None);
    };

    let gaps = extract(&activity, options.window_size);
    if gaps.len() < options.window_size {
        tracing::debug!(
            author,
            gaps = gaps.len(),
            required = options.window_size,
            "not enough observations"
        );
        return Ok(None);
    }

    if last_activity < options.active_since() {
        tracing::debug!(author, %last_activity, "inactive for too long");
        return Ok(None);
    }

    let curve = SurvivalCurve::fit(&gaps)?;
    let predictions = options
        .probabilities
        .iter()
        .map(|&probability| {
            let quantile = curve.quantile(probability)?;
            let date = quantile
                .days()
                .and_then(|days| last_activity.checked_add_days(Days::new(days)));
            Ok(Prediction {
                probability,
                quantile,
                date,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(Forecast {
        author: author.to_string(),
        last_activity,
        activity,
        gaps,
        predictions,
    }))
}

/// Forecast every author that qualifies.
///
/// Results are sorted by most recent activity first, then by author.
///
/// # Errors
///
/// Same as [`forecast_author`]; options are checked before any author is
/// processed, so an empty input still reports invalid options.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gap_model::forecast::{forecast_all, ForecastOptions};
///
/// let opts = ForecastOptions::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
/// let none: Vec<(&str, &[NaiveDate])> = Vec::new();
/// assert!(forecast_all(none, &opts).unwrap().is_empty());
/// ```
pub fn forecast_all<'a, I>(activity: I, options: &ForecastOptions) -> Result<Vec<Forecast>>
where
    I: IntoIterator<Item = (&'a str, &'a [NaiveDate])>,
{
    options.validate()?;

    let mut considered = 0usize;
    let mut forecasts = Vec::new();
    for (author, dates) in activity {
        considered += 1;
        if let Some(forecast) = forecast_author(author, dates, options)? {
            forecasts.push(forecast);
        }
    }

    forecasts.sort_by(|a, b| {
        b.last_activity
            .cmp(&a.last_activity)
            .then_with(|| a.author.cmp(&b.author))
    });

    tracing::info!(
        considered,
        forecasted = forecasts.len(),
        "forecast complete"
    );

    Ok(forecasts)
}
