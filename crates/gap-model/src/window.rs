//! Window extraction: activity dates to inter-activity gaps.
//!
//! A gap counts the full calendar days strictly between two consecutive
//! activity dates, so activity on consecutive days yields a gap of zero.
//! Only the most recent `window_size` gaps are kept.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordered sequence of fully observed gaps, in whole days.
///
/// Oldest gap first. Every value is an observed event; there is no
/// censoring.
///
/// # Examples
///
/// ```
/// use gap_model::window::DurationSample;
///
/// let sample = DurationSample::from(vec![1, 2, 2, 3, 5]);
/// assert_eq!(sample.len(), 5);
/// assert_eq!(sample.as_slice()[4], 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationSample(Vec<u64>);

impl DurationSample {
    /// Number of gaps in the sample.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the sample holds no gap.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The gaps, oldest first.
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Iterate over the gaps, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, u64> {
        self.0.iter()
    }
}

impl From<Vec<u64>> for DurationSample {
    fn from(durations: Vec<u64>) -> Self {
        Self(durations)
    }
}

impl<'a> IntoIterator for &'a DurationSample {
    type Item = &'a u64;
    type IntoIter = std::slice::Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extract the most recent `window_size` gaps from a list of activity dates.
///
/// Dates are deduplicated and sorted first, so input order and same-day
/// repeats do not matter. The last `window_size + 1` distinct dates bound
/// the kept gaps; with fewer dates, all of them are used and the sample is
/// shorter than `window_size`. Empty or single-date input yields an empty
/// sample.
///
/// Whether a short sample is usable is left to the caller.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gap_model::window::extract;
///
/// let dates = [
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
/// ];
/// let sample = extract(&dates, 2);
/// assert_eq!(sample.as_slice(), &[1, 6]);
/// ```
pub fn extract(dates: &[NaiveDate], window_size: usize) -> DurationSample {
    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let bounds = window_size.saturating_add(1);
    let skip = distinct.len().saturating_sub(bounds);
    let kept: Vec<NaiveDate> = distinct.into_iter().skip(skip).collect();

    let durations = kept
        .windows(2)
        .map(|pair| gap_between(pair[0], pair[1]))
        .collect();

    DurationSample(durations)
}

/// Full days strictly between `first` and `second`; `first < second`.
fn gap_between(first: NaiveDate, second: NaiveDate) -> u64 {
    (second.signed_duration_since(first).num_days() - 1).unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn gaps_count_interior_days() {
        let dates = [day(2024, 1, 1), day(2024, 1, 3), day(2024, 1, 10)];
        let sample = extract(&dates, 2);
        assert_eq!(sample.as_slice(), &[1, 6]);
    }

    #[test]
    fn consecutive_days_give_zero_gap() {
        let dates = [day(2024, 3, 1), day(2024, 3, 2)];
        assert_eq!(extract(&dates, 5).as_slice(), &[0]);
    }

    #[test]
    fn only_most_recent_window_is_kept() {
        let dates = [
            day(2024, 1, 1),
            day(2024, 1, 5),
            day(2024, 1, 6),
            day(2024, 1, 9),
            day(2024, 1, 20),
        ];
        // Window of 2 keeps the last 3 dates: Jan 6, Jan 9, Jan 20.
        let sample = extract(&dates, 2);
        assert_eq!(sample.as_slice(), &[2, 10]);
    }

    #[test]
    fn unsorted_and_duplicate_dates_are_normalized() {
        let dates = [
            day(2024, 1, 10),
            day(2024, 1, 1),
            day(2024, 1, 3),
            day(2024, 1, 3),
            day(2024, 1, 10),
        ];
        assert_eq!(extract(&dates, 20).as_slice(), &[1, 6]);
    }

    #[test]
    fn sample_length_is_bounded_by_window() {
        let dates: Vec<NaiveDate> = (1..=28).map(|d| day(2024, 2, d)).collect();
        assert_eq!(extract(&dates, 20).len(), 20);
        assert_eq!(extract(&dates, 27).len(), 27);
        assert_eq!(extract(&dates, 100).len(), 27);
    }

    #[test]
    fn empty_and_single_date_give_empty_sample() {
        assert!(extract(&[], 20).is_empty());
        assert!(extract(&[day(2024, 1, 1)], 20).is_empty());
        assert!(extract(&[day(2024, 1, 1), day(2024, 1, 1)], 20).is_empty());
    }

    #[test]
    fn zero_window_gives_empty_sample() {
        let dates = [day(2024, 1, 1), day(2024, 1, 3)];
        assert!(extract(&dates, 0).is_empty());
    }

    #[test]
    fn gaps_span_month_and_leap_day() {
        let dates = [day(2024, 2, 28), day(2024, 3, 1)];
        // Feb 29 lies strictly between.
        assert_eq!(extract(&dates, 1).as_slice(), &[1]);
    }

    #[test]
    fn sample_serializes_as_plain_array() {
        let sample = DurationSample::from(vec![0, 4]);
        assert_eq!(serde_json::to_string(&sample).unwrap(), "[0,4]");
    }
}
