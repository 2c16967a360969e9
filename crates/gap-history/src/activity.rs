//! Activity dates grouped per identity.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::identity::IdentityMap;
use crate::mining::CommitInfo;

/// Activity dates per identity, ordered by identity.
///
/// Dates are stored as recorded, repeats included; the model normalizes
/// them.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gap_history::activity::ActivityLog;
///
/// let mut log = ActivityLog::default();
/// log.record("alice", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// log.record("alice", NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
/// assert_eq!(log.len(), 1);
/// assert_eq!(log.dates("alice").map(<[_]>::len), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActivityLog {
    authors: BTreeMap<String, Vec<NaiveDate>>,
}

impl ActivityLog {
    /// Group commit dates by merged identity, dropping ignored names.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use gap_history::activity::ActivityLog;
    /// use gap_history::identity::IdentityMap;
    /// use gap_history::mining::CommitInfo;
    ///
    /// let commit = |author: &str, d: u32| CommitInfo {
    ///     hash: "0".into(),
    ///     author: author.into(),
    ///     email: String::new(),
    ///     date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
    /// };
    /// let identities = IdentityMap::parse("asmith,alice\nbot,IGNORE").unwrap();
    /// let log = ActivityLog::from_commits(
    ///     &[commit("alice", 1), commit("asmith", 2), commit("bot", 3)],
    ///     &identities,
    /// );
    /// assert_eq!(log.authors().collect::<Vec<_>>(), vec!["alice"]);
    /// ```
    pub fn from_commits(commits: &[CommitInfo], identities: &IdentityMap) -> Self {
        let mut log = Self::default();
        let mut ignored = 0usize;

        for commit in commits {
            match identities.resolve(&commit.author) {
                Some(identity) => log.record(identity, commit.date),
                None => ignored += 1,
            }
        }

        tracing::debug!(
            identities = log.len(),
            ignored_commits = ignored,
            "grouped activity"
        );

        log
    }

    /// Record one activity date for `author`.
    pub fn record(&mut self, author: &str, date: NaiveDate) {
        self.authors.entry(author.to_string()).or_default().push(date);
    }

    /// Activity dates of `author`, if any were recorded.
    pub fn dates(&self, author: &str) -> Option<&[NaiveDate]> {
        self.authors.get(author).map(Vec::as_slice)
    }

    /// Identities, in order.
    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.authors.keys().map(String::as_str)
    }

    /// `(identity, dates)` pairs, in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NaiveDate])> {
        self.authors
            .iter()
            .map(|(author, dates)| (author.as_str(), dates.as_slice()))
    }

    /// Number of identities.
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}
