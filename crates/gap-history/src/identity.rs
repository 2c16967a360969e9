//! Identity merging from a CSV mapping file.
//!
//! Each line of a mapping file holds two values: an author name as found
//! in git history, and the identity it should be merged into. An identity
//! of `IGNORE` (any case) drops the name from the analysis.
//!
//! ```text
//! # name, identity
//! Alice Smith,alice
//! asmith,alice
//! dependabot[bot],IGNORE
//! ```

use std::collections::HashMap;
use std::path::Path;

use gap_core::{GapError, Result};

const IGNORE: &str = "ignore";

/// Mapping from author names to merged identities.
///
/// # Examples
///
/// ```
/// use gap_history::identity::IdentityMap;
///
/// let map = IdentityMap::parse("asmith,alice\nci-bot,IGNORE\n").unwrap();
/// assert_eq!(map.resolve("asmith"), Some("alice"));
/// assert_eq!(map.resolve("bob"), Some("bob"));
/// assert_eq!(map.resolve("ci-bot"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    entries: HashMap<String, String>,
}

impl IdentityMap {
    /// Load a mapping file.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::FileNotFound`] if `path` does not exist,
    /// [`GapError::Io`] if it cannot be read, or [`GapError::Mapping`] if a
    /// line is malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GapError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse mapping content.
    ///
    /// Each line is read as a headerless CSV record, so names holding a
    /// comma can be quoted (`"Smith, John",jsmith`). Blank lines and lines
    /// starting with `#` are skipped. Values are trimmed. When a name
    /// appears twice, the last line wins.
    ///
    /// # Errors
    ///
    /// Returns [`GapError::Mapping`] with the 1-based line number when a
    /// line is not valid CSV or does not hold exactly two non-empty values.
    ///
    /// # Examples
    ///
    /// ```
    /// use gap_history::identity::IdentityMap;
    ///
    /// let map = IdentityMap::parse("\"Smith, A.\",alice\n").unwrap();
    /// assert_eq!(map.resolve("Smith, A."), Some("alice"));
    ///
    /// let err = IdentityMap::parse("alice\n").unwrap_err();
    /// assert!(err.to_string().contains("line 1"));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let record = read_record(line).map_err(|e| GapError::Mapping {
                line: index + 1,
                message: e.to_string(),
            })?;
            let fields: Vec<&str> = record.iter().map(unquote).collect();
            let [source, target] = fields.as_slice() else {
                return Err(GapError::Mapping {
                    line: index + 1,
                    message: format!("expected 2 values, found {}", fields.len()),
                });
            };
            if source.is_empty() || target.is_empty() {
                return Err(GapError::Mapping {
                    line: index + 1,
                    message: "empty value".into(),
                });
            }

            entries.insert((*source).to_string(), (*target).to_string());
        }

        tracing::debug!(entries = entries.len(), "loaded identity mapping");

        Ok(Self { entries })
    }

    /// Resolve an author name to its identity.
    ///
    /// Unmapped names resolve to themselves. Returns `None` when the name
    /// maps to `IGNORE`, unless the name itself is "ignore".
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let identity = self.entries.get(name).map_or(name, String::as_str);
        if identity.eq_ignore_ascii_case(IGNORE) && !name.eq_ignore_ascii_case(IGNORE) {
            None
        } else {
            Some(identity)
        }
    }

    /// Number of mapped names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no name is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strips quotes the CSV reader keeps when a field has padding before them.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .trim()
}

/// Read one mapping line as a CSV record.
fn read_record(line: &str) -> std::result::Result<csv::StringRecord, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_names_resolve_to_themselves() {
        let map = IdentityMap::default();
        assert!(map.is_empty());
        assert_eq!(map.resolve("alice"), Some("alice"));
    }

    #[test]
    fn mapped_names_merge() {
        let map = IdentityMap::parse("Alice Smith,alice\nasmith,alice\n").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("Alice Smith"), Some("alice"));
        assert_eq!(map.resolve("asmith"), Some("alice"));
    }

    #[test]
    fn ignore_target_drops_name_in_any_case() {
        let map = IdentityMap::parse("bot,IGNORE\nother-bot,Ignore\n").unwrap();
        assert_eq!(map.resolve("bot"), None);
        assert_eq!(map.resolve("other-bot"), None);
    }

    #[test]
    fn author_literally_named_ignore_is_kept() {
        let map = IdentityMap::parse("Ignore,IGNORE\n").unwrap();
        assert_eq!(map.resolve("Ignore"), Some("IGNORE"));
        assert_eq!(IdentityMap::default().resolve("ignore"), Some("ignore"));
    }

    #[test]
    fn comments_blanks_and_quotes_are_handled() {
        let content = "# merged identities\n\n \"Bob B\" , \"bob\" \n";
        let map = IdentityMap::parse(content).unwrap();
        assert_eq!(map.resolve("Bob B"), Some("bob"));
    }

    #[test]
    fn quoted_names_may_hold_commas() {
        let map = IdentityMap::parse("\"Smith, John\",jsmith\n\"Doe, Jane\" , jdoe\n").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("Smith, John"), Some("jsmith"));
        assert_eq!(map.resolve("Doe, Jane"), Some("jdoe"));
    }

    #[test]
    fn unquoted_extra_comma_is_rejected() {
        let err = IdentityMap::parse("a,b\nSmith, John,jsmith\n").unwrap_err();
        match err {
            GapError::Mapping { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("found 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn last_duplicate_wins() {
        let map = IdentityMap::parse("x,first\nx,second\n").unwrap();
        assert_eq!(map.resolve("x"), Some("second"));
    }

    #[test]
    fn malformed_lines_report_line_number() {
        let err = IdentityMap::parse("a,b\n\njust-one\n").unwrap_err();
        match err {
            GapError::Mapping { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("found 1"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = IdentityMap::parse("a,\n").unwrap_err();
        assert!(matches!(err, GapError::Mapping { line: 1, .. }));
    }

    #[test]
    fn from_file_reads_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");
        std::fs::write(&path, "jdoe,john\n").unwrap();

        let map = IdentityMap::from_file(&path).unwrap();
        assert_eq!(map.resolve("jdoe"), Some("john"));

        let missing = IdentityMap::from_file(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(missing, GapError::FileNotFound(_)));
    }
}
