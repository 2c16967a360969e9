//! Git history extraction via git2.
//!
//! Walks commit history from one or more repositories, extracting the
//! author and the calendar date of each commit.

use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate};
use gap_core::{GapError, Result};
use git2::{Commit, Repository, Sort};

/// Raw commit data extracted from git history.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gap_history::mining::CommitInfo;
///
/// let info = CommitInfo {
///     hash: "abc12345".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// };
/// assert_eq!(info.author, "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Short commit hash.
    pub hash: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Authoring date, in the author's own timezone.
    pub date: NaiveDate,
}

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use gap_history::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(opts.branches.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Branches to walk; empty walks every ref plus HEAD.
    pub branches: Vec<String>,
}

/// Mine commit history from a git repository.
///
/// Returns commits in reverse chronological order (newest first). Each
/// commit reachable from several walked refs is reported once. Commits
/// whose author timestamp cannot be represented are skipped with a warning.
///
/// # Errors
///
/// Returns [`GapError::Git`] if the repository cannot be opened, a branch
/// cannot be resolved, or the walk fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use gap_history::mining::{mine_commits, MiningOptions};
///
/// let commits = mine_commits(Path::new("."), &MiningOptions::default()).unwrap();
/// for c in &commits {
///     println!("{} {} ({})", c.date, c.hash, c.author);
/// }
/// ```
pub fn mine_commits(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<CommitInfo>> {
    let repo = Repository::open(repo_path).map_err(|e| {
        GapError::Git(format!(
            "failed to open repository {}: {e}",
            repo_path.display()
        ))
    })?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| GapError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk.set_sorting(Sort::TIME).ok();

    if options.branches.is_empty() {
        revwalk
            .push_glob("*")
            .map_err(|e| GapError::Git(format!("failed to push refs: {e}")))?;
        // Detached or unborn HEAD: nothing more to add.
        if let Err(e) = revwalk.push_head() {
            tracing::debug!("HEAD not walked: {e}");
        }
    } else {
        for branch in &options.branches {
            let commit = repo
                .resolve_reference_from_short_name(branch)
                .and_then(|reference| reference.peel_to_commit())
                .map_err(|e| GapError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
            revwalk
                .push(commit.id())
                .map_err(|e| GapError::Git(format!("failed to push '{branch}': {e}")))?;
        }
    }

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| GapError::Git(format!("revwalk error: {e}")))?;

        let commit = repo
            .find_commit(oid)
            .map_err(|e| GapError::Git(format!("failed to find commit: {e}")))?;

        let hash = oid.to_string();
        let short = &hash[..hash.len().min(8)];

        let Some(date) = author_date(&commit) else {
            tracing::warn!(commit = short, "unable to read author date, skipping");
            continue;
        };

        let author = commit.author();
        commits.push(CommitInfo {
            hash: short.to_string(),
            author: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            date,
        });
    }

    tracing::debug!(
        repo = %repo_path.display(),
        commits = commits.len(),
        "mined history"
    );

    Ok(commits)
}

/// Mine several repositories and concatenate their commits.
///
/// # Errors
///
/// Fails on the first repository that [`mine_commits`] rejects.
pub fn mine_repositories<P: AsRef<Path>>(
    repo_paths: &[P],
    options: &MiningOptions,
) -> Result<Vec<CommitInfo>> {
    let mut commits = Vec::new();
    for path in repo_paths {
        commits.extend(mine_commits(path.as_ref(), options)?);
    }
    Ok(commits)
}

fn author_date(commit: &Commit<'_>) -> Option<NaiveDate> {
    let when = commit.author().when();
    let offset = FixedOffset::east_opt(when.offset_minutes() * 60)?;
    let instant = DateTime::from_timestamp(when.seconds(), 0)?;
    Some(instant.with_timezone(&offset).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Oid, Signature, Time};

    const DAY: i64 = 86_400;
    // 2024-01-01T00:00:00Z
    const JAN_1: i64 = 1_704_067_200;

    fn commit_at(repo: &Repository, update_ref: &str, name: &str, secs: i64, offset: i32) -> Oid {
        let sig = Signature::new(name, &format!("{name}@example.com"), &Time::new(secs, offset))
            .unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo
            .refname_to_id(update_ref)
            .ok()
            .map(|id| repo.find_commit(id).unwrap());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        repo.commit(Some(update_ref), &sig, &sig, "change", &tree, &parents)
            .unwrap()
    }

    fn scratch_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn mining_options_default_walks_everything() {
        assert!(MiningOptions::default().branches.is_empty());
    }

    #[test]
    fn mines_commits_newest_first() {
        let (dir, repo) = scratch_repo();
        commit_at(&repo, "HEAD", "alice", JAN_1, 0);
        commit_at(&repo, "HEAD", "bob", JAN_1 + 2 * DAY, 0);
        commit_at(&repo, "HEAD", "alice", JAN_1 + 5 * DAY, 0);

        let commits = mine_commits(dir.path(), &MiningOptions::default()).unwrap();
        let summary: Vec<(&str, NaiveDate)> = commits
            .iter()
            .map(|c| (c.author.as_str(), c.date))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("alice", day(2024, 1, 6)),
                ("bob", day(2024, 1, 3)),
                ("alice", day(2024, 1, 1)),
            ]
        );
        assert_eq!(commits[0].email, "alice@example.com");
        assert_eq!(commits[0].hash.len(), 8);
    }

    #[test]
    fn dates_use_author_timezone() {
        let (dir, repo) = scratch_repo();
        // 2024-01-01T23:30Z is already Jan 2 at UTC+2 and still Jan 1 at UTC-5.
        commit_at(&repo, "HEAD", "east", JAN_1 + DAY - 30 * 60, 120);
        commit_at(&repo, "HEAD", "west", JAN_1 + DAY - 30 * 60, -300);

        let commits = mine_commits(dir.path(), &MiningOptions::default()).unwrap();
        let east = commits.iter().find(|c| c.author == "east").unwrap();
        let west = commits.iter().find(|c| c.author == "west").unwrap();
        assert_eq!(east.date, day(2024, 1, 2));
        assert_eq!(west.date, day(2024, 1, 1));
    }

    #[test]
    fn default_walk_covers_all_branches() {
        let (dir, repo) = scratch_repo();
        let base = commit_at(&repo, "HEAD", "alice", JAN_1, 0);
        repo.reference("refs/heads/feature", base, false, "branch")
            .unwrap();
        commit_at(&repo, "refs/heads/feature", "carol", JAN_1 + 3 * DAY, 0);
        commit_at(&repo, "HEAD", "bob", JAN_1 + DAY, 0);

        let all = mine_commits(dir.path(), &MiningOptions::default()).unwrap();
        assert_eq!(all.len(), 3);

        let feature_only = MiningOptions {
            branches: vec!["feature".into()],
        };
        let commits = mine_commits(dir.path(), &feature_only).unwrap();
        let authors: Vec<&str> = commits.iter().map(|c| c.author.as_str()).collect();
        assert_eq!(authors, vec!["carol", "alice"]);
    }

    #[test]
    fn unknown_branch_is_an_error() {
        let (dir, repo) = scratch_repo();
        commit_at(&repo, "HEAD", "alice", JAN_1, 0);
        let opts = MiningOptions {
            branches: vec!["does-not-exist".into()],
        };
        let err = mine_commits(dir.path(), &opts).unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn empty_repository_has_no_commits() {
        let (dir, _repo) = scratch_repo();
        let commits = mine_commits(dir.path(), &MiningOptions::default()).unwrap();
        assert!(commits.is_empty());
    }

    #[test]
    fn non_repository_is_a_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = mine_commits(dir.path(), &MiningOptions::default()).unwrap_err();
        assert!(matches!(err, GapError::Git(_)));
    }

    #[test]
    fn several_repositories_are_concatenated() {
        let (dir_a, repo_a) = scratch_repo();
        let (dir_b, repo_b) = scratch_repo();
        commit_at(&repo_a, "HEAD", "alice", JAN_1, 0);
        commit_at(&repo_b, "HEAD", "alice", JAN_1 + DAY, 0);
        commit_at(&repo_b, "HEAD", "bob", JAN_1 + 2 * DAY, 0);

        let commits =
            mine_repositories(&[dir_a.path(), dir_b.path()], &MiningOptions::default()).unwrap();
        assert_eq!(commits.len(), 3);
    }
}
