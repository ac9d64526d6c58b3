//! Stateless inclusion tests: a commit either counts towards the report or it does not.

use crate::error::{GitdescError, Result};
use crate::history::CommitView;
use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::warn;

type Check = dyn Fn(&dyn CommitView) -> Result<bool> + Send;

/// A stateless per-commit inclusion test.
///
/// Evaluating it any number of times, in any order, gives the same answer for
/// the same commit. Only [`match_file_pattern`] under [`FileMatchPolicy::Strict`]
/// can return an error.
pub struct Validity {
    check: Box<Check>,
}

impl Validity {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&dyn CommitView) -> Result<bool> + Send + 'static,
    {
        Self {
            check: Box::new(check),
        }
    }

    pub fn always() -> Self {
        Self::new(|_| Ok(true))
    }

    pub fn accepts(&self, commit: &dyn CommitView) -> Result<bool> {
        (self.check)(commit)
    }
}

impl std::fmt::Debug for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Validity(..)")
    }
}

/// Logical AND of `predicates`, evaluated left to right and stopping at the
/// first rejection. No predicates accept everything.
pub fn compose(predicates: Vec<Validity>) -> Validity {
    if predicates.is_empty() {
        return Validity::always();
    }
    Validity::new(move |commit| {
        for p in &predicates {
            if !p.accepts(commit)? {
                return Ok(false);
            }
        }
        Ok(true)
    })
}

/// Commit field a regular expression is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AuthorName,
    AuthorEmail,
    CommitterName,
    CommitterEmail,
    /// Committer name, falling back to the author name when empty.
    AttributedName,
    /// Committer email, falling back to the author email when empty.
    AttributedEmail,
    Message,
}

impl Field {
    fn select<'c>(&self, commit: &'c dyn CommitView) -> &'c str {
        let info = commit.info();
        match self {
            Field::AuthorName => &info.author.name,
            Field::AuthorEmail => &info.author.email,
            Field::CommitterName => &info.committer.name,
            Field::CommitterEmail => &info.committer.email,
            Field::AttributedName => info.attributed_name(),
            Field::AttributedEmail => info.attributed_email(),
            Field::Message => &info.message,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| GitdescError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

pub fn match_regex(field: Field, pattern: &str) -> Result<Validity> {
    let re = compile(pattern)?;
    Ok(Validity::new(move |commit| Ok(re.is_match(field.select(commit)))))
}

/// What a file predicate does when a commit's file list cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileMatchPolicy {
    /// Treat the commit as not matching and keep walking.
    #[default]
    Lenient,
    /// Abort the traversal with the underlying error.
    Strict,
}

/// Accepts commits touching at least one path matched by `pattern`.
pub fn match_file_pattern(pattern: &str, policy: FileMatchPolicy) -> Result<Validity> {
    let re = compile(pattern)?;
    Ok(Validity::new(move |commit| match commit.file_stats() {
        Ok(files) => Ok(files.iter().any(|f| re.is_match(&f.path))),
        Err(e) => match policy {
            FileMatchPolicy::Lenient => {
                warn!(commit = %commit.info().id, error = %e, "cannot read changed files, treating as no match");
                Ok(false)
            }
            FileMatchPolicy::Strict => Err(e),
        },
    }))
}

/// Accepts commits made at or before `until`.
pub fn committed_until(until: DateTime<Utc>) -> Validity {
    Validity::new(move |commit| Ok(commit.info().timestamp <= until))
}

/// Rejects commits with more than one parent.
pub fn skip_merges() -> Validity {
    Validity::new(|commit| Ok(commit.info().parent_ids.len() <= 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fixtures::{at, commit};
    use crate::model::Identity;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn empty_composition_accepts_everything() {
        let v = compose(Vec::new());
        assert!(v.accepts(&commit("c1", "a", 1)).unwrap());
        assert!(v.accepts(&commit("c2", "", 2)).unwrap());
    }

    #[test]
    fn composition_short_circuits_left_to_right() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let v = compose(vec![
            Validity::new(|_| Ok(false)),
            Validity::new(move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }),
        ]);
        assert!(!v.accepts(&commit("c1", "a", 1)).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        let err = match_regex(Field::AuthorName, "a(").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(matches!(err, GitdescError::InvalidPattern { ref pattern, .. } if pattern == "a("));
    }

    #[test]
    fn regex_matches_selected_field() {
        let c = commit("c1", "alice", 1).committer(Identity::new("bob", ""));
        assert!(match_regex(Field::AuthorName, "^ali").unwrap().accepts(&c).unwrap());
        assert!(!match_regex(Field::AttributedName, "^ali").unwrap().accepts(&c).unwrap());
        assert!(match_regex(Field::AttributedEmail, "alice@example").unwrap().accepts(&c).unwrap());
    }

    #[test]
    fn regex_matches_anywhere_in_message() {
        let v = match_regex(Field::Message, r"(?m)^Fixes #\d+$").unwrap();
        let fix = commit("c1", "a", 1).message("Tidy parser\n\nFixes #12\n");
        let chore = commit("c2", "a", 2).message("Bump version\n");
        assert!(v.accepts(&fix).unwrap());
        assert!(!v.accepts(&chore).unwrap());
    }

    #[test]
    fn validity_is_repeatable() {
        let v = match_regex(Field::AuthorEmail, "example").unwrap();
        let c = commit("c1", "a", 1);
        for _ in 0..3 {
            assert!(v.accepts(&c).unwrap());
        }
    }

    #[test]
    fn file_pattern_matches_any_touched_path() {
        let v = match_file_pattern(r"\.rs$", FileMatchPolicy::Lenient).unwrap();
        let touching = commit("c1", "a", 1).file("README.md", 1, 0).file("src/lib.rs", 2, 0);
        let not_touching = commit("c2", "a", 2).file("README.md", 1, 0);
        assert!(v.accepts(&touching).unwrap());
        assert!(!v.accepts(&not_touching).unwrap());
        assert!(!v.accepts(&commit("c3", "a", 3)).unwrap());
    }

    #[test]
    fn file_pattern_failure_follows_policy() {
        let broken = commit("c1", "a", 1).broken("unreadable tree");
        let lenient = match_file_pattern(".*", FileMatchPolicy::Lenient).unwrap();
        assert!(!lenient.accepts(&broken).unwrap());

        let strict = match_file_pattern(".*", FileMatchPolicy::Strict).unwrap();
        let err = strict.accepts(&broken).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Extraction);
    }

    #[test]
    fn until_is_inclusive() {
        let v = committed_until(at(2));
        assert!(v.accepts(&commit("c1", "a", 1)).unwrap());
        assert!(v.accepts(&commit("c2", "a", 2)).unwrap());
        assert!(!v.accepts(&commit("c3", "a", 3)).unwrap());
    }

    #[test]
    fn merges_are_skipped() {
        let v = skip_merges();
        assert!(v.accepts(&commit("c1", "a", 1).parents(&["p"])).unwrap());
        assert!(!v.accepts(&commit("c2", "a", 2).parents(&["p", "q"])).unwrap());
    }
}
