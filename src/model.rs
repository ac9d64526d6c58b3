use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

/// Grouping axis of a statistics record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Author,
    Email,
    File,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Author, Dimension::Email, Dimension::File];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Author => "author",
            Dimension::Email => "email",
            Dimension::File => "file",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: String,
    pub author: Identity,
    pub committer: Identity,
    pub timestamp: DateTime<Utc>,
    /// Full commit message, subject and body.
    pub message: String,
    pub parent_ids: Vec<String>,
}

impl CommitInfo {
    /// Name the commit is attributed to: the committer's when set, the author's otherwise.
    pub fn attributed_name(&self) -> &str {
        if self.committer.name.is_empty() {
            &self.author.name
        } else {
            &self.committer.name
        }
    }

    /// Email the commit is attributed to, resolved independently of the name.
    pub fn attributed_email(&self) -> &str {
        if self.committer.email.is_empty() {
            &self.author.email
        } else {
            &self.committer.email
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub path: String,
    pub added_lines: u64,
    pub deleted_lines: u64,
    pub is_binary: bool,
}

impl FileStats {
    pub fn new(path: impl Into<String>, added_lines: u64, deleted_lines: u64) -> Self {
        Self {
            path: path.into(),
            added_lines,
            deleted_lines,
            is_binary: false,
        }
    }
}

/// Accumulated statistics for one `(dimension, name)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub name: String,
    pub dimension: Dimension,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
}

impl Stats {
    /// A record describing a single commit's contribution.
    pub fn single(dimension: Dimension, name: impl Into<String>, additions: u64, deletions: u64) -> Self {
        Self {
            name: name.into(),
            dimension,
            commits: 1,
            additions,
            deletions,
        }
    }

    pub fn key(&self) -> (Dimension, &str) {
        (self.dimension, &self.name)
    }

    /// Sums `other` into `self`. Records with a different key are ignored.
    pub fn merge(&mut self, other: &Stats) {
        if self.key() != other.key() {
            return;
        }
        self.commits += other.commits;
        self.additions += other.additions;
        self.deletions += other.deletions;
    }

    pub fn line_changes(&self) -> u64 {
        self.additions + self.deletions
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutput {
    pub dimension: Dimension,
    pub entries: Vec<Stats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub commits: u64,
    pub groups: Vec<GroupOutput>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn info(author: (&str, &str), committer: (&str, &str)) -> CommitInfo {
        CommitInfo {
            id: "c0ffee".to_string(),
            author: Identity::new(author.0, author.1),
            committer: Identity::new(committer.0, committer.1),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            message: String::new(),
            parent_ids: Vec::new(),
        }
    }

    #[test]
    fn committer_identity_wins_when_present() {
        let c = info(("alice", "alice@a"), ("bob", "bob@b"));
        assert_eq!(c.attributed_name(), "bob");
        assert_eq!(c.attributed_email(), "bob@b");
    }

    #[test]
    fn name_and_email_fall_back_independently() {
        let c = info(("alice", "alice@a"), ("", "bob@b"));
        assert_eq!(c.attributed_name(), "alice");
        assert_eq!(c.attributed_email(), "bob@b");

        let c = info(("alice", "alice@a"), ("bob", ""));
        assert_eq!(c.attributed_name(), "bob");
        assert_eq!(c.attributed_email(), "alice@a");
    }

    #[test]
    fn merge_ignores_foreign_keys() {
        let mut a = Stats::single(Dimension::File, "src/lib.rs", 3, 1);
        a.merge(&Stats::single(Dimension::Author, "src/lib.rs", 10, 10));
        a.merge(&Stats::single(Dimension::File, "src/main.rs", 10, 10));
        assert_eq!(a, Stats::single(Dimension::File, "src/lib.rs", 3, 1));

        a.merge(&Stats::single(Dimension::File, "src/lib.rs", 2, 2));
        assert_eq!((a.commits, a.additions, a.deletions), (2, 5, 3));
    }
}
