//! The seam between the report pipeline and whatever stores the commits.
//!
//! A [`CommitSource`] yields commits newest first, following parent links, and
//! must tolerate being dropped half way: the traversal stops pulling as soon as
//! its limit fires. [`GitRepo`](crate::git::GitRepo) is the real source;
//! [`MemoryHistory`] serves pre-built commits.

use crate::error::{GitdescError, Result};
use crate::model::{CommitInfo, FileStats, Identity};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Read-only view of one commit.
pub trait CommitView {
    fn info(&self) -> &CommitInfo;

    /// Per-file line changes against the first parent, in tree order.
    fn file_stats(&self) -> Result<Vec<FileStats>>;
}

pub type Commits<'a> = Box<dyn Iterator<Item = Result<Box<dyn CommitView + 'a>>> + 'a>;

pub trait CommitSource {
    /// Starts a fresh walk from the tip of the current branch.
    fn commits(&self) -> Result<Commits<'_>>;

    /// Human readable location of the history, used in JSON output.
    fn location(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct MemoryCommit {
    info: CommitInfo,
    files: std::result::Result<Vec<FileStats>, String>,
}

impl MemoryCommit {
    pub fn new(id: impl Into<String>, author: Identity, timestamp: DateTime<Utc>) -> Self {
        Self {
            info: CommitInfo {
                id: id.into(),
                author,
                committer: Identity::default(),
                timestamp,
                message: String::new(),
                parent_ids: Vec::new(),
            },
            files: Ok(Vec::new()),
        }
    }

    pub fn committer(mut self, committer: Identity) -> Self {
        self.info.committer = committer;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.info.message = message.into();
        self
    }

    pub fn parents(mut self, parent_ids: &[&str]) -> Self {
        self.info.parent_ids = parent_ids.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn file(mut self, path: &str, added: u64, deleted: u64) -> Self {
        if let Ok(files) = &mut self.files {
            files.push(FileStats::new(path, added, deleted));
        }
        self
    }

    /// Makes every [`CommitView::file_stats`] call on this commit fail with `reason`.
    pub fn broken(mut self, reason: impl Into<String>) -> Self {
        self.files = Err(reason.into());
        self
    }
}

impl CommitView for MemoryCommit {
    fn info(&self) -> &CommitInfo {
        &self.info
    }

    fn file_stats(&self) -> Result<Vec<FileStats>> {
        self.files
            .clone()
            .map_err(|reason| GitdescError::extraction(&self.info.id, reason))
    }
}

/// An in-memory history, newest commit first.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    commits: Vec<MemoryCommit>,
    pulled: Arc<AtomicUsize>,
}

impl MemoryHistory {
    pub fn new(commits: Vec<MemoryCommit>) -> Self {
        Self {
            commits,
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of commits handed out by every walk over this history.
    pub fn pull_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pulled)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

impl CommitSource for MemoryHistory {
    fn commits<'a>(&'a self) -> Result<Commits<'a>> {
        let pulled = Arc::clone(&self.pulled);
        Ok(Box::new(self.commits.iter().map(move |c| {
            pulled.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(c.clone()) as Box<dyn CommitView + 'a>)
        })))
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
