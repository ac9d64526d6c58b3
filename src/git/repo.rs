use crate::error::{GitdescError, Result};
use crate::history::{CommitSource, CommitView, Commits};
use crate::model::{CommitInfo, FileStats, Identity};
use crate::util::parse_date;
use chrono::{DateTime, Utc};
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use similar::{ChangeTag, TextDiff};
use std::cell::OnceCell;
use std::collections::{BinaryHeap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
    binary: bool,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`, walking up to find it
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = start_dir(path)?;
        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!(path = %path.display(), "opened repository");

        Ok(Self {
            repo,
            path,
            binary: false,
        })
    }

    /// Diff binary files line by line instead of counting them as zero lines.
    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a date given as text, or the commit time of a revision.
    pub fn resolve_date(&self, input: &str) -> Result<DateTime<Utc>> {
        if let Some(dt) = parse_date(input, Utc::now()) {
            return Ok(dt);
        }

        let id = self
            .repo
            .rev_parse_single(input)
            .map_err(|e| GitdescError::InvalidDate(format!("'{input}' is neither a date nor a commit: {e}")))?;

        let commit = id
            .object()?
            .try_into_commit()
            .map_err(|_| GitdescError::InvalidDate(format!("Not a commit: {input}")))?;

        let secs = commit.time()?.seconds;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| GitdescError::InvalidDate(format!("Invalid timestamp: {secs}")))
    }

    fn commit_time(&self, id: ObjectId) -> Result<i64> {
        Ok(self.repo.find_commit(id)?.time()?.seconds)
    }

    fn load(&self, commit_id: ObjectId) -> Result<GitCommit<'_>> {
        let commit = self.repo.find_commit(commit_id)?;
        let secs = commit.time()?.seconds;
        let timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| GitdescError::InvalidDate(format!("Invalid timestamp: {secs}")))?;

        let message = commit.message_raw()?.to_string();
        let author = commit.author()?;
        let committer = commit.committer()?;
        let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();

        Ok(GitCommit {
            repo: self,
            id: commit_id,
            info: CommitInfo {
                id: commit_id.to_string(),
                author: Identity::new(author.name.to_string(), author.email.to_string()),
                committer: Identity::new(committer.name.to_string(), committer.email.to_string()),
                timestamp,
                message,
                parent_ids: parents.iter().map(|id| id.to_string()).collect(),
            },
            parents,
            files: OnceCell::new(),
        })
    }

    fn compute_file_stats(&self, commit_id: ObjectId, parent_id: Option<ObjectId>) -> Result<Vec<FileStats>> {
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;
        let changes: Vec<ChangeDetached> = match parent_id {
            Some(parent_id) => {
                let parent_tree = self.repo.find_commit(parent_id)?.tree()?;
                self.repo
                    .diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), None)?
            }
            None => self.repo.diff_tree_to_tree(None, Some(&commit_tree), None)?,
        };

        let mut files = Vec::new();
        for change in changes {
            self.handle_change(change, &mut files)?;
        }
        Ok(files)
    }

    fn handle_change(&self, change: ChangeDetached, files: &mut Vec<FileStats>) -> Result<()> {
        let (path, previous, current) = match change {
            ChangeDetached::Addition {
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                (location, None, Some(id))
            }
            ChangeDetached::Deletion {
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                (location, Some(id), None)
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                (location, Some(previous_id), Some(id))
            }
            // renames and copies are one record on the destination path, diffed against the source
            ChangeDetached::Rewrite {
                source_id,
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() || entry_mode.is_commit() {
                    return Ok(());
                }
                (location, Some(source_id), Some(id))
            }
        };

        let (added_lines, deleted_lines, is_binary) = self.line_stats(previous, current)?;
        files.push(FileStats {
            path: path.to_string(),
            added_lines,
            deleted_lines,
            is_binary,
        });
        Ok(())
    }

    /// Lines added and deleted between two blobs, `None` standing for an empty side.
    /// Binary blobs count as zero lines unless binary diffing is enabled.
    fn line_stats(&self, previous: Option<ObjectId>, current: Option<ObjectId>) -> Result<(u64, u64, bool)> {
        let old_obj = previous.map(|id| self.repo.find_object(id)).transpose()?;
        let new_obj = current.map(|id| self.repo.find_object(id)).transpose()?;
        let old_data = old_obj.as_ref().map(|o| o.data.as_slice()).unwrap_or_default();
        let new_data = new_obj.as_ref().map(|o| o.data.as_slice()).unwrap_or_default();

        let is_binary = is_binary_data(old_data) || is_binary_data(new_data);
        if is_binary && !self.binary {
            return Ok((0, 0, true));
        }
        let (added, deleted) = line_diff(old_data, new_data);
        Ok((added, deleted, is_binary))
    }
}

fn start_dir<P: AsRef<Path>>(path: Option<P>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.as_ref().to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| GitdescError::GitRepo(format!("Cannot read current directory: {e}"))),
    }
}

fn is_binary_data(data: &[u8]) -> bool {
    data.iter().take(8192).any(|&b| b == 0)
}

/// Line diff over raw bytes; text need not be UTF-8.
fn line_diff(old: &[u8], new: &[u8]) -> (u64, u64) {
    let diff = TextDiff::from_lines(old, new);
    let mut added = 0u64;
    let mut deleted = 0u64;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}

impl CommitSource for GitRepo {
    fn commits<'a>(&'a self) -> Result<Commits<'a>> {
        let mut head = self.repo.head()?;
        if head.is_unborn() {
            debug!("HEAD is unborn, history is empty");
            return Ok(Box::new(std::iter::empty()));
        }
        let head_commit = head.peel_to_commit_in_place()?;
        let time = head_commit.time()?.seconds;

        Ok(Box::new(Walk {
            repo: self,
            queue: BinaryHeap::from([(time, head_commit.id)]),
            seen: HashSet::from([head_commit.id]),
            failed: false,
        }))
    }

    fn location(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Newest-first walk over every commit reachable from HEAD.
struct Walk<'r> {
    repo: &'r GitRepo,
    queue: BinaryHeap<(i64, ObjectId)>,
    seen: HashSet<ObjectId>,
    failed: bool,
}

impl<'r> Walk<'r> {
    fn step(&mut self, commit_id: ObjectId) -> Result<GitCommit<'r>> {
        let commit = self.repo.load(commit_id)?;
        for &parent in &commit.parents {
            if self.seen.insert(parent) {
                self.queue.push((self.repo.commit_time(parent)?, parent));
            }
        }
        Ok(commit)
    }
}

impl<'r> Iterator for Walk<'r> {
    type Item = Result<Box<dyn CommitView + 'r>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (_, commit_id) = self.queue.pop()?;
        match self.step(commit_id) {
            Ok(commit) => Some(Ok(Box::new(commit) as Box<dyn CommitView + 'r>)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// A commit read from the object database; its diff is computed on first use.
struct GitCommit<'r> {
    repo: &'r GitRepo,
    id: ObjectId,
    info: CommitInfo,
    parents: Vec<ObjectId>,
    files: OnceCell<Vec<FileStats>>,
}

impl CommitView for GitCommit<'_> {
    fn info(&self) -> &CommitInfo {
        &self.info
    }

    fn file_stats(&self) -> Result<Vec<FileStats>> {
        if let Some(files) = self.files.get() {
            return Ok(files.clone());
        }
        let files = self
            .repo
            .compute_file_stats(self.id, self.parents.first().copied())
            .map_err(|e| match e {
                GitdescError::Extraction { .. } => e,
                other => GitdescError::extraction(self.info.id.clone(), other),
            })?;
        let _ = self.files.set(files.clone());
        Ok(files)
    }
}
