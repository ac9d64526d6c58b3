use super::limit::Limit;
use super::validity::Validity;
use crate::error::Result;
use crate::history::{CommitView, Commits};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Stopped,
}

/// Filters and truncates a commit walk.
///
/// Each pulled commit is shown to the limit first; once it fires the commit is
/// dropped and the underlying walk is never pulled again. Otherwise the commit
/// is yielded when the validity predicate accepts it. Errors from the walk or
/// from the predicate are yielded once and end the traversal.
pub struct Traversal<'c> {
    commits: Commits<'c>,
    validity: Validity,
    limit: Limit,
    state: State,
    visited: usize,
}

impl<'c> Traversal<'c> {
    pub fn new(commits: Commits<'c>, validity: Validity, limit: Limit) -> Self {
        Self {
            commits,
            validity,
            limit,
            state: State::Running,
            visited: 0,
        }
    }

    /// Number of commits pulled from the walk, including the one that hit the limit.
    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn is_stopped(&self) -> bool {
        self.state == State::Stopped
    }

    fn stop(&mut self) {
        self.state = State::Stopped;
    }
}

impl<'c> Iterator for Traversal<'c> {
    type Item = Result<Box<dyn CommitView + 'c>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state == State::Running {
            let commit = match self.commits.next() {
                Some(Ok(commit)) => commit,
                Some(Err(e)) => {
                    self.stop();
                    return Some(Err(e));
                }
                None => {
                    debug!(visited = self.visited, "history exhausted");
                    self.stop();
                    return None;
                }
            };
            self.visited += 1;

            if self.limit.should_stop(&*commit) {
                info!(commit = %commit.info().id, visited = self.visited, "limit reached, stopping traversal");
                self.stop();
                return None;
            }

            match self.validity.accepts(&*commit) {
                Ok(true) => {
                    debug!(commit = %commit.info().id, "commit accepted");
                    return Some(Ok(commit));
                }
                Ok(false) => debug!(commit = %commit.info().id, "commit filtered out"),
                Err(e) => {
                    self.stop();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
