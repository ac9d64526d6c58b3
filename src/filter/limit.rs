//! Stop conditions for a history walk.
//!
//! A [`Limit`] answers "should the walk stop here?" and, unlike a
//! [`Validity`](super::Validity), returning `true` means the current commit is
//! excluded and nothing older is read. Limits may carry state, so they must see
//! every commit exactly once, newest first. Each constructor returns a fresh
//! instance; never reuse one across walks.
//!
//! Date limits assume commit times never increase along the walk. Clock skew or
//! rewritten history can break that and stop the walk early.

use crate::history::CommitView;
use chrono::{DateTime, Utc};

type Stop = dyn FnMut(&dyn CommitView) -> bool + Send;

pub struct Limit {
    stop: Box<Stop>,
}

impl Limit {
    pub fn new<F>(stop: F) -> Self
    where
        F: FnMut(&dyn CommitView) -> bool + Send + 'static,
    {
        Self {
            stop: Box::new(stop),
        }
    }

    /// A limit that never fires.
    pub fn unlimited() -> Self {
        Self::new(|_| false)
    }

    pub fn should_stop(&mut self, commit: &dyn CommitView) -> bool {
        (self.stop)(commit)
    }
}

impl std::fmt::Debug for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Limit(..)")
    }
}

/// Stops only once every limit in `limits` wants to stop.
///
/// Every limit is consulted on every commit, so stateful members keep counting
/// even while an earlier one says "continue". No limits never stop.
pub fn compose(mut limits: Vec<Limit>) -> Limit {
    if limits.is_empty() {
        return Limit::unlimited();
    }
    Limit::new(move |commit| {
        let mut stop = true;
        for limit in limits.iter_mut() {
            stop &= limit.should_stop(commit);
        }
        stop
    })
}

/// Lets the first `n` commits through, then stops.
pub fn limit_count(n: usize) -> Limit {
    let mut seen = 0usize;
    Limit::new(move |_| {
        if seen >= n {
            return true;
        }
        seen += 1;
        false
    })
}

/// Stops at the first commit strictly older than `boundary`; a commit made
/// exactly at `boundary` is kept.
pub fn limit_before(boundary: DateTime<Utc>) -> Limit {
    Limit::new(move |commit| commit.info().timestamp < boundary)
}

/// Stops at the first commit made at or before `boundary`; only commits
/// strictly newer than `boundary` are kept.
pub fn limit_after(boundary: DateTime<Utc>) -> Limit {
    Limit::new(move |commit| commit.info().timestamp <= boundary)
}
