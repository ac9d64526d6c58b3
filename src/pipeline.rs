//! Runs traversal and extraction on a producer thread while the calling thread
//! aggregates, connected by a bounded channel of per-commit record batches.
//!
//! The first error from either side aborts the run and no partial report is
//! returned.

use crate::error::{GitdescError, Result};
use crate::filter::{Limit, Traversal, Validity};
use crate::history::CommitSource;
use crate::model::Stats;
use crate::report::{extract, Report};
use indicatif::ProgressBar;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread;
use tracing::{debug, info};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

type Batch = Result<Vec<Stats>>;

pub struct ReportPipeline {
    validity: Validity,
    limit: Limit,
    capacity: usize,
    progress: ProgressBar,
}

impl ReportPipeline {
    pub fn new(validity: Validity, limit: Limit) -> Self {
        Self {
            validity,
            limit,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            progress: ProgressBar::hidden(),
        }
    }

    /// Number of commit batches buffered between producer and consumer, at least one.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Ticked once per extracted commit.
    pub fn progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn run<S>(self, source: S) -> Result<Report>
    where
        S: CommitSource + Send,
    {
        let ReportPipeline {
            validity,
            limit,
            capacity,
            progress,
        } = self;
        let (tx, rx) = sync_channel::<Batch>(capacity);

        thread::scope(|scope| {
            let producer = scope.spawn(move || produce(source, validity, limit, tx, progress));
            let consumed = consume(rx);
            let produced = producer.join();
            match (consumed, produced) {
                (Err(e), _) => Err(e),
                (Ok(_), Err(_)) => Err(GitdescError::PipelineClosed),
                (Ok(report), Ok(())) => {
                    info!(commits = report.commits(), entries = report.len(), "report complete");
                    Ok(report)
                }
            }
        })
    }
}

/// Runs a report with the default channel capacity and no progress output.
pub fn run_report<S>(source: S, validity: Validity, limit: Limit) -> Result<Report>
where
    S: CommitSource + Send,
{
    ReportPipeline::new(validity, limit).run(source)
}

fn produce<S: CommitSource>(
    source: S,
    validity: Validity,
    limit: Limit,
    tx: SyncSender<Batch>,
    progress: ProgressBar,
) {
    let commits = match source.commits() {
        Ok(commits) => commits,
        Err(e) => {
            let _ = tx.send(Err(e));
            return;
        }
    };

    for commit in Traversal::new(commits, validity, limit) {
        let batch = commit.and_then(|c| extract(&*c));
        let failed = batch.is_err();
        if tx.send(batch).is_err() {
            debug!("consumer gone, stopping producer");
            break;
        }
        if failed {
            break;
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
}

fn consume(rx: Receiver<Batch>) -> Result<Report> {
    let mut report = Report::new();
    for batch in rx {
        report.add_commit(batch?);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::limit::limit_count;
    use crate::filter::FilterOptions;
    use crate::history::fixtures::{commit, four_commits};
    use crate::history::MemoryHistory;
    use crate::model::Dimension;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    fn totals(report: &Report, dimension: Dimension, name: &str) -> (u64, u64, u64) {
        let s = report
            .get(dimension, name)
            .unwrap_or_else(|| panic!("missing {dimension} {name}"));
        (s.commits, s.additions, s.deletions)
    }

    #[test]
    fn four_commit_history_totals() {
        let report = run_report(four_commits(), Validity::always(), Limit::unlimited()).unwrap();
        assert_eq!(report.commits(), 4);
        assert_eq!(totals(&report, Dimension::Author, "a"), (3, 5, 2));
        assert_eq!(totals(&report, Dimension::Author, "b"), (1, 0, 1));
        assert_eq!(totals(&report, Dimension::Email, "a@example.com"), (3, 5, 2));
        assert_eq!(totals(&report, Dimension::File, "test"), (3, 3, 2));
        assert_eq!(totals(&report, Dimension::File, "dir/test"), (2, 1, 1));
        assert_eq!(totals(&report, Dimension::File, "dir/dir/test"), (1, 1, 0));
    }

    #[test]
    fn count_limit_reports_newest_commits_only() {
        let history = four_commits();
        let pulled = history.pull_counter();
        let report = run_report(history, Validity::always(), limit_count(2)).unwrap();
        assert_eq!(report.commits(), 2);
        // c4 by b and c3 by a
        assert_eq!(totals(&report, Dimension::Author, "b"), (1, 0, 1));
        assert_eq!(totals(&report, Dimension::Author, "a"), (1, 1, 1));
        assert!(report.get(Dimension::File, "dir/dir/test").is_none());
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn empty_filters_match_explicit_always_and_unlimited() {
        let options = FilterOptions::default();
        let implicit = run_report(
            four_commits(),
            options.build_validity().unwrap(),
            options.build_limit().unwrap(),
        )
        .unwrap();
        let explicit = run_report(four_commits(), Validity::always(), Limit::unlimited()).unwrap();
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn extraction_error_discards_partial_report() {
        let history = MemoryHistory::new(vec![
            commit("c3", "a", 3).file("x", 1, 0),
            commit("c2", "a", 2).broken("corrupt tree"),
            commit("c1", "a", 1).file("x", 1, 0),
        ]);
        let pulled = history.pull_counter();
        let err = run_report(history, Validity::always(), Limit::unlimited()).unwrap_err();
        assert!(err.to_string().contains("corrupt tree"));
        assert_eq!(err.kind(), crate::error::ErrorKind::Extraction);
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tiny_channel_still_delivers_everything() {
        let commits: Vec<_> = (1..=28)
            .rev()
            .map(|d| commit(&format!("c{d}"), if d % 2 == 0 { "even" } else { "odd" }, d).file("f", 1, 0))
            .collect();
        let report = ReportPipeline::new(Validity::always(), Limit::unlimited())
            .channel_capacity(1)
            .run(MemoryHistory::new(commits))
            .unwrap();
        assert_eq!(totals(&report, Dimension::File, "f"), (28, 28, 0));
        assert_eq!(totals(&report, Dimension::Author, "even"), (14, 14, 0));
    }

    #[test]
    fn repeated_runs_do_not_share_limit_state() {
        let options = FilterOptions {
            max_count: 1,
            ..Default::default()
        };
        for _ in 0..3 {
            let report = run_report(
                four_commits(),
                options.build_validity().unwrap(),
                options.build_limit().unwrap(),
            )
            .unwrap();
            assert_eq!(report.commits(), 1);
            assert_eq!(totals(&report, Dimension::Author, "b"), (1, 0, 1));
        }
    }
}
