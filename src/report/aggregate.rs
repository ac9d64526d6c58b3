use crate::model::{Dimension, GroupOutput, Stats};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Statistics merged by `(dimension, name)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    entries: HashMap<(Dimension, String), Stats>,
    commits: u64,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `stats`, or sums it into the entry already holding its key.
    pub fn add(&mut self, stats: Stats) {
        match self.entries.entry((stats.dimension, stats.name.clone())) {
            Entry::Occupied(mut existing) => existing.get_mut().merge(&stats),
            Entry::Vacant(slot) => {
                slot.insert(stats);
            }
        }
    }

    /// Adds every record extracted from one commit.
    pub fn add_commit(&mut self, stats: Vec<Stats>) {
        self.commits += 1;
        for s in stats {
            self.add(s);
        }
    }

    pub fn merge(&mut self, other: Report) {
        self.commits += other.commits;
        for s in other.entries.into_values() {
            self.add(s);
        }
    }

    pub fn get(&self, dimension: Dimension, name: &str) -> Option<&Stats> {
        self.entries.get(&(dimension, name.to_string()))
    }

    /// Number of commits that contributed to this report.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one dimension in ranking order.
    pub fn ranked(&self, dimension: Dimension) -> Vec<&Stats> {
        let mut entries: Vec<&Stats> = self
            .entries
            .values()
            .filter(|s| s.dimension == dimension)
            .collect();
        entries.sort_by(|a, b| rank(a, b));
        entries
    }

    pub fn groups(&self, order: &[Dimension]) -> Vec<GroupOutput> {
        order
            .iter()
            .map(|&dimension| GroupOutput {
                dimension,
                entries: self.ranked(dimension).into_iter().cloned().collect(),
            })
            .collect()
    }
}

impl Extend<Stats> for Report {
    fn extend<T: IntoIterator<Item = Stats>>(&mut self, iter: T) {
        for s in iter {
            self.add(s);
        }
    }
}

/// Most commits first, then most additions, then name.
pub fn rank(a: &Stats, b: &Stats) -> Ordering {
    b.commits
        .cmp(&a.commits)
        .then_with(|| b.additions.cmp(&a.additions))
        .then_with(|| a.name.cmp(&b.name))
}
