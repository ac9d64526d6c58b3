use crate::error::Result;
use crate::history::CommitView;
use crate::model::{Dimension, Stats};

/// Turns one commit into statistics records: one per touched file, then one for
/// the attributed author name and one for the attributed email when non-empty.
///
/// Failing to read the commit's files is an error, never an empty result.
pub fn extract(commit: &dyn CommitView) -> Result<Vec<Stats>> {
    let files = commit.file_stats()?;
    let mut stats = Vec::with_capacity(files.len() + 2);
    let (mut added, mut deleted) = (0u64, 0u64);
    for f in &files {
        stats.push(Stats::single(
            Dimension::File,
            f.path.clone(),
            f.added_lines,
            f.deleted_lines,
        ));
        added += f.added_lines;
        deleted += f.deleted_lines;
    }

    let info = commit.info();
    let name = info.attributed_name();
    if !name.is_empty() {
        stats.push(Stats::single(Dimension::Author, name, added, deleted));
    }
    let email = info.attributed_email();
    if !email.is_empty() {
        stats.push(Stats::single(Dimension::Email, email, added, deleted));
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fixtures::{at, commit};
    use crate::history::MemoryCommit;
    use crate::model::Identity;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_record_per_file_plus_identities() {
        let c = commit("c1", "alice", 1).file("a.rs", 3, 1).file("b.rs", 2, 0);
        let stats = extract(&c).unwrap();
        assert_eq!(
            stats,
            vec![
                Stats::single(Dimension::File, "a.rs", 3, 1),
                Stats::single(Dimension::File, "b.rs", 2, 0),
                Stats::single(Dimension::Author, "alice", 5, 1),
                Stats::single(Dimension::Email, "alice@example.com", 5, 1),
            ]
        );
    }

    #[test]
    fn committer_takes_precedence() {
        let c = commit("c1", "alice", 1)
            .committer(Identity::new("bob", "bob@example.com"))
            .file("a.rs", 1, 0);
        let stats = extract(&c).unwrap();
        assert!(stats.contains(&Stats::single(Dimension::Author, "bob", 1, 0)));
        assert!(stats.contains(&Stats::single(Dimension::Email, "bob@example.com", 1, 0)));
        assert!(!stats.iter().any(|s| s.name == "alice"));
    }

    #[test]
    fn empty_commit_yields_identity_records_only() {
        let stats = extract(&commit("c1", "alice", 1)).unwrap();
        assert_eq!(
            stats,
            vec![
                Stats::single(Dimension::Author, "alice", 0, 0),
                Stats::single(Dimension::Email, "alice@example.com", 0, 0),
            ]
        );
    }

    #[test]
    fn anonymous_empty_commit_yields_nothing() {
        let c = MemoryCommit::new("c1", Identity::default(), at(1));
        assert!(extract(&c).unwrap().is_empty());
    }

    #[test]
    fn unreadable_files_are_fatal() {
        let c = commit("c1", "alice", 1).broken("object missing");
        assert!(extract(&c).is_err());
    }
}
