use super::limit::{self, limit_after, limit_before, limit_count, Limit};
use super::validity::{
    self, committed_until, match_file_pattern, match_regex, skip_merges, Field, FileMatchPolicy,
    Validity,
};
use crate::error::{GitdescError, Result};
use chrono::{DateTime, Utc};

/// Filter configuration. Empty patterns, `None` dates and a zero count add no constraint.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub author: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub file: Option<String>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub max_count: i64,
    pub skip_merges: bool,
    pub file_match_policy: FileMatchPolicy,
}

fn pattern(p: &Option<String>) -> Option<&str> {
    p.as_deref().filter(|p| !p.is_empty())
}

impl FilterOptions {
    /// Checks everything that can be checked without touching the repository.
    pub fn validate(&self) -> Result<()> {
        if self.max_count < 0 {
            return Err(GitdescError::InvalidCount(self.max_count));
        }
        Ok(())
    }

    pub fn build_validity(&self) -> Result<Validity> {
        self.validate()?;
        let mut predicates = Vec::new();
        if let Some(p) = pattern(&self.author) {
            predicates.push(match_regex(Field::AttributedName, p)?);
        }
        if let Some(p) = pattern(&self.email) {
            predicates.push(match_regex(Field::AttributedEmail, p)?);
        }
        if let Some(p) = pattern(&self.message) {
            predicates.push(match_regex(Field::Message, p)?);
        }
        if let Some(until) = self.until {
            predicates.push(committed_until(until));
        }
        if self.skip_merges {
            predicates.push(skip_merges());
        }
        // reads the commit's diff, so it goes last
        if let Some(p) = pattern(&self.file) {
            predicates.push(match_file_pattern(p, self.file_match_policy)?);
        }
        Ok(validity::compose(predicates))
    }

    /// Builds a fresh limit; call once per walk.
    pub fn build_limit(&self) -> Result<Limit> {
        self.validate()?;
        let mut limits = Vec::new();
        if self.max_count > 0 {
            limits.push(limit_count(self.max_count as usize));
        }
        if let Some(before) = self.before {
            limits.push(limit_before(before));
        }
        if let Some(after) = self.after {
            limits.push(limit_after(after));
        }
        Ok(limit::compose(limits))
    }
}
