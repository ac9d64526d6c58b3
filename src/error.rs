use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitdescError>;

/// Coarse classification of [`GitdescError`], used to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input, detected before any traversal starts.
    Config,
    /// The repository could not be found or read.
    RepositoryAccess,
    /// A commit's statistics could not be computed mid-traversal.
    Extraction,
    /// Writing the report failed.
    Output,
}

#[derive(Error, Debug)]
pub enum GitdescError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid commit count {0}: must not be negative")]
    InvalidCount(i64),
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Cannot compute statistics of commit {commit}: {reason}")]
    Extraction { commit: String, reason: String },
    #[error("Statistics producer stopped unexpectedly")]
    PipelineClosed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl GitdescError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitdescError::InvalidPattern { .. }
            | GitdescError::InvalidDate(_)
            | GitdescError::InvalidCount(_) => ErrorKind::Config,
            GitdescError::GitRepo(_)
            | GitdescError::GitDiscover(_)
            | GitdescError::RefFind(_)
            | GitdescError::HeadPeel(_)
            | GitdescError::ObjectFind(_)
            | GitdescError::ObjectFindConv(_)
            | GitdescError::Commit(_)
            | GitdescError::ObjectDecode(_) => ErrorKind::RepositoryAccess,
            GitdescError::DiffTreeToTree(_)
            | GitdescError::Extraction { .. }
            | GitdescError::PipelineClosed => ErrorKind::Extraction,
            GitdescError::Io(_) | GitdescError::Serde(_) => ErrorKind::Output,
        }
    }

    /// Wraps any failure raised while diffing `commit` into an extraction error.
    pub fn extraction(commit: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        GitdescError::Extraction {
            commit: commit.into(),
            reason: reason.to_string(),
        }
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::discover::Error> for GitdescError {
    fn from(err: gix::discover::Error) -> Self {
        GitdescError::GitDiscover(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for GitdescError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        GitdescError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for GitdescError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        GitdescError::HeadPeel(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for GitdescError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        GitdescError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for GitdescError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        GitdescError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for GitdescError {
    fn from(err: gix::object::commit::Error) -> Self {
        GitdescError::Commit(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for GitdescError {
    fn from(err: gix::objs::decode::Error) -> Self {
        GitdescError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for GitdescError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        GitdescError::DiffTreeToTree(Box::new(err))
    }
}
