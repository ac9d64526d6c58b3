pub mod limit;
pub mod options;
pub mod traversal;
pub mod validity;

pub use limit::{limit_after, limit_before, limit_count, Limit};
pub use options::FilterOptions;
pub use traversal::Traversal;
pub use validity::{match_file_pattern, match_regex, Field, FileMatchPolicy, Validity};
