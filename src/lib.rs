pub mod cli;
pub mod error;
pub mod filter;
pub mod git;
pub mod history;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod util;

pub use error::{GitdescError, Result};
pub use filter::{FilterOptions, Limit, Validity};
pub use history::{CommitSource, CommitView};
pub use pipeline::{run_report, ReportPipeline};
pub use report::Report;
