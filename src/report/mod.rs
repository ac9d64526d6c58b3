pub mod aggregate;
pub mod extract;
pub mod output;

pub use aggregate::{rank, Report};
pub use extract::extract;
pub use output::{output_json, output_ndjson};
