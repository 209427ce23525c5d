//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod combine;
pub mod filter;
pub mod groupby;
pub mod summary;
pub mod utils;

// Re-export main command functions
pub use combine::{execute_combine, CombineArgs};
pub use filter::{execute_filter, FilterArgs};
pub use groupby::{execute_groupby, GroupbyArgs};
pub use summary::{execute_summary, SummaryArgs};
pub use utils::{display_schema, display_version, load_frame, validate_literal_file};
