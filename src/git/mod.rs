//! Git operations using git2-rs.

pub mod commit;
pub mod diff;

pub use commit::commit_staged;
pub use diff::{DEFAULT_EXCLUDES, StagedDiff, collect_staged_diff};
