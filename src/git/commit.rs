//! Committing the picked message.

use git2::{Oid, Repository};
use tracing::debug;

use crate::error::CommitError;

/// Commit the current index on HEAD with `message`.
///
/// Only what is already staged is committed. Works on unborn branches by
/// creating a root commit.
pub fn commit_staged(repo: &Repository, message: &str) -> Result<Oid, CommitError> {
    let mut index = repo.index().map_err(CommitError::IndexFailed)?;
    let tree_id = index.write_tree().map_err(CommitError::IndexFailed)?;
    let tree = repo.find_tree(tree_id).map_err(CommitError::CommitFailed)?;

    let sig = repo.signature().map_err(CommitError::ConfigError)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(CommitError::CommitFailed)?),
        Err(e)
            if e.code() == git2::ErrorCode::UnbornBranch
                || e.code() == git2::ErrorCode::NotFound =>
        {
            None
        }
        Err(e) => return Err(CommitError::CommitFailed(e)),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(CommitError::CommitFailed)?;

    debug!("Created commit {}", oid);
    Ok(oid)
}
