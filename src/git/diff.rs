//! Staged diff collection using git2.

use git2::{Delta, Diff, DiffFormat, ErrorCode, Repository, Tree};
use tracing::{debug, warn};

use crate::error::CommitError;

/// Maximum characters for the unified diff text before truncation.
const MAX_DIFF_LENGTH: usize = 30_000;

/// Files left out of the diff unless explicitly requested.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "Cargo.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "*.lock",
];

/// The staged changes handed to the generator.
#[derive(Debug, Clone)]
pub struct StagedDiff {
    /// Unified diff text of the staged changes.
    pub text: String,
    /// Paths of the staged files that made it into `text`.
    pub files: Vec<String>,
    pub truncated: bool,
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, CommitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(CommitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(CommitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect the staged diff (HEAD tree vs index).
///
/// Paths matching `excludes` (exact path, file name, or `*.ext` glob) are
/// skipped. Returns `CommitError::NoChanges` when nothing remains.
pub fn collect_staged_diff(
    repo: &Repository,
    excludes: &[String],
) -> Result<StagedDiff, CommitError> {
    let head_tree = resolve_head_tree(repo)?;
    let index = repo.index().map_err(CommitError::IndexFailed)?;

    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
        .map_err(CommitError::DiffFailed)?;

    let files = collect_files(&diff, excludes);
    if files.is_empty() {
        return Err(CommitError::NoChanges);
    }

    let (text, truncated) = diff_text(&diff, excludes);
    debug!(
        "Staged diff: {} file(s), {} chars, truncated={}",
        files.len(),
        text.len(),
        truncated
    );

    Ok(StagedDiff {
        text,
        files,
        truncated,
    })
}

fn delta_path(delta: &git2::DiffDelta<'_>) -> Option<String> {
    delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())
        .map(|p| p.to_string_lossy().to_string())
}

fn collect_files(diff: &Diff<'_>, excludes: &[String]) -> Vec<String> {
    diff.deltas()
        .filter(|d| !matches!(d.status(), Delta::Unmodified | Delta::Ignored))
        .filter_map(|d| delta_path(&d))
        .filter(|path| !is_excluded(path, excludes))
        .collect()
}

fn diff_text(diff: &Diff<'_>, excludes: &[String]) -> (String, bool) {
    let mut text = String::new();
    let mut truncated = false;

    let result = diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        if truncated {
            return true;
        }
        if delta_path(&delta).is_some_and(|p| is_excluded(&p, excludes)) {
            return true;
        }

        let content = String::from_utf8_lossy(line.content());
        if text.len() + content.len() + 1 > MAX_DIFF_LENGTH {
            truncated = true;
            return true;
        }

        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&content);
        true
    });

    if let Err(e) = result {
        warn!("Failed to collect diff text: {e}");
        truncated = true;
    }

    (text, truncated)
}

/// Whether `path` matches one of the exclude patterns.
pub fn is_excluded(path: &str, excludes: &[String]) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    excludes.iter().any(|pattern| {
        if let Some(ext) = pattern.strip_prefix("*.") {
            file_name
                .rsplit_once('.')
                .is_some_and(|(_, file_ext)| file_ext == ext)
        } else {
            path == pattern || file_name == pattern
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn init_repo_with_commit() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let sig = git2::Signature::now("Test", "test@test.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        (dir, repo)
    }

    fn stage(repo: &Repository, dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn test_nothing_staged_returns_no_changes() {
        let (dir, repo) = init_repo_with_commit();
        // Untracked files are not staged
        std::fs::write(dir.path().join("new.txt"), "hello\n").unwrap();

        let result = collect_staged_diff(&repo, &[]);
        assert!(matches!(result, Err(CommitError::NoChanges)));
    }

    #[test]
    fn test_staged_file_is_collected() {
        let (dir, repo) = init_repo_with_commit();
        stage(&repo, dir.path(), "foo.rs", "fn foo() {}\n");

        let diff = collect_staged_diff(&repo, &[]).unwrap();
        assert_eq!(diff.files, vec!["foo.rs"]);
        assert!(diff.text.contains("+fn foo() {}"));
        assert!(!diff.truncated);
    }

    #[test]
    fn test_unstaged_changes_are_ignored() {
        let (dir, repo) = init_repo_with_commit();
        stage(&repo, dir.path(), "a.txt", "staged\n");
        std::fs::write(dir.path().join("b.txt"), "not staged\n").unwrap();

        let diff = collect_staged_diff(&repo, &[]).unwrap();
        assert_eq!(diff.files, vec!["a.txt"]);
        assert!(!diff.text.contains("not staged"));
    }

    #[test]
    fn test_excluded_files_are_skipped() {
        let (dir, repo) = init_repo_with_commit();
        stage(&repo, dir.path(), "Cargo.lock", "# lock\n");
        stage(&repo, dir.path(), "main.rs", "fn main() {}\n");

        let excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        let diff = collect_staged_diff(&repo, &excludes).unwrap();
        assert_eq!(diff.files, vec!["main.rs"]);
        assert!(!diff.text.contains("# lock"));
    }

    #[test]
    fn test_only_excluded_files_is_no_changes() {
        let (dir, repo) = init_repo_with_commit();
        stage(&repo, dir.path(), "yarn.lock", "x\n");

        let excludes = vec!["yarn.lock".to_string()];
        assert!(matches!(
            collect_staged_diff(&repo, &excludes),
            Err(CommitError::NoChanges)
        ));
    }

    #[test]
    fn test_empty_repo_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        stage(&repo, dir.path(), "new.txt", "hello\n");

        let diff = collect_staged_diff(&repo, &[]).unwrap();
        assert_eq!(diff.files, vec!["new.txt"]);
    }

    #[test]
    fn test_is_excluded_patterns() {
        let excludes = vec!["*.lock".to_string(), "dist/bundle.js".to_string()];
        assert!(is_excluded("Cargo.lock", &excludes));
        assert!(is_excluded("sub/dir/poetry.lock", &excludes));
        assert!(is_excluded("dist/bundle.js", &excludes));
        assert!(!is_excluded("src/lock.rs", &excludes));
        assert!(!is_excluded("bundle.js", &excludes));
    }
}
