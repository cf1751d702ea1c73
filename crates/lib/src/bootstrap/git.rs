//! Repository clones into `ext/`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GitError {
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("invalid revision '{rev}': {source}")]
  Revision {
    rev: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to check out '{}': {source}", path.display())]
  Checkout {
    path: PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to resolve HEAD of '{}': {message}", path.display())]
  ResolveHead { path: PathBuf, message: String },
}

/// Clone `url` into `dest` and check out its worktree.
///
/// `rev` names a branch or tag to check out instead of the remote's default
/// branch. Returns the commit hash of the checked-out HEAD.
pub fn clone_repo(url: &str, rev: Option<&str>, dest: &Path) -> Result<String, GitError> {
  info!(url, rev = ?rev, path = %dest.display(), "cloning repository");

  let mut prepared = gix::prepare_clone(url, dest).map_err(|e| GitError::Clone {
    url: url.to_string(),
    source: Box::new(e),
  })?;

  if let Some(rev) = rev {
    prepared = prepared.with_ref_name(Some(rev)).map_err(|e| GitError::Revision {
      rev: rev.to_string(),
      source: Box::new(e),
    })?;
  }

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| GitError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  let (repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| GitError::Checkout {
      path: dest.to_path_buf(),
      source: Box::new(e),
    })?;

  let head_err = |message: String| GitError::ResolveHead {
    path: dest.to_path_buf(),
    message,
  };
  let mut head = repo.head().map_err(|e| head_err(e.to_string()))?;
  let commit = head.peel_to_commit().map_err(|e| head_err(e.to_string()))?;

  debug!(path = %dest.display(), commit = %commit.id, "checked out");
  Ok(commit.id.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::process::Command;
  use tempfile::TempDir;

  fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
      .args(["-c", "user.name=bootwaf", "-c", "user.email=bootwaf@example.invalid"])
      .args(args)
      .current_dir(dir)
      .output()
      .unwrap();
    assert!(output.status.success(), "git {:?}: {}", args, String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).trim().to_string()
  }

  /// A local repository with tag `v1` one commit behind the default branch.
  fn upstream(temp: &TempDir) -> PathBuf {
    let repo = temp.path().join("upstream");
    fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "-q"]);
    fs::write(repo.join("VERSION"), "1\n").unwrap();
    git(&repo, &["add", "VERSION"]);
    git(&repo, &["commit", "-q", "-m", "first"]);
    git(&repo, &["tag", "v1"]);
    fs::write(repo.join("VERSION"), "2\n").unwrap();
    git(&repo, &["commit", "-q", "-am", "second"]);
    repo
  }

  #[test]
  fn clone_checks_out_default_branch() {
    if which::which("git").is_err() {
      return;
    }
    let temp = TempDir::new().unwrap();
    let repo = upstream(&temp);
    let dest = temp.path().join("dep");

    let commit = clone_repo(repo.to_str().unwrap(), None, &dest).unwrap();

    assert_eq!(commit, git(&repo, &["rev-parse", "HEAD"]));
    assert_eq!(fs::read_to_string(dest.join("VERSION")).unwrap(), "2\n");
  }

  #[test]
  fn clone_checks_out_requested_tag() {
    if which::which("git").is_err() {
      return;
    }
    let temp = TempDir::new().unwrap();
    let repo = upstream(&temp);
    let dest = temp.path().join("dep");

    let commit = clone_repo(repo.to_str().unwrap(), Some("v1"), &dest).unwrap();

    assert_eq!(commit, git(&repo, &["rev-parse", "v1^{commit}"]));
    assert_eq!(fs::read_to_string(dest.join("VERSION")).unwrap(), "1\n");
  }

  #[test]
  fn clone_of_missing_local_repository_fails() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("does-not-exist");
    let dest = temp.path().join("dest");

    let result = clone_repo(source.to_str().unwrap(), None, &dest);
    assert!(matches!(result, Err(GitError::Clone { .. })));
  }
}
