//! Actions, plans and errors for bootstrap.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::archive::ArchiveError;
use super::fetch::FetchError;
use super::git::GitError;
use super::packages::PackageManager;

#[derive(Debug, Error)]
pub enum BootstrapError {
  /// The OS release could not be read or maps to no known package manager.
  #[error("unsupported platform: {0}")]
  UnsupportedPlatform(String),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Git(#[from] GitError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  #[error("failed to start '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  #[error("dependency '{dependency}': expected source directory '{}' after extraction", path.display())]
  MissingSourceDir { dependency: String, path: PathBuf },

  #[error("dependency '{dependency}': patch file not found: {}", path.display())]
  PatchNotFound { dependency: String, path: PathBuf },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

/// One step of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  InstallPackages {
    manager: PackageManager,
    packages: Vec<String>,
  },
  WriteStamp {
    path: PathBuf,
    content: String,
  },
  Download {
    dependency: String,
    url: String,
    sha256: Option<String>,
    dest: PathBuf,
  },
  Extract {
    dependency: String,
    archive: PathBuf,
    into: PathBuf,
    /// Directory the archive is expected to produce.
    source_dir: PathBuf,
  },
  Clone {
    dependency: String,
    url: String,
    rev: Option<String>,
    dest: PathBuf,
  },
  Patch {
    dependency: String,
    patch: PathBuf,
    dir: PathBuf,
  },
  Run {
    dependency: String,
    cmd: String,
    cwd: PathBuf,
    sudo: bool,
  },
}

impl Action {
  /// Whether executing this action touches the network.
  pub fn is_network(&self) -> bool {
    matches!(self, Action::Download { .. } | Action::Clone { .. })
  }

  /// Whether executing this action installs anything.
  pub fn is_install(&self) -> bool {
    match self {
      Action::InstallPackages { .. } => true,
      Action::Run { sudo, .. } => *sudo,
      _ => false,
    }
  }

  pub fn dependency(&self) -> Option<&str> {
    match self {
      Action::InstallPackages { .. } | Action::WriteStamp { .. } => None,
      Action::Download { dependency, .. }
      | Action::Extract { dependency, .. }
      | Action::Clone { dependency, .. }
      | Action::Patch { dependency, .. }
      | Action::Run { dependency, .. } => Some(dependency),
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Action::InstallPackages { manager, packages } => {
        write!(f, "install {} package(s) with {}: {}", packages.len(), manager, packages.join(" "))
      }
      Action::WriteStamp { path, .. } => write!(f, "record packages in {}", path.display()),
      Action::Download { url, dest, .. } => write!(f, "download {} -> {}", url, dest.display()),
      Action::Extract { archive, into, .. } => {
        write!(f, "extract {} -> {}", archive.display(), into.display())
      }
      Action::Clone { url, rev, dest, .. } => match rev {
        Some(rev) => write!(f, "clone {}@{} -> {}", url, rev, dest.display()),
        None => write!(f, "clone {} -> {}", url, dest.display()),
      },
      Action::Patch { patch, dir, .. } => write!(f, "patch {} with {}", dir.display(), patch.display()),
      Action::Run { cmd, sudo, .. } => {
        if *sudo {
          write!(f, "run (sudo) {}", cmd)
        } else {
          write!(f, "run {}", cmd)
        }
      }
    }
  }
}

/// Ordered actions plus the environment every command runs with.
#[derive(Debug, Clone, Default)]
pub struct BootstrapPlan {
  /// Project root; package manager commands run here.
  pub root: PathBuf,
  pub actions: Vec<Action>,
  pub env: BTreeMap<String, String>,
  /// Dependencies found already present, in declaration order.
  pub present: Vec<String>,
}

impl BootstrapPlan {
  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }

  pub fn has_network_actions(&self) -> bool {
    self.actions.iter().any(Action::is_network)
  }

  pub fn has_install_actions(&self) -> bool {
    self.actions.iter().any(Action::is_install)
  }
}

/// Counts of what an apply run executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
  pub packages_installed: usize,
  pub downloaded: usize,
  pub extracted: usize,
  pub cloned: usize,
  pub patched: usize,
  pub commands: usize,
}

impl ApplyReport {
  pub fn total(&self) -> usize {
    self.packages_installed + self.downloaded + self.extracted + self.cloned + self.patched + self.commands
  }
}
