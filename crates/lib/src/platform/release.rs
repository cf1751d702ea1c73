//! os-release parsing.
//!
//! The file is a list of `KEY=value` lines; values may be wrapped in single or
//! double quotes and `#` starts a comment. Only the identification keys are kept.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{OS_RELEASE_ENV, OS_RELEASE_PATH};

#[derive(Debug, Error)]
pub enum ReleaseError {
  #[error("cannot read os release file '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("os release file '{}' has no ID", path.display())]
  MissingId { path: PathBuf },
}

/// Identification of the running distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
  pub id: String,
  pub id_like: Vec<String>,
  pub version_id: Option<String>,
  pub pretty_name: Option<String>,
}

impl OsRelease {
  /// Parse the contents of an os-release file.
  ///
  /// Returns `None` when no `ID` key is present.
  pub fn parse(content: &str) -> Option<Self> {
    let mut release = OsRelease::default();

    for line in content.lines() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      let Some((key, value)) = line.split_once('=') else {
        continue;
      };
      let value = unquote(value.trim());

      match key.trim() {
        "ID" => release.id = value.to_lowercase(),
        "ID_LIKE" => release.id_like = value.split_whitespace().map(str::to_lowercase).collect(),
        "VERSION_ID" => release.version_id = Some(value.to_string()),
        "PRETTY_NAME" => release.pretty_name = Some(value.to_string()),
        _ => {}
      }
    }

    if release.id.is_empty() { None } else { Some(release) }
  }

  /// Identifiers to match against, most specific first.
  pub fn candidates(&self) -> impl Iterator<Item = &str> {
    std::iter::once(self.id.as_str()).chain(self.id_like.iter().map(String::as_str))
  }

  /// Human readable name, falling back to `ID VERSION_ID`.
  pub fn display_name(&self) -> String {
    match (&self.pretty_name, &self.version_id) {
      (Some(pretty), _) => pretty.clone(),
      (None, Some(version)) => format!("{} {}", self.id, version),
      (None, None) => self.id.clone(),
    }
  }
}

fn unquote(value: &str) -> &str {
  for quote in ['"', '\''] {
    if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
      return inner;
    }
  }
  value
}

/// Path of the os-release file, honoring `BOOTWAF_OS_RELEASE`.
pub fn os_release_path() -> PathBuf {
  std::env::var_os(OS_RELEASE_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(OS_RELEASE_PATH))
}

/// Read and parse an os-release file.
pub fn detect_release(path: &Path) -> Result<OsRelease, ReleaseError> {
  let content = fs::read_to_string(path).map_err(|source| ReleaseError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let release = OsRelease::parse(&content).ok_or_else(|| ReleaseError::MissingId {
    path: path.to_path_buf(),
  })?;

  debug!(id = %release.id, version = ?release.version_id, "detected os release");
  Ok(release)
}
