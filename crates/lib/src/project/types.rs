//! Types describing a project file.

use std::collections::BTreeMap;

use serde::Serialize;

/// Where a dependency's sources come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Source {
  /// An archive downloaded into `downloads/` and extracted into `ext/`.
  Archive { url: String, sha256: Option<String> },
  /// A repository cloned into `ext/<dir>`.
  Git { url: String, rev: Option<String> },
}

/// One configure/build/install command of a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
  pub cmd: String,
  /// Run through `sudo` unless already elevated.
  pub sudo: bool,
  /// Working directory relative to the dependency's source tree.
  pub cwd: Option<String>,
}

impl Step {
  pub fn new(cmd: impl Into<String>) -> Self {
    Self {
      cmd: cmd.into(),
      sudo: false,
      cwd: None,
    }
  }
}

/// A third-party dependency fetched and built by bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
  pub name: String,
  pub source: Source,
  /// Source tree directory name below `ext/`.
  pub dir: String,
  /// Path whose existence proves the dependency is already installed.
  pub creates: Option<String>,
  /// Patch file relative to the project root, applied with `-p1`.
  pub patch: Option<String>,
  pub steps: Vec<Step>,
}

/// A named cross-compilation target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Variant {
  /// Prefix prepended to every tool name, e.g. `i686-w64-mingw32-`.
  pub cross: String,
  pub prefix: Option<String>,
  pub dest_os: Option<String>,
  pub cflags: Vec<String>,
  pub cxxflags: Vec<String>,
  pub linkflags: Vec<String>,
  pub defines: Vec<String>,
}

/// The evaluated contents of `bootwaf.lua`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
  pub name: String,
  pub version: String,
  /// Install prefix handed to dependency steps as `$PREFIX`.
  pub prefix: String,
  /// OS packages keyed by package manager name (`apt`, `dnf`, ...).
  pub packages: BTreeMap<String, Vec<String>>,
  pub dependencies: Vec<Dependency>,
  pub variants: BTreeMap<String, Variant>,
}

impl Project {
  pub fn dependency(&self, name: &str) -> Option<&Dependency> {
    self.dependencies.iter().find(|d| d.name == name)
  }
}

/// Default source directory for an archive: the file name without its
/// archive extensions.
pub fn archive_stem(url: &str) -> String {
  let file = url.rsplit('/').next().unwrap_or(url);
  let file = file.split('?').next().unwrap_or(file);

  for ext in [".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".tbz2", ".txz", ".tar", ".zip"] {
    if let Some(stem) = file.strip_suffix(ext) {
      return stem.to_string();
    }
  }
  file.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn archive_stem_strips_compound_extensions() {
    assert_eq!(archive_stem("https://x.org/msgpack-1.0.0.tar.gz"), "msgpack-1.0.0");
    assert_eq!(archive_stem("https://x.org/waf-1.8.5.tar.bz2"), "waf-1.8.5");
    assert_eq!(archive_stem("https://x.org/qooxdoo-3.5-sdk.zip?dl=1"), "qooxdoo-3.5-sdk");
    assert_eq!(archive_stem("https://x.org/plain"), "plain");
  }
}
