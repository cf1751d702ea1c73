//! Packages and the targets their descriptors declare.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::ToolchainEnv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
  Program,
  Shlib,
  Stlib,
}

impl TargetKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Program => "program",
      Self::Shlib => "shlib",
      Self::Stlib => "stlib",
    }
  }

  pub fn is_library(&self) -> bool {
    !matches!(self, Self::Program)
  }

  /// Name pattern of this kind's output in `env`.
  pub fn pattern<'a>(&self, env: &'a ToolchainEnv) -> &'a str {
    match self {
      Self::Program => &env.patterns.program,
      Self::Shlib => &env.patterns.shlib,
      Self::Stlib => &env.patterns.stlib,
    }
  }
}

impl fmt::Display for TargetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A program or library declared by a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDef {
  pub name: String,
  pub kind: TargetKind,
  /// Sources relative to the package directory.
  pub sources: Vec<String>,
  /// Include directories relative to the package directory.
  pub includes: Vec<String>,
  pub defines: Vec<String>,
  /// Other library targets linked into this one.
  pub uses: Vec<String>,
  pub install: bool,
}

impl TargetDef {
  /// C++ sources are compiled with `CXX`; a target with any of them links
  /// with `CXX` too.
  pub fn is_cxx(&self) -> bool {
    self.sources.iter().any(|s| is_cxx_source(s))
  }
}

pub fn is_cxx_source(path: &str) -> bool {
  [".cc", ".cpp", ".cxx", ".C", ".c++"].iter().any(|ext| path.ends_with(ext))
}

/// A directory holding a `build.lua`, with the targets it declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
  /// Package directory relative to the project root.
  pub path: PathBuf,
  pub targets: Vec<TargetDef>,
  /// Whether exported makefiles include this package.
  pub export: bool,
}
