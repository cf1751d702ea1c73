//! Package descriptors.
//!
//! Every directory below the project root that holds a `build.lua` is a
//! package. Its descriptor is evaluated against a variant's toolchain and
//! declares programs and libraries.
//!
//! - [`discover`] - recursive directory walk
//! - [`lua`] - the `bld` context exposed to descriptors

pub mod discover;
pub mod lua;
mod types;

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

pub use discover::discover;
pub use lua::evaluate_descriptor;
pub use types::{Package, TargetDef, TargetKind, is_cxx_source};

use crate::config::ToolchainEnv;
use crate::consts::DESCRIPTOR_FILE;
use crate::platform::paths::Layout;

#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("failed to evaluate '{}': {message}", path.display())]
  Eval { path: PathBuf, message: String },

  #[error("target '{name}' is declared in both '{}' and '{}'", first.display(), second.display())]
  DuplicateTarget {
    name: String,
    first: PathBuf,
    second: PathBuf,
  },

  #[error("target '{target}' uses unknown target '{name}'")]
  UnknownUse { target: String, name: String },

  #[error("target '{target}' uses '{name}', which is a program")]
  UseNotLibrary { target: String, name: String },
}

/// Discover and evaluate every package for one variant.
///
/// Target names must be unique across packages and every `use` entry must
/// name a library.
pub fn load_packages(layout: &Layout, env: &ToolchainEnv) -> Result<Vec<Package>, DescriptorError> {
  let mut packages = Vec::new();

  for dir in discover(&layout.root) {
    let package = evaluate_descriptor(&layout.root, &dir, env).map_err(|e| DescriptorError::Eval {
      path: dir.join(DESCRIPTOR_FILE),
      message: e.to_string(),
    })?;
    debug!(package = %dir.display(), targets = package.targets.len(), "evaluated descriptor");
    packages.push(package);
  }

  validate(&packages)?;
  Ok(packages)
}

fn validate(packages: &[Package]) -> Result<(), DescriptorError> {
  let mut seen: BTreeMap<&str, (&PathBuf, TargetKind)> = BTreeMap::new();

  for package in packages {
    for target in &package.targets {
      if let Some((first, _)) = seen.insert(&target.name, (&package.path, target.kind)) {
        return Err(DescriptorError::DuplicateTarget {
          name: target.name.clone(),
          first: first.clone(),
          second: package.path.clone(),
        });
      }
    }
  }

  for target in packages.iter().flat_map(|p| &p.targets) {
    for used in &target.uses {
      match seen.get(used.as_str()) {
        None => {
          return Err(DescriptorError::UnknownUse {
            target: target.name.clone(),
            name: used.clone(),
          });
        }
        Some((_, kind)) if !kind.is_library() => {
          return Err(DescriptorError::UseNotLibrary {
            target: target.name.clone(),
            name: used.clone(),
          });
        }
        Some(_) => {}
      }
    }
  }

  Ok(())
}
