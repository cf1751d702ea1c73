//! Loading the project file.
//!
//! `bootwaf.lua` declares the application name, the OS packages and third-party
//! dependencies bootstrap provides, and the cross-compilation variants the build
//! configuration derives toolchains for.

mod lua;
mod types;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::NATIVE_VARIANT;

pub use types::{Dependency, Project, Source, Step, Variant, archive_stem};

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("project file not found: {}", .0.display())]
  NotFound(PathBuf),

  #[error("failed to evaluate '{}': {message}", path.display())]
  Eval { path: PathBuf, message: String },

  #[error("duplicate dependency name '{0}'")]
  DuplicateDependency(String),

  #[error("variant name '{0}' is reserved for the native toolchain")]
  ReservedVariant(String),
}

/// Evaluate a project file.
pub fn load(path: &Path) -> Result<Project, ProjectError> {
  if !path.exists() {
    return Err(ProjectError::NotFound(path.to_path_buf()));
  }

  let project = lua::evaluate(path).map_err(|e| ProjectError::Eval {
    path: path.to_path_buf(),
    message: e.to_string(),
  })?;

  let mut seen = std::collections::BTreeSet::new();
  for dep in &project.dependencies {
    if !seen.insert(dep.name.as_str()) {
      return Err(ProjectError::DuplicateDependency(dep.name.clone()));
    }
  }

  if project.variants.contains_key(NATIVE_VARIANT) {
    return Err(ProjectError::ReservedVariant(NATIVE_VARIANT.to_string()));
  }

  debug!(
    name = %project.name,
    dependencies = project.dependencies.len(),
    variants = project.variants.len(),
    "loaded project"
  );
  Ok(project)
}
