//! Scaffold a new bootwaf project.
//!
//! `bootwaf init` writes a `bootwaf.lua` that declares the usual OS
//! packages, third-party dependencies and a `win32` cross variant.

mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub use templates::PROJECT_TEMPLATE;

use crate::consts::PROJECT_FILE;

#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },
}

/// Write the template project file into `dir`, creating it if needed.
///
/// Returns the path of the written file. An existing project file is
/// never overwritten.
pub fn init(dir: &Path) -> Result<PathBuf, InitError> {
  fs::create_dir_all(dir).map_err(|source| InitError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;

  let path = dir.join(PROJECT_FILE);
  if path.exists() {
    return Err(InitError::PathExists { path });
  }

  fs::write(&path, PROJECT_TEMPLATE).map_err(|source| InitError::WriteFile {
    path: path.clone(),
    source,
  })?;

  info!(path = %path.display(), "created project file");
  Ok(path)
}
