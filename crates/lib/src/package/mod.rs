//! Packaging of a configured variant.
//!
//! The variant's makefile is exported and its `install` target run with
//! `DESTDIR` pointing at a staging directory. The staged tree is then
//! listed and archived as `<project>-<variant>-<version>.tar.gz` at the
//! project root. The staging directory is removed afterwards.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::bootstrap::{BootstrapError, cmd};
use crate::config::{ConfigError, load_env};
use crate::export::{ExportError, export_makefile};
use crate::platform::paths::Layout;
use crate::project::Project;

#[derive(Debug, Error)]
pub enum PackageError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Export(#[from] ExportError),

  #[error("install into staging directory failed: {0}")]
  Install(#[from] BootstrapError),

  #[error("io error at '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to walk staging directory: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("packaging task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

/// Outputs `package` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
  /// A listing of the installed files.
  Ls,
  TarGz,
}

impl PackageKind {
  pub const ALL: [PackageKind; 2] = [PackageKind::Ls, PackageKind::TarGz];
}

/// What a packaging run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReport {
  pub variant: String,
  /// Installed files, `$PREFIX`-relative where they live below the prefix.
  pub files: Vec<String>,
  pub archive: Option<PathBuf>,
}

pub fn archive_name(project: &Project, variant: &str) -> String {
  format!("{}-{}-{}.tar.gz", project.name, variant, project.version)
}

pub fn staging_dir(layout: &Layout, variant: &str) -> PathBuf {
  layout.variant_out_dir(variant).join(".package")
}

/// `make install` of `makefile` into `destdir`.
pub fn install_argv(makefile: &Path, destdir: &Path) -> Vec<String> {
  vec![
    "make".to_string(),
    "-f".to_string(),
    makefile.to_string_lossy().to_string(),
    "install".to_string(),
    format!("DESTDIR={}", destdir.to_string_lossy()),
  ]
}

/// Files below `staging`, sorted, shown as `$PREFIX/...` when they were
/// installed under `prefix`.
pub fn staged_files(staging: &Path, prefix: &Path) -> Result<Vec<String>, PackageError> {
  let prefix = prefix.strip_prefix("/").unwrap_or(prefix);
  let mut files = Vec::new();

  for entry in WalkDir::new(staging).sort_by_file_name() {
    let entry = entry?;
    if entry.file_type().is_dir() {
      continue;
    }
    let Ok(rel) = entry.path().strip_prefix(staging) else {
      continue;
    };
    let shown = match rel.strip_prefix(prefix) {
      Ok(inner) => format!("$PREFIX/{}", inner.to_string_lossy()),
      Err(_) => format!("/{}", rel.to_string_lossy()),
    };
    files.push(shown.replace('\\', "/"));
  }
  Ok(files)
}

/// Archive every file below `staging` into a gzip-compressed tarball.
///
/// Entry names are relative to `staging`, so extracting the archive at `/`
/// reproduces the install.
pub fn write_tarball(staging: &Path, dest: &Path) -> Result<(), PackageError> {
  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |source| PackageError::Io { path, source }
  };

  let file = File::create(dest).map_err(io_err(dest))?;
  let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
  builder.follow_symlinks(false);

  for entry in WalkDir::new(staging).sort_by_file_name() {
    let entry = entry?;
    let path = entry.path();
    let Ok(rel) = path.strip_prefix(staging) else {
      continue;
    };
    if rel.as_os_str().is_empty() {
      continue;
    }
    builder.append_path_with_name(path, rel).map_err(io_err(path))?;
  }

  let encoder = builder.into_inner().map_err(io_err(dest))?;
  encoder.finish().map_err(io_err(dest))?;
  Ok(())
}

async fn reset_dir(path: &Path) -> Result<(), PackageError> {
  if path.exists() {
    tokio::fs::remove_dir_all(path).await.map_err(|source| PackageError::Io {
      path: path.to_path_buf(),
      source,
    })?;
  }
  tokio::fs::create_dir_all(path).await.map_err(|source| PackageError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Install `variant` into a staging directory and produce `kinds`.
pub async fn package(
  layout: &Layout,
  project: &Project,
  variant: &str,
  kinds: &[PackageKind],
) -> Result<PackageReport, PackageError> {
  let env = load_env(layout, variant)?;
  let makefile = export_makefile(layout, &project.name, variant)?;

  let staging = staging_dir(layout, variant);
  reset_dir(&staging).await?;
  info!(variant, staging = %staging.display(), "installing into staging directory");
  cmd::run(&install_argv(&makefile, &staging), &layout.root, &BTreeMap::new()).await?;

  let mut report = PackageReport {
    variant: variant.to_string(),
    ..Default::default()
  };

  if kinds.contains(&PackageKind::Ls) {
    report.files = staged_files(&staging, &env.prefix)?;
    debug!(variant, files = report.files.len(), "listed staged files");
  }

  if kinds.contains(&PackageKind::TarGz) {
    let dest = layout.root.join(archive_name(project, variant));
    let (from, to) = (staging.clone(), dest.clone());
    tokio::task::spawn_blocking(move || write_tarball(&from, &to)).await??;
    info!(variant, archive = %dest.display(), "wrote package");
    report.archive = Some(dest);
  }

  tokio::fs::remove_dir_all(&staging)
    .await
    .map_err(|source| PackageError::Io {
      path: staging.clone(),
      source,
    })?;
  Ok(report)
}
