//! Archive extraction into `ext/`.
//!
//! gzip tarballs, plain tarballs and zip files are unpacked in-process. Any
//! other compression is handed to the system `tar`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("failed to read archive '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to unpack zip '{}': {source}", path.display())]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("tar exited with code {code:?} while extracting '{}'", path.display())]
  Tar { path: PathBuf, code: Option<i32> },
}

/// How an archive is unpacked, chosen from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  TarGz,
  Tar,
  Zip,
  /// Compressed tarball the system `tar` has to handle (bz2, xz, ...).
  External,
}

impl ArchiveKind {
  pub fn from_path(path: &Path) -> Self {
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().to_lowercase())
      .unwrap_or_default();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Self::TarGz
    } else if name.ends_with(".tar") {
      Self::Tar
    } else if name.ends_with(".zip") {
      Self::Zip
    } else {
      Self::External
    }
  }
}

/// Extract `archive` into the directory `into`, creating it if needed.
pub fn extract(archive: &Path, into: &Path) -> Result<(), ArchiveError> {
  let kind = ArchiveKind::from_path(archive);
  info!(archive = %archive.display(), into = %into.display(), kind = ?kind, "extracting");

  let read_err = |source| ArchiveError::Read {
    path: archive.to_path_buf(),
    source,
  };

  fs::create_dir_all(into).map_err(read_err)?;

  match kind {
    ArchiveKind::TarGz => {
      let file = File::open(archive).map_err(read_err)?;
      tar::Archive::new(GzDecoder::new(file)).unpack(into).map_err(read_err)?;
    }
    ArchiveKind::Tar => {
      let file = File::open(archive).map_err(read_err)?;
      tar::Archive::new(file).unpack(into).map_err(read_err)?;
    }
    ArchiveKind::Zip => {
      let file = File::open(archive).map_err(read_err)?;
      let zip_err = |source| ArchiveError::Zip {
        path: archive.to_path_buf(),
        source,
      };
      let mut zip = zip::ZipArchive::new(file).map_err(zip_err)?;
      zip.extract(into).map_err(zip_err)?;
    }
    ArchiveKind::External => {
      debug!(archive = %archive.display(), "delegating to system tar");
      let status = Command::new("tar")
        .arg("-xf")
        .arg(archive)
        .arg("-C")
        .arg(into)
        .status()
        .map_err(read_err)?;
      if !status.success() {
        return Err(ArchiveError::Tar {
          path: archive.to_path_buf(),
          code: status.code(),
        });
      }
    }
  }

  Ok(())
}
