//! Home directory lookup and the on-disk layout of a project.

use std::path::{Path, PathBuf};

use crate::consts::{BUILD_DIR, DOWNLOADS_DIR, EXT_DIR, PACKAGES_STAMP};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var_os("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("C:\\"))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var_os("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("/"))
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
  if let Some(rest) = path.strip_prefix("~/") {
    home_dir().join(rest)
  } else if path == "~" {
    home_dir()
  } else {
    PathBuf::from(path)
  }
}

/// Directories a project keeps its fetched and generated state in.
///
/// Everything lives below `root` and is created on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  pub root: PathBuf,
  pub ext_dir: PathBuf,
  pub downloads_dir: PathBuf,
  pub build_dir: PathBuf,
}

impl Layout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      ext_dir: root.join(EXT_DIR),
      downloads_dir: root.join(DOWNLOADS_DIR),
      build_dir: root.join(BUILD_DIR),
      root,
    }
  }

  pub fn packages_stamp(&self) -> PathBuf {
    self.ext_dir.join(PACKAGES_STAMP)
  }

  /// Resolve a project-relative path, leaving absolute and `~` paths alone.
  pub fn resolve(&self, path: &str) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.is_absolute() {
      expanded
    } else {
      self.root.join(expanded)
    }
  }

  /// Directory persisted toolchain environments are written to.
  pub fn config_dir(&self) -> PathBuf {
    self.build_dir.join("config")
  }

  /// Object output directory for a variant.
  pub fn variant_out_dir(&self, variant: &str) -> PathBuf {
    self.build_dir.join(variant)
  }

  pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
    path.strip_prefix(&self.root).unwrap_or(path)
  }
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn tilde_expands_to_home() {
    temp_env::with_var("HOME", Some("/home/user"), || {
      assert_eq!(expand_tilde("~/win32"), PathBuf::from("/home/user/win32"));
      assert_eq!(expand_tilde("~"), PathBuf::from("/home/user"));
      assert_eq!(expand_tilde("/opt/x"), PathBuf::from("/opt/x"));
    });
  }

  #[test]
  fn layout_places_state_under_root() {
    let layout = Layout::new("/work/proj");
    assert_eq!(layout.ext_dir, PathBuf::from("/work/proj/ext"));
    assert_eq!(layout.downloads_dir, PathBuf::from("/work/proj/downloads"));
    assert_eq!(layout.packages_stamp(), PathBuf::from("/work/proj/ext/.packages"));
    assert_eq!(layout.config_dir(), PathBuf::from("/work/proj/build/config"));
    assert_eq!(layout.resolve("patches/a.patch"), PathBuf::from("/work/proj/patches/a.patch"));
    assert_eq!(layout.resolve("/abs"), PathBuf::from("/abs"));
  }
}
