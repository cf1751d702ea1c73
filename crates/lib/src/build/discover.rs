//! Recursive discovery of package descriptors.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::consts::{BUILD_DIR, DESCRIPTOR_FILE, DOWNLOADS_DIR, EXT_DIR};

fn is_pruned(entry: &DirEntry, root: &Path) -> bool {
  if entry.depth() == 0 || !entry.file_type().is_dir() {
    return false;
  }
  let name = entry.file_name().to_string_lossy();
  if name.starts_with('.') {
    return true;
  }
  // Bootstrap and build state only lives at the top level.
  entry.path().parent() == Some(root) && [BUILD_DIR, EXT_DIR, DOWNLOADS_DIR].contains(&&*name)
}

/// Find every directory below `root` that contains a descriptor.
///
/// Hidden directories and the top-level `build/`, `ext/` and `downloads/`
/// trees are never entered. The result is sorted by path and relative to
/// `root`; the root itself is included when it has a descriptor.
pub fn discover(root: &Path) -> Vec<PathBuf> {
  let mut found: Vec<PathBuf> = WalkDir::new(root)
    .follow_links(false)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| !is_pruned(e, root))
    .filter_map(Result::ok)
    .filter(|e| e.file_type().is_file() && e.file_name() == DESCRIPTOR_FILE)
    .filter_map(|e| e.path().parent().map(|p| p.strip_prefix(root).unwrap_or(p).to_path_buf()))
    .collect();

  found.sort();
  found
}
