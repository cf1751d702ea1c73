//! OS package installation through the distribution's package manager.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::platform::release::OsRelease;

/// Package manager families bootstrap knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
  Apt,
  Dnf,
  Pacman,
  Zypper,
}

impl PackageManager {
  /// Select the package manager for a release.
  ///
  /// `ID` is matched first, then each `ID_LIKE` entry in order. Returns `None`
  /// for unsupported distributions.
  pub fn for_release(release: &OsRelease) -> Option<Self> {
    release.candidates().find_map(Self::for_id)
  }

  fn for_id(id: &str) -> Option<Self> {
    match id {
      "debian" | "ubuntu" | "linuxmint" | "raspbian" | "pop" => Some(Self::Apt),
      "fedora" | "rhel" | "centos" | "rocky" | "almalinux" => Some(Self::Dnf),
      "arch" | "manjaro" | "endeavouros" => Some(Self::Pacman),
      "sles" | "suse" => Some(Self::Zypper),
      id if id.starts_with("opensuse") => Some(Self::Zypper),
      _ => None,
    }
  }

  /// Key of this manager in the project's `packages` table.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Apt => "apt",
      Self::Dnf => "dnf",
      Self::Pacman => "pacman",
      Self::Zypper => "zypper",
    }
  }

  /// Commands installing `packages`, each as an argv without `sudo`.
  pub fn install_commands(&self, packages: &[String]) -> Vec<Vec<String>> {
    let with_packages = |base: &[&str]| -> Vec<String> {
      base
        .iter()
        .map(|s| s.to_string())
        .chain(packages.iter().cloned())
        .collect()
    };

    match self {
      Self::Apt => vec![
        vec!["apt-get".to_string(), "update".to_string()],
        with_packages(&["apt-get", "install", "-y"]),
      ],
      Self::Dnf => vec![with_packages(&["dnf", "install", "-y"])],
      Self::Pacman => vec![with_packages(&["pacman", "-S", "--needed", "--noconfirm"])],
      Self::Zypper => vec![with_packages(&["zypper", "--non-interactive", "install"])],
    }
  }
}

impl fmt::Display for PackageManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Stamp content recording one package installation: the manager followed by
/// the sorted package list, one per line.
pub fn stamp_content(manager: PackageManager, packages: &[String]) -> String {
  let mut sorted = packages.to_vec();
  sorted.sort();
  sorted.dedup();

  let mut content = format!("{}\n", manager);
  for package in sorted {
    content.push_str(&package);
    content.push('\n');
  }
  content
}

/// Whether the stamp at `path` already records exactly this installation.
pub fn stamp_matches(path: &Path, manager: PackageManager, packages: &[String]) -> bool {
  fs::read_to_string(path)
    .map(|existing| existing == stamp_content(manager, packages))
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn release(id: &str, like: &[&str]) -> OsRelease {
    OsRelease {
      id: id.to_string(),
      id_like: like.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }

  #[test]
  fn maps_known_distributions() {
    assert_eq!(PackageManager::for_release(&release("ubuntu", &[])), Some(PackageManager::Apt));
    assert_eq!(PackageManager::for_release(&release("fedora", &[])), Some(PackageManager::Dnf));
    assert_eq!(PackageManager::for_release(&release("manjaro", &[])), Some(PackageManager::Pacman));
    assert_eq!(
      PackageManager::for_release(&release("opensuse-tumbleweed", &[])),
      Some(PackageManager::Zypper)
    );
  }

  #[test]
  fn falls_back_to_id_like() {
    let elementary = release("elementary", &["ubuntu", "debian"]);
    assert_eq!(PackageManager::for_release(&elementary), Some(PackageManager::Apt));
  }

  #[test]
  fn unknown_distribution_is_unsupported() {
    assert_eq!(PackageManager::for_release(&release("gentoo", &[])), None);
    assert_eq!(PackageManager::for_release(&release("alpine", &["busybox"])), None);
  }

  #[test]
  fn apt_updates_before_installing() {
    let cmds = PackageManager::Apt.install_commands(&["git".to_string(), "make".to_string()]);
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds[0], vec!["apt-get", "update"]);
    assert_eq!(cmds[1], vec!["apt-get", "install", "-y", "git", "make"]);
  }

  #[test]
  fn stamp_ignores_package_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".packages");
    let packages = vec!["make".to_string(), "git".to_string()];
    fs::write(&path, stamp_content(PackageManager::Dnf, &packages)).unwrap();

    let reordered = vec!["git".to_string(), "make".to_string()];
    assert!(stamp_matches(&path, PackageManager::Dnf, &reordered));
    assert!(!stamp_matches(&path, PackageManager::Apt, &reordered));
    assert!(!stamp_matches(&path, PackageManager::Dnf, &["git".to_string()]));
  }

  #[test]
  fn missing_stamp_never_matches() {
    assert!(!stamp_matches(Path::new("/nonexistent/.packages"), PackageManager::Apt, &[]));
  }
}
