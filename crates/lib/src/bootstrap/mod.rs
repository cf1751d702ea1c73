//! Bootstrap: OS packages and third-party dependencies.
//!
//! A run is split in two phases, mirroring plan/apply:
//!
//! 1. [`plan`] inspects the filesystem and lists the actions still needed.
//!    Dependencies that are already present contribute nothing, so a second
//!    run over a finished tree yields an empty plan.
//! 2. [`apply`] executes the actions strictly in order and stops at the first
//!    failure. Nothing is retried or rolled back.
//!
//! Platform detection happens before either phase: an unknown release is
//! reported before anything is installed.

pub mod archive;
pub mod cmd;
pub mod fetch;
pub mod git;
pub mod packages;
mod types;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

pub use packages::PackageManager;
pub use types::{Action, ApplyReport, BootstrapError, BootstrapPlan};

use crate::platform::paths::{Layout, expand_tilde};
use crate::platform::release::{OsRelease, detect_release};
use crate::project::{Project, Source};

/// Detect the OS release and the package manager to drive.
///
/// Both an unreadable release file and an unknown distribution are reported
/// as [`BootstrapError::UnsupportedPlatform`].
pub fn detect_platform(os_release: &Path) -> Result<(OsRelease, PackageManager), BootstrapError> {
  let release = detect_release(os_release).map_err(|e| BootstrapError::UnsupportedPlatform(e.to_string()))?;

  let manager = PackageManager::for_release(&release).ok_or_else(|| {
    BootstrapError::UnsupportedPlatform(format!("no package manager known for '{}'", release.display_name()))
  })?;

  info!(release = %release.display_name(), manager = %manager, "detected platform");
  Ok((release, manager))
}

/// Environment layered over the inherited one for every command.
fn run_env(project: &Project, layout: &Layout) -> BTreeMap<String, String> {
  let jobs = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

  let mut env = BTreeMap::new();
  env.insert(
    "PREFIX".to_string(),
    expand_tilde(&project.prefix).to_string_lossy().to_string(),
  );
  env.insert("EXT_DIR".to_string(), layout.ext_dir.to_string_lossy().to_string());
  env.insert(
    "DOWNLOADS_DIR".to_string(),
    layout.downloads_dir.to_string_lossy().to_string(),
  );
  env.insert("JOBS".to_string(), jobs.to_string());
  env
}

/// Compute the actions needed to bring `layout` up to date with `project`.
pub fn plan(project: &Project, layout: &Layout, manager: PackageManager) -> BootstrapPlan {
  let mut actions = Vec::new();
  let mut present = Vec::new();

  match project.packages.get(manager.as_str()) {
    Some(packages) if !packages.is_empty() => {
      let stamp = layout.packages_stamp();
      if packages::stamp_matches(&stamp, manager, packages) {
        debug!(manager = %manager, "os packages already installed");
      } else {
        actions.push(Action::InstallPackages {
          manager,
          packages: packages.clone(),
        });
        actions.push(Action::WriteStamp {
          path: stamp,
          content: packages::stamp_content(manager, packages),
        });
      }
    }
    _ => debug!(manager = %manager, "no os packages declared"),
  }

  for dep in &project.dependencies {
    let source_dir = layout.ext_dir.join(&dep.dir);
    let marker = dep
      .creates
      .as_deref()
      .map(|c| layout.resolve(c))
      .unwrap_or_else(|| source_dir.clone());

    if marker.exists() {
      info!(dependency = %dep.name, path = %marker.display(), "already present, skipping");
      present.push(dep.name.clone());
      continue;
    }

    // An existing tree without its `creates` marker only needs its steps rerun.
    let fetched = !source_dir.exists();

    match &dep.source {
      Source::Archive { url, sha256 } if fetched => {
        let archive = layout.downloads_dir.join(fetch::url_to_filename(url));
        if !fetch::cached_is_valid(&archive, sha256.as_deref()) {
          actions.push(Action::Download {
            dependency: dep.name.clone(),
            url: url.clone(),
            sha256: sha256.clone(),
            dest: archive.clone(),
          });
        }
        actions.push(Action::Extract {
          dependency: dep.name.clone(),
          archive,
          into: layout.ext_dir.clone(),
          source_dir: source_dir.clone(),
        });
      }
      Source::Git { url, rev } if fetched => {
        actions.push(Action::Clone {
          dependency: dep.name.clone(),
          url: url.clone(),
          rev: rev.clone(),
          dest: source_dir.clone(),
        });
      }
      _ => {}
    }

    if fetched && let Some(patch) = &dep.patch {
      actions.push(Action::Patch {
        dependency: dep.name.clone(),
        patch: layout.resolve(patch),
        dir: source_dir.clone(),
      });
    }

    for step in &dep.steps {
      actions.push(Action::Run {
        dependency: dep.name.clone(),
        cmd: step.cmd.clone(),
        cwd: step
          .cwd
          .as_deref()
          .map(|c| source_dir.join(c))
          .unwrap_or_else(|| source_dir.clone()),
        sudo: step.sudo,
      });
    }
  }

  BootstrapPlan {
    root: layout.root.clone(),
    actions,
    env: run_env(project, layout),
    present,
  }
}

/// Execute a plan in order, aborting on the first failure.
pub async fn apply(plan: &BootstrapPlan) -> Result<ApplyReport, BootstrapError> {
  let mut report = ApplyReport::default();

  for action in &plan.actions {
    debug!(action = %action, "executing");

    match action {
      Action::InstallPackages { manager, packages } => {
        for argv in manager.install_commands(packages) {
          cmd::run(&cmd::privileged(argv, true), &plan.root, &plan.env).await?;
        }
        report.packages_installed += packages.len();
      }
      Action::WriteStamp { path, content } => {
        if let Some(parent) = path.parent() {
          tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
      }
      Action::Download { url, sha256, dest, .. } => {
        fetch::download(url, sha256.as_deref(), dest).await?;
        report.downloaded += 1;
      }
      Action::Extract {
        dependency,
        archive,
        into,
        source_dir,
      } => {
        let (archive_path, into_path) = (archive.clone(), into.clone());
        tokio::task::spawn_blocking(move || archive::extract(&archive_path, &into_path)).await??;

        if !source_dir.is_dir() {
          return Err(BootstrapError::MissingSourceDir {
            dependency: dependency.clone(),
            path: source_dir.clone(),
          });
        }
        report.extracted += 1;
      }
      Action::Clone { url, rev, dest, .. } => {
        if let Some(parent) = dest.parent() {
          tokio::fs::create_dir_all(parent).await?;
        }
        let (url, rev, dest) = (url.clone(), rev.clone(), dest.clone());
        tokio::task::spawn_blocking(move || git::clone_repo(&url, rev.as_deref(), &dest)).await??;
        report.cloned += 1;
      }
      Action::Patch { dependency, patch, dir } => {
        if !patch.is_file() {
          return Err(BootstrapError::PatchNotFound {
            dependency: dependency.clone(),
            path: patch.clone(),
          });
        }
        cmd::run(&cmd::patch_argv(patch), dir, &plan.env).await?;
        report.patched += 1;
      }
      Action::Run { cmd: line, cwd, sudo, .. } => {
        cmd::run(&cmd::privileged(cmd::shell_argv(line), *sudo), cwd, &plan.env).await?;
        report.commands += 1;
      }
    }
  }

  info!(actions = report.total(), "bootstrap complete");
  Ok(report)
}
