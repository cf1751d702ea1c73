//! Running dependency steps, package manager commands and patches.
//!
//! Output is inherited so tool diagnostics reach the terminal as-is.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use super::BootstrapError;
use crate::platform::is_elevated;

/// Prefix `argv` with `sudo` when privileges are requested and missing.
pub fn privileged(argv: Vec<String>, sudo: bool) -> Vec<String> {
  if sudo && !is_elevated() {
    std::iter::once("sudo".to_string()).chain(argv).collect()
  } else {
    argv
  }
}

/// Shell invocation for a step command.
#[cfg(unix)]
pub fn shell_argv(cmd: &str) -> Vec<String> {
  vec!["/bin/sh".to_string(), "-c".to_string(), cmd.to_string()]
}

#[cfg(windows)]
pub fn shell_argv(cmd: &str) -> Vec<String> {
  vec!["cmd.exe".to_string(), "/C".to_string(), cmd.to_string()]
}

/// Run an argv in `cwd` with `env` layered over the inherited environment.
///
/// A non-zero exit status is an error; nothing is retried.
pub async fn run(argv: &[String], cwd: &Path, env: &BTreeMap<String, String>) -> Result<(), BootstrapError> {
  let shown = argv.join(" ");
  let Some((program, args)) = argv.split_first() else {
    return Ok(());
  };

  info!(cmd = %shown, cwd = %cwd.display(), "running");

  let mut command = Command::new(program);
  command.args(args).current_dir(cwd).envs(env);

  debug!(program = %program, "spawning process");
  let status = command.status().await.map_err(|source| BootstrapError::Spawn {
    cmd: shown.clone(),
    source,
  })?;

  if !status.success() {
    return Err(BootstrapError::CmdFailed {
      cmd: shown,
      code: status.code(),
    });
  }
  Ok(())
}

/// Command applying a `-p1` patch inside a source tree.
///
/// `-N` skips hunks that are already applied.
pub fn patch_argv(patch: &Path) -> Vec<String> {
  vec![
    "patch".to_string(),
    "-p1".to_string(),
    "-N".to_string(),
    "-i".to_string(),
    patch.to_string_lossy().to_string(),
  ]
}
