//! Implementation of the `bootwaf bootstrap` command.
//!
//! Detects the platform first, so an unsupported release fails before the
//! project is even read.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use bootwaf_lib::bootstrap::{self, detect_platform};
use bootwaf_lib::platform::release::os_release_path;

use super::open_project;
use crate::output::{format_duration, print_info, print_stat, print_success, symbols};

pub fn cmd_bootstrap(dir: &Path, dry_run: bool) -> Result<()> {
  let (release, manager) = detect_platform(&os_release_path())?;
  let (layout, project) = open_project(dir)?;

  print_info(&format!(
    "{} on {} ({})",
    project.name,
    release.display_name(),
    manager
  ));

  let plan = bootstrap::plan(&project, &layout, manager);
  for name in &plan.present {
    println!("  {} {} already present", symbols::SUCCESS.dimmed(), name);
  }

  if plan.is_empty() {
    print_success("Nothing to do");
    return Ok(());
  }

  for action in &plan.actions {
    println!("  {} {}", symbols::ARROW.cyan(), action);
  }

  if dry_run {
    println!();
    print_info(&format!("{} action(s) would run", plan.actions.len()));
    return Ok(());
  }

  let start = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(bootstrap::apply(&plan)).context("Bootstrap failed")?;

  println!();
  print_success(&format!(
    "Bootstrap complete {}",
    format!("({})", format_duration(start.elapsed())).dimmed()
  ));
  print_stat("Package installs", &report.packages_installed.to_string());
  print_stat("Downloaded", &report.downloaded.to_string());
  print_stat("Extracted", &report.extracted.to_string());
  print_stat("Cloned", &report.cloned.to_string());
  print_stat("Patched", &report.patched.to_string());
  print_stat("Commands", &report.commands.to_string());

  Ok(())
}
