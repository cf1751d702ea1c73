//! Implementation of the `bootwaf package` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::ValueEnum;
use owo_colors::OwoColorize;

use bootwaf_lib::package::{PackageKind, package};

use super::open_project;
use crate::output::{format_duration, print_info, print_success};

/// Outputs selectable with `--package_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PackageType {
  All,
  Ls,
  #[value(name = "tar.gz")]
  TarGz,
}

fn kinds(types: &[PackageType]) -> Vec<PackageKind> {
  if types.contains(&PackageType::All) {
    return PackageKind::ALL.to_vec();
  }
  let mut kinds = Vec::new();
  if types.contains(&PackageType::Ls) {
    kinds.push(PackageKind::Ls);
  }
  if types.contains(&PackageType::TarGz) {
    kinds.push(PackageKind::TarGz);
  }
  kinds
}

pub fn cmd_package(dir: &Path, variant: &str, types: &[PackageType]) -> Result<()> {
  let (layout, project) = open_project(dir)?;
  let kinds = kinds(types);

  let start = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(package(&layout, &project, variant, &kinds))
    .context("Package failed")?;

  if kinds.contains(&PackageKind::Ls) {
    print_info(&format!("Files installed by variant '{}'", report.variant));
    for file in &report.files {
      println!("  {}", file);
    }
  }
  if let Some(archive) = &report.archive {
    print_success(&format!(
      "Wrote {} {}",
      layout.relative(archive).display(),
      format!("({})", format_duration(start.elapsed())).dimmed()
    ));
  }

  Ok(())
}
