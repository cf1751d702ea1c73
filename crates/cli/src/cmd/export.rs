//! Implementation of the `bootwaf export` command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;

use bootwaf_lib::config::configured_variants;
use bootwaf_lib::export::{ExportFormat, export};

use super::open_project;
use crate::output::print_success;

/// Build file formats selectable with `--export_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
  All,
  Makefile,
  Codeblocks,
}

fn formats(targets: &[ExportTarget]) -> Vec<ExportFormat> {
  let mut formats = Vec::new();
  for target in targets {
    let selected: &[ExportFormat] = match target {
      ExportTarget::All => &ExportFormat::ALL,
      ExportTarget::Makefile => &[ExportFormat::Makefile],
      ExportTarget::Codeblocks => &[ExportFormat::CodeBlocks],
    };
    for format in selected {
      if !formats.contains(format) {
        formats.push(*format);
      }
    }
  }
  formats
}

pub fn cmd_export(dir: &Path, variants: &[String], export_to: &[ExportTarget]) -> Result<()> {
  let (layout, project) = open_project(dir)?;

  let variants = if variants.is_empty() {
    configured_variants(&layout)
  } else {
    variants.to_vec()
  };
  if variants.is_empty() {
    bail!("No configured variants; run `bootwaf configure` first");
  }

  let written = export(&layout, &project.name, &variants, &formats(export_to)).context("Export failed")?;
  for path in written {
    print_success(&format!("Wrote {}", layout.relative(&path).display()));
  }

  Ok(())
}
