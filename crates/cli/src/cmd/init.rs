//! Implementation of the `bootwaf init` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use bootwaf_lib::init::init;

use crate::output::symbols;

pub fn cmd_init(dir: &Path) -> Result<()> {
  let path = init(dir).context("Failed to initialize project")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized bootwaf project!".green().bold()
  );
  println!();
  println!("  {} Project file: {}", symbols::INFO.cyan(), path.display());
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Edit {} to list your packages and dependencies",
    path.display().to_string().cyan()
  );
  println!("  2. Run: {}", "bootwaf bootstrap".cyan());
  println!("  3. Run: {}", "bootwaf configure".cyan());

  Ok(())
}
