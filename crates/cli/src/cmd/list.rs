//! Implementation of the `bootwaf list` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use bootwaf_lib::build::load_packages;
use bootwaf_lib::config::load_env;

use super::open_project;
use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_list(dir: &Path, variant: &str, output: OutputFormat) -> Result<()> {
  let (layout, _) = open_project(dir)?;
  let env = load_env(&layout, variant)?;
  let packages = load_packages(&layout, &env).context("Failed to load package descriptors")?;

  if output.is_json() {
    return print_json(&packages);
  }

  if packages.is_empty() {
    print_info("No build.lua found below the project root");
    return Ok(());
  }

  for package in &packages {
    let path = package.path.display().to_string();
    if package.export {
      println!("{}", path.bold());
    } else {
      println!("{} {}", path.bold(), "(not exported)".dimmed());
    }
    for target in &package.targets {
      let output_name = env.output_name(target.kind.pattern(&env), &target.name);
      println!(
        "  {} {} {} {}",
        symbols::INFO.cyan(),
        target.name,
        format!("[{}]", target.kind).dimmed(),
        format!("{} {}", symbols::ARROW, output_name).dimmed()
      );
    }
  }

  Ok(())
}
