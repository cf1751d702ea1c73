//! Implementation of the `bootwaf configure` command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use bootwaf_lib::config::{BuildOptions, configure, parse_compiler_list};

use super::open_project;
use crate::output::{print_stat, print_success};

#[derive(Debug, Args)]
pub struct ConfigureArgs {
  /// C compiler candidates, comma or space separated
  #[arg(long = "check_c_compiler", value_name = "NAMES")]
  pub check_c_compiler: Option<String>,

  /// C++ compiler candidates, comma or space separated
  #[arg(long = "check_cxx_compiler", value_name = "NAMES")]
  pub check_cxx_compiler: Option<String>,

  /// Install prefix (default: the project's prefix)
  #[arg(long)]
  pub prefix: Option<String>,

  /// Build with debug symbols and without optimization
  #[arg(long)]
  pub debug: bool,

  /// Variant to configure; repeatable (default: native plus all variants)
  #[arg(long = "variant", value_name = "NAME")]
  pub variants: Vec<String>,

  /// Skip the compiler lookup in PATH
  #[arg(long)]
  pub no_check: bool,
}

impl ConfigureArgs {
  fn options(&self, project_prefix: &str) -> BuildOptions {
    let defaults = BuildOptions::default();
    BuildOptions {
      check_c_compiler: self
        .check_c_compiler
        .as_deref()
        .map(parse_compiler_list)
        .unwrap_or(defaults.check_c_compiler),
      check_cxx_compiler: self
        .check_cxx_compiler
        .as_deref()
        .map(parse_compiler_list)
        .unwrap_or(defaults.check_cxx_compiler),
      prefix: self.prefix.clone().unwrap_or_else(|| project_prefix.to_string()),
      debug: self.debug,
    }
  }
}

pub fn cmd_configure(dir: &Path, args: &ConfigureArgs) -> Result<()> {
  let (layout, project) = open_project(dir)?;
  let options = args.options(&project.prefix);

  let envs = configure(&project, &layout, &options, &args.variants, !args.no_check).context("Configure failed")?;

  for env in &envs {
    print_success(&format!("Configured variant '{}'", env.variant));
    print_stat("CC", &env.cc);
    print_stat("CXX", &env.cxx);
    print_stat("PREFIX", &env.prefix.display().to_string());
    print_stat("CFLAGS", &env.cflags.join(" "));
  }

  Ok(())
}
