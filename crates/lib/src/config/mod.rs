//! Build configuration: options, variants and toolchain environments.
//!
//! `configure` derives one [`ToolchainEnv`] per selected variant, checks the
//! compilers exist and persists each environment as JSON under
//! `build/config/`. Later commands read them back with [`load_env`].

mod options;
mod toolchain;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

pub use options::{BuildOptions, parse_compiler_list};
pub use toolchain::{Patterns, ToolchainEnv, derive_toolchain};

use crate::consts::NATIVE_VARIANT;
use crate::platform::paths::Layout;
use crate::project::Project;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("unknown variant '{0}'")]
  UnknownVariant(String),

  #[error("variant '{variant}': no compiler found in PATH (tried {})", candidates.join(", "))]
  CompilerNotFound { variant: String, candidates: Vec<String> },

  #[error("variant '{0}' is not configured; run `bootwaf configure` first")]
  NotConfigured(String),

  #[error("failed to write '{}': {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("dependency cycle through target '{0}'")]
  DependencyCycle(String),

  #[error("invalid configuration '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Resolve the variant names to configure.
///
/// An empty selection means the native toolchain plus every declared
/// variant.
pub fn select_variants(project: &Project, requested: &[String]) -> Result<Vec<String>, ConfigError> {
  if requested.is_empty() {
    return Ok(
      std::iter::once(NATIVE_VARIANT.to_string())
        .chain(project.variants.keys().cloned())
        .collect(),
    );
  }

  requested
    .iter()
    .map(|name| {
      if name == NATIVE_VARIANT || project.variants.contains_key(name) {
        Ok(name.clone())
      } else {
        Err(ConfigError::UnknownVariant(name.clone()))
      }
    })
    .collect()
}

fn find_compiler(variant: &str, cross: &str, candidates: &[String], fallback: &str) -> Result<String, ConfigError> {
  let names: Vec<String> = if candidates.is_empty() {
    vec![format!("{}{}", cross, fallback)]
  } else {
    candidates.iter().map(|c| format!("{}{}", cross, c)).collect()
  };

  for name in &names {
    match which::which(name) {
      Ok(path) => {
        debug!(variant, compiler = %name, path = %path.display(), "found compiler");
        return Ok(name.clone());
      }
      Err(_) => debug!(variant, compiler = %name, "compiler candidate not in PATH"),
    }
  }

  Err(ConfigError::CompilerNotFound {
    variant: variant.to_string(),
    candidates: names,
  })
}

/// Pick the first installed candidate for `CC` and `CXX`.
///
/// Candidates are tried in the order given, each with the variant's cross
/// prefix. The chosen names replace the ones `derive_toolchain` put in.
pub fn check_toolchain(env: &mut ToolchainEnv, options: &BuildOptions) -> Result<(), ConfigError> {
  env.cc = find_compiler(&env.variant, &env.cross, &options.check_c_compiler, "gcc")?;
  env.cxx = find_compiler(&env.variant, &env.cross, &options.check_cxx_compiler, "g++")?;
  Ok(())
}

fn env_path(layout: &Layout, variant: &str) -> PathBuf {
  layout.config_dir().join(format!("{}.json", variant))
}

/// Persist an environment to `build/config/<variant>.json`.
pub fn store_env(layout: &Layout, env: &ToolchainEnv) -> Result<PathBuf, ConfigError> {
  let dir = layout.config_dir();
  fs::create_dir_all(&dir).map_err(|source| ConfigError::Write {
    path: dir.clone(),
    source,
  })?;

  let path = env_path(layout, &env.variant);
  let json = serde_json::to_string_pretty(env).map_err(|source| ConfigError::Parse {
    path: path.clone(),
    source,
  })?;
  fs::write(&path, json).map_err(|source| ConfigError::Write {
    path: path.clone(),
    source,
  })?;
  Ok(path)
}

/// Read a persisted environment.
pub fn load_env(layout: &Layout, variant: &str) -> Result<ToolchainEnv, ConfigError> {
  let path = env_path(layout, variant);
  if !path.exists() {
    return Err(ConfigError::NotConfigured(variant.to_string()));
  }

  let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
    path: path.clone(),
    source,
  })?;
  serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

/// Names of all variants with a persisted environment, sorted.
pub fn configured_variants(layout: &Layout) -> Vec<String> {
  let Ok(entries) = fs::read_dir(layout.config_dir()) else {
    return Vec::new();
  };

  let mut names: Vec<String> = entries
    .filter_map(Result::ok)
    .filter_map(|e| {
      let path = e.path();
      match path.extension() {
        Some(ext) if ext == "json" => path.file_stem().map(|s| s.to_string_lossy().to_string()),
        _ => None,
      }
    })
    .collect();
  names.sort();
  names
}

/// Derive, optionally check, and persist the environments of `variants`.
pub fn configure(
  project: &Project,
  layout: &Layout,
  options: &BuildOptions,
  variants: &[String],
  check: bool,
) -> Result<Vec<ToolchainEnv>, ConfigError> {
  let mut envs = Vec::new();

  for name in select_variants(project, variants)? {
    let mut env = derive_toolchain(&name, project.variants.get(&name), options);
    if check {
      check_toolchain(&mut env, options)?;
    }
    let path = store_env(layout, &env)?;
    info!(variant = %name, cc = %env.cc, cxx = %env.cxx, path = %path.display(), "configured");
    envs.push(env);
  }

  Ok(envs)
}
