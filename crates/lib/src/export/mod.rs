//! Makefile and Code::Blocks export.
//!
//! Turns configured variants into standalone build files so a project can
//! be built on hosts without bootwaf. The native variant's makefile is
//! written to `Makefile`, every other variant's to `<project>-<variant>.mk`.
//! Code::Blocks projects go to `codeblocks/<variant>/`.

mod codeblocks;
mod graph;
mod makefile;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub use codeblocks::CodeBlocksFile;
pub use graph::TargetGraph;
pub use makefile::render;

use crate::build::{DescriptorError, Package, load_packages};
use crate::config::{ConfigError, ToolchainEnv, load_env};
use crate::consts::CODEBLOCKS_DIR;
use crate::platform::paths::Layout;

#[derive(Debug, Error)]
pub enum ExportError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Descriptor(#[from] DescriptorError),

  #[error("failed to write '{}': {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Build file formats `export` can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
  Makefile,
  CodeBlocks,
}

impl ExportFormat {
  pub const ALL: [ExportFormat; 2] = [ExportFormat::Makefile, ExportFormat::CodeBlocks];
}

fn slash(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

/// `rel` inside the package, relative to the project root.
fn package_path(package: &Package, rel: &str) -> String {
  if package.path.as_os_str().is_empty() {
    rel.to_string()
  } else {
    format!("{}/{}", slash(&package.path), rel)
  }
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|source| ExportError::Write {
      path: parent.to_path_buf(),
      source,
    })?;
  }
  fs::write(path, content).map_err(|source| ExportError::Write {
    path: path.to_path_buf(),
    source,
  })
}

/// File name the makefile of `env` is written to.
pub fn makefile_name(project: &str, env: &ToolchainEnv) -> String {
  if env.is_native() {
    "Makefile".to_string()
  } else {
    format!("{}-{}.mk", project, env.variant)
  }
}

/// Directory the Code::Blocks files of `variant` are written to.
pub fn codeblocks_dir(layout: &Layout, variant: &str) -> PathBuf {
  layout.root.join(CODEBLOCKS_DIR).join(variant)
}

fn write_makefile(layout: &Layout, project: &str, env: &ToolchainEnv, packages: &[Package]) -> Result<PathBuf, ExportError> {
  let out_dir = layout.variant_out_dir(&env.variant);
  let content = render(project, env, packages, layout.relative(&out_dir))?;

  let path = layout.root.join(makefile_name(project, env));
  write_file(&path, &content)?;
  info!(variant = %env.variant, path = %path.display(), packages = packages.len(), "exported makefile");
  Ok(path)
}

fn write_codeblocks(
  layout: &Layout,
  project: &str,
  env: &ToolchainEnv,
  packages: &[Package],
) -> Result<Vec<PathBuf>, ExportError> {
  let out_dir = layout.variant_out_dir(&env.variant);
  let files = codeblocks::render(project, env, packages, layout.relative(&out_dir))?;

  let dir = codeblocks_dir(layout, &env.variant);
  let mut written = Vec::new();
  for file in files {
    let path = dir.join(&file.name);
    write_file(&path, &file.content)?;
    written.push(path);
  }
  info!(variant = %env.variant, dir = %dir.display(), projects = written.len() - 1, "exported codeblocks workspace");
  Ok(written)
}

/// Export the makefile of one configured variant, returning its path.
pub fn export_makefile(layout: &Layout, project: &str, variant: &str) -> Result<PathBuf, ExportError> {
  let env = load_env(layout, variant)?;
  let packages = load_packages(layout, &env)?;
  write_makefile(layout, project, &env, &packages)
}

/// Export one configured variant in every format of `formats`, returning
/// the written paths.
pub fn export_variant(
  layout: &Layout,
  project: &str,
  variant: &str,
  formats: &[ExportFormat],
) -> Result<Vec<PathBuf>, ExportError> {
  let env = load_env(layout, variant)?;
  let packages = load_packages(layout, &env)?;

  let mut written = Vec::new();
  if formats.contains(&ExportFormat::Makefile) {
    written.push(write_makefile(layout, project, &env, &packages)?);
  }
  if formats.contains(&ExportFormat::CodeBlocks) {
    written.extend(write_codeblocks(layout, project, &env, &packages)?);
  }
  Ok(written)
}

/// Export every variant in `variants`.
pub fn export(
  layout: &Layout,
  project: &str,
  variants: &[String],
  formats: &[ExportFormat],
) -> Result<Vec<PathBuf>, ExportError> {
  let mut written = Vec::new();
  for variant in variants {
    written.extend(export_variant(layout, project, variant, formats)?);
  }
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildOptions, derive_toolchain, store_env};
  use crate::consts::NATIVE_VARIANT;
  use crate::project::Variant;
  use tempfile::TempDir;

  fn setup() -> (TempDir, Layout) {
    let temp = TempDir::new().unwrap();
    let layout = Layout::new(temp.path());
    fs::create_dir_all(temp.path().join("hello")).unwrap();
    fs::write(
      temp.path().join("hello/build.lua"),
      r#"return { build = function(bld) bld.program{ target = "hello", source = "main.c" } end }"#,
    )
    .unwrap();
    (temp, layout)
  }

  #[test]
  fn makefile_names_follow_variant() {
    let options = BuildOptions::default();
    let native = derive_toolchain(NATIVE_VARIANT, None, &options);
    let win32 = derive_toolchain("win32", Some(&Variant::default()), &options);
    assert_eq!(makefile_name("hello", &native), "Makefile");
    assert_eq!(makefile_name("hello", &win32), "hello-win32.mk");
  }

  #[test]
  fn exports_configured_variants() {
    let (temp, layout) = setup();
    let options = BuildOptions::default();
    store_env(&layout, &derive_toolchain(NATIVE_VARIANT, None, &options)).unwrap();
    store_env(&layout, &derive_toolchain("arm", Some(&Variant::default()), &options)).unwrap();

    let variants = [NATIVE_VARIANT.to_string(), "arm".to_string()];
    let written = export(&layout, "hello", &variants, &[ExportFormat::Makefile]).unwrap();
    assert_eq!(written, vec![temp.path().join("Makefile"), temp.path().join("hello-arm.mk")]);

    let content = fs::read_to_string(temp.path().join("hello-arm.mk")).unwrap();
    assert!(content.contains("OUT = build/arm\n"));
    assert!(content.contains("$(OUT)/hello/main.c.hello.o: hello/main.c\n"));
  }

  #[test]
  fn codeblocks_files_go_below_variant_dir() {
    let (temp, layout) = setup();
    store_env(&layout, &derive_toolchain(NATIVE_VARIANT, None, &BuildOptions::default())).unwrap();

    let written = export_variant(&layout, "hello", NATIVE_VARIANT, &ExportFormat::ALL).unwrap();
    let dir = temp.path().join("codeblocks/default");
    assert_eq!(
      written,
      vec![
        temp.path().join("Makefile"),
        dir.join("hello.cbp"),
        dir.join("hello.workspace")
      ]
    );

    let project = fs::read_to_string(dir.join("hello.cbp")).unwrap();
    assert!(project.contains("<Unit filename=\"../../hello/main.c\">"));
  }

  #[test]
  fn unconfigured_variant_fails() {
    let (_temp, layout) = setup();
    let err = export_makefile(&layout, "hello", "win32").unwrap_err();
    assert!(matches!(err, ExportError::Config(ConfigError::NotConfigured(_))));
  }
}
