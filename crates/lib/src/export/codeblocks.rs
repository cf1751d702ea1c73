//! Code::Blocks project and workspace rendering of one configured variant.
//!
//! Every target becomes a `<target>.cbp` project and the variant gets one
//! `<project>.workspace` listing them with their `use` dependencies. Files
//! are written to `codeblocks/<variant>/`, so paths in them are relative to
//! that directory.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;

use super::graph::TargetGraph;
use super::{package_path, slash};
use crate::build::{Package, TargetDef, TargetKind, is_cxx_source};
use crate::config::{ConfigError, ToolchainEnv};

/// From `codeblocks/<variant>/` back to the project root.
const TO_ROOT: &str = "../..";

/// One rendered file, named relative to the variant's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlocksFile {
  pub name: String,
  pub content: String,
}

pub fn workspace_name(project: &str) -> String {
  format!("{}.workspace", project)
}

pub fn project_name(target: &str) -> String {
  format!("{}.cbp", target)
}

fn escape(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      c => out.push(c),
    }
  }
  out
}

fn from_root(rel: &str) -> String {
  format!("{}/{}", TO_ROOT, rel)
}

/// Code::Blocks target type: console program, static or dynamic library.
fn target_type(kind: TargetKind) -> u8 {
  match kind {
    TargetKind::Program => 1,
    TargetKind::Stlib => 2,
    TargetKind::Shlib => 3,
  }
}

/// Render the projects and the workspace of `env`.
///
/// `out_dir` is the variant's object directory relative to the project root.
pub fn render(
  project: &str,
  env: &ToolchainEnv,
  packages: &[Package],
  out_dir: &Path,
) -> Result<Vec<CodeBlocksFile>, ConfigError> {
  let graph = TargetGraph::new(packages)?;
  let targets: Vec<_> = graph.ordered().collect();
  let out_dir = from_root(&slash(out_dir));

  let mut files = Vec::new();
  for (package, target) in &targets {
    let mut content = String::new();
    // Writing to a String is infallible.
    let _ = write_project(&mut content, env, &graph, package, target, &out_dir);
    files.push(CodeBlocksFile {
      name: project_name(&target.name),
      content,
    });
  }

  let mut content = String::new();
  let _ = write_workspace(&mut content, project, &targets);
  files.push(CodeBlocksFile {
    name: workspace_name(project),
    content,
  });
  Ok(files)
}

fn write_project(
  out: &mut String,
  env: &ToolchainEnv,
  graph: &TargetGraph<'_>,
  package: &Package,
  target: &TargetDef,
  out_dir: &str,
) -> std::fmt::Result {
  let cxx = target.is_cxx();
  let compiler = if cxx { &env.cxx } else { &env.cc };
  let output = format!("{}/{}", out_dir, env.output_name(target.kind.pattern(env), &target.name));
  let objects = format!("{}/{}/", out_dir, package_path(package, &target.name));
  let title = if env.debug {
    format!("{}-debug", env.variant)
  } else {
    env.variant.clone()
  };

  let mut options: Vec<String> = if cxx { env.cxxflags.clone() } else { env.cflags.clone() };
  if target.kind == TargetKind::Shlib {
    options.push("-fPIC".to_string());
  }
  options.extend(env.defines.iter().chain(&target.defines).map(|d| format!("-D{}", d)));

  let used = graph.link_libraries(&target.name);
  let mut includes: Vec<String> = target
    .includes
    .iter()
    .map(|i| from_root(&package_path(package, i)))
    .collect();
  for (lib_package, lib) in &used {
    includes.extend(lib.includes.iter().map(|i| from_root(&package_path(lib_package, i))));
  }

  writeln!(out, r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>"#)?;
  writeln!(out, "<CodeBlocks_project_file>")?;
  writeln!(out, "\t<FileVersion major=\"1\" minor=\"6\" />")?;
  writeln!(out, "\t<Project>")?;
  writeln!(out, "\t\t<Option title=\"{}\" />", escape(&target.name))?;
  writeln!(out, "\t\t<Option pch_mode=\"2\" />")?;
  writeln!(out, "\t\t<Option compiler=\"{}\" />", escape(compiler))?;
  writeln!(out, "\t\t<Build>")?;
  writeln!(out, "\t\t\t<Target title=\"{}\">", escape(&title))?;
  writeln!(
    out,
    "\t\t\t\t<Option output=\"{}\" prefix_auto=\"0\" extension_auto=\"0\" />",
    escape(&output)
  )?;
  writeln!(out, "\t\t\t\t<Option object_output=\"{}\" />", escape(&objects))?;
  writeln!(out, "\t\t\t\t<Option type=\"{}\" />", target_type(target.kind))?;
  writeln!(out, "\t\t\t\t<Option compiler=\"{}\" />", escape(compiler))?;
  writeln!(out, "\t\t\t\t<Compiler>")?;
  for option in &options {
    writeln!(out, "\t\t\t\t\t<Add option=\"{}\" />", escape(option))?;
  }
  for include in &includes {
    writeln!(out, "\t\t\t\t\t<Add directory=\"{}\" />", escape(include))?;
  }
  writeln!(out, "\t\t\t\t</Compiler>")?;

  if target.kind != TargetKind::Stlib && (!env.linkflags.is_empty() || !used.is_empty()) {
    writeln!(out, "\t\t\t\t<Linker>")?;
    for flag in &env.linkflags {
      writeln!(out, "\t\t\t\t\t<Add option=\"{}\" />", escape(flag))?;
    }
    for (_, lib) in &used {
      let lib_output = format!("{}/{}", out_dir, env.output_name(lib.kind.pattern(env), &lib.name));
      writeln!(out, "\t\t\t\t\t<Add library=\"{}\" />", escape(&lib_output))?;
    }
    writeln!(out, "\t\t\t\t</Linker>")?;
  }
  writeln!(out, "\t\t\t</Target>")?;
  writeln!(out, "\t\t</Build>")?;

  for source in &target.sources {
    let var = if is_cxx_source(source) { "CPP" } else { "CC" };
    writeln!(
      out,
      "\t\t<Unit filename=\"{}\">",
      escape(&from_root(&package_path(package, source)))
    )?;
    writeln!(out, "\t\t\t<Option compilerVar=\"{}\" />", var)?;
    writeln!(out, "\t\t</Unit>")?;
  }

  writeln!(out, "\t\t<Extensions>")?;
  writeln!(out, "\t\t\t<code_completion />")?;
  writeln!(out, "\t\t\t<debugger />")?;
  writeln!(out, "\t\t</Extensions>")?;
  writeln!(out, "\t</Project>")?;
  writeln!(out, "</CodeBlocks_project_file>")
}

fn write_workspace(out: &mut String, project: &str, targets: &[(&Package, &TargetDef)]) -> std::fmt::Result {
  let names: BTreeSet<&str> = targets.iter().map(|(_, t)| t.name.as_str()).collect();

  writeln!(out, r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>"#)?;
  writeln!(out, "<CodeBlocks_workspace_file>")?;
  writeln!(out, "\t<Workspace title=\"{}\">", escape(project))?;
  for (_, target) in targets {
    let depends: Vec<&String> = target.uses.iter().filter(|u| names.contains(u.as_str())).collect();
    let file = escape(&project_name(&target.name));
    if depends.is_empty() {
      writeln!(out, "\t\t<Project filename=\"{}\" />", file)?;
      continue;
    }
    writeln!(out, "\t\t<Project filename=\"{}\">", file)?;
    for dep in depends {
      writeln!(out, "\t\t\t<Depends filename=\"{}\" />", escape(&project_name(dep)))?;
    }
    writeln!(out, "\t\t</Project>")?;
  }
  writeln!(out, "\t</Workspace>")?;
  writeln!(out, "</CodeBlocks_workspace_file>")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildOptions, derive_toolchain};
  use crate::consts::NATIVE_VARIANT;
  use crate::project::Variant;
  use std::path::PathBuf;

  fn target(name: &str, kind: TargetKind, source: &str) -> TargetDef {
    TargetDef {
      name: name.to_string(),
      kind,
      sources: vec![source.to_string()],
      includes: Vec::new(),
      defines: Vec::new(),
      uses: Vec::new(),
      install: true,
    }
  }

  fn packages() -> Vec<Package> {
    let mut greet = target("greet", TargetKind::Shlib, "greet.c");
    greet.includes = vec!["include".to_string()];
    let mut hello = target("hello", TargetKind::Program, "main.cpp");
    hello.uses = vec!["greet".to_string()];
    hello.defines = vec!["GREETING=\"hi\"".to_string()];
    vec![
      Package {
        path: PathBuf::from("hello"),
        targets: vec![hello],
        export: true,
      },
      Package {
        path: PathBuf::from("libgreet"),
        targets: vec![greet],
        export: true,
      },
    ]
  }

  fn render_env(env: &ToolchainEnv) -> Vec<CodeBlocksFile> {
    render("hello", env, &packages(), &Path::new("build").join(&env.variant)).unwrap()
  }

  fn file<'a>(files: &'a [CodeBlocksFile], name: &str) -> &'a str {
    &files.iter().find(|f| f.name == name).unwrap().content
  }

  #[test]
  fn one_project_per_target_plus_workspace() {
    let files = render_env(&derive_toolchain(NATIVE_VARIANT, None, &BuildOptions::default()));
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["greet.cbp", "hello.cbp", "hello.workspace"]);
  }

  #[test]
  fn project_carries_toolchain_flags_and_units() {
    let env = derive_toolchain(NATIVE_VARIANT, None, &BuildOptions::default());
    let files = render_env(&env);
    let hello = file(&files, "hello.cbp");

    assert!(hello.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\" ?>\n"));
    assert!(hello.contains("<Option title=\"hello\" />"));
    assert!(hello.contains("<Target title=\"default\">"));
    assert!(hello.contains("<Option output=\"../../build/default/hello\""));
    assert!(hello.contains("<Option type=\"1\" />"));
    assert!(hello.contains("<Option compiler=\"g++\" />"));
    assert!(hello.contains("<Add option=\"-O3\" />"));
    assert!(hello.contains("<Add option=\"-DNDEBUG\" />"));
    assert!(hello.contains("<Add option=\"-DGREETING=&quot;hi&quot;\" />"));
    assert!(hello.contains("<Add directory=\"../../libgreet/include\" />"));
    assert!(hello.contains("<Add library=\"../../build/default/libgreet.so\" />"));
    assert!(hello.contains("<Unit filename=\"../../hello/main.cpp\">"));
    assert!(hello.contains("<Option compilerVar=\"CPP\" />"));

    let greet = file(&files, "greet.cbp");
    assert!(greet.contains("<Option type=\"3\" />"));
    assert!(greet.contains("<Add option=\"-fPIC\" />"));
    assert!(greet.contains("<Option compilerVar=\"CC\" />"));
    assert!(!greet.contains("<Linker>"));
  }

  #[test]
  fn workspace_lists_dependencies() {
    let files = render_env(&derive_toolchain(NATIVE_VARIANT, None, &BuildOptions::default()));
    let workspace = file(&files, "hello.workspace");

    assert!(workspace.contains("<Workspace title=\"hello\">"));
    assert!(workspace.contains("\t\t<Project filename=\"greet.cbp\" />\n"));
    assert!(workspace.contains("\t\t<Project filename=\"hello.cbp\">\n\t\t\t<Depends filename=\"greet.cbp\" />\n"));
  }

  #[test]
  fn cross_debug_variant_is_titled_and_named() {
    let variant = Variant {
      cross: "i686-w64-mingw32-".to_string(),
      dest_os: Some("win32".to_string()),
      linkflags: vec!["-static".to_string()],
      ..Default::default()
    };
    let options = BuildOptions {
      debug: true,
      ..Default::default()
    };
    let env = derive_toolchain("win32", Some(&variant), &options);
    let files = render_env(&env);
    let hello = file(&files, "hello.cbp");

    assert!(hello.contains("<Target title=\"win32-debug\">"));
    assert!(hello.contains("<Option compiler=\"i686-w64-mingw32-g++\" />"));
    assert!(hello.contains("<Option output=\"../../build/win32/hello.exe\""));
    assert!(hello.contains("<Add option=\"-static\" />"));
    assert!(hello.contains("<Add library=\"../../build/win32/greet.dll\" />"));
    assert!(hello.contains("<Add option=\"-ggdb\" />"));
  }
}
