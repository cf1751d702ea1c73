//! GNU make rendering of one configured variant.

use std::fmt::Write;
use std::path::Path;

use super::graph::TargetGraph;
use super::{package_path, slash};
use crate::build::{Package, TargetDef, TargetKind, is_cxx_source};
use crate::config::{ConfigError, ToolchainEnv};
use crate::consts::APP_NAME;

/// Objects are per target: one source built into two targets gets two
/// objects, each compiled with that target's flags.
fn object_path(package: &Package, target: &TargetDef, source: &str) -> String {
  format!("$(OUT)/{}.{}.o", package_path(package, source), target.name)
}

fn output_path(env: &ToolchainEnv, target: &TargetDef) -> String {
  format!("$(OUT)/{}", env.output_name(target.kind.pattern(env), &target.name))
}

fn install_dir(kind: TargetKind) -> &'static str {
  match kind {
    TargetKind::Program => "$(DESTDIR)$(PREFIX)/bin",
    TargetKind::Shlib | TargetKind::Stlib => "$(DESTDIR)$(PREFIX)/lib",
  }
}

/// Render the makefile of `env` for the given packages.
///
/// Paths are relative to the project root, where the makefile is written.
/// `out_dir` is the variant's object directory, also root-relative.
pub fn render(project: &str, env: &ToolchainEnv, packages: &[Package], out_dir: &Path) -> Result<String, ConfigError> {
  let graph = TargetGraph::new(packages)?;
  let mut out = String::new();
  // Writing to a String is infallible.
  let _ = write_makefile(&mut out, project, env, &graph, out_dir);
  Ok(out)
}

fn write_makefile(
  out: &mut String,
  project: &str,
  env: &ToolchainEnv,
  graph: &TargetGraph<'_>,
  out_dir: &Path,
) -> std::fmt::Result {
  let targets: Vec<_> = graph.ordered().collect();
  let names: Vec<&str> = targets.iter().map(|(_, t)| t.name.as_str()).collect();

  render_header(out, project, env, out_dir)?;
  writeln!(out, ".PHONY: all clean install uninstall {}", names.join(" "))?;
  writeln!(out)?;
  writeln!(out, "all: {}", names.join(" "))?;
  writeln!(out)?;

  for (package, target) in &targets {
    render_target(out, env, graph, package, target)?;
  }

  render_maintenance(out, env, &targets)
}

fn render_header(out: &mut String, project: &str, env: &ToolchainEnv, out_dir: &Path) -> std::fmt::Result {
  writeln!(out, "# {} variant '{}', generated by {}. Do not edit.", project, env.variant, APP_NAME)?;
  writeln!(out)?;
  writeln!(out, "CC = {}", env.cc)?;
  writeln!(out, "CXX = {}", env.cxx)?;
  writeln!(out, "AR = {}", env.ar)?;
  writeln!(out, "CFLAGS = {}", env.cflags.join(" "))?;
  writeln!(out, "CXXFLAGS = {}", env.cxxflags.join(" "))?;
  writeln!(out, "LINKFLAGS = {}", env.linkflags.join(" "))?;
  let defines: Vec<String> = env.defines.iter().map(|d| format!("-D{}", d)).collect();
  writeln!(out, "DEFINES = {}", defines.join(" "))?;
  writeln!(out, "PREFIX ?= {}", slash(&env.prefix))?;
  writeln!(out, "DESTDIR ?=")?;
  writeln!(out, "OUT = {}", slash(out_dir))?;
  writeln!(out)
}

fn render_target(
  out: &mut String,
  env: &ToolchainEnv,
  graph: &TargetGraph<'_>,
  package: &Package,
  target: &TargetDef,
) -> std::fmt::Result {
  let output = output_path(env, target);
  let objects: Vec<String> = target.sources.iter().map(|s| object_path(package, target, s)).collect();
  let used = graph.link_libraries(&target.name);
  let libs: Vec<String> = used.iter().map(|(_, t)| output_path(env, t)).collect();

  let mut inputs = objects.clone();
  inputs.extend(libs);

  writeln!(out, "{}: {}", target.name, output)?;
  writeln!(out)?;

  writeln!(out, "{}: {}", output, inputs.join(" "))?;
  writeln!(out, "\t@mkdir -p $(dir $@)")?;
  if target.kind == TargetKind::Stlib {
    writeln!(out, "\t$(AR) rcs $@ {}", objects.join(" "))?;
  } else {
    let linker = if target.is_cxx() { "$(CXX)" } else { "$(CC)" };
    let shared = if target.kind == TargetKind::Shlib { " -shared" } else { "" };
    writeln!(out, "\t{}{} -o $@ {} $(LINKFLAGS)", linker, shared, inputs.join(" "))?;
  }
  writeln!(out)?;

  let mut extra = Vec::new();
  if target.kind == TargetKind::Shlib {
    extra.push("-fPIC".to_string());
  }
  extra.extend(target.includes.iter().map(|i| format!("-I{}", package_path(package, i))));
  // Public headers of used libraries.
  for (lib_package, lib) in &used {
    extra.extend(lib.includes.iter().map(|i| format!("-I{}", package_path(lib_package, i))));
  }
  extra.extend(target.defines.iter().map(|d| format!("-D{}", d)));
  let extra = if extra.is_empty() {
    String::new()
  } else {
    format!(" {}", extra.join(" "))
  };

  for (source, object) in target.sources.iter().zip(&objects) {
    let compile = if is_cxx_source(source) {
      "$(CXX) $(CXXFLAGS)"
    } else {
      "$(CC) $(CFLAGS)"
    };
    writeln!(out, "{}: {}", object, package_path(package, source))?;
    writeln!(out, "\t@mkdir -p $(dir $@)")?;
    writeln!(out, "\t{} $(DEFINES){} -c -o $@ $<", compile, extra)?;
    writeln!(out)?;
  }

  Ok(())
}

fn render_maintenance(out: &mut String, env: &ToolchainEnv, targets: &[(&Package, &TargetDef)]) -> std::fmt::Result {
  writeln!(out, "clean:")?;
  writeln!(out, "\trm -rf $(OUT)")?;
  writeln!(out)?;

  let installed: Vec<&TargetDef> = targets.iter().map(|(_, t)| *t).filter(|t| t.install).collect();

  writeln!(out, "install: all")?;
  for target in &installed {
    let dir = install_dir(target.kind);
    let mode = if target.kind == TargetKind::Program { "755" } else { "644" };
    writeln!(out, "\tinstall -d {}", dir)?;
    writeln!(out, "\tinstall -m {} {} {}", mode, output_path(env, target), dir)?;
  }
  writeln!(out)?;

  writeln!(out, "uninstall:")?;
  for target in &installed {
    let name = env.output_name(target.kind.pattern(env), &target.name);
    writeln!(out, "\trm -f {}/{}", install_dir(target.kind), name)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildOptions, derive_toolchain};
  use crate::consts::NATIVE_VARIANT;
  use crate::project::Variant;
  use std::path::PathBuf;

  fn packages() -> Vec<Package> {
    vec![
      Package {
        path: PathBuf::from("hello"),
        targets: vec![TargetDef {
          name: "hello".to_string(),
          kind: TargetKind::Program,
          sources: vec!["main.cpp".to_string()],
          includes: Vec::new(),
          defines: vec!["GREETING=1".to_string()],
          uses: vec!["greet".to_string()],
          install: true,
        }],
        export: true,
      },
      Package {
        path: PathBuf::from("libgreet"),
        targets: vec![TargetDef {
          name: "greet".to_string(),
          kind: TargetKind::Shlib,
          sources: vec!["greet.c".to_string()],
          includes: vec!["include".to_string()],
          defines: Vec::new(),
          uses: Vec::new(),
          install: false,
        }],
        export: true,
      },
    ]
  }

  fn native() -> ToolchainEnv {
    derive_toolchain(NATIVE_VARIANT, None, &BuildOptions::default())
  }

  fn render_env(env: &ToolchainEnv, packages: &[Package]) -> String {
    let out_dir = Path::new("build").join(&env.variant);
    render("hello", env, packages, &out_dir).unwrap()
  }

  #[test]
  fn header_carries_toolchain_and_prefix() {
    let text = render_env(&native(), &packages());
    assert!(text.contains("CC = gcc\n"));
    assert!(text.contains("CXX = g++\n"));
    assert!(text.contains("DEFINES = -DNDEBUG\n"));
    assert!(text.contains("PREFIX ?= /usr/local\n"));
    assert!(text.contains("DESTDIR ?=\n"));
    assert!(text.contains("OUT = build/default\n"));
  }

  #[test]
  fn targets_are_ordered_and_phony() {
    let text = render_env(&native(), &packages());
    assert!(text.contains(".PHONY: all clean install uninstall greet hello\n"));
    assert!(text.contains("all: greet hello\n"));
  }

  #[test]
  fn compile_rules_pick_compiler_and_pic() {
    let env = native();
    let text = render_env(&env, &packages());
    let lib = env.output_name(&env.patterns.shlib, "greet");

    assert!(text.contains("$(OUT)/libgreet/greet.c.greet.o: libgreet/greet.c\n"));
    assert!(text.contains("\t$(CC) $(CFLAGS) $(DEFINES) -fPIC -Ilibgreet/include -c -o $@ $<\n"));
    assert!(text.contains("\t$(CXX) $(CXXFLAGS) $(DEFINES) -Ilibgreet/include -DGREETING=1 -c -o $@ $<\n"));
    assert!(text.contains(&format!("$(OUT)/hello: $(OUT)/hello/main.cpp.hello.o $(OUT)/{}\n", lib)));
    assert!(text.contains(&format!("\t$(CXX) -o $@ $(OUT)/hello/main.cpp.hello.o $(OUT)/{} $(LINKFLAGS)\n", lib)));
  }

  #[test]
  fn install_respects_the_flag() {
    let text = render_env(&native(), &packages());
    assert!(text.contains("\tinstall -m 755 $(OUT)/hello $(DESTDIR)$(PREFIX)/bin\n"));
    assert!(text.contains("\trm -f $(DESTDIR)$(PREFIX)/bin/hello\n"));
    assert!(!text.contains("$(DESTDIR)$(PREFIX)/lib"));
  }

  #[test]
  fn cross_variant_uses_its_patterns() {
    let variant = Variant {
      cross: "i686-w64-mingw32-".to_string(),
      dest_os: Some("win32".to_string()),
      ..Default::default()
    };
    let env = derive_toolchain("win32", Some(&variant), &BuildOptions::default());
    let text = render_env(&env, &packages());

    assert!(text.contains("CC = i686-w64-mingw32-gcc\n"));
    assert!(text.contains("OUT = build/win32\n"));
    assert!(text.contains("$(OUT)/hello.exe"));
    assert!(text.contains("$(OUT)/greet.dll"));
  }

  #[test]
  fn shared_source_gets_one_object_per_target() {
    let target = |name: &str, kind| TargetDef {
      name: name.to_string(),
      kind,
      sources: vec!["foo.c".to_string()],
      includes: Vec::new(),
      defines: Vec::new(),
      uses: Vec::new(),
      install: true,
    };
    let packages = vec![Package {
      path: PathBuf::from("foo"),
      targets: vec![target("foo", TargetKind::Shlib), target("foo_static", TargetKind::Stlib)],
      export: true,
    }];
    let text = render_env(&native(), &packages);

    assert_eq!(text.matches("$(OUT)/foo/foo.c.foo.o: foo/foo.c\n").count(), 1);
    assert_eq!(text.matches("$(OUT)/foo/foo.c.foo_static.o: foo/foo.c\n").count(), 1);
    assert!(text.contains("\t$(CC) $(CFLAGS) $(DEFINES) -fPIC -c -o $@ $<\n"));
    assert!(text.contains("\t$(CC) $(CFLAGS) $(DEFINES) -c -o $@ $<\n"));
    assert!(text.contains("\t$(AR) rcs $@ $(OUT)/foo/foo.c.foo_static.o\n"));
  }
}
