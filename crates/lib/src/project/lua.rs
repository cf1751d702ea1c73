use std::collections::BTreeMap;
use std::path::Path;

use mlua::prelude::*;

use super::types::{Dependency, Project, Source, Step, Variant, archive_stem};
use crate::consts::DEFAULT_PREFIX;
use crate::lua::convert::{required_string, string_list};
use crate::lua::runtime;

pub(super) fn evaluate(path: &Path) -> LuaResult<Project> {
  let lua = runtime::create_runtime()?;
  let table = runtime::load_table(&lua, path)?;
  parse_project(&table)
}

fn parse_project(table: &LuaTable) -> LuaResult<Project> {
  let name = required_string(table, "name", "project")?;
  let version = table.get::<Option<String>>("version")?.unwrap_or_else(|| "0.0.0".to_string());
  let prefix = table
    .get::<Option<String>>("prefix")?
    .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

  let packages = match table.get::<LuaValue>("packages")? {
    LuaValue::Nil => BTreeMap::new(),
    LuaValue::Table(t) => {
      let mut packages = BTreeMap::new();
      for pair in t.pairs::<String, LuaValue>() {
        let (manager, _) = pair?;
        packages.insert(manager.clone(), string_list(&t, &manager)?);
      }
      packages
    }
    _ => return Err(LuaError::external("packages must be a table")),
  };

  let dependencies = match table.get::<LuaValue>("dependencies")? {
    LuaValue::Nil => Vec::new(),
    LuaValue::Table(t) => {
      let mut deps = Vec::new();
      for (i, value) in t.sequence_values::<LuaValue>().enumerate() {
        deps.push(parse_dependency(i + 1, value?)?);
      }
      deps
    }
    _ => return Err(LuaError::external("dependencies must be a list")),
  };

  let variants = match table.get::<LuaValue>("variants")? {
    LuaValue::Nil => BTreeMap::new(),
    LuaValue::Table(t) => {
      let mut variants = BTreeMap::new();
      for pair in t.pairs::<String, LuaTable>() {
        let (name, variant) = pair?;
        variants.insert(name, parse_variant(&variant)?);
      }
      variants
    }
    _ => return Err(LuaError::external("variants must be a table")),
  };

  Ok(Project {
    name,
    version,
    prefix,
    packages,
    dependencies,
    variants,
  })
}

fn parse_dependency(index: usize, value: LuaValue) -> LuaResult<Dependency> {
  let LuaValue::Table(table) = value else {
    return Err(LuaError::external(format!("dependency #{} must be a table", index)));
  };

  let context = format!("dependency #{}", index);
  let name = required_string(&table, "name", &context)?;

  let url: Option<String> = table.get("url")?;
  let git: Option<String> = table.get("git")?;
  let source = match (url, git) {
    (Some(url), None) => Source::Archive {
      url,
      sha256: table.get::<Option<String>>("sha256")?.map(|s| s.to_lowercase()),
    },
    (None, Some(url)) => Source::Git {
      url,
      rev: table.get("rev")?,
    },
    _ => {
      return Err(LuaError::external(format!(
        "dependency '{}' needs exactly one of 'url' or 'git'",
        name
      )));
    }
  };

  let dir = match table.get::<Option<String>>("dir")? {
    Some(dir) => dir,
    None => match &source {
      Source::Archive { url, .. } => archive_stem(url),
      Source::Git { .. } => name.clone(),
    },
  };

  let steps = match table.get::<LuaValue>("steps")? {
    LuaValue::Nil => Vec::new(),
    LuaValue::Table(t) => {
      let mut steps = Vec::new();
      for value in t.sequence_values::<LuaValue>() {
        steps.push(parse_step(&name, value?)?);
      }
      steps
    }
    _ => {
      return Err(LuaError::external(format!("dependency '{}': steps must be a list", name)));
    }
  };

  Ok(Dependency {
    source,
    dir,
    creates: table.get("creates")?,
    patch: table.get("patch")?,
    steps,
    name,
  })
}

fn parse_step(dep: &str, value: LuaValue) -> LuaResult<Step> {
  match value {
    LuaValue::String(cmd) => Ok(Step::new(cmd.to_str()?.to_string())),
    LuaValue::Table(t) => Ok(Step {
      cmd: required_string(&t, "cmd", &format!("dependency '{}' step", dep))?,
      sudo: t.get::<Option<bool>>("sudo")?.unwrap_or(false),
      cwd: t.get("cwd")?,
    }),
    other => Err(LuaError::external(format!(
      "dependency '{}': step must be a string or a table, got {}",
      dep,
      other.type_name()
    ))),
  }
}

fn parse_variant(table: &LuaTable) -> LuaResult<Variant> {
  Ok(Variant {
    cross: table.get::<Option<String>>("cross")?.unwrap_or_default(),
    prefix: table.get("prefix")?,
    dest_os: table.get("dest_os")?,
    cflags: string_list(table, "cflags")?,
    cxxflags: string_list(table, "cxxflags")?,
    linkflags: string_list(table, "linkflags")?,
    defines: string_list(table, "defines")?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn eval_str(content: &str) -> LuaResult<Project> {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bootwaf.lua");
    fs::write(&path, content).unwrap();
    evaluate(&path)
  }

  #[test]
  fn parses_full_project() -> LuaResult<()> {
    let project = eval_str(
      r#"
        return {
          name = "hello",
          version = "1.2.0",
          packages = { apt = { "build-essential", "git" }, dnf = "gcc make" },
          dependencies = {
            {
              name = "msgpack",
              url = "https://example.org/msgpack-1.0.0.tar.gz",
              sha256 = "ABCDEF",
              patch = "patches/msgpack.patch",
              steps = { "./configure --prefix=$PREFIX", "make", { cmd = "make install", sudo = true } },
            },
            { name = "jsonrpc", git = "https://example.org/jsonrpc.git", rev = "v0.4.2" },
          },
          variants = {
            win32 = { cross = "i686-w64-mingw32-", prefix = "~/win32", dest_os = "win32", linkflags = "-static" },
          },
        }
      "#,
    )?;

    assert_eq!(project.name, "hello");
    assert_eq!(project.version, "1.2.0");
    assert_eq!(project.prefix, DEFAULT_PREFIX);
    assert_eq!(project.packages["apt"], vec!["build-essential", "git"]);
    assert_eq!(project.packages["dnf"], vec!["gcc", "make"]);

    let msgpack = project.dependency("msgpack").unwrap();
    assert_eq!(msgpack.dir, "msgpack-1.0.0");
    assert_eq!(
      msgpack.source,
      Source::Archive {
        url: "https://example.org/msgpack-1.0.0.tar.gz".to_string(),
        sha256: Some("abcdef".to_string()),
      }
    );
    assert_eq!(msgpack.steps.len(), 3);
    assert!(msgpack.steps[2].sudo);
    assert!(!msgpack.steps[0].sudo);

    let jsonrpc = project.dependency("jsonrpc").unwrap();
    assert_eq!(jsonrpc.dir, "jsonrpc");
    assert!(jsonrpc.steps.is_empty());

    let win32 = &project.variants["win32"];
    assert_eq!(win32.cross, "i686-w64-mingw32-");
    assert_eq!(win32.linkflags, vec!["-static"]);
    Ok(())
  }

  #[test]
  fn dependency_needs_a_single_source() {
    let err = eval_str(
      r#"return { name = "x", dependencies = { { name = "a", url = "u", git = "g" } } }"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("exactly one of 'url' or 'git'"));
  }

  #[test]
  fn name_is_required() {
    let err = eval_str("return {}").unwrap_err();
    assert!(err.to_string().contains("missing required field 'name'"));
  }

  #[test]
  fn dependencies_keep_declaration_order() -> LuaResult<()> {
    let project = eval_str(
      r#"
        return {
          name = "x",
          dependencies = {
            { name = "c", git = "g" },
            { name = "a", git = "g" },
            { name = "b", git = "g" },
          },
        }
      "#,
    )?;
    let names: Vec<_> = project.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
    Ok(())
  }
}
