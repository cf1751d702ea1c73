//! The `bld` context handed to descriptor `build` functions.
//!
//! ```lua
//! return {
//!   build = function(bld)
//!     bld.stlib{ target = "util", source = { "util.c" }, includes = { "." } }
//!     bld.program{ target = "hello", source = "main.c", use = { "util" } }
//!   end,
//! }
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;

use super::types::{Package, TargetDef, TargetKind};
use crate::config::ToolchainEnv;
use crate::consts::DESCRIPTOR_FILE;
use crate::lua::convert::{required_string, string_list};
use crate::lua::runtime;

/// Evaluate the descriptor in `root/dir` against a toolchain environment.
pub fn evaluate_descriptor(root: &Path, dir: &Path, env: &ToolchainEnv) -> LuaResult<Package> {
  let lua = runtime::create_runtime()?;
  let table = runtime::load_table(&lua, &root.join(dir).join(DESCRIPTOR_FILE))?;

  let export = table.get::<Option<bool>>("export")?.unwrap_or(true);
  let targets = Rc::new(RefCell::new(Vec::new()));

  match table.get::<LuaValue>("build")? {
    LuaValue::Function(build) => {
      let bld = create_bld(&lua, dir, env, targets.clone())?;
      build.call::<()>(bld)?;
    }
    LuaValue::Nil => {}
    other => {
      return Err(LuaError::external(format!(
        "'build' must be a function, got {}",
        other.type_name()
      )));
    }
  }

  let targets = targets.borrow().clone();
  Ok(Package {
    path: dir.to_path_buf(),
    targets,
    export,
  })
}

fn create_bld(lua: &Lua, dir: &Path, env: &ToolchainEnv, targets: Rc<RefCell<Vec<TargetDef>>>) -> LuaResult<LuaTable> {
  let bld = lua.create_table()?;
  bld.set("env", lua.to_value(env)?)?;
  bld.set("variant", env.variant.as_str())?;
  bld.set("path", dir.to_string_lossy().to_string())?;

  for kind in [TargetKind::Program, TargetKind::Shlib, TargetKind::Stlib] {
    let targets = targets.clone();
    // Accept both `bld.program{...}` and `bld:program{...}`.
    let declare = lua.create_function(move |_, args: LuaMultiValue| {
      let decl = match args.into_iter().last() {
        Some(LuaValue::Table(t)) => t,
        _ => {
          return Err(LuaError::external(format!("bld.{} expects a table", kind)));
        }
      };
      targets.borrow_mut().push(parse_target(kind, &decl)?);
      Ok(())
    })?;
    bld.set(kind.as_str(), declare)?;
  }

  Ok(bld)
}

fn parse_target(kind: TargetKind, decl: &LuaTable) -> LuaResult<TargetDef> {
  let name = required_string(decl, "target", &format!("bld.{}", kind))?;
  let sources = string_list(decl, "source")?;
  if sources.is_empty() {
    return Err(LuaError::external(format!("target '{}' has no sources", name)));
  }

  Ok(TargetDef {
    kind,
    sources,
    includes: string_list(decl, "includes")?,
    defines: string_list(decl, "defines")?,
    uses: string_list(decl, "use")?,
    install: decl.get::<Option<bool>>("install")?.unwrap_or(true),
    name,
  })
}
