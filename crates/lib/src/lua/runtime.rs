use std::path::Path;

use mlua::prelude::*;

use crate::lua::globals;

/// Create a new Lua runtime with the `bw` global registered.
pub fn create_runtime() -> LuaResult<Lua> {
  let lua = Lua::new();
  globals::register_globals(&lua)?;
  Ok(lua)
}

/// Load and execute a Lua file at the given path.
///
/// Sets `bw.dir` to the directory of the loaded file and returns the value
/// the chunk returned.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let canonical_path = path
    .canonicalize()
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  let bw: LuaTable = lua.globals().get("bw")?;
  bw.set(
    "dir",
    canonical_path
      .parent()
      .unwrap_or(Path::new(""))
      .to_string_lossy()
      .to_string(),
  )?;

  lua
    .load(&content)
    .set_name(format!("@{}", canonical_path.display()))
    .eval::<LuaValue>()
}

/// Load a file that must return a table.
pub fn load_table(lua: &Lua, path: &Path) -> LuaResult<LuaTable> {
  match load_file(lua, path)? {
    LuaValue::Table(table) => Ok(table),
    other => Err(LuaError::external(format!(
      "'{}' must return a table, got {}",
      path.display(),
      other.type_name()
    ))),
  }
}
