//! Reading typed fields out of Lua tables.

use mlua::prelude::*;

/// Read a list of strings.
///
/// Accepts `nil` (empty), a single string (split on whitespace) or a
/// sequence of strings.
pub fn string_list(table: &LuaTable, key: &str) -> LuaResult<Vec<String>> {
  match table.get::<LuaValue>(key)? {
    LuaValue::Nil => Ok(Vec::new()),
    LuaValue::String(s) => Ok(s.to_str()?.split_whitespace().map(str::to_string).collect()),
    LuaValue::Table(t) => t.sequence_values::<String>().collect(),
    other => Err(LuaError::external(format!(
      "'{}' must be a string or a list of strings, got {}",
      key,
      other.type_name()
    ))),
  }
}

/// Read a required string field.
pub fn required_string(table: &LuaTable, key: &str, context: &str) -> LuaResult<String> {
  table
    .get::<Option<String>>(key)?
    .ok_or_else(|| LuaError::external(format!("{}: missing required field '{}'", context, key)))
}
