//! The `bw` global table.
//!
//! - `bw.platform` - platform triple (e.g., "x86_64-linux")
//! - `bw.os` / `bw.arch` - the two halves of the triple
//! - `bw.home` - the user's home directory
//! - `bw.dir` - directory of the file being evaluated (set by the loader)

use mlua::prelude::*;

use crate::platform::Platform;
use crate::platform::paths::home_dir;

pub fn register_globals(lua: &Lua) -> LuaResult<()> {
  let bw = lua.create_table()?;

  let platform = Platform::current().ok_or_else(|| LuaError::external("unsupported platform"))?;
  bw.set("platform", platform.triple())?;
  bw.set("os", platform.os.as_str())?;
  bw.set("arch", platform.arch.as_str())?;
  bw.set("home", home_dir().to_string_lossy().to_string())?;
  bw.set("version", env!("CARGO_PKG_VERSION"))?;

  lua.globals().set("bw", bw)?;
  Ok(())
}
