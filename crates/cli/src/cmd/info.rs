use anyhow::Result;

use bootwaf_lib::bootstrap::PackageManager;
use bootwaf_lib::platform::release::{detect_release, os_release_path};
use bootwaf_lib::platform::{is_elevated, platform_triple};

use crate::output::{OutputFormat, print_json, print_stat, print_warning};

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let path = os_release_path();
  let release = detect_release(&path);
  let manager = release.as_ref().ok().and_then(PackageManager::for_release);

  if output.is_json() {
    let release_json = release.as_ref().ok().map(|r| {
      serde_json::json!({ "id": r.id, "id_like": r.id_like, "version_id": r.version_id, "pretty_name": r.pretty_name })
    });
    return print_json(&serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "platform": platform_triple(),
      "os_release": release_json,
      "package_manager": manager.map(|m| m.as_str()),
      "elevated": is_elevated(),
    }));
  }

  println!("bootwaf v{}", env!("CARGO_PKG_VERSION"));
  println!();
  match platform_triple() {
    Some(triple) => print_stat("Platform", &triple),
    None => print_stat("Platform", "unknown"),
  }
  match &release {
    Ok(release) => print_stat("OS release", &release.display_name()),
    Err(e) => print_warning(&format!("{}", e)),
  }
  match manager {
    Some(manager) => print_stat("Package manager", manager.as_str()),
    None => print_stat("Package manager", "unsupported"),
  }
  print_stat("Elevated", &is_elevated().to_string());

  Ok(())
}
