//! Per-variant toolchain environments.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::options::BuildOptions;
use crate::consts::NATIVE_VARIANT;
use crate::platform::paths::expand_tilde;
use crate::project::Variant;

const DEBUG_FLAGS: &[&str] = &["-Wall", "-g", "-ggdb"];
const RELEASE_FLAGS: &[&str] = &["-Wall", "-O3"];

/// Output file name patterns; `%s` is replaced by the target name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patterns {
  pub program: String,
  pub shlib: String,
  pub stlib: String,
}

impl Patterns {
  pub fn for_dest_os(dest_os: &str) -> Self {
    match dest_os {
      "win32" => Self {
        program: "%s.exe".to_string(),
        shlib: "%s.dll".to_string(),
        stlib: "lib%s.a".to_string(),
      },
      _ => Self {
        program: "%s".to_string(),
        shlib: "lib%s.so".to_string(),
        stlib: "lib%s.a".to_string(),
      },
    }
  }
}

/// The configuration state of one variant.
///
/// Field names follow the variables the exported makefiles and descriptor
/// scripts see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ToolchainEnv {
  pub variant: String,
  pub cross: String,
  pub cc: String,
  pub cxx: String,
  pub ar: String,
  pub prefix: PathBuf,
  pub bindir: PathBuf,
  pub libdir: PathBuf,
  pub includedir: PathBuf,
  pub cflags: Vec<String>,
  pub cxxflags: Vec<String>,
  pub linkflags: Vec<String>,
  pub defines: Vec<String>,
  pub dest_os: String,
  pub debug: bool,
  pub patterns: Patterns,
}

impl ToolchainEnv {
  pub fn is_native(&self) -> bool {
    self.variant == NATIVE_VARIANT
  }

  /// Output file name of a target of the given kind.
  pub fn output_name(&self, pattern: &str, target: &str) -> String {
    pattern.replace("%s", target)
  }
}

fn first_or(candidates: &[String], fallback: &str) -> String {
  candidates.first().cloned().unwrap_or_else(|| fallback.to_string())
}

/// Derive the toolchain environment of a variant.
///
/// `variant` is `None` for the native toolchain. Tool names are the first
/// compiler candidate prefixed with the variant's cross prefix; flags come
/// from the debug toggle plus the variant's extras.
pub fn derive_toolchain(name: &str, variant: Option<&Variant>, options: &BuildOptions) -> ToolchainEnv {
  let default_variant = Variant::default();
  let variant = variant.unwrap_or(&default_variant);
  let cross = variant.cross.as_str();

  let prefix = match (&variant.prefix, name == NATIVE_VARIANT) {
    (Some(prefix), _) => expand_tilde(prefix),
    (None, true) => expand_tilde(&options.prefix),
    (None, false) => expand_tilde(&options.prefix).join(name),
  };

  let base: &[&str] = if options.debug { DEBUG_FLAGS } else { RELEASE_FLAGS };
  let base: Vec<String> = base.iter().map(|s| s.to_string()).collect();

  let mut defines = Vec::new();
  if !options.debug {
    defines.push("NDEBUG".to_string());
  }
  defines.extend(variant.defines.iter().cloned());

  // Cross variants default to linux; the native toolchain targets the host.
  let dest_os = match (&variant.dest_os, name == NATIVE_VARIANT) {
    (Some(dest_os), _) => dest_os.clone(),
    (None, true) => std::env::consts::OS.replace("macos", "darwin").replace("windows", "win32"),
    (None, false) => "linux".to_string(),
  };

  ToolchainEnv {
    variant: name.to_string(),
    cross: cross.to_string(),
    cc: format!("{}{}", cross, first_or(&options.check_c_compiler, "gcc")),
    cxx: format!("{}{}", cross, first_or(&options.check_cxx_compiler, "g++")),
    ar: format!("{}ar", cross),
    bindir: prefix.join("bin"),
    libdir: prefix.join("lib"),
    includedir: prefix.join("include"),
    prefix,
    cflags: base.iter().cloned().chain(variant.cflags.iter().cloned()).collect(),
    cxxflags: base.into_iter().chain(variant.cxxflags.iter().cloned()).collect(),
    linkflags: variant.linkflags.clone(),
    defines,
    patterns: Patterns::for_dest_os(&dest_os),
    dest_os,
    debug: options.debug,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn win32() -> Variant {
    Variant {
      cross: "i686-w64-mingw32-".to_string(),
      prefix: Some("/opt/win32".to_string()),
      dest_os: Some("win32".to_string()),
      linkflags: vec!["-static".to_string()],
      ..Default::default()
    }
  }

  #[test]
  fn cross_prefix_is_prepended_to_tools() {
    let env = derive_toolchain("win32", Some(&win32()), &BuildOptions::default());
    assert_eq!(env.cc, "i686-w64-mingw32-gcc");
    assert_eq!(env.cxx, "i686-w64-mingw32-g++");
    assert_eq!(env.ar, "i686-w64-mingw32-ar");
    assert_eq!(env.prefix, PathBuf::from("/opt/win32"));
    assert_eq!(env.bindir, PathBuf::from("/opt/win32/bin"));
    assert_eq!(env.linkflags, vec!["-static"]);
    assert_eq!(env.patterns.program, "%s.exe");
    assert_eq!(env.output_name(&env.patterns.shlib, "foo"), "foo.dll");
  }

  #[test]
  fn cross_prefix_applies_to_selected_compiler() {
    let options = BuildOptions {
      check_c_compiler: vec!["clang".to_string(), "gcc".to_string()],
      check_cxx_compiler: vec!["clang++".to_string()],
      ..Default::default()
    };
    let env = derive_toolchain("win32", Some(&win32()), &options);
    assert_eq!(env.cc, "i686-w64-mingw32-clang");
    assert_eq!(env.cxx, "i686-w64-mingw32-clang++");
  }

  #[test]
  fn native_uses_plain_names_and_option_prefix() {
    let options = BuildOptions {
      prefix: "/srv/app".to_string(),
      ..Default::default()
    };
    let env = derive_toolchain(NATIVE_VARIANT, None, &options);
    assert!(env.is_native());
    assert_eq!(env.cc, "gcc");
    assert_eq!(env.cxx, "g++");
    assert_eq!(env.ar, "ar");
    assert_eq!(env.prefix, PathBuf::from("/srv/app"));
    assert_eq!(env.libdir, PathBuf::from("/srv/app/lib"));
  }

  #[test]
  fn variant_without_prefix_nests_under_option_prefix() {
    let variant = Variant {
      cross: "arm-linux-gnueabihf-".to_string(),
      ..Default::default()
    };
    let env = derive_toolchain("arm", Some(&variant), &BuildOptions::default());
    assert_eq!(env.prefix, PathBuf::from("/usr/local/arm"));
    assert_eq!(env.cc, "arm-linux-gnueabihf-gcc");
    assert_eq!(env.dest_os, "linux");
    assert_eq!(env.patterns.shlib, "lib%s.so");
  }

  #[test]
  fn debug_flags_have_symbols_and_no_ndebug() {
    let options = BuildOptions {
      debug: true,
      ..Default::default()
    };
    let env = derive_toolchain(NATIVE_VARIANT, None, &options);
    assert!(env.cflags.contains(&"-g".to_string()));
    assert!(env.cxxflags.contains(&"-ggdb".to_string()));
    assert!(!env.cflags.iter().any(|f| f.starts_with("-O")));
    assert!(!env.defines.contains(&"NDEBUG".to_string()));
  }

  #[test]
  fn release_flags_optimize_and_define_ndebug() {
    let env = derive_toolchain(NATIVE_VARIANT, None, &BuildOptions::default());
    assert!(env.cflags.contains(&"-O3".to_string()));
    assert!(env.cxxflags.contains(&"-O3".to_string()));
    assert!(!env.cflags.contains(&"-g".to_string()));
    assert!(env.defines.contains(&"NDEBUG".to_string()));
  }

  #[test]
  fn variant_extras_are_appended() {
    let variant = Variant {
      cflags: vec!["-m32".to_string()],
      defines: vec!["WIN32".to_string()],
      ..win32()
    };
    let env = derive_toolchain("win32", Some(&variant), &BuildOptions::default());
    assert_eq!(env.cflags, vec!["-Wall", "-O3", "-m32"]);
    assert_eq!(env.defines, vec!["NDEBUG", "WIN32"]);
  }

  #[test]
  fn env_round_trips_through_json() {
    let env = derive_toolchain("win32", Some(&win32()), &BuildOptions::default());
    let json = serde_json::to_string(&env).unwrap();
    assert!(json.contains("\"CC\":\"i686-w64-mingw32-gcc\""));
    let back: ToolchainEnv = serde_json::from_str(&json).unwrap();
    assert_eq!(back, env);
  }
}
