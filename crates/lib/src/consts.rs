//! Names shared across the crate.

pub const APP_NAME: &str = "bootwaf";

/// Project file evaluated at the root of a project.
pub const PROJECT_FILE: &str = "bootwaf.lua";

/// Per-package build descriptor discovered below the project root.
pub const DESCRIPTOR_FILE: &str = "build.lua";

pub const EXT_DIR: &str = "ext";
pub const DOWNLOADS_DIR: &str = "downloads";
pub const BUILD_DIR: &str = "build";

/// Code::Blocks workspaces, one subdirectory per variant.
pub const CODEBLOCKS_DIR: &str = "codeblocks";

/// Records the OS packages installed by the last bootstrap, relative to `ext/`.
pub const PACKAGES_STAMP: &str = ".packages";

/// Variant name used for the host toolchain.
pub const NATIVE_VARIANT: &str = "default";

pub const DEFAULT_PREFIX: &str = "/usr/local";

/// Environment variable overriding the os-release location.
pub const OS_RELEASE_ENV: &str = "BOOTWAF_OS_RELEASE";
pub const OS_RELEASE_PATH: &str = "/etc/os-release";
