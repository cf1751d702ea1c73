//! bootwaf-lib: bootstrap and build configuration for C/C++ projects.
//!
//! - `project`: the `bootwaf.lua` project file
//! - `bootstrap`: OS packages and third-party dependencies under `ext/`
//! - `config`: per-variant toolchain environments
//! - `build`: discovery and evaluation of `build.lua` package descriptors
//! - `export`: standalone makefiles and Code::Blocks workspaces for configured variants
//! - `package`: staged installs archived as tarballs

pub mod bootstrap;
pub mod build;
pub mod config;
pub mod consts;
pub mod export;
pub mod init;
pub mod lua;
pub mod package;
pub mod platform;
pub mod project;
