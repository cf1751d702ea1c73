//! Lua runtime shared by project files and package descriptors.
//!
//! - [`runtime`] - VM creation and file loading
//! - [`globals`] - the `bw` global table
//! - [`convert`] - helpers for reading typed fields out of Lua tables

pub mod convert;
pub mod globals;
pub mod runtime;
