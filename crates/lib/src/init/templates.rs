//! Template content for `bootwaf init`.

/// Template for the project file.
pub const PROJECT_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../lua/template.lua"));
