mod bootstrap;
mod configure;
mod export;
mod info;
mod init;
mod list;
mod package;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use bootwaf_lib::consts::PROJECT_FILE;
use bootwaf_lib::platform::paths::Layout;
use bootwaf_lib::project::{self, Project};

pub use bootstrap::cmd_bootstrap;
pub use configure::{ConfigureArgs, cmd_configure};
pub use export::{ExportTarget, cmd_export};
pub use info::cmd_info;
pub use init::cmd_init;
pub use list::cmd_list;
pub use package::{PackageType, cmd_package};

/// Resolve the project root and load its project file.
fn open_project(dir: &Path) -> Result<(Layout, Project)> {
  let root = dir
    .canonicalize()
    .with_context(|| format!("Project directory not found: {}", dir.display()))?;
  let project = project::load(&root.join(PROJECT_FILE)).context("Failed to load project")?;
  debug!(root = %root.display(), project = %project.name, "opened project");
  Ok((Layout::new(root), project))
}
