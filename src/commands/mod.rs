// Guest commands
pub mod provision;

// Offline commands
pub mod command;
pub mod plan;
pub mod validate;

use anyhow::Result;

use crate::Context;
use crate::project::Project;

/// Load the project file named on the command line
pub fn load_project(ctx: &Context) -> Result<Project> {
    Project::load(&ctx.config_path)
}
