use anyhow::{Result, bail};

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let project = super::load_project(ctx)?;

    let mut problems = project.config().validate(&project.root);
    problems.extend(project.guest().validate());

    if problems.is_empty() {
        if !ctx.quiet {
            ui::success(&format!("{} is valid", ctx.config_path.display()));
        }
        return Ok(());
    }

    ui::header(&format!("{} Problem(s) Found", problems.len()));
    for problem in &problems {
        ui::error(problem);
    }
    bail!("{} is not valid", ctx.config_path.display())
}
