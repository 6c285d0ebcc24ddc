use anyhow::{Context as _, Result, bail};
use provision::{Provisioner, SyncedFolder};

use crate::Context;
use crate::cli::ProvisionArgs;
use crate::ui::{self, TerminalProgress};

pub fn run(ctx: &Context, args: &ProvisionArgs) -> Result<()> {
    let project = super::load_project(ctx)?;
    let guest = project.guest();

    let guest_errors = guest.validate();
    if !guest_errors.is_empty() {
        for message in &guest_errors {
            ui::error(message);
        }
        bail!("{} problem(s) in the [guest] table", guest_errors.len());
    }
    for message in project.config().validate(&project.root) {
        ui::warn(&message);
    }

    let mut folders: Vec<SyncedFolder> = Vec::new();
    let provisioner = Provisioner::configure(
        project.config().clone(),
        &project.root,
        guest.platform,
        &mut folders,
    )
    .with_folder_sync(args.sync)
    .with_color(ui::color_enabled());

    if ctx.verbose > 0 && !ctx.quiet {
        for folder in &folders {
            ui::dim(&format!("{} -> {}", folder.host_path, folder.guest_path));
        }
    }

    let comm = guest.communicator()?;
    if !ctx.quiet {
        ui::info(&format!("Provisioning {}", guest.describe()));
    }

    if let Err(err) = provisioner.provision(comm.as_ref(), &mut TerminalProgress) {
        let category = err.category();
        ui::warn(&format!("{category}: {}", category.advice()));
        return Err(err).with_context(|| format!("Provisioning {} failed", guest.describe()));
    }

    if !ctx.quiet {
        ui::success(&format!("Provisioned {}", guest.describe()));
    }
    Ok(())
}
