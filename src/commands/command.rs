use anyhow::Result;
use provision::locator::PUPPET_BINARY;
use provision::{Provisioner, ResolvedBinary, SyncedFolder};

use crate::Context;
use crate::cli::CommandArgs;
use crate::ui;

pub fn run(ctx: &Context, args: &CommandArgs) -> Result<()> {
    let project = super::load_project(ctx)?;
    let platform = args
        .platform
        .map_or(project.guest().platform, Into::into);

    let provisioner = Provisioner::configure(
        project.config().clone(),
        &project.root,
        platform,
        &mut Vec::<SyncedFolder>::new(),
    )
    .with_color(!args.no_color && ui::color_enabled());

    let binary = binary_for(&provisioner, args.binary_path.as_deref());
    println!("{}", provisioner.command_for(&binary));
    Ok(())
}

/// The binary to show: `--binary-path` wins over the project's `binary_path`.
fn binary_for(provisioner: &Provisioner, binary_path: Option<&str>) -> ResolvedBinary {
    let prefix = binary_path
        .or(provisioner.config().binary_path.as_deref())
        .map(str::to_string);
    ResolvedBinary::configured(PUPPET_BINARY, prefix)
}
