use anyhow::{Context as _, Result};
use provision::{Provisioner, ResolvedMode, ResolvedPlan, SyncedFolder, shell};

use crate::Context;
use crate::cli::PlanArgs;
use crate::ui;

const PATH_WIDTH: usize = 60;

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let project = super::load_project(ctx)?;
    let provisioner = Provisioner::configure(
        project.config().clone(),
        &project.root,
        project.guest().platform,
        &mut Vec::<SyncedFolder>::new(),
    );
    let plan = provisioner.plan();

    if args.json {
        let json = serde_json::to_string_pretty(plan).context("Failed to serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    ui::header("Provisioning Plan");
    for (key, value) in mode_summary(plan) {
        ui::kv(key, &value);
    }

    ui::section("Synced folders");
    if plan.synced_folders.is_empty() {
        ui::dim("(none, every path is guest-side)");
    }
    for folder in &plan.synced_folders {
        println!(
            "  {} -> {}",
            ui::truncate_path(&folder.host_path, PATH_WIDTH),
            folder.guest_path
        );
    }

    if !plan.module_paths.is_empty() {
        ui::section("Module paths");
        for module in &plan.module_paths {
            ui::kv(&module.host_path, &module.guest_path);
        }
    }

    if ctx.verbose > 0 {
        ui::section("Guest checks");
        for path in &plan.verify {
            ui::dim(&shell::directory_exists(provisioner.platform(), path));
        }
    }
    Ok(())
}

/// Key/value lines describing the resolved mode
fn mode_summary(plan: &ResolvedPlan) -> Vec<(&'static str, String)> {
    let mut lines = match &plan.mode {
        ResolvedMode::Manifest { dir, file } => vec![
            ("mode", "manifest".to_string()),
            ("manifests", dir.clone()),
            ("manifest file", file.clone()),
        ],
        ResolvedMode::Environment { dir, name } => vec![
            ("mode", "environment".to_string()),
            ("environments", dir.clone()),
            ("environment", name.clone()),
        ],
    };
    if let Some(hiera) = &plan.hiera_guest_path {
        lines.push(("hiera config", hiera.clone()));
    }
    lines
}
