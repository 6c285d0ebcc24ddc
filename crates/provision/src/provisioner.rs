//! The provisioning pipeline
//!
//! [`Provisioner::configure`] runs once when the machine is defined and
//! registers synced folders. [`Provisioner::provision`] then runs every step
//! against the guest in a fixed order, stopping at the first failure.

use std::path::{Path, PathBuf};

use crate::backend::Communicator;
use crate::capability::{CapabilityRegistry, GuestHook};
use crate::command::ApplyCommand;
use crate::config::{Config, expand_host_path};
use crate::context::ProgressSink;
use crate::error::{Error, Result};
use crate::executor;
use crate::locator::{self, PUPPET_BINARY};
use crate::planner::{self, FolderRegistry};
use crate::shell;
use crate::types::{Platform, ResolvedBinary, ResolvedMode, ResolvedPlan, RunOptions};
use crate::{environment, verify};

/// A configured provisioner for one machine.
#[derive(Debug, Clone)]
pub struct Provisioner {
    config: Config,
    root: PathBuf,
    capabilities: CapabilityRegistry,
    plan: ResolvedPlan,
    sync_folders: bool,
    color: bool,
}

impl Provisioner {
    /// Resolve `config` and register its synced folders with `registry`.
    pub fn configure(
        config: Config,
        root: impl Into<PathBuf>,
        platform: Platform,
        registry: &mut dyn FolderRegistry,
    ) -> Self {
        let root = root.into();
        let plan = planner::configure(&config, &root, registry);
        Self {
            config,
            root,
            capabilities: CapabilityRegistry::for_platform(platform),
            plan,
            sync_folders: false,
            color: true,
        }
    }

    /// Upload planned folders to the guest instead of relying on the VM layer to mount them.
    #[must_use]
    pub fn with_folder_sync(mut self, enabled: bool) -> Self {
        self.sync_folders = enabled;
        self
    }

    /// Whether the applier may emit colored output.
    #[must_use]
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn plan(&self) -> &ResolvedPlan {
        &self.plan
    }

    pub fn platform(&self) -> Platform {
        self.capabilities.platform()
    }

    /// The command line that would run with `binary`.
    pub fn command_for(&self, binary: &ResolvedBinary) -> String {
        ApplyCommand::from_plan(&self.config, &self.plan, binary, self.platform(), self.color)
            .build()
    }

    /// Run the full pipeline against the guest.
    pub fn provision(&self, comm: &dyn Communicator, sink: &mut dyn ProgressSink) -> Result<()> {
        if self.config.temp_dir.trim().is_empty() {
            return Err(Error::Config("temp_dir cannot be empty".to_string()));
        }

        if self.capabilities.supports(GuestHook::WaitForReboot) {
            log::debug!("Waiting for any pending reboot");
            comm.invoke_hook(GuestHook::WaitForReboot)?;
        }

        executor::prepare(comm, &self.config.temp_dir, self.platform())?;

        if self.sync_folders {
            self.sync(comm)?;
        }

        verify::verify(comm, &self.plan.verify, self.platform())?;

        let binary = locator::locate(
            comm,
            PUPPET_BINARY,
            self.config.binary_path.as_deref(),
            self.platform(),
        )?;
        log::debug!("Using {}", binary.invocation());

        if let (Some(local), Some(guest)) =
            (&self.config.hiera_config_path, &self.plan.hiera_guest_path)
        {
            executor::upload_hiera(comm, &expand_host_path(&self.root, local), guest)?;
        }

        match &self.plan.mode {
            ResolvedMode::Environment { dir, name } => {
                environment::read(comm, dir, name, self.platform())?;
                sink.info(&format!("Running puppet apply with environment {name}..."));
            }
            ResolvedMode::Manifest { file, .. } => {
                sink.info(&format!("Running puppet apply with {file}..."));
            }
        }

        let command = self.command_for(&binary);
        executor::run(comm, &command, &RunOptions::applier(), sink)
    }

    fn sync(&self, comm: &dyn Communicator) -> Result<()> {
        for folder in &self.plan.synced_folders {
            log::info!("Syncing {} -> {}", folder.host_path, folder.guest_path);
            comm.sudo(&shell::remove_tree(self.platform(), &folder.guest_path))?;
            comm.upload(Path::new(&folder.host_path), &folder.guest_path)?;
        }
        Ok(())
    }
}
