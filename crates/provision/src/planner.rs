//! Synced folder planning
//!
//! Turns a [`Config`] into a [`ResolvedPlan`]: guest paths for the active
//! mode and module paths, the synced folders the VM layer has to mount, and
//! the guest directories to verify before running the applier.

use std::collections::HashSet;
use std::path::Path;

use crate::config::{Config, Mode, expand_host_path};
use crate::paths::resolve_guest_path;
use crate::types::{
    ModulePathMapping, PathKind, ResolvedMode, ResolvedPlan, SyncedFolder, SyncedFolderOptions,
    TaggedPath, join_guest,
};

/// File name of the uploaded hiera config inside the scratch directory
pub const HIERA_FILE_NAME: &str = "hiera.yaml";

/// Receiver for synced folder directives (the VM layer).
pub trait FolderRegistry {
    fn synced_folder(&mut self, folder: SyncedFolder);
}

impl FolderRegistry for Vec<SyncedFolder> {
    fn synced_folder(&mut self, folder: SyncedFolder) {
        self.push(folder);
    }
}

/// Mount options for every folder of a config.
pub fn folder_options(config: &Config) -> SyncedFolderOptions {
    match &config.synced_folder_type {
        Some(folder_type) => SyncedFolderOptions {
            owner: None,
            folder_type: Some(folder_type.clone()),
            args: config.synced_folder_args.clone(),
        },
        None => SyncedFolderOptions {
            owner: Some("root".to_string()),
            folder_type: None,
            args: config.synced_folder_args.clone(),
        },
    }
}

/// Resolve a config into a plan. `root` anchors relative host paths.
///
/// Folders are ordered manifests/environments first, then module paths in
/// declared order. A module path listed twice is shared once.
pub fn plan(config: &Config, root: &Path) -> ResolvedPlan {
    let options = folder_options(config);
    let temp_dir = config.temp_dir.as_str();

    let mut synced_folders = Vec::new();
    let mut verify = Vec::new();

    let mut share = |tagged: &TaggedPath, guest: &str| {
        if let TaggedPath::Host(host) = tagged {
            synced_folders.push(SyncedFolder {
                host_path: expand_host_path(root, host).display().to_string(),
                guest_path: guest.to_string(),
                options: options.clone(),
            });
            verify.push(guest.to_string());
        }
    };

    let mode = match config.mode() {
        Mode::Manifest { path, file } => {
            let dir = resolve_guest_path(&path, PathKind::Manifests, temp_dir);
            share(&path, &dir);
            ResolvedMode::Manifest {
                dir,
                file: file.to_string(),
            }
        }
        Mode::Environment { path, name } => {
            let dir = resolve_guest_path(path, PathKind::Environments, temp_dir);
            share(path, &dir);
            ResolvedMode::Environment {
                dir,
                name: name.to_string(),
            }
        }
    };

    let mut seen = HashSet::new();
    let mut module_paths = Vec::new();
    for host in &config.module_path {
        if !seen.insert(host.as_str()) {
            log::debug!("Skipping duplicate module path: {}", host);
            continue;
        }
        let tagged = TaggedPath::Host(host.clone());
        let guest_path = resolve_guest_path(&tagged, PathKind::Modules, temp_dir);
        share(&tagged, &guest_path);
        module_paths.push(ModulePathMapping {
            host_path: host.clone(),
            guest_path,
        });
    }

    let hiera_guest_path = config
        .hiera_config_path
        .as_ref()
        .map(|_| join_guest(temp_dir, HIERA_FILE_NAME));

    ResolvedPlan {
        mode,
        hiera_guest_path,
        module_paths,
        synced_folders,
        verify,
    }
}

/// Plan a config and register its synced folders.
pub fn configure(config: &Config, root: &Path, registry: &mut dyn FolderRegistry) -> ResolvedPlan {
    let plan = plan(config, root);
    for folder in &plan.synced_folders {
        log::info!(
            "Sharing {} -> {}",
            folder.host_path,
            folder.guest_path
        );
        registry.synced_folder(folder.clone());
    }
    plan
}
