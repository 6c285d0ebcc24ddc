//! Provisioner configuration
//!
//! This is the `[provision]` table of a project file. Relative host paths are
//! resolved against the project root, the directory the file was loaded from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::TaggedPath;

/// Default guest scratch directory
pub const DEFAULT_TEMP_DIR: &str = "/tmp/guestprov-puppet";

/// Default manifest file in manifest mode
pub const DEFAULT_MANIFEST_FILE: &str = "default.pp";

/// Default environment name in environment mode
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Default host manifests directory when neither mode is configured
pub const DEFAULT_MANIFESTS_DIR: &str = "manifests";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `manifest_file` (manifest mode)
    #[serde(default)]
    pub manifests_path: Option<TaggedPath>,

    /// Manifest to apply (manifest mode)
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Directory holding environments; setting it selects environment mode
    #[serde(default)]
    pub environment_path: Option<TaggedPath>,

    /// Environment to apply (environment mode)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Host module directories, shared and added to `--modulepath` in order
    #[serde(default)]
    pub module_path: Vec<String>,

    /// Host hiera config uploaded to the guest
    #[serde(default)]
    pub hiera_config_path: Option<String>,

    /// Install prefix of the `puppet` binary on the guest
    #[serde(default)]
    pub binary_path: Option<String>,

    /// Facts exported as `FACTER_<name>`
    #[serde(default)]
    pub facter: BTreeMap<String, String>,

    /// Extra environment variables for the puppet run
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,

    /// Extra flags passed to `puppet apply`
    #[serde(default)]
    pub options: Vec<String>,

    /// Guest directory to run puppet from
    #[serde(default)]
    pub working_directory: Option<String>,

    /// Guest scratch directory for mount points and uploads
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    /// Synced-folder backend type; when unset folders are owned by root
    #[serde(default)]
    pub synced_folder_type: Option<String>,

    /// Extra synced-folder backend arguments
    #[serde(default)]
    pub synced_folder_args: Vec<String>,
}

fn default_manifest_file() -> String {
    DEFAULT_MANIFEST_FILE.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_temp_dir() -> String {
    DEFAULT_TEMP_DIR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifests_path: None,
            manifest_file: default_manifest_file(),
            environment_path: None,
            environment: default_environment(),
            module_path: Vec::new(),
            hiera_config_path: None,
            binary_path: None,
            facter: BTreeMap::new(),
            environment_variables: BTreeMap::new(),
            options: Vec::new(),
            working_directory: None,
            temp_dir: default_temp_dir(),
            synced_folder_type: None,
            synced_folder_args: Vec::new(),
        }
    }
}

/// Provisioning mode selected by a [`Config`], with its unresolved directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode<'a> {
    Manifest { path: TaggedPath, file: &'a str },
    Environment { path: &'a TaggedPath, name: &'a str },
}

impl Config {
    /// Select the provisioning mode. `environment_path` wins over `manifests_path`.
    pub fn mode(&self) -> Mode<'_> {
        if let Some(path) = &self.environment_path {
            return Mode::Environment {
                path,
                name: &self.environment,
            };
        }

        let path = self
            .manifests_path
            .clone()
            .unwrap_or_else(|| TaggedPath::Host(DEFAULT_MANIFESTS_DIR.to_string()));
        Mode::Manifest {
            path,
            file: &self.manifest_file,
        }
    }

    pub fn is_environment_mode(&self) -> bool {
        self.environment_path.is_some()
    }

    /// Validate the configuration against the host filesystem.
    ///
    /// Returns one message per problem; an empty list means the config is usable.
    pub fn validate(&self, root: &Path) -> Vec<String> {
        let mut errors = Vec::new();

        if self.manifests_path.is_some() && self.environment_path.is_some() {
            errors.push(
                "manifests_path and environment_path are both set; environment mode will be used"
                    .to_string(),
            );
        }

        match self.mode() {
            Mode::Manifest { path, file } => {
                if file.trim().is_empty() {
                    errors.push("manifest_file cannot be empty".to_string());
                }
                if let TaggedPath::Host(dir) = &path {
                    let expanded = expand_host_path(root, dir);
                    if !expanded.is_dir() {
                        errors.push(format!(
                            "manifests_path does not exist on the host: {}",
                            expanded.display()
                        ));
                    } else if !file.trim().is_empty() && !expanded.join(file).is_file() {
                        errors.push(format!(
                            "manifest_file does not exist on the host: {}",
                            expanded.join(file).display()
                        ));
                    }
                }
            }
            Mode::Environment { path, name } => {
                if name.trim().is_empty() {
                    errors.push("environment cannot be empty".to_string());
                }
                if let TaggedPath::Host(dir) = path {
                    let expanded = expand_host_path(root, dir);
                    if !expanded.is_dir() {
                        errors.push(format!(
                            "environment_path does not exist on the host: {}",
                            expanded.display()
                        ));
                    }
                }
            }
        }

        for module in &self.module_path {
            let expanded = expand_host_path(root, module);
            if !expanded.is_dir() {
                errors.push(format!(
                    "module_path entry does not exist on the host: {}",
                    expanded.display()
                ));
            }
        }

        if let Some(hiera) = &self.hiera_config_path {
            let expanded = expand_host_path(root, hiera);
            if !expanded.is_file() {
                errors.push(format!(
                    "hiera_config_path does not exist on the host: {}",
                    expanded.display()
                ));
            }
        }

        if self.temp_dir.trim().is_empty() {
            errors.push("temp_dir cannot be empty".to_string());
        }

        errors
    }
}

/// Expand `~` and environment variables, then anchor relative paths at `root`.
pub fn expand_host_path(root: &Path, path: &str) -> PathBuf {
    let expanded = shellexpand::full(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| shellexpand::tilde(path).into_owned());
    let expanded = PathBuf::from(expanded);
    if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    }
}
