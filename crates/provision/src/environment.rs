//! Environment metadata (`environment.conf`)
//!
//! `puppet apply` does not read the environment's `environment.conf` for us.
//! We read it for diagnostics only: its `modulepath` and `manifest` settings
//! are logged and do not change the resolved module paths.

use regex::Regex;
use std::sync::LazyLock;

use crate::backend::Communicator;
use crate::error::Result;
use crate::shell;
use crate::types::{Platform, join_guest};

static SETTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(modulepath|manifest)\s*=\s*(\S+)").expect("valid environment.conf regex")
});

/// Settings of interest found in an `environment.conf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentMetadata {
    pub modulepath: Option<String>,
    pub manifest: Option<String>,
}

impl EnvironmentMetadata {
    /// Parse the `modulepath` and `manifest` settings; the last occurrence wins.
    pub fn parse(content: &str) -> Self {
        let mut metadata = Self::default();
        for line in content.lines() {
            if let Some(caps) = SETTING.captures(line) {
                let value = caps[2].to_string();
                match &caps[1] {
                    "modulepath" => metadata.modulepath = Some(value),
                    _ => metadata.manifest = Some(value),
                }
            }
        }
        metadata
    }
}

/// Guest path of an environment's `environment.conf`.
pub fn metadata_path(environments_dir: &str, environment: &str) -> String {
    join_guest(&join_guest(environments_dir, environment), "environment.conf")
}

/// Read `environment.conf` from the guest if it exists and log what it sets.
pub fn read(
    comm: &dyn Communicator,
    environments_dir: &str,
    environment: &str,
    platform: Platform,
) -> Result<Option<EnvironmentMetadata>> {
    let path = metadata_path(environments_dir, environment);
    if !comm.test(&shell::path_exists(platform, &path), true)? {
        log::debug!("No environment.conf at {}", path);
        return Ok(None);
    }

    let content = comm.sudo_capture(&shell::read_file(platform, &path))?;
    let metadata = EnvironmentMetadata::parse(&content);
    if let Some(modulepath) = &metadata.modulepath {
        log::debug!("environment.conf modulepath: {}", modulepath);
    }
    if let Some(manifest) = &metadata.manifest {
        log::debug!("environment.conf manifest: {}", manifest);
    }
    Ok(Some(metadata))
}
