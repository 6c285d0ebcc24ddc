use anyhow::{Context, Result, bail};
use provision::backend::{LocalCommunicator, SshCommunicator, SshTarget};
use provision::{Communicator, Config, Platform};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default project file name, looked up in the current directory
pub const PROJECT_FILE: &str = "guestprov.toml";

/// Contents of `guestprov.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    #[serde(default)]
    pub provision: Config,

    #[serde(default)]
    pub guest: GuestConfig,
}

/// How to reach the guest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Local,
}

/// The `[guest]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuestConfig {
    #[serde(default)]
    pub transport: Transport,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: Option<String>,

    /// Private key for ssh, `~` is expanded
    #[serde(default)]
    pub identity_file: Option<String>,

    #[serde(default)]
    pub platform: Platform,

    /// Elevate commands with sudo (POSIX guests only)
    #[serde(default = "default_use_sudo")]
    pub use_sudo: bool,

    /// Extra ssh `-o` options
    #[serde(default)]
    pub ssh_options: Vec<String>,
}

fn default_port() -> u16 {
    22
}

fn default_use_sudo() -> bool {
    true
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: None,
            port: default_port(),
            user: None,
            identity_file: None,
            platform: Platform::default(),
            use_sudo: default_use_sudo(),
            ssh_options: Vec::new(),
        }
    }
}

impl GuestConfig {
    /// Problems that keep us from connecting to the guest.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.transport == Transport::Ssh
            && self.host.as_deref().is_none_or(|h| h.trim().is_empty())
        {
            errors.push("guest.host is required for the ssh transport".to_string());
        }
        if self.transport == Transport::Local && self.platform.is_windows() {
            errors.push("the local transport only supports posix guests".to_string());
        }
        errors
    }

    /// Expanded identity file path
    pub fn identity_path(&self) -> Option<PathBuf> {
        self.identity_file.as_deref().map(|path| {
            let home = || dirs::home_dir().map(|h| h.display().to_string());
            PathBuf::from(shellexpand::tilde_with_context(path, home).as_ref())
        })
    }

    /// Display name of the guest for messages
    pub fn describe(&self) -> String {
        match self.transport {
            Transport::Local => "localhost".to_string(),
            Transport::Ssh => self.host.clone().unwrap_or_else(|| "?".to_string()),
        }
    }

    /// Build the communicator for this guest.
    pub fn communicator(&self) -> Result<Box<dyn Communicator>> {
        match self.transport {
            Transport::Local => Ok(Box::new(LocalCommunicator::new(self.use_sudo))),
            Transport::Ssh => {
                let Some(host) = self.host.as_deref().filter(|h| !h.trim().is_empty()) else {
                    bail!("guest.host is required for the ssh transport");
                };
                let target = SshTarget {
                    host: host.to_string(),
                    port: self.port,
                    user: self.user.clone(),
                    identity_file: self.identity_path(),
                    options: self.ssh_options.clone(),
                };
                Ok(Box::new(SshCommunicator::new(
                    target,
                    self.platform,
                    self.use_sudo,
                )))
            }
        }
    }
}

/// A loaded project: its settings and the directory relative host paths are anchored at
#[derive(Debug)]
pub struct Project {
    pub file: ProjectFile,
    pub root: PathBuf,
}

impl Project {
    /// Load a project file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read project file: {}", path.display()))?;
        let file: ProjectFile = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;

        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().context("Could not determine current directory")?,
        };
        log::debug!("Loaded {} (root {})", path.display(), root.display());

        Ok(Self { file, root })
    }

    pub fn config(&self) -> &Config {
        &self.file.provision
    }

    pub fn guest(&self) -> &GuestConfig {
        &self.file.guest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provision::TaggedPath;
    use tempfile::TempDir;

    fn write_project(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join(PROJECT_FILE);
        fs::write(&path, content).expect("write project file");
        (dir, path)
    }

    #[test]
    fn test_load_full_project() {
        let (dir, path) = write_project(
            r#"
[provision]
manifests_path = { host = "manifests" }
manifest_file = "site.pp"
module_path = ["modules", "vendor/modules"]
hiera_config_path = "hiera.yaml"
options = ["--verbose"]

[provision.facter]
role = "web"

[guest]
host = "192.168.56.10"
user = "vagrant"
identity_file = "~/.ssh/id_ed25519"
ssh_options = ["StrictHostKeyChecking=no"]
"#,
        );

        let project = Project::load(&path).expect("load project");
        assert_eq!(project.root, dir.path());

        let config = project.config();
        assert_eq!(
            config.manifests_path,
            Some(TaggedPath::Host("manifests".to_string()))
        );
        assert_eq!(config.manifest_file, "site.pp");
        assert_eq!(config.module_path.len(), 2);
        assert_eq!(config.facter.get("role").map(String::as_str), Some("web"));

        let guest = project.guest();
        assert_eq!(guest.transport, Transport::Ssh);
        assert_eq!(guest.port, 22);
        assert!(guest.use_sudo);
        assert_eq!(guest.platform, Platform::Posix);
        assert!(guest.validate().is_empty());
    }

    #[test]
    fn test_load_defaults() {
        let (_dir, path) = write_project("[guest]\ntransport = \"local\"\n");
        let project = Project::load(&path).expect("load project");

        assert!(!project.config().is_environment_mode());
        assert_eq!(project.config().manifest_file, "default.pp");
        assert_eq!(project.guest().transport, Transport::Local);
        assert_eq!(project.guest().describe(), "localhost");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let (_dir, path) = write_project("[guest]\nhostname = \"vm\"\n");
        let err = Project::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid TOML"));
    }

    #[test]
    fn test_missing_file() {
        let err = Project::load(Path::new("/nonexistent/guestprov.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read project file"));
    }

    #[test]
    fn test_ssh_requires_host() {
        let guest = GuestConfig::default();
        assert_eq!(
            guest.validate(),
            vec!["guest.host is required for the ssh transport"]
        );
        assert!(guest.communicator().is_err());
    }

    #[test]
    fn test_local_windows_rejected() {
        let guest = GuestConfig {
            transport: Transport::Local,
            platform: Platform::Windows,
            ..Default::default()
        };
        assert_eq!(guest.validate().len(), 1);
    }

    #[test]
    fn test_identity_path_expands_tilde() {
        let guest = GuestConfig {
            identity_file: Some("~/.ssh/id_ed25519".to_string()),
            ..Default::default()
        };
        let path = guest.identity_path().expect("identity path");
        assert!(path.ends_with(".ssh/id_ed25519"));
        if let Some(home) = dirs::home_dir() {
            assert!(path.starts_with(home));
        }
    }
}
