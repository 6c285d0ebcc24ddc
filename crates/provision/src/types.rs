//! Core types for the provisioning pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A path that lives either on the host or on the guest.
///
/// Written in TOML as `{ host = "manifests" }` or
/// `{ guest = "/etc/puppet/manifests" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaggedPath {
    /// Path on the host, shared into the guest through a synced folder
    Host(String),
    /// Path already present on the guest
    Guest(String),
}

impl TaggedPath {
    /// The raw path string, whichever side it lives on
    pub fn path(&self) -> &str {
        match self {
            Self::Host(p) | Self::Guest(p) => p,
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

impl fmt::Display for TaggedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(p) => write!(f, "host:{p}"),
            Self::Guest(p) => write!(f, "guest:{p}"),
        }
    }
}

/// What a shared directory holds; used as the mount point prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Manifests,
    Environments,
    Modules,
}

impl PathKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifests => "manifests",
            Self::Environments => "environments",
            Self::Modules => "modules",
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shell family of the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// sh-compatible shell, `:`-separated path lists
    #[default]
    Posix,
    /// PowerShell, `;`-separated path lists
    Windows,
}

impl Platform {
    /// Separator between entries of a module path list
    pub fn path_list_separator(&self) -> &'static str {
        match self {
            Self::Posix => ":",
            Self::Windows => ";",
        }
    }

    /// Module directory Puppet always searches on this platform
    pub fn default_module_path(&self) -> &'static str {
        match self {
            Self::Posix => "/etc/puppet/modules",
            Self::Windows => "/ProgramData/PuppetLabs/puppet/etc/modules",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => f.write_str("posix"),
            Self::Windows => f.write_str("windows"),
        }
    }
}

/// Provisioning mode with its guest-side directory resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ResolvedMode {
    /// A single manifest file inside a manifests directory
    Manifest { dir: String, file: String },
    /// A named environment inside an environments directory
    Environment { dir: String, name: String },
}

/// A host module directory and the guest directory it is mounted at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModulePathMapping {
    pub host_path: String,
    pub guest_path: String,
}

/// Mount options handed to the synced-folder backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncedFolderOptions {
    /// Owner of the mounted files; only set when no backend type is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Synced-folder backend type, carried through unmodified
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub folder_type: Option<String>,
    /// Extra backend arguments
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// One directory the VM layer must share into the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncedFolder {
    pub host_path: String,
    pub guest_path: String,
    pub options: SyncedFolderOptions,
}

/// Everything derived from a [`Config`](crate::Config) before talking to the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPlan {
    pub mode: ResolvedMode,
    /// Guest path the hiera config is uploaded to, when one is configured
    pub hiera_guest_path: Option<String>,
    pub module_paths: Vec<ModulePathMapping>,
    pub synced_folders: Vec<SyncedFolder>,
    /// Guest directories that must exist before the applier runs, in check order
    pub verify: Vec<String>,
}

/// Where the applier binary was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySource {
    /// Resolvable through the guest's command search path
    SearchPath,
    /// Found under the well-known install prefix
    Fallback,
}

/// The applier binary as located on the guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinary {
    pub name: String,
    /// Install prefix to invoke the binary from, if not relying on the search path
    pub prefix: Option<String>,
    pub source: BinarySource,
}

impl ResolvedBinary {
    /// A binary invoked through the configured prefix (or the search path when none is set)
    pub fn configured(name: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            name: name.into(),
            prefix,
            source: BinarySource::SearchPath,
        }
    }

    /// Command-line token that invokes the binary
    pub fn invocation(&self) -> String {
        match &self.prefix {
            Some(prefix) => join_guest(prefix, &self.name),
            None => self.name.clone(),
        }
    }
}

/// How the executor runs a command and judges its exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub elevated: bool,
    /// Exit codes treated as success
    pub good_exit: BTreeSet<i32>,
    /// Report failures without repeating the command
    pub muted: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            elevated: true,
            good_exit: BTreeSet::from([0]),
            muted: false,
        }
    }
}

impl RunOptions {
    /// Options for a `puppet apply --detailed-exitcodes` run: 0 and 2 are success
    pub fn applier() -> Self {
        Self {
            elevated: true,
            good_exit: BTreeSet::from([0, 2]),
            muted: true,
        }
    }
}

/// Join a guest path and a child name with a single `/`.
pub fn join_guest(base: &str, child: &str) -> String {
    let base = base.trim_end_matches(['/', '\\']);
    let child = child.trim_start_matches(['/', '\\']);
    if base.is_empty() {
        format!("/{child}")
    } else {
        format!("{base}/{child}")
    }
}
