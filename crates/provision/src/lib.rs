//! # provision
//!
//! Provision a guest machine with `puppet apply`.
//!
//! This crate provides functionality for:
//! - Mapping host manifests, environments and module directories to stable guest paths
//! - Planning the synced folders the VM layer has to share into the guest
//! - Verifying the shared folders and locating the `puppet` binary on the guest
//! - Building the `puppet apply` command for sh or PowerShell guests
//! - Running it and streaming its output, with Puppet's detailed exit codes
//!
//! ## Example
//!
//! ```
//! use provision::backend::{MockCommunicator, MockRun};
//! use provision::{Config, Platform, Provisioner, TaggedPath};
//!
//! let config = Config {
//!     manifests_path: Some(TaggedPath::Guest("/etc/puppet/manifests".into())),
//!     manifest_file: "site.pp".into(),
//!     ..Default::default()
//! };
//!
//! let mut folders = Vec::new();
//! let provisioner = Provisioner::configure(config, "/projects/web", Platform::Posix, &mut folders);
//! assert!(folders.is_empty());
//!
//! let guest = MockCommunicator::new();
//! guest.on_command("puppet apply", MockRun::lines(2, ["Notice: Applied catalog"]));
//!
//! let mut output: Vec<String> = Vec::new();
//! provisioner.provision(&guest, &mut output).unwrap();
//! assert_eq!(output.last().map(String::as_str), Some("Notice: Applied catalog"));
//! ```
//!
//! ## Guest paths
//!
//! | Source                | Guest path                            |
//! |-----------------------|---------------------------------------|
//! | `{ guest = "/p" }`    | `/p`                                  |
//! | `{ host = "m" }`      | `<temp_dir>/manifests-<hash of "m">`  |
//! | module path `"mods"`  | `<temp_dir>/modules-<hash of "mods">` |

pub mod backend;
pub mod capability;
pub mod command;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod executor;
pub mod locator;
pub mod paths;
pub mod planner;
pub mod provisioner;
pub mod shell;
pub mod types;
pub mod verify;

pub use backend::{Communicator, RemoteProcess};
pub use capability::{CapabilityRegistry, GuestHook};
pub use command::ApplyCommand;
pub use config::Config;
pub use context::ProgressSink;
pub use error::{Error, ErrorCategory, Result};
pub use planner::FolderRegistry;
pub use provisioner::Provisioner;
pub use types::{
    BinarySource, ModulePathMapping, PathKind, Platform, ResolvedBinary, ResolvedMode,
    ResolvedPlan, RunOptions, SyncedFolder, SyncedFolderOptions, TaggedPath,
};
