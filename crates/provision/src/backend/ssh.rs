//! SSH backend using the system `ssh` and `scp` clients.
//!
//! Key handling, known hosts and multiplexing are left to the user's ssh
//! configuration; this backend only adds batch mode and the target options.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::process::{ChildProcess, status_quiet};
use super::{Communicator, RemoteProcess, sh_quote};
use crate::capability::GuestHook;
use crate::error::{Error, Result};
use crate::shell::powershell_invocation;
use crate::types::Platform;

/// Exit code `ssh` reports for its own failures (connection, auth)
const SSH_TRANSPORT_EXIT: i32 = 255;

/// How many times to poll a rebooting guest before giving up
const REBOOT_POLL_ATTEMPTS: u32 = 60;

/// Delay between reboot polls
const REBOOT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Where to reach the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshTarget {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    /// Extra `-o` options, e.g. `StrictHostKeyChecking=no`
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_port() -> u16 {
    22
}

impl SshTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            user: None,
            identity_file: None,
            options: Vec::new(),
        }
    }

    /// `user@host` or just `host`
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Options shared by `ssh` and `scp`; only the port flag differs between them.
    fn common_args(&self, port_flag: &str) -> Vec<String> {
        let mut args = vec![
            port_flag.to_string(),
            self.port.to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
        ];
        if let Some(identity) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        for option in &self.options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args
    }
}

/// Communicator that runs every guest operation through `ssh`.
#[derive(Debug, Clone)]
pub struct SshCommunicator {
    target: SshTarget,
    platform: Platform,
    use_sudo: bool,
}

impl SshCommunicator {
    pub fn new(target: SshTarget, platform: Platform, use_sudo: bool) -> Self {
        Self {
            target,
            platform,
            use_sudo,
        }
    }

    /// Remote command line, wrapped in `sudo` when elevation is requested.
    ///
    /// Windows guests get every command as a PowerShell script. They have no
    /// sudo; elevation there is the login's own rights.
    pub fn remote_command(&self, command: &str, elevated: bool) -> String {
        if self.platform.is_windows() {
            powershell_invocation(command)
        } else if elevated && self.use_sudo {
            format!("sudo -E -H sh -c {}", sh_quote(command))
        } else {
            command.to_string()
        }
    }

    fn ssh(&self, remote: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(self.target.common_args("-p"))
            .arg(self.target.destination())
            .arg("--")
            .arg(remote);
        cmd
    }

    fn reachable(&self) -> bool {
        matches!(status_quiet(self.ssh("exit 0"), "ssh"), Ok(Some(0)))
    }
}

impl Communicator for SshCommunicator {
    fn test(&self, condition: &str, elevated: bool) -> Result<bool> {
        let remote = self.remote_command(condition, elevated);
        log::debug!("ssh test: {}", remote);
        match status_quiet(self.ssh(&remote), "ssh")? {
            Some(0) => Ok(true),
            Some(SSH_TRANSPORT_EXIT) => Err(Error::transport(format!(
                "ssh to {} failed while testing `{}`",
                self.target.destination(),
                condition
            ))),
            Some(_) => Ok(false),
            None => Err(Error::Interrupted {
                command: condition.to_string(),
            }),
        }
    }

    fn execute(&self, command: &str, elevated: bool) -> Result<Box<dyn RemoteProcess + '_>> {
        let remote = self.remote_command(command, elevated);
        log::debug!("ssh execute: {}", remote);
        Ok(Box::new(ChildProcess::spawn(self.ssh(&remote), "ssh")?))
    }

    fn upload(&self, local: &Path, guest: &str) -> Result<()> {
        log::debug!("scp {} -> {}", local.display(), guest);
        let mut cmd = Command::new("scp");
        cmd.args(self.target.common_args("-P"))
            .arg("-r")
            .arg(local)
            .arg(format!("{}:{}", self.target.destination(), guest));

        match status_quiet(cmd, "scp")? {
            Some(0) => Ok(()),
            code => Err(Error::transport(format!(
                "scp of {} to {} failed (exit {})",
                local.display(),
                guest,
                code.map_or_else(|| "signal".to_string(), |c| c.to_string())
            ))),
        }
    }

    fn invoke_hook(&self, hook: GuestHook) -> Result<()> {
        match hook {
            GuestHook::WaitForReboot => {
                for attempt in 1..=REBOOT_POLL_ATTEMPTS {
                    if self.reachable() {
                        return Ok(());
                    }
                    log::info!(
                        "Waiting for {} to finish rebooting ({}/{})",
                        self.target.host,
                        attempt,
                        REBOOT_POLL_ATTEMPTS
                    );
                    thread::sleep(REBOOT_POLL_INTERVAL);
                }
                Err(Error::transport(format!(
                    "{} did not come back after a reboot",
                    self.target.host
                )))
            }
        }
    }
}
