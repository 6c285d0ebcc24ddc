//! Local backend - the "guest" is the machine guestprov runs on.
//!
//! Useful for provisioning containers and CI hosts from the inside. Commands
//! run through `sh -c`, elevated ones through `sudo`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use super::process::{ChildProcess, status_quiet};
use super::{Communicator, RemoteProcess};
use crate::error::{Error, Result};

/// Communicator that runs commands on the current host.
#[derive(Debug, Clone)]
pub struct LocalCommunicator {
    use_sudo: bool,
}

impl LocalCommunicator {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    /// Build the `sh -c` invocation, prefixed with `sudo` when elevation is requested.
    pub fn shell(&self, command: &str, elevated: bool) -> Command {
        let mut cmd = if elevated && self.use_sudo {
            let mut sudo = Command::new("sudo");
            sudo.args(["-E", "sh", "-c", command]);
            sudo
        } else {
            let mut sh = Command::new("sh");
            sh.args(["-c", command]);
            sh
        };
        cmd.env("LC_ALL", "C");
        cmd
    }
}

impl Communicator for LocalCommunicator {
    fn test(&self, condition: &str, elevated: bool) -> Result<bool> {
        log::debug!("local test: {}", condition);
        match status_quiet(self.shell(condition, elevated), "sh")? {
            Some(code) => Ok(code == 0),
            None => Err(Error::Interrupted {
                command: condition.to_string(),
            }),
        }
    }

    fn execute(&self, command: &str, elevated: bool) -> Result<Box<dyn RemoteProcess + '_>> {
        log::debug!("local execute: {}", command);
        Ok(Box::new(ChildProcess::spawn(
            self.shell(command, elevated),
            "sh",
        )?))
    }

    fn upload(&self, local: &Path, guest: &str) -> Result<()> {
        copy_tree(local, Path::new(guest))
    }
}

/// Copy a file, or a directory recursively, to `dest`.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    log::debug!("copy {} -> {}", src.display(), dest.display());

    if src.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::copy(src, dest).map_err(|e| Error::io(src, e))?;
        return Ok(());
    }

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| Error::transport(format!("cannot read {}: {e}", src.display())))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::transport(e.to_string()))?;
        let target: PathBuf = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| Error::io(entry.path(), e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_without_sudo() {
        let local = LocalCommunicator::new(false);
        let cmd = local.shell("echo hi", true);
        assert_eq!(cmd.get_program(), "sh");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-c", "echo hi"]);
    }

    #[test]
    fn test_shell_with_sudo() {
        let local = LocalCommunicator::new(true);
        let cmd = local.shell("mkdir -p /tmp/x", true);
        assert_eq!(cmd.get_program(), "sudo");

        let unelevated = local.shell("true", false);
        assert_eq!(unelevated.get_program(), "sh");
    }

    #[cfg(unix)]
    #[test]
    fn test_local_test_and_execute() {
        let local = LocalCommunicator::new(false);
        assert!(local.test("true", false).unwrap());
        assert!(!local.test("false", false).unwrap());

        let mut process = local.execute("printf 'one\\ntwo\\n'; exit 2", false).unwrap();
        let lines: Vec<String> = process.by_ref().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(process.wait().unwrap(), Some(2));
    }

    #[test]
    fn test_copy_tree_directory() {
        let src = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(src.path().join("apache/manifests")).expect("mkdir");
        fs::write(src.path().join("apache/manifests/init.pp"), "class apache {}").expect("write");

        let dest = tempfile::tempdir().expect("tempdir");
        let target = dest.path().join("modules-abc");
        copy_tree(src.path(), &target).expect("copy should succeed");

        let copied = fs::read_to_string(target.join("apache/manifests/init.pp")).expect("read");
        assert_eq!(copied, "class apache {}");
    }

    #[test]
    fn test_copy_tree_file() {
        let src = tempfile::tempdir().expect("tempdir");
        let file = src.path().join("hiera.yaml");
        fs::write(&file, "version: 5").expect("write");

        let dest = tempfile::tempdir().expect("tempdir");
        let target = dest.path().join("scratch/hiera.yaml");
        copy_tree(&file, &target).expect("copy should succeed");
        assert_eq!(fs::read_to_string(target).expect("read"), "version: 5");
    }
}
