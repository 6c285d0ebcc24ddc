//! Guest communication backends.
//!
//! The [`Communicator`] trait is the only way the pipeline talks to a guest,
//! allowing for different transports:
//! - [`ssh::SshCommunicator`] shells out to the system `ssh`/`scp` clients
//! - [`local::LocalCommunicator`] runs commands on this host through `sh -c`
//! - [`mock::MockCommunicator`] records calls and replays scripted results
//!
//! # Testing
//!
//! ```
//! use provision::backend::{Communicator, MockCommunicator, MockRun};
//!
//! let mock = MockCommunicator::new();
//! mock.on_command("puppet apply", MockRun::lines(2, ["Notice: applied"]));
//!
//! assert!(mock.test("test -d /tmp", true).unwrap());
//! ```

pub mod local;
pub mod mock;
mod process;
pub mod ssh;

pub use local::LocalCommunicator;
pub use mock::{Call, MockCommunicator, MockRun};
pub use ssh::{SshCommunicator, SshTarget};

use std::path::Path;

use crate::capability::GuestHook;
use crate::error::{Error, Result};

/// A command running on the guest.
///
/// Iterating yields stdout lines in arrival order; [`RemoteProcess::wait`]
/// then collects the exit status.
pub trait RemoteProcess: Iterator<Item = Result<String>> {
    /// Wait for the command to end.
    ///
    /// Returns `None` when it ended without an exit code (killed or interrupted).
    fn wait(self: Box<Self>) -> Result<Option<i32>>;
}

/// Remote execution on a guest machine.
pub trait Communicator: Send + Sync {
    /// Evaluate a shell condition on the guest; true when it exits 0.
    fn test(&self, condition: &str, elevated: bool) -> Result<bool>;

    /// Start a command on the guest and stream its output.
    fn execute(&self, command: &str, elevated: bool) -> Result<Box<dyn RemoteProcess + '_>>;

    /// Copy a host file or directory to a guest path.
    fn upload(&self, local: &Path, guest: &str) -> Result<()>;

    /// Run a guest hook such as waiting for a reboot to finish.
    fn invoke_hook(&self, hook: GuestHook) -> Result<()> {
        log::debug!("No handler for guest hook {:?}, skipping", hook);
        Ok(())
    }

    /// Run an elevated command, failing unless it exits 0.
    fn sudo(&self, command: &str) -> Result<()> {
        self.sudo_capture(command).map(|_| ())
    }

    /// Run an elevated command and collect its output, failing unless it exits 0.
    fn sudo_capture(&self, command: &str) -> Result<String> {
        let mut process = self.execute(command, true)?;
        let mut output = String::new();
        for line in process.by_ref() {
            let line = line?;
            log::trace!("{}", line);
            output.push_str(&line);
            output.push('\n');
        }

        match process.wait()? {
            Some(0) => Ok(output),
            Some(exit_code) => Err(Error::CommandFailed {
                command: command.to_string(),
                exit_code,
            }),
            None => Err(Error::Interrupted {
                command: command.to_string(),
            }),
        }
    }
}

/// Quote a string for a POSIX shell, single-quote style.
pub fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sh_quote() {
        assert_eq!(sh_quote("plain"), "'plain'");
        assert_eq!(sh_quote("it's"), r"'it'\''s'");
        assert_eq!(sh_quote(""), "''");
    }

    #[test]
    fn test_sudo_fails_on_non_zero_exit() {
        let mock = MockCommunicator::new();
        mock.on_command("chmod", MockRun::exit(1));

        let err = mock.sudo("chmod 0777 /tmp/x").unwrap_err();
        match err {
            Error::CommandFailed { command, exit_code } => {
                assert_eq!(command, "chmod 0777 /tmp/x");
                assert_eq!(exit_code, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sudo_interrupted() {
        let mock = MockCommunicator::new();
        mock.on_command("sleep", MockRun::interrupted());

        assert!(matches!(
            mock.sudo("sleep 100"),
            Err(Error::Interrupted { .. })
        ));
    }

    #[test]
    fn test_sudo_capture_collects_lines() {
        let mock = MockCommunicator::new();
        mock.on_command("cat", MockRun::lines(0, ["a = 1", "b = 2"]));

        let output = mock.sudo_capture("cat /etc/x.conf").unwrap();
        assert_eq!(output, "a = 1\nb = 2\n");
        assert_eq!(
            mock.calls(),
            vec![Call::Execute {
                command: "cat /etc/x.conf".to_string(),
                elevated: true,
            }]
        );
    }
}
