//! Error types for the provisioning pipeline.
//!
//! Every error here is fatal to the provisioning sequence. Nothing in this
//! crate retries; an outer caller may rerun the whole sequence.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of a provision an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A guest precondition does not hold (missing shared folder).
    Precondition,
    /// The applier could not be set up (binary not found).
    Setup,
    /// The applier ran and failed.
    Execution,
    /// The remote transport failed or was interrupted.
    Transport,
    /// The project configuration is unusable.
    Config,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Precondition => "Guest precondition failed",
            Self::Setup => "Provisioner setup failed",
            Self::Execution => "Puppet run failed",
            Self::Transport => "Guest communication failed",
            Self::Config => "Invalid configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Precondition => "Make sure the synced folders are mounted on the guest, or rerun with --sync",
            Self::Setup => "Install Puppet on the guest, or set binary_path in the project file",
            Self::Execution => "Check the Puppet output above for the failing resource",
            Self::Transport => "Check that the guest is running and reachable",
            Self::Config => "Run `guestprov validate` to list configuration problems",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while provisioning a guest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A shared folder expected on the guest is not there.
    #[error(
        "the synced folder {path} was not found on the guest. Puppet cannot run without its manifests and modules being shared"
    )]
    MissingSharedFolder {
        /// Guest path that failed the existence test.
        path: String,
    },

    /// The applier binary is neither on the search path nor under the fallback prefix.
    #[error(
        "the `{binary}` binary appears not to be installed on the guest (also checked {prefix}/{binary})"
    )]
    BinaryNotDetected {
        /// Name of the binary that was probed.
        binary: String,
        /// Fallback install prefix that was probed last.
        prefix: String,
    },

    /// The applier exited with a code outside the accepted set.
    #[error("{}", bad_exit_message(*.exit_code, *.muted, .command))]
    BadExitStatus {
        /// Exit code reported by the guest.
        exit_code: i32,
        /// Whether the output was already streamed to the user.
        muted: bool,
        /// Command that was run.
        command: String,
    },

    /// A helper command on the guest (mkdir, chmod, ...) failed.
    #[error("guest command `{command}` failed with exit code {exit_code}")]
    CommandFailed {
        /// Command that was run.
        command: String,
        /// Exit code reported by the guest.
        exit_code: i32,
    },

    /// The remote command ended without an exit code.
    #[error("guest command `{command}` was interrupted before it finished")]
    Interrupted {
        /// Command that was run.
        command: String,
    },

    /// The transport itself failed (connection, spawn, protocol).
    #[error("transport error: {0}")]
    Transport(String),

    /// IO error with path context.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The configuration cannot be resolved into a plan.
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn bad_exit_message(exit_code: i32, muted: bool, command: &str) -> String {
    if muted {
        format!(
            "the guest command responded with a non-zero exit status ({exit_code}). The output for this command should be in the log above"
        )
    } else {
        format!(
            "the following guest command responded with a non-zero exit status ({exit_code}):\n\n{command}"
        )
    }
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Get the stage this error belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingSharedFolder { .. } => ErrorCategory::Precondition,
            Error::BinaryNotDetected { .. } => ErrorCategory::Setup,
            Error::BadExitStatus { .. } => ErrorCategory::Execution,
            Error::CommandFailed { .. }
            | Error::Interrupted { .. }
            | Error::Transport(_)
            | Error::Io { .. } => ErrorCategory::Transport,
            Error::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether this error reports an unmet guest precondition or setup step.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Precondition | ErrorCategory::Setup
        )
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_shared_folder_display() {
        let err = Error::MissingSharedFolder {
            path: "/tmp/guestprov-puppet/modules-abc".to_string(),
        };
        assert!(err.to_string().contains("/tmp/guestprov-puppet/modules-abc"));
        assert_eq!(err.category(), ErrorCategory::Precondition);
        assert!(err.is_precondition());
    }

    #[test]
    fn test_binary_not_detected_display() {
        let err = Error::BinaryNotDetected {
            binary: "puppet".to_string(),
            prefix: "/opt/puppetlabs/bin".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("`puppet`"));
        assert!(display.contains("/opt/puppetlabs/bin/puppet"));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_bad_exit_status_muted_hides_command() {
        let err = Error::BadExitStatus {
            exit_code: 1,
            muted: true,
            command: "puppet apply site.pp".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("(1)"));
        assert!(!display.contains("puppet apply"));
        assert_eq!(err.category(), ErrorCategory::Execution);
    }

    #[test]
    fn test_bad_exit_status_unmuted_shows_command() {
        let err = Error::BadExitStatus {
            exit_code: 4,
            muted: false,
            command: "puppet apply site.pp".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("(4)"));
        assert!(display.contains("puppet apply site.pp"));
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_transport_errors_share_category() {
        let interrupted = Error::Interrupted {
            command: "true".to_string(),
        };
        let failed = Error::CommandFailed {
            command: "mkdir -p /tmp/x".to_string(),
            exit_code: 1,
        };
        assert_eq!(interrupted.category(), ErrorCategory::Transport);
        assert_eq!(failed.category(), ErrorCategory::Transport);
        assert_eq!(Error::transport("eof").category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err: Error = io_err.into();
        match err {
            Error::Io { path, .. } => assert_eq!(path, PathBuf::new()),
            _ => panic!("Expected Error::Io"),
        }
    }

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Precondition.advice().is_empty());
        assert!(ErrorCategory::Config.to_string().contains("configuration"));
    }
}
