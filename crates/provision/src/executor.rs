//! Guest-side execution: scratch directory, hiera upload, applier run

use std::path::Path;

use crate::backend::Communicator;
use crate::context::ProgressSink;
use crate::error::{Error, Result};
use crate::shell;
use crate::types::{Platform, RunOptions};

/// Create the scratch directory and open it up for every guest user.
pub fn prepare(comm: &dyn Communicator, temp_dir: &str, platform: Platform) -> Result<()> {
    log::debug!("Preparing scratch directory {}", temp_dir);
    comm.sudo(&shell::make_directory(platform, temp_dir))?;
    match shell::open_permissions(platform, temp_dir) {
        Some(command) => comm.sudo(&command),
        None => Ok(()),
    }
}

/// Upload the hiera config to its guest path.
pub fn upload_hiera(comm: &dyn Communicator, local: &Path, guest: &str) -> Result<()> {
    log::info!("Uploading hiera configuration {} -> {}", local.display(), guest);
    comm.upload(local, guest)
}

/// Run `command` and stream its output to `sink`.
///
/// Lines are forwarded in arrival order with trailing whitespace removed;
/// blank lines are dropped. The exit code must be one of
/// `options.good_exit`.
pub fn run(
    comm: &dyn Communicator,
    command: &str,
    options: &RunOptions,
    sink: &mut dyn ProgressSink,
) -> Result<()> {
    log::debug!("Executing: {}", command);
    let mut process = comm.execute(command, options.elevated)?;

    for line in process.by_ref() {
        let line = line?;
        let line = line.trim_end();
        if !line.is_empty() {
            sink.info(line);
        }
    }

    match process.wait()? {
        Some(code) if options.good_exit.contains(&code) => {
            log::debug!("Command finished with exit code {}", code);
            Ok(())
        }
        Some(exit_code) => Err(Error::BadExitStatus {
            exit_code,
            muted: options.muted,
            command: command.to_string(),
        }),
        None => Err(Error::Interrupted {
            command: command.to_string(),
        }),
    }
}
