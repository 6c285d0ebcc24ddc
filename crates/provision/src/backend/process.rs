//! Line-streaming wrapper around a spawned host process.

use std::io::{BufRead, BufReader, Lines};
use std::process::{Child, ChildStdout, Command, Stdio};

use super::RemoteProcess;
use crate::error::{Error, Result};

/// A spawned process whose stdout is read line by line.
///
/// stderr is inherited so transport diagnostics reach the terminal directly.
pub(crate) struct ChildProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

impl ChildProcess {
    pub(crate) fn spawn(mut cmd: Command, program: &str) -> Result<Self> {
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::transport(format!("failed to execute {program}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::transport(format!("no stdout pipe for {program}")))?;

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
        })
    }
}

impl Iterator for ChildProcess {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next().map(|line| line.map_err(Error::from))
    }
}

impl RemoteProcess for ChildProcess {
    fn wait(mut self: Box<Self>) -> Result<Option<i32>> {
        // Drain whatever the caller left unread so the child never blocks on a full pipe
        for line in self.lines.by_ref().map_while(std::result::Result::ok) {
            log::trace!("{}", line);
        }

        let status = self.child.wait()?;
        Ok(status.code())
    }
}

/// Run a command to completion with all output discarded, returning its exit code.
pub(crate) fn status_quiet(mut cmd: Command, program: &str) -> Result<Option<i32>> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| Error::transport(format!("failed to execute {program}: {e}")))?;
    Ok(status.code())
}
