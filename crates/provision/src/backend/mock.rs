//! In-memory communicator for tests.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Communicator, RemoteProcess};
use crate::capability::GuestHook;
use crate::error::{Error, Result};

/// One interaction with the mock guest, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Test { condition: String, elevated: bool },
    Execute { command: String, elevated: bool },
    Upload { local: PathBuf, guest: String },
    Hook(GuestHook),
}

/// Scripted result of a command run on the mock guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRun {
    pub lines: Vec<String>,
    /// `None` simulates an interrupted command
    pub exit_code: Option<i32>,
}

impl MockRun {
    pub fn exit(code: i32) -> Self {
        Self {
            lines: Vec::new(),
            exit_code: Some(code),
        }
    }

    pub fn lines<I, S>(code: i32, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            exit_code: Some(code),
        }
    }

    pub fn interrupted() -> Self {
        Self {
            lines: Vec::new(),
            exit_code: None,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<Call>,
    tests: HashMap<String, bool>,
    commands: Vec<(String, MockRun)>,
    upload_error: Option<String>,
}

/// Mock guest that records every call and replays scripted results.
///
/// Unscripted test conditions succeed and unscripted commands exit 0 with no
/// output.
#[derive(Debug, Clone, Default)]
pub struct MockCommunicator {
    state: Arc<Mutex<MockState>>,
}

impl MockCommunicator {
    /// Create a mock guest where everything succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Script the result of a test condition (exact match).
    pub fn set_test(&self, condition: impl Into<String>, result: bool) {
        self.state().tests.insert(condition.into(), result);
    }

    /// Script the result of every command containing `pattern`. Earlier scripts win.
    pub fn on_command(&self, pattern: impl Into<String>, run: MockRun) {
        self.state().commands.push((pattern.into(), run));
    }

    /// Make every upload fail with a transport error.
    pub fn fail_uploads(&self, message: impl Into<String>) {
        self.state().upload_error = Some(message.into());
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Conditions passed to `test`, in order.
    pub fn tested(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Test { condition, .. } => Some(condition),
                _ => None,
            })
            .collect()
    }

    /// Commands passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }
}

impl Communicator for MockCommunicator {
    fn test(&self, condition: &str, elevated: bool) -> Result<bool> {
        let mut state = self.state();
        state.calls.push(Call::Test {
            condition: condition.to_string(),
            elevated,
        });
        Ok(state.tests.get(condition).copied().unwrap_or(true))
    }

    fn execute(&self, command: &str, elevated: bool) -> Result<Box<dyn RemoteProcess + '_>> {
        let mut state = self.state();
        state.calls.push(Call::Execute {
            command: command.to_string(),
            elevated,
        });
        let run = state
            .commands
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, run)| run.clone())
            .unwrap_or_else(|| MockRun::exit(0));

        Ok(Box::new(MockProcess {
            lines: run.lines.into(),
            exit_code: run.exit_code,
        }))
    }

    fn upload(&self, local: &Path, guest: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::Upload {
            local: local.to_path_buf(),
            guest: guest.to_string(),
        });
        match &state.upload_error {
            Some(message) => Err(Error::transport(message.clone())),
            None => Ok(()),
        }
    }

    fn invoke_hook(&self, hook: GuestHook) -> Result<()> {
        self.state().calls.push(Call::Hook(hook));
        Ok(())
    }
}

struct MockProcess {
    lines: VecDeque<String>,
    exit_code: Option<i32>,
}

impl Iterator for MockProcess {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.pop_front().map(Ok)
    }
}

impl RemoteProcess for MockProcess {
    fn wait(self: Box<Self>) -> Result<Option<i32>> {
        Ok(self.exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_defaults_succeed() {
        let mock = MockCommunicator::new();
        assert!(mock.test("test -d /anything", true).unwrap());

        let mut process = mock.execute("true", false).unwrap();
        assert!(process.next().is_none());
        assert_eq!(process.wait().unwrap(), Some(0));
    }

    #[test]
    fn test_mock_scripted_test() {
        let mock = MockCommunicator::new();
        mock.set_test("test -d /missing", false);

        assert!(!mock.test("test -d /missing", true).unwrap());
        assert!(mock.test("test -d /present", true).unwrap());
        assert_eq!(mock.tested(), vec!["test -d /missing", "test -d /present"]);
    }

    #[test]
    fn test_mock_first_matching_script_wins() {
        let mock = MockCommunicator::new();
        mock.on_command("apply", MockRun::exit(2));
        mock.on_command("puppet", MockRun::exit(1));

        let process = mock.execute("puppet apply site.pp", true).unwrap();
        assert_eq!(process.wait().unwrap(), Some(2));
    }

    #[test]
    fn test_mock_records_uploads() {
        let mock = MockCommunicator::new();
        mock.upload(Path::new("/host/hiera.yaml"), "/tmp/x/hiera.yaml")
            .unwrap();

        mock.fail_uploads("connection reset");
        assert!(mock.upload(Path::new("/host/a"), "/tmp/a").is_err());

        assert_eq!(mock.calls().len(), 2);
        assert_eq!(
            mock.calls()[0],
            Call::Upload {
                local: PathBuf::from("/host/hiera.yaml"),
                guest: "/tmp/x/hiera.yaml".to_string(),
            }
        );
    }
}
