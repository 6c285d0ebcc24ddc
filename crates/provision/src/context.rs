//! Progress reporting
//!
//! The pipeline reports human-readable lines through [`ProgressSink`] so it
//! carries no dependency on a particular terminal UI.

/// Receiver for progress lines and streamed applier output.
pub trait ProgressSink {
    fn info(&mut self, message: &str);
}

impl ProgressSink for Vec<String> {
    fn info(&mut self, message: &str) {
        self.push(message.to_string());
    }
}
