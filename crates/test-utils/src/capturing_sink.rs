use std::sync::Mutex;

use cronbackup::exec::{OutputSink, OutputStream};

/// An `OutputSink` that keeps every line in memory.
#[derive(Debug, Default)]
pub struct CapturingSink {
    lines: Mutex<Vec<(OutputStream, String)>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(OutputStream, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn stdout(&self) -> Vec<String> {
        self.of(OutputStream::Stdout)
    }

    pub fn stderr(&self) -> Vec<String> {
        self.of(OutputStream::Stderr)
    }

    fn of(&self, stream: OutputStream) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl OutputSink for CapturingSink {
    fn line(&self, stream: OutputStream, line: &str) {
        self.lines.lock().unwrap().push((stream, line.to_string()));
    }
}
