//! A recording logger so tests can assert what the engine and blocks
//! actually logged.

use parking_lot::{Mutex, RwLock};
use testforge_framework::TestCaseLogger;

/// Captures every call with a level prefix, in call order.
#[derive(Default)]
pub struct RecordingLogger {
    current: RwLock<Option<String>>,
    events: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn was_invoked(&self) -> bool {
        !self.events.lock().is_empty()
    }

    fn record(&self, kind: &str, message: &str) {
        let block = self.current.read().clone().unwrap_or_default();
        self.events.lock().push(format!("{kind}[{block}]: {message}"));
    }
}

impl TestCaseLogger for RecordingLogger {
    fn set_current_block(&self, block: Option<&str>) {
        *self.current.write() = block.map(str::to_owned);
    }

    fn current_block(&self) -> Option<String> {
        self.current.read().clone()
    }

    fn debug(&self, message: &str) {
        self.record("debug", message);
    }

    fn info(&self, message: &str) {
        self.record("info", message);
    }

    fn critical(&self, message: &str) {
        self.record("critical", message);
    }

    fn block_input(&self, description: &str) {
        self.record("input", description);
    }

    fn block_output(&self, description: &str) {
        self.record("output", description);
    }
}
