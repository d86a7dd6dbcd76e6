//! The logger capability: an injectable facade over leveled logging and
//! block input/output observation.
//!
//! The logger is a dependency like any other, with one carve-out: its
//! absence is observed (`None`), never raised, at every injection point.
//! Presence or absence must not alter pipeline control flow. Failures
//! inside a logger implementation are not specially caught.

use parking_lot::RwLock;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Capability object test blocks may depend on for leveled logging and
/// for observing the inputs/outputs the engine wires through them.
pub trait TestCaseLogger: Send + Sync {
    /// Tag subsequent calls with the currently executing block. The engine
    /// sets this around each block and clears it after the run.
    fn set_current_block(&self, block: Option<&str>);

    fn current_block(&self) -> Option<String>;

    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn critical(&self, message: &str);

    /// Observation hook: the inputs about to be handed to the current
    /// block.
    fn block_input(&self, description: &str);

    /// Observation hook: the output the current block published.
    fn block_output(&self, description: &str);
}

/// Built-in logger bound by default; forwards to `tracing` with the run
/// id and current block attached as fields.
pub struct DebugLogger {
    run_id: Uuid,
    current: RwLock<Option<String>>,
}

impl DebugLogger {
    pub fn new(run_id: Uuid) -> Self {
        DebugLogger {
            run_id,
            current: RwLock::new(None),
        }
    }

    fn block_tag(&self) -> String {
        self.current.read().clone().unwrap_or_default()
    }
}

impl TestCaseLogger for DebugLogger {
    fn set_current_block(&self, block: Option<&str>) {
        *self.current.write() = block.map(str::to_owned);
    }

    fn current_block(&self) -> Option<String> {
        self.current.read().clone()
    }

    fn debug(&self, message: &str) {
        debug!(run_id = %self.run_id, block = %self.block_tag(), "{}", message);
    }

    fn info(&self, message: &str) {
        info!(run_id = %self.run_id, block = %self.block_tag(), "{}", message);
    }

    fn critical(&self, message: &str) {
        error!(run_id = %self.run_id, block = %self.block_tag(), "{}", message);
    }

    fn block_input(&self, description: &str) {
        debug!(
            run_id = %self.run_id,
            block = %self.block_tag(),
            input = description,
            "test block input"
        );
    }

    fn block_output(&self, description: &str) {
        debug!(
            run_id = %self.run_id,
            block = %self.block_tag(),
            output = description,
            "test block output"
        );
    }
}
