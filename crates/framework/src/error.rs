//! Error types for the test framework.
//!
//! Two layers: [`FrameworkError`] covers failures of the framework's own
//! machinery (dependency resolution, run-state misuse), while block code
//! fails with plain `anyhow::Error` so arbitrary fixture errors keep their
//! identity. [`TestCaseError`] is the terminal error of a run and carries
//! every underlying [`BlockFailure`] in contract order.

use std::fmt;

use thiserror::Error;

/// Result alias for framework-level operations.
pub type Result<T> = std::result::Result<T, FrameworkError>;

/// Failures of the framework machinery itself.
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// A required input could not be found in the dependency pool.
    #[error("no dependency of type `{type_name}` is available for `{requester}`")]
    MissingDependency {
        type_name: &'static str,
        requester: String,
    },

    /// A pool entry keyed under one type held a value of another.
    #[error("dependency pool entry for `{expected}` holds a value of an unexpected type")]
    EntryTypeMismatch { expected: &'static str },

    /// `execute` was called on a test case that already ran to completion.
    /// One `TestCase` instance represents exactly one execution.
    #[error("test case has already been executed")]
    AlreadyExecuted,
}

/// A failure raised by one block, tagged with the block's identity.
///
/// The original error is stored untouched: callers can downcast it to the
/// type the block actually raised and read its message verbatim.
#[derive(Debug)]
pub struct BlockFailure {
    /// Type path of the failing block.
    pub block: String,
    /// The error exactly as the block raised it.
    pub error: anyhow::Error,
}

impl BlockFailure {
    pub(crate) fn new(block: impl Into<String>, error: anyhow::Error) -> Self {
        BlockFailure {
            block: block.into(),
            error,
        }
    }
}

impl fmt::Display for BlockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.block, self.error)
    }
}

/// Terminal error of a test-case run.
///
/// The three failure scenarios of the outcome matrix map to the first
/// three variants. [`TestCaseError::failures`] returns the underlying
/// failures in contract order: the primary (main-pipeline) failure first,
/// then cleanup failures in registration order.
#[derive(Error, Debug)]
pub enum TestCaseError {
    /// The main pipeline failed; cleanup ran clean. The inner cause is the
    /// failing block's original error, unmodified.
    #[error("test block `{}` failed: {}", .failure.block, .failure.error)]
    BlockFailed { failure: BlockFailure },

    /// The main pipeline passed, but one or more cleanup blocks failed.
    /// Raised only while `throw_on_cleanup_failure` is set.
    #[error("test case succeeded but cleanup failed")]
    CleanupFailed { failures: Vec<BlockFailure> },

    /// The main pipeline failed and cleanup blocks failed too. Raised
    /// regardless of `throw_on_cleanup_failure`.
    #[error("test case failed and cleanup blocks also failed")]
    FailedWithCleanup {
        primary: BlockFailure,
        cleanup: Vec<BlockFailure>,
    },

    /// Framework misuse surfaced through the run entry point.
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

impl TestCaseError {
    /// All underlying failures: primary first, then cleanup failures in
    /// registration order.
    pub fn failures(&self) -> Vec<&BlockFailure> {
        match self {
            TestCaseError::BlockFailed { failure } => vec![failure],
            TestCaseError::CleanupFailed { failures } => failures.iter().collect(),
            TestCaseError::FailedWithCleanup { primary, cleanup } => {
                std::iter::once(primary).chain(cleanup.iter()).collect()
            }
            TestCaseError::Framework(_) => Vec::new(),
        }
    }

    /// The main-pipeline failure, when the pipeline itself failed.
    pub fn primary(&self) -> Option<&BlockFailure> {
        match self {
            TestCaseError::BlockFailed { failure } => Some(failure),
            TestCaseError::FailedWithCleanup { primary, .. } => Some(primary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_failed_message_names_block_and_cause() {
        let err = TestCaseError::BlockFailed {
            failure: BlockFailure::new("fixtures::Login", anyhow::anyhow!("bad credentials")),
        };
        let msg = err.to_string();
        assert!(msg.contains("fixtures::Login"));
        assert!(msg.contains("bad credentials"));
    }

    #[test]
    fn failures_order_is_primary_then_cleanup() {
        let err = TestCaseError::FailedWithCleanup {
            primary: BlockFailure::new("a", anyhow::anyhow!("first")),
            cleanup: vec![
                BlockFailure::new("b", anyhow::anyhow!("second")),
                BlockFailure::new("c", anyhow::anyhow!("third")),
            ],
        };
        let blocks: Vec<&str> = err.failures().iter().map(|f| f.block.as_str()).collect();
        assert_eq!(blocks, ["a", "b", "c"]);
        assert!(err.to_string().contains("failed and cleanup"));
    }

    #[test]
    fn cleanup_only_message_states_success() {
        let err = TestCaseError::CleanupFailed {
            failures: vec![BlockFailure::new("c", anyhow::anyhow!("boom"))],
        };
        assert!(err.to_string().contains("succeeded but cleanup failed"));
        assert!(err.primary().is_none());
    }
}
