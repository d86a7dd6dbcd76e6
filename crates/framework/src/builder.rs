//! Fluent construction of test cases.
//!
//! The builder accumulates dependency registrations and block order in
//! call order, then finalizes into a runnable [`TestCase`]. Building
//! consumes the builder; producing a second case requires a fresh one.

use std::any::Any;
use std::sync::Arc;

use uuid::Uuid;

use crate::block::{ExecuteArgs, Injectable, TestBlock};
use crate::case::{BlockDescriptor, TestCase};
use crate::injector::Injector;
use crate::logging::{DebugLogger, TestCaseLogger};
use crate::pool::DependencyPool;

enum LoggerBinding {
    /// The built-in tracing-backed logger, bound unless replaced/removed.
    Default,
    Custom(Arc<dyn TestCaseLogger>),
    Removed,
}

/// Accumulates registrations for one test case.
pub struct TestBuilder {
    pool: DependencyPool,
    blocks: Vec<BlockDescriptor>,
    cleanup: Vec<BlockDescriptor>,
    logger: LoggerBinding,
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuilder {
    pub fn new() -> Self {
        TestBuilder {
            pool: DependencyPool::new(),
            blocks: Vec::new(),
            cleanup: Vec::new(),
            logger: LoggerBinding::Default,
        }
    }

    /// Register a concrete value under its own type. Registering the same
    /// type again replaces the earlier entry: last registration wins. To
    /// register under a trait, pass an already-coerced `Arc<dyn Trait>`.
    pub fn add_dependency_instance<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.pool.register_instance(value);
        self
    }

    /// Register a lazily-constructed service binding for `T`: one
    /// instance per test-case run, built on first resolution.
    pub fn add_dependency_service<T: Injectable>(mut self) -> Self {
        self.pool.register_service::<T>();
        self
    }

    /// Service binding with an explicit builder, e.g. binding a trait
    /// object to a concrete implementation. Memoized like
    /// [`add_dependency_service`](Self::add_dependency_service).
    pub fn add_dependency_service_with<T, F>(mut self, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut Injector<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.pool.register_service_with(build);
        self
    }

    /// Register a factory invoked afresh on every resolution of `T`.
    pub fn add_dependency_factory<T, F>(mut self, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut Injector<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.pool.register_factory(build);
        self
    }

    /// Append a test block to the main pipeline.
    pub fn add_test_block<B: TestBlock>(self) -> Self {
        self.add_test_block_with::<B>(ExecuteArgs::new())
    }

    /// Append a test block with literal invocation arguments, matched to
    /// the block's argument types ahead of pool resolution.
    pub fn add_test_block_with<B: TestBlock>(mut self, args: ExecuteArgs) -> Self {
        self.blocks.push(BlockDescriptor::new::<B>(args));
        self
    }

    /// Append a cleanup block. Cleanup blocks always run after the main
    /// pipeline, in registration order, regardless of its outcome.
    pub fn add_cleanup_block<B: TestBlock>(self) -> Self {
        self.add_cleanup_block_with::<B>(ExecuteArgs::new())
    }

    /// Append a cleanup block with literal invocation arguments.
    pub fn add_cleanup_block_with<B: TestBlock>(mut self, args: ExecuteArgs) -> Self {
        self.cleanup.push(BlockDescriptor::new::<B>(args));
        self
    }

    /// Replace the logger binding with a custom implementation.
    pub fn with_logger(mut self, logger: Arc<dyn TestCaseLogger>) -> Self {
        self.logger = LoggerBinding::Custom(logger);
        self
    }

    /// Remove the logger binding entirely; blocks observe it as absent.
    /// Idempotent: removing an already-absent logger is a no-op.
    pub fn remove_logger(mut self) -> Self {
        self.logger = LoggerBinding::Removed;
        self
    }

    /// Finalize into a runnable test case with a fresh seeded pool, the
    /// captured block order, and default flags.
    pub fn build(mut self) -> TestCase {
        let run_id = Uuid::new_v4();
        let logger: Option<Arc<dyn TestCaseLogger>> = match self.logger {
            LoggerBinding::Default => Some(Arc::new(DebugLogger::new(run_id))),
            LoggerBinding::Custom(logger) => Some(logger),
            LoggerBinding::Removed => None,
        };
        self.pool.set_logger(logger);
        TestCase::new(run_id, self.blocks, self.cleanup, self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::RunState;

    #[test]
    fn built_case_has_documented_defaults() {
        let tc = TestBuilder::new().build();
        assert!(!tc.passed());
        assert!(tc.throw_on_cleanup_failure);
        assert_eq!(tc.state(), RunState::NotStarted);
        assert!(tc.report().is_none());
    }

    #[test]
    fn each_build_gets_its_own_run_id() {
        let a = TestBuilder::new().build();
        let b = TestBuilder::new().build();
        assert_ne!(a.run_id(), b.run_id());
    }
}
