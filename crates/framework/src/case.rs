//! Test-case state and the execution engine.
//!
//! A [`TestCase`] is the immutable product of the builder: the ordered
//! main pipeline, the ordered cleanup list, and the seeded pool. One
//! instance represents exactly one execution. The engine walks the main
//! pipeline in order with short-circuit-on-failure semantics, then runs
//! every cleanup block regardless, and folds the collected failures into
//! a single [`TestCaseError`] per the outcome matrix.

use std::any::type_name;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::block::{ExecuteArgs, TestBlock};
use crate::error::{BlockFailure, FrameworkError, TestCaseError};
use crate::injector::{BlockArgs, Injector};
use crate::pool::DependencyPool;

/// Lifecycle of one test-case run. Terminal states are not re-entrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Passed,
    Failed,
}

/// Which list a block was registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPhase {
    Main,
    Cleanup,
}

/// Outcome of one registered block. Main blocks after the first failure
/// are skipped; cleanup blocks always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockOutcome {
    Passed,
    Failed,
    Skipped,
}

/// Per-block entry in the execution report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockReport {
    pub name: String,
    pub phase: BlockPhase,
    pub outcome: BlockOutcome,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl BlockReport {
    fn passed(name: &str, phase: BlockPhase, elapsed: Duration) -> Self {
        BlockReport {
            name: name.to_string(),
            phase,
            outcome: BlockOutcome::Passed,
            duration_ms: elapsed.as_millis() as u64,
            error: None,
        }
    }

    fn failed(name: &str, phase: BlockPhase, elapsed: Duration, error: &anyhow::Error) -> Self {
        BlockReport {
            name: name.to_string(),
            phase,
            outcome: BlockOutcome::Failed,
            duration_ms: elapsed.as_millis() as u64,
            error: Some(error.to_string()),
        }
    }

    fn skipped(name: &str, phase: BlockPhase) -> Self {
        BlockReport {
            name: name.to_string(),
            phase,
            outcome: BlockOutcome::Skipped,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Serializable summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub passed: bool,
    pub duration_ms: u64,
    pub blocks: Vec<BlockReport>,
}

/// Type-erased runner for one registered block, monomorphised at
/// registration time. Both synchronous and asynchronous blocks run
/// through this one awaited path.
type RunFn = for<'a> fn(&'a mut DependencyPool, &'a ExecuteArgs) -> BoxFuture<'a, anyhow::Result<()>>;

/// One registered block: its display name, literal invocation arguments,
/// and erased runner. Immutable once added to the pipeline.
pub(crate) struct BlockDescriptor {
    name: &'static str,
    args: ExecuteArgs,
    run: RunFn,
}

impl BlockDescriptor {
    pub(crate) fn new<B: TestBlock>(args: ExecuteArgs) -> Self {
        BlockDescriptor {
            name: type_name::<B>(),
            args,
            run: run_erased::<B>,
        }
    }
}

fn run_erased<'a, B: TestBlock>(
    pool: &'a mut DependencyPool,
    args: &'a ExecuteArgs,
) -> BoxFuture<'a, anyhow::Result<()>> {
    Box::pin(run_block::<B>(pool, args))
}

/// Drive one block through its full lifecycle against the pool.
async fn run_block<B: TestBlock>(
    pool: &mut DependencyPool,
    args: &ExecuteArgs,
) -> anyhow::Result<()> {
    let name = type_name::<B>();
    let logger = pool.logger();
    if let Some(log) = &logger {
        log.set_current_block(Some(name));
    }

    let mut injector = Injector::for_block(pool, name, args);
    let mut block = B::construct(&mut injector)?;
    block.inject_properties(&mut injector)?;
    block.set_log(logger.clone());

    let resolved = B::Args::resolve(&mut injector)?;
    if let Some(log) = &logger {
        let inputs = B::Args::describe();
        if !inputs.is_empty() {
            log.block_input(&inputs);
        }
    }

    block.pre_block_execution()?;
    let output = block.execute(resolved).await?;
    block.post_block_execution()?;

    if let Some((type_id, output_name, value)) = output.value {
        if let Some(log) = &logger {
            log.block_output(output_name);
        }
        pool.publish(value, type_id, output_name);
    }
    Ok(())
}

/// An immutable, runnable pipeline of test blocks. Produced by
/// [`TestBuilder::build`](crate::builder::TestBuilder::build); mutated
/// only by its own single execution.
pub struct TestCase {
    run_id: Uuid,
    blocks: Vec<BlockDescriptor>,
    cleanup: Vec<BlockDescriptor>,
    pool: DependencyPool,
    state: RunState,
    passed: bool,
    /// Raise [`TestCaseError::CleanupFailed`] when the pipeline passed but
    /// cleanup did not. Only suppresses that scenario; cleanup failures
    /// co-occurring with a pipeline failure are always reported.
    pub throw_on_cleanup_failure: bool,
    report: Option<ExecutionReport>,
}

impl TestCase {
    pub(crate) fn new(
        run_id: Uuid,
        blocks: Vec<BlockDescriptor>,
        cleanup: Vec<BlockDescriptor>,
        pool: DependencyPool,
    ) -> Self {
        TestCase {
            run_id,
            blocks,
            cleanup,
            pool,
            state: RunState::NotStarted,
            passed: false,
            throw_on_cleanup_failure: true,
            report: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Whether the main pipeline completed without a primary failure.
    /// Authoritative independent of whether an error was raised.
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Per-block outcomes and timings. Available once `execute` returns.
    pub fn report(&self) -> Option<&ExecutionReport> {
        self.report.as_ref()
    }

    /// Run the pipeline: main blocks in registration order with
    /// short-circuit on the first failure, then every cleanup block in
    /// registration order, then the outcome matrix. `passed` and the run
    /// state are final before any error is returned.
    pub async fn execute(&mut self) -> Result<(), TestCaseError> {
        if self.state != RunState::NotStarted {
            return Err(FrameworkError::AlreadyExecuted.into());
        }
        self.state = RunState::Running;
        let started = Instant::now();
        info!(
            run_id = %self.run_id,
            blocks = self.blocks.len(),
            cleanup = self.cleanup.len(),
            "executing test case"
        );

        let TestCase {
            blocks,
            cleanup,
            pool,
            ..
        } = &mut *self;

        let mut reports = Vec::with_capacity(blocks.len() + cleanup.len());
        let mut primary: Option<BlockFailure> = None;

        for descriptor in blocks.iter() {
            if primary.is_some() {
                reports.push(BlockReport::skipped(descriptor.name, BlockPhase::Main));
                continue;
            }
            let block_started = Instant::now();
            debug!(block = descriptor.name, "running test block");
            match (descriptor.run)(pool, &descriptor.args).await {
                Ok(()) => reports.push(BlockReport::passed(
                    descriptor.name,
                    BlockPhase::Main,
                    block_started.elapsed(),
                )),
                Err(error) => {
                    warn!(
                        block = descriptor.name,
                        %error,
                        "test block failed, short-circuiting pipeline"
                    );
                    reports.push(BlockReport::failed(
                        descriptor.name,
                        BlockPhase::Main,
                        block_started.elapsed(),
                        &error,
                    ));
                    primary = Some(BlockFailure::new(descriptor.name, error));
                }
            }
        }

        let mut cleanup_failures = Vec::new();
        for descriptor in cleanup.iter() {
            let block_started = Instant::now();
            debug!(block = descriptor.name, "running cleanup block");
            match (descriptor.run)(pool, &descriptor.args).await {
                Ok(()) => reports.push(BlockReport::passed(
                    descriptor.name,
                    BlockPhase::Cleanup,
                    block_started.elapsed(),
                )),
                Err(error) => {
                    warn!(block = descriptor.name, %error, "cleanup block failed");
                    reports.push(BlockReport::failed(
                        descriptor.name,
                        BlockPhase::Cleanup,
                        block_started.elapsed(),
                        &error,
                    ));
                    cleanup_failures.push(BlockFailure::new(descriptor.name, error));
                }
            }
        }

        if let Some(log) = pool.logger() {
            log.set_current_block(None);
        }

        // Finalize state before constructing any error, so callers that
        // catch and then inspect the flag see the real outcome.
        self.passed = primary.is_none();
        self.state = if self.passed {
            RunState::Passed
        } else {
            RunState::Failed
        };
        self.report = Some(ExecutionReport {
            run_id: self.run_id,
            passed: self.passed,
            duration_ms: started.elapsed().as_millis() as u64,
            blocks: reports,
        });

        match (primary, cleanup_failures.is_empty()) {
            (None, true) => Ok(()),
            (None, false) => {
                if self.throw_on_cleanup_failure {
                    Err(TestCaseError::CleanupFailed {
                        failures: cleanup_failures,
                    })
                } else {
                    debug!("cleanup failures accepted (throw_on_cleanup_failure is off)");
                    Ok(())
                }
            }
            (Some(failure), true) => Err(TestCaseError::BlockFailed { failure }),
            (Some(primary), false) => Err(TestCaseError::FailedWithCleanup {
                primary,
                cleanup: cleanup_failures,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Output;
    use crate::builder::TestBuilder;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Noop;

    #[async_trait]
    impl TestBlock for Noop {
        type Args = ();

        fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
            Ok(Noop)
        }

        async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
            Ok(Output::none())
        }
    }

    #[tokio::test]
    async fn empty_pipeline_passes() {
        let mut tc = TestBuilder::new().build();
        tc.execute().await.unwrap();
        assert!(tc.passed());
        assert_eq!(tc.state(), RunState::Passed);
    }

    #[tokio::test]
    async fn executing_twice_is_an_error() {
        let mut tc = TestBuilder::new().add_test_block::<Noop>().build();
        tc.execute().await.unwrap();
        let err = tc.execute().await.unwrap_err();
        assert!(matches!(
            err,
            TestCaseError::Framework(FrameworkError::AlreadyExecuted)
        ));
        // The first run's outcome is untouched.
        assert!(tc.passed());
    }

    #[tokio::test]
    async fn report_covers_every_block() {
        let mut tc = TestBuilder::new()
            .add_test_block::<Noop>()
            .add_cleanup_block::<Noop>()
            .build();
        tc.execute().await.unwrap();

        let report = tc.report().unwrap();
        assert!(report.passed);
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].phase, BlockPhase::Main);
        assert_eq!(report.blocks[1].phase, BlockPhase::Cleanup);
        assert!(report
            .blocks
            .iter()
            .all(|b| b.outcome == BlockOutcome::Passed));
    }
}
