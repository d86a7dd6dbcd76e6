//! Fixture test blocks, one per wiring shape the framework supports.

use std::sync::Arc;

use anyhow::ensure;
use async_trait::async_trait;
use testforge_framework::{Dep, DynDep, Injector, Log, Output, TestBlock, TestCaseLogger};

use crate::dependencies::{
    CleanupProbe, ExampleData, ExampleImplementation, Expected, FixtureError, SessionToken,
    SomeDependency, Widget,
};

/// Returns its bool input, or fails with the canonical fixture error when
/// handed `false`. The published bool replaces the input registration
/// (last write wins).
#[derive(Default)]
pub struct BoolReturnBlock;

#[async_trait]
impl TestBlock for BoolReturnBlock {
    type Args = (Dep<bool>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (value,) = args;
        if !*value {
            return Err(FixtureError::BoolWasFalse.into());
        }
        Ok(Output::value(*value))
    }
}

/// Takes a pool-resolved string plus a literal integer argument.
#[derive(Default)]
pub struct MultipleDependenciesBlock;

#[async_trait]
impl TestBlock for MultipleDependenciesBlock {
    type Args = (Dep<String>, Dep<i32>);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (text, count) = args;
        ensure!(!text.is_empty(), "expected a non-empty text input");
        ensure!(*count != 0, "expected a non-zero count input");
        Ok(Output::none())
    }
}

/// Argument injection of a plain string.
#[derive(Default)]
pub struct ExecuteArgBlock;

#[async_trait]
impl TestBlock for ExecuteArgBlock {
    type Args = (Dep<String>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (text,) = args;
        ensure!(!text.is_empty(), "expected a non-empty text input");
        Ok(Output::none())
    }
}

/// Property injection: the string arrives via `inject_properties`.
#[derive(Default)]
pub struct PropertyBlock {
    text: Option<Arc<String>>,
}

#[async_trait]
impl TestBlock for PropertyBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn inject_properties(&mut self, injector: &mut Injector<'_>) -> anyhow::Result<()> {
        self.text = Some(injector.resolve::<String>()?);
        Ok(())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        ensure!(self.text.is_some(), "text property was not injected");
        Ok(Output::none())
    }
}

/// A property whose contract permits absence: resolution misses leave it
/// `None` instead of failing the block.
#[derive(Default)]
pub struct OptionalPropertyBlock {
    widget: Option<Arc<Widget>>,
}

#[async_trait]
impl TestBlock for OptionalPropertyBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn inject_properties(&mut self, injector: &mut Injector<'_>) -> anyhow::Result<()> {
        self.widget = injector.try_resolve::<Widget>()?;
        Ok(())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        // Reports whether the optional input showed up.
        Ok(Output::value(self.widget.is_some()))
    }
}

/// Constructor injection: the string arrives while the block is built.
pub struct ConstructorBlock {
    text: Arc<String>,
}

#[async_trait]
impl TestBlock for ConstructorBlock {
    type Args = ();

    fn construct(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(ConstructorBlock {
            text: injector.resolve::<String>()?,
        })
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        ensure!(!self.text.is_empty(), "expected a non-empty text input");
        Ok(Output::none())
    }
}

/// Depends on a service-bound concrete type.
#[derive(Default)]
pub struct OwnTypeBlock;

#[async_trait]
impl TestBlock for OwnTypeBlock {
    type Args = (Dep<ExampleImplementation>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (example,) = args;
        ensure!(!example.text.is_empty(), "implementation carried no text");
        Ok(Output::none())
    }
}

/// Depends on a trait object registered as `Arc<dyn ExampleData>`.
#[derive(Default)]
pub struct InterfaceArgBlock;

#[async_trait]
impl TestBlock for InterfaceArgBlock {
    type Args = (DynDep<dyn ExampleData>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (data,) = args;
        ensure!(!data.text().is_empty(), "interface carried no text");
        Ok(Output::none())
    }
}

/// Suspends mid-block; the pipeline must await it before advancing.
#[derive(Default)]
pub struct AsyncPauseBlock;

#[async_trait]
impl TestBlock for AsyncPauseBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        Ok(Output::none())
    }
}

/// Suspends, then publishes a session token for downstream blocks.
#[derive(Default)]
pub struct AsyncTokenBlock;

#[async_trait]
impl TestBlock for AsyncTokenBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        Ok(Output::value(SessionToken("issued".to_string())))
    }
}

/// Cleanup block consuming an output published by an earlier main block.
#[derive(Default)]
pub struct TokenConsumerCleanupBlock;

#[async_trait]
impl TestBlock for TokenConsumerCleanupBlock {
    type Args = (Dep<SessionToken>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (token,) = args;
        ensure!(!(*token).0.is_empty(), "token was empty");
        Ok(Output::none())
    }
}

/// Publishes a widget for downstream consumers.
#[derive(Default)]
pub struct ProducerBlock;

#[async_trait]
impl TestBlock for ProducerBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        Ok(Output::value(Widget(42)))
    }
}

/// Requires the widget published by [`ProducerBlock`].
#[derive(Default)]
pub struct ConsumerBlock;

#[async_trait]
impl TestBlock for ConsumerBlock {
    type Args = (Dep<Widget>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (widget,) = args;
        let Widget(id) = &*widget;
        ensure!(*id == 42, "expected the produced widget, got Widget({id})");
        Ok(Output::none())
    }
}

/// Asserts that the resolved string equals the expectation registered
/// alongside it.
#[derive(Default)]
pub struct AssertStringBlock;

#[async_trait]
impl TestBlock for AssertStringBlock {
    type Args = (Dep<String>, Dep<Expected>);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (actual, expected) = args;
        let Expected(want) = &*expected;
        ensure!(
            *actual == *want,
            "resolved `{}`, expected `{}`",
            *actual,
            want
        );
        Ok(Output::none())
    }
}

/// Depends on a service binding that has dependencies of its own.
#[derive(Default)]
pub struct SomeDependencyBlock;

#[async_trait]
impl TestBlock for SomeDependencyBlock {
    type Args = (Dep<SomeDependency>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, _: Self::Args) -> anyhow::Result<Output> {
        Ok(Output::none())
    }
}

/// Cleanup block that always fails.
#[derive(Default)]
pub struct FailingCleanupBlock;

#[async_trait]
impl TestBlock for FailingCleanupBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        Err(FixtureError::CleanupBroke.into())
    }
}

/// Second always-failing cleanup block, distinct by name so aggregation
/// order is observable.
#[derive(Default)]
pub struct FailingTeardownBlock;

#[async_trait]
impl TestBlock for FailingTeardownBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        Err(FixtureError::CleanupBroke.into())
    }
}

/// Cleanup block that flips the shared probe so tests can see it ran.
#[derive(Default)]
pub struct ProbeCleanupBlock;

#[async_trait]
impl TestBlock for ProbeCleanupBlock {
    type Args = (Dep<CleanupProbe>,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (probe,) = args;
        probe.touch();
        Ok(Output::none())
    }
}

/// Overrides the pre-execution hook to reject the block.
#[derive(Default)]
pub struct PreHookFailBlock;

#[async_trait]
impl TestBlock for PreHookFailBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn pre_block_execution(&mut self) -> anyhow::Result<()> {
        Err(FixtureError::PreHookRejected.into())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        Ok(Output::none())
    }
}

/// Overrides the post-execution hook to reject the block.
#[derive(Default)]
pub struct PostHookFailBlock;

#[async_trait]
impl TestBlock for PostHookFailBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        Ok(Output::none())
    }

    fn post_block_execution(&mut self) -> anyhow::Result<()> {
        Err(FixtureError::PostHookRejected.into())
    }
}

// ============================================================================
// Logger fixtures: presence/absence observed through each injection point
// ============================================================================

/// Expects the logger through the argument slot.
#[derive(Default)]
pub struct ExpectLogArgBlock;

#[async_trait]
impl TestBlock for ExpectLogArgBlock {
    type Args = (Log,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (Log(logger),) = args;
        ensure!(logger.is_some(), "expected a bound logger");
        Ok(Output::none())
    }
}

/// Expects an absent logger through the argument slot.
#[derive(Default)]
pub struct ExpectNoLogArgBlock;

#[async_trait]
impl TestBlock for ExpectNoLogArgBlock {
    type Args = (Log,);

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output> {
        let (Log(logger),) = args;
        ensure!(logger.is_none(), "expected no logger, one was bound");
        Ok(Output::none())
    }
}

/// Expects the logger through the property slot.
#[derive(Default)]
pub struct ExpectLogPropBlock {
    log: Option<Arc<dyn TestCaseLogger>>,
}

#[async_trait]
impl TestBlock for ExpectLogPropBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn set_log(&mut self, log: Option<Arc<dyn TestCaseLogger>>) {
        self.log = log;
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        ensure!(self.log.is_some(), "expected a bound logger");
        Ok(Output::none())
    }
}

/// Expects an absent logger through the property slot.
#[derive(Default)]
pub struct ExpectNoLogPropBlock {
    log: Option<Arc<dyn TestCaseLogger>>,
}

#[async_trait]
impl TestBlock for ExpectNoLogPropBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn set_log(&mut self, log: Option<Arc<dyn TestCaseLogger>>) {
        self.log = log;
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        ensure!(self.log.is_none(), "expected no logger, one was bound");
        Ok(Output::none())
    }
}

/// Expects the logger at construction time.
pub struct ExpectLogCtorBlock {
    log: Option<Arc<dyn TestCaseLogger>>,
}

#[async_trait]
impl TestBlock for ExpectLogCtorBlock {
    type Args = ();

    fn construct(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(ExpectLogCtorBlock {
            log: injector.logger(),
        })
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        ensure!(self.log.is_some(), "expected a bound logger");
        Ok(Output::none())
    }
}

/// Expects an absent logger at construction time.
pub struct ExpectNoLogCtorBlock {
    log: Option<Arc<dyn TestCaseLogger>>,
}

#[async_trait]
impl TestBlock for ExpectNoLogCtorBlock {
    type Args = ();

    fn construct(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(ExpectNoLogCtorBlock {
            log: injector.logger(),
        })
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        ensure!(self.log.is_none(), "expected no logger, one was bound");
        Ok(Output::none())
    }
}

/// Emits one message at every level through its injected logger.
#[derive(Default)]
pub struct ChattyLogBlock {
    log: Option<Arc<dyn TestCaseLogger>>,
}

#[async_trait]
impl TestBlock for ChattyLogBlock {
    type Args = ();

    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }

    fn set_log(&mut self, log: Option<Arc<dyn TestCaseLogger>>) {
        self.log = log;
    }

    async fn execute(&mut self, _: ()) -> anyhow::Result<Output> {
        if let Some(log) = &self.log {
            log.debug("starting chatty block");
            log.info("doing the thing");
            log.critical("something worth shouting about");
        }
        Ok(Output::none())
    }
}
