//! The test-block contract.
//!
//! A block is one unit of test logic in the ordered pipeline. It obtains
//! inputs through three interchangeable injection points (construction,
//! settable properties, and execution arguments), all drawing from the
//! same dependency pool. The engine invokes the lifecycle hooks around the
//! execution call and publishes any returned output back into the pool.

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use async_trait::async_trait;

use crate::injector::{BlockArgs, Injector};
use crate::logging::TestCaseLogger;
use crate::pool::PoolValue;

/// Output of a block's execution call. A non-void output is published to
/// the dependency pool under its runtime type, available to every
/// subsequent block (and to cleanup blocks).
pub struct Output {
    pub(crate) value: Option<(TypeId, &'static str, PoolValue)>,
}

impl Output {
    /// No output; nothing is published.
    pub fn none() -> Self {
        Output { value: None }
    }

    /// Publish `value` for all subsequent blocks, keyed by its type.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Output {
            value: Some((TypeId::of::<T>(), type_name::<T>(), Arc::new(value))),
        }
    }
}

/// Literal invocation arguments for a parameterized block. Matched to the
/// block's argument types by exact type, ahead of pool resolution, for
/// that block's invocation only.
#[derive(Default)]
pub struct ExecuteArgs {
    values: Vec<(TypeId, PoolValue)>,
}

impl ExecuteArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a literal argument. The first literal matching a requested
    /// type wins.
    pub fn arg<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.values.push((TypeId::of::<T>(), Arc::new(value)));
        self
    }

    pub(crate) fn lookup(&self, key: TypeId) -> Option<PoolValue> {
        self.values
            .iter()
            .find(|(id, _)| *id == key)
            .map(|(_, value)| value.clone())
    }
}

/// One unit of test logic participating in the ordered pipeline.
///
/// The engine drives each block through construct → property injection →
/// logger slot → argument resolution → pre-hook → execute → post-hook,
/// then publishes the output. Any error along the way is that block's
/// failure, reported under the block's identity.
#[async_trait]
pub trait TestBlock: Send + Sized + 'static {
    /// Argument-injection tuple resolved immediately before `execute`.
    /// `()` for argument-less blocks, `(Dep<T>,)` for a single argument.
    type Args: BlockArgs;

    /// Constructor injection: build the block, resolving any constructor
    /// dependencies from the pool.
    fn construct(injector: &mut Injector<'_>) -> anyhow::Result<Self>;

    /// Property injection: resolve settable dependencies after
    /// construction. Blocks without injectable properties keep the
    /// default.
    fn inject_properties(&mut self, injector: &mut Injector<'_>) -> anyhow::Result<()> {
        let _ = injector;
        Ok(())
    }

    /// The logger capability slot. Called with `None` when the logger was
    /// removed; absence must be observed, never raised.
    fn set_log(&mut self, log: Option<Arc<dyn TestCaseLogger>>) {
        let _ = log;
    }

    /// Invoked before `execute`; an error here fails the block.
    fn pre_block_execution(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The block's main execution call.
    async fn execute(&mut self, args: Self::Args) -> anyhow::Result<Output>;

    /// Invoked after `execute`; an error here fails the block.
    fn post_block_execution(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A dependency type registered as a service binding, constructed lazily
/// from the pool on first resolution. Constructors may resolve their own
/// dependencies; their errors propagate to whichever block asked.
pub trait Injectable: Any + Send + Sync + Sized {
    fn construct(injector: &mut Injector<'_>) -> anyhow::Result<Self>;
}
