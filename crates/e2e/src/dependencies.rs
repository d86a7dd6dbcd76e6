//! Fixture dependency types covering the registration shapes the
//! framework supports: plain instances, trait-object instances, service
//! bindings (including ones with their own dependencies), and factories.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use testforge_framework::{Injectable, Injector};

/// Errors fixtures raise on purpose, so tests can assert that the engine
/// preserves their identity and message exactly.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FixtureError {
    #[error("test failure")]
    BoolWasFalse,

    #[error("oops, the factory is broken")]
    FactoryBroke,

    #[error("cleanup went sideways")]
    CleanupBroke,

    #[error("pre-execution hook rejected the block")]
    PreHookRejected,

    #[error("post-execution hook rejected the block")]
    PostHookRejected,
}

/// Simple data interface with a concrete implementation, for trait-object
/// registrations.
pub trait ExampleData: Send + Sync {
    fn text(&self) -> &str;
}

#[derive(Debug, Clone, Default)]
pub struct ExampleImplementation {
    pub text: String,
}

impl ExampleData for ExampleImplementation {
    fn text(&self) -> &str {
        &self.text
    }
}

impl Injectable for ExampleImplementation {
    fn construct(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(ExampleImplementation {
            text: "constructed".to_string(),
        })
    }
}

/// A dependency only ever produced by a factory, so tests can steer which
/// factory (working or broken) gets registered.
#[derive(Debug)]
pub struct AlwaysThrow;

/// A service-bound dependency that itself needs [`AlwaysThrow`] while
/// constructing, to prove nested resolution and nested failure paths.
#[derive(Debug)]
pub struct SomeDependency {
    pub inner: Arc<AlwaysThrow>,
}

impl Injectable for SomeDependency {
    fn construct(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(SomeDependency {
            inner: injector.resolve::<AlwaysThrow>()?,
        })
    }
}

/// Factory that always fails, mirroring a broken construction path.
pub fn throwing_factory(_: &mut Injector<'_>) -> anyhow::Result<AlwaysThrow> {
    Err(FixtureError::FactoryBroke.into())
}

/// Factory for [`AlwaysThrow`] that does not, in fact, throw.
pub fn quiet_factory(_: &mut Injector<'_>) -> anyhow::Result<AlwaysThrow> {
    Ok(AlwaysThrow)
}

/// Factory that works.
pub fn working_factory(_: &mut Injector<'_>) -> anyhow::Result<ExampleImplementation> {
    Ok(ExampleImplementation {
        text: "from factory".to_string(),
    })
}

/// Service builder binding the [`ExampleData`] trait to its concrete
/// implementation, for interface-keyed registrations.
pub fn example_data_binding(_: &mut Injector<'_>) -> anyhow::Result<Arc<dyn ExampleData>> {
    Ok(Arc::new(ExampleImplementation {
        text: "bound".to_string(),
    }))
}

/// Expectation registered alongside an input, so assertion blocks can
/// compare what they resolved against what the test intended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected(pub String);

/// Output published by the async fixture block and consumed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Output published by the producer block in ordering tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget(pub u32);

/// Shared flag a cleanup block flips, so tests can observe that cleanup
/// really ran.
#[derive(Clone, Default)]
pub struct CleanupProbe {
    touched: Arc<AtomicBool>,
}

impl CleanupProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&self) {
        self.touched.store(true, Ordering::SeqCst);
    }

    pub fn touched(&self) -> bool {
        self.touched.load(Ordering::SeqCst)
    }
}
