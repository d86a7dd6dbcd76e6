//! The type-keyed dependency pool.
//!
//! A flat registry of values, service bindings, and factories keyed by
//! exact `TypeId`. The pool is seeded by the builder and grows
//! monotonically while a test case runs: every non-void block output is
//! published back into it under its runtime type. Rebinding a key replaces
//! the earlier entry without complaint: last registration wins.
//!
//! Resolution has no supertype search and no cycle detection; a binding
//! that resolves itself recurses until the stack gives out, which is the
//! caller's bug to fix.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::block::Injectable;
use crate::injector::Injector;
use crate::logging::TestCaseLogger;

/// A value held by the pool, type-erased behind `Any`.
pub(crate) type PoolValue = Arc<dyn Any + Send + Sync>;

/// Deferred builder for bindings and factories. Builders resolve their own
/// inputs through a nested injector and fail with ordinary errors.
type BuildFn = Arc<dyn Fn(&mut Injector<'_>) -> anyhow::Result<PoolValue> + Send + Sync>;

enum DependencyEntry {
    /// A concrete value, handed out as a shared handle.
    Instance(PoolValue),
    /// Lazily built, then memoized: one instance per test-case run.
    Binding {
        build: BuildFn,
        cached: Option<PoolValue>,
    },
    /// Built afresh on every resolution; never memoized by the pool.
    Factory { build: BuildFn },
}

/// The mutable set of dependencies available at a point in the pipeline.
pub struct DependencyPool {
    entries: HashMap<TypeId, DependencyEntry>,
    names: HashMap<TypeId, &'static str>,
    logger: Option<Arc<dyn TestCaseLogger>>,
}

impl DependencyPool {
    pub(crate) fn new() -> Self {
        DependencyPool {
            entries: HashMap::new(),
            names: HashMap::new(),
            logger: None,
        }
    }

    /// Register a concrete value under its own type.
    pub fn register_instance<T: Any + Send + Sync>(&mut self, value: T) {
        self.insert::<T>(DependencyEntry::Instance(Arc::new(value)));
    }

    /// Register a service binding for `T`, constructed from the pool on
    /// first resolution and memoized for the rest of the run.
    pub fn register_service<T: Injectable>(&mut self) {
        let build: BuildFn = Arc::new(|injector: &mut Injector<'_>| {
            T::construct(injector).map(|value| Arc::new(value) as PoolValue)
        });
        self.insert::<T>(DependencyEntry::Binding {
            build,
            cached: None,
        });
    }

    /// Register a service binding for `T` with an explicit builder, e.g.
    /// binding a trait object to a concrete implementation. Memoized like
    /// [`register_service`](Self::register_service).
    pub fn register_service_with<T, F>(&mut self, build: F)
    where
        T: Any + Send + Sync,
        F: Fn(&mut Injector<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let build: BuildFn = Arc::new(move |injector: &mut Injector<'_>| {
            build(injector).map(|value| Arc::new(value) as PoolValue)
        });
        self.insert::<T>(DependencyEntry::Binding {
            build,
            cached: None,
        });
    }

    /// Register a factory for `T`, invoked afresh on every resolution.
    pub fn register_factory<T, F>(&mut self, build: F)
    where
        T: Any + Send + Sync,
        F: Fn(&mut Injector<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let build: BuildFn = Arc::new(move |injector: &mut Injector<'_>| {
            build(injector).map(|value| Arc::new(value) as PoolValue)
        });
        self.insert::<T>(DependencyEntry::Factory { build });
    }

    /// Register a block output under its runtime type, making it available
    /// to every subsequent block. Replaces an existing entry for the type.
    pub(crate) fn publish(&mut self, value: PoolValue, type_id: TypeId, name: &'static str) {
        debug!(output = name, "published block output");
        self.entries.insert(type_id, DependencyEntry::Instance(value));
        self.names.insert(type_id, name);
    }

    /// Exact-type lookup. Instances clone out their handle; bindings run
    /// their builder once and memoize; factories run every call. `None`
    /// means no entry exists for the key; builder errors propagate
    /// verbatim.
    pub(crate) fn resolve_entry(&mut self, key: TypeId) -> anyhow::Result<Option<PoolValue>> {
        enum Pending {
            Binding(BuildFn),
            Factory(BuildFn),
        }

        let pending = match self.entries.get(&key) {
            None => return Ok(None),
            Some(DependencyEntry::Instance(value)) => return Ok(Some(value.clone())),
            Some(DependencyEntry::Binding {
                cached: Some(value),
                ..
            }) => return Ok(Some(value.clone())),
            Some(DependencyEntry::Binding { build, .. }) => Pending::Binding(build.clone()),
            Some(DependencyEntry::Factory { build }) => Pending::Factory(build.clone()),
        };
        let name = self.names.get(&key).copied().unwrap_or("<dependency>");

        match pending {
            Pending::Binding(build) => {
                let value = build(&mut Injector::for_dependency(self, name))?;
                if let Some(DependencyEntry::Binding { cached, .. }) = self.entries.get_mut(&key) {
                    *cached = Some(value.clone());
                }
                debug!(dependency = name, "materialized service binding");
                Ok(Some(value))
            }
            Pending::Factory(build) => {
                let value = build(&mut Injector::for_dependency(self, name))?;
                debug!(dependency = name, "ran dependency factory");
                Ok(Some(value))
            }
        }
    }

    pub(crate) fn set_logger(&mut self, logger: Option<Arc<dyn TestCaseLogger>>) {
        self.logger = logger;
    }

    /// The logger binding; absent when removed at build time.
    pub(crate) fn logger(&self) -> Option<Arc<dyn TestCaseLogger>> {
        self.logger.clone()
    }

    fn insert<T: Any + Send + Sync>(&mut self, entry: DependencyEntry) {
        let key = TypeId::of::<T>();
        if self.entries.insert(key, entry).is_some() {
            debug!(dependency = type_name::<T>(), "replaced dependency registration");
        }
        self.names.insert(key, type_name::<T>());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Widget(u32);

    fn resolve<T: Any + Send + Sync>(pool: &mut DependencyPool) -> Option<Arc<T>> {
        Injector::for_dependency(pool, "test")
            .try_resolve::<T>()
            .unwrap()
    }

    #[test]
    fn instance_roundtrip() {
        let mut pool = DependencyPool::new();
        pool.register_instance(Widget(7));
        assert_eq!(*resolve::<Widget>(&mut pool).unwrap(), Widget(7));
    }

    #[test]
    fn missing_type_resolves_to_none() {
        let mut pool = DependencyPool::new();
        assert!(resolve::<Widget>(&mut pool).is_none());
    }

    #[test]
    fn last_registration_wins() {
        let mut pool = DependencyPool::new();
        pool.register_instance("first".to_string());
        pool.register_instance("second".to_string());
        assert_eq!(*resolve::<String>(&mut pool).unwrap(), "second");
    }

    #[test]
    fn binding_memoizes_within_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut pool = DependencyPool::new();
        pool.register_service_with(move |_: &mut Injector<'_>| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Widget(1))
        });

        let first = resolve::<Widget>(&mut pool).unwrap();
        let second = resolve::<Widget>(&mut pool).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn factory_runs_every_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut pool = DependencyPool::new();
        pool.register_factory(move |_: &mut Injector<'_>| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Widget(2))
        });

        resolve::<Widget>(&mut pool).unwrap();
        resolve::<Widget>(&mut pool).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn publish_replaces_existing_entry() {
        let mut pool = DependencyPool::new();
        pool.register_instance(Widget(1));
        pool.publish(
            Arc::new(Widget(9)),
            TypeId::of::<Widget>(),
            type_name::<Widget>(),
        );
        assert_eq!(*resolve::<Widget>(&mut pool).unwrap(), Widget(9));
    }

    #[test]
    fn factory_error_propagates() {
        let mut pool = DependencyPool::new();
        pool.register_factory::<Widget, _>(|_: &mut Injector<'_>| {
            Err(anyhow::anyhow!("assembly line down"))
        });
        let err = Injector::for_dependency(&mut pool, "test")
            .try_resolve::<Widget>()
            .unwrap_err();
        assert!(err.to_string().contains("assembly line down"));
    }
}
