//! Dependency injection: one "supply a value of type `T` to a requesting
//! unit" operation behind every injection point.
//!
//! Constructor injection ([`crate::block::TestBlock::construct`]), property
//! injection (`inject_properties`), and argument injection (the block's
//! `Args` tuple) are three call sites of the same resolution operation.
//! Required resolution misses fail naming the missing type and the
//! requester; the logger capability is the one input whose absence is
//! observed rather than raised, at every injection point.

use std::any::{type_name, Any, TypeId};
use std::ops::Deref;
use std::sync::Arc;

use crate::block::ExecuteArgs;
use crate::error::FrameworkError;
use crate::logging::TestCaseLogger;
use crate::pool::{DependencyPool, PoolValue};

/// Resolves inputs for one unit (a block or a dependency under
/// construction) against the pool, consulting the unit's literal
/// invocation arguments first when it has any.
pub struct Injector<'a> {
    pool: &'a mut DependencyPool,
    requester: &'static str,
    args: Option<&'a ExecuteArgs>,
}

impl<'a> Injector<'a> {
    pub(crate) fn for_block(
        pool: &'a mut DependencyPool,
        block: &'static str,
        args: &'a ExecuteArgs,
    ) -> Self {
        Injector {
            pool,
            requester: block,
            args: Some(args),
        }
    }

    pub(crate) fn for_dependency(pool: &'a mut DependencyPool, dependency: &'static str) -> Self {
        Injector {
            pool,
            requester: dependency,
            args: None,
        }
    }

    /// Required resolution. A missing entry is a resolution failure naming
    /// the missing type and the requesting unit.
    pub fn resolve<T: Any + Send + Sync>(&mut self) -> anyhow::Result<Arc<T>> {
        match self.try_resolve::<T>()? {
            Some(value) => Ok(value),
            None => Err(FrameworkError::MissingDependency {
                type_name: type_name::<T>(),
                requester: self.requester.to_string(),
            }
            .into()),
        }
    }

    /// Optional resolution: `Ok(None)` when no entry exists for the type.
    /// Errors raised by a binding or factory builder still propagate.
    pub fn try_resolve<T: Any + Send + Sync>(&mut self) -> anyhow::Result<Option<Arc<T>>> {
        let key = TypeId::of::<T>();
        if let Some(args) = self.args {
            if let Some(value) = args.lookup(key) {
                return downcast::<T>(value).map(Some);
            }
        }
        match self.pool.resolve_entry(key)? {
            Some(value) => downcast::<T>(value).map(Some),
            None => Ok(None),
        }
    }

    /// Required resolution that clones the value out of its shared handle.
    /// The way to resolve trait-object registrations (`T = Arc<dyn Trait>`).
    pub fn resolve_cloned<T: Any + Send + Sync + Clone>(&mut self) -> anyhow::Result<T> {
        self.resolve::<T>().map(|value| (*value).clone())
    }

    /// The logger capability. Absence is never a resolution failure.
    pub fn logger(&self) -> Option<Arc<dyn TestCaseLogger>> {
        self.pool.logger()
    }
}

fn downcast<T: Any + Send + Sync>(value: PoolValue) -> anyhow::Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| {
        FrameworkError::EntryTypeMismatch {
            expected: type_name::<T>(),
        }
        .into()
    })
}

/// One argument-injection extractor: how a single parameter of a block's
/// execution call obtains its value.
pub trait BlockArg: Sized + Send + 'static {
    fn resolve(injector: &mut Injector<'_>) -> anyhow::Result<Self>;

    /// The dependency type this extractor asks for, for input observation.
    fn describe() -> &'static str;
}

/// A required dependency of concrete type `T`, held as a shared handle.
pub struct Dep<T>(pub Arc<T>);

impl<T> Deref for Dep<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Clone for Dep<T> {
    fn clone(&self) -> Self {
        Dep(self.0.clone())
    }
}

impl<T: Any + Send + Sync> BlockArg for Dep<T> {
    fn resolve(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
        injector.resolve::<T>().map(Dep)
    }

    fn describe() -> &'static str {
        type_name::<T>()
    }
}

/// A required trait-object dependency, registered under `Arc<dyn Trait>`.
pub struct DynDep<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> Deref for DynDep<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> Clone for DynDep<T> {
    fn clone(&self) -> Self {
        DynDep(self.0.clone())
    }
}

impl<T: ?Sized + Send + Sync + 'static> BlockArg for DynDep<T> {
    fn resolve(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
        injector.resolve_cloned::<Arc<T>>().map(DynDep)
    }

    fn describe() -> &'static str {
        type_name::<Arc<T>>()
    }
}

/// The optional logger capability; resolves to `None` rather than failing.
pub struct Log(pub Option<Arc<dyn TestCaseLogger>>);

impl BlockArg for Log {
    fn resolve(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(Log(injector.logger()))
    }

    fn describe() -> &'static str {
        "logger"
    }
}

/// The full argument tuple of a block's execution call. Always a tuple,
/// `()` for argument-less blocks and `(A,)` for a single argument.
pub trait BlockArgs: Sized + Send + 'static {
    fn resolve(injector: &mut Injector<'_>) -> anyhow::Result<Self>;

    /// Rendered list of the argument types, for input observation.
    fn describe() -> String;
}

impl BlockArgs for () {
    fn resolve(_: &mut Injector<'_>) -> anyhow::Result<Self> {
        Ok(())
    }

    fn describe() -> String {
        String::new()
    }
}

macro_rules! impl_block_args {
    ($($arg:ident),+) => {
        impl<$($arg: BlockArg),+> BlockArgs for ($($arg,)+) {
            fn resolve(injector: &mut Injector<'_>) -> anyhow::Result<Self> {
                Ok(($($arg::resolve(injector)?,)+))
            }

            fn describe() -> String {
                [$($arg::describe()),+].join(", ")
            }
        }
    };
}

impl_block_args!(A1);
impl_block_args!(A1, A2);
impl_block_args!(A1, A2, A3);
impl_block_args!(A1, A2, A3, A4);
impl_block_args!(A1, A2, A3, A4, A5);
impl_block_args!(A1, A2, A3, A4, A5, A6);
impl_block_args!(A1, A2, A3, A4, A5, A6, A7);
impl_block_args!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_args_shadow_pool_entries() {
        let mut pool = DependencyPool::new();
        pool.register_instance(1u32);
        let args = ExecuteArgs::new().arg(9u32);
        let mut injector = Injector::for_block(&mut pool, "block", &args);
        assert_eq!(*injector.resolve::<u32>().unwrap(), 9);
    }

    #[test]
    fn missing_dependency_names_type_and_requester() {
        let mut pool = DependencyPool::new();
        let err = Injector::for_dependency(&mut pool, "some_block")
            .resolve::<u32>()
            .unwrap_err();
        let framework = err.downcast_ref::<FrameworkError>().unwrap();
        assert!(matches!(
            framework,
            FrameworkError::MissingDependency { type_name: "u32", requester } if requester == "some_block"
        ));
    }

    #[test]
    fn logger_absence_is_observed_not_raised() {
        let mut pool = DependencyPool::new();
        let mut injector = Injector::for_dependency(&mut pool, "block");
        let Log(logger) = Log::resolve(&mut injector).unwrap();
        assert!(logger.is_none());
    }

    #[test]
    fn tuple_resolution_preserves_order() {
        let mut pool = DependencyPool::new();
        pool.register_instance("text".to_string());
        pool.register_instance(4u32);
        let args = ExecuteArgs::new();
        let mut injector = Injector::for_block(&mut pool, "block", &args);
        let (text, count): (Dep<String>, Dep<u32>) =
            BlockArgs::resolve(&mut injector).unwrap();
        assert_eq!(*text, "text");
        assert_eq!(*count, 4);
    }
}
