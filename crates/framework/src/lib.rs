//! Testforge: a test-orchestration engine.
//!
//! Composes an ordered pipeline of independently-authored test blocks into
//! a single runnable test case, wires data and dependencies between blocks
//! by type, and guarantees cleanup and failure-reporting semantics
//! regardless of where in the pipeline a failure occurs.
//!
//! # Architecture
//!
//! ```text
//! TestBuilder ──build()──▶ TestCase (ordered blocks + seeded pool)
//!                              │ execute()
//!                              ▼
//!                ┌─ for each test block ──────────────────────┐
//!                │  construct ◀──┐                            │
//!                │  inject props ├── Injector ◀── DependencyPool
//!                │  resolve args ◀┘                     ▲     │
//!                │  pre ▶ execute ▶ post                │     │
//!                │  publish output ─────────────────────┘     │
//!                └─ first failure short-circuits ─────────────┘
//!                              ▼
//!                 cleanup blocks (always run, in order)
//!                              ▼
//!                 Passed flag + aggregated TestCaseError
//! ```
//!
//! Execution is single-threaded and sequential by design: later blocks may
//! depend on outputs published by earlier ones, and cleanup ordering
//! guarantees rely on deterministic sequencing. Blocks may suspend
//! internally; the engine awaits each before advancing. One [`TestCase`]
//! represents exactly one execution; sharing an instance across
//! concurrent executions is a caller error the engine does not guard.

pub mod block;
pub mod builder;
pub mod case;
pub mod error;
pub mod injector;
pub mod logging;
pub mod pool;

pub use block::{ExecuteArgs, Injectable, Output, TestBlock};
pub use builder::TestBuilder;
pub use case::{BlockOutcome, BlockPhase, BlockReport, ExecutionReport, RunState, TestCase};
pub use error::{BlockFailure, FrameworkError, Result, TestCaseError};
pub use injector::{BlockArg, BlockArgs, Dep, DynDep, Injector, Log};
pub use logging::{DebugLogger, TestCaseLogger};
