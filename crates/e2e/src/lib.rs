//! Fixtures and end-to-end tests for the testforge framework.
//!
//! This crate plays the consumer: `src/` holds fixture dependencies,
//! fixture blocks, and a recording logger, and `tests/` exercises the
//! framework's contract end to end: dependency resolution through every
//! injection point, failure short-circuiting, cleanup guarantees, logger
//! behavior, and output propagation between blocks.

pub mod blocks;
pub mod dependencies;
pub mod logging;

use once_cell::sync::OnceCell;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install the tracing subscriber once for the whole test binary.
/// Controlled by `RUST_LOG` as usual.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
