//! Tracing and logging setup shared by every checkout binary and test suite.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::{init_for_tests, init_with_default};
