// ── Core error types ──
//
// Sampling itself never fails: counter reads default to zero and an
// implausible delta is carried forward, not surfaced (the next tick
// always attempts a fresh computation). Errors exist only at the
// lifecycle boundary, where the monitor task can be gone.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The monitor's event queue is closed — the task has shut down or
    /// panicked, so events can no longer be delivered.
    #[error("monitor event queue is closed")]
    MonitorClosed,

    /// Joining the monitor task failed.
    #[error("monitor task failed: {0}")]
    TaskFailed(String),
}
