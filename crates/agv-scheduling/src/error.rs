//! Scheduling-subsystem error type.
//!
//! Allocation *failure* is not an error here — it is reported per resource
//! through [`AllocateNowOutcome`](crate::AllocateNowOutcome) or the
//! [`ResourceClient`](crate::ResourceClient) callbacks, and the caller
//! decides whether to retry, abandon, or escalate.  Errors mark API misuse
//! or a dead scheduler.

use thiserror::Error;

/// Errors produced by `agv-scheduling`.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// The operation is not implemented by this scheduler variant — a
    /// capability mismatch, not a transient condition.
    #[error("operation '{0}' is not supported by this scheduler")]
    Unsupported(&'static str),

    /// The worker thread is gone; no further requests can be served.
    #[error("scheduler is shut down")]
    ShutDown,
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
