//! Routing-subsystem error type.
//!
//! "No route" is never an error here — unreachable pairs are reported as
//! [`INFINITE_COSTS`](agv_core::INFINITE_COSTS) / `None` / empty result sets.
//! Errors mark illegal inputs: names that do not exist in the plant model
//! where they were required to.

use thiserror::Error;

use agv_core::CoreError;

/// Errors produced by `agv-routing`.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A drive order's destination names neither a point nor a location of
    /// the plant model.
    #[error("unknown destination '{0}'")]
    UnknownDestination(String),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
