//! `agv-scheduling` — mutually-exclusive, deadlock-avoiding allocation of
//! plant resources.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`scheduler`]   | `Scheduler` (worker-loop front end), `RequestId`      |
//! | [`reservation`] | `ReservationPool`, `ReservationEntry`                 |
//! | [`predictor`]   | `DeadlockPredictor` trait, `NoopDeadlockPredictor`    |
//! | [`client`]      | `ResourceClient` trait, `AllocationFailure`           |
//! | [`expansion`]   | `ResourceExpander` trait (block expansion boundary)   |
//! | [`error`]       | `SchedulingError`, `SchedulingResult<T>`              |
//!
//! # Concurrency model
//!
//! All reservation state lives on one dedicated worker thread fed by a
//! command channel.  "Check everything, then grant everything" is atomic
//! because the worker processes one command at a time; the release-driven
//! wake cascade is likewise naturally serialized.  See [`Scheduler`] for
//! details.

pub mod client;
pub mod error;
pub mod expansion;
pub mod predictor;
pub mod reservation;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use client::{AllocationFailure, ResourceClient};
pub use error::{SchedulingError, SchedulingResult};
pub use expansion::{IdentityExpander, ResourceExpander};
pub use predictor::{DeadlockPredictor, NoopDeadlockPredictor};
pub use reservation::{ReservationEntry, ReservationPool};
pub use scheduler::{AllocateNowOutcome, RequestId, Scheduler};
