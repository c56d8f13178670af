//! `agv-core` — foundational types for the AGV control kernel.
//!
//! This crate is a dependency of every other `agv-*` crate.  It intentionally
//! has no `agv-*` dependencies and minimal external ones (only `rustc-hash`,
//! `thiserror`, and `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`model`]      | `Point`, `Path`, `Location`, `Vehicle`, `Block`, …     |
//! | [`resource`]   | `ResourceRef`, `ResourceKind`                          |
//! | [`order`]      | `TransportOrder`, `DriveOrder`, `Destination`, `ops`   |
//! | [`plant`]      | `PlantModel` (read-only lookup + block expansion)      |
//! | [`properties`] | Well-known property key constants                      |
//! | [`cost`]       | `INFINITE_COSTS`, weight→cost conversion               |
//! | [`error`]      | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.         |

pub mod cost;
pub mod error;
pub mod model;
pub mod order;
pub mod plant;
pub mod properties;
pub mod resource;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cost::{weight_to_cost, INFINITE_COSTS, INFINITE_WEIGHT};
pub use error::{CoreError, CoreResult, ObjectKind};
pub use model::{Block, Link, Location, LocationType, Path, Point, Position, Vehicle};
pub use order::{ops, Destination, DriveOrder, TransportOrder};
pub use plant::{PlantModel, PlantModelBuilder};
pub use resource::{ResourceKind, ResourceRef};
