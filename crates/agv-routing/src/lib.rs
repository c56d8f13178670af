//! `agv-routing` — plant graph construction, edge evaluation, and route
//! planning.
//!
//! # Crate layout
//!
//! | Module           | Contents                                             |
//! |------------------|------------------------------------------------------|
//! | [`graph`]        | `PlantGraph` (CSR snapshot), `EdgeCandidate`         |
//! | [`evaluator`]    | `EdgeEvaluator` trait + composite/travel-time/…      |
//! | [`route`]        | `Route`, `Step`, `Orientation`                       |
//! | [`point_router`] | `PointRouter` (Dijkstra over one snapshot)           |
//! | [`avoidance`]    | `ResourcesToAvoid` + extraction                      |
//! | [`provider`]     | `PointRouterProvider` (per-group router cache)       |
//! | [`router`]       | `Router` (multi-leg orchestration, routability)      |
//! | [`config`]       | `RoutingConfig`                                      |
//! | [`error`]        | `RoutingError`, `RoutingResult<T>`                   |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Fleet-wide routability checks run on Rayon.              |
//! | `serde`    | Derives `Serialize`/`Deserialize` on public types.       |

pub mod avoidance;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod point_router;
pub mod provider;
pub mod route;
pub mod router;


pub use avoidance::{
    resources_to_avoid_from_order, resources_to_avoid_from_refs, ResourcesToAvoid,
};
pub use config::RoutingConfig;
pub use error::{RoutingError, RoutingResult};
pub use evaluator::{
    EdgeEvaluator, EdgeEvaluatorComposite, EdgeEvaluatorExplicitProperties, EdgeEvaluatorHops,
    EdgeEvaluatorTravelTime,
};
pub use graph::{EdgeCandidate, PlantGraph};
pub use point_router::PointRouter;
pub use provider::PointRouterProvider;
pub use route::{Orientation, Route, Step};
pub use router::Router;
