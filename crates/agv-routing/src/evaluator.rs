//! Edge evaluators — pluggable per-edge cost functions.
//!
//! # Pluggability
//!
//! The graph builder weighs every candidate edge through the
//! [`EdgeEvaluator`] trait, so deployments can tune routing without touching
//! the planner core: combine the built-in evaluators in an
//! [`EdgeEvaluatorComposite`], or implement the trait for custom policies
//! (congestion feedback, energy models, …).
//!
//! # Lifecycle
//!
//! `on_computation_start` / `on_computation_end` bracket one full
//! graph-weighting pass for one vehicle.  Stateful evaluators use them to
//! batch-fetch cost hints once per pass instead of once per edge.

use tracing::warn;

use agv_core::properties::{ROUTING_COST_FORWARD_KEY_PREFIX, ROUTING_COST_REVERSE_KEY_PREFIX};
use agv_core::{Vehicle, INFINITE_WEIGHT};

use crate::graph::EdgeCandidate;

// ── EdgeEvaluator trait ───────────────────────────────────────────────────────

/// Pluggable per-edge cost function.
///
/// # Contract
///
/// `weight` returns a finite value ≥ 0, or
/// [`INFINITE_WEIGHT`](agv_core::INFINITE_WEIGHT) for "this edge must not be
/// used".  Implementations must be `Send + Sync`; one evaluator instance is
/// shared by all graph builds.
pub trait EdgeEvaluator: Send + Sync {
    /// Called exactly once before a full graph-weighting pass for `vehicle`.
    fn on_computation_start(&self, _vehicle: &Vehicle) {}

    /// Weight of one directional path traversal for `vehicle`.
    fn weight(&self, candidate: &EdgeCandidate<'_>, vehicle: &Vehicle) -> f64;

    /// Called exactly once after a full graph-weighting pass for `vehicle`.
    fn on_computation_end(&self, _vehicle: &Vehicle) {}
}

// ── Composite ─────────────────────────────────────────────────────────────────

/// Sums the weights of an ordered list of component evaluators.
///
/// An empty composite weighs every edge 0.  Lifecycle hooks are forwarded to
/// every component in list order.
#[derive(Default)]
pub struct EdgeEvaluatorComposite {
    components: Vec<Box<dyn EdgeEvaluator>>,
}

impl EdgeEvaluatorComposite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: Box<dyn EdgeEvaluator>) -> Self {
        self.components.push(component);
        self
    }

    pub fn add(&mut self, component: Box<dyn EdgeEvaluator>) {
        self.components.push(component);
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl EdgeEvaluator for EdgeEvaluatorComposite {
    fn on_computation_start(&self, vehicle: &Vehicle) {
        for component in &self.components {
            component.on_computation_start(vehicle);
        }
    }

    fn weight(&self, candidate: &EdgeCandidate<'_>, vehicle: &Vehicle) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight(candidate, vehicle))
            .sum()
    }

    fn on_computation_end(&self, vehicle: &Vehicle) {
        for component in &self.components {
            component.on_computation_end(vehicle);
        }
    }
}

// ── Travel time ───────────────────────────────────────────────────────────────

/// Weighs an edge by its expected travel time in seconds: path length
/// divided by the maximum velocity applicable to the traversal direction.
/// A direction with velocity 0 weighs [`INFINITE_WEIGHT`].
pub struct EdgeEvaluatorTravelTime;

impl EdgeEvaluator for EdgeEvaluatorTravelTime {
    fn weight(&self, candidate: &EdgeCandidate<'_>, _vehicle: &Vehicle) -> f64 {
        let velocity = if candidate.reversed {
            candidate.path.max_reverse_velocity
        } else {
            candidate.path.max_velocity
        };
        if velocity == 0 {
            INFINITE_WEIGHT
        } else {
            candidate.path.length as f64 / velocity as f64
        }
    }
}

// ── Explicit properties ───────────────────────────────────────────────────────

/// Weighs an edge by an explicit cost property on the path, keyed by the
/// requesting vehicle's routing group and the traversal direction.
///
/// Paths without the property (or with an unparseable value) weigh
/// [`INFINITE_WEIGHT`] — plants using explicit costs are expected to tag
/// every routable path.
pub struct EdgeEvaluatorExplicitProperties;

impl EdgeEvaluator for EdgeEvaluatorExplicitProperties {
    fn weight(&self, candidate: &EdgeCandidate<'_>, vehicle: &Vehicle) -> f64 {
        let prefix = if candidate.reversed {
            ROUTING_COST_REVERSE_KEY_PREFIX
        } else {
            ROUTING_COST_FORWARD_KEY_PREFIX
        };
        let key = format!("{}{}", prefix, vehicle.routing_group());
        match candidate.path.property(&key).map(str::parse::<f64>) {
            Some(Ok(value)) if value >= 0.0 => value,
            Some(_) => {
                warn!(
                    path = %candidate.path.name,
                    %key,
                    "unparseable routing cost property, treating edge as unusable"
                );
                INFINITE_WEIGHT
            }
            None => INFINITE_WEIGHT,
        }
    }
}

// ── Hops ──────────────────────────────────────────────────────────────────────

/// Weighs every edge 1.  Used by the general point router so reachability
/// answers do not depend on velocity or cost tuning.
pub struct EdgeEvaluatorHops;

impl EdgeEvaluator for EdgeEvaluatorHops {
    fn weight(&self, _candidate: &EdgeCandidate<'_>, _vehicle: &Vehicle) -> f64 {
        1.0
    }
}
