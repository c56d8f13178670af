//! Routes and their steps.

use std::sync::Arc;

use agv_core::{Path, Point, ResourceRef};

// ── Orientation ───────────────────────────────────────────────────────────────

/// The direction a vehicle traverses a step's path in.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Forward,
    Backward,
    /// No path is traversed (e.g. the trivial stay-where-you-are step).
    Undefined,
}

// ── Step ──────────────────────────────────────────────────────────────────────

/// One movement of a route: traverse `path` from `source` to `destination`.
///
/// `path` is `None` only for the trivial step of a source-equals-destination
/// route.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub path: Option<Arc<Path>>,
    pub source: Arc<Point>,
    pub destination: Arc<Point>,
    pub orientation: Orientation,
    /// Position of this step in its route, starting at 0.
    pub index: usize,
    pub cost: u64,
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.source == other.source
            && self.destination == other.destination
            && self.orientation == other.orientation
            && self.index == other.index
            && self.cost == other.cost
    }
}

impl Eq for Step {}

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered sequence of steps with their summed cost.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    steps: Vec<Step>,
    cost: u64,
}

impl Route {
    /// A route over the given steps; cost is the saturating sum of the
    /// steps' costs.
    pub fn new(steps: Vec<Step>) -> Self {
        let cost = steps.iter().fold(0u64, |acc, s| acc.saturating_add(s.cost));
        Self { steps, cost }
    }

    /// The stay-where-you-are route: one zero-cost, path-less step at
    /// `point`.
    pub fn trivial(point: Arc<Point>) -> Self {
        Self::new(vec![Step {
            path: None,
            source: Arc::clone(&point),
            destination: point,
            orientation: Orientation::Undefined,
            index: 0,
            cost: 0,
        }])
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// The point this route ends at.
    ///
    /// Routes always contain at least one step (see [`trivial`](Self::trivial)).
    pub fn final_destination(&self) -> &Arc<Point> {
        &self.steps.last().expect("route has no steps").destination
    }

    /// The ordered resource sets this route occupies, one set per step:
    /// the traversed path (if any) plus the step's destination point.
    /// This is the claim shape the scheduler expects.
    pub fn resource_sequence(&self) -> Vec<Vec<ResourceRef>> {
        self.steps
            .iter()
            .map(|step| {
                let mut resources = Vec::with_capacity(2);
                if let Some(path) = &step.path {
                    resources.push(ResourceRef::path(&path.name));
                }
                resources.push(ResourceRef::point(&step.destination.name));
                resources
            })
            .collect()
    }
}
