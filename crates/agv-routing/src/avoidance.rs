//! Resource avoidance — resolving "do not route through these" sets.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use tracing::warn;

use agv_core::properties::RESOURCES_TO_AVOID_KEY;
use agv_core::{PlantModel, ResourceRef, TransportOrder};

// ── ResourcesToAvoid ──────────────────────────────────────────────────────────

/// Points and paths excluded from a route computation.
///
/// Ordered name sets so avoidance sets hash and compare deterministically —
/// they are part of the router cache key.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcesToAvoid {
    pub points: BTreeSet<String>,
    pub paths: BTreeSet<String>,
}

impl ResourcesToAvoid {
    /// The shared empty instance.  Extraction returns this (no allocation)
    /// whenever there is nothing to avoid.
    pub fn empty() -> Arc<Self> {
        static EMPTY: OnceLock<Arc<ResourcesToAvoid>> = OnceLock::new();
        Arc::clone(EMPTY.get_or_init(|| Arc::new(ResourcesToAvoid::default())))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.paths.is_empty()
    }

    #[inline]
    pub fn avoids_point(&self, name: &str) -> bool {
        self.points.contains(name)
    }

    #[inline]
    pub fn avoids_path(&self, name: &str) -> bool {
        self.paths.contains(name)
    }
}

// ── Extraction ────────────────────────────────────────────────────────────────

/// Resolve a transport order's resources-to-avoid property into concrete
/// point/path sets.
///
/// The property holds a comma-separated list of resource names; entries are
/// trimmed, empty entries skipped.  No order or no property yields the
/// shared empty instance.
pub fn resources_to_avoid_from_order(
    order: Option<&TransportOrder>,
    model: &PlantModel,
) -> Arc<ResourcesToAvoid> {
    let Some(property) = order.and_then(|o| o.property(RESOURCES_TO_AVOID_KEY)) else {
        return ResourcesToAvoid::empty();
    };

    let mut avoid = ResourcesToAvoid::default();
    for name in property.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        resolve_name(name, model, &mut avoid);
    }
    wrap(avoid)
}

/// Resolve an explicit resource-reference set into concrete point/path sets.
pub fn resources_to_avoid_from_refs(
    refs: &[ResourceRef],
    model: &PlantModel,
) -> Arc<ResourcesToAvoid> {
    let mut avoid = ResourcesToAvoid::default();
    for r in refs {
        resolve_name(&r.name, model, &mut avoid);
    }
    wrap(avoid)
}

/// Per-name resolution rule: a point name is avoided directly, a path name
/// likewise, a location name expands to every point it is linked to.
/// Unknown names are logged and skipped — an avoidance hint must never make
/// an order fail.
fn resolve_name(name: &str, model: &PlantModel, avoid: &mut ResourcesToAvoid) {
    if model.point(name).is_some() {
        avoid.points.insert(name.to_owned());
    } else if model.path(name).is_some() {
        avoid.paths.insert(name.to_owned());
    } else if let Some(location) = model.location(name) {
        for link in &location.links {
            avoid.points.insert(link.point.clone());
        }
    } else {
        warn!(%name, "ignoring unknown resource name in avoidance set");
    }
}

fn wrap(avoid: ResourcesToAvoid) -> Arc<ResourcesToAvoid> {
    if avoid.is_empty() {
        ResourcesToAvoid::empty()
    } else {
        Arc::new(avoid)
    }
}
