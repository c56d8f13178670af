//! Point-router caching per (routing group, avoidance set).
//!
//! Building a router means weighting the whole plant graph — too expensive
//! to repeat per vehicle when fleets share routing groups.  The provider
//! caches one router per (group, avoidance) combination and drops the whole
//! cache on topology changes: wholesale invalidation keeps the
//! old-or-new-never-partial guarantee trivially true, at the cost of
//! rebuilding on the next query.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use tracing::debug;

use agv_core::{PlantModel, TransportOrder, Vehicle};

use crate::avoidance::{resources_to_avoid_from_order, ResourcesToAvoid};
use crate::config::RoutingConfig;
use crate::evaluator::{EdgeEvaluator, EdgeEvaluatorHops};
use crate::graph::PlantGraph;
use crate::point_router::PointRouter;

// ── Cache key ─────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct RouterKey {
    group: String,
    avoid: ResourcesToAvoid,
}

#[derive(Default)]
struct ProviderCache {
    /// Routers built with the configured evaluator, keyed by
    /// (routing group, avoidance set).
    vehicle_routers: FxHashMap<RouterKey, Arc<PointRouter>>,
    /// Policy-free routers (hops weighting, locks ignored), keyed by
    /// avoidance set only.
    general_routers: FxHashMap<ResourcesToAvoid, Arc<PointRouter>>,
}

// ── PointRouterProvider ───────────────────────────────────────────────────────

/// Caches one [`PointRouter`] per (routing group, avoidance set).
///
/// All cache reads, builds, and invalidations happen under one mutex, so
/// concurrent queries during an invalidation see either the fully-old or the
/// fully-new cache — never a partial rebuild.
pub struct PointRouterProvider {
    model: Arc<PlantModel>,
    evaluator: Arc<dyn EdgeEvaluator>,
    config: RoutingConfig,
    /// Stand-in vehicle for general-router builds; the hops evaluator never
    /// reads it.
    general_probe: Vehicle,
    cache: Mutex<ProviderCache>,
}

impl PointRouterProvider {
    pub fn new(
        model: Arc<PlantModel>,
        evaluator: Arc<dyn EdgeEvaluator>,
        config: RoutingConfig,
    ) -> Self {
        Self {
            model,
            evaluator,
            config,
            general_probe: Vehicle::new(""),
            cache: Mutex::new(ProviderCache::default()),
        }
    }

    /// The router for `vehicle`'s routing group and the avoidance set
    /// derived from `order` (if any), building and caching it on first use.
    pub fn point_router_for_vehicle(
        &self,
        vehicle: &Vehicle,
        order: Option<&TransportOrder>,
    ) -> Arc<PointRouter> {
        let avoid = resources_to_avoid_from_order(order, &self.model);
        self.point_router_for_vehicle_with_avoidance(vehicle, &avoid)
    }

    /// Like [`point_router_for_vehicle`](Self::point_router_for_vehicle),
    /// but with an explicit avoidance set.
    pub fn point_router_for_vehicle_with_avoidance(
        &self,
        vehicle: &Vehicle,
        avoid: &ResourcesToAvoid,
    ) -> Arc<PointRouter> {
        let key = RouterKey {
            group: vehicle.routing_group().to_owned(),
            avoid: avoid.clone(),
        };
        let mut cache = self.cache.lock().expect("router cache poisoned");
        if let Some(router) = cache.vehicle_routers.get(&key) {
            return Arc::clone(router);
        }
        debug!(group = %key.group, "building point router");
        let router = Arc::new(PointRouter::new(self.build_graph(
            vehicle,
            avoid,
            self.evaluator.as_ref(),
            self.config.exclude_locked_paths,
        )));
        cache.vehicle_routers.insert(key, Arc::clone(&router));
        router
    }

    /// A snapshot mapping every routing group currently in use (derived from
    /// the model's vehicles) to its no-avoidance router.  Used for
    /// fleet-wide routability checks.
    pub fn point_routers_by_vehicle_group(&self) -> FxHashMap<String, Arc<PointRouter>> {
        // Name-sorted so the representative vehicle per group is stable.
        let mut vehicles: Vec<_> = self.model.vehicles().collect();
        vehicles.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        let empty = ResourcesToAvoid::empty();
        let mut routers: FxHashMap<String, Arc<PointRouter>> = FxHashMap::default();
        for vehicle in vehicles {
            let group = vehicle.routing_group();
            if !routers.contains_key(group) {
                let router = self.point_router_for_vehicle_with_avoidance(vehicle, &empty);
                routers.insert(group.to_owned(), router);
            }
        }
        routers
    }

    /// A router that ignores locked state, per-group properties, and the
    /// configured evaluators entirely — every edge weighs one hop — honoring
    /// only the avoidance set derived from `order`.  Answers "could any
    /// vehicle ever reach this" independent of current tuning.
    pub fn general_point_router(&self, order: Option<&TransportOrder>) -> Arc<PointRouter> {
        let avoid = resources_to_avoid_from_order(order, &self.model);
        let mut cache = self.cache.lock().expect("router cache poisoned");
        if let Some(router) = cache.general_routers.get(&avoid) {
            return Arc::clone(router);
        }
        debug!("building general point router");
        let router = Arc::new(PointRouter::new(self.build_graph(
            &self.general_probe,
            &avoid,
            &EdgeEvaluatorHops,
            false,
        )));
        cache.general_routers.insert((*avoid).clone(), Arc::clone(&router));
        router
    }

    /// Drop every cached router.  The next query rebuilds from the current
    /// model.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().expect("router cache poisoned");
        cache.vehicle_routers.clear();
        cache.general_routers.clear();
        debug!("point router cache invalidated");
    }

    /// Topology-change notification.  Full invalidation is intentional —
    /// correctness over incremental-update complexity.
    pub fn update_routing_topology(&self) {
        self.invalidate();
    }

    fn build_graph(
        &self,
        vehicle: &Vehicle,
        avoid: &ResourcesToAvoid,
        evaluator: &dyn EdgeEvaluator,
        exclude_locked: bool,
    ) -> PlantGraph {
        let points: Vec<_> = self.model.points().cloned().collect();
        let paths: Vec<_> = self.model.paths().cloned().collect();
        PlantGraph::build(&points, &paths, vehicle, avoid, evaluator, exclude_locked)
    }
}
