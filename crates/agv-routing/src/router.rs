//! The orchestrating router: routability checks and multi-leg route search.

use std::sync::Arc;

use agv_core::{ops, Destination, PlantModel, Point, TransportOrder, Vehicle, INFINITE_COSTS};

use crate::avoidance::ResourcesToAvoid;
use crate::config::RoutingConfig;
use crate::error::{RoutingError, RoutingResult};
use crate::evaluator::EdgeEvaluator;
use crate::point_router::PointRouter;
use crate::provider::PointRouterProvider;
use crate::route::Route;

/// Computes multi-leg routes across a transport order's drive orders and
/// answers fleet-wide routability questions.
///
/// Holds no per-request state; everything but the provider's router cache is
/// recomputed per call.
pub struct Router {
    model: Arc<PlantModel>,
    provider: PointRouterProvider,
    config: RoutingConfig,
}

impl Router {
    pub fn new(
        model: Arc<PlantModel>,
        evaluator: Arc<dyn EdgeEvaluator>,
        config: RoutingConfig,
    ) -> Self {
        let provider = PointRouterProvider::new(Arc::clone(&model), evaluator, config.clone());
        Self { model, provider, config }
    }

    /// The underlying router cache — exposed for topology invalidation and
    /// direct point-router access.
    #[inline]
    pub fn provider(&self) -> &PointRouterProvider {
        &self.provider
    }

    // ── Routability ───────────────────────────────────────────────────────

    /// Every vehicle whose routing group can process `order`: a chain of
    /// finite-cost legs must exist starting at one of the first drive
    /// order's destination candidates and passing candidates of every
    /// subsequent drive order.
    ///
    /// Errors if a drive-order destination names an unknown object.
    pub fn check_routability(&self, order: &TransportOrder) -> RoutingResult<Vec<Arc<Vehicle>>> {
        let legs = self.destination_candidates_per_leg(order)?;
        let routers = self.provider.point_routers_by_vehicle_group();

        #[cfg(not(feature = "parallel"))]
        let admissible_groups: Vec<String> = routers
            .iter()
            .filter(|(_, router)| chain_exists(router, &legs))
            .map(|(group, _)| group.clone())
            .collect();

        #[cfg(feature = "parallel")]
        let admissible_groups: Vec<String> = {
            use rayon::prelude::*;
            routers
                .par_iter()
                .filter(|(_, router)| chain_exists(router, &legs))
                .map(|(group, _)| group.clone())
                .collect()
        };

        let mut vehicles: Vec<Arc<Vehicle>> = self
            .model
            .vehicles()
            .filter(|v| admissible_groups.iter().any(|g| g == v.routing_group()))
            .cloned()
            .collect();
        vehicles.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Ok(vehicles)
    }

    /// Whether `order` is routable for *some* hypothetical vehicle,
    /// ignoring locked paths and per-vehicle cost policy (see
    /// [`PointRouterProvider::general_point_router`]).
    pub fn check_general_routability(&self, order: &TransportOrder) -> RoutingResult<bool> {
        let legs = self.destination_candidates_per_leg(order)?;
        let router = self.provider.general_point_router(Some(order));
        Ok(chain_exists(&router, &legs))
    }

    // ── Route computation ─────────────────────────────────────────────────

    /// The cheapest concatenation of per-leg routes across `order`'s drive
    /// orders, starting at `source_point`.
    ///
    /// Returns one route list (one [`Route`] per drive order) inside the
    /// outer set, or an empty set if no combination is feasible.  At most
    /// `max_route_count` (clamped by the configured route-computation
    /// limit) route lists are computed; the cheapest always comes first.
    pub fn get_routes(
        &self,
        vehicle: &Vehicle,
        source_point: &str,
        order: &TransportOrder,
        max_route_count: usize,
    ) -> RoutingResult<Vec<Vec<Route>>> {
        let limit = self.effective_limit(max_route_count);
        let source = self.model.require_point(source_point)?;
        let legs = self.destination_candidates_per_leg(order)?;
        if legs.iter().any(Vec::is_empty) {
            return Ok(vec![]);
        }

        let router = self.provider.point_router_for_vehicle(vehicle, Some(order));
        match self.cheapest_chain(&router, &source, &legs) {
            Some((_, routes)) => Ok(std::iter::once(routes).take(limit).collect()),
            None => Ok(vec![]),
        }
    }

    /// The cheapest single-leg route between two points honoring an explicit
    /// avoidance set.
    ///
    /// `source == destination` yields one route containing a single
    /// zero-cost, path-less step — not an empty route.  Returns an empty set
    /// if the destination is unreachable.
    pub fn get_routes_between(
        &self,
        vehicle: &Vehicle,
        source: &str,
        destination: &str,
        avoid: &ResourcesToAvoid,
        max_route_count: usize,
    ) -> RoutingResult<Vec<Route>> {
        let limit = self.effective_limit(max_route_count);
        let source = self.model.require_point(source)?;
        let destination = self.model.require_point(destination)?;

        if source == destination {
            return Ok(vec![Route::trivial(source)]);
        }

        let router = self
            .provider
            .point_router_for_vehicle_with_avoidance(vehicle, avoid);
        match router.route_steps(&source.name, &destination.name) {
            Some(steps) => Ok(std::iter::once(Route::new(steps)).take(limit).collect()),
            None => Ok(vec![]),
        }
    }

    // ── Destination candidates ────────────────────────────────────────────

    fn destination_candidates_per_leg(
        &self,
        order: &TransportOrder,
    ) -> RoutingResult<Vec<Vec<Arc<Point>>>> {
        order
            .drive_orders
            .iter()
            .map(|d| self.destination_candidates(&d.destination))
            .collect()
    }

    /// The points a drive order may end at.
    ///
    /// A point referent with a `MOVE`/`PARK` operation is its own single
    /// candidate.  A location referent contributes every linked point whose
    /// link allows the operation: explicitly, implicitly because the
    /// operation is [`ops::NOP`], or via the location type when the link
    /// itself declares no restricted operations.  A name that is neither a
    /// point nor a location is a hard error.
    fn destination_candidates(&self, destination: &Destination) -> RoutingResult<Vec<Arc<Point>>> {
        let name = destination.dest.as_str();
        let operation = destination.operation.as_str();

        if let Some(point) = self.model.point(name) {
            return Ok(if operation == ops::MOVE || operation == ops::PARK {
                vec![point]
            } else {
                vec![]
            });
        }

        if let Some(location) = self.model.location(name) {
            let location_type = self.model.require_location_type(&location.type_name)?;
            let mut candidates = Vec::new();
            for link in &location.links {
                let allowed = link.allowed_operations.contains(operation)
                    || operation == ops::NOP
                    || (link.allowed_operations.is_empty()
                        && location_type.allowed_operations.contains(operation));
                if allowed {
                    candidates.push(self.model.require_point(&link.point)?);
                }
            }
            return Ok(candidates);
        }

        Err(RoutingError::UnknownDestination(name.to_owned()))
    }

    // ── Cheapest-chain search ─────────────────────────────────────────────

    /// Recursive backtracking over each leg's candidate set; depth is
    /// bounded by the drive-order count.  First-found minimum wins on ties.
    fn cheapest_chain(
        &self,
        router: &PointRouter,
        current: &Arc<Point>,
        legs: &[Vec<Arc<Point>>],
    ) -> Option<(u64, Vec<Route>)> {
        let Some((leg, rest)) = legs.split_first() else {
            return Some((0, vec![]));
        };

        // Skip-the-move shortcut: when enabled and the current point is
        // itself an acceptable candidate, do not consider moving elsewhere
        // for this leg.
        let shortcut = !self.config.route_to_current_position && leg.contains(current);
        let candidates: &[Arc<Point>] =
            if shortcut { std::slice::from_ref(current) } else { leg };

        let mut best: Option<(u64, Vec<Route>)> = None;
        for candidate in candidates {
            let leg_route = if candidate == current {
                Route::trivial(Arc::clone(current))
            } else {
                match router.route_steps(&current.name, &candidate.name) {
                    Some(steps) => Route::new(steps),
                    None => continue,
                }
            };

            if let Some((rest_cost, rest_routes)) = self.cheapest_chain(router, candidate, rest) {
                let total = leg_route.cost().saturating_add(rest_cost);
                if best.as_ref().is_none_or(|(b, _)| total < *b) {
                    let mut routes = Vec::with_capacity(rest_routes.len() + 1);
                    routes.push(leg_route);
                    routes.extend(rest_routes);
                    best = Some((total, routes));
                }
            }
        }
        best
    }

    fn effective_limit(&self, max_route_count: usize) -> usize {
        max_route_count
            .max(1)
            .min(self.config.route_computation_limit.max(1))
    }
}

/// Whether some candidate of the first leg starts a chain of finite-cost
/// legs through candidates of every subsequent leg.  An order with no drive
/// orders is trivially routable.
fn chain_exists(router: &PointRouter, legs: &[Vec<Arc<Point>>]) -> bool {
    let Some((first, rest)) = legs.split_first() else {
        return true;
    };
    first.iter().any(|start| chain_from(router, start, rest))
}

fn chain_from(router: &PointRouter, start: &Arc<Point>, legs: &[Vec<Arc<Point>>]) -> bool {
    let Some((leg, rest)) = legs.split_first() else {
        return true;
    };
    leg.iter().any(|candidate| {
        router.cost(&start.name, &candidate.name) != INFINITE_COSTS
            && chain_from(router, candidate, rest)
    })
}
