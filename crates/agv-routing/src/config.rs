//! Routing configuration.

/// Tuning knobs for the route planner.
///
/// Typically populated from the application's configuration layer and passed
/// to [`Router::new`](crate::Router::new).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingConfig {
    /// Upper bound on the number of routes computed per request.  The
    /// planner produces exactly one (the cheapest) route per request, so
    /// values above 1 currently only widen the permitted range.  Clamped to
    /// ≥ 1 on use.
    pub route_computation_limit: usize,

    /// When `false`, a drive order whose candidate set contains the
    /// vehicle's current point collapses to that point (the skip-the-move
    /// shortcut).  When `true`, a full route to the chosen candidate is
    /// always computed.
    pub route_to_current_position: bool,

    /// When `true`, locked paths contribute no edges to routing graphs.
    pub exclude_locked_paths: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            route_computation_limit: 1,
            route_to_current_position: false,
            exclude_locked_paths: true,
        }
    }
}
