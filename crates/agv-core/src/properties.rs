//! Well-known property keys.
//!
//! Plant objects and transport orders carry free-form string properties;
//! these are the keys the kernel itself interprets.

/// Vehicle property selecting its routing group.  Vehicles without this
/// property belong to the default group `""`.
pub const ROUTING_GROUP_KEY: &str = "agv:routingGroup";

/// Path property prefix for an explicit forward-direction routing cost.
/// The routing group name is appended verbatim, so the default group reads
/// the bare prefix.
pub const ROUTING_COST_FORWARD_KEY_PREFIX: &str = "agv:routingCostForward";

/// Path property prefix for an explicit reverse-direction routing cost.
pub const ROUTING_COST_REVERSE_KEY_PREFIX: &str = "agv:routingCostReverse";

/// Transport order property holding a comma-separated list of resource names
/// the order's routes must avoid.
pub const RESOURCES_TO_AVOID_KEY: &str = "agv:resourcesToAvoid";
