//! Deadlock prediction — the admission-control extension point.

use std::collections::BTreeSet;

use agv_core::ResourceRef;

/// Admission control consulted before every (queued-path) allocation grant.
///
/// The scheduler keeps the predictor informed about each user's intended
/// route and progress; `is_allocation_admissible` then decides whether a
/// grant could steer the system into a deadlock.
///
/// Implementations run on the scheduler's worker thread — `Send` is enough,
/// no internal locking required.
pub trait DeadlockPredictor: Send {
    /// Record the ordered sequence of resource sets `client_id` intends to
    /// traverse.
    fn set_route(&mut self, client_id: &str, sequence: &[Vec<ResourceRef>]);

    /// Update the predictor's view of a user's held resources and remaining
    /// claim.  Called whenever the user's route or progress changes.
    fn configure_system_data(
        &mut self,
        client_id: &str,
        allocated: &BTreeSet<ResourceRef>,
        remaining_claim: &[Vec<ResourceRef>],
    );

    /// Whether granting `requested` (already block-expanded) to `client_id`
    /// is safe.
    fn is_allocation_admissible(
        &self,
        client_id: &str,
        requested: &BTreeSet<ResourceRef>,
    ) -> bool;
}

/// Disables deadlock avoidance: every allocation is admissible.
pub struct NoopDeadlockPredictor;

impl DeadlockPredictor for NoopDeadlockPredictor {
    fn set_route(&mut self, _client_id: &str, _sequence: &[Vec<ResourceRef>]) {}

    fn configure_system_data(
        &mut self,
        _client_id: &str,
        _allocated: &BTreeSet<ResourceRef>,
        _remaining_claim: &[Vec<ResourceRef>],
    ) {
    }

    fn is_allocation_admissible(
        &self,
        _client_id: &str,
        _requested: &BTreeSet<ResourceRef>,
    ) -> bool {
        true
    }
}
