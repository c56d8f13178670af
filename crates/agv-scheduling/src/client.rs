//! The resource-user side of the scheduler contract.

use agv_core::ResourceRef;

/// Why a queued allocation request was not served.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AllocationFailure {
    /// The request was cancelled via
    /// [`Scheduler::cancel`](crate::Scheduler::cancel).
    Cancelled,
    /// The scheduler was reinitialized while the request was queued.
    Cleared,
    /// The scheduler shut down while the request was queued.
    ShutDown,
}

/// A resource user — typically one vehicle controller.
///
/// Callbacks run on the scheduler's worker thread and must return promptly;
/// a callback that blocks stalls every other client.
pub trait ResourceClient: Send + Sync {
    /// Stable identifier.  Reservation ownership is keyed by this, so two
    /// client values with the same id are the same user.
    fn id(&self) -> &str;

    /// A queued allocation was granted.  `resources` is the full expanded
    /// set now held.
    ///
    /// Return `false` to reject the grant — e.g. the transport order was
    /// withdrawn while the request was queued.  Rejected resources are
    /// freed again immediately.
    fn allocation_granted(&self, resources: &[ResourceRef]) -> bool;

    /// A queued allocation will never be granted.  `resources` is the
    /// originally requested (unexpanded) set.
    fn allocation_failed(&self, resources: &[ResourceRef], reason: AllocationFailure);
}
