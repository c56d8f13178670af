//! The scheduler — one worker thread serializing all resource usage.
//!
//! # Why a worker loop
//!
//! Allocation admissibility is a property of the *whole* reservation table:
//! "every requested resource free or mine, and the deadlock predictor
//! agrees" must be evaluated and acted on without another allocate or free
//! interleaving.  Instead of guarding the table with a lock and a
//! wait/notify cascade gate, all state lives on one dedicated worker thread
//! fed by a command channel.  The worker processes one command at a time,
//! which makes the check-then-grant atomic and limits the release-driven
//! wake cascade to one at a time structurally.
//!
//! # Waiting and waking
//!
//! A request that cannot be granted is parked in a FIFO queue inside the
//! worker; the calling thread is never blocked.  Every free runs one
//! cascade: the earliest waiter is re-checked, granted and removed on
//! success, and its successor re-checked in turn, until a re-check fails
//! (queue order retained) or the queue empties.
//!
//! The reference behavior has no way out of the queue; [`Scheduler::cancel`]
//! is the documented improvement covering that liveness gap.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use agv_core::ResourceRef;

use crate::client::{AllocationFailure, ResourceClient};
use crate::error::{SchedulingError, SchedulingResult};
use crate::expansion::ResourceExpander;
use crate::predictor::DeadlockPredictor;
use crate::reservation::ReservationPool;

// ── RequestId ─────────────────────────────────────────────────────────────────

/// Handle to a queued allocation request, usable with [`Scheduler::cancel`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

// ── AllocateNowOutcome ────────────────────────────────────────────────────────

/// Per-resource result of [`Scheduler::allocate_now`].
///
/// The synchronous path never blocks and never queues: each resource of the
/// expanded request is either granted on the spot or reported back as
/// rejected.  A partial grant is a legitimate outcome the caller must
/// handle, not an error.
#[derive(Clone, Debug, Default)]
pub struct AllocateNowOutcome {
    /// Resources now (additionally) held by the requester.
    pub granted: Vec<ResourceRef>,
    /// Resources reserved by someone else at the time of the call.
    pub rejected: Vec<ResourceRef>,
}

impl AllocateNowOutcome {
    /// Whether the whole expanded request was granted.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

enum Command {
    SetRoute {
        client_id: String,
        sequence: Vec<Vec<ResourceRef>>,
    },
    SetRouteIndex {
        client_id: String,
        index: usize,
    },
    Allocate {
        id: RequestId,
        client: Arc<dyn ResourceClient>,
        resources: Vec<ResourceRef>,
    },
    AllocateNow {
        client_id: String,
        resources: Vec<ResourceRef>,
        reply: Sender<AllocateNowOutcome>,
    },
    Free {
        client_id: String,
        resources: Vec<ResourceRef>,
    },
    Cancel {
        id: RequestId,
        reply: Sender<bool>,
    },
    Allocations {
        reply: Sender<FxHashMap<String, BTreeSet<ResourceRef>>>,
    },
    Clear,
    Shutdown,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Serializes physical resource usage across all vehicle controllers.
///
/// The handle is `Send + Sync` and cheap to share; every operation posts a
/// command to the worker thread.  Synchronous operations
/// ([`allocate_now`](Self::allocate_now), [`allocations`](Self::allocations),
/// [`cancel`](Self::cancel)) rendezvous with the worker over a reply channel
/// and error with [`SchedulingError::ShutDown`] if the worker is gone.
///
/// Dropping the scheduler shuts the worker down; requests still queued at
/// that point fail with [`AllocationFailure::ShutDown`].
pub struct Scheduler {
    commands: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    next_request: AtomicU64,
}

impl Scheduler {
    /// Start a scheduler with the given block expander and deadlock
    /// predictor.
    pub fn new(
        expander: Arc<dyn ResourceExpander>,
        predictor: Box<dyn DeadlockPredictor>,
    ) -> Self {
        let (commands, receiver) = unbounded();
        let worker = Worker {
            commands: receiver,
            pool: ReservationPool::new(),
            expander,
            predictor,
            queue: VecDeque::new(),
            claims: FxHashMap::default(),
        };
        let handle = std::thread::Builder::new()
            .name("agv-scheduler".to_owned())
            .spawn(move || worker.run())
            .expect("spawning the scheduler worker thread failed");
        Self {
            commands,
            worker: Some(handle),
            next_request: AtomicU64::new(0),
        }
    }

    // ── Claim bookkeeping ─────────────────────────────────────────────────

    /// Register the ordered resource sets `client_id` intends to traverse
    /// with the deadlock predictor.  Allocates nothing.
    pub fn set_route(
        &self,
        client_id: impl Into<String>,
        sequence: Vec<Vec<ResourceRef>>,
    ) -> SchedulingResult<()> {
        self.send(Command::SetRoute { client_id: client_id.into(), sequence })
    }

    /// Inform the deadlock predictor that the first `index` sets of the
    /// previously set route have been passed; the remainder is the user's
    /// outstanding claim.
    pub fn set_route_index(
        &self,
        client_id: impl Into<String>,
        index: usize,
    ) -> SchedulingResult<()> {
        self.send(Command::SetRouteIndex { client_id: client_id.into(), index })
    }

    /// Not implemented by this scheduler variant.
    pub fn claim(
        &self,
        _client: &dyn ResourceClient,
        _resources: &[Vec<ResourceRef>],
    ) -> SchedulingResult<()> {
        Err(SchedulingError::Unsupported("claim"))
    }

    /// Not implemented by this scheduler variant.
    pub fn unclaim(&self, _client: &dyn ResourceClient) -> SchedulingResult<()> {
        Err(SchedulingError::Unsupported("unclaim"))
    }

    // ── Allocation ────────────────────────────────────────────────────────

    /// Request `resources` for `client`, asynchronously.
    ///
    /// The request is expanded, checked, and — if not immediately
    /// admissible — parked in arrival order.  The outcome arrives through
    /// the client's callbacks; the returned [`RequestId`] identifies the
    /// request to [`cancel`](Self::cancel).
    pub fn allocate(
        &self,
        client: Arc<dyn ResourceClient>,
        resources: Vec<ResourceRef>,
    ) -> SchedulingResult<RequestId> {
        let id = RequestId(self.next_request.fetch_add(1, Ordering::Relaxed));
        self.send(Command::Allocate { id, client, resources })?;
        Ok(id)
    }

    /// Synchronous best-effort allocation: every resource of the expanded
    /// request that is free (or already held by the caller) is granted
    /// immediately; the rest are reported as rejected.  Never blocks, never
    /// queues.
    pub fn allocate_now(
        &self,
        client_id: impl Into<String>,
        resources: Vec<ResourceRef>,
    ) -> SchedulingResult<AllocateNowOutcome> {
        let (reply, outcome) = bounded(1);
        self.send(Command::AllocateNow {
            client_id: client_id.into(),
            resources,
            reply,
        })?;
        outcome.recv().map_err(|_| SchedulingError::ShutDown)
    }

    /// Release `resources` held by `client_id` (one reentrant level each).
    /// Resources the caller does not hold are flagged and left untouched.
    /// Triggers one wake cascade.
    pub fn free(
        &self,
        client_id: impl Into<String>,
        resources: Vec<ResourceRef>,
    ) -> SchedulingResult<()> {
        self.send(Command::Free { client_id: client_id.into(), resources })
    }

    /// Withdraw a still-queued allocation request.  Returns whether the
    /// request was found in the queue; its client receives
    /// [`AllocationFailure::Cancelled`].  A request already granted is not
    /// revoked — free the resources instead.
    pub fn cancel(&self, id: RequestId) -> SchedulingResult<bool> {
        let (reply, cancelled) = bounded(1);
        self.send(Command::Cancel { id, reply })?;
        cancelled.recv().map_err(|_| SchedulingError::ShutDown)
    }

    /// A consistent snapshot of current ownership: client id → held
    /// resources.
    pub fn allocations(&self) -> SchedulingResult<FxHashMap<String, BTreeSet<ResourceRef>>> {
        let (reply, snapshot) = bounded(1);
        self.send(Command::Allocations { reply })?;
        snapshot.recv().map_err(|_| SchedulingError::ShutDown)
    }

    /// Reinitialize: drop every reservation and claim; queued requests fail
    /// with [`AllocationFailure::Cleared`].
    pub fn clear(&self) -> SchedulingResult<()> {
        self.send(Command::Clear)
    }

    fn send(&self, command: Command) -> SchedulingResult<()> {
        self.commands
            .send(command)
            .map_err(|_| SchedulingError::ShutDown)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// A queued allocation request, expanded and waiting its turn.
struct PendingRequest {
    id: RequestId,
    client: Arc<dyn ResourceClient>,
    /// As requested by the client — reported back on failure.
    requested: Vec<ResourceRef>,
    /// After block expansion — the set actually reserved.
    expanded: BTreeSet<ResourceRef>,
}

/// A client's registered route and its progress through it.
struct Claim {
    sequence: Vec<Vec<ResourceRef>>,
    index: usize,
}

struct Worker {
    commands: Receiver<Command>,
    pool: ReservationPool,
    expander: Arc<dyn ResourceExpander>,
    predictor: Box<dyn DeadlockPredictor>,
    /// Waiting requests in arrival order.
    queue: VecDeque<PendingRequest>,
    claims: FxHashMap<String, Claim>,
}

impl Worker {
    fn run(mut self) {
        while let Ok(command) = self.commands.recv() {
            match command {
                Command::SetRoute { client_id, sequence } => {
                    self.set_route(client_id, sequence);
                }
                Command::SetRouteIndex { client_id, index } => {
                    self.set_route_index(&client_id, index);
                }
                Command::Allocate { id, client, resources } => {
                    self.allocate(id, client, resources);
                }
                Command::AllocateNow { client_id, resources, reply } => {
                    let _ = reply.send(self.allocate_now(&client_id, &resources));
                }
                Command::Free { client_id, resources } => {
                    self.pool.release(&client_id, &resources);
                    self.cascade();
                }
                Command::Cancel { id, reply } => {
                    let _ = reply.send(self.cancel(id));
                }
                Command::Allocations { reply } => {
                    let _ = reply.send(self.pool.snapshot());
                }
                Command::Clear => self.clear(),
                Command::Shutdown => break,
            }
        }
        self.fail_queue(AllocationFailure::ShutDown);
    }

    // ── Claims ────────────────────────────────────────────────────────────

    fn set_route(&mut self, client_id: String, sequence: Vec<Vec<ResourceRef>>) {
        self.predictor.set_route(&client_id, &sequence);
        let held = self.pool.resources_held_by(&client_id);
        self.predictor.configure_system_data(&client_id, &held, &sequence);
        self.claims.insert(client_id, Claim { sequence, index: 0 });
    }

    fn set_route_index(&mut self, client_id: &str, index: usize) {
        let Some(claim) = self.claims.get_mut(client_id) else {
            warn!(client = client_id, "route index set without a route");
            return;
        };
        claim.index = index.min(claim.sequence.len());
        let remaining = claim.sequence[claim.index..].to_vec();
        let held = self.pool.resources_held_by(client_id);
        self.predictor.configure_system_data(client_id, &held, &remaining);
    }

    // ── Allocation paths ──────────────────────────────────────────────────

    fn allocate(
        &mut self,
        id: RequestId,
        client: Arc<dyn ResourceClient>,
        resources: Vec<ResourceRef>,
    ) {
        let expanded = self.expander.expand(&resources);
        let request = PendingRequest { id, client, requested: resources, expanded };
        if self.is_admissible(&request) {
            self.grant(request);
            self.cascade();
        } else {
            debug!(
                client = request.client.id(),
                %id,
                waiting = self.queue.len() + 1,
                "allocation request parked"
            );
            self.queue.push_back(request);
        }
    }

    fn allocate_now(&mut self, client_id: &str, resources: &[ResourceRef]) -> AllocateNowOutcome {
        let expanded = self.expander.expand(resources);
        let mut outcome = AllocateNowOutcome::default();
        for resource in expanded {
            let available = self
                .pool
                .entry(&resource)
                .is_none_or(|e| e.is_free() || e.is_held_by(client_id));
            if available {
                self.pool.reserve(client_id, std::iter::once(&resource));
                outcome.granted.push(resource);
            } else {
                outcome.rejected.push(resource);
            }
        }
        if !outcome.rejected.is_empty() {
            debug!(
                client = client_id,
                rejected = outcome.rejected.len(),
                "partial immediate allocation"
            );
        }
        outcome
    }

    fn cancel(&mut self, id: RequestId) -> bool {
        let Some(position) = self.queue.iter().position(|r| r.id == id) else {
            return false;
        };
        let request = self
            .queue
            .remove(position)
            .expect("queue position vanished");
        request
            .client
            .allocation_failed(&request.requested, AllocationFailure::Cancelled);
        true
    }

    fn clear(&mut self) {
        self.fail_queue(AllocationFailure::Cleared);
        self.pool.clear();
        self.claims.clear();
        debug!("scheduler reinitialized");
    }

    // ── Admissibility, grants, and the wake cascade ───────────────────────

    /// Every expanded resource free or already the requester's, and the
    /// deadlock predictor approves.  Runs against the whole table with no
    /// interleaving — the worker owns all state.
    fn is_admissible(&self, request: &PendingRequest) -> bool {
        let client_id = request.client.id();
        self.pool.is_available_for(client_id, &request.expanded)
            && self
                .predictor
                .is_allocation_admissible(client_id, &request.expanded)
    }

    /// Reserve the expanded set and notify the client.  A client that no
    /// longer wants the resources (grant callback returns `false`) gets them
    /// taken back immediately.
    fn grant(&mut self, request: PendingRequest) {
        let client_id = request.client.id();
        self.pool.reserve(client_id, &request.expanded);
        debug!(client = client_id, id = %request.id, "allocation granted");

        let resources: Vec<ResourceRef> = request.expanded.iter().cloned().collect();
        if !request.client.allocation_granted(&resources) {
            debug!(client = client_id, id = %request.id, "grant rejected by client, freeing");
            self.pool.release(client_id, &request.expanded);
        }
    }

    /// One wake cascade: re-check the earliest waiter; on success grant it
    /// and move on to its successor.  Stops at the first waiter that fails
    /// its re-check, leaving queue order intact.
    fn cascade(&mut self) {
        while let Some(front) = self.queue.front() {
            if !self.is_admissible(front) {
                break;
            }
            let request = self.queue.pop_front().expect("front vanished");
            self.grant(request);
        }
    }

    fn fail_queue(&mut self, reason: AllocationFailure) {
        for request in self.queue.drain(..) {
            request.client.allocation_failed(&request.requested, reason);
        }
    }
}
