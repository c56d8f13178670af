//! Scheduling tests.
//!
//! Scheduler tests drive the worker thread through the public handle.  The
//! command channel processes in order, so a synchronous round-trip
//! ([`Scheduler::allocations`]) after a batch of asynchronous commands
//! guarantees they have been handled — no sleeps, no polling.

mod helpers {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use agv_core::ResourceRef;

    use crate::client::{AllocationFailure, ResourceClient};
    use crate::expansion::IdentityExpander;
    use crate::predictor::NoopDeadlockPredictor;
    use crate::scheduler::Scheduler;

    /// A client that records every callback.
    pub struct RecordingClient {
        id: String,
        accept_grants: AtomicBool,
        pub granted: Mutex<Vec<Vec<ResourceRef>>>,
        pub failed: Mutex<Vec<(Vec<ResourceRef>, AllocationFailure)>>,
    }

    impl RecordingClient {
        pub fn new(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_owned(),
                accept_grants: AtomicBool::new(true),
                granted: Mutex::new(Vec::new()),
                failed: Mutex::new(Vec::new()),
            })
        }

        /// Make the next grants be rejected by the callback.
        pub fn reject_grants(&self) {
            self.accept_grants.store(false, Ordering::SeqCst);
        }

        pub fn grant_count(&self) -> usize {
            self.granted.lock().unwrap().len()
        }

        pub fn failures(&self) -> Vec<AllocationFailure> {
            self.failed.lock().unwrap().iter().map(|(_, r)| *r).collect()
        }
    }

    impl ResourceClient for RecordingClient {
        fn id(&self) -> &str {
            &self.id
        }

        fn allocation_granted(&self, resources: &[ResourceRef]) -> bool {
            self.granted.lock().unwrap().push(resources.to_vec());
            self.accept_grants.load(Ordering::SeqCst)
        }

        fn allocation_failed(&self, resources: &[ResourceRef], reason: AllocationFailure) {
            self.failed.lock().unwrap().push((resources.to_vec(), reason));
        }
    }

    /// A scheduler without blocks or deadlock avoidance.
    pub fn plain_scheduler() -> Scheduler {
        Scheduler::new(Arc::new(IdentityExpander), Box::new(NoopDeadlockPredictor))
    }

    pub fn pt(name: &str) -> ResourceRef {
        ResourceRef::point(name)
    }
}

mod reservation {
    use std::collections::BTreeSet;

    use agv_core::ResourceRef;

    use super::helpers::pt;
    use crate::reservation::ReservationPool;

    #[test]
    fn reentrant_reserve_counts_up_and_down() {
        let mut pool = ReservationPool::new();
        let resource = [pt("A")];

        pool.reserve("v1", &resource);
        pool.reserve("v1", &resource);
        assert_eq!(pool.entry(&pt("A")).unwrap().count(), 2);

        pool.release("v1", &resource);
        assert!(pool.entry(&pt("A")).unwrap().is_held_by("v1"));

        pool.release("v1", &resource);
        assert!(pool.entry(&pt("A")).unwrap().is_free());
    }

    #[test]
    fn foreign_release_is_flagged_and_ignored() {
        let mut pool = ReservationPool::new();
        pool.reserve("v1", &[pt("A")]);

        let not_held = pool.release("v2", &[pt("A"), pt("B")]);
        assert_eq!(not_held, vec![pt("A"), pt("B")]);
        assert!(pool.entry(&pt("A")).unwrap().is_held_by("v1"));
    }

    #[test]
    fn availability_spans_the_whole_set() {
        let mut pool = ReservationPool::new();
        pool.reserve("v1", &[pt("A")]);

        // Own resources and untouched ones count as available.
        assert!(pool.is_available_for("v1", &[pt("A"), pt("B")]));
        // A single foreign resource spoils the set.
        assert!(!pool.is_available_for("v2", &[pt("A"), pt("B")]));
        assert!(pool.is_available_for("v2", &[pt("B")]));
    }

    #[test]
    fn snapshot_groups_resources_by_owner() {
        let mut pool = ReservationPool::new();
        pool.reserve("v1", &[pt("A"), pt("B")]);
        pool.reserve("v2", &[pt("C")]);

        let snapshot = pool.snapshot();
        let v1: BTreeSet<ResourceRef> = [pt("A"), pt("B")].into_iter().collect();
        assert_eq!(snapshot.get("v1"), Some(&v1));
        assert_eq!(snapshot.get("v2").map(BTreeSet::len), Some(1));
    }

    #[test]
    fn clear_releases_everything() {
        let mut pool = ReservationPool::new();
        pool.reserve("v1", &[pt("A")]);
        pool.clear();
        assert!(pool.entry(&pt("A")).is_none());
        assert!(pool.snapshot().is_empty());
    }
}

mod expansion {
    use std::sync::Arc;

    use agv_core::{Block, PlantModelBuilder, Point};

    use super::helpers::pt;
    use crate::expansion::{IdentityExpander, ResourceExpander};

    #[test]
    fn identity_passes_resources_through() {
        let expanded = IdentityExpander.expand(&[pt("A"), pt("B")]);
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn plant_model_expands_block_membership() {
        let mut builder = PlantModelBuilder::new();
        builder
            .add_point(Point::new("A"))
            .add_point(Point::new("B"))
            .add_point(Point::new("C"))
            .add_block(Block::new("crossing").with_member("A").with_member("B"));
        let model = Arc::new(builder.build().unwrap());

        let expanded = model.expand(&[pt("A")]);
        assert!(expanded.contains(&pt("A")));
        assert!(expanded.contains(&pt("B")));
        assert!(!expanded.contains(&pt("C")));
    }
}

mod scheduler {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use agv_core::{Block, PlantModelBuilder, Point, ResourceRef};

    use super::helpers::{plain_scheduler, pt, RecordingClient};
    use crate::client::AllocationFailure;
    use crate::error::SchedulingError;
    use crate::expansion::IdentityExpander;
    use crate::predictor::{DeadlockPredictor, NoopDeadlockPredictor};
    use crate::scheduler::Scheduler;

    #[test]
    fn disjoint_requests_are_granted_without_blocking() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");

        scheduler.allocate(v1.clone(), vec![pt("A"), pt("B")]).unwrap();
        scheduler.allocate(v2.clone(), vec![pt("C")]).unwrap();

        let allocations = scheduler.allocations().unwrap();
        assert_eq!(v1.grant_count(), 1);
        assert_eq!(v2.grant_count(), 1);
        assert_eq!(allocations["v1"].len(), 2);
        assert_eq!(allocations["v2"].len(), 1);
    }

    #[test]
    fn overlapping_request_waits_for_free() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();

        scheduler.allocations().unwrap();
        assert_eq!(v1.grant_count(), 1);
        assert_eq!(v2.grant_count(), 0);

        scheduler.free("v1", vec![pt("A")]).unwrap();
        let allocations = scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 1);
        assert!(allocations["v2"].contains(&pt("A")));
    }

    #[test]
    fn reentrant_allocation_needs_matching_frees() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();

        // One free leaves the resource held; the waiter stays parked.
        scheduler.free("v1", vec![pt("A")]).unwrap();
        scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 0);

        scheduler.free("v1", vec![pt("A")]).unwrap();
        scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 1);
    }

    #[test]
    fn allocate_now_grants_partially_and_reports_the_rest() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");

        scheduler.allocate(v1, vec![pt("A")]).unwrap();
        scheduler.allocations().unwrap();

        let outcome = scheduler.allocate_now("v2", vec![pt("A"), pt("B")]).unwrap();
        assert!(!outcome.is_complete());
        assert_eq!(outcome.granted, vec![pt("B")]);
        assert_eq!(outcome.rejected, vec![pt("A")]);

        let allocations = scheduler.allocations().unwrap();
        assert!(allocations["v2"].contains(&pt("B")));
        assert!(!allocations["v2"].contains(&pt("A")));
    }

    #[test]
    fn later_compatible_request_is_granted_immediately() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");
        let v3 = RecordingClient::new("v3");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();
        // v3 does not touch A — no reason to park it behind v2.
        scheduler.allocate(v3.clone(), vec![pt("B")]).unwrap();

        scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 0);
        assert_eq!(v3.grant_count(), 1);
    }

    #[test]
    fn cascade_stops_at_the_first_failed_recheck() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");
        let v3 = RecordingClient::new("v3");

        scheduler.allocate(v1.clone(), vec![pt("A"), pt("B")]).unwrap();
        scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();
        scheduler.allocate(v3.clone(), vec![pt("B")]).unwrap();

        // B is free now, but the cascade re-checks in arrival order and v2
        // (waiting for A) still fails — v3 must keep waiting behind it.
        scheduler.free("v1", vec![pt("B")]).unwrap();
        scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 0);
        assert_eq!(v3.grant_count(), 0);

        // Freeing A lets v2 through, and the cascade carries on to v3.
        scheduler.free("v1", vec![pt("A")]).unwrap();
        scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 1);
        assert_eq!(v3.grant_count(), 1);
    }

    #[test]
    fn rejected_grant_is_freed_and_the_cascade_continues() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");
        let v3 = RecordingClient::new("v3");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        v2.reject_grants();
        scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();
        scheduler.allocate(v3.clone(), vec![pt("A")]).unwrap();

        scheduler.free("v1", vec![pt("A")]).unwrap();
        let allocations = scheduler.allocations().unwrap();

        // v2 was offered the grant, turned it down, and the freed resource
        // went on to v3 in the same cascade.
        assert_eq!(v2.grant_count(), 1);
        assert_eq!(v3.grant_count(), 1);
        assert!(allocations["v3"].contains(&pt("A")));
        assert!(!allocations.contains_key("v2"));
    }

    #[test]
    fn cancel_removes_a_queued_request() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        let queued = scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();

        assert!(scheduler.cancel(queued).unwrap());
        assert_eq!(v2.failures(), vec![AllocationFailure::Cancelled]);

        // The cancelled request never resurfaces.
        scheduler.free("v1", vec![pt("A")]).unwrap();
        let allocations = scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 0);
        assert!(!allocations.contains_key("v2"));
    }

    #[test]
    fn cancel_of_a_granted_request_reports_false() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");

        let granted = scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        scheduler.allocations().unwrap();

        assert!(!scheduler.cancel(granted).unwrap());
        assert!(v1.failures().is_empty());
    }

    #[test]
    fn clear_fails_waiting_requests_and_resets_ownership() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();

        scheduler.clear().unwrap();
        let allocations = scheduler.allocations().unwrap();
        assert!(allocations.is_empty());
        assert_eq!(v2.failures(), vec![AllocationFailure::Cleared]);
    }

    #[test]
    fn shutdown_fails_waiting_requests() {
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");
        {
            let scheduler = plain_scheduler();
            scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
            scheduler.allocate(v2.clone(), vec![pt("A")]).unwrap();
            scheduler.allocations().unwrap();
        }
        assert_eq!(v2.failures(), vec![AllocationFailure::ShutDown]);
    }

    #[test]
    fn claim_and_unclaim_are_capability_mismatches() {
        let scheduler = plain_scheduler();
        let v1 = RecordingClient::new("v1");
        assert!(matches!(
            scheduler.claim(v1.as_ref(), &[]),
            Err(SchedulingError::Unsupported("claim"))
        ));
        assert!(matches!(
            scheduler.unclaim(v1.as_ref()),
            Err(SchedulingError::Unsupported("unclaim"))
        ));
    }

    #[test]
    fn block_expansion_reserves_the_whole_block() {
        let mut builder = PlantModelBuilder::new();
        builder
            .add_point(Point::new("A"))
            .add_point(Point::new("B"))
            .add_block(Block::new("crossing").with_member("A").with_member("B"));
        let model = Arc::new(builder.build().unwrap());

        let scheduler = Scheduler::new(model, Box::new(NoopDeadlockPredictor));
        let v1 = RecordingClient::new("v1");
        let v2 = RecordingClient::new("v2");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        // B is in A's block, so it is taken too.
        scheduler.allocate(v2.clone(), vec![pt("B")]).unwrap();

        let allocations = scheduler.allocations().unwrap();
        assert_eq!(allocations["v1"].len(), 2);
        assert_eq!(v2.grant_count(), 0);

        // Freeing the block releases both members.
        scheduler.free("v1", vec![pt("A"), pt("B")]).unwrap();
        scheduler.allocations().unwrap();
        assert_eq!(v2.grant_count(), 1);
    }

    // ── Deadlock predictor integration ────────────────────────────────────

    /// Admission controlled by a shared flag; records every call.
    struct TogglePredictor {
        admit: Arc<AtomicBool>,
        routes_seen: Arc<Mutex<Vec<(String, usize)>>>,
        system_data_seen: Arc<Mutex<Vec<(String, usize, usize)>>>,
    }

    impl DeadlockPredictor for TogglePredictor {
        fn set_route(&mut self, client_id: &str, sequence: &[Vec<ResourceRef>]) {
            self.routes_seen
                .lock()
                .unwrap()
                .push((client_id.to_owned(), sequence.len()));
        }

        fn configure_system_data(
            &mut self,
            client_id: &str,
            allocated: &BTreeSet<ResourceRef>,
            remaining_claim: &[Vec<ResourceRef>],
        ) {
            self.system_data_seen.lock().unwrap().push((
                client_id.to_owned(),
                allocated.len(),
                remaining_claim.len(),
            ));
        }

        fn is_allocation_admissible(
            &self,
            _client_id: &str,
            _requested: &BTreeSet<ResourceRef>,
        ) -> bool {
            self.admit.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn predictor_veto_parks_a_request_on_free_resources() {
        let admit = Arc::new(AtomicBool::new(false));
        let predictor = TogglePredictor {
            admit: admit.clone(),
            routes_seen: Arc::default(),
            system_data_seen: Arc::default(),
        };
        let scheduler = Scheduler::new(Arc::new(IdentityExpander), Box::new(predictor));
        let v1 = RecordingClient::new("v1");

        scheduler.allocate(v1.clone(), vec![pt("A")]).unwrap();
        scheduler.allocations().unwrap();
        assert_eq!(v1.grant_count(), 0);

        // Once the predictor admits, the next cascade lets the request pass.
        admit.store(true, Ordering::SeqCst);
        scheduler.free("other", vec![]).unwrap();
        let allocations = scheduler.allocations().unwrap();
        assert_eq!(v1.grant_count(), 1);
        assert!(allocations["v1"].contains(&pt("A")));
    }

    #[test]
    fn route_and_progress_reach_the_predictor() {
        let routes_seen = Arc::new(Mutex::new(Vec::new()));
        let system_data_seen = Arc::new(Mutex::new(Vec::new()));
        let predictor = TogglePredictor {
            admit: Arc::new(AtomicBool::new(true)),
            routes_seen: routes_seen.clone(),
            system_data_seen: system_data_seen.clone(),
        };
        let scheduler = Scheduler::new(Arc::new(IdentityExpander), Box::new(predictor));
        let v1 = RecordingClient::new("v1");

        let sequence = vec![vec![pt("A")], vec![pt("B")], vec![pt("C")]];
        scheduler.set_route("v1", sequence).unwrap();
        scheduler.allocate(v1, vec![pt("A")]).unwrap();
        scheduler.set_route_index("v1", 1).unwrap();
        scheduler.allocations().unwrap();

        assert_eq!(routes_seen.lock().unwrap().as_slice(), &[("v1".to_owned(), 3)]);
        let data = system_data_seen.lock().unwrap();
        // set_route: nothing held, full claim; set_route_index 1: one
        // resource held, two sets remaining.
        assert_eq!(data.as_slice(), &[("v1".to_owned(), 0, 3), ("v1".to_owned(), 1, 2)]);
    }
}
