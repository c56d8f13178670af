//! smallplant — end-to-end demo of the AGV control kernel.
//!
//! Builds a four-point plant (A→B→C→D one-way, A↔D bidirectional), routes a
//! two-leg transport order for two vehicles, then drives both vehicle
//! controllers through stepwise resource allocation.  Both vehicles start at
//! point A, so the second one visibly queues on the scheduler until the
//! first has cleared the shared resources.
//!
//! Run with `RUST_LOG=debug` to watch router-cache builds, grants, and the
//! wake cascade.

use std::sync::Arc;
use std::thread;

use anyhow::{ensure, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agv_core::{
    ops, Destination, DriveOrder, Path, PlantModelBuilder, Point, ResourceRef, TransportOrder,
    Vehicle,
};
use agv_routing::{EdgeEvaluatorComposite, EdgeEvaluatorTravelTime, Route, Router, RoutingConfig};
use agv_scheduling::{
    AllocationFailure, NoopDeadlockPredictor, ResourceClient, ResourceExpander, Scheduler,
};

// ── Vehicle controller ────────────────────────────────────────────────────────

/// Minimal resource user: forwards grants to the driving thread.
struct Controller {
    name: String,
    grants: Sender<Vec<ResourceRef>>,
}

impl Controller {
    fn new(name: &str) -> (Arc<Self>, Receiver<Vec<ResourceRef>>) {
        let (grants, granted) = unbounded();
        (Arc::new(Self { name: name.to_owned(), grants }), granted)
    }
}

impl ResourceClient for Controller {
    fn id(&self) -> &str {
        &self.name
    }

    fn allocation_granted(&self, resources: &[ResourceRef]) -> bool {
        self.grants.send(resources.to_vec()).is_ok()
    }

    fn allocation_failed(&self, resources: &[ResourceRef], reason: AllocationFailure) {
        tracing::warn!(controller = %self.name, ?resources, ?reason, "allocation failed");
    }
}

// ── Plant ─────────────────────────────────────────────────────────────────────

fn build_model() -> Result<Arc<agv_core::PlantModel>> {
    let mut builder = PlantModelBuilder::new();
    for name in ["A", "B", "C", "D"] {
        builder.add_point(Point::new(name));
    }
    // One-way chain A→B→C→D at 1 m/s, plus a bidirectional shortcut A↔D.
    builder
        .add_path(Path::new("A--B", "A", "B", 1000))
        .add_path(Path::new("B--C", "B", "C", 1000))
        .add_path(Path::new("C--D", "C", "D", 1000))
        .add_path(Path::new("A--D", "A", "D", 1000).with_max_reverse_velocity(1000))
        .add_vehicle(Vehicle::new("agv-1"))
        .add_vehicle(Vehicle::new("agv-2"));
    Ok(Arc::new(builder.build()?))
}

// ── Drive loop ────────────────────────────────────────────────────────────────

/// Walk one vehicle along its routes: claim the full resource sequence,
/// allocate each step's resources (blocking until granted), free the
/// previous position once advanced.
fn drive(
    scheduler: &Scheduler,
    controller: Arc<Controller>,
    granted: Receiver<Vec<ResourceRef>>,
    start: &str,
    routes: &[Route],
) -> Result<()> {
    let name = controller.name.clone();
    let claim: Vec<Vec<ResourceRef>> =
        routes.iter().flat_map(Route::resource_sequence).collect();
    scheduler.set_route(&name, claim.clone())?;

    // Occupy the start point; both vehicles start at A, so one of them
    // queues right here.
    let client: Arc<dyn ResourceClient> = controller;
    scheduler.allocate(Arc::clone(&client), vec![ResourceRef::point(start)])?;
    let mut held = granted.recv().context("scheduler gone")?;
    info!(vehicle = %name, point = start, "in position");

    for (passed, step_resources) in claim.iter().enumerate() {
        scheduler.allocate(Arc::clone(&client), step_resources.clone())?;
        let next = granted.recv().context("scheduler gone")?;
        scheduler.free(&name, held)?;
        held = next;
        scheduler.set_route_index(&name, passed + 1)?;
        info!(vehicle = %name, resources = ?held, "advanced");
    }

    scheduler.free(&name, held)?;
    info!(vehicle = %name, "order complete");
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let model = build_model()?;

    let evaluator =
        EdgeEvaluatorComposite::new().with_component(Box::new(EdgeEvaluatorTravelTime));
    let router = Router::new(
        Arc::clone(&model),
        Arc::new(evaluator),
        RoutingConfig::default(),
    );

    let order = TransportOrder::new("tour", vec![
        DriveOrder::new(Destination::new("B", ops::MOVE)),
        DriveOrder::new(Destination::new("D", ops::MOVE)),
    ]);
    ensure!(
        router.check_general_routability(&order)?,
        "order is not routable in this plant"
    );
    let routable = router.check_routability(&order)?;
    info!(vehicles = routable.len(), "routability checked");

    let expander: Arc<dyn ResourceExpander> = Arc::clone(&model) as Arc<dyn ResourceExpander>;
    let scheduler = Scheduler::new(expander, Box::new(NoopDeadlockPredictor));

    thread::scope(|scope| -> Result<()> {
        let mut workers = Vec::new();
        for vehicle_name in ["agv-1", "agv-2"] {
            let vehicle = model
                .vehicle(vehicle_name)
                .context("vehicle missing from model")?;
            let route_lists = router.get_routes(&vehicle, "A", &order, 1)?;
            let routes = route_lists
                .into_iter()
                .next()
                .context("no feasible route combination")?;
            let total: u64 = routes.iter().map(Route::cost).sum();
            info!(vehicle = vehicle_name, legs = routes.len(), cost = total, "route planned");

            let (controller, granted) = Controller::new(vehicle_name);
            let scheduler = &scheduler;
            workers.push(scope.spawn(move || drive(scheduler, controller, granted, "A", &routes)));
        }
        for worker in workers {
            worker.join().expect("drive thread panicked")?;
        }
        Ok(())
    })?;

    let allocations = scheduler.allocations()?;
    ensure!(allocations.is_empty(), "resources leaked: {allocations:?}");
    info!("all resources returned");
    Ok(())
}
