//! The read-only plant model: object lookup and block expansion.
//!
//! The kernel consumes the plant model as an external collaborator — a fast,
//! local, read-only name lookup.  `PlantModel` is that boundary in-process:
//! it owns every object behind an `Arc`, validates referential integrity once
//! at build time, and never changes afterwards.  Topology edits are modelled
//! by building a new `PlantModel` and invalidating the routing caches.

use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{CoreError, CoreResult, ObjectKind};
use crate::model::{Block, Location, LocationType, Path, Point, Vehicle};
use crate::resource::{ResourceKind, ResourceRef};

// ── PlantModel ────────────────────────────────────────────────────────────────

/// An immutable snapshot of the plant.  Construct via [`PlantModelBuilder`].
pub struct PlantModel {
    points: FxHashMap<String, Arc<Point>>,
    paths: FxHashMap<String, Arc<Path>>,
    locations: FxHashMap<String, Arc<Location>>,
    location_types: FxHashMap<String, Arc<LocationType>>,
    vehicles: FxHashMap<String, Arc<Vehicle>>,
    blocks: FxHashMap<String, Arc<Block>>,
    /// Member resource name → blocks it belongs to.  Precomputed so block
    /// expansion is a lookup, not a scan.
    block_membership: FxHashMap<String, Vec<Arc<Block>>>,
}

impl PlantModel {
    // ── Object lookup ─────────────────────────────────────────────────────

    pub fn point(&self, name: &str) -> Option<Arc<Point>> {
        self.points.get(name).cloned()
    }

    pub fn path(&self, name: &str) -> Option<Arc<Path>> {
        self.paths.get(name).cloned()
    }

    pub fn location(&self, name: &str) -> Option<Arc<Location>> {
        self.locations.get(name).cloned()
    }

    pub fn location_type(&self, name: &str) -> Option<Arc<LocationType>> {
        self.location_types.get(name).cloned()
    }

    pub fn vehicle(&self, name: &str) -> Option<Arc<Vehicle>> {
        self.vehicles.get(name).cloned()
    }

    pub fn block(&self, name: &str) -> Option<Arc<Block>> {
        self.blocks.get(name).cloned()
    }

    /// Like [`point`](Self::point) but absence is a hard error — used where
    /// the name was expected to exist (order destinations, link targets).
    pub fn require_point(&self, name: &str) -> CoreResult<Arc<Point>> {
        self.point(name)
            .ok_or_else(|| CoreError::unknown(ObjectKind::Point, name))
    }

    pub fn require_location_type(&self, name: &str) -> CoreResult<Arc<LocationType>> {
        self.location_type(name)
            .ok_or_else(|| CoreError::unknown(ObjectKind::LocationType, name))
    }

    // ── Bulk accessors ────────────────────────────────────────────────────

    pub fn points(&self) -> impl Iterator<Item = &Arc<Point>> {
        self.points.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Arc<Path>> {
        self.paths.values()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Arc<Vehicle>> {
        self.vehicles.values()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    // ── Block expansion ───────────────────────────────────────────────────

    /// Expand a resource set to its block closure: any resource belonging to
    /// a mutual-exclusion block is replaced by the whole block.
    ///
    /// Resources outside every block pass through unchanged.  Expansion is a
    /// single pass, matching the semantics of block membership (blocks are
    /// flat equivalence classes, not nested).
    pub fn expand_resources(&self, resources: &[ResourceRef]) -> BTreeSet<ResourceRef> {
        let mut expanded: BTreeSet<ResourceRef> = BTreeSet::new();
        for resource in resources {
            expanded.insert(resource.clone());
            if let Some(blocks) = self.block_membership.get(&resource.name) {
                for block in blocks {
                    for member in &block.members {
                        expanded.insert(self.resource_ref_for(member));
                    }
                }
            }
        }
        expanded
    }

    /// Build a typed resource ref for a member name, falling back to a point
    /// ref for names not in the model (block validation makes that case
    /// unreachable for built models).
    fn resource_ref_for(&self, name: &str) -> ResourceRef {
        let kind = if self.points.contains_key(name) {
            ResourceKind::Point
        } else if self.paths.contains_key(name) {
            ResourceKind::Path
        } else {
            ResourceKind::Location
        };
        ResourceRef { kind, name: name.to_owned() }
    }
}

// ── PlantModelBuilder ─────────────────────────────────────────────────────────

/// Accumulates plant objects, then validates and freezes them into a
/// [`PlantModel`].
///
/// # Validation
///
/// `build()` rejects:
/// - duplicate names across points, paths, and locations (resource names are
///   the unit of reservation and must be unique plant-wide);
/// - paths whose endpoints are not points of the model;
/// - locations whose type or link points are missing;
/// - blocks whose members are not points, paths, or locations of the model.
#[derive(Default)]
pub struct PlantModelBuilder {
    points: Vec<Point>,
    paths: Vec<Path>,
    locations: Vec<Location>,
    location_types: Vec<LocationType>,
    vehicles: Vec<Vehicle>,
    blocks: Vec<Block>,
}

impl PlantModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Point) -> &mut Self {
        self.points.push(point);
        self
    }

    pub fn add_path(&mut self, path: Path) -> &mut Self {
        self.paths.push(path);
        self
    }

    pub fn add_location(&mut self, location: Location) -> &mut Self {
        self.locations.push(location);
        self
    }

    pub fn add_location_type(&mut self, location_type: LocationType) -> &mut Self {
        self.location_types.push(location_type);
        self
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> &mut Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn add_block(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Validate referential integrity and freeze the model.
    pub fn build(self) -> CoreResult<PlantModel> {
        let mut resource_names: BTreeSet<&str> = BTreeSet::new();
        for name in self
            .points
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.paths.iter().map(|p| p.name.as_str()))
            .chain(self.locations.iter().map(|l| l.name.as_str()))
        {
            if !resource_names.insert(name) {
                return Err(CoreError::DuplicateName(name.to_owned()));
            }
        }

        let points: FxHashMap<String, Arc<Point>> = self
            .points
            .into_iter()
            .map(|p| (p.name.clone(), Arc::new(p)))
            .collect();
        let location_types: FxHashMap<String, Arc<LocationType>> = self
            .location_types
            .into_iter()
            .map(|t| (t.name.clone(), Arc::new(t)))
            .collect();

        for path in &self.paths {
            for endpoint in [&path.source, &path.destination] {
                if !points.contains_key(endpoint) {
                    return Err(CoreError::unknown(ObjectKind::Point, endpoint));
                }
            }
        }
        let paths: FxHashMap<String, Arc<Path>> = self
            .paths
            .into_iter()
            .map(|p| (p.name.clone(), Arc::new(p)))
            .collect();

        for location in &self.locations {
            if !location_types.contains_key(&location.type_name) {
                return Err(CoreError::unknown(
                    ObjectKind::LocationType,
                    &location.type_name,
                ));
            }
            for link in &location.links {
                if !points.contains_key(&link.point) {
                    return Err(CoreError::unknown(ObjectKind::Point, &link.point));
                }
            }
        }
        let locations: FxHashMap<String, Arc<Location>> = self
            .locations
            .into_iter()
            .map(|l| (l.name.clone(), Arc::new(l)))
            .collect();

        let vehicles: FxHashMap<String, Arc<Vehicle>> = self
            .vehicles
            .into_iter()
            .map(|v| (v.name.clone(), Arc::new(v)))
            .collect();

        for block in &self.blocks {
            for member in &block.members {
                let known = points.contains_key(member)
                    || paths.contains_key(member)
                    || locations.contains_key(member);
                if !known {
                    return Err(CoreError::unknown(ObjectKind::Block, member));
                }
            }
        }
        let blocks: FxHashMap<String, Arc<Block>> = self
            .blocks
            .into_iter()
            .map(|b| (b.name.clone(), Arc::new(b)))
            .collect();

        let mut block_membership: FxHashMap<String, Vec<Arc<Block>>> = FxHashMap::default();
        for block in blocks.values() {
            for member in &block.members {
                block_membership
                    .entry(member.clone())
                    .or_default()
                    .push(Arc::clone(block));
            }
        }

        Ok(PlantModel {
            points,
            paths,
            locations,
            location_types,
            vehicles,
            blocks,
            block_membership,
        })
    }
}
