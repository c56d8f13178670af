//! Plant model objects.
//!
//! All objects are identified by name: `Eq`/`Hash` compare the name only, so
//! two snapshots of the same plant object are interchangeable as map keys.
//! The kernel never mutates model objects — they are built once, wrapped in
//! `Arc` by [`PlantModel`](crate::plant::PlantModel), and referenced
//! read-only from graph snapshots and reservation tables.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;

use crate::properties::ROUTING_GROUP_KEY;

/// Implement name-identity `PartialEq`/`Eq`/`Hash` for a model type.
macro_rules! name_identity {
    ($name:ident) => {
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.name == other.name
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.name.hash(state);
            }
        }
    };
}

// ── Position ──────────────────────────────────────────────────────────────────

/// A 3D position in millimetres.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

// ── Point ─────────────────────────────────────────────────────────────────────

/// A named vertex of the plant with a 3D pose.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub name: String,
    pub position: Position,
}

impl Point {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), position: Position::default() }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

name_identity!(Point);

// ── Path ──────────────────────────────────────────────────────────────────────

/// A named edge between two points.
///
/// A path is traversable forwards iff `max_velocity > 0` and in reverse iff
/// `max_reverse_velocity > 0`; a freshly constructed path is one-way forward.
/// Properties carry per-routing-group cost overrides (see
/// [`properties`](crate::properties)).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub name: String,
    /// Name of the source point.
    pub source: String,
    /// Name of the destination point.
    pub destination: String,
    /// Length in millimetres.  Always ≥ 1.
    pub length: u64,
    /// Maximum forward velocity in mm/s.  0 ⇒ not traversable forwards.
    pub max_velocity: u32,
    /// Maximum reverse velocity in mm/s.  0 ⇒ not traversable in reverse.
    pub max_reverse_velocity: u32,
    /// Locked paths may be excluded from routing (configurable).
    pub locked: bool,
    pub properties: FxHashMap<String, String>,
}

impl Path {
    /// A one-way forward path with a default velocity of 1000 mm/s.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        length: u64,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            destination: destination.into(),
            length: length.max(1),
            max_velocity: 1000,
            max_reverse_velocity: 0,
            locked: false,
            properties: FxHashMap::default(),
        }
    }

    pub fn with_max_velocity(mut self, mm_per_sec: u32) -> Self {
        self.max_velocity = mm_per_sec;
        self
    }

    pub fn with_max_reverse_velocity(mut self, mm_per_sec: u32) -> Self {
        self.max_reverse_velocity = mm_per_sec;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    #[inline]
    pub fn is_traversable_forward(&self) -> bool {
        self.max_velocity > 0
    }

    #[inline]
    pub fn is_traversable_reverse(&self) -> bool {
        self.max_reverse_velocity > 0
    }
}

name_identity!(Path);

// ── Location, LocationType, Link ──────────────────────────────────────────────

/// A link attaching a [`Location`] to a [`Point`].
///
/// An empty `allowed_operations` set means the link does not restrict
/// operations itself; the location type's allowed operations apply instead.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    /// Name of the linked point.
    pub point: String,
    pub allowed_operations: BTreeSet<String>,
}

impl Link {
    pub fn new(point: impl Into<String>) -> Self {
        Self { point: point.into(), allowed_operations: BTreeSet::new() }
    }

    pub fn with_allowed_operation(mut self, operation: impl Into<String>) -> Self {
        self.allowed_operations.insert(operation.into());
        self
    }
}

/// A named location attached to one or more points.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub name: String,
    /// Name of this location's [`LocationType`].
    pub type_name: String,
    pub links: Vec<Link>,
}

impl Location {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into(), links: Vec::new() }
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }
}

name_identity!(Location);

/// A location type with the operations its locations support.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationType {
    pub name: String,
    pub allowed_operations: BTreeSet<String>,
}

impl LocationType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), allowed_operations: BTreeSet::new() }
    }

    pub fn with_allowed_operation(mut self, operation: impl Into<String>) -> Self {
        self.allowed_operations.insert(operation.into());
        self
    }
}

name_identity!(LocationType);

// ── Vehicle ───────────────────────────────────────────────────────────────────

/// A vehicle known to the plant.
///
/// The kernel only reads the routing-group property; everything else about a
/// vehicle (adapter state, energy level, …) belongs to outer layers.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    pub name: String,
    pub properties: FxHashMap<String, String>,
}

impl Vehicle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), properties: FxHashMap::default() }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The vehicle's routing group; vehicles without the property share the
    /// default group `""`.
    #[inline]
    pub fn routing_group(&self) -> &str {
        self.properties
            .get(ROUTING_GROUP_KEY)
            .map(String::as_str)
            .unwrap_or("")
    }
}

name_identity!(Vehicle);

// ── Block ─────────────────────────────────────────────────────────────────────

/// A mutual-exclusion block: reserving any member implies reserving all of
/// them.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub name: String,
    /// Names of the member resources.
    pub members: BTreeSet<String>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: BTreeSet::new() }
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.members.insert(member.into());
        self
    }
}

name_identity!(Block);
