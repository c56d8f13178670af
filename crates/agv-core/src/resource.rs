//! Resource references — the unit of exclusive reservation.

use std::fmt;

/// The class of plant object a [`ResourceRef`] points at.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    Point,
    Path,
    Location,
}

/// A by-name reference to a reservable plant resource.
///
/// Resource names are unique plant-wide (enforced by
/// [`PlantModelBuilder`](crate::plant::PlantModelBuilder)), so two refs are
/// the same resource iff they compare equal.  `Ord` gives reservation tables
/// and snapshots a stable iteration order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceRef {
    pub fn point(name: impl Into<String>) -> Self {
        Self { kind: ResourceKind::Point, name: name.into() }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self { kind: ResourceKind::Path, name: name.into() }
    }

    pub fn location(name: impl Into<String>) -> Self {
        Self { kind: ResourceKind::Location, name: name.into() }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ResourceKind::Point => write!(f, "Point({})", self.name),
            ResourceKind::Path => write!(f, "Path({})", self.name),
            ResourceKind::Location => write!(f, "Location({})", self.name),
        }
    }
}
