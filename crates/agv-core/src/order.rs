//! Transport orders and their legs.

use rustc_hash::FxHashMap;

/// Operations the kernel itself interprets.  Everything else (load, unload,
/// charge, …) is passed through to the location's allowed-operation sets.
pub mod ops {
    /// Move to a point without performing an operation there.
    pub const MOVE: &str = "MOVE";
    /// Park at a point.
    pub const PARK: &str = "PARK";
    /// The universal no-op; implicitly allowed at every location link.
    pub const NOP: &str = "NOP";
}

/// One leg's target: a destination resource (point or location, by name) and
/// the operation to perform there.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destination {
    /// Name of the destination point or location.
    pub dest: String,
    pub operation: String,
}

impl Destination {
    pub fn new(dest: impl Into<String>, operation: impl Into<String>) -> Self {
        Self { dest: dest.into(), operation: operation.into() }
    }
}

/// One leg of a transport order.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveOrder {
    pub destination: Destination,
}

impl DriveOrder {
    pub fn new(destination: Destination) -> Self {
        Self { destination }
    }
}

/// A transport order: an ordered list of drive orders plus free-form
/// properties (the kernel reads the resources-to-avoid key, see
/// [`properties`](crate::properties)).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransportOrder {
    pub name: String,
    pub drive_orders: Vec<DriveOrder>,
    pub properties: FxHashMap<String, String>,
}

impl TransportOrder {
    pub fn new(name: impl Into<String>, drive_orders: Vec<DriveOrder>) -> Self {
        Self {
            name: name.into(),
            drive_orders,
            properties: FxHashMap::default(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
