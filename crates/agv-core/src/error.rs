//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they surface plant-model failures.

use std::fmt;

use thiserror::Error;

/// The class of plant-model object a name was expected to reference.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    Point,
    Path,
    Location,
    LocationType,
    Vehicle,
    Block,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::Point => "point",
            ObjectKind::Path => "path",
            ObjectKind::Location => "location",
            ObjectKind::LocationType => "location type",
            ObjectKind::Vehicle => "vehicle",
            ObjectKind::Block => "block",
        };
        f.write_str(s)
    }
}

/// Errors produced by `agv-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced object does not exist in the plant model.
    #[error("unknown {kind} '{name}'")]
    UnknownObject { kind: ObjectKind, name: String },

    /// Two plant objects share a name.  Names are the identity of every
    /// model object and the unit of reservation, so they must be unique
    /// across points, paths, and locations.
    #[error("duplicate object name '{0}'")]
    DuplicateName(String),
}

impl CoreError {
    pub fn unknown(kind: ObjectKind, name: impl Into<String>) -> Self {
        CoreError::UnknownObject { kind, name: name.into() }
    }
}

/// Shorthand result type for all `agv-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
