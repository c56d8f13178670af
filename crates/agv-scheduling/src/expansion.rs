//! Block expansion — the plant model's mutual-exclusion closure.
//!
//! The scheduler never reserves a raw resource set: every request is first
//! expanded so that resources belonging to a mutual-exclusion block drag the
//! whole block along.  Expansion is an external collaborator from the
//! scheduler's point of view, so it enters through a trait.

use std::collections::BTreeSet;

use agv_core::{PlantModel, ResourceRef};

/// Expands a resource set to its mutual-exclusion closure.
pub trait ResourceExpander: Send + Sync {
    fn expand(&self, resources: &[ResourceRef]) -> BTreeSet<ResourceRef>;
}

impl ResourceExpander for PlantModel {
    fn expand(&self, resources: &[ResourceRef]) -> BTreeSet<ResourceRef> {
        self.expand_resources(resources)
    }
}

/// No blocks: every resource stands for itself.  Useful for tests and for
/// plants without mutual-exclusion areas.
pub struct IdentityExpander;

impl ResourceExpander for IdentityExpander {
    fn expand(&self, resources: &[ResourceRef]) -> BTreeSet<ResourceRef> {
        resources.iter().cloned().collect()
    }
}
