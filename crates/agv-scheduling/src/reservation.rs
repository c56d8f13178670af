//! The reservation pool — who holds which resource, and how many times.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::warn;

use agv_core::ResourceRef;

// ── ReservationEntry ──────────────────────────────────────────────────────────

/// Ownership record for one resource.
///
/// Invariant: `count > 0` iff `user` is set.  Reservations are reentrant —
/// a user re-reserving a resource it already holds increments the counter,
/// and the resource stays held until the counter returns to 0.
#[derive(Clone, Debug, Default)]
pub struct ReservationEntry {
    user: Option<String>,
    count: u32,
}

impl ReservationEntry {
    #[inline]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.user.is_none()
    }

    #[inline]
    pub fn is_held_by(&self, client_id: &str) -> bool {
        self.user.as_deref() == Some(client_id)
    }
}

// ── ReservationPool ───────────────────────────────────────────────────────────

/// One [`ReservationEntry`] per resource ever referenced.
///
/// Entries are created on first reference and live until [`clear`](Self::clear);
/// a released resource keeps its (free) entry.  All mutation happens on the
/// scheduler's worker thread, so this type needs no internal locking.
#[derive(Default)]
pub struct ReservationPool {
    entries: FxHashMap<ResourceRef, ReservationEntry>,
}

impl ReservationPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `resource`, if it has ever been referenced.
    pub fn entry(&self, resource: &ResourceRef) -> Option<&ReservationEntry> {
        self.entries.get(resource)
    }

    /// Whether every resource in `resources` is free or already held by
    /// `client_id` — the availability half of allocation admissibility.
    pub fn is_available_for<'a>(
        &self,
        client_id: &str,
        resources: impl IntoIterator<Item = &'a ResourceRef>,
    ) -> bool {
        resources.into_iter().all(|r| {
            self.entries
                .get(r)
                .is_none_or(|e| e.is_free() || e.is_held_by(client_id))
        })
    }

    /// Reserve every resource in `resources` for `client_id`, incrementing
    /// counters for resources already held.
    ///
    /// Callers check [`is_available_for`](Self::is_available_for) first; in
    /// debug builds reserving someone else's resource panics.
    pub fn reserve<'a>(
        &mut self,
        client_id: &str,
        resources: impl IntoIterator<Item = &'a ResourceRef>,
    ) {
        for resource in resources {
            let entry = self.entries.entry(resource.clone()).or_default();
            debug_assert!(
                entry.is_free() || entry.is_held_by(client_id),
                "reserving {resource} over a foreign reservation"
            );
            entry.user = Some(client_id.to_owned());
            entry.count += 1;
        }
    }

    /// Decrement the reservation counter of every resource in `resources`
    /// that `client_id` actually holds; a counter reaching 0 releases
    /// ownership.
    ///
    /// Resources not held by the caller are left untouched and returned so
    /// the caller can flag the misuse.
    pub fn release<'a>(
        &mut self,
        client_id: &str,
        resources: impl IntoIterator<Item = &'a ResourceRef>,
    ) -> Vec<ResourceRef> {
        let mut not_held = Vec::new();
        for resource in resources {
            match self.entries.get_mut(resource) {
                Some(entry) if entry.is_held_by(client_id) => {
                    entry.count -= 1;
                    if entry.count == 0 {
                        entry.user = None;
                    }
                }
                _ => {
                    warn!(client = client_id, %resource, "freeing a resource not held");
                    not_held.push(resource.clone());
                }
            }
        }
        not_held
    }

    /// Every resource currently held by `client_id`.
    pub fn resources_held_by(&self, client_id: &str) -> BTreeSet<ResourceRef> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_held_by(client_id))
            .map(|(r, _)| r.clone())
            .collect()
    }

    /// A consistent snapshot of current ownership: user id → held resources.
    pub fn snapshot(&self) -> FxHashMap<String, BTreeSet<ResourceRef>> {
        let mut map: FxHashMap<String, BTreeSet<ResourceRef>> = FxHashMap::default();
        for (resource, entry) in &self.entries {
            if let Some(user) = entry.user() {
                map.entry(user.to_owned()).or_default().insert(resource.clone());
            }
        }
        map
    }

    /// Drop every entry (scheduler reinitialization).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
