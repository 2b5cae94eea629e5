//! Proximity index of forming groups.
//!
//! The registry maps each forming group to its cached centroid so the
//! lifecycle pass can find groups close enough to ignite together. It is a
//! cache, not the source of truth for membership: entries are added when a
//! group forms, refreshed after every tick's merges, and removed when the
//! group ignites, merges away, or dissipates. It also hands out group
//! handles, which are never reused within a run.

use std::collections::BTreeMap;

use nebula_grid::Torus;
use nebula_types::{GroupId, Position};

/// Group handle allocator and centroid cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRegistry {
    /// Cached centroid per registered group.
    centers: BTreeMap<GroupId, Position>,
    /// Raw value of the next handle to hand out.
    next_id: u64,
}

impl GroupRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            centers: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Reserve a fresh group handle.
    pub const fn allocate_id(&mut self) -> GroupId {
        let id = GroupId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Register `id` at `center`, replacing any previous entry.
    pub fn insert(&mut self, id: GroupId, center: Position) {
        self.centers.insert(id, center);
    }

    /// Update the centroid of a registered group. Returns `false` (and
    /// registers nothing) if `id` is unknown.
    pub fn refresh(&mut self, id: GroupId, center: Position) -> bool {
        match self.centers.get_mut(&id) {
            Some(slot) => {
                *slot = center;
                true
            }
            None => false,
        }
    }

    /// Drop `id`, returning its last cached centroid.
    pub fn remove(&mut self, id: GroupId) -> Option<Position> {
        self.centers.remove(&id)
    }

    /// Cached centroid of `id`.
    pub fn center(&self, id: GroupId) -> Option<Position> {
        self.centers.get(&id).copied()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: GroupId) -> bool {
        self.centers.contains_key(&id)
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Whether no group is registered.
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Registered groups in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, Position)> + '_ {
        self.centers.iter().map(|(id, center)| (*id, *center))
    }

    /// Registered groups other than `id` whose centroid lies strictly
    /// closer than `max_distance` to the centroid of `id`, measured along
    /// the shortest wrapped path. Empty if `id` is not registered.
    pub fn within(&self, torus: Torus, id: GroupId, max_distance: f64) -> Vec<GroupId> {
        let Some(origin) = self.center(id) else {
            return Vec::new();
        };
        self.centers
            .iter()
            .filter(|(other, center)| {
                **other != id && torus.distance(origin, **center) < max_distance
            })
            .map(|(other, _)| *other)
            .collect()
    }
}
