// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::{Entity, EntityId, LayerId};

/// A change notification drained via [`CanonicalStore::take_changes`].
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ChangeEvent {
    Added(EntityId),
    Removed(EntityId),
    Modified(EntityId),
    Reordered,
    Cleared,
}

/// The canonical object store.
///
/// Holds exactly one authoritative instance per entity. Insertion order
/// doubles as the global z-order; the renderer applies a stable secondary
/// sort by layer on top of it.
#[derive(Default, Debug)]
pub struct CanonicalStore {
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    reversed: RefCell<Option<Vec<EntityId>>>,
    changes: Vec<ChangeEvent>,
    revision: u64,
}

impl CanonicalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        CanonicalStore::default()
    }

    fn touch(&mut self, event: ChangeEvent) {
        self.revision += 1;
        self.reversed.replace(None);
        self.changes.push(event);
    }

    /// A counter bumped on every mutation.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drains accumulated change events.
    pub fn take_changes(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.changes)
    }

    /// The number of entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when the store holds no entities.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Appends an entity on top of the z-order.
    pub fn add(&mut self, entity: Entity) {
        let id = entity.id.clone();
        if self.entities.insert(id.clone(), entity).is_none() {
            self.order.push(id.clone());
        }
        self.touch(ChangeEvent::Added(id));
    }

    /// Inserts an entity at the specified z-index, clamped to `[0, len]`.
    pub fn add_at(&mut self, entity: Entity, index: usize) {
        let id = entity.id.clone();
        if self.entities.insert(id.clone(), entity).is_none() {
            let index = index.min(self.order.len());
            self.order.insert(index, id.clone());
        }
        self.touch(ChangeEvent::Added(id));
    }

    /// Removes an entity. Removing a missing id is a no-op.
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.order.retain(|e| e != id);
        self.touch(ChangeEvent::Removed(id.clone()));
        Some(entity)
    }

    /// Removes every entity.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.order.clear();
        self.touch(ChangeEvent::Cleared);
    }

    /// Returns an entity by id.
    #[inline]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Returns a mutable entity by id, recording a modification.
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        if self.entities.contains_key(id) {
            self.touch(ChangeEvent::Modified(id.clone()));
        }
        self.entities.get_mut(id)
    }

    /// Checks that an entity exists.
    #[inline]
    pub fn has(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Iterates entities in z-order, bottom to top.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().map(move |id| &self.entities[id])
    }

    /// Entity ids in reverse z-order, top to bottom. Cached between writes.
    pub fn all_reversed(&self) -> Vec<EntityId> {
        if self.reversed.borrow().is_none() {
            let mut ids = self.order.clone();
            ids.reverse();
            self.reversed.replace(Some(ids));
        }

        self.reversed.borrow().as_ref().cloned().unwrap_or_default()
    }

    /// Entities on the specified layer, in z-order.
    pub fn by_layer(&self, layer_id: &LayerId) -> Vec<&Entity> {
        self.all().filter(|e| &e.layer_id == layer_id).collect()
    }

    /// Entities with their own visibility flag set, in z-order.
    ///
    /// Layer visibility is applied by [`Scene`](crate::Scene).
    pub fn visible(&self) -> impl Iterator<Item = &Entity> {
        self.all().filter(|e| e.visible)
    }

    /// The z-index of an entity.
    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.order.iter().position(|e| e == id)
    }

    /// Swaps the entity with its upper neighbor.
    pub fn bring_forward(&mut self, id: &EntityId) {
        if let Some(i) = self.index_of(id) {
            if i + 1 < self.order.len() {
                self.order.swap(i, i + 1);
                self.touch(ChangeEvent::Reordered);
            }
        }
    }

    /// Swaps the entity with its lower neighbor.
    pub fn send_backward(&mut self, id: &EntityId) {
        if let Some(i) = self.index_of(id) {
            if i > 0 {
                self.order.swap(i, i - 1);
                self.touch(ChangeEvent::Reordered);
            }
        }
    }

    /// Moves the entity to the top of the z-order.
    pub fn bring_to_front(&mut self, id: &EntityId) {
        if let Some(i) = self.index_of(id) {
            let id = self.order.remove(i);
            self.order.push(id);
            self.touch(ChangeEvent::Reordered);
        }
    }

    /// Moves the entity to the bottom of the z-order.
    pub fn send_to_back(&mut self, id: &EntityId) {
        if let Some(i) = self.index_of(id) {
            let id = self.order.remove(i);
            self.order.insert(0, id);
            self.touch(ChangeEvent::Reordered);
        }
    }

    /// Places the entity at an absolute z-index, clamped to the valid range.
    pub fn set_z_index(&mut self, id: &EntityId, index: usize) {
        if let Some(i) = self.index_of(id) {
            let id = self.order.remove(i);
            let index = index.min(self.order.len());
            self.order.insert(index, id);
            self.touch(ChangeEvent::Reordered);
        }
    }
}
