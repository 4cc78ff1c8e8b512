// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::group::EntityGroupIndex;
use crate::layer::{Layer, LayerTable};
use crate::store::CanonicalStore;
use crate::{Entity, EntityId, IdGen};

/// The scene: canonical store, layer table and group index in one
/// ownership tree.
#[derive(Default, Debug)]
pub struct Scene {
    /// The canonical object store.
    pub store: CanonicalStore,
    /// The layer table.
    pub layers: LayerTable,
    /// The entity/group index.
    pub groups: EntityGroupIndex,
}

impl Scene {
    /// Creates a scene with one default layer.
    pub fn new(ids: &mut IdGen) -> Self {
        let mut scene = Scene::default();
        scene
            .layers
            .insert(Layer::new(ids.next_layer(), "Layer 1"));
        scene
    }

    /// Effective visibility: the entity's own flag and its layer's.
    pub fn effective_visible(&self, entity: &Entity) -> bool {
        entity.visible
            && self
                .layers
                .get(&entity.layer_id)
                .map(|l| l.visible)
                .unwrap_or(false)
    }

    /// Effective locking: the entity's own flag or its layer's.
    pub fn effective_locked(&self, entity: &Entity) -> bool {
        entity.locked
            || self
                .layers
                .get(&entity.layer_id)
                .map(|l| l.locked)
                .unwrap_or(true)
    }

    /// Entities in paint order: by layer order first, then by the
    /// store's z-order, both ascending.
    pub fn paint_order(&self) -> Vec<&Entity> {
        let mut list: Vec<(usize, usize, &Entity)> = Vec::with_capacity(self.store.len());
        for (z, entity) in self.store.all().enumerate() {
            let layer_order = self
                .layers
                .get(&entity.layer_id)
                .map(|l| l.order)
                .unwrap_or(0);
            list.push((layer_order, z, entity));
        }

        list.sort_by_key(|&(layer, z, _)| (layer, z));
        list.into_iter().map(|(_, _, e)| e).collect()
    }

    /// Ids eligible for hit-testing, top-most first.
    pub fn pick_order(&self) -> Vec<EntityId> {
        let mut ordered = self.paint_order();
        ordered.retain(|e| self.effective_visible(e) && !self.effective_locked(e));
        ordered.iter().rev().map(|e| e.id.clone()).collect()
    }

    /// Removes everything: entities, groups, layers.
    pub fn clear(&mut self) {
        self.store.clear();
        self.groups.clear();
        self.layers = LayerTable::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, EntityKind, Layer};

    fn rect(id: &str, layer: &str) -> Entity {
        Entity::new(
            id.to_string(),
            layer.to_string(),
            EntityKind::Rect {
                width: 10.0,
                height: 10.0,
            },
        )
    }

    #[test]
    fn paint_order_sorts_by_layer_first() {
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        let bottom = scene.layers.first().unwrap().id.clone();
        scene.layers.insert(Layer::new("top".to_string(), "Top"));

        scene.store.add(rect("a", "top"));
        scene.store.add(rect("b", &bottom));
        scene.store.add(rect("c", "top"));

        let order: Vec<_> = scene.paint_order().iter().map(|e| e.id.clone()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn effective_flags() {
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        let layer = scene.layers.first().unwrap().id.clone();
        scene.store.add(rect("a", &layer));

        let entity = scene.store.get(&"a".to_string()).unwrap().clone();
        assert!(scene.effective_visible(&entity));
        assert!(!scene.effective_locked(&entity));

        scene.layers.get_mut(&layer).unwrap().locked = true;
        assert!(scene.effective_locked(&entity));

        scene.layers.get_mut(&layer).unwrap().visible = false;
        assert!(!scene.effective_visible(&entity));
    }

    #[test]
    fn pick_order_excludes_hidden() {
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        let layer = scene.layers.first().unwrap().id.clone();
        scene.store.add(rect("a", &layer));
        scene.store.add(rect("b", &layer));
        scene.store.get_mut(&"a".to_string()).unwrap().visible = false;

        assert_eq!(scene.pick_order(), ["b".to_string()]);
    }
}
