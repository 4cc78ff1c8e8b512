// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::store::CanonicalStore;
use crate::{EntityId, Error, GroupId, LayerId};

#[derive(Clone, Debug)]
struct GroupRecord {
    name: String,
    layer_id: LayerId,
    members: Vec<EntityId>,
}

/// Two-way index between entities and their groups.
///
/// Invariants: every member's `group_id` points back at its group,
/// all members of a group share one layer, and no group ever holds
/// fewer than two members — it dissolves atomically instead.
#[derive(Default, Debug)]
pub struct EntityGroupIndex {
    groups: HashMap<GroupId, GroupRecord>,
    by_entity: HashMap<EntityId, GroupId>,
}

impl EntityGroupIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        EntityGroupIndex::default()
    }

    /// Creates a group over the specified entities.
    ///
    /// Requires at least two distinct, ungrouped entities on one layer.
    /// On success the members are brought to the top of the z-order in
    /// their input order, so the group renders contiguously.
    pub fn create(
        &mut self,
        store: &mut CanonicalStore,
        id: GroupId,
        ids: &[EntityId],
        name: Option<String>,
    ) -> Result<GroupId, Error> {
        let mut members: Vec<EntityId> = Vec::new();
        for eid in ids {
            if !members.contains(eid) {
                members.push(eid.clone());
            }
        }

        if members.len() < 2 {
            return Err(Error::TooFewMembers);
        }

        let mut layer_id: Option<LayerId> = None;
        for eid in &members {
            let entity = store
                .get(eid)
                .ok_or_else(|| Error::NoSuchEntity(eid.clone()))?;

            if entity.group_id.is_some() || self.by_entity.contains_key(eid) {
                return Err(Error::AlreadyGrouped(eid.clone()));
            }

            match layer_id {
                None => layer_id = Some(entity.layer_id.clone()),
                Some(ref l) if *l != entity.layer_id => return Err(Error::MixedLayers),
                _ => {}
            }
        }

        let layer_id = layer_id.expect("at least two members");

        for eid in &members {
            if let Some(entity) = store.get_mut(eid) {
                entity.group_id = Some(id.clone());
            }
            self.by_entity.insert(eid.clone(), id.clone());
            store.bring_to_front(eid);
        }

        self.groups.insert(
            id.clone(),
            GroupRecord {
                name: name.unwrap_or_default(),
                layer_id,
                members,
            },
        );

        Ok(id)
    }

    /// Rebuilds a group from a loaded project, without touching z-order.
    ///
    /// Skips members that do not exist; dissolves silently when fewer
    /// than two remain.
    pub fn restore(
        &mut self,
        store: &mut CanonicalStore,
        id: GroupId,
        ids: &[EntityId],
        name: String,
        layer_id: LayerId,
    ) {
        let members: Vec<EntityId> = ids.iter().filter(|e| store.has(e)).cloned().collect();
        if members.len() < 2 {
            log::warn!("Group '{}' has less than 2 members. Skipped.", id);
            return;
        }

        for eid in &members {
            if let Some(entity) = store.get_mut(eid) {
                entity.group_id = Some(id.clone());
            }
            self.by_entity.insert(eid.clone(), id.clone());
        }

        self.groups.insert(
            id,
            GroupRecord {
                name,
                layer_id,
                members,
            },
        );
    }

    /// Dissolves a group, clearing `group_id` on each member.
    ///
    /// Returns the former members.
    pub fn ungroup(
        &mut self,
        store: &mut CanonicalStore,
        id: &GroupId,
    ) -> Result<Vec<EntityId>, Error> {
        let record = self
            .groups
            .remove(id)
            .ok_or_else(|| Error::NoSuchGroup(id.clone()))?;

        for eid in &record.members {
            self.by_entity.remove(eid);
            if let Some(entity) = store.get_mut(eid) {
                entity.group_id = None;
            }
        }

        Ok(record.members)
    }

    /// Adds an entity to an existing group.
    pub fn add(
        &mut self,
        store: &mut CanonicalStore,
        id: &GroupId,
        eid: &EntityId,
    ) -> Result<(), Error> {
        let record = self
            .groups
            .get(id)
            .ok_or_else(|| Error::NoSuchGroup(id.clone()))?;

        let entity = store
            .get(eid)
            .ok_or_else(|| Error::NoSuchEntity(eid.clone()))?;

        if entity.group_id.is_some() {
            return Err(Error::AlreadyGrouped(eid.clone()));
        }
        if entity.layer_id != record.layer_id {
            return Err(Error::MixedLayers);
        }

        self.groups
            .get_mut(id)
            .expect("checked above")
            .members
            .push(eid.clone());
        self.by_entity.insert(eid.clone(), id.clone());
        if let Some(entity) = store.get_mut(eid) {
            entity.group_id = Some(id.clone());
        }

        Ok(())
    }

    /// Removes an entity from its group.
    ///
    /// When the group falls to one member it dissolves atomically;
    /// the ids released by the dissolution are returned.
    pub fn remove(
        &mut self,
        store: &mut CanonicalStore,
        id: &GroupId,
        eid: &EntityId,
    ) -> Result<Vec<EntityId>, Error> {
        let record = self
            .groups
            .get_mut(id)
            .ok_or_else(|| Error::NoSuchGroup(id.clone()))?;

        record.members.retain(|m| m != eid);
        self.by_entity.remove(eid);
        if let Some(entity) = store.get_mut(eid) {
            entity.group_id = None;
        }

        if record.members.len() < 2 {
            return self.ungroup(store, id);
        }

        Ok(Vec::new())
    }

    /// Detaches an entity from whatever group it is in.
    ///
    /// Called when the entity is deleted. Returns the ids released by
    /// an auto-dissolution, if one happened.
    pub fn detach(&mut self, store: &mut CanonicalStore, eid: &EntityId) -> Vec<EntityId> {
        match self.by_entity.get(eid).cloned() {
            Some(gid) => self.remove(store, &gid, eid).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Members of a group, in input order.
    pub fn members_of(&self, id: &GroupId) -> Option<&[EntityId]> {
        self.groups.get(id).map(|r| r.members.as_slice())
    }

    /// The group an entity belongs to, if any.
    pub fn group_of(&self, eid: &EntityId) -> Option<&GroupId> {
        self.by_entity.get(eid)
    }

    /// The name of a group.
    pub fn name_of(&self, id: &GroupId) -> Option<&str> {
        self.groups.get(id).map(|r| r.name.as_str())
    }

    /// The layer a group lives on.
    pub fn layer_of(&self, id: &GroupId) -> Option<&LayerId> {
        self.groups.get(id).map(|r| &r.layer_id)
    }

    /// Moves a group to another layer. The caller is responsible for
    /// moving the members along with it.
    pub fn set_layer(&mut self, id: &GroupId, layer_id: LayerId) {
        if let Some(record) = self.groups.get_mut(id) {
            record.layer_id = layer_id;
        }
    }

    /// Checks that a group exists.
    pub fn has(&self, id: &GroupId) -> bool {
        self.groups.contains_key(id)
    }

    /// Iterates all group ids.
    pub fn ids(&self) -> impl Iterator<Item = &GroupId> {
        self.groups.keys()
    }

    /// Drops every group.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.by_entity.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, EntityKind};

    fn scene() -> (CanonicalStore, EntityGroupIndex) {
        let mut store = CanonicalStore::new();
        for id in ["a", "b", "c"] {
            store.add(Entity::new(
                id.to_string(),
                "l1".to_string(),
                EntityKind::Rect {
                    width: 10.0,
                    height: 10.0,
                },
            ));
        }
        (store, EntityGroupIndex::new())
    }

    #[test]
    fn create_and_bidirectional() {
        let (mut store, mut groups) = scene();
        groups
            .create(
                &mut store,
                "g1".to_string(),
                &["a".to_string(), "b".to_string()],
                None,
            )
            .unwrap();

        assert_eq!(
            groups.members_of(&"g1".to_string()).unwrap(),
            ["a".to_string(), "b".to_string()]
        );
        assert_eq!(groups.group_of(&"a".to_string()), Some(&"g1".to_string()));
        assert_eq!(
            store.get(&"a".to_string()).unwrap().group_id,
            Some("g1".to_string())
        );
        assert_eq!(groups.group_of(&"c".to_string()), None);
    }

    #[test]
    fn create_consolidates_z_order() {
        let (mut store, mut groups) = scene();
        groups
            .create(
                &mut store,
                "g1".to_string(),
                &["a".to_string(), "b".to_string()],
                None,
            )
            .unwrap();

        let order: Vec<_> = store.all().map(|e| e.id.clone()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn too_few_members() {
        let (mut store, mut groups) = scene();
        let err = groups.create(&mut store, "g1".to_string(), &["a".to_string()], None);
        assert!(matches!(err, Err(Error::TooFewMembers)));

        // Duplicates collapse into one member.
        let err = groups.create(
            &mut store,
            "g1".to_string(),
            &["a".to_string(), "a".to_string()],
            None,
        );
        assert!(matches!(err, Err(Error::TooFewMembers)));
    }

    #[test]
    fn mixed_layers_rejected() {
        let (mut store, mut groups) = scene();
        store.get_mut(&"b".to_string()).unwrap().layer_id = "l2".to_string();

        let err = groups.create(
            &mut store,
            "g1".to_string(),
            &["a".to_string(), "b".to_string()],
            None,
        );
        assert!(matches!(err, Err(Error::MixedLayers)));
        // Nothing was touched.
        assert_eq!(store.get(&"a".to_string()).unwrap().group_id, None);
    }

    #[test]
    fn already_grouped_rejected() {
        let (mut store, mut groups) = scene();
        groups
            .create(
                &mut store,
                "g1".to_string(),
                &["a".to_string(), "b".to_string()],
                None,
            )
            .unwrap();

        let err = groups.create(
            &mut store,
            "g2".to_string(),
            &["b".to_string(), "c".to_string()],
            None,
        );
        assert!(matches!(err, Err(Error::AlreadyGrouped(_))));
    }

    #[test]
    fn ungroup_clears_members() {
        let (mut store, mut groups) = scene();
        groups
            .create(
                &mut store,
                "g1".to_string(),
                &["a".to_string(), "b".to_string()],
                None,
            )
            .unwrap();

        let members = groups.ungroup(&mut store, &"g1".to_string()).unwrap();
        assert_eq!(members, ["a".to_string(), "b".to_string()]);
        assert_eq!(store.get(&"a".to_string()).unwrap().group_id, None);
        assert!(!groups.has(&"g1".to_string()));
    }

    #[test]
    fn remove_auto_dissolves() {
        let (mut store, mut groups) = scene();
        groups
            .create(
                &mut store,
                "g1".to_string(),
                &["a".to_string(), "b".to_string(), "c".to_string()],
                None,
            )
            .unwrap();

        let released = groups
            .remove(&mut store, &"g1".to_string(), &"a".to_string())
            .unwrap();
        assert!(released.is_empty());
        assert!(groups.has(&"g1".to_string()));

        let released = groups
            .remove(&mut store, &"g1".to_string(), &"b".to_string())
            .unwrap();
        assert_eq!(released, ["c".to_string()]);
        assert!(!groups.has(&"g1".to_string()));
        assert_eq!(store.get(&"c".to_string()).unwrap().group_id, None);
    }

    #[test]
    fn detach_on_delete() {
        let (mut store, mut groups) = scene();
        groups
            .create(
                &mut store,
                "g1".to_string(),
                &["a".to_string(), "b".to_string()],
                None,
            )
            .unwrap();

        store.remove(&"a".to_string());
        groups.detach(&mut store, &"a".to_string());
        assert!(!groups.has(&"g1".to_string()));
        assert_eq!(store.get(&"b".to_string()).unwrap().group_id, None);
    }
}
