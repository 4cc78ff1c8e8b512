// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::entity::{Appearance, Entity, Pose};
use crate::scene::Scene;
use crate::{EntityId, Error, GroupId, LayerId, Options};

/// Everything needed to resurrect a group after its members come back.
#[derive(Clone, PartialEq, Debug)]
pub struct GroupSnapshot {
    /// The group's id.
    pub id: GroupId,
    /// The group's name.
    pub name: String,
    /// The group's layer.
    pub layer_id: LayerId,
    /// Full member list before the mutation.
    pub members: Vec<EntityId>,
}

/// Everything needed to resurrect a deleted entity.
#[derive(Clone, Debug)]
pub struct DeleteSnapshot {
    entity: Entity,
    index: usize,
    group: Option<GroupSnapshot>,
}

/// One entity's pose change inside a transform command.
#[derive(Clone, PartialEq, Debug)]
pub struct PoseChange {
    /// The transformed entity.
    pub id: EntityId,
    /// Pose before.
    pub before: Pose,
    /// Pose after.
    pub after: Pose,
}

/// A reversible state mutation.
///
/// Commands capture whatever they need for `undo` during `execute`,
/// so the stack can replay them in either direction.
#[derive(Clone, Debug)]
pub enum Command {
    /// Adds a new entity, optionally at a z-index.
    Create {
        /// The entity to add.
        entity: Entity,
        /// Captured insertion index.
        index: Option<usize>,
    },
    /// Removes entities with their group memberships.
    Delete {
        /// The doomed entities.
        ids: Vec<EntityId>,
        /// Captured on execute.
        snapshots: Vec<DeleteSnapshot>,
    },
    /// Changes entity poses. Mergeable within the stack's merge window.
    Transform {
        /// Per-entity pose changes.
        moves: Vec<PoseChange>,
    },
    /// Changes an entity's appearance.
    Property {
        /// The restyled entity.
        id: EntityId,
        /// Appearance before.
        before: Appearance,
        /// Appearance after.
        after: Appearance,
    },
    /// Moves an entity to an absolute z-index.
    ZOrder {
        /// The entity to move.
        id: EntityId,
        /// Target z-index, clamped by the store.
        to: usize,
        /// Captured source index.
        from: Option<usize>,
    },
    /// Moves entities (and their groups) to another layer.
    LayerMove {
        /// Target layer.
        to: LayerId,
        /// Moved entities with their captured source layers.
        moves: Vec<(EntityId, Option<LayerId>)>,
        /// Captured source layers of wholly moved groups.
        group_moves: Vec<(GroupId, LayerId)>,
    },
    /// Reorders layers.
    LayerReorder {
        /// Source index.
        from: usize,
        /// Target index.
        to: usize,
    },
    /// Creates a group over entities.
    Group {
        /// The new group's id.
        group_id: GroupId,
        /// Optional name.
        name: Option<String>,
        /// Members, in input order.
        members: Vec<EntityId>,
        /// Captured pre-consolidation z-indices.
        prev_indices: Vec<(EntityId, usize)>,
    },
    /// Dissolves a group.
    Ungroup {
        /// The group to dissolve.
        group_id: GroupId,
        /// Captured on execute.
        snapshot: Option<GroupSnapshot>,
    },
    /// Replaces source entities with one merged path entity.
    Merge {
        /// The source entities to consume.
        ids: Vec<EntityId>,
        /// The merged result.
        merged: Entity,
        /// Captured source snapshots, ascending by z.
        snapshots: Vec<DeleteSnapshot>,
        /// Captured insertion index of the merged entity.
        index: Option<usize>,
    },
}

impl Command {
    /// A short human-readable description.
    pub fn describe(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Delete { .. } => "delete",
            Command::Transform { .. } => "transform",
            Command::Property { .. } => "property",
            Command::ZOrder { .. } => "zorder",
            Command::LayerMove { .. } => "layer-move",
            Command::LayerReorder { .. } => "layer-reorder",
            Command::Group { .. } => "group",
            Command::Ungroup { .. } => "ungroup",
            Command::Merge { .. } => "merge",
        }
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<(), Error> {
        match self {
            Command::Create { entity, index } => {
                match *index {
                    Some(i) => scene.store.add_at(entity.clone(), i),
                    None => scene.store.add(entity.clone()),
                }
                *index = scene.store.index_of(&entity.id);
                Ok(())
            }
            Command::Delete { ids, snapshots } => {
                snapshots.clear();
                for id in ids.iter() {
                    let Some(index) = scene.store.index_of(id) else {
                        continue;
                    };
                    let group = snapshot_group_of(scene, id);
                    let Some(entity) = scene.store.remove(id) else {
                        continue;
                    };
                    scene.groups.detach(&mut scene.store, id);
                    snapshots.push(DeleteSnapshot {
                        entity,
                        index,
                        group,
                    });
                }
                Ok(())
            }
            Command::Transform { moves } => {
                for change in moves.iter() {
                    let entity = scene
                        .store
                        .get_mut(&change.id)
                        .ok_or_else(|| Error::NoSuchEntity(change.id.clone()))?;
                    entity.pose = change.after;
                }
                Ok(())
            }
            Command::Property { id, after, .. } => {
                let entity = scene
                    .store
                    .get_mut(id)
                    .ok_or_else(|| Error::NoSuchEntity(id.clone()))?;
                entity.appearance = *after;
                Ok(())
            }
            Command::ZOrder { id, to, from } => {
                *from = scene.store.index_of(id);
                if from.is_none() {
                    return Err(Error::NoSuchEntity(id.clone()));
                }
                scene.store.set_z_index(id, *to);
                Ok(())
            }
            Command::LayerMove {
                to,
                moves,
                group_moves,
            } => {
                if !scene.layers.has(to) {
                    return Err(Error::NoSuchLayer(to.clone()));
                }

                // Groups must move wholesale; a partial move would break
                // the same-layer invariant.
                let moved: Vec<EntityId> = moves.iter().map(|(id, _)| id.clone()).collect();
                for (id, _) in moves.iter() {
                    if let Some(gid) = scene.groups.group_of(id) {
                        let members = scene.groups.members_of(gid).unwrap_or(&[]);
                        if members.iter().any(|m| !moved.contains(m)) {
                            return Err(Error::MixedLayers);
                        }
                    }
                }

                group_moves.clear();
                let mut seen_groups: Vec<GroupId> = Vec::new();
                for (id, from) in moves.iter_mut() {
                    if let Some(gid) = scene.groups.group_of(id).cloned() {
                        if !seen_groups.contains(&gid) {
                            seen_groups.push(gid.clone());
                            if let Some(layer) = scene.groups.layer_of(&gid).cloned() {
                                group_moves.push((gid, layer));
                            }
                        }
                    }

                    let entity = scene
                        .store
                        .get_mut(id)
                        .ok_or_else(|| Error::NoSuchEntity(id.clone()))?;
                    *from = Some(entity.layer_id.clone());
                    entity.layer_id = to.clone();
                }

                for (gid, _) in group_moves.iter() {
                    scene.groups.set_layer(gid, to.clone());
                }
                Ok(())
            }
            Command::LayerReorder { from, to } => {
                scene.layers.reorder(*from, *to);
                Ok(())
            }
            Command::Group {
                group_id,
                name,
                members,
                prev_indices,
            } => {
                prev_indices.clear();
                for id in members.iter() {
                    if let Some(i) = scene.store.index_of(id) {
                        prev_indices.push((id.clone(), i));
                    }
                }

                scene
                    .groups
                    .create(
                        &mut scene.store,
                        group_id.clone(),
                        members,
                        name.clone(),
                    )
                    .map(|_| ())
            }
            Command::Ungroup { group_id, snapshot } => {
                *snapshot = snapshot_group(scene, group_id);
                scene
                    .groups
                    .ungroup(&mut scene.store, group_id)
                    .map(|_| ())
            }
            Command::Merge {
                ids,
                merged,
                snapshots,
                index,
            } => {
                snapshots.clear();
                let mut sources: Vec<(usize, EntityId)> = Vec::new();
                for id in ids.iter() {
                    let i = scene
                        .store
                        .index_of(id)
                        .ok_or_else(|| Error::NoSuchEntity(id.clone()))?;
                    sources.push((i, id.clone()));
                }
                sources.sort();

                if index.is_none() {
                    let top = sources.last().map(|&(i, _)| i).unwrap_or(0);
                    *index = Some(top + 1 - sources.len().min(top + 1));
                }

                for (i, id) in sources {
                    let group = snapshot_group_of(scene, &id);
                    if let Some(entity) = scene.store.remove(&id) {
                        scene.groups.detach(&mut scene.store, &id);
                        snapshots.push(DeleteSnapshot {
                            entity,
                            index: i,
                            group,
                        });
                    }
                }

                scene
                    .store
                    .add_at(merged.clone(), index.unwrap_or(usize::MAX));
                Ok(())
            }
        }
    }

    fn undo(&mut self, scene: &mut Scene) {
        match self {
            Command::Create { entity, .. } => {
                scene.store.remove(&entity.id);
            }
            Command::Delete { snapshots, .. } => {
                restore_snapshots(scene, snapshots);
            }
            Command::Transform { moves } => {
                for change in moves.iter() {
                    if let Some(entity) = scene.store.get_mut(&change.id) {
                        entity.pose = change.before;
                    }
                }
            }
            Command::Property { id, before, .. } => {
                if let Some(entity) = scene.store.get_mut(id) {
                    entity.appearance = *before;
                }
            }
            Command::ZOrder { id, from, .. } => {
                if let Some(from) = *from {
                    scene.store.set_z_index(id, from);
                }
            }
            Command::LayerMove {
                moves, group_moves, ..
            } => {
                for (id, from) in moves.iter() {
                    if let (Some(entity), Some(from)) = (scene.store.get_mut(id), from.as_ref()) {
                        entity.layer_id = from.clone();
                    }
                }
                for (gid, layer) in group_moves.iter() {
                    scene.groups.set_layer(gid, layer.clone());
                }
            }
            Command::LayerReorder { from, to } => {
                scene.layers.reorder(*to, *from);
            }
            Command::Group {
                group_id,
                prev_indices,
                ..
            } => {
                let _ = scene.groups.ungroup(&mut scene.store, group_id);
                // Walk ascending so earlier insertions don't shift
                // later targets.
                let mut indices = prev_indices.clone();
                indices.sort_by_key(|&(_, i)| i);
                for (id, i) in indices {
                    scene.store.set_z_index(&id, i);
                }
            }
            Command::Ungroup { snapshot, .. } => {
                if let Some(s) = snapshot {
                    scene.groups.restore(
                        &mut scene.store,
                        s.id.clone(),
                        &s.members,
                        s.name.clone(),
                        s.layer_id.clone(),
                    );
                }
            }
            Command::Merge {
                merged, snapshots, ..
            } => {
                scene.store.remove(&merged.id);
                restore_snapshots(scene, snapshots);
            }
        }
    }

    fn can_merge(&self, other: &Command) -> bool {
        match (self, other) {
            (Command::Transform { moves: a }, Command::Transform { moves: b }) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| x.id == y.id)
            }
            _ => false,
        }
    }

    fn merge_with(&mut self, other: Command) {
        if let (Command::Transform { moves: a }, Command::Transform { moves: b }) = (self, other) {
            // Older before-state, newer after-state.
            for (mine, new) in a.iter_mut().zip(b.into_iter()) {
                mine.after = new.after;
            }
        }
    }
}

fn snapshot_group_of(scene: &Scene, id: &EntityId) -> Option<GroupSnapshot> {
    let gid = scene.groups.group_of(id)?.clone();
    snapshot_group(scene, &gid)
}

fn snapshot_group(scene: &Scene, gid: &GroupId) -> Option<GroupSnapshot> {
    Some(GroupSnapshot {
        id: gid.clone(),
        name: scene.groups.name_of(gid)?.to_string(),
        layer_id: scene.groups.layer_of(gid)?.clone(),
        members: scene.groups.members_of(gid)?.to_vec(),
    })
}

fn restore_snapshots(scene: &mut Scene, snapshots: &[DeleteSnapshot]) {
    // Ascending by original index, so positions land where they were.
    let mut ordered: Vec<&DeleteSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.index);

    for snapshot in &ordered {
        let mut entity = snapshot.entity.clone();
        entity.group_id = None;
        scene.store.add_at(entity, snapshot.index);
    }

    for snapshot in &ordered {
        if let Some(group) = &snapshot.group {
            if scene.groups.has(&group.id) {
                let _ = scene
                    .groups
                    .add(&mut scene.store, &group.id, &snapshot.entity.id);
            } else {
                let members: Vec<EntityId> = group
                    .members
                    .iter()
                    .filter(|m| scene.store.has(m))
                    .cloned()
                    .collect();
                scene.groups.restore(
                    &mut scene.store,
                    group.id.clone(),
                    &members,
                    group.name.clone(),
                    group.layer_id.clone(),
                );
            }
        }
    }
}

/// A stack notification drained via [`CommandStack::take_events`].
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StackEvent {
    Executed,
    Undone,
    Redone,
}

struct StackEntry {
    command: Command,
    at_ms: u64,
}

/// The reversible command stack.
///
/// Both stacks are bounded; consecutive transform commands on the same
/// entities collapse within the merge window.
pub struct CommandStack {
    undo_stack: Vec<StackEntry>,
    redo_stack: Vec<StackEntry>,
    depth: usize,
    merge_window_ms: u64,
    in_transaction: bool,
    merge_barrier: bool,
    events: Vec<StackEvent>,
}

impl CommandStack {
    /// Creates a stack with the configured depth and merge window.
    pub fn new(options: &Options) -> Self {
        CommandStack {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            depth: options.undo_depth,
            merge_window_ms: options.merge_window_ms,
            in_transaction: false,
            merge_barrier: false,
            events: Vec::new(),
        }
    }

    /// The number of undoable entries.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Whether an undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drains accumulated stack events.
    pub fn take_events(&mut self) -> Vec<StackEvent> {
        std::mem::take(&mut self.events)
    }

    /// Executes a command and records it.
    ///
    /// Returns `Ok(false)` when ignored because a transaction is in
    /// flight. On error nothing is recorded and the redo stack is kept.
    pub fn execute(
        &mut self,
        scene: &mut Scene,
        mut command: Command,
        now_ms: u64,
    ) -> Result<bool, Error> {
        if self.in_transaction {
            return Ok(false);
        }

        self.in_transaction = true;
        let result = command.execute(scene);
        self.in_transaction = false;
        result?;

        let merged = if self.merge_barrier {
            false
        } else {
            match self.undo_stack.last_mut() {
                Some(top)
                    if now_ms.saturating_sub(top.at_ms) <= self.merge_window_ms
                        && top.command.can_merge(&command) =>
                {
                    top.command.merge_with(command.clone());
                    top.at_ms = now_ms;
                    true
                }
                _ => false,
            }
        };

        if !merged {
            self.undo_stack.push(StackEntry {
                command,
                at_ms: now_ms,
            });
        }
        self.merge_barrier = false;

        self.redo_stack.clear();
        if self.undo_stack.len() > self.depth {
            let excess = self.undo_stack.len() - self.depth;
            self.undo_stack.drain(0..excess);
        }

        self.events.push(StackEvent::Executed);
        Ok(true)
    }

    /// Rolls the latest command back. Returns whether anything happened.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        if self.in_transaction {
            return false;
        }
        let Some(mut entry) = self.undo_stack.pop() else {
            return false;
        };

        self.in_transaction = true;
        entry.command.undo(scene);
        self.in_transaction = false;

        self.redo_stack.push(entry);
        self.merge_barrier = true;
        self.events.push(StackEvent::Undone);
        true
    }

    /// Re-applies the latest undone command.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        if self.in_transaction {
            return false;
        }
        let Some(mut entry) = self.redo_stack.pop() else {
            return false;
        };

        self.in_transaction = true;
        let result = entry.command.execute(scene);
        self.in_transaction = false;

        if let Err(e) = result {
            log::warn!("Redo failed: {}.", e);
            return false;
        }

        self.undo_stack.push(entry);
        self.merge_barrier = true;
        self.events.push(StackEvent::Redone);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityKind, IdGen, SvgPath};

    fn new_scene() -> (Scene, CommandStack, LayerId) {
        let mut ids = IdGen::new();
        let scene = Scene::new(&mut ids);
        let layer = scene.layers.first().unwrap().id.clone();
        let stack = CommandStack::new(&Options::default());
        (scene, stack, layer)
    }

    fn rect(id: &str, layer: &LayerId) -> Entity {
        let mut entity = Entity::new(
            id.to_string(),
            layer.clone(),
            EntityKind::Rect {
                width: 40.0,
                height: 40.0,
            },
        );
        entity.pose = Pose::at(300.0, 300.0);
        entity
    }

    fn create(stack: &mut CommandStack, scene: &mut Scene, entity: Entity, at: u64) {
        stack
            .execute(
                scene,
                Command::Create {
                    entity,
                    index: None,
                },
                at,
            )
            .unwrap();
    }

    fn move_cmd(id: &str, from: f64, to: f64) -> Command {
        let mut before = Pose::at(from, from);
        before.scale_x = 1.0;
        let after = Pose::at(to, to);
        Command::Transform {
            moves: vec![PoseChange {
                id: id.to_string(),
                before,
                after,
            }],
        }
    }

    #[test]
    fn undo_inverts_execute() {
        let (mut scene, mut stack, layer) = new_scene();
        create(&mut stack, &mut scene, rect("a", &layer), 0);
        assert!(scene.store.has(&"a".to_string()));

        assert!(stack.undo(&mut scene));
        assert!(!scene.store.has(&"a".to_string()));

        assert!(stack.redo(&mut scene));
        assert!(scene.store.has(&"a".to_string()));
    }

    #[test]
    fn transform_merges_within_window() {
        let (mut scene, mut stack, layer) = new_scene();
        create(&mut stack, &mut scene, rect("a", &layer), 0);

        // Four drag steps within 400 ms: one undo entry.
        stack.execute(&mut scene, move_cmd("a", 300.0, 310.0), 1000).unwrap();
        stack.execute(&mut scene, move_cmd("a", 310.0, 320.0), 1100).unwrap();
        stack.execute(&mut scene, move_cmd("a", 320.0, 330.0), 1250).unwrap();
        stack.execute(&mut scene, move_cmd("a", 330.0, 340.0), 1400).unwrap();

        assert_eq!(stack.undo_len(), 2);
        assert_eq!(scene.store.get(&"a".to_string()).unwrap().pose.left, 340.0);

        stack.undo(&mut scene);
        assert_eq!(scene.store.get(&"a".to_string()).unwrap().pose.left, 300.0);
    }

    #[test]
    fn transform_does_not_merge_outside_window() {
        let (mut scene, mut stack, layer) = new_scene();
        create(&mut stack, &mut scene, rect("a", &layer), 0);

        stack.execute(&mut scene, move_cmd("a", 300.0, 310.0), 1000).unwrap();
        stack.execute(&mut scene, move_cmd("a", 310.0, 320.0), 1700).unwrap();

        assert_eq!(stack.undo_len(), 3);
    }

    #[test]
    fn undo_breaks_merging() {
        let (mut scene, mut stack, layer) = new_scene();
        create(&mut stack, &mut scene, rect("a", &layer), 0);

        stack.execute(&mut scene, move_cmd("a", 300.0, 310.0), 1000).unwrap();
        stack.undo(&mut scene);
        // Within the window of the first move, but it was undone.
        stack.execute(&mut scene, move_cmd("a", 300.0, 305.0), 1100).unwrap();

        assert_eq!(scene.store.get(&"a".to_string()).unwrap().pose.left, 305.0);
        stack.undo(&mut scene);
        assert_eq!(scene.store.get(&"a".to_string()).unwrap().pose.left, 300.0);
    }

    #[test]
    fn stack_is_capped() {
        let (mut scene, mut stack, layer) = new_scene();
        create(&mut stack, &mut scene, rect("a", &layer), 0);

        for i in 0..250u64 {
            // Spaced outside the merge window.
            stack
                .execute(
                    &mut scene,
                    move_cmd("a", 300.0 + i as f64, 301.0 + i as f64),
                    i * 1000,
                )
                .unwrap();
        }

        assert_eq!(stack.undo_len(), 100);
    }

    #[test]
    fn execute_clears_redo() {
        let (mut scene, mut stack, layer) = new_scene();
        create(&mut stack, &mut scene, rect("a", &layer), 0);
        stack.undo(&mut scene);
        assert!(stack.can_redo());

        create(&mut stack, &mut scene, rect("b", &layer), 10);
        assert!(!stack.can_redo());
    }

    #[test]
    fn failed_command_records_nothing() {
        let (mut scene, mut stack, _) = new_scene();
        let err = stack.execute(&mut scene, move_cmd("ghost", 0.0, 1.0), 0);
        assert!(err.is_err());
        assert_eq!(stack.undo_len(), 0);
    }

    #[test]
    fn delete_restores_group_membership() {
        let (mut scene, mut stack, layer) = new_scene();
        create(&mut stack, &mut scene, rect("a", &layer), 0);
        create(&mut stack, &mut scene, rect("b", &layer), 0);

        stack
            .execute(
                &mut scene,
                Command::Group {
                    group_id: "g1".to_string(),
                    name: None,
                    members: vec!["a".to_string(), "b".to_string()],
                    prev_indices: Vec::new(),
                },
                0,
            )
            .unwrap();

        stack
            .execute(
                &mut scene,
                Command::Delete {
                    ids: vec!["a".to_string()],
                    snapshots: Vec::new(),
                },
                0,
            )
            .unwrap();

        // Deleting one of two members dissolved the group.
        assert!(!scene.groups.has(&"g1".to_string()));

        stack.undo(&mut scene);
        assert!(scene.groups.has(&"g1".to_string()));
        assert_eq!(
            scene.store.get(&"a".to_string()).unwrap().group_id,
            Some("g1".to_string())
        );
        assert_eq!(
            scene.store.get(&"b".to_string()).unwrap().group_id,
            Some("g1".to_string())
        );
    }

    #[test]
    fn group_undo_restores_z_order() {
        let (mut scene, mut stack, layer) = new_scene();
        for id in ["a", "b", "c"] {
            create(&mut stack, &mut scene, rect(id, &layer), 0);
        }

        stack
            .execute(
                &mut scene,
                Command::Group {
                    group_id: "g1".to_string(),
                    name: None,
                    members: vec!["a".to_string(), "b".to_string()],
                    prev_indices: Vec::new(),
                },
                0,
            )
            .unwrap();

        let order: Vec<_> = scene.store.all().map(|e| e.id.clone()).collect();
        assert_eq!(order, ["c", "a", "b"]);

        stack.undo(&mut scene);
        let order: Vec<_> = scene.store.all().map(|e| e.id.clone()).collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert!(!scene.groups.has(&"g1".to_string()));
    }

    #[test]
    fn merge_replaces_sources_and_restores() {
        let (mut scene, mut stack, layer) = new_scene();
        let mut a = rect("a", &layer);
        a.kind = EntityKind::Path {
            data: SvgPath::from_str("M0 0L10 10").unwrap(),
        };
        let b = rect("b", &layer);
        create(&mut stack, &mut scene, a, 0);
        create(&mut stack, &mut scene, b, 0);
        create(&mut stack, &mut scene, rect("top", &layer), 0);

        let sources: Vec<&Entity> = vec![
            scene.store.get(&"a".to_string()).unwrap(),
            scene.store.get(&"b".to_string()).unwrap(),
        ];
        let merged_path = crate::merge::merge_entities(&sources).unwrap();
        let merged = Entity::path_from_tile_coords(
            "m1".to_string(),
            layer.clone(),
            merged_path.data,
            merged_path.appearance,
        );

        stack
            .execute(
                &mut scene,
                Command::Merge {
                    ids: vec!["a".to_string(), "b".to_string()],
                    merged,
                    snapshots: Vec::new(),
                    index: None,
                },
                0,
            )
            .unwrap();

        let order: Vec<_> = scene.store.all().map(|e| e.id.clone()).collect();
        assert_eq!(order, ["m1", "top"]);

        stack.undo(&mut scene);
        let order: Vec<_> = scene.store.all().map(|e| e.id.clone()).collect();
        assert_eq!(order, ["a", "b", "top"]);
    }

    #[test]
    fn layer_move_round_trip() {
        let (mut scene, mut stack, layer) = new_scene();
        scene
            .layers
            .insert(crate::Layer::new("l2".to_string(), "Upper"));
        create(&mut stack, &mut scene, rect("a", &layer), 0);

        stack
            .execute(
                &mut scene,
                Command::LayerMove {
                    to: "l2".to_string(),
                    moves: vec![("a".to_string(), None)],
                    group_moves: Vec::new(),
                },
                0,
            )
            .unwrap();
        assert_eq!(scene.store.get(&"a".to_string()).unwrap().layer_id, "l2");

        stack.undo(&mut scene);
        assert_eq!(scene.store.get(&"a".to_string()).unwrap().layer_id, layer);
    }
}
