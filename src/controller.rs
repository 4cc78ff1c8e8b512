// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashSet;

use crate::brush::{fit_stroke_path, VarioBrush};
use crate::canvas::Canvas2d;
use crate::command::{Command, CommandStack, PoseChange};
use crate::entity::{Appearance, Entity, EntityKind, Pose};
use crate::geom::Point;
use crate::hittest::HitTester;
use crate::proxy::{wrap_into_center_tile, ProxyManager};
use crate::render::VirtualRenderer;
use crate::scene::Scene;
use crate::{Color, EntityId, Error, IdGen, LayerId, Opacity, Options};

/// Shape kinds the shape tool can draw.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShapeKind {
    Rect,
    Circle,
}

/// The active tool.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Tool {
    /// Select, move and transform entities.
    Select,
    /// Fixed-width freehand strokes.
    Brush {
        /// Stroke width.
        size: f64,
        /// Stroke color.
        color: Color,
    },
    /// Speed-sensitive filled strokes.
    VarioBrush {
        /// Width factor.
        factor: f64,
        /// Fill color.
        color: Color,
    },
    /// Paints over things in the background color.
    Eraser {
        /// Stroke width.
        size: f64,
    },
    /// Drag-to-size rectangles and circles.
    Shape {
        /// What to draw.
        kind: ShapeKind,
        /// Fill color.
        color: Color,
    },
    /// Waiting for a click to place an imported entity.
    ImportPending,
}

/// Modifier keys accompanying an input event.
#[allow(missing_docs)]
#[derive(Clone, Copy, Default, Debug)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
}

impl Modifiers {
    /// The platform command modifier: Ctrl or Cmd.
    #[inline]
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// One pointer event, in window coordinates.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
    pub time_ms: u64,
    pub modifiers: Modifiers,
}

impl PointerInput {
    #[inline]
    fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A key-down event.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    pub time_ms: u64,
}

/// Keys the controller reacts to.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    Char(char),
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Delete,
    Backspace,
    Escape,
}

#[derive(Debug)]
enum Interaction {
    Idle,
    DragProxies {
        last: Point,
    },
    Marquee {
        start: Point,
        current: Point,
        additive: bool,
    },
    Stroke {
        points: Vec<Point>,
    },
    VarioStroke {
        brush: VarioBrush,
    },
    ShapeDraft {
        origin: Point,
        current: Point,
    },
}

const MIN_SHAPE_SIZE: f64 = 5.0;
const NUDGE_STEP: f64 = 1.0;
const NUDGE_STEP_FAST: f64 = 10.0;
const DUPLICATE_OFFSET: f64 = 10.0;

/// The tool state machine: routes host pointer and keyboard events into
/// commands over the scene.
pub struct SceneController {
    /// Processing options.
    pub options: Options,
    /// The scene being edited.
    pub scene: Scene,
    /// The undo/redo stack.
    pub stack: CommandStack,
    /// Live selection proxies.
    pub proxies: ProxyManager,
    ids: IdGen,
    tool: Tool,
    selection: Vec<EntityId>,
    interaction: Interaction,
    pending_import: Option<Entity>,
    text_field_focused: bool,
    needs_render: bool,
}

impl SceneController {
    /// Creates a controller with an empty scene and a default layer.
    pub fn new(options: Options) -> Self {
        let mut ids = IdGen::new();
        let scene = Scene::new(&mut ids);
        let stack = CommandStack::new(&options);
        let proxies = ProxyManager::new(options.tile_size);

        SceneController {
            options,
            scene,
            stack,
            proxies,
            ids,
            tool: Tool::Select,
            selection: Vec::new(),
            interaction: Interaction::Idle,
            pending_import: None,
            text_field_focused: false,
            needs_render: true,
        }
    }

    /// The identifier generator, for hosts creating entities themselves.
    pub fn ids_mut(&mut self) -> &mut IdGen {
        &mut self.ids
    }

    /// The active tool.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switches tools. Cancels any in-progress interaction;
    /// tool changes are never undoable.
    pub fn set_tool(&mut self, tool: Tool) {
        self.interaction = Interaction::Idle;
        if !matches!(tool, Tool::ImportPending) {
            self.pending_import = None;
        }
        self.tool = tool;
        self.request_render();
    }

    /// The current selection, in selection order.
    pub fn selection(&self) -> &[EntityId] {
        &self.selection
    }

    /// Tells the controller whether a text field owns keyboard focus.
    /// Hotkeys are suppressed while one does.
    pub fn set_text_field_focused(&mut self, focused: bool) {
        self.text_field_focused = focused;
    }

    /// Whether a redraw is wanted, clearing the flag.
    pub fn take_needs_render(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }

    fn request_render(&mut self) {
        self.needs_render = true;
    }

    /// Hands an entity to the import tool; the next click places it.
    pub fn begin_import(&mut self, entity: Entity) {
        self.pending_import = Some(entity);
        self.set_tool(Tool::ImportPending);
    }

    // ---- pointer routing ----

    /// Handles a pointer-down event.
    pub fn pointer_down(&mut self, input: PointerInput) {
        match self.tool {
            Tool::Select => self.select_down(input),
            Tool::Brush { .. } | Tool::Eraser { .. } => {
                self.interaction = Interaction::Stroke {
                    points: vec![input.point()],
                };
            }
            Tool::VarioBrush { factor, .. } => {
                let mut brush = VarioBrush::new(factor);
                brush.add(input.point(), input.time_ms);
                self.interaction = Interaction::VarioStroke { brush };
            }
            Tool::Shape { .. } => {
                self.interaction = Interaction::ShapeDraft {
                    origin: input.point(),
                    current: input.point(),
                };
            }
            Tool::ImportPending => self.place_import(input),
        }
        self.request_render();
    }

    /// Handles a pointer-move event.
    pub fn pointer_move(&mut self, input: PointerInput) {
        match &mut self.interaction {
            Interaction::Idle => return,
            Interaction::DragProxies { last } => {
                let dx = input.x - last.x;
                let dy = input.y - last.y;
                *last = input.point();
                self.drag_selection_by(dx, dy, input.time_ms);
            }
            Interaction::Marquee { current, .. } => {
                *current = input.point();
            }
            Interaction::Stroke { points } => {
                points.push(input.point());
            }
            Interaction::VarioStroke { brush } => {
                brush.add(input.point(), input.time_ms);
            }
            Interaction::ShapeDraft { current, .. } => {
                *current = input.point();
            }
        }
        self.request_render();
    }

    /// Handles a pointer-up event.
    pub fn pointer_up(&mut self, input: PointerInput) {
        let interaction = std::mem::replace(&mut self.interaction, Interaction::Idle);
        match interaction {
            Interaction::Idle => {}
            Interaction::DragProxies { .. } => {}
            Interaction::Marquee {
                start,
                current,
                additive,
            } => self.finish_marquee(start, current, additive),
            Interaction::Stroke { points } => self.finish_stroke(points, input.time_ms),
            Interaction::VarioStroke { brush } => self.finish_vario(brush, input.time_ms),
            Interaction::ShapeDraft { origin, current } => {
                self.finish_shape(origin, current, input.time_ms)
            }
        }
        self.request_render();
    }

    fn select_down(&mut self, input: PointerInput) {
        let tester = HitTester::new(&self.scene, self.options.tile_size);
        match tester.find(input.point()) {
            Some(hit) => {
                if input.modifiers.shift || input.modifiers.command() {
                    if self.selection.contains(&hit.id) {
                        self.selection.retain(|id| id != &hit.id);
                    } else {
                        self.selection.push(hit.id.clone());
                    }
                } else if !self.selection.contains(&hit.id) {
                    self.selection = vec![hit.id.clone()];
                }

                // Grouped entities select as a unit.
                self.extend_selection_to_groups();

                self.rebuild_proxies(Some((&hit.id, hit.offset)));
                self.interaction = Interaction::DragProxies {
                    last: input.point(),
                };
            }
            None => {
                let additive = input.modifiers.shift || input.modifiers.command();
                if !additive {
                    self.clear_selection();
                }
                self.interaction = Interaction::Marquee {
                    start: input.point(),
                    current: input.point(),
                    additive,
                };
            }
        }
    }

    fn extend_selection_to_groups(&mut self) {
        let mut extended = self.selection.clone();
        for id in &self.selection {
            if let Some(gid) = self.scene.groups.group_of(id) {
                for member in self.scene.groups.members_of(gid).unwrap_or(&[]) {
                    if !extended.contains(member) {
                        extended.push(member.clone());
                    }
                }
            }
        }
        self.selection = extended;
    }

    fn drag_selection_by(&mut self, dx: f64, dy: f64, time_ms: u64) {
        let mut moves = Vec::new();
        for id in self.selection.clone() {
            let Some(proxy) = self.proxies.get_mut(&id) else {
                continue;
            };
            proxy.pose.left += dx;
            proxy.pose.top += dy;

            let Some(entity) = self.scene.store.get(&id) else {
                continue;
            };
            let before = entity.pose;
            let mut shadow = entity.clone();
            self.proxies.sync_proxy_to_canonical(&id, &mut shadow);

            moves.push(PoseChange {
                id: id.clone(),
                before,
                after: shadow.pose,
            });
        }

        if !moves.is_empty() {
            let _ = self
                .stack
                .execute(&mut self.scene, Command::Transform { moves }, time_ms);
        }
    }

    fn finish_marquee(&mut self, start: Point, current: Point, additive: bool) {
        let tester = HitTester::new(&self.scene, self.options.tile_size);
        let found = tester.find_in_rect(start, current);

        if additive {
            for id in found {
                if !self.selection.contains(&id) {
                    self.selection.push(id);
                }
            }
        } else {
            self.selection = found;
        }

        self.extend_selection_to_groups();
        self.rebuild_proxies(None);
    }

    fn finish_stroke(&mut self, points: Vec<Point>, time_ms: u64) {
        let Some(data) = fit_stroke_path(&points) else {
            return;
        };

        let appearance = match self.tool {
            Tool::Brush { size, color } => Appearance::stroked(color, size),
            Tool::Eraser { size } => Appearance::stroked(self.options.background, size),
            _ => return,
        };

        let entity = Entity::path_from_tile_coords(
            self.ids.next_entity(),
            self.current_layer(),
            data,
            appearance,
        );
        let _ = self.stack.execute(
            &mut self.scene,
            Command::Create {
                entity,
                index: None,
            },
            time_ms,
        );
    }

    fn finish_vario(&mut self, brush: VarioBrush, time_ms: u64) {
        let Tool::VarioBrush { color, .. } = self.tool else {
            return;
        };
        let Some(data) = brush.finish() else {
            return;
        };

        let entity = Entity::path_from_tile_coords(
            self.ids.next_entity(),
            self.current_layer(),
            data,
            Appearance::filled(color),
        );
        let _ = self.stack.execute(
            &mut self.scene,
            Command::Create {
                entity,
                index: None,
            },
            time_ms,
        );
    }

    fn finish_shape(&mut self, origin: Point, current: Point, time_ms: u64) {
        let Tool::Shape { kind, color } = self.tool else {
            return;
        };

        let w = (current.x - origin.x).abs();
        let h = (current.y - origin.y).abs();
        let left = origin.x.min(current.x);
        let top = origin.y.min(current.y);

        let kind = match kind {
            ShapeKind::Rect => {
                if w < MIN_SHAPE_SIZE || h < MIN_SHAPE_SIZE {
                    return;
                }
                EntityKind::Rect {
                    width: w,
                    height: h,
                }
            }
            ShapeKind::Circle => {
                let radius = w.max(h) / 2.0;
                if radius < MIN_SHAPE_SIZE {
                    return;
                }
                EntityKind::Circle { radius }
            }
        };

        let mut entity = Entity::new(self.ids.next_entity(), self.current_layer(), kind);
        entity.pose = Pose::at(left, top);
        entity.appearance = Appearance::filled(color);

        let _ = self.stack.execute(
            &mut self.scene,
            Command::Create {
                entity,
                index: None,
            },
            time_ms,
        );
    }

    fn place_import(&mut self, input: PointerInput) {
        let Some(mut entity) = self.pending_import.take() else {
            self.set_tool(Tool::Select);
            return;
        };

        entity.pose.left = input.x;
        entity.pose.top = input.y;
        entity.layer_id = self.current_layer();
        let id = entity.id.clone();
        if id.is_empty() {
            entity.id = self.ids.next_entity();
        }

        let _ = self.stack.execute(
            &mut self.scene,
            Command::Create {
                entity,
                index: None,
            },
            input.time_ms,
        );
        self.set_tool(Tool::Select);
    }

    // ---- keyboard routing ----

    /// Handles a key-down event. Returns `true` when consumed.
    pub fn key_down(&mut self, input: KeyInput) -> bool {
        if self.text_field_focused {
            return false;
        }

        if input.key == Key::Escape {
            self.cancel_interaction();
            return true;
        }

        if input.modifiers.command() {
            return self.hotkey(input);
        }

        let fast = input.modifiers.shift;
        let step = if fast { NUDGE_STEP_FAST } else { NUDGE_STEP };
        match input.key {
            Key::ArrowLeft => self.nudge_selection(-step, 0.0, input.time_ms),
            Key::ArrowRight => self.nudge_selection(step, 0.0, input.time_ms),
            Key::ArrowUp => self.nudge_selection(0.0, -step, input.time_ms),
            Key::ArrowDown => self.nudge_selection(0.0, step, input.time_ms),
            Key::Delete | Key::Backspace => {
                self.delete_selection(input.time_ms);
                true
            }
            _ => false,
        }
    }

    fn hotkey(&mut self, input: KeyInput) -> bool {
        let Key::Char(c) = input.key else {
            return false;
        };

        match (c.to_ascii_lowercase(), input.modifiers.shift) {
            ('z', false) => {
                self.undo();
                true
            }
            ('z', true) | ('y', _) => {
                self.redo();
                true
            }
            ('g', false) => {
                if let Err(e) = self.group_selection(input.time_ms) {
                    log::warn!("Grouping failed: {}.", e);
                }
                true
            }
            ('g', true) => {
                if let Err(e) = self.ungroup_selection(input.time_ms) {
                    log::warn!("Ungrouping failed: {}.", e);
                }
                true
            }
            ('m', _) => {
                if let Err(e) = self.merge_selection(input.time_ms) {
                    log::warn!("Merging failed: {}.", e);
                }
                true
            }
            ('a', _) => {
                self.select_all();
                true
            }
            ('d', _) => {
                self.duplicate_selection(input.time_ms);
                true
            }
            _ => false,
        }
    }

    /// Cancels any in-progress drag, stroke or marquee without
    /// emitting a command.
    pub fn cancel_interaction(&mut self) {
        self.interaction = Interaction::Idle;
        self.request_render();
    }

    // ---- selection ----

    fn clear_selection(&mut self) {
        self.selection.clear();
        self.proxies.clear();
    }

    fn rebuild_proxies(&mut self, grabbed: Option<(&EntityId, (i32, i32))>) {
        self.proxies.clear();
        for id in &self.selection {
            let offset = match grabbed {
                Some((gid, offset)) if gid == id => offset,
                _ => (0, 0),
            };
            if let Some(entity) = self.scene.store.get(id) {
                self.proxies.create(entity, offset);
            }
        }
    }

    /// Selects every eligible entity.
    pub fn select_all(&mut self) {
        let mut ids = self.scene.pick_order();
        ids.reverse();
        self.selection = ids;
        self.rebuild_proxies(None);
        self.request_render();
    }

    fn nudge_selection(&mut self, dx: f64, dy: f64, time_ms: u64) -> bool {
        if self.selection.is_empty() {
            return false;
        }

        let t = self.options.tile_size;
        let mut moves = Vec::new();
        for id in &self.selection {
            let Some(entity) = self.scene.store.get(id) else {
                continue;
            };
            let before = entity.pose;
            let mut after = before;
            after.left = wrap_into_center_tile(before.left + dx, t);
            after.top = wrap_into_center_tile(before.top + dy, t);
            moves.push(PoseChange {
                id: id.clone(),
                before,
                after,
            });
        }

        if moves.is_empty() {
            return false;
        }

        let moved = self
            .stack
            .execute(&mut self.scene, Command::Transform { moves }, time_ms)
            .is_ok();
        if moved {
            self.resync_proxies();
            self.request_render();
        }
        moved
    }

    fn resync_proxies(&mut self) {
        for id in self.selection.clone() {
            if let Some(entity) = self.scene.store.get(&id).cloned() {
                self.proxies.sync_canonical_to_proxy(&entity);
            }
        }
        self.proxies.prune(&self.scene.store);
    }

    // ---- undoable operations ----

    /// Undoes the latest command. Selection is cleared either way.
    pub fn undo(&mut self) -> bool {
        let done = self.stack.undo(&mut self.scene);
        self.clear_selection();
        self.request_render();
        done
    }

    /// Redoes the latest undone command. Selection is cleared either way.
    pub fn redo(&mut self) -> bool {
        let done = self.stack.redo(&mut self.scene);
        self.clear_selection();
        self.request_render();
        done
    }

    /// Deletes the selected entities.
    pub fn delete_selection(&mut self, time_ms: u64) {
        if self.selection.is_empty() {
            return;
        }

        let ids = std::mem::take(&mut self.selection);
        self.proxies.clear();
        let _ = self.stack.execute(
            &mut self.scene,
            Command::Delete {
                ids,
                snapshots: Vec::new(),
            },
            time_ms,
        );
        self.request_render();
    }

    /// Duplicates the selected entities with a small offset.
    pub fn duplicate_selection(&mut self, time_ms: u64) {
        let t = self.options.tile_size;
        let mut new_ids = Vec::new();

        for id in self.selection.clone() {
            let Some(source) = self.scene.store.get(&id).cloned() else {
                continue;
            };

            let mut copy = source;
            copy.id = self.ids.next_entity();
            copy.group_id = None;
            copy.pose.left = wrap_into_center_tile(copy.pose.left + DUPLICATE_OFFSET, t);
            copy.pose.top = wrap_into_center_tile(copy.pose.top + DUPLICATE_OFFSET, t);

            new_ids.push(copy.id.clone());
            let _ = self.stack.execute(
                &mut self.scene,
                Command::Create {
                    entity: copy,
                    index: None,
                },
                time_ms,
            );
        }

        if !new_ids.is_empty() {
            self.selection = new_ids;
            self.rebuild_proxies(None);
            self.request_render();
        }
    }

    /// Groups the selection.
    pub fn group_selection(&mut self, time_ms: u64) -> Result<(), Error> {
        if self.selection.len() < 2 {
            return Err(Error::TooFewMembers);
        }

        let group_id = self.ids.next_group();
        self.stack
            .execute(
                &mut self.scene,
                Command::Group {
                    group_id,
                    name: None,
                    members: self.selection.clone(),
                    prev_indices: Vec::new(),
                },
                time_ms,
            )
            .map(|_| {
                self.request_render();
            })
    }

    /// Ungroups every group in the selection.
    pub fn ungroup_selection(&mut self, time_ms: u64) -> Result<(), Error> {
        let mut group_ids: Vec<_> = Vec::new();
        for id in &self.selection {
            if let Some(gid) = self.scene.groups.group_of(id) {
                if !group_ids.contains(gid) {
                    group_ids.push(gid.clone());
                }
            }
        }

        if group_ids.is_empty() {
            return Err(Error::NoSuchGroup(String::new()));
        }

        for group_id in group_ids {
            self.stack.execute(
                &mut self.scene,
                Command::Ungroup {
                    group_id,
                    snapshot: None,
                },
                time_ms,
            )?;
        }

        self.request_render();
        Ok(())
    }

    /// Merges the selected entities into one path entity.
    pub fn merge_selection(&mut self, time_ms: u64) -> Result<(), Error> {
        if self.selection.len() < 2 {
            return Err(Error::NotMergeable);
        }

        // Merge in paint order, so the result layers like the sources.
        let ordered: Vec<EntityId> = self
            .scene
            .paint_order()
            .iter()
            .filter(|e| self.selection.contains(&e.id))
            .map(|e| e.id.clone())
            .collect();

        let sources: Vec<&Entity> = ordered
            .iter()
            .filter_map(|id| self.scene.store.get(id))
            .collect();
        let merged_path = crate::merge::merge_entities(&sources).ok_or(Error::NotMergeable)?;

        let merged = Entity::path_from_tile_coords(
            self.ids.next_entity(),
            sources[0].layer_id.clone(),
            merged_path.data,
            merged_path.appearance,
        );
        let merged_id = merged.id.clone();

        self.stack.execute(
            &mut self.scene,
            Command::Merge {
                ids: ordered,
                merged,
                snapshots: Vec::new(),
                index: None,
            },
            time_ms,
        )?;

        self.selection = vec![merged_id];
        self.rebuild_proxies(None);
        self.request_render();
        Ok(())
    }

    /// Changes the fill color of the selection.
    pub fn set_selection_fill(&mut self, fill: Option<Color>, time_ms: u64) {
        self.set_selection_appearance(time_ms, |a| a.fill = fill);
    }

    /// Changes the opacity of the selection.
    pub fn set_selection_opacity(&mut self, opacity: Opacity, time_ms: u64) {
        self.set_selection_appearance(time_ms, |a| a.opacity = opacity);
    }

    fn set_selection_appearance(&mut self, time_ms: u64, change: impl Fn(&mut Appearance)) {
        for id in self.selection.clone() {
            let Some(entity) = self.scene.store.get(&id) else {
                continue;
            };
            let before = entity.appearance;
            let mut after = before;
            change(&mut after);

            let _ = self.stack.execute(
                &mut self.scene,
                Command::Property { id, before, after },
                time_ms,
            );
        }
        self.request_render();
    }

    /// Raises the selected entities one step.
    pub fn bring_selection_forward(&mut self, time_ms: u64) {
        for id in self.selection.clone() {
            if let Some(i) = self.scene.store.index_of(&id) {
                let _ = self.stack.execute(
                    &mut self.scene,
                    Command::ZOrder {
                        id,
                        to: i + 1,
                        from: None,
                    },
                    time_ms,
                );
            }
        }
        self.request_render();
    }

    /// Lowers the selected entities one step.
    pub fn send_selection_backward(&mut self, time_ms: u64) {
        for id in self.selection.clone() {
            if let Some(i) = self.scene.store.index_of(&id) {
                let _ = self.stack.execute(
                    &mut self.scene,
                    Command::ZOrder {
                        id,
                        to: i.saturating_sub(1),
                        from: None,
                    },
                    time_ms,
                );
            }
        }
        self.request_render();
    }

    /// Moves the selection (with whole groups) to another layer.
    pub fn move_selection_to_layer(&mut self, to: LayerId, time_ms: u64) -> Result<(), Error> {
        if self.selection.is_empty() {
            return Ok(());
        }

        let mut ids = self.selection.clone();
        // Pull whole groups along.
        for id in self.selection.clone() {
            if let Some(gid) = self.scene.groups.group_of(&id) {
                for member in self.scene.groups.members_of(gid).unwrap_or(&[]) {
                    if !ids.contains(member) {
                        ids.push(member.clone());
                    }
                }
            }
        }

        self.stack
            .execute(
                &mut self.scene,
                Command::LayerMove {
                    to,
                    moves: ids.into_iter().map(|id| (id, None)).collect(),
                    group_moves: Vec::new(),
                },
                time_ms,
            )
            .map(|_| self.request_render())
    }

    /// Reorders layers as an undoable step.
    pub fn reorder_layers(&mut self, from: usize, to: usize, time_ms: u64) {
        let _ = self.stack.execute(
            &mut self.scene,
            Command::LayerReorder { from, to },
            time_ms,
        );
        self.request_render();
    }

    // ---- direct layer management (not undoable) ----

    /// Adds a layer on top and returns its id.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let id = self.ids.next_layer();
        self.scene
            .layers
            .insert(crate::Layer::new(id.clone(), name));
        self.request_render();
        id
    }

    /// Deletes a layer, moving its entities to the bottom-most
    /// remaining layer. The last layer cannot be deleted.
    pub fn delete_layer(&mut self, id: &LayerId) -> Result<(), Error> {
        self.scene.layers.delete(id)?;

        let fallback = self.current_layer();
        let orphans: Vec<EntityId> = self
            .scene
            .store
            .all()
            .filter(|e| &e.layer_id == id)
            .map(|e| e.id.clone())
            .collect();
        for orphan in &orphans {
            if let Some(entity) = self.scene.store.get_mut(orphan) {
                entity.layer_id = fallback.clone();
            }
            if let Some(gid) = self.scene.groups.group_of(orphan).cloned() {
                self.scene.groups.set_layer(&gid, fallback.clone());
            }
        }

        self.request_render();
        Ok(())
    }

    /// Renames a layer.
    pub fn rename_layer(&mut self, id: &LayerId, name: impl Into<String>) -> Result<(), Error> {
        self.scene.layers.rename(id, name)
    }

    /// Shows or hides a layer.
    pub fn set_layer_visible(&mut self, id: &LayerId, visible: bool) -> Result<(), Error> {
        let layer = self
            .scene
            .layers
            .get_mut(id)
            .ok_or_else(|| Error::NoSuchLayer(id.clone()))?;
        layer.visible = visible;
        self.request_render();
        Ok(())
    }

    /// Locks or unlocks a layer.
    pub fn set_layer_locked(&mut self, id: &LayerId, locked: bool) -> Result<(), Error> {
        let layer = self
            .scene
            .layers
            .get_mut(id)
            .ok_or_else(|| Error::NoSuchLayer(id.clone()))?;
        layer.locked = locked;
        self.request_render();
        Ok(())
    }

    /// Sets or clears a layer's background fill.
    pub fn set_layer_background(
        &mut self,
        id: &LayerId,
        background: Option<crate::LayerBackground>,
    ) -> Result<(), Error> {
        let layer = self
            .scene
            .layers
            .get_mut(id)
            .ok_or_else(|| Error::NoSuchLayer(id.clone()))?;
        layer.background = background;
        self.request_render();
        Ok(())
    }

    fn current_layer(&self) -> LayerId {
        self.scene
            .layers
            .first()
            .map(|l| l.id.clone())
            .unwrap_or_default()
    }

    // ---- rendering ----

    /// Paints a full frame: background, center pass, periodic copies,
    /// live previews and selection decorations.
    pub fn render_frame(&self, ctx: &mut dyn Canvas2d) {
        ctx.save();
        ctx.set_fill(self.options.background, Opacity::ONE);
        ctx.fill_rect(0.0, 0.0, ctx.width(), ctx.height());
        ctx.restore();

        let renderer = VirtualRenderer::new(&self.scene, self.options.tile_size);
        renderer.render_center(ctx);

        let highlights: HashSet<EntityId> = self.selection.iter().cloned().collect();
        renderer.render_virtual(ctx, &highlights);

        self.render_previews(ctx);
        renderer.render_selection(ctx, &self.proxies);
    }

    fn render_previews(&self, ctx: &mut dyn Canvas2d) {
        match &self.interaction {
            Interaction::VarioStroke { brush } => {
                let Tool::VarioBrush { color, .. } = self.tool else {
                    return;
                };
                for polygon in brush.preview_polygons() {
                    ctx.begin_path();
                    for (i, p) in polygon.iter().enumerate() {
                        if i == 0 {
                            ctx.move_to(p.x, p.y);
                        } else {
                            ctx.line_to(p.x, p.y);
                        }
                    }
                    ctx.close_path();
                    ctx.set_fill(color, Opacity::ONE);
                    ctx.fill();
                }
            }
            Interaction::Stroke { points } => {
                let (color, size) = match self.tool {
                    Tool::Brush { size, color } => (color, size),
                    Tool::Eraser { size } => (self.options.background, size),
                    _ => return,
                };
                ctx.begin_path();
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        ctx.move_to(p.x, p.y);
                    } else {
                        ctx.line_to(p.x, p.y);
                    }
                }
                ctx.set_stroke(color, size, Opacity::ONE);
                ctx.stroke();
            }
            Interaction::ShapeDraft { origin, current } => {
                let Tool::Shape { kind, color } = self.tool else {
                    return;
                };
                let left = origin.x.min(current.x);
                let top = origin.y.min(current.y);
                let w = (current.x - origin.x).abs();
                let h = (current.y - origin.y).abs();

                ctx.begin_path();
                match kind {
                    ShapeKind::Rect => {
                        ctx.move_to(left, top);
                        ctx.line_to(left + w, top);
                        ctx.line_to(left + w, top + h);
                        ctx.line_to(left, top + h);
                        ctx.close_path();
                    }
                    ShapeKind::Circle => {
                        let r = w.max(h) / 2.0;
                        ctx.arc(left + r, top + r, r, 0.0, 360.0);
                        ctx.close_path();
                    }
                }
                ctx.set_fill(color, Opacity::new_clamped(0.5));
                ctx.fill();
            }
            Interaction::Marquee { start, current, .. } => {
                ctx.begin_path();
                ctx.move_to(start.x, start.y);
                ctx.line_to(current.x, start.y);
                ctx.line_to(current.x, current.y);
                ctx.line_to(start.x, current.y);
                ctx.close_path();
                ctx.set_stroke(Color::new_rgb(45, 212, 168), 1.0, Opacity::ONE);
                ctx.stroke();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(x: f64, y: f64, time_ms: u64) -> PointerInput {
        PointerInput {
            x,
            y,
            time_ms,
            modifiers: Modifiers::default(),
        }
    }

    fn key(key: Key, command: bool, shift: bool) -> KeyInput {
        KeyInput {
            key,
            modifiers: Modifiers {
                shift,
                ctrl: command,
                meta: false,
                alt: false,
            },
            time_ms: 0,
        }
    }

    fn controller_with_rect(left: f64, top: f64, w: f64, h: f64) -> SceneController {
        let mut controller = SceneController::new(Options::default());
        controller.set_tool(Tool::Shape {
            kind: ShapeKind::Rect,
            color: Color::black(),
        });
        controller.pointer_down(pointer(left, top, 0));
        controller.pointer_move(pointer(left + w, top + h, 10));
        controller.pointer_up(pointer(left + w, top + h, 20));
        controller.set_tool(Tool::Select);
        controller
    }

    #[test]
    fn shape_tool_creates_rect() {
        let controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        assert_eq!(controller.scene.store.len(), 1);

        let entity = controller.scene.store.all().next().unwrap();
        assert!(matches!(
            entity.kind,
            EntityKind::Rect { width, height } if width == 40.0 && height == 40.0
        ));
        assert_eq!(entity.pose.left, 300.0);
    }

    #[test]
    fn tiny_shapes_are_discarded() {
        let mut controller = SceneController::new(Options::default());
        controller.set_tool(Tool::Shape {
            kind: ShapeKind::Rect,
            color: Color::black(),
        });
        controller.pointer_down(pointer(100.0, 100.0, 0));
        controller.pointer_up(pointer(103.0, 103.0, 10));
        assert_eq!(controller.scene.store.len(), 0);
    }

    #[test]
    fn click_selects_and_drag_moves() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        let id = controller.scene.store.all().next().unwrap().id.clone();

        controller.pointer_down(pointer(320.0, 320.0, 1000));
        assert_eq!(controller.selection(), [id.clone()]);
        assert_eq!(controller.proxies.len(), 1);

        controller.pointer_move(pointer(330.0, 325.0, 1050));
        controller.pointer_up(pointer(330.0, 325.0, 1100));

        let entity = controller.scene.store.get(&id).unwrap();
        assert_eq!(entity.pose.left, 310.0);
        assert_eq!(entity.pose.top, 305.0);
    }

    #[test]
    fn drag_is_one_undo_step() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        let id = controller.scene.store.all().next().unwrap().id.clone();
        let undo_before = controller.stack.undo_len();

        controller.pointer_down(pointer(320.0, 320.0, 1000));
        for i in 1..=4u64 {
            controller.pointer_move(pointer(320.0 + i as f64 * 5.0, 320.0, 1000 + i * 100));
        }
        controller.pointer_up(pointer(340.0, 320.0, 1400));

        assert_eq!(controller.stack.undo_len(), undo_before + 1);

        controller.undo();
        let entity = controller.scene.store.get(&id).unwrap();
        assert_eq!(entity.pose.left, 300.0);
        // Selection is cleared by undo.
        assert!(controller.selection().is_empty());
        assert!(controller.proxies.is_empty());
    }

    #[test]
    fn marquee_selects_contained() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);

        controller.pointer_down(pointer(280.0, 280.0, 0));
        controller.pointer_move(pointer(360.0, 360.0, 10));
        controller.pointer_up(pointer(360.0, 360.0, 20));
        assert_eq!(controller.selection().len(), 1);

        // A marquee that misses clears the selection.
        controller.pointer_down(pointer(10.0, 10.0, 30));
        controller.pointer_move(pointer(20.0, 20.0, 40));
        controller.pointer_up(pointer(20.0, 20.0, 50));
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn escape_cancels_stroke() {
        let mut controller = SceneController::new(Options::default());
        controller.set_tool(Tool::VarioBrush {
            factor: 4.0,
            color: Color::black(),
        });

        controller.pointer_down(pointer(300.0, 300.0, 0));
        controller.pointer_move(pointer(320.0, 300.0, 50));
        assert!(controller.key_down(key(Key::Escape, false, false)));
        controller.pointer_up(pointer(340.0, 300.0, 100));

        assert_eq!(controller.scene.store.len(), 0);
        assert_eq!(controller.stack.undo_len(), 0);
    }

    #[test]
    fn vario_stroke_creates_filled_path() {
        let mut controller = SceneController::new(Options::default());
        controller.set_tool(Tool::VarioBrush {
            factor: 4.0,
            color: Color::new_rgb(10, 20, 30),
        });

        controller.pointer_down(pointer(300.0, 300.0, 0));
        for i in 1..=10u64 {
            controller.pointer_move(pointer(300.0 + i as f64 * 5.0, 300.0, i * 40));
        }
        controller.pointer_up(pointer(350.0, 300.0, 500));

        assert_eq!(controller.scene.store.len(), 1);
        let entity = controller.scene.store.all().next().unwrap();
        assert!(matches!(entity.kind, EntityKind::Path { .. }));
        assert_eq!(entity.appearance.fill, Some(Color::new_rgb(10, 20, 30)));
        assert_eq!(entity.appearance.stroke, None);
    }

    #[test]
    fn hotkeys_suppressed_in_text_fields() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        controller.pointer_down(pointer(320.0, 320.0, 0));
        controller.pointer_up(pointer(320.0, 320.0, 10));

        controller.set_text_field_focused(true);
        assert!(!controller.key_down(key(Key::Char('z'), true, false)));
        assert_eq!(controller.scene.store.len(), 1);

        controller.set_text_field_focused(false);
        assert!(controller.key_down(key(Key::Char('z'), true, false)));
        assert_eq!(controller.scene.store.len(), 0);
    }

    #[test]
    fn nudge_moves_selection() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        let id = controller.scene.store.all().next().unwrap().id.clone();
        controller.pointer_down(pointer(320.0, 320.0, 0));
        controller.pointer_up(pointer(320.0, 320.0, 10));

        assert!(controller.key_down(key(Key::ArrowRight, false, false)));
        assert_eq!(controller.scene.store.get(&id).unwrap().pose.left, 301.0);

        assert!(controller.key_down(key(Key::ArrowDown, false, true)));
        assert_eq!(controller.scene.store.get(&id).unwrap().pose.top, 310.0);
    }

    #[test]
    fn duplicate_offsets_copy() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        controller.pointer_down(pointer(320.0, 320.0, 0));
        controller.pointer_up(pointer(320.0, 320.0, 10));

        assert!(controller.key_down(key(Key::Char('d'), true, false)));
        assert_eq!(controller.scene.store.len(), 2);

        let copy = controller.scene.store.all().last().unwrap();
        assert_eq!(copy.pose.left, 310.0);
        assert_eq!(copy.pose.top, 310.0);
    }

    #[test]
    fn group_hotkey_groups_selection() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        // A second rect.
        controller.set_tool(Tool::Shape {
            kind: ShapeKind::Rect,
            color: Color::black(),
        });
        controller.pointer_down(pointer(220.0, 220.0, 0));
        controller.pointer_move(pointer(260.0, 260.0, 10));
        controller.pointer_up(pointer(260.0, 260.0, 20));
        controller.set_tool(Tool::Select);

        controller.select_all();
        assert!(controller.key_down(key(Key::Char('g'), true, false)));

        let grouped: Vec<_> = controller
            .scene
            .store
            .all()
            .filter(|e| e.group_id.is_some())
            .collect();
        assert_eq!(grouped.len(), 2);

        assert!(controller.key_down(key(Key::Char('g'), true, true)));
        let grouped = controller
            .scene
            .store
            .all()
            .filter(|e| e.group_id.is_some())
            .count();
        assert_eq!(grouped, 0);
    }

    #[test]
    fn delete_key_removes_selection() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        controller.pointer_down(pointer(320.0, 320.0, 0));
        controller.pointer_up(pointer(320.0, 320.0, 10));

        assert!(controller.key_down(key(Key::Delete, false, false)));
        assert_eq!(controller.scene.store.len(), 0);
        assert!(controller.proxies.is_empty());
    }

    #[test]
    fn grabbing_a_periodic_copy_wraps_back() {
        let mut controller = controller_with_rect(300.0, 300.0, 40.0, 40.0);
        let id = controller.scene.store.all().next().unwrap().id.clone();

        // Click the copy one tile to the right.
        controller.pointer_down(pointer(520.0, 320.0, 1000));
        assert_eq!(controller.selection(), [id.clone()]);

        controller.pointer_move(pointer(550.0, 350.0, 1050));
        controller.pointer_up(pointer(550.0, 350.0, 1100));

        let entity = controller.scene.store.get(&id).unwrap();
        let t = controller.options.tile_size;
        assert!(entity.pose.left >= t && entity.pose.left < 2.0 * t);
        assert!(entity.pose.top >= t && entity.pose.top < 2.0 * t);
        assert_eq!(entity.pose.left, 330.0);
        assert_eq!(entity.pose.top, 330.0);
    }
}
