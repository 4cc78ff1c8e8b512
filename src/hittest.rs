// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::canvas::Canvas2d;
use crate::geom::{Point, Rect};
use crate::raster::RasterCanvas;
use crate::scene::Scene;
use crate::{Entity, EntityId, OptionLog};

/// A successful hit.
#[derive(Clone, PartialEq, Debug)]
pub struct Hit {
    /// The hit entity.
    pub id: EntityId,
    /// The tile offset of the copy that was hit.
    pub offset: (i32, i32),
    /// Bounding-box area, used to prefer small entities.
    pub area: f64,
}

/// Pixel-perfect hit-testing over the canonical set and its 25 periodic
/// copies.
pub struct HitTester<'a> {
    scene: &'a Scene,
    tile_size: f64,
}

impl<'a> HitTester<'a> {
    /// Creates a hit-tester over the scene.
    pub fn new(scene: &'a Scene, tile_size: f64) -> Self {
        HitTester { scene, tile_size }
    }

    /// Tile offsets sorted by Manhattan distance to the copy the user
    /// actually clicked, so the nearest copy wins ties.
    fn priority_offsets(&self, p: Point) -> Vec<(i32, i32)> {
        let ci = (p.x / self.tile_size).floor() as i32 - 1;
        let cj = (p.y / self.tile_size).floor() as i32 - 1;

        let mut offsets: Vec<(i32, i32)> = (-2..=2)
            .flat_map(|j| (-2..=2).map(move |i| (i, j)))
            .collect();
        offsets.sort_by_key(|&(i, j)| (i - ci).abs() + (j - cj).abs());
        offsets
    }

    /// Returns the topmost entity with an opaque pixel under `p`,
    /// preferring the one with the smallest bounding box.
    pub fn find(&self, p: Point) -> Option<Hit> {
        self.find_all(p).into_iter().next()
    }

    /// Returns every entity with an opaque pixel under `p`,
    /// smallest bounding box first.
    pub fn find_all(&self, p: Point) -> Vec<Hit> {
        let offsets = self.priority_offsets(p);
        let mut candidates = Vec::new();

        for id in self.scene.pick_order() {
            let Some(entity) = self.scene.store.get(&id) else {
                continue;
            };
            let bbox = entity.tile_bbox();

            for &(i, j) in &offsets {
                let local = Point::new(
                    p.x - i as f64 * self.tile_size,
                    p.y - j as f64 * self.tile_size,
                );

                if !bbox.contains(local) {
                    continue;
                }

                if probe(entity, bbox, local) {
                    candidates.push(Hit {
                        id: id.clone(),
                        offset: (i, j),
                        area: bbox.area(),
                    });
                    break;
                }
            }
        }

        // Stable: equal areas keep their z precedence.
        candidates.sort_by(|a, b| a.area.partial_cmp(&b.area).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }

    /// Returns entities whose bounding box at some offset is fully
    /// contained in the rectangle.
    pub fn find_in_rect(&self, tl: Point, br: Point) -> Vec<EntityId> {
        let Some(rect) = Rect::from_points(tl, br) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for id in self.scene.pick_order() {
            let Some(entity) = self.scene.store.get(&id) else {
                continue;
            };
            let bbox = entity.tile_bbox();

            for j in -2..=2 {
                for i in -2..=2 {
                    let shifted =
                        bbox.translate(i as f64 * self.tile_size, j as f64 * self.tile_size);
                    if rect.contains_rect(shifted) {
                        found.push(id.clone());
                        break;
                    }
                }
                if found.last() == Some(&id) {
                    break;
                }
            }
        }

        found
    }
}

// Renders the entity into a scratch canvas sized to its bounds and reads
// the alpha at the query point. Allocation failure degrades to the
// bounding-box answer.
fn probe(entity: &Entity, bbox: Rect, p: Point) -> bool {
    let width = bbox.width().ceil().max(1.0);
    let height = bbox.height().ceil().max(1.0);

    let mut scratch = match RasterCanvas::new(width, height, 1.0)
        .log_none(|| log::warn!("Failed to allocate a hit-test canvas for: {:?}.", bbox))
    {
        Some(v) => v,
        None => return true,
    };

    scratch.translate(-bbox.x(), -bbox.y());
    entity.render(&mut scratch);
    scratch.alpha_at(p.x - bbox.x(), p.y - bbox.y()) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, EntityKind, IdGen, Pose, Scene};

    fn scene_with_rect(id: &str, left: f64, top: f64, w: f64, h: f64) -> Scene {
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        let layer = scene.layers.first().unwrap().id.clone();
        scene.store.add(rect(id, &layer, left, top, w, h));
        scene
    }

    fn rect(id: &str, layer: &str, left: f64, top: f64, w: f64, h: f64) -> Entity {
        let mut entity = Entity::new(
            id.to_string(),
            layer.to_string(),
            EntityKind::Rect {
                width: w,
                height: h,
            },
        );
        entity.pose = Pose::at(left, top);
        entity
    }

    #[test]
    fn direct_hit() {
        let scene = scene_with_rect("a", 300.0, 300.0, 40.0, 40.0);
        let tester = HitTester::new(&scene, 200.0);

        let hit = tester.find(Point::new(320.0, 320.0)).unwrap();
        assert_eq!(hit.id, "a");
        assert_eq!(hit.offset, (0, 0));

        assert!(tester.find(Point::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn periodic_hit() {
        let scene = scene_with_rect("a", 300.0, 300.0, 40.0, 40.0);
        let tester = HitTester::new(&scene, 200.0);

        // One tile to the right of the canonical copy.
        let hit = tester.find(Point::new(520.0, 320.0)).unwrap();
        assert_eq!(hit.id, "a");
        assert_eq!(hit.offset, (1, 0));
    }

    #[test]
    fn smallest_bbox_wins() {
        let mut scene = scene_with_rect("big", 250.0, 250.0, 100.0, 100.0);
        let layer = scene.layers.first().unwrap().id.clone();
        // Small rect centered over the big one.
        scene.store.add(rect("small", &layer, 295.0, 295.0, 10.0, 10.0));

        let tester = HitTester::new(&scene, 200.0);
        let hit = tester.find(Point::new(300.0, 300.0)).unwrap();
        assert_eq!(hit.id, "small");

        // Move the small one aside and the big one is selected.
        scene.store.get_mut(&"small".to_string()).unwrap().pose.left = 370.0;
        let tester = HitTester::new(&scene, 200.0);
        let hit = tester.find(Point::new(300.0, 300.0)).unwrap();
        assert_eq!(hit.id, "big");
    }

    #[test]
    fn locked_layer_not_hit() {
        let mut scene = scene_with_rect("a", 300.0, 300.0, 40.0, 40.0);
        let layer = scene.layers.first().unwrap().id.clone();
        scene.layers.get_mut(&layer).unwrap().locked = true;

        let tester = HitTester::new(&scene, 200.0);
        assert!(tester.find(Point::new(320.0, 320.0)).is_none());
    }

    #[test]
    fn pixel_perfect_misses_hole() {
        // A thin diagonal stroke: the bbox covers the whole square,
        // but only pixels near the diagonal are opaque.
        let mut ids = IdGen::new();
        let mut scene = Scene::new(&mut ids);
        let layer = scene.layers.first().unwrap().id.clone();

        let data = crate::SvgPath::from_str("M250 250L330 330").unwrap();
        let mut entity = Entity::path_from_tile_coords(
            "line".to_string(),
            layer,
            data,
            crate::Appearance::stroked(crate::Color::black(), 2.0),
        );
        entity.pose.left = 250.0;
        entity.pose.top = 250.0;
        scene.store.add(entity);

        let tester = HitTester::new(&scene, 200.0);
        assert!(tester.find(Point::new(290.0, 290.0)).is_some());
        // Far off the diagonal, still inside the bbox.
        assert!(tester.find(Point::new(260.0, 320.0)).is_none());
    }

    #[test]
    fn rect_containment() {
        let scene = scene_with_rect("a", 300.0, 300.0, 40.0, 40.0);
        let tester = HitTester::new(&scene, 200.0);

        let found = tester.find_in_rect(Point::new(290.0, 290.0), Point::new(350.0, 350.0));
        assert_eq!(found, ["a".to_string()]);

        // Partial overlap does not count.
        let found = tester.find_in_rect(Point::new(290.0, 290.0), Point::new(320.0, 320.0));
        assert!(found.is_empty());

        // Full containment of a periodic copy counts.
        let found = tester.find_in_rect(Point::new(490.0, 290.0), Point::new(550.0, 350.0));
        assert_eq!(found, ["a".to_string()]);
    }
}
