// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashSet;

use crate::canvas::{Canvas2d, Shadow};
use crate::proxy::ProxyManager;
use crate::scene::Scene;
use crate::{Color, EntityId, Opacity};

/// Fill color of the selection glow.
const GLOW_COLOR: Color = Color {
    red: 45,
    green: 212,
    blue: 168,
};
const GLOW_FILL_ALPHA: f64 = 0.3;
const GLOW_SHADOW_ALPHA: f64 = 0.8;
const GLOW_SHADOW_BLUR: f64 = 5.0;
const GLOW_MIN_SIZE: f64 = 24.0;
const GLOW_CORNER: f64 = 6.0;

/// The 24 non-center offsets of the 5×5 tile grid.
///
/// 5×5 rather than 3×3, so that entities straddling a tile boundary keep
/// all their visible copies even after scaling and rotation.
pub fn virtual_offsets() -> impl Iterator<Item = (i32, i32)> {
    (-2..=2)
        .flat_map(|j| (-2..=2).map(move |i| (i, j)))
        .filter(|&(i, j)| !(i == 0 && j == 0))
}

/// Paints the scene as an infinite periodic tiling.
///
/// Rendering is a pure function of the scene, the highlight set and the
/// tile size; no state is retained between frames.
pub struct VirtualRenderer<'a> {
    scene: &'a Scene,
    tile_size: f64,
}

impl<'a> VirtualRenderer<'a> {
    /// Creates a renderer over the scene.
    pub fn new(scene: &'a Scene, tile_size: f64) -> Self {
        VirtualRenderer { scene, tile_size }
    }

    /// The standard center pass: layer backgrounds, then the `(0, 0)`
    /// copy of every visible entity in paint order.
    pub fn render_center(&self, ctx: &mut dyn Canvas2d) {
        for layer in self.scene.layers.iter() {
            if !layer.visible {
                continue;
            }

            if let Some(background) = layer.background {
                ctx.save();
                ctx.set_fill(background.color, background.alpha);
                ctx.fill_rect(0.0, 0.0, ctx.width(), ctx.height());
                ctx.restore();
            }

            for entity in self.scene.paint_order() {
                if entity.layer_id == layer.id && self.scene.effective_visible(entity) {
                    entity.render(ctx);
                }
            }
        }
    }

    /// The virtual pass: the 24 periodic copies of every visible entity,
    /// with a glow behind highlighted ones.
    pub fn render_virtual(&self, ctx: &mut dyn Canvas2d, highlights: &HashSet<EntityId>) {
        let t = self.tile_size;

        for entity in self.scene.paint_order() {
            if !self.scene.effective_visible(entity) {
                continue;
            }

            let highlighted = highlights.contains(&entity.id);
            for (i, j) in virtual_offsets() {
                ctx.save();
                ctx.translate(i as f64 * t, j as f64 * t);
                if highlighted {
                    self.render_glow(ctx, entity);
                }
                entity.render(ctx);
                ctx.restore();
            }
        }
    }

    /// Draws selection decorations for the active proxies, on top of
    /// everything else.
    pub fn render_selection(&self, ctx: &mut dyn Canvas2d, proxies: &ProxyManager) {
        for proxy in proxies.all() {
            let Some(entity) = self.scene.store.get(&proxy.entity_id) else {
                continue;
            };

            let bounds = entity.local_bbox();
            ctx.save();
            ctx.concat(proxy.pose.matrix(bounds));
            ctx.set_stroke(
                GLOW_COLOR,
                1.0,
                Opacity::new_clamped(GLOW_SHADOW_ALPHA),
            );
            ctx.begin_path();
            ctx.move_to(bounds.x(), bounds.y());
            ctx.line_to(bounds.right(), bounds.y());
            ctx.line_to(bounds.right(), bounds.bottom());
            ctx.line_to(bounds.x(), bounds.bottom());
            ctx.close_path();
            ctx.stroke();
            ctx.restore();
        }
    }

    fn render_glow(&self, ctx: &mut dyn Canvas2d, entity: &crate::Entity) {
        let bbox = entity.tile_bbox();
        let w = bbox.width().max(GLOW_MIN_SIZE);
        let h = bbox.height().max(GLOW_MIN_SIZE);
        let x = bbox.x() + bbox.width() / 2.0 - w / 2.0;
        let y = bbox.y() + bbox.height() / 2.0 - h / 2.0;
        let r = GLOW_CORNER.min(w / 2.0).min(h / 2.0);

        ctx.save();
        ctx.set_shadow(Some(Shadow {
            blur: GLOW_SHADOW_BLUR,
            color: GLOW_COLOR,
            opacity: Opacity::new_clamped(GLOW_SHADOW_ALPHA),
        }));
        ctx.set_fill(GLOW_COLOR, Opacity::new_clamped(GLOW_FILL_ALPHA));

        ctx.begin_path();
        ctx.move_to(x + r, y);
        ctx.line_to(x + w - r, y);
        ctx.quadratic_curve_to(x + w, y, x + w, y + r);
        ctx.line_to(x + w, y + h - r);
        ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
        ctx.line_to(x + r, y + h);
        ctx.quadratic_curve_to(x, y + h, x, y + h - r);
        ctx.line_to(x, y + r);
        ctx.quadratic_curve_to(x, y, x + r, y);
        ctx.close_path();
        ctx.fill();
        ctx.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_cover_5x5_without_center() {
        let offsets: Vec<_> = virtual_offsets().collect();
        assert_eq!(offsets.len(), 24);
        assert!(!offsets.contains(&(0, 0)));
        assert!(offsets.contains(&(-2, -2)));
        assert!(offsets.contains(&(2, 2)));
        assert!(offsets.contains(&(1, 0)));
    }
}
