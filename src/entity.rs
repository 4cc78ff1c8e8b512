// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::canvas::{Canvas2d, ImageData};
use crate::geom::Rect;
use crate::path::{FlatSegment, SvgPath};
use crate::{Color, EntityId, GroupId, LayerId, Opacity, Transform};

/// Horizontal anchor of an entity's pose.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor of an entity's pose.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Placement of an entity on the tile.
///
/// `(left, top)` is where the origin anchor lands; rotation, skew and
/// scale are applied about that anchor. Angles are in degrees.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Pose {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub skew_x: f64,
    pub skew_y: f64,
    pub origin_x: OriginX,
    pub origin_y: OriginY,
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
            skew_x: 0.0,
            skew_y: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
        }
    }
}

impl Pose {
    /// Creates a pose at the specified position.
    pub fn at(left: f64, top: f64) -> Self {
        Pose {
            left,
            top,
            ..Pose::default()
        }
    }

    /// The local-space anchor point for the given local bounds.
    pub fn origin_point(&self, bounds: Rect) -> (f64, f64) {
        let x = match self.origin_x {
            OriginX::Left => bounds.x(),
            OriginX::Center => bounds.x() + bounds.width() / 2.0,
            OriginX::Right => bounds.right(),
        };
        let y = match self.origin_y {
            OriginY::Top => bounds.y(),
            OriginY::Center => bounds.y() + bounds.height() / 2.0,
            OriginY::Bottom => bounds.bottom(),
        };
        (x, y)
    }

    /// The local-to-tile matrix for the given local bounds.
    pub fn matrix(&self, bounds: Rect) -> Transform {
        let (ox, oy) = self.origin_point(bounds);
        let sx = if self.flip_x { -self.scale_x } else { self.scale_x };
        let sy = if self.flip_y { -self.scale_y } else { self.scale_y };

        Transform::from_translate(self.left, self.top)
            .pre_concat(Transform::from_rotate(self.angle))
            .pre_concat(Transform::from_skew_x(self.skew_x))
            .pre_concat(Transform::from_skew_y(self.skew_y))
            .pre_concat(Transform::from_scale(sx, sy))
            .pre_concat(Transform::from_translate(-ox, -oy))
    }
}

/// Fill, stroke and opacity of an entity.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Appearance {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub opacity: Opacity,
}

impl Default for Appearance {
    fn default() -> Self {
        Appearance {
            fill: Some(Color::black()),
            stroke: None,
            stroke_width: 1.0,
            opacity: Opacity::ONE,
        }
    }
}

impl Appearance {
    /// A stroke-only appearance.
    pub fn stroked(color: Color, width: f64) -> Self {
        Appearance {
            fill: None,
            stroke: Some(color),
            stroke_width: width,
            opacity: Opacity::ONE,
        }
    }

    /// A fill-only appearance.
    pub fn filled(color: Color) -> Self {
        Appearance {
            fill: Some(color),
            stroke: None,
            stroke_width: 1.0,
            opacity: Opacity::ONE,
        }
    }
}

/// One flattened child of an imported SVG group.
#[derive(Clone, PartialEq, Debug)]
pub struct SvgChild {
    /// Child geometry, already converted to path data at import.
    pub data: SvgPath,
    /// The child's matrix inside the group's local space.
    pub transform: Transform,
    /// The child's own style.
    pub appearance: Appearance,
}

/// Kind-specific geometry of an entity.
#[derive(Clone, PartialEq, Debug)]
pub enum EntityKind {
    /// Vector path in local coordinates.
    Path {
        /// The path data.
        data: SvgPath,
    },
    /// Axis-aligned rectangle with local bounds `(0, 0, width, height)`.
    Rect {
        /// Width before scaling.
        width: f64,
        /// Height before scaling.
        height: f64,
    },
    /// Circle with local bounds `(0, 0, 2r, 2r)`.
    Circle {
        /// Radius before scaling.
        radius: f64,
    },
    /// Imported raster image at its natural size.
    Image {
        /// Decoded pixels.
        data: ImageData,
    },
    /// Imported vector document, flattened into path children.
    SvgGroup {
        /// Flattened children, in paint order.
        children: Vec<SvgChild>,
    },
}

/// The authoritative instance of one user-visible primitive.
#[derive(Clone, PartialEq, Debug)]
pub struct Entity {
    /// Unique id, stable for the entity's lifetime.
    pub id: EntityId,
    /// Optional user-facing name.
    pub name: Option<String>,
    /// Kind-specific geometry.
    pub kind: EntityKind,
    /// Placement on the tile.
    pub pose: Pose,
    /// Fill/stroke/opacity.
    pub appearance: Appearance,
    /// Owning layer.
    pub layer_id: LayerId,
    /// Group membership, if any.
    pub group_id: Option<GroupId>,
    /// Entity-level visibility flag.
    pub visible: bool,
    /// Entity-level lock flag.
    pub locked: bool,
}

impl Entity {
    /// Creates a new entity with a default pose and appearance.
    pub fn new(id: EntityId, layer_id: LayerId, kind: EntityKind) -> Self {
        Entity {
            id,
            name: None,
            kind,
            pose: Pose::default(),
            appearance: Appearance::default(),
            layer_id,
            group_id: None,
            visible: true,
            locked: false,
        }
    }

    /// Creates a path entity from path data in tile coordinates.
    ///
    /// The geometry is shifted into local space and the pose positioned
    /// at the original bounds, so the entity renders exactly where it
    /// was drawn.
    pub fn path_from_tile_coords(
        id: EntityId,
        layer_id: LayerId,
        data: SvgPath,
        appearance: Appearance,
    ) -> Self {
        let bbox = data.flatten().bbox().unwrap_or_else(Rect::zero);
        let local = data.translated(-bbox.x(), -bbox.y());

        let mut entity = Entity::new(id, layer_id, EntityKind::Path { data: local });
        entity.pose = Pose::at(bbox.x(), bbox.y());
        entity.appearance = appearance;
        entity
    }

    /// Local-space bounds, before the pose is applied.
    pub fn local_bbox(&self) -> Rect {
        let zero = Rect::zero;
        match self.kind {
            EntityKind::Path { ref data } => data.flatten().bbox().unwrap_or_else(zero),
            EntityKind::Rect { width, height } => {
                Rect::new(0.0, 0.0, width, height).unwrap_or_else(zero)
            }
            EntityKind::Circle { radius } => {
                Rect::new(0.0, 0.0, radius * 2.0, radius * 2.0).unwrap_or_else(zero)
            }
            EntityKind::Image { ref data } => {
                Rect::new(0.0, 0.0, data.width as f64, data.height as f64).unwrap_or_else(zero)
            }
            EntityKind::SvgGroup { ref children } => {
                let mut bbox: Option<Rect> = None;
                for child in children {
                    let mut flat = child.data.flatten();
                    flat.transform(child.transform);
                    if let Some(b) = flat.bbox() {
                        bbox = Some(match bbox {
                            Some(acc) => acc.union(b),
                            None => b,
                        });
                    }
                }
                bbox.unwrap_or_else(zero)
            }
        }
    }

    /// Untransformed width, used as the proxy base size.
    pub fn width(&self) -> f64 {
        self.local_bbox().width()
    }

    /// Untransformed height, used as the proxy base size.
    pub fn height(&self) -> f64 {
        self.local_bbox().height()
    }

    /// The local-to-tile matrix.
    pub fn matrix(&self) -> Transform {
        self.pose.matrix(self.local_bbox())
    }

    /// Tile-space axis-aligned bounds, including half the stroke width.
    pub fn tile_bbox(&self) -> Rect {
        let mut local = self.local_bbox();
        if self.appearance.stroke.is_some() {
            if let Some(expanded) = local.expand(self.appearance.stroke_width / 2.0) {
                local = expanded;
            }
        }

        let ts = self.matrix();
        let corners = [
            ts.apply(local.x(), local.y()),
            ts.apply(local.right(), local.y()),
            ts.apply(local.right(), local.bottom()),
            ts.apply(local.x(), local.bottom()),
        ];

        let minx = corners.iter().map(|p| p.0).fold(f64::MAX, f64::min);
        let miny = corners.iter().map(|p| p.1).fold(f64::MAX, f64::min);
        let maxx = corners.iter().map(|p| p.0).fold(f64::MIN, f64::max);
        let maxy = corners.iter().map(|p| p.1).fold(f64::MIN, f64::max);

        Rect::new(minx, miny, maxx - minx, maxy - miny).unwrap_or_else(Rect::zero)
    }

    /// Paints the entity into the context at its pose.
    pub fn render(&self, ctx: &mut dyn Canvas2d) {
        ctx.save();
        ctx.concat(self.matrix());

        match self.kind {
            EntityKind::Path { ref data } => {
                trace_flat(ctx, &data.flatten());
                paint(ctx, &self.appearance, Opacity::ONE);
            }
            EntityKind::Rect { width, height } => {
                ctx.begin_path();
                ctx.move_to(0.0, 0.0);
                ctx.line_to(width, 0.0);
                ctx.line_to(width, height);
                ctx.line_to(0.0, height);
                ctx.close_path();
                paint(ctx, &self.appearance, Opacity::ONE);
            }
            EntityKind::Circle { radius } => {
                ctx.begin_path();
                ctx.arc(radius, radius, radius, 0.0, 360.0);
                ctx.close_path();
                paint(ctx, &self.appearance, Opacity::ONE);
            }
            EntityKind::Image { ref data } => {
                ctx.draw_image(
                    data,
                    0.0,
                    0.0,
                    data.width as f64,
                    data.height as f64,
                    self.appearance.opacity,
                );
            }
            EntityKind::SvgGroup { ref children } => {
                for child in children {
                    ctx.save();
                    ctx.concat(child.transform);
                    trace_flat(ctx, &child.data.flatten());
                    paint(ctx, &child.appearance, self.appearance.opacity);
                    ctx.restore();
                }
            }
        }

        ctx.restore();
    }
}

fn trace_flat(ctx: &mut dyn Canvas2d, flat: &crate::path::FlatPath) {
    ctx.begin_path();
    for seg in flat.segments() {
        match *seg {
            FlatSegment::MoveTo { x, y } => ctx.move_to(x, y),
            FlatSegment::LineTo { x, y } => ctx.line_to(x, y),
            FlatSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => ctx.bezier_curve_to(x1, y1, x2, y2, x, y),
            FlatSegment::Close => ctx.close_path(),
        }
    }
}

fn paint(ctx: &mut dyn Canvas2d, appearance: &Appearance, parent_opacity: Opacity) {
    let opacity = Opacity::new_clamped(appearance.opacity.get() * parent_opacity.get());

    if let Some(color) = appearance.fill {
        ctx.set_fill(color, opacity);
        ctx.fill();
    }

    if let Some(color) = appearance.stroke {
        ctx.set_stroke(color, appearance.stroke_width, opacity);
        ctx.stroke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_matrix_translation_only() {
        let pose = Pose::at(300.0, 300.0);
        let ts = pose.matrix(Rect::new(0.0, 0.0, 40.0, 40.0).unwrap());
        assert_eq!(ts.apply(0.0, 0.0), (300.0, 300.0));
        assert_eq!(ts.apply(40.0, 40.0), (340.0, 340.0));
    }

    #[test]
    fn pose_matrix_center_origin_rotation() {
        let mut pose = Pose::at(100.0, 100.0);
        pose.origin_x = OriginX::Center;
        pose.origin_y = OriginY::Center;
        pose.angle = 180.0;

        let ts = pose.matrix(Rect::new(0.0, 0.0, 20.0, 20.0).unwrap());
        // The anchor stays fixed under rotation.
        let (x, y) = ts.apply(10.0, 10.0);
        assert!((x - 100.0).abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9);
        // A corner swings to the opposite side.
        let (x, y) = ts.apply(0.0, 0.0);
        assert!((x - 110.0).abs() < 1e-9);
        assert!((y - 110.0).abs() < 1e-9);
    }

    #[test]
    fn path_from_tile_coords_is_local() {
        let data = SvgPath::from_str("M250 250L260 260").unwrap();
        let entity = Entity::path_from_tile_coords(
            "e1".to_string(),
            "l1".to_string(),
            data,
            Appearance::default(),
        );

        assert_eq!(entity.pose.left, 250.0);
        assert_eq!(entity.pose.top, 250.0);
        let local = entity.local_bbox();
        assert_eq!((local.x(), local.y()), (0.0, 0.0));
        assert_eq!((local.width(), local.height()), (10.0, 10.0));

        let world = entity.tile_bbox();
        assert_eq!((world.x(), world.y()), (250.0, 250.0));
    }

    #[test]
    fn scaled_tile_bbox() {
        let mut entity = Entity::new(
            "e1".to_string(),
            "l1".to_string(),
            EntityKind::Rect {
                width: 40.0,
                height: 40.0,
            },
        );
        entity.pose = Pose::at(300.0, 300.0);
        entity.pose.scale_x = 2.0;

        let bbox = entity.tile_bbox();
        assert_eq!(bbox.width(), 80.0);
        assert_eq!(bbox.height(), 40.0);
    }
}
