// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::entity::{Appearance, Entity, EntityKind};
use crate::path::{PathItem, SvgPath};
use crate::Transform;

/// The outcome of a merge: one path with the first input's style.
#[derive(Clone, Debug)]
pub struct MergedPath {
    /// Combined path data, in tile coordinates.
    pub data: SvgPath,
    /// Style inherited from the first input.
    pub appearance: Appearance,
}

/// Merges path-convertible entities into a single path entity payload.
///
/// Every transform is baked into absolute coordinates. Returns `None`
/// when any input cannot be converted (raster images cannot) or when
/// fewer than two usable fragments remain.
pub fn merge_entities(entities: &[&Entity]) -> Option<MergedPath> {
    let mut fragments: Vec<(SvgPath, Transform)> = Vec::new();

    for entity in entities {
        let matrix = entity.matrix();
        match entity.kind {
            EntityKind::Path { ref data } => fragments.push((data.clone(), matrix)),
            EntityKind::Rect { width, height } => {
                fragments.push((rect_to_path(width, height, 0.0, 0.0), matrix));
            }
            EntityKind::Circle { radius } => {
                fragments.push((ellipse_to_path(radius, radius, radius, radius), matrix));
            }
            EntityKind::SvgGroup { ref children } => {
                for child in children {
                    fragments.push((child.data.clone(), matrix.pre_concat(child.transform)));
                }
            }
            EntityKind::Image { .. } => return None,
        }
    }

    let data = merge_fragments(&fragments)?;
    Some(MergedPath {
        data,
        appearance: entities.first()?.appearance,
    })
}

/// Bakes each fragment's matrix into its coordinates and concatenates
/// the results into one path that starts with an explicit `M`.
pub fn merge_fragments(fragments: &[(SvgPath, Transform)]) -> Option<SvgPath> {
    let usable: Vec<&(SvgPath, Transform)> =
        fragments.iter().filter(|(p, _)| !p.is_empty()).collect();
    if usable.len() < 2 {
        return None;
    }

    let mut merged = SvgPath::new();
    for (path, ts) in usable {
        merged.push_path(&path.bake_transform(*ts));
    }

    // The very first command must be an absolute MoveTo.
    let mut items = merged.items().to_vec();
    if let Some(PathItem::MoveTo { abs: false, x, y }) = items.first().copied() {
        items[0] = PathItem::MoveTo { abs: true, x, y };
    }

    Some(SvgPath::from_items(items))
}

/// Converts a rect with optional corner radii into path data,
/// according to the SVG shape rules.
pub fn rect_to_path(width: f64, height: f64, rx: f64, ry: f64) -> SvgPath {
    let mut rx = rx.max(0.0);
    let mut ry = ry.max(0.0);
    if rx == 0.0 && ry > 0.0 {
        rx = ry;
    }
    if ry == 0.0 && rx > 0.0 {
        ry = rx;
    }
    rx = rx.min(width / 2.0);
    ry = ry.min(height / 2.0);

    let mut path = SvgPath::new();
    if rx == 0.0 {
        path.push(PathItem::MoveTo {
            abs: true,
            x: 0.0,
            y: 0.0,
        });
        path.push(PathItem::HorizontalLineTo { abs: true, x: width });
        path.push(PathItem::VerticalLineTo {
            abs: true,
            y: height,
        });
        path.push(PathItem::HorizontalLineTo { abs: true, x: 0.0 });
        path.push(PathItem::ClosePath { abs: true });
        return path;
    }

    path.push(PathItem::MoveTo {
        abs: true,
        x: rx,
        y: 0.0,
    });
    path.push(PathItem::HorizontalLineTo {
        abs: true,
        x: width - rx,
    });
    path.push(arc_to(rx, ry, width, ry));
    path.push(PathItem::VerticalLineTo {
        abs: true,
        y: height - ry,
    });
    path.push(arc_to(rx, ry, width - rx, height));
    path.push(PathItem::HorizontalLineTo { abs: true, x: rx });
    path.push(arc_to(rx, ry, 0.0, height - ry));
    path.push(PathItem::VerticalLineTo { abs: true, y: ry });
    path.push(arc_to(rx, ry, rx, 0.0));
    path.push(PathItem::ClosePath { abs: true });
    path
}

/// Converts an ellipse centered at `(cx, cy)` into four arcs.
pub fn ellipse_to_path(cx: f64, cy: f64, rx: f64, ry: f64) -> SvgPath {
    let mut path = SvgPath::new();
    path.push(PathItem::MoveTo {
        abs: true,
        x: cx + rx,
        y: cy,
    });
    path.push(arc_to(rx, ry, cx, cy + ry));
    path.push(arc_to(rx, ry, cx - rx, cy));
    path.push(arc_to(rx, ry, cx, cy - ry));
    path.push(arc_to(rx, ry, cx + rx, cy));
    path.push(PathItem::ClosePath { abs: true });
    path
}

/// Converts a point list into `M L … [z]` path data.
pub fn points_to_path(points: &[(f64, f64)], closed: bool) -> Option<SvgPath> {
    if points.len() < 2 {
        return None;
    }

    let mut path = SvgPath::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            path.push(PathItem::MoveTo { abs: true, x, y });
        } else {
            path.push(PathItem::LineTo { abs: true, x, y });
        }
    }
    if closed {
        path.push(PathItem::ClosePath { abs: true });
    }
    Some(path)
}

#[inline]
fn arc_to(rx: f64, ry: f64, x: f64, y: f64) -> PathItem {
    PathItem::EllipticalArc {
        abs: true,
        rx,
        ry,
        x_axis_rotation: 0.0,
        large_arc: false,
        sweep: true,
        x,
        y,
    }
}
