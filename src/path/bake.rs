// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{PathItem, SvgPath};
use crate::transform::{Svd, Transform};

// Bakes an affine matrix into path coordinates, keeping the command
// structure: absolute pairs get the full matrix, relative pairs only the
// linear part. `H`/`V` turn into `L` since rotation tilts their direction.
// Arc radii and rotation are recomputed from the SVD of the combined
// ellipse matrix. A leading `m` is uppercased so a merged path always
// starts with an explicit `M`.
pub fn bake(path: &SvgPath, ts: Transform) -> SvgPath {
    if ts.is_identity() {
        return path.clone();
    }

    let mut items = Vec::with_capacity(path.len());

    // Current point in the source coordinate space. Needed to resolve the
    // missing coordinate of `H`/`V` before transforming.
    let mut cur = (0.0, 0.0);
    let mut start = (0.0, 0.0);
    let flips = (ts.a * ts.d - ts.b * ts.c) < 0.0;

    for (i, item) in path.items().iter().enumerate() {
        let mut item = *item;

        if let PathItem::MoveTo { abs: false, x, y } = item {
            if i == 0 {
                item = PathItem::MoveTo { abs: true, x, y };
            }
        }

        let baked = match item {
            PathItem::MoveTo { abs, x, y } => {
                let (x, y) = apply(&ts, abs, x, y);
                PathItem::MoveTo { abs, x, y }
            }
            PathItem::LineTo { abs, x, y } => {
                let (x, y) = apply(&ts, abs, x, y);
                PathItem::LineTo { abs, x, y }
            }
            PathItem::HorizontalLineTo { abs, x } => {
                if abs {
                    let (x, y) = ts.apply(x, cur.1);
                    PathItem::LineTo { abs: true, x, y }
                } else {
                    let (x, y) = ts.apply_linear(x, 0.0);
                    PathItem::LineTo { abs: false, x, y }
                }
            }
            PathItem::VerticalLineTo { abs, y } => {
                if abs {
                    let (x, y) = ts.apply(cur.0, y);
                    PathItem::LineTo { abs: true, x, y }
                } else {
                    let (x, y) = ts.apply_linear(0.0, y);
                    PathItem::LineTo { abs: false, x, y }
                }
            }
            PathItem::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let (x1, y1) = apply(&ts, abs, x1, y1);
                let (x2, y2) = apply(&ts, abs, x2, y2);
                let (x, y) = apply(&ts, abs, x, y);
                PathItem::CurveTo {
                    abs,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                }
            }
            PathItem::SmoothCurveTo { abs, x2, y2, x, y } => {
                let (x2, y2) = apply(&ts, abs, x2, y2);
                let (x, y) = apply(&ts, abs, x, y);
                PathItem::SmoothCurveTo { abs, x2, y2, x, y }
            }
            PathItem::Quadratic { abs, x1, y1, x, y } => {
                let (x1, y1) = apply(&ts, abs, x1, y1);
                let (x, y) = apply(&ts, abs, x, y);
                PathItem::Quadratic { abs, x1, y1, x, y }
            }
            PathItem::SmoothQuadratic { abs, x, y } => {
                let (x, y) = apply(&ts, abs, x, y);
                PathItem::SmoothQuadratic { abs, x, y }
            }
            PathItem::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let (rx, ry, x_axis_rotation) = bake_arc(&ts, rx, ry, x_axis_rotation);
                let (x, y) = apply(&ts, abs, x, y);
                PathItem::EllipticalArc {
                    abs,
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep: if flips { !sweep } else { sweep },
                    x,
                    y,
                }
            }
            PathItem::ClosePath { abs } => PathItem::ClosePath { abs },
        };

        // Track the untransformed current point.
        match item {
            PathItem::MoveTo { abs, x, y } => {
                cur = advance(abs, cur, x, y);
                start = cur;
            }
            PathItem::LineTo { abs, x, y }
            | PathItem::SmoothQuadratic { abs, x, y } => {
                cur = advance(abs, cur, x, y);
            }
            PathItem::HorizontalLineTo { abs, x } => {
                cur.0 = if abs { x } else { cur.0 + x };
            }
            PathItem::VerticalLineTo { abs, y } => {
                cur.1 = if abs { y } else { cur.1 + y };
            }
            PathItem::CurveTo { abs, x, y, .. }
            | PathItem::SmoothCurveTo { abs, x, y, .. }
            | PathItem::Quadratic { abs, x, y, .. }
            | PathItem::EllipticalArc { abs, x, y, .. } => {
                cur = advance(abs, cur, x, y);
            }
            PathItem::ClosePath { .. } => {
                cur = start;
            }
        }

        items.push(baked);
    }

    SvgPath::from_items(items)
}

#[inline]
fn apply(ts: &Transform, abs: bool, x: f64, y: f64) -> (f64, f64) {
    if abs {
        ts.apply(x, y)
    } else {
        ts.apply_linear(x, y)
    }
}

#[inline]
fn advance(abs: bool, cur: (f64, f64), x: f64, y: f64) -> (f64, f64) {
    if abs {
        (x, y)
    } else {
        (cur.0 + x, cur.1 + y)
    }
}

fn bake_arc(ts: &Transform, rx: f64, ry: f64, x_axis_rotation: f64) -> (f64, f64, f64) {
    // The ellipse is the image of the unit circle under
    // `M · R(theta) · diag(rx, ry)`; its singular values are the new radii.
    let ellipse = Transform::new(ts.a, ts.b, ts.c, ts.d, 0.0, 0.0)
        .pre_concat(Transform::from_rotate(x_axis_rotation))
        .pre_concat(Transform::from_scale(rx, ry));

    let svd = Svd::from_transform(&ellipse);
    (svd.sx.abs(), svd.sy.abs(), svd.theta.to_degrees())
}
