// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use kurbo::ParamCurveExtrema;

use super::{PathItem, SvgPath};
use crate::geom::Rect;
use crate::Transform;

/// An absolute path segment.
///
/// Can contain only `M`, `L`, `C` and `Z` segments.
/// All other commands are lowered into these.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub enum FlatSegment {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    CurveTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    Close,
}

/// A lowered path: absolute coordinates, cubic curves only.
///
/// This is what rendering and bbox computation consume.
#[derive(Clone, Default, Debug)]
pub struct FlatPath {
    segments: Vec<FlatSegment>,
}

impl FlatPath {
    /// Creates an empty path.
    #[inline]
    pub fn new() -> Self {
        FlatPath::default()
    }

    /// Returns `true` if the path contains no segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a slice of the path segments.
    #[inline]
    pub fn segments(&self) -> &[FlatSegment] {
        &self.segments
    }

    /// Pushes a MoveTo segment.
    #[inline]
    pub fn push_move_to(&mut self, x: f64, y: f64) {
        self.segments.push(FlatSegment::MoveTo { x, y });
    }

    /// Pushes a LineTo segment.
    #[inline]
    pub fn push_line_to(&mut self, x: f64, y: f64) {
        self.segments.push(FlatSegment::LineTo { x, y });
    }

    /// Pushes a CurveTo segment.
    #[inline]
    pub fn push_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.segments.push(FlatSegment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    /// Pushes a ClosePath segment.
    #[inline]
    pub fn push_close(&mut self) {
        self.segments.push(FlatSegment::Close);
    }

    /// Applies the transform to all coordinates.
    pub fn transform(&mut self, ts: Transform) {
        if ts.is_identity() {
            return;
        }

        for seg in &mut self.segments {
            match seg {
                FlatSegment::MoveTo { x, y } | FlatSegment::LineTo { x, y } => {
                    let (nx, ny) = ts.apply(*x, *y);
                    *x = nx;
                    *y = ny;
                }
                FlatSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let (nx1, ny1) = ts.apply(*x1, *y1);
                    let (nx2, ny2) = ts.apply(*x2, *y2);
                    let (nx, ny) = ts.apply(*x, *y);
                    *x1 = nx1;
                    *y1 = ny1;
                    *x2 = nx2;
                    *y2 = ny2;
                    *x = nx;
                    *y = ny;
                }
                FlatSegment::Close => {}
            }
        }
    }

    /// Calculates the path's bounding box.
    ///
    /// This operation is expensive.
    pub fn bbox(&self) -> Option<Rect> {
        let mut prev = (0.0, 0.0);
        let mut min = (f64::MAX, f64::MAX);
        let mut max = (f64::MIN, f64::MIN);
        let mut has_points = false;

        for seg in &self.segments {
            match *seg {
                FlatSegment::MoveTo { x, y } | FlatSegment::LineTo { x, y } => {
                    has_points = true;
                    prev = (x, y);
                    min = (min.0.min(x), min.1.min(y));
                    max = (max.0.max(x), max.1.max(y));
                }
                FlatSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    has_points = true;
                    let curve = kurbo::CubicBez::new(
                        kurbo::Point::new(prev.0, prev.1),
                        kurbo::Point::new(x1, y1),
                        kurbo::Point::new(x2, y2),
                        kurbo::Point::new(x, y),
                    );
                    let r = curve.bounding_box();
                    min = (min.0.min(r.x0), min.1.min(r.y0));
                    max = (max.0.max(r.x1), max.1.max(r.y1));
                    prev = (x, y);
                }
                FlatSegment::Close => {}
            }
        }

        if !has_points {
            return None;
        }

        Rect::new(min.0, min.1, max.0 - min.0, max.1 - min.1)
    }
}

pub fn flatten(path: &SvgPath) -> FlatPath {
    let mut out = FlatPath::new();

    // Current point and subpath start, in absolute coordinates.
    let mut cur = (0.0, 0.0);
    let mut start = (0.0, 0.0);
    // Control points needed by the S/T reflection rules.
    let mut prev_cubic_ctrl: Option<(f64, f64)> = None;
    let mut prev_quad_ctrl: Option<(f64, f64)> = None;

    for item in path.items() {
        let mut new_cubic_ctrl = None;
        let mut new_quad_ctrl = None;

        match *item {
            PathItem::MoveTo { abs, x, y } => {
                cur = absolute(abs, cur, x, y);
                start = cur;
                out.push_move_to(cur.0, cur.1);
            }
            PathItem::LineTo { abs, x, y } => {
                cur = absolute(abs, cur, x, y);
                out.push_line_to(cur.0, cur.1);
            }
            PathItem::HorizontalLineTo { abs, x } => {
                cur.0 = if abs { x } else { cur.0 + x };
                out.push_line_to(cur.0, cur.1);
            }
            PathItem::VerticalLineTo { abs, y } => {
                cur.1 = if abs { y } else { cur.1 + y };
                out.push_line_to(cur.0, cur.1);
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
                let p1 = absolute(abs, cur, x1, y1);
                let p2 = absolute(abs, cur, x2, y2);
                cur = absolute(abs, cur, x, y);
                out.push_curve_to(p1.0, p1.1, p2.0, p2.1, cur.0, cur.1);
                new_cubic_ctrl = Some(p2);
            }
            PathItem::SmoothCurveTo { abs, x2, y2, x, y } => {
                let p1 = reflect(prev_cubic_ctrl, cur);
                let p2 = absolute(abs, cur, x2, y2);
                cur = absolute(abs, cur, x, y);
                out.push_curve_to(p1.0, p1.1, p2.0, p2.1, cur.0, cur.1);
                new_cubic_ctrl = Some(p2);
            }
            PathItem::Quadratic { abs, x1, y1, x, y } => {
                let q = absolute(abs, cur, x1, y1);
                let end = absolute(abs, cur, x, y);
                push_quad(&mut out, cur, q, end);
                cur = end;
                new_quad_ctrl = Some(q);
            }
            PathItem::SmoothQuadratic { abs, x, y } => {
                let q = reflect(prev_quad_ctrl, cur);
                let end = absolute(abs, cur, x, y);
                push_quad(&mut out, cur, q, end);
                cur = end;
                new_quad_ctrl = Some(q);
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
                let end = absolute(abs, cur, x, y);
                push_arc(&mut out, cur, rx, ry, x_axis_rotation, large_arc, sweep, end);
                cur = end;
            }
            PathItem::ClosePath { .. } => {
                out.push_close();
                cur = start;
            }
        }

        prev_cubic_ctrl = new_cubic_ctrl;
        prev_quad_ctrl = new_quad_ctrl;
    }

    out
}

#[inline]
fn absolute(abs: bool, cur: (f64, f64), x: f64, y: f64) -> (f64, f64) {
    if abs {
        (x, y)
    } else {
        (cur.0 + x, cur.1 + y)
    }
}

#[inline]
fn reflect(ctrl: Option<(f64, f64)>, cur: (f64, f64)) -> (f64, f64) {
    match ctrl {
        Some((x, y)) => (cur.0 * 2.0 - x, cur.1 * 2.0 - y),
        None => cur,
    }
}

fn push_quad(out: &mut FlatPath, from: (f64, f64), q: (f64, f64), to: (f64, f64)) {
    #[inline]
    fn calc(n1: f64, n2: f64) -> f64 {
        (n1 + n2 * 2.0) / 3.0
    }

    out.push_curve_to(
        calc(from.0, q.0),
        calc(from.1, q.1),
        calc(to.0, q.0),
        calc(to.1, q.1),
        to.0,
        to.1,
    );
}

fn push_arc(
    out: &mut FlatPath,
    from: (f64, f64),
    rx: f64,
    ry: f64,
    x_axis_rotation: f64,
    large_arc: bool,
    sweep: bool,
    to: (f64, f64),
) {
    let svg_arc = kurbo::SvgArc {
        from: kurbo::Point::new(from.0, from.1),
        to: kurbo::Point::new(to.0, to.1),
        radii: kurbo::Vec2::new(rx, ry),
        x_rotation: x_axis_rotation.to_radians(),
        large_arc,
        sweep,
    };

    match kurbo::Arc::from_svg_arc(&svg_arc) {
        Some(arc) => {
            arc.to_cubic_beziers(0.1, |p1, p2, p| {
                out.push_curve_to(p1.x, p1.y, p2.x, p2.y, p.x, p.y);
            });
        }
        None => {
            out.push_line_to(to.0, to.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SvgPath;
    use super::*;

    fn flat(text: &str) -> FlatPath {
        SvgPath::from_str(text).unwrap().flatten()
    }

    #[test]
    fn relative_lowering() {
        let path = flat("m10 20l5 5v-3h2z");
        let segs = path.segments();
        assert!(matches!(segs[0], FlatSegment::MoveTo { x, y } if x == 10.0 && y == 20.0));
        assert!(matches!(segs[1], FlatSegment::LineTo { x, y } if x == 15.0 && y == 25.0));
        assert!(matches!(segs[2], FlatSegment::LineTo { x, y } if x == 15.0 && y == 22.0));
        assert!(matches!(segs[3], FlatSegment::LineTo { x, y } if x == 17.0 && y == 22.0));
        assert!(matches!(segs[4], FlatSegment::Close));
    }

    #[test]
    fn smooth_curve_reflection() {
        let path = flat("M0 0C0 10 10 10 10 0S20 -10 20 0");
        match path.segments()[2] {
            FlatSegment::CurveTo { x1, y1, .. } => {
                // Reflection of (10, 10) around (10, 0).
                assert_eq!((x1, y1), (10.0, -10.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn smooth_without_previous_curve() {
        let path = flat("M5 5S10 0 10 5");
        match path.segments()[1] {
            FlatSegment::CurveTo { x1, y1, .. } => {
                assert_eq!((x1, y1), (5.0, 5.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn quad_to_cubic() {
        let path = flat("M0 0Q10 0 10 10");
        match path.segments()[1] {
            FlatSegment::CurveTo { x1, y1, x2, y2, x, y } => {
                assert!((x1 - 20.0 / 3.0).abs() < 1e-9);
                assert_eq!(y1, 0.0);
                assert_eq!(x2, 10.0);
                assert!((y2 - 10.0 / 3.0).abs() < 1e-9);
                assert_eq!((x, y), (10.0, 10.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn arc_becomes_cubics() {
        let path = flat("M0 0A10 10 0 0 1 20 0");
        assert!(path
            .segments()
            .iter()
            .any(|s| matches!(s, FlatSegment::CurveTo { .. })));
        let bbox = path.bbox().unwrap();
        assert!(bbox.width() > 19.0 && bbox.width() < 21.0);
    }

    #[test]
    fn degenerate_arc_becomes_line() {
        let path = flat("M0 0A0 0 0 0 1 20 0");
        assert!(matches!(path.segments()[1], FlatSegment::LineTo { .. }));
    }

    #[test]
    fn bbox_of_line() {
        let bbox = flat("M250 250L260 260").bbox().unwrap();
        assert_eq!(
            (bbox.x(), bbox.y(), bbox.width(), bbox.height()),
            (250.0, 250.0, 10.0, 10.0)
        );
    }
}
