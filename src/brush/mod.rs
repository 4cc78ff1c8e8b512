// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The freehand stroke engines: speed-sensitive width sampling,
//! polygon-union outlines and cubic Bézier fitting.

mod fit;
mod outline;

pub use outline::{disc, quad_between, stroke_outline};

use geo::{LineString, SimplifyIdx};

use crate::geom::Point;
use crate::path::{PathItem, SvgPath};

/// One accepted pointer sample with its computed stroke width.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BrushSample {
    /// Sample position, in tile coordinates.
    pub point: Point,
    /// Stroke width at this sample.
    pub width: f64,
}

const MIN_SPEED: f64 = 10.0;
const FADE_IN_MS: f64 = 1000.0;
const SMOOTHING: f64 = 0.7;
const SIMPLIFY_TOLERANCE: f64 = 3.0;
const FIT_TOLERANCE: f64 = 2.0;

/// The variable-width stroke engine.
///
/// Live pointer samples stream in through [`add`](VarioBrush::add); the
/// width follows the inverse of the pointer speed, with a one-second
/// fade-in and an exponential low-pass. [`finish`](VarioBrush::finish)
/// turns the accepted samples into one filled outline path.
#[derive(Debug)]
pub struct VarioBrush {
    size_factor: f64,
    samples: Vec<BrushSample>,
    start_ms: Option<u64>,
    last: Option<(Point, u64)>,
    prev_width: f64,
}

impl VarioBrush {
    /// Creates a brush with the given size factor.
    pub fn new(size_factor: f64) -> Self {
        VarioBrush {
            size_factor: size_factor.max(0.5),
            samples: Vec::new(),
            start_ms: None,
            last: None,
            prev_width: 0.0,
        }
    }

    /// The accepted samples so far.
    pub fn samples(&self) -> &[BrushSample] {
        &self.samples
    }

    /// Feeds one pointer sample.
    ///
    /// Samples closer than 1 px or 1 ms to their predecessor are dropped.
    pub fn add(&mut self, point: Point, time_ms: u64) {
        let Some((last_point, last_ms)) = self.last else {
            self.start_ms = Some(time_ms);
            self.last = Some((point, time_ms));
            return;
        };

        let dt = time_ms.saturating_sub(last_ms) as f64;
        let dist = last_point.distance(point);
        if dt < 1.0 || dist < 1.0 {
            return;
        }

        let speed = (dist / dt * 1000.0).max(MIN_SPEED);
        let target = (self.size_factor * 100.0 / speed).clamp(1.0, 2.0 * self.size_factor);

        let start_ms = self.start_ms.unwrap_or(last_ms);
        let fade = ((time_ms.saturating_sub(start_ms)) as f64 / FADE_IN_MS).min(1.0);
        let faded = target * fade;

        let width = SMOOTHING * self.prev_width + (1.0 - SMOOTHING) * faded;
        self.prev_width = width;

        if self.samples.is_empty() {
            self.samples.push(BrushSample {
                point: last_point,
                width,
            });
        }
        self.samples.push(BrushSample { point, width });
        self.last = Some((point, time_ms));
    }

    /// Cheap live preview: the stroke's quads and discs without union.
    pub fn preview_polygons(&self) -> Vec<Vec<Point>> {
        let mut polygons = Vec::new();
        for pair in self.samples.windows(2) {
            if let Some(quad) = quad_between(&pair[0], &pair[1]) {
                polygons.push(quad);
            }
        }
        for sample in &self.samples {
            polygons.push(disc(sample));
        }
        polygons
    }

    /// Ends the stroke and produces the outline path, in tile
    /// coordinates. `None` when no pointer ever came down.
    pub fn finish(self) -> Option<SvgPath> {
        let samples = if self.samples.is_empty() {
            // A click without movement still leaves a dot.
            let (p, _) = self.last?;
            vec![
                BrushSample {
                    point: p,
                    width: self.size_factor,
                },
                BrushSample {
                    point: Point::new(p.x + 0.1, p.y + 0.1),
                    width: self.size_factor,
                },
            ]
        } else {
            simplify_samples(&self.samples, SIMPLIFY_TOLERANCE)
        };

        let ring = stroke_outline(&samples)?;
        Some(ring_to_path(&ring))
    }
}

// Douglas-Peucker over the sample polyline; widths re-attach to the
// retained points by index.
fn simplify_samples(samples: &[BrushSample], tolerance: f64) -> Vec<BrushSample> {
    if samples.len() <= 2 {
        return samples.to_vec();
    }

    let line: LineString<f64> =
        LineString::from(samples.iter().map(|s| (s.point.x, s.point.y)).collect::<Vec<_>>());
    let mut kept = line.simplify_idx(&tolerance);
    kept.sort_unstable();

    kept.into_iter().map(|i| samples[i]).collect()
}

fn ring_to_path(ring: &[Point]) -> SvgPath {
    // Close the ring for fitting, then emit cubics.
    let mut closed: Vec<kurbo::Point> = ring.iter().map(|p| kurbo::Point::new(p.x, p.y)).collect();
    if let Some(first) = closed.first().copied() {
        closed.push(first);
    }

    match fit::fit_curve(&closed, FIT_TOLERANCE) {
        Some(curves) => {
            let mut path = SvgPath::new();
            if let Some(first) = curves.first() {
                path.push(PathItem::MoveTo {
                    abs: true,
                    x: first.p0.x,
                    y: first.p0.y,
                });
            }
            for bez in &curves {
                path.push(PathItem::CurveTo {
                    abs: true,
                    x1: bez.p1.x,
                    y1: bez.p1.y,
                    x2: bez.p2.x,
                    y2: bez.p2.y,
                    x: bez.p3.x,
                    y: bez.p3.y,
                });
            }
            path.push(PathItem::ClosePath { abs: true });
            path
        }
        None => polyline_path(ring),
    }
}

/// A plain `M L … Z` path through the points.
pub fn polyline_path(points: &[Point]) -> SvgPath {
    let mut path = SvgPath::new();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            path.push(PathItem::MoveTo {
                abs: true,
                x: p.x,
                y: p.y,
            });
        } else {
            path.push(PathItem::LineTo {
                abs: true,
                x: p.x,
                y: p.y,
            });
        }
    }
    path.push(PathItem::ClosePath { abs: true });
    path
}

/// Fits a smooth open path through raw pointer points, for the
/// fixed-width brush and eraser. Falls back to the raw polyline.
pub fn fit_stroke_path(points: &[Point]) -> Option<SvgPath> {
    if points.is_empty() {
        return None;
    }
    if points.len() == 1 {
        let p = points[0];
        let mut path = SvgPath::new();
        path.push(PathItem::MoveTo {
            abs: true,
            x: p.x,
            y: p.y,
        });
        path.push(PathItem::LineTo {
            abs: true,
            x: p.x + 0.1,
            y: p.y + 0.1,
        });
        return Some(path);
    }

    let line: LineString<f64> =
        LineString::from(points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>());
    let mut kept = line.simplify_idx(&SIMPLIFY_TOLERANCE);
    kept.sort_unstable();
    let simplified: Vec<kurbo::Point> = kept
        .into_iter()
        .map(|i| kurbo::Point::new(points[i].x, points[i].y))
        .collect();

    match fit::fit_curve(&simplified, FIT_TOLERANCE) {
        Some(curves) => {
            let mut path = SvgPath::new();
            if let Some(first) = curves.first() {
                path.push(PathItem::MoveTo {
                    abs: true,
                    x: first.p0.x,
                    y: first.p0.y,
                });
            }
            for bez in &curves {
                path.push(PathItem::CurveTo {
                    abs: true,
                    x1: bez.p1.x,
                    y1: bez.p1.y,
                    x2: bez.p2.x,
                    y2: bez.p2.y,
                    x: bez.p3.x,
                    y: bez.p3.y,
                });
            }
            Some(path)
        }
        None => {
            let mut path = SvgPath::new();
            for (i, p) in points.iter().enumerate() {
                let item = if i == 0 {
                    PathItem::MoveTo {
                        abs: true,
                        x: p.x,
                        y: p.y,
                    }
                } else {
                    PathItem::LineTo {
                        abs: true,
                        x: p.x,
                        y: p.y,
                    }
                };
                path.push(item);
            }
            Some(path)
        }
    }
}
