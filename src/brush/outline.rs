// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use geo::{Area, BooleanOps, LineString, MultiPolygon, Polygon, Simplify};

use crate::geom::Point;

use super::BrushSample;

const DISC_SIDES: usize = 24;
const RING_SIMPLIFY_TOLERANCE: f64 = 0.5;

/// The counter-clockwise quad spanning two consecutive samples,
/// `None` when the samples coincide.
pub fn quad_between(a: &BrushSample, b: &BrushSample) -> Option<Vec<Point>> {
    let dx = b.point.x - a.point.x;
    let dy = b.point.y - a.point.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-9 {
        return None;
    }

    // Unit normal of the segment.
    let nx = -dy / len;
    let ny = dx / len;
    let (ha, hb) = (a.width / 2.0, b.width / 2.0);

    let mut quad = vec![
        Point::new(a.point.x - nx * ha, a.point.y - ny * ha),
        Point::new(b.point.x - nx * hb, b.point.y - ny * hb),
        Point::new(b.point.x + nx * hb, b.point.y + ny * hb),
        Point::new(a.point.x + nx * ha, a.point.y + ny * ha),
    ];

    if signed_area(&quad) < 0.0 {
        quad.reverse();
    }

    Some(quad)
}

/// A 24-gon disc centered on the sample.
pub fn disc(sample: &BrushSample) -> Vec<Point> {
    let r = (sample.width / 2.0).max(0.05);
    (0..DISC_SIDES)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / DISC_SIDES as f64;
            Point::new(sample.point.x + r * a.cos(), sample.point.y + r * a.sin())
        })
        .collect()
}

fn signed_area(ring: &[Point]) -> f64 {
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

fn to_polygon(ring: &[Point]) -> Polygon<f64> {
    let coords: Vec<(f64, f64)> = ring.iter().map(|p| (p.x, p.y)).collect();
    Polygon::new(LineString::from(coords), Vec::new())
}

/// Unions the stroke's quads and discs and returns the simplified outer
/// ring, or `None` for degenerate input.
pub fn stroke_outline(samples: &[BrushSample]) -> Option<Vec<Point>> {
    if samples.is_empty() {
        return None;
    }

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for pair in samples.windows(2) {
        if let Some(quad) = quad_between(&pair[0], &pair[1]) {
            polygons.push(to_polygon(&quad));
        }
    }
    for sample in samples {
        polygons.push(to_polygon(&disc(sample)));
    }

    if polygons.is_empty() {
        return None;
    }

    let mut union = MultiPolygon::new(vec![polygons.remove(0)]);
    for polygon in polygons {
        union = union.union(&MultiPolygon::new(vec![polygon]));
    }

    // The stroke is one connected blob; pick the largest ring in case
    // numeric noise split off slivers.
    let outer = union
        .0
        .into_iter()
        .max_by(|a, b| {
            a.unsigned_area()
                .partial_cmp(&b.unsigned_area())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

    let ring = outer.exterior().simplify(&RING_SIMPLIFY_TOLERANCE);
    let mut points: Vec<Point> = ring.coords().map(|c| Point::new(c.x, c.y)).collect();

    // geo rings repeat the first coordinate at the end.
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() < 3 {
        return None;
    }

    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, width: f64) -> BrushSample {
        BrushSample {
            point: Point::new(x, y),
            width,
        }
    }

    #[test]
    fn quad_is_ccw() {
        let q = quad_between(&sample(0.0, 0.0, 4.0), &sample(10.0, 0.0, 4.0)).unwrap();
        assert!(signed_area(&q) > 0.0);
        // Width 4 means the quad spans y in [-2, 2].
        assert!(q.iter().any(|p| (p.y - 2.0).abs() < 1e-9));
        assert!(q.iter().any(|p| (p.y + 2.0).abs() < 1e-9));
    }

    #[test]
    fn coincident_samples_make_no_quad() {
        assert!(quad_between(&sample(5.0, 5.0, 4.0), &sample(5.0, 5.0, 4.0)).is_none());
    }

    #[test]
    fn outline_covers_the_stroke() {
        let samples = vec![
            sample(0.0, 0.0, 4.0),
            sample(20.0, 0.0, 6.0),
            sample(40.0, 10.0, 6.0),
        ];

        let ring = stroke_outline(&samples).unwrap();
        assert!(ring.len() >= 8);

        let minx = ring.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        let maxx = ring.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!(minx <= -1.9);
        assert!(maxx >= 42.9);
    }

    #[test]
    fn single_sample_is_a_disc() {
        let ring = stroke_outline(&[sample(5.0, 5.0, 10.0)]).unwrap();
        // Every ring point sits on the radius.
        for p in &ring {
            let d = ((p.x - 5.0).powi(2) + (p.y - 5.0).powi(2)).sqrt();
            assert!((d - 5.0).abs() < 0.6);
        }
    }
}
