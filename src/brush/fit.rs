// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Least-squares cubic Bézier fitting over a polyline,
//! the classic Graphics-Gems approach.

use kurbo::{CubicBez, ParamCurve, Point, Vec2};

const MAX_REPARAM_ITERATIONS: usize = 4;

/// Fits a sequence of cubic Béziers through `points` with the given
/// maximum error, in points.
///
/// Returns `None` when the input is degenerate (fewer than two distinct
/// points) so the caller can fall back to a polyline.
pub fn fit_curve(points: &[Point], error: f64) -> Option<Vec<CubicBez>> {
    let points = dedup(points);
    if points.len() < 2 {
        return None;
    }

    let tan1 = tangent(&points, 0, 1)?;
    let tan2 = tangent(&points, points.len() - 1, points.len() - 2)?;

    let mut out = Vec::new();
    fit_cubic(&points, tan1, tan2, error, &mut out);
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn dedup(points: &[Point]) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if result
            .last()
            .map(|last| (*last - *p).hypot() > 1e-9)
            .unwrap_or(true)
        {
            result.push(*p);
        }
    }
    result
}

fn tangent(points: &[Point], from: usize, to: usize) -> Option<Vec2> {
    let v = points[to] - points[from];
    let len = v.hypot();
    if len < 1e-12 {
        None
    } else {
        Some(v / len)
    }
}

fn fit_cubic(points: &[Point], tan1: Vec2, tan2: Vec2, error: f64, out: &mut Vec<CubicBez>) {
    // Two points: a heuristic straight-ish segment.
    if points.len() == 2 {
        let dist = (points[1] - points[0]).hypot() / 3.0;
        out.push(CubicBez::new(
            points[0],
            points[0] + tan1 * dist,
            points[1] + tan2 * dist,
            points[1],
        ));
        return;
    }

    let mut u = chord_length_parameterize(points);
    let mut bez = generate_bezier(points, &u, tan1, tan2);
    let (mut max_err, mut split) = max_error(points, &bez, &u);

    if max_err < error {
        out.push(bez);
        return;
    }

    // If the error is not hopeless, try improving the parameterization.
    if max_err < error * error {
        for _ in 0..MAX_REPARAM_ITERATIONS {
            u = reparameterize(points, &u, &bez);
            bez = generate_bezier(points, &u, tan1, tan2);
            let (e, s) = max_error(points, &bez, &u);
            max_err = e;
            split = s;
            if max_err < error {
                out.push(bez);
                return;
            }
        }
    }

    // Split at the worst point and fit both halves.
    let split = split.clamp(1, points.len() - 2);
    let center_tan = {
        let v = points[split - 1] - points[split + 1];
        let len = v.hypot();
        if len < 1e-12 {
            // Pick any direction perpendicular-ish to the incoming tangent.
            Vec2::new(-tan1.y, tan1.x)
        } else {
            v / len
        }
    };

    fit_cubic(&points[..=split], tan1, center_tan, error, out);
    fit_cubic(&points[split..], -center_tan, tan2, error, out);
}

fn chord_length_parameterize(points: &[Point]) -> Vec<f64> {
    let mut u = Vec::with_capacity(points.len());
    u.push(0.0);
    for i in 1..points.len() {
        let d = (points[i] - points[i - 1]).hypot();
        u.push(u[i - 1] + d);
    }

    let total = *u.last().expect("non-empty");
    if total > 0.0 {
        for v in &mut u {
            *v /= total;
        }
    }
    u
}

fn generate_bezier(points: &[Point], u: &[f64], tan1: Vec2, tan2: Vec2) -> CubicBez {
    let first = points[0];
    let last = *points.last().expect("non-empty");

    // Build the least-squares system for the two handle lengths.
    let mut c = [[0.0f64; 2]; 2];
    let mut x = [0.0f64; 2];

    for (i, &t) in u.iter().enumerate() {
        let b = basis(t);
        let a1 = tan1 * b[1];
        let a2 = tan2 * b[2];

        c[0][0] += a1.dot(a1);
        c[0][1] += a1.dot(a2);
        c[1][0] = c[0][1];
        c[1][1] += a2.dot(a2);

        let tmp = points[i].to_vec2()
            - (first.to_vec2() * (b[0] + b[1]) + last.to_vec2() * (b[2] + b[3]));

        x[0] += a1.dot(tmp);
        x[1] += a2.dot(tmp);
    }

    let det_c0_c1 = c[0][0] * c[1][1] - c[1][0] * c[0][1];
    let det_c0_x = c[0][0] * x[1] - c[1][0] * x[0];
    let det_x_c1 = x[0] * c[1][1] - x[1] * c[0][1];

    let alpha_l = if det_c0_c1.abs() < 1e-12 {
        0.0
    } else {
        det_x_c1 / det_c0_c1
    };
    let alpha_r = if det_c0_c1.abs() < 1e-12 {
        0.0
    } else {
        det_c0_x / det_c0_c1
    };

    // Degenerate alphas fall back to the Wu/Barsky heuristic.
    let seg_len = (last - first).hypot();
    let epsilon = 1e-6 * seg_len;
    if alpha_l < epsilon || alpha_r < epsilon {
        let dist = seg_len / 3.0;
        return CubicBez::new(first, first + tan1 * dist, last + tan2 * dist, last);
    }

    CubicBez::new(first, first + tan1 * alpha_l, last + tan2 * alpha_r, last)
}

#[inline]
fn basis(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

fn max_error(points: &[Point], bez: &CubicBez, u: &[f64]) -> (f64, usize) {
    let mut max_dist = 0.0;
    let mut split = points.len() / 2;

    for (i, &t) in u.iter().enumerate() {
        let dist = (bez.eval(t) - points[i]).hypot2();
        if dist > max_dist {
            max_dist = dist;
            split = i;
        }
    }

    (max_dist.sqrt(), split)
}

// Newton-Raphson step moving each parameter towards the closest
// curve point.
fn reparameterize(points: &[Point], u: &[f64], bez: &CubicBez) -> Vec<f64> {
    u.iter()
        .enumerate()
        .map(|(i, &t)| newton_raphson(bez, points[i], t))
        .collect()
}

fn newton_raphson(bez: &CubicBez, point: Point, t: f64) -> f64 {
    let d = bez.eval(t) - point;

    // First derivative control polygon.
    let d1 = [
        (bez.p1 - bez.p0) * 3.0,
        (bez.p2 - bez.p1) * 3.0,
        (bez.p3 - bez.p2) * 3.0,
    ];
    let d2 = [(d1[1] - d1[0]) * 2.0, (d1[2] - d1[1]) * 2.0];

    let s = 1.0 - t;
    let q1 = d1[0] * (s * s) + d1[1] * (2.0 * s * t) + d1[2] * (t * t);
    let q2 = d2[0] * s + d2[1] * t;

    let numerator = d.dot(q1);
    let denominator = q1.dot(q1) + d.dot(q2);

    if denominator.abs() < 1e-12 {
        t
    } else {
        (t - numerator / denominator).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_deviation(points: &[Point], curves: &[CubicBez]) -> f64 {
        // Sample all curves densely and take, for every input point,
        // the distance to the nearest sample.
        let mut samples = Vec::new();
        for bez in curves {
            for k in 0..=64 {
                samples.push(bez.eval(k as f64 / 64.0));
            }
        }

        points
            .iter()
            .map(|p| {
                samples
                    .iter()
                    .map(|s| (*s - *p).hypot())
                    .fold(f64::MAX, f64::min)
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn fits_a_line() {
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64 * 5.0, 0.0)).collect();
        let curves = fit_curve(&points, 2.0).unwrap();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].p0, Point::new(0.0, 0.0));
        assert_eq!(curves[0].p3, Point::new(45.0, 0.0));
    }

    #[test]
    fn fits_an_arc_within_tolerance() {
        let points: Vec<Point> = (0..=32)
            .map(|i| {
                let a = std::f64::consts::PI * i as f64 / 32.0;
                Point::new(50.0 * a.cos(), 50.0 * a.sin())
            })
            .collect();

        let curves = fit_curve(&points, 2.0).unwrap();
        assert!(max_deviation(&points, &curves) < 2.0);
    }

    #[test]
    fn fits_a_corner_by_splitting() {
        let mut points: Vec<Point> = (0..10).map(|i| Point::new(i as f64 * 10.0, 0.0)).collect();
        points.extend((1..10).map(|i| Point::new(90.0, i as f64 * 10.0)));

        let curves = fit_curve(&points, 2.0).unwrap();
        assert!(curves.len() >= 2);
        assert!(max_deviation(&points, &curves) < 2.5);
    }

    #[test]
    fn degenerate_input() {
        assert!(fit_curve(&[], 2.0).is_none());
        assert!(fit_curve(&[Point::new(1.0, 1.0)], 2.0).is_none());
        assert!(fit_curve(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)], 2.0).is_none());
    }
}
