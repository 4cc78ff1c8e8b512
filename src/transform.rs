// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::geom::{FuzzyEq, FuzzyZero};
use crate::Error;

/// A 2D affine transform, in the SVG `matrix(a b c d e f)` form.
///
/// Maps a point as `(a*x + c*y + e, b*x + d*y + f)`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    #[inline]
    fn default() -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Transform {
    /// Constructs a new transform.
    #[inline]
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// Constructs a new translation transform.
    #[inline]
    pub fn from_translate(tx: f64, ty: f64) -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Constructs a new scale transform.
    #[inline]
    pub fn from_scale(sx: f64, sy: f64) -> Self {
        Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Constructs a new rotation transform. Angle is in degrees.
    pub fn from_rotate(angle: f64) -> Self {
        let v = angle.to_radians();
        let a = v.cos();
        let b = v.sin();
        Transform::new(a, b, -b, a, 0.0, 0.0)
    }

    /// Constructs a new X-axis skew transform. Angle is in degrees.
    #[inline]
    pub fn from_skew_x(angle: f64) -> Self {
        Transform::new(1.0, 0.0, angle.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    /// Constructs a new Y-axis skew transform. Angle is in degrees.
    #[inline]
    pub fn from_skew_y(angle: f64) -> Self {
        Transform::new(1.0, angle.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Parses a transform-list string, multiplying all items into one matrix.
    ///
    /// `rotate(a cx cy)` is expanded into translate-rotate-translate,
    /// just like the SVG spec requires.
    pub fn from_str(text: &str) -> Result<Self, Error> {
        let mut ts = Transform::default();
        for token in svgtypes::TransformListParser::from(text) {
            let token = token.map_err(|_| Error::MalformedTransform)?;
            let m = match token {
                svgtypes::TransformListToken::Matrix { a, b, c, d, e, f } => {
                    Transform::new(a, b, c, d, e, f)
                }
                svgtypes::TransformListToken::Translate { tx, ty } => {
                    Transform::from_translate(tx, ty)
                }
                svgtypes::TransformListToken::Scale { sx, sy } => Transform::from_scale(sx, sy),
                svgtypes::TransformListToken::Rotate { angle } => Transform::from_rotate(angle),
                svgtypes::TransformListToken::SkewX { angle } => Transform::from_skew_x(angle),
                svgtypes::TransformListToken::SkewY { angle } => Transform::from_skew_y(angle),
            };
            ts = ts.pre_concat(m);
        }

        Ok(ts)
    }

    /// Returns `self × other`, so that `other` is applied to a point first.
    pub fn pre_concat(&self, other: Transform) -> Transform {
        Transform::new(
            self.a * other.a + self.c * other.b,
            self.b * other.a + self.d * other.b,
            self.a * other.c + self.c * other.d,
            self.b * other.c + self.d * other.d,
            self.a * other.e + self.c * other.f + self.e,
            self.b * other.e + self.d * other.f + self.f,
        )
    }

    /// Applies the transform to a point.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Applies only the linear 2×2 part, ignoring translation.
    ///
    /// This is how relative path coordinates are transformed.
    #[inline]
    pub fn apply_linear(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    /// Returns an inverted transform, if any.
    pub fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.is_fuzzy_zero() {
            return None;
        }

        let inv_det = 1.0 / det;
        Some(Transform::new(
            self.d * inv_det,
            -self.b * inv_det,
            -self.c * inv_det,
            self.a * inv_det,
            (self.c * self.f - self.d * self.e) * inv_det,
            (self.b * self.e - self.a * self.f) * inv_det,
        ))
    }

    /// Checks that the transform is the identity, approximately.
    pub fn is_identity(&self) -> bool {
        self.a.fuzzy_eq(&1.0)
            && self.b.is_fuzzy_zero()
            && self.c.is_fuzzy_zero()
            && self.d.fuzzy_eq(&1.0)
            && self.e.is_fuzzy_zero()
            && self.f.is_fuzzy_zero()
    }

    /// Checks that the transform is translation-only.
    pub fn is_translate(&self) -> bool {
        self.a.fuzzy_eq(&1.0)
            && self.b.is_fuzzy_zero()
            && self.c.is_fuzzy_zero()
            && self.d.fuzzy_eq(&1.0)
    }

    /// Converts into a `tiny_skia` transform.
    #[inline]
    pub fn to_tiny_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.a as f32,
            self.b as f32,
            self.c as f32,
            self.d as f32,
            self.e as f32,
            self.f as f32,
        )
    }
}

impl FuzzyEq for Transform {
    fn fuzzy_eq(&self, other: &Self) -> bool {
        self.a.fuzzy_eq(&other.a)
            && self.b.fuzzy_eq(&other.b)
            && self.c.fuzzy_eq(&other.c)
            && self.d.fuzzy_eq(&other.d)
            && self.e.fuzzy_eq(&other.e)
            && self.f.fuzzy_eq(&other.f)
    }
}

/// A singular value decomposition of the linear part of a transform.
///
/// `M = R(theta) · diag(sx, sy) · R(phi)^T`, used to recompute
/// elliptical arc radii after an affine transform.
#[derive(Clone, Copy, Debug)]
pub struct Svd {
    /// Rotation applied after scaling, in radians.
    pub theta: f64,
    /// Major singular value.
    pub sx: f64,
    /// Minor singular value.
    pub sy: f64,
}

impl Svd {
    /// Decomposes the 2×2 part of a transform.
    pub fn from_transform(ts: &Transform) -> Svd {
        let (a, b, c, d) = (ts.a, ts.b, ts.c, ts.d);

        let e = (a + d) / 2.0;
        let f = (a - d) / 2.0;
        let g = (b + c) / 2.0;
        let h = (b - c) / 2.0;

        let q = (e * e + h * h).sqrt();
        let r = (f * f + g * g).sqrt();

        let a1 = g.atan2(f);
        let a2 = h.atan2(e);

        Svd {
            theta: (a2 + a1) / 2.0,
            sx: q + r,
            sy: q - r,
        }
    }
}
