// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use float_cmp::ApproxEqUlps;

/// A trait for fuzzy/approximate equality comparisons of float numbers.
pub trait FuzzyEq<Rhs: ?Sized = Self> {
    /// Returns `true` if values are approximately equal.
    fn fuzzy_eq(&self, other: &Rhs) -> bool;

    /// Returns `true` if values are not approximately equal.
    #[inline]
    fn fuzzy_ne(&self, other: &Rhs) -> bool {
        !self.fuzzy_eq(other)
    }
}

/// A trait for fuzzy/approximate comparisons of float numbers.
pub trait FuzzyZero: FuzzyEq {
    /// Returns `true` if the number is approximately zero.
    fn is_fuzzy_zero(&self) -> bool;
}

impl FuzzyEq for f64 {
    #[inline]
    fn fuzzy_eq(&self, other: &f64) -> bool {
        self.approx_eq_ulps(other, 4)
    }
}

impl FuzzyZero for f64 {
    #[inline]
    fn is_fuzzy_zero(&self) -> bool {
        self.fuzzy_eq(&0.0)
    }
}

/// Checks that the current number is > 0.
pub trait IsValidLength {
    /// Checks that the current number is > 0.
    fn is_valid_length(&self) -> bool;
}

impl IsValidLength for f64 {
    #[inline]
    fn is_valid_length(&self) -> bool {
        *self > 0.0 && self.is_finite()
    }
}

/// A 2D point representation.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let x = other.x - self.x;
        let y = other.y - self.y;
        (x * x + y * y).sqrt()
    }
}

/// A 2D size representation.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    #[inline]
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// An axis-aligned rectangle.
///
/// Unlike the SVG one, width and height are allowed to be zero,
/// since freshly drawn strokes can collapse to a point.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Rect {
    /// Creates a new rectangle.
    ///
    /// Returns `None` when any value is not finite or a dimension is negative.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Option<Self> {
        if x.is_finite()
            && y.is_finite()
            && width.is_finite()
            && width >= 0.0
            && height.is_finite()
            && height >= 0.0
        {
            Some(Rect {
                x,
                y,
                width,
                height,
            })
        } else {
            None
        }
    }

    /// The empty rectangle at the origin.
    pub fn zero() -> Self {
        Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Creates a new rectangle from two corner points.
    pub fn from_points(a: Point, b: Point) -> Option<Self> {
        Rect::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (b.x - a.x).abs(),
            (b.y - a.y).abs(),
        )
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Rectangle area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Checks that the rectangle contains a point.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Checks that `other` lies fully inside the rectangle.
    pub fn contains_rect(&self, other: Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns a rectangle shifted by the specified offset.
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Returns a rectangle expanded by `d` on each side.
    pub fn expand(&self, d: f64) -> Option<Rect> {
        Rect::new(
            self.x - d,
            self.y - d,
            self.width + d * 2.0,
            self.height + d * 2.0,
        )
    }

    /// Returns the smallest rectangle enclosing both.
    pub fn union(&self, other: Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0).unwrap();
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 30.0)));
        assert!(!r.contains(Point::new(30.1, 30.0)));
    }

    #[test]
    fn rect_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = Rect::new(5.0, 5.0, 10.0, 10.0).unwrap();
        assert_eq!(a.union(b), Rect::new(0.0, 0.0, 15.0, 15.0).unwrap());
    }

    #[test]
    fn invalid_rect() {
        assert_eq!(Rect::new(0.0, 0.0, -1.0, 1.0), None);
        assert_eq!(Rect::new(f64::NAN, 0.0, 1.0, 1.0), None);
    }
}
