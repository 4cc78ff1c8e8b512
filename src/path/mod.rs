// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SVG path data: parsing, compact serialization, lowering to
//! absolute M/L/C/Z segments and affine baking.

mod bake;
mod flatten;
mod write;

pub use flatten::{FlatPath, FlatSegment};

use crate::{Error, Transform};

/// A path command with arguments, as written in the `d` attribute.
///
/// Re-uses the `svgtypes` segment type, which covers the whole
/// `MmLlHhVvCcSsQqTtAaZz` alphabet with explicit absoluteness flags.
pub type PathItem = svgtypes::PathSegment;

/// SVG path data, preserved command-by-command.
///
/// Unlike [`FlatPath`], nothing is simplified here: relative commands,
/// shorthands and arcs survive parsing untouched, so the emitted string
/// stays close to what the user imported.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct SvgPath {
    items: Vec<PathItem>,
}

impl SvgPath {
    /// Creates an empty path.
    #[inline]
    pub fn new() -> Self {
        SvgPath::default()
    }

    /// Creates a path from raw items.
    #[inline]
    pub fn from_items(items: Vec<PathItem>) -> Self {
        SvgPath { items }
    }

    /// Parses SVG path data.
    ///
    /// Implicit commands are made explicit by the parser,
    /// which does not change the geometry.
    pub fn from_str(text: &str) -> Result<Self, Error> {
        let mut items = Vec::new();
        for segment in svgtypes::PathParser::from(text) {
            let segment = segment.map_err(|_| Error::MalformedPath)?;
            items.push(segment);
        }

        if items.is_empty() {
            return Err(Error::MalformedPath);
        }

        Ok(SvgPath { items })
    }

    /// Returns `true` if the path contains no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns a slice of the path items.
    #[inline]
    pub fn items(&self) -> &[PathItem] {
        &self.items
    }

    /// Pushes an item to the path.
    #[inline]
    pub fn push(&mut self, item: PathItem) {
        self.items.push(item);
    }

    /// Appends all items of `other`.
    ///
    /// A leading relative `m` of `other` is made absolute, since after
    /// concatenation it would no longer start at the origin of its own
    /// coordinate space.
    pub fn push_path(&mut self, other: &SvgPath) {
        let mut iter = other.items.iter();
        if let Some(first) = iter.next() {
            match *first {
                PathItem::MoveTo { abs: false, x, y } => {
                    self.items.push(PathItem::MoveTo { abs: true, x, y });
                }
                item => self.items.push(item),
            }
        }
        self.items.extend(iter.copied());
    }

    /// Lowers the path into absolute M/L/C/Z segments.
    #[inline]
    pub fn flatten(&self) -> FlatPath {
        flatten::flatten(self)
    }

    /// Returns a copy with the transform baked into the coordinates.
    ///
    /// See [`bake`](module) rules: absolute pairs get the full matrix,
    /// relative pairs only its linear part, `H`/`V` become `L`,
    /// arc radii are recomputed.
    #[inline]
    pub fn bake_transform(&self, ts: Transform) -> SvgPath {
        bake::bake(self, ts)
    }

    /// Returns a copy shifted by the specified offset.
    #[inline]
    pub fn translated(&self, dx: f64, dy: f64) -> SvgPath {
        bake::bake(self, Transform::from_translate(dx, dy))
    }

    /// Serializes, rounding coordinates to `precision` decimal places.
    #[inline]
    pub fn to_string_with_precision(&self, precision: u8) -> String {
        write::write(self, precision)
    }
}

/// Serializes with the default precision of 3 decimal places.
impl std::fmt::Display for SvgPath {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&write::write(self, 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_relative_commands() {
        let path = SvgPath::from_str("m10 20l5 5h-3z").unwrap();
        assert_eq!(
            path.items()[1],
            PathItem::LineTo {
                abs: false,
                x: 5.0,
                y: 5.0
            }
        );
        assert_eq!(
            path.items()[2],
            PathItem::HorizontalLineTo { abs: false, x: -3.0 }
        );
    }

    #[test]
    fn parse_empty() {
        assert!(SvgPath::from_str("").is_err());
    }

    #[test]
    fn parse_garbage() {
        assert!(SvgPath::from_str("M 10 q").is_err());
    }

    #[test]
    fn round_trip_is_stable() {
        // parse(stringify(parse(s))) == parse(s)
        for text in [
            "M10-20l30.1.5.1-20z",
            "M 10 20 C 30 40 50 60 70 80 S 90 100 110 120",
            "M0 0A5 10 30 1 0 20 20z",
            "M1.5.5 2.25 3T4 5",
        ] {
            let first = SvgPath::from_str(text).unwrap();
            let second = SvgPath::from_str(&first.to_string()).unwrap();
            assert_eq!(first, second, "{}", text);
        }
    }

    #[test]
    fn concat_uppercases_leading_move() {
        let mut a = SvgPath::from_str("M10 10L20 20").unwrap();
        let b = SvgPath::from_str("m5 5l1 1").unwrap();
        a.push_path(&b);
        assert_eq!(
            a.items()[2],
            PathItem::MoveTo {
                abs: true,
                x: 5.0,
                y: 5.0
            }
        );
    }
}
