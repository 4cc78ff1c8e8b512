// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::Error;

/// An opacity value in the `0..=1` range.
pub type Opacity = strict_num::NormalizedF64;

/// An RGB color. Alpha is carried separately as [`Opacity`].
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Creates a new color.
    #[inline]
    pub fn new_rgb(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }

    /// A black color.
    #[inline]
    pub fn black() -> Self {
        Color::new_rgb(0, 0, 0)
    }

    /// A white color.
    #[inline]
    pub fn white() -> Self {
        Color::new_rgb(255, 255, 255)
    }

    /// Parses a CSS color value, like `#1a2b3c` or `seagreen`.
    ///
    /// An alpha component, if present, is discarded.
    pub fn from_str(text: &str) -> Result<Self, Error> {
        let c = text
            .parse::<svgtypes::Color>()
            .map_err(|_| Error::MalformedColor)?;
        Ok(Color::new_rgb(c.red, c.green, c.blue))
    }

    /// Writes the color as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let c = Color::from_str("#2dd4a8").unwrap();
        assert_eq!(c, Color::new_rgb(45, 212, 168));
        assert_eq!(c.to_hex(), "#2dd4a8");
    }

    #[test]
    fn named() {
        assert_eq!(Color::from_str("black").unwrap(), Color::black());
    }

    #[test]
    fn malformed() {
        assert!(Color::from_str("#zzz").is_err());
    }
}
