// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::canvas::{Canvas2d, ImageData};
use crate::raster::RasterCanvas;

/// Copies the center tile `[T, 2T)²` out of a rendered canvas into a
/// `T×T` raster, compensating for device-pixel-ratio scaling.
///
/// Returns `None` when the canvas is smaller than the `3T` window.
pub fn extract_tile(canvas: &RasterCanvas, tile_size: f64) -> Option<ImageData> {
    let side = tile_size.round();
    if !(side > 0.0) || canvas.width() < side * 2.0 || canvas.height() < side * 2.0 {
        return None;
    }

    let ratio = canvas.pixel_ratio();
    let pixmap = canvas.pixmap();
    let side_px = side as u32;

    let mut rgba = Vec::with_capacity((side_px * side_px * 4) as usize);
    for y in 0..side_px {
        for x in 0..side_px {
            // Nearest source pixel of the point at the pixel center.
            let sx = ((side + x as f64 + 0.5) * ratio) as u32;
            let sy = ((side + y as f64 + 0.5) * ratio) as u32;

            match pixmap.pixel(sx, sy) {
                Some(px) => {
                    let c = px.demultiply();
                    rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
                }
                None => rgba.extend_from_slice(&[0, 0, 0, 0]),
            }
        }
    }

    ImageData::new(side_px, side_px, rgba)
}
