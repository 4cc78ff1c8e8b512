// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Color, Opacity, Transform};

/// A decoded raster image: RGBA8, not premultiplied.
#[derive(Clone, PartialEq, Debug)]
pub struct ImageData {
    /// Width in pixels. Never zero.
    pub width: u32,
    /// Height in pixels. Never zero.
    pub height: u32,
    /// Pixel data, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// Creates a new image, validating the buffer length.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || rgba.len() != (width * height * 4) as usize {
            return None;
        }

        Some(ImageData {
            width,
            height,
            rgba,
        })
    }
}

/// A drop shadow / glow configuration.
#[derive(Clone, Copy, Debug)]
pub struct Shadow {
    /// Blur radius in points.
    pub blur: f64,
    /// Shadow color.
    pub color: Color,
    /// Shadow opacity.
    pub opacity: Opacity,
}

/// The 2D drawing context the editor core paints into.
///
/// Mirrors the subset of a browser canvas the original renderer relied on:
/// a save/restore state stack, affine transforms, a single current path,
/// solid fills and strokes, image blitting and a 1×1 alpha probe.
/// Hosts provide their own implementation; [`RasterCanvas`](crate::RasterCanvas)
/// is the built-in software one.
pub trait Canvas2d {
    /// Pushes the current state (transform, paints, shadow) onto the stack.
    fn save(&mut self);

    /// Pops the state stack. Unbalanced calls are ignored.
    fn restore(&mut self);

    /// Translates the current transform.
    fn translate(&mut self, tx: f64, ty: f64);

    /// Scales the current transform.
    fn scale(&mut self, sx: f64, sy: f64);

    /// Rotates the current transform. Angle is in degrees.
    fn rotate(&mut self, degrees: f64);

    /// Multiplies the current transform by `ts`.
    fn concat(&mut self, ts: Transform);

    /// Starts a new path, discarding the current one.
    fn begin_path(&mut self);

    #[allow(missing_docs)]
    fn move_to(&mut self, x: f64, y: f64);

    #[allow(missing_docs)]
    fn line_to(&mut self, x: f64, y: f64);

    #[allow(missing_docs)]
    fn bezier_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64);

    #[allow(missing_docs)]
    fn quadratic_curve_to(&mut self, x1: f64, y1: f64, x: f64, y: f64);

    /// Appends a circular arc around `(cx, cy)`. Angles are in degrees.
    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64);

    /// Closes the current subpath.
    fn close_path(&mut self);

    /// Sets the fill paint.
    fn set_fill(&mut self, color: Color, opacity: Opacity);

    /// Sets the stroke paint. Width is in points, scaled by the transform.
    fn set_stroke(&mut self, color: Color, width: f64, opacity: Opacity);

    /// Sets or clears the shadow drawn under subsequent fills.
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    /// Fills the current path with the fill paint.
    fn fill(&mut self);

    /// Strokes the current path with the stroke paint.
    fn stroke(&mut self);

    /// Fills an axis-aligned rectangle with the fill paint.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Draws an image scaled into the `(x, y, width, height)` rectangle.
    fn draw_image(&mut self, image: &ImageData, x: f64, y: f64, width: f64, height: f64, opacity: Opacity);

    /// Reads the alpha component of one pixel, in canvas coordinates.
    ///
    /// Ignores the current transform, like `getImageData` does.
    fn alpha_at(&self, x: f64, y: f64) -> u8;

    /// The device pixel ratio of the backing store.
    fn pixel_ratio(&self) -> f64;

    /// Canvas width in points.
    fn width(&self) -> f64;

    /// Canvas height in points.
    fn height(&self) -> f64;
}
