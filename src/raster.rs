// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::canvas::{Canvas2d, ImageData, Shadow};
use crate::{Color, Opacity, Transform};

#[derive(Clone, Copy, Debug)]
enum PathVerb {
    Move(f64, f64),
    Line(f64, f64),
    Quad(f64, f64, f64, f64),
    Cubic(f64, f64, f64, f64, f64, f64),
    Close,
}

#[derive(Clone, Debug)]
struct DrawState {
    transform: Transform,
    fill: Option<(Color, Opacity)>,
    stroke: Option<(Color, f64, Opacity)>,
    shadow: Option<Shadow>,
}

impl Default for DrawState {
    fn default() -> Self {
        DrawState {
            transform: Transform::default(),
            fill: Some((Color::black(), Opacity::ONE)),
            stroke: None,
            shadow: None,
        }
    }
}

/// A software implementation of [`Canvas2d`] on top of a `tiny_skia` pixmap.
///
/// Used by the hit-tester's scratch surfaces, the tile extractor and the
/// test-suite. Hosts embedding the core into a windowing system will
/// usually provide their own context instead.
pub struct RasterCanvas {
    pixmap: tiny_skia::Pixmap,
    width: f64,
    height: f64,
    pixel_ratio: f64,
    state: DrawState,
    stack: Vec<DrawState>,
    verbs: Vec<PathVerb>,
}

impl RasterCanvas {
    /// Creates a canvas of `width × height` points.
    ///
    /// The backing store is scaled by `pixel_ratio`.
    /// Returns `None` if the pixmap cannot be allocated.
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Option<Self> {
        if !(width > 0.0) || !(height > 0.0) || !(pixel_ratio > 0.0) {
            return None;
        }

        let pw = (width * pixel_ratio).ceil() as u32;
        let ph = (height * pixel_ratio).ceil() as u32;
        let pixmap = tiny_skia::Pixmap::new(pw.max(1), ph.max(1))?;

        Some(RasterCanvas {
            pixmap,
            width,
            height,
            pixel_ratio,
            state: DrawState::default(),
            stack: Vec::new(),
            verbs: Vec::new(),
        })
    }

    /// The backing pixmap.
    pub fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }

    fn device_transform(&self) -> tiny_skia::Transform {
        Transform::from_scale(self.pixel_ratio, self.pixel_ratio)
            .pre_concat(self.state.transform)
            .to_tiny_skia()
    }

    fn build_path(&self) -> Option<tiny_skia::Path> {
        let mut builder = tiny_skia::PathBuilder::new();
        for verb in &self.verbs {
            match *verb {
                PathVerb::Move(x, y) => builder.move_to(x as f32, y as f32),
                PathVerb::Line(x, y) => builder.line_to(x as f32, y as f32),
                PathVerb::Quad(x1, y1, x, y) => {
                    builder.quad_to(x1 as f32, y1 as f32, x as f32, y as f32)
                }
                PathVerb::Cubic(x1, y1, x2, y2, x, y) => builder.cubic_to(
                    x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32,
                ),
                PathVerb::Close => builder.close(),
            }
        }

        builder.finish()
    }

    fn paint_for(color: Color, opacity: Opacity) -> tiny_skia::Paint<'static> {
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(
            color.red,
            color.green,
            color.blue,
            (opacity.get() * 255.0).round() as u8,
        );
        paint.anti_alias = true;
        paint
    }

    // The shadow is approximated with a few widening translucent
    // strokes under the shape, which is close enough for selection glows.
    fn paint_shadow(&mut self, path: &tiny_skia::Path) {
        let shadow = match self.state.shadow {
            Some(v) => v,
            None => return,
        };

        let ts = self.device_transform();
        let alpha = Opacity::new_clamped(shadow.opacity.get() / 3.0);
        let paint = Self::paint_for(shadow.color, alpha);

        for step in 1..=3 {
            let stroke = tiny_skia::Stroke {
                width: (shadow.blur * 2.0 * step as f64 / 3.0) as f32,
                line_cap: tiny_skia::LineCap::Round,
                line_join: tiny_skia::LineJoin::Round,
                ..tiny_skia::Stroke::default()
            };
            self.pixmap
                .stroke_path(path, &paint, &stroke, ts, None);
        }
    }
}

impl Canvas2d for RasterCanvas {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_translate(tx, ty));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_scale(sx, sy));
    }

    fn rotate(&mut self, degrees: f64) {
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_rotate(degrees));
    }

    fn concat(&mut self, ts: Transform) {
        self.state.transform = self.state.transform.pre_concat(ts);
    }

    fn begin_path(&mut self) {
        self.verbs.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.verbs.push(PathVerb::Move(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.verbs.push(PathVerb::Line(x, y));
    }

    fn bezier_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.verbs.push(PathVerb::Cubic(x1, y1, x2, y2, x, y));
    }

    fn quadratic_curve_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.verbs.push(PathVerb::Quad(x1, y1, x, y));
    }

    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64) {
        let start_rad = start.to_radians();
        let sweep_rad = (end - start).to_radians();

        let sx = cx + r * start_rad.cos();
        let sy = cy + r * start_rad.sin();
        if self.verbs.is_empty() {
            self.move_to(sx, sy);
        } else {
            self.line_to(sx, sy);
        }

        let arc = kurbo::Arc {
            center: kurbo::Point::new(cx, cy),
            radii: kurbo::Vec2::new(r, r),
            start_angle: start_rad,
            sweep_angle: sweep_rad,
            x_rotation: 0.0,
        };
        arc.to_cubic_beziers(0.1, |p1, p2, p| {
            self.verbs
                .push(PathVerb::Cubic(p1.x, p1.y, p2.x, p2.y, p.x, p.y));
        });
    }

    fn close_path(&mut self) {
        self.verbs.push(PathVerb::Close);
    }

    fn set_fill(&mut self, color: Color, opacity: Opacity) {
        self.state.fill = Some((color, opacity));
    }

    fn set_stroke(&mut self, color: Color, width: f64, opacity: Opacity) {
        self.state.stroke = Some((color, width, opacity));
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    fn fill(&mut self) {
        let path = match self.build_path() {
            Some(v) => v,
            None => return,
        };

        self.paint_shadow(&path);

        if let Some((color, opacity)) = self.state.fill {
            let paint = Self::paint_for(color, opacity);
            let ts = self.device_transform();
            self.pixmap
                .fill_path(&path, &paint, tiny_skia::FillRule::Winding, ts, None);
        }
    }

    fn stroke(&mut self) {
        let path = match self.build_path() {
            Some(v) => v,
            None => return,
        };

        if let Some((color, width, opacity)) = self.state.stroke {
            let paint = Self::paint_for(color, opacity);
            let stroke = tiny_skia::Stroke {
                width: width as f32,
                ..tiny_skia::Stroke::default()
            };
            let ts = self.device_transform();
            self.pixmap.stroke_path(&path, &paint, &stroke, ts, None);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let rect = match tiny_skia::Rect::from_xywh(
            x as f32,
            y as f32,
            width as f32,
            height as f32,
        ) {
            Some(v) => v,
            None => return,
        };
        let path = tiny_skia::PathBuilder::from_rect(rect);

        if let Some((color, opacity)) = self.state.fill {
            let paint = Self::paint_for(color, opacity);
            let ts = self.device_transform();
            self.pixmap
                .fill_path(&path, &paint, tiny_skia::FillRule::Winding, ts, None);
        }
    }

    fn draw_image(
        &mut self,
        image: &ImageData,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        opacity: Opacity,
    ) {
        let size = match tiny_skia::IntSize::from_wh(image.width, image.height) {
            Some(v) => v,
            None => return,
        };

        // tiny-skia wants premultiplied pixels.
        let mut data = image.rgba.clone();
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            px[0] = ((px[0] as u16 * a) / 255) as u8;
            px[1] = ((px[1] as u16 * a) / 255) as u8;
            px[2] = ((px[2] as u16 * a) / 255) as u8;
        }

        let src = match tiny_skia::Pixmap::from_vec(data, size) {
            Some(v) => v,
            None => return,
        };

        let paint = tiny_skia::PixmapPaint {
            opacity: opacity.get() as f32,
            blend_mode: tiny_skia::BlendMode::SourceOver,
            quality: tiny_skia::FilterQuality::Bilinear,
        };

        let ts = Transform::from_scale(self.pixel_ratio, self.pixel_ratio)
            .pre_concat(self.state.transform)
            .pre_concat(Transform::from_translate(x, y))
            .pre_concat(Transform::from_scale(
                width / image.width as f64,
                height / image.height as f64,
            ))
            .to_tiny_skia();

        self.pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, ts, None);
    }

    fn alpha_at(&self, x: f64, y: f64) -> u8 {
        let px = (x * self.pixel_ratio).floor();
        let py = (y * self.pixel_ratio).floor();
        if px < 0.0 || py < 0.0 {
            return 0;
        }

        self.pixmap
            .pixel(px as u32, py as u32)
            .map(|c| c.alpha())
            .unwrap_or(0)
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }
}
