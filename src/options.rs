// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::Color;

/// Editor processing options.
#[derive(Clone, Debug)]
pub struct Options {
    /// The tile side length `T`, in points.
    ///
    /// The visible window spans `3T`; the canonical tile is `[T, 2T)`.
    ///
    /// Default: 200
    pub tile_size: f64,

    /// Background color used by the eraser tool and the window clear.
    ///
    /// Default: white
    pub background: Color,

    /// Undo/redo depth cap.
    ///
    /// Default: 100
    pub undo_depth: usize,

    /// Time window within which consecutive transform commands
    /// on the same entity collapse into one undo step, in milliseconds.
    ///
    /// Default: 500
    pub merge_window_ms: u64,

    /// Autosave debounce delay, in milliseconds.
    ///
    /// Default: 2000
    pub autosave_delay_ms: u64,

    /// Autosave size cap, in bytes.
    ///
    /// Default: 5 MiB
    pub autosave_max_bytes: usize,

    /// Device pixel ratio of raster canvases created by the editor.
    ///
    /// Default: 1.0
    pub pixel_ratio: f64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            tile_size: 200.0,
            background: Color::white(),
            undo_depth: 100,
            merge_window_ms: 500,
            autosave_delay_ms: 2000,
            autosave_max_bytes: 5 * 1024 * 1024,
            pixel_ratio: 1.0,
        }
    }
}
