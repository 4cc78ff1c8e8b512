// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`tileweave` is the engine behind a seamless-tile pattern editor.

The user draws vector primitives on a square tile; the engine keeps one
canonical instance per entity and paints 25 periodic copies of it, so
the tile edges join without seams. Selection happens through proxies:
the user can grab any visible copy, and every edit converges on the
canonical, wrapped back into the center tile.

The crate is the headless core: scene state, hit-testing, the brush
engines, the undo stack and the project codec. Windowing, file dialogs
and export encoders live in the host, which talks to the core through
the [`Canvas2d`] contract and [`SceneController`] events.

## Quick start

```rust
use tileweave::{Options, PointerInput, Modifiers, SceneController, ShapeKind, Tool, Color};

let mut editor = SceneController::new(Options::default());
editor.set_tool(Tool::Shape { kind: ShapeKind::Rect, color: Color::black() });

let at = |x, y, time_ms| PointerInput { x, y, time_ms, modifiers: Modifiers::default() };
editor.pointer_down(at(300.0, 300.0, 0));
editor.pointer_move(at(340.0, 340.0, 16));
editor.pointer_up(at(340.0, 340.0, 32));

assert_eq!(editor.scene.store.len(), 1);
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod autosave;
mod canvas;
mod codec;
mod color;
mod command;
mod controller;
mod entity;
mod error;
mod geom;
mod group;
mod hittest;
mod id;
mod layer;
mod merge;
mod options;
mod proxy;
mod raster;
mod render;
mod scene;
mod store;
mod tile;
mod transform;

pub mod brush;
pub mod path;

pub use autosave::{Autosave, BlobStore, MemoryBlobStore};
pub use canvas::{Canvas2d, ImageData, Shadow};
pub use codec::{decode, encode, ProjectMetadata, AUTOSAVE_KEY, FORMAT_VERSION};
pub use color::{Color, Opacity};
pub use command::{Command, CommandStack, DeleteSnapshot, GroupSnapshot, PoseChange, StackEvent};
pub use controller::{
    Key, KeyInput, Modifiers, PointerInput, SceneController, ShapeKind, Tool,
};
pub use entity::{Appearance, Entity, EntityKind, OriginX, OriginY, Pose, SvgChild};
pub use error::Error;
pub use geom::{FuzzyEq, FuzzyZero, IsValidLength, Point, Rect, Size};
pub use group::EntityGroupIndex;
pub use hittest::{Hit, HitTester};
pub use id::{EntityId, GroupId, IdGen, LayerId};
pub use layer::{Layer, LayerBackground, LayerTable};
pub use merge::{merge_entities, merge_fragments, MergedPath};
pub use options::Options;
pub use proxy::{wrap_into_center_tile, Proxy, ProxyManager, MIN_PROXY_SIZE};
pub use raster::RasterCanvas;
pub use render::{virtual_offsets, VirtualRenderer};
pub use scene::Scene;
pub use store::{CanonicalStore, ChangeEvent};
pub use tile::extract_tile;
pub use transform::{Svd, Transform};

pub use path::SvgPath;

pub(crate) trait OptionLog {
    fn log_none<F: FnOnce()>(self, f: F) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn log_none<F: FnOnce()>(self, f: F) -> Self {
        self.or_else(|| {
            f();
            None
        })
    }
}
