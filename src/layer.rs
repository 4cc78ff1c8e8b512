// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Color, Error, LayerId, Opacity};

/// An optional per-layer background fill.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub struct LayerBackground {
    pub color: Color,
    pub alpha: Opacity,
}

/// A named layer.
#[derive(Clone, Debug)]
pub struct Layer {
    /// Unique id.
    pub id: LayerId,
    /// User-facing name.
    pub name: String,
    /// Dense position in `[0, layer count)`. Smaller renders first.
    pub order: usize,
    /// Layer visibility. Hides all entities on the layer.
    pub visible: bool,
    /// Layer lock. Locks all entities on the layer.
    pub locked: bool,
    /// Optional background fill.
    pub background: Option<LayerBackground>,
}

impl Layer {
    /// Creates a visible, unlocked layer.
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Layer {
            id,
            name: name.into(),
            order: 0,
            visible: true,
            locked: false,
            background: None,
        }
    }
}

/// The ordered set of layers.
///
/// `order` fields stay dense; they are renormalized after every mutation.
#[derive(Default, Debug)]
pub struct LayerTable {
    layers: Vec<Layer>,
}

impl LayerTable {
    /// Creates an empty table. A usable scene always adds a default
    /// layer right away.
    pub fn new() -> Self {
        LayerTable::default()
    }

    fn renormalize(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.order = i;
        }
    }

    /// The number of layers.
    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` when the table holds no layers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Appends a layer on top.
    pub fn insert(&mut self, layer: Layer) {
        self.layers.push(layer);
        self.renormalize();
    }

    /// Deletes a layer.
    ///
    /// The single remaining layer cannot be deleted.
    pub fn delete(&mut self, id: &LayerId) -> Result<Layer, Error> {
        let index = self
            .layers
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| Error::NoSuchLayer(id.clone()))?;

        if self.layers.len() == 1 {
            return Err(Error::LastLayer);
        }

        let layer = self.layers.remove(index);
        self.renormalize();
        Ok(layer)
    }

    /// Returns a layer by id.
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Returns a mutable layer by id.
    pub fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| &l.id == id)
    }

    /// Checks that a layer exists.
    pub fn has(&self, id: &LayerId) -> bool {
        self.get(id).is_some()
    }

    /// The bottom-most layer.
    pub fn first(&self) -> Option<&Layer> {
        self.layers.first()
    }

    /// Iterates layers bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Renames a layer.
    pub fn rename(&mut self, id: &LayerId, name: impl Into<String>) -> Result<(), Error> {
        let layer = self
            .get_mut(id)
            .ok_or_else(|| Error::NoSuchLayer(id.clone()))?;
        layer.name = name.into();
        Ok(())
    }

    /// Moves the layer at index `from` to index `to`.
    ///
    /// Out-of-range indices are clamped.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if self.layers.is_empty() || from >= self.layers.len() {
            return;
        }

        let layer = self.layers.remove(from);
        let to = to.min(self.layers.len());
        self.layers.insert(to, layer);
        self.renormalize();
    }
}
