// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::entity::Pose;
use crate::geom::Size;
use crate::{Entity, EntityId};

/// Minimum physical proxy size, in points.
///
/// Keeps selection handles usable on tiny objects.
pub const MIN_PROXY_SIZE: f64 = 26.0;

/// An ephemeral, selectable stand-in for a canonical entity at some
/// tile offset.
///
/// Proxies are plain data; they are created when a selection appears and
/// destroyed when it clears. They never persist.
#[derive(Clone, Debug)]
pub struct Proxy {
    /// The canonical this proxy stands in for.
    pub entity_id: EntityId,
    /// Which periodic copy the user grabbed.
    pub tile_offset: (i32, i32),
    /// The canonical's untransformed size at creation.
    pub base_size: Size,
    /// The canonical's scale at creation.
    pub base_scale: (f64, f64),
    /// Per-axis enlargement applied to reach [`MIN_PROXY_SIZE`].
    /// `1.0` for ordinarily sized entities.
    pub size_ratio: (f64, f64),
    /// World-space recentering offset of the enlarged rect.
    pub size_adjust: (f64, f64),
    /// The proxy's own pose in window coordinates.
    pub pose: Pose,
}

/// Creates and synchronizes selection proxies.
#[derive(Default, Debug)]
pub struct ProxyManager {
    proxies: HashMap<EntityId, Proxy>,
    tile_size: f64,
}

impl ProxyManager {
    /// Creates a manager for the given tile size.
    pub fn new(tile_size: f64) -> Self {
        ProxyManager {
            proxies: HashMap::new(),
            tile_size,
        }
    }

    /// The number of live proxies.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Returns `true` when no proxies are live.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Creates (or replaces) the proxy for an entity at a tile offset.
    ///
    /// An entity without an id cannot be proxied.
    pub fn create(&mut self, entity: &Entity, tile_offset: (i32, i32)) -> Option<&Proxy> {
        if entity.id.is_empty() {
            log::warn!("Refusing to proxy an entity without an id.");
            return None;
        }

        let base = Size::new(entity.width(), entity.height());
        let scale = (entity.pose.scale_x, entity.pose.scale_y);
        let ratio = (
            enlargement(base.width, scale.0),
            enlargement(base.height, scale.1),
        );
        let adjust = (
            base.width * (ratio.0 - 1.0) / 2.0 * scale.0.abs(),
            base.height * (ratio.1 - 1.0) / 2.0 * scale.1.abs(),
        );

        let mut pose = entity.pose;
        pose.scale_x = scale.0 * ratio.0;
        pose.scale_y = scale.1 * ratio.1;
        pose.left = entity.pose.left + tile_offset.0 as f64 * self.tile_size - adjust.0;
        pose.top = entity.pose.top + tile_offset.1 as f64 * self.tile_size - adjust.1;

        let proxy = Proxy {
            entity_id: entity.id.clone(),
            tile_offset,
            base_size: base,
            base_scale: scale,
            size_ratio: ratio,
            size_adjust: adjust,
            pose,
        };

        self.proxies.insert(entity.id.clone(), proxy);
        self.proxies.get(&entity.id)
    }

    /// Returns the proxy for an entity.
    pub fn get(&self, id: &EntityId) -> Option<&Proxy> {
        self.proxies.get(id)
    }

    /// Returns a mutable proxy for an entity.
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Proxy> {
        self.proxies.get_mut(id)
    }

    /// Removes the proxy of an entity, if any.
    pub fn remove(&mut self, id: &EntityId) -> Option<Proxy> {
        self.proxies.remove(id)
    }

    /// Destroys every proxy.
    pub fn clear(&mut self) {
        self.proxies.clear();
    }

    /// Iterates all live proxies.
    pub fn all(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies.values()
    }

    /// Drops proxies whose canonical no longer exists.
    pub fn prune(&mut self, store: &crate::store::CanonicalStore) {
        self.proxies.retain(|id, _| store.has(id));
    }

    /// Converts a proxy's pose back into its canonical's pose.
    ///
    /// The canonical scale is the proxy scale with the enlargement
    /// divided back out; the position drops the tile offset and the
    /// recentering, then wraps into the center tile `[T, 2T)`. Rotation
    /// and skew values transfer verbatim.
    pub fn sync_proxy_to_canonical(&self, id: &EntityId, entity: &mut Entity) {
        let Some(proxy) = self.proxies.get(id) else {
            return;
        };

        let scale = (
            proxy.pose.scale_x / proxy.size_ratio.0,
            proxy.pose.scale_y / proxy.size_ratio.1,
        );
        let adjust = (
            proxy.base_size.width * (proxy.size_ratio.0 - 1.0) / 2.0 * scale.0.abs(),
            proxy.base_size.height * (proxy.size_ratio.1 - 1.0) / 2.0 * scale.1.abs(),
        );

        let t = self.tile_size;
        let left = proxy.pose.left - proxy.tile_offset.0 as f64 * t + adjust.0;
        let top = proxy.pose.top - proxy.tile_offset.1 as f64 * t + adjust.1;

        entity.pose = proxy.pose;
        entity.pose.scale_x = scale.0;
        entity.pose.scale_y = scale.1;
        entity.pose.left = wrap_into_center_tile(left, t);
        entity.pose.top = wrap_into_center_tile(top, t);
    }

    /// Re-derives a proxy's pose after a programmatic canonical change.
    pub fn sync_canonical_to_proxy(&mut self, entity: &Entity) {
        let Some(proxy) = self.proxies.get(&entity.id) else {
            return;
        };
        let offset = proxy.tile_offset;
        self.create(entity, offset);
    }
}

#[inline]
fn enlargement(base: f64, scale: f64) -> f64 {
    let world = base * scale.abs();
    if world < MIN_PROXY_SIZE && world > 0.0 {
        MIN_PROXY_SIZE / world
    } else {
        1.0
    }
}

/// Wraps a coordinate into the canonical tile `[T, 2T)`.
#[inline]
pub fn wrap_into_center_tile(v: f64, tile_size: f64) -> f64 {
    ((v % tile_size) + tile_size) % tile_size + tile_size
}
