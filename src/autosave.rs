// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::codec::{self, ProjectMetadata, AUTOSAVE_KEY};
use crate::scene::Scene;
use crate::{Error, Options};

/// The host-provided key-value blob store autosave writes into.
///
/// Writes may complete asynchronously on the host side; the core only
/// hands bytes over and never reads them back during a session.
pub trait BlobStore {
    /// Stores bytes under a key, replacing any previous value.
    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<(), String>;

    /// Reads bytes back, if present.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Drops a key.
    fn remove(&mut self, key: &str);
}

/// An in-memory blob store, for tests and headless hosts.
#[derive(Default, Debug)]
pub struct MemoryBlobStore {
    entries: std::collections::HashMap<String, Vec<u8>>,
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<(), String> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Debounced, size-capped background project writer.
///
/// Every mutation notes a change; the actual write happens once the
/// scene has been quiet for the configured delay. Oversized documents
/// are skipped with a warning, and the editor keeps running.
#[derive(Debug)]
pub struct Autosave {
    delay_ms: u64,
    max_bytes: usize,
    pending_since: Option<u64>,
}

impl Autosave {
    /// Creates an autosaver with the configured delay and size cap.
    pub fn new(options: &Options) -> Self {
        Autosave {
            delay_ms: options.autosave_delay_ms,
            max_bytes: options.autosave_max_bytes,
            pending_since: None,
        }
    }

    /// Notes a scene mutation. Each note restarts the debounce timer.
    pub fn note_change(&mut self, now_ms: u64) {
        self.pending_since = Some(now_ms);
    }

    /// Whether a write is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Writes the project if the debounce delay has elapsed.
    ///
    /// Returns `Ok(true)` when a write happened, `Ok(false)` when there
    /// was nothing to do yet or the document was over the size cap.
    pub fn poll(
        &mut self,
        scene: &Scene,
        metadata: &ProjectMetadata,
        now_ms: u64,
        store: &mut dyn BlobStore,
    ) -> Result<bool, Error> {
        let Some(since) = self.pending_since else {
            return Ok(false);
        };
        if now_ms.saturating_sub(since) < self.delay_ms {
            return Ok(false);
        }

        self.pending_since = None;

        let text = codec::encode(scene, metadata)?;
        if text.len() > self.max_bytes {
            log::warn!(
                "Autosave skipped: {}B exceeds the {}B cap.",
                text.len(),
                self.max_bytes
            );
            return Ok(false);
        }

        store
            .put(AUTOSAVE_KEY, text.as_bytes())
            .map_err(Error::BlobStoreFailed)?;
        Ok(true)
    }

    /// Returns the stored autosave document, if one exists.
    ///
    /// Called at startup; the host decides whether to offer recovery.
    pub fn recover(store: &dyn BlobStore) -> Option<Vec<u8>> {
        store.get(AUTOSAVE_KEY)
    }

    /// Discards the stored autosave document.
    pub fn discard(store: &mut dyn BlobStore) {
        store.remove(AUTOSAVE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdGen;

    fn scene() -> Scene {
        let mut ids = IdGen::new();
        Scene::new(&mut ids)
    }

    #[test]
    fn debounce_delays_write() {
        let scene = scene();
        let metadata = ProjectMetadata::default();
        let mut store = MemoryBlobStore::default();
        let mut autosave = Autosave::new(&Options::default());

        autosave.note_change(1000);
        assert!(!autosave.poll(&scene, &metadata, 1500, &mut store).unwrap());
        assert!(Autosave::recover(&store).is_none());

        assert!(autosave.poll(&scene, &metadata, 3000, &mut store).unwrap());
        assert!(Autosave::recover(&store).is_some());
    }

    #[test]
    fn changes_coalesce() {
        let scene = scene();
        let metadata = ProjectMetadata::default();
        let mut store = MemoryBlobStore::default();
        let mut autosave = Autosave::new(&Options::default());

        autosave.note_change(1000);
        autosave.note_change(2500);
        // The first change alone would be due by now, but the second
        // restarted the timer.
        assert!(!autosave.poll(&scene, &metadata, 3400, &mut store).unwrap());
        assert!(autosave.poll(&scene, &metadata, 4600, &mut store).unwrap());
        assert!(!autosave.is_pending());
    }

    #[test]
    fn size_cap_skips_write() {
        let scene = scene();
        let metadata = ProjectMetadata::default();
        let mut store = MemoryBlobStore::default();

        let mut options = Options::default();
        options.autosave_max_bytes = 10;
        let mut autosave = Autosave::new(&options);

        autosave.note_change(0);
        assert!(!autosave.poll(&scene, &metadata, 5000, &mut store).unwrap());
        assert!(Autosave::recover(&store).is_none());
        // The editor keeps running; the next change schedules again.
        autosave.note_change(6000);
        assert!(autosave.is_pending());
    }

    #[test]
    fn recover_round_trips() {
        let scene = scene();
        let metadata = ProjectMetadata::default();
        let mut store = MemoryBlobStore::default();
        let mut autosave = Autosave::new(&Options::default());

        autosave.note_change(0);
        autosave.poll(&scene, &metadata, 10_000, &mut store).unwrap();

        let bytes = Autosave::recover(&store).unwrap();
        let mut ids = IdGen::new();
        let mut restored = Scene::default();
        codec::decode(
            std::str::from_utf8(&bytes).unwrap(),
            &mut restored,
            &mut ids,
        )
        .unwrap();
        assert_eq!(restored.layers.len(), 1);

        Autosave::discard(&mut store);
        assert!(Autosave::recover(&store).is_none());
    }
}
