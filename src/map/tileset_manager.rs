//! Reference counting for tilesets embedded in stamp maps.
//!
//! Stamp variations own their maps, but the tilesets those maps point at are
//! shared with open documents and other stamps. The manager keeps a tileset
//! alive while any variation references it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;

use super::tileset::SharedTileset;

struct TrackedTileset {
    tileset: SharedTileset,
    count: usize,
}

/// Process-wide tileset reference counts. Cloning yields another handle to
/// the same counts.
#[derive(Resource, Clone, Default)]
pub struct TilesetManager {
    references: Arc<Mutex<HashMap<usize, TrackedTileset>>>,
}

impl TilesetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_references(&self, tilesets: &[SharedTileset]) {
        let mut references = self.lock();
        for tileset in tilesets {
            references
                .entry(key(tileset))
                .or_insert_with(|| TrackedTileset {
                    tileset: Arc::clone(tileset),
                    count: 0,
                })
                .count += 1;
        }
    }

    pub fn remove_references(&self, tilesets: &[SharedTileset]) {
        let mut references = self.lock();
        for tileset in tilesets {
            let key = key(tileset);
            let Some(tracked) = references.get_mut(&key) else {
                warn!("Releasing untracked tileset '{}'", tileset.name);
                continue;
            };
            tracked.count -= 1;
            if tracked.count == 0 {
                debug!("Tileset '{}' no longer referenced", tracked.tileset.name);
                references.remove(&key);
            }
        }
    }

    pub fn reference_count(&self, tileset: &SharedTileset) -> usize {
        self.lock()
            .get(&key(tileset))
            .map_or(0, |tracked| tracked.count)
    }

    /// Tilesets currently kept alive by at least one reference.
    pub fn tracked_tilesets(&self) -> Vec<SharedTileset> {
        self.lock()
            .values()
            .map(|tracked| Arc::clone(&tracked.tileset))
            .collect()
    }

    /// Acquires references to `tilesets`, released when the guard drops.
    pub fn acquire(&self, tilesets: Vec<SharedTileset>) -> TilesetReferences {
        self.add_references(&tilesets);
        TilesetReferences {
            manager: self.clone(),
            tilesets,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, TrackedTileset>> {
        self.references
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(tileset: &SharedTileset) -> usize {
    Arc::as_ptr(tileset) as usize
}

/// Scoped tileset references: one `add_references` on creation, one
/// `remove_references` on drop.
pub struct TilesetReferences {
    manager: TilesetManager,
    tilesets: Vec<SharedTileset>,
}

impl Clone for TilesetReferences {
    fn clone(&self) -> Self {
        self.manager.acquire(self.tilesets.clone())
    }
}

impl Drop for TilesetReferences {
    fn drop(&mut self) {
        self.manager.remove_references(&self.tilesets);
    }
}

impl std::fmt::Debug for TilesetReferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tilesets.iter().map(|t| &t.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tileset;

    #[test]
    fn test_add_and_remove_references() {
        let manager = TilesetManager::new();
        let tileset = Tileset::new("terrain", 16, 16, 4).into_shared();

        manager.add_references(&[tileset.clone()]);
        manager.add_references(&[tileset.clone()]);
        assert_eq!(manager.reference_count(&tileset), 2);

        manager.remove_references(&[tileset.clone()]);
        assert_eq!(manager.reference_count(&tileset), 1);
        manager.remove_references(&[tileset.clone()]);
        assert_eq!(manager.reference_count(&tileset), 0);
        assert!(manager.tracked_tilesets().is_empty());
    }

    #[test]
    fn test_removing_untracked_tileset_is_ignored() {
        let manager = TilesetManager::new();
        let tileset = Tileset::new("terrain", 16, 16, 4).into_shared();

        manager.remove_references(&[tileset.clone()]);
        assert_eq!(manager.reference_count(&tileset), 0);
    }

    #[test]
    fn test_equal_tilesets_are_tracked_separately() {
        let manager = TilesetManager::new();
        let a = Tileset::new("terrain", 16, 16, 4).into_shared();
        let b = Tileset::new("terrain", 16, 16, 4).into_shared();

        manager.add_references(&[a.clone()]);
        assert_eq!(manager.reference_count(&a), 1);
        assert_eq!(manager.reference_count(&b), 0);
    }

    #[test]
    fn test_tracker_keeps_tileset_alive() {
        let manager = TilesetManager::new();
        let tileset = Tileset::new("terrain", 16, 16, 4).into_shared();
        let weak = Arc::downgrade(&tileset);

        let guard = manager.acquire(vec![tileset]);
        assert!(weak.upgrade().is_some());

        drop(guard);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_guard_clone_acquires_again() {
        let manager = TilesetManager::new();
        let tileset = Tileset::new("terrain", 16, 16, 4).into_shared();

        let guard = manager.acquire(vec![tileset.clone()]);
        let copy = guard.clone();
        assert_eq!(manager.reference_count(&tileset), 2);

        drop(guard);
        assert_eq!(manager.reference_count(&tileset), 1);
        drop(copy);
        assert_eq!(manager.reference_count(&tileset), 0);
    }
}
