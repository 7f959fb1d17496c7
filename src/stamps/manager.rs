//! The stamp library: named stamps, quick slots and their files.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use super::context::StampContext;
use super::model::TileStampModel;
use super::storage;
use super::tile_stamp::{is_valid_probability, TileStamp};
use crate::constants::{NUM_QUICK_STAMPS, STAMP_NAME_PREFIX};
use crate::map::TilesetManager;

/// Something observers of the stamp library need to hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum StampNotification {
    Added(TileStamp),
    Changed(TileStamp),
    Removed(TileStamp),
    ActiveStampChanged(TileStamp),
}

/// Label of the key recalling quick slot `index`.
pub fn quick_stamp_key_label(index: usize) -> String {
    (index + 1).to_string()
}

#[derive(Resource)]
pub struct TileStampManager {
    quick_stamps: [Option<TileStamp>; NUM_QUICK_STAMPS],
    model: TileStampModel,
    stamps_by_name: BTreeMap<String, TileStamp>,
    stamps_dir: PathBuf,
    loading_stamps: bool,
    tilesets: TilesetManager,
    notifications: Vec<StampNotification>,
}

impl TileStampManager {
    /// Creates an empty library over `stamps_dir`. Call [`Self::load_stamps`]
    /// to read the stamps already there.
    pub fn new(stamps_dir: PathBuf, tilesets: TilesetManager) -> Self {
        Self {
            quick_stamps: Default::default(),
            model: TileStampModel::default(),
            stamps_by_name: BTreeMap::new(),
            stamps_dir,
            loading_stamps: false,
            tilesets,
            notifications: Vec::new(),
        }
    }

    pub fn stamps_dir(&self) -> &Path {
        &self.stamps_dir
    }

    pub fn tileset_manager(&self) -> &TilesetManager {
        &self.tilesets
    }

    pub fn stamps(&self) -> &[TileStamp] {
        self.model.stamps()
    }

    /// Panics if `index` is not a quick slot.
    pub fn quick_stamp(&self, index: usize) -> Option<&TileStamp> {
        self.quick_stamps[index].as_ref()
    }

    pub fn stamp_by_name(&self, name: &str) -> Option<&TileStamp> {
        self.stamps_by_name.get(name)
    }

    pub fn drain_notifications(&mut self) -> Vec<StampNotification> {
        std::mem::take(&mut self.notifications)
    }

    /// Adds the stamp derived from `context` to the library.
    pub fn create_stamp(&mut self, context: &StampContext) {
        let stamp = context.stamp(&self.tilesets);
        if stamp.is_empty() {
            return;
        }
        self.add_stamp(stamp);
    }

    /// Appends the variations of the stamp derived from `context` to
    /// `target`.
    pub fn add_variation(&mut self, target: &TileStamp, context: &StampContext) {
        let stamp = context.stamp(&self.tilesets);
        if stamp.is_empty() || stamp == *target {
            return;
        }

        let variations = stamp.variations().to_vec();
        self.modify_stamp(target, |target| {
            for variation in variations {
                target.push_variation(variation);
            }
        });
    }

    pub fn select_quick_stamp(&mut self, index: usize) {
        if let Some(stamp) = &self.quick_stamps[index]
            && !stamp.is_empty()
        {
            self.notifications
                .push(StampNotification::ActiveStampChanged(stamp.clone()));
        }
    }

    pub fn create_quick_stamp(&mut self, index: usize, context: &StampContext) {
        let stamp = context.stamp(&self.tilesets);
        if stamp.is_empty() {
            return;
        }
        self.set_quick_stamp(index, stamp);
    }

    pub fn extend_quick_stamp(&mut self, index: usize, context: &StampContext) {
        match self.quick_stamps[index].clone() {
            Some(stamp) => self.add_variation(&stamp, context),
            None => self.create_quick_stamp(index, context),
        }
    }

    fn set_quick_stamp(&mut self, index: usize, stamp: TileStamp) {
        stamp.set_quick_stamp_index(Some(index));
        self.erase_quick_stamp(index);

        if self.model.contains(&stamp) {
            self.on_stamp_changed(&stamp);
        } else {
            self.add_stamp(stamp.clone());
        }
        self.quick_stamps[index] = Some(stamp);
    }

    /// Clears slot `index`. The stamp leaves the library unless another slot
    /// still holds it.
    fn erase_quick_stamp(&mut self, index: usize) {
        let Some(stamp) = self.quick_stamps[index].take() else {
            return;
        };

        let still_bound = self.quick_stamps.iter().flatten().any(|s| *s == stamp);
        if !still_bound {
            self.remove_from_model(&stamp);
        }
    }

    /// Switches to another stamps directory. Quick slots and the library are
    /// cleared without touching any file, then the new directory is loaded.
    /// Observers hear about every stamp leaving the library.
    pub fn set_stamps_directory(&mut self, stamps_dir: PathBuf) {
        info!("Stamps directory changed to {:?}", stamps_dir);
        self.stamps_dir = stamps_dir;
        self.quick_stamps = Default::default();
        self.stamps_by_name.clear();
        for stamp in self.model.take_stamps() {
            self.notifications.push(StampNotification::Removed(stamp));
        }
        self.load_stamps();
    }

    pub fn load_stamps(&mut self) {
        self.loading_stamps = true;

        for stamp in storage::load_stamps(&self.stamps_dir, &self.tilesets) {
            let quick_stamp_index = stamp.quick_stamp_index();
            self.add_stamp(stamp.clone());
            if let Some(index) = quick_stamp_index {
                self.quick_stamps[index] = Some(stamp);
            }
        }

        self.loading_stamps = false;
        info!(
            "Loaded {} stamps from {:?}",
            self.model.len(),
            self.stamps_dir
        );
    }

    /// Renames `stamp`, moving its file. Rejected when `name` is not a
    /// usable file name or belongs to another stamp.
    pub fn rename_stamp(&mut self, stamp: &TileStamp, name: &str) -> bool {
        if !storage::is_valid_stamp_name(name) {
            warn!("Refusing to rename stamp '{}' to {:?}", stamp.name(), name);
            return false;
        }
        if self.stamps_by_name.get(name).is_some_and(|s| s != stamp) {
            warn!("A stamp named '{}' already exists", name);
            return false;
        }
        if !self.model.contains(stamp) {
            warn!("Stamp '{}' is not in the library", stamp.name());
            return false;
        }

        stamp.set_name(name);
        self.on_stamp_changed(stamp);
        true
    }

    /// Deletes `stamp` and its file, unbinding it from every quick slot.
    pub fn remove_stamp(&mut self, stamp: &TileStamp) {
        for slot in &mut self.quick_stamps {
            if slot.as_ref() == Some(stamp) {
                *slot = None;
            }
        }
        self.remove_from_model(stamp);
    }

    /// Deletes one variation. Deleting the last one deletes the stamp.
    ///
    /// Panics if `index` is out of range.
    pub fn delete_variation(&mut self, stamp: &TileStamp, index: usize) {
        assert!(
            index < stamp.variation_count(),
            "variation index {index} out of range"
        );

        if stamp.variation_count() == 1 {
            self.remove_stamp(stamp);
        } else {
            self.modify_stamp(stamp, |stamp| stamp.delete_variation(index));
        }
    }

    /// Changes the weight of one variation. Non-positive weights are
    /// rejected.
    ///
    /// Panics if `index` is out of range.
    pub fn set_probability(&mut self, stamp: &TileStamp, index: usize, probability: f64) {
        if !is_valid_probability(probability) {
            warn!("Ignoring invalid variation probability {}", probability);
            return;
        }
        self.modify_stamp(stamp, |stamp| stamp.set_probability(index, probability));
    }

    /// Makes `stamp` the active paint stamp.
    pub fn select_stamp(&mut self, stamp: &TileStamp) {
        if stamp.is_empty() {
            return;
        }
        self.notifications
            .push(StampNotification::ActiveStampChanged(stamp.clone()));
    }

    /// Paints with a single variation of `stamp`, copied into a stamp of its
    /// own.
    ///
    /// Panics if `index` is out of range.
    pub fn select_variation(&mut self, stamp: &TileStamp, index: usize) {
        let map = stamp.variations()[index].map().clone();
        let single = TileStamp::from_map(map, &self.tilesets);
        self.notifications
            .push(StampNotification::ActiveStampChanged(single));
    }

    fn add_stamp(&mut self, stamp: TileStamp) {
        if self.model.add_stamp(stamp.clone()) {
            self.on_stamp_added(&stamp);
        }
    }

    fn remove_from_model(&mut self, stamp: &TileStamp) {
        if self.model.remove_stamp(stamp) {
            self.on_stamp_removed(stamp);
        }
    }

    /// Applies a variation edit to a library stamp. Every handle sharing
    /// the stamp sees the edit.
    fn modify_stamp(&mut self, stamp: &TileStamp, edit: impl FnOnce(&TileStamp)) {
        if !self.model.contains(stamp) {
            warn!("Stamp '{}' is not in the library", stamp.name());
            return;
        }

        edit(stamp);
        self.on_stamp_changed(stamp);
    }

    fn on_stamp_added(&mut self, stamp: &TileStamp) {
        let name = stamp.name();
        if !storage::is_valid_stamp_name(&name) || self.stamps_by_name.contains_key(&name) {
            stamp.set_name(self.unused_stamp_name());
        }

        self.stamps_by_name.insert(stamp.name(), stamp.clone());
        if !self.loading_stamps {
            self.save_stamp(stamp);
        }
        self.notifications
            .push(StampNotification::Added(stamp.clone()));
    }

    fn on_stamp_changed(&mut self, stamp: &TileStamp) {
        let name = stamp.name();

        if let Some(old_name) = self.indexed_name(stamp)
            && old_name != name
        {
            self.stamps_by_name.remove(&old_name);
            if let Err(e) = storage::rename_stamp_file(&self.stamps_dir, &old_name, &name) {
                warn!("Failed to rename stamp file '{}' to '{}': {}", old_name, name, e);
            }
        }

        self.stamps_by_name.insert(name, stamp.clone());
        self.save_stamp(stamp);
        self.notifications
            .push(StampNotification::Changed(stamp.clone()));
    }

    fn on_stamp_removed(&mut self, stamp: &TileStamp) {
        let name = self.indexed_name(stamp).unwrap_or_else(|| stamp.name());
        self.stamps_by_name.remove(&name);

        match storage::delete_stamp_file(&self.stamps_dir, &name) {
            Ok(()) => debug!("Deleted stamp file for '{}'", name),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete stamp file for '{}': {}", name, e),
        }
        self.notifications
            .push(StampNotification::Removed(stamp.clone()));
    }

    /// Name `stamp` is currently indexed under.
    fn indexed_name(&self, stamp: &TileStamp) -> Option<String> {
        self.stamps_by_name
            .iter()
            .find(|(_, s)| *s == stamp)
            .map(|(name, _)| name.clone())
    }

    fn unused_stamp_name(&self) -> String {
        (1..)
            .map(|n| format!("{} {}", STAMP_NAME_PREFIX, n))
            .find(|name| !self.stamps_by_name.contains_key(name))
            .unwrap_or_default()
    }

    fn save_stamp(&self, stamp: &TileStamp) {
        match storage::save_stamp(&self.stamps_dir, stamp) {
            Ok(path) => debug!("Saved stamp '{}' to {:?}", stamp.name(), path),
            Err(e) => error!("Failed to save stamp '{}': {}", stamp.name(), e),
        }
    }
}
