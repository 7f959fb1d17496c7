//! Tile stamps: named, weighted collections of map variations.
//!
//! A [`TileStamp`] is a shared handle. Clones point at the same storage,
//! compare equal and see each other's edits, so a stamp keeps its identity
//! for as long as it lives. [`TileStamp::detached`] makes an independent deep
//! copy (duplicating every map and acquiring fresh tileset references), which
//! is how [`TileStamp::flipped`] and [`TileStamp::rotated`] leave the source
//! stamp untouched.

use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bevy::prelude::*;
use rand::Rng;
use serde_json::{json, Value};

use crate::constants::{DEFAULT_VARIATION_PROBABILITY, NUM_QUICK_STAMPS};
use crate::map::{
    map_from_json, map_to_json, FlipDirection, Map, MapFormatError, RotateDirection,
    TilesetManager, TilesetReferences,
};

/// One map fragment of a stamp together with its selection weight.
///
/// The variation owns its map and holds a reference on every tileset the map
/// uses for as long as it lives.
#[derive(Debug, Clone)]
pub struct StampVariation {
    map: Map,
    pub probability: f64,
    _references: TilesetReferences,
}

impl StampVariation {
    pub fn new(map: Map, probability: f64, tilesets: &TilesetManager) -> Self {
        let references = tilesets.acquire(map.tilesets().to_vec());
        Self {
            map,
            probability,
            _references: references,
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    /// Gives up the map, releasing this variation's tileset references.
    pub fn into_map(self) -> Map {
        self.map
    }
}

/// Weights that are not finite and positive are not valid.
pub fn is_valid_probability(probability: f64) -> bool {
    probability.is_finite() && probability > 0.0
}

#[derive(Debug, Default)]
struct TileStampData {
    name: String,
    quick_stamp_index: Option<usize>,
    variations: Vec<StampVariation>,
}

/// Read access to the variations of a stamp.
///
/// Holds the stamp's lock; drop it before editing the same stamp.
pub struct Variations<'a>(RwLockReadGuard<'a, TileStampData>);

impl Deref for Variations<'_> {
    type Target = [StampVariation];

    fn deref(&self) -> &[StampVariation] {
        &self.0.variations
    }
}

#[derive(Clone, Default)]
pub struct TileStamp {
    d: Arc<RwLock<TileStampData>>,
}

impl TileStamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp with `map` as its single variation.
    pub fn from_map(map: Map, tilesets: &TilesetManager) -> Self {
        let stamp = Self::new();
        stamp.add_variation(map, DEFAULT_VARIATION_PROBABILITY, tilesets);
        stamp
    }

    /// Independent deep copy with the same name and no quick slot.
    pub fn detached(&self) -> TileStamp {
        let d = self.read();
        let data = TileStampData {
            name: d.name.clone(),
            quick_stamp_index: None,
            variations: d.variations.clone(),
        };
        TileStamp {
            d: Arc::new(RwLock::new(data)),
        }
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.write().name = name.into();
    }

    pub fn quick_stamp_index(&self) -> Option<usize> {
        self.read().quick_stamp_index
    }

    pub fn set_quick_stamp_index(&self, index: Option<usize>) {
        self.write().quick_stamp_index = index;
    }

    pub fn variations(&self) -> Variations<'_> {
        Variations(self.read())
    }

    pub fn variation_count(&self) -> usize {
        self.read().variations.len()
    }

    /// A stamp is considered empty when it has no variations.
    pub fn is_empty(&self) -> bool {
        self.read().variations.is_empty()
    }

    pub fn probability(&self, index: usize) -> f64 {
        self.read().variations[index].probability
    }

    pub fn set_probability(&self, index: usize, probability: f64) {
        self.write().variations[index].probability = probability;
    }

    /// Adds `map` as a new variation. The stamp takes ownership of the map
    /// and references its tilesets.
    pub fn add_variation(&self, map: Map, probability: f64, tilesets: &TilesetManager) {
        let variation = StampVariation::new(map, probability, tilesets);
        self.write().variations.push(variation);
    }

    /// Appends an existing variation, tileset references included.
    pub fn push_variation(&self, variation: StampVariation) {
        self.write().variations.push(variation);
    }

    /// Removes the variation at `index` and hands it to the caller, who now
    /// holds its map and its tileset references.
    ///
    /// Panics if `index` is out of range.
    pub fn take_variation(&self, index: usize) -> StampVariation {
        self.write().variations.remove(index)
    }

    /// Removes the variation at `index`, freeing its map and releasing its
    /// tileset references.
    ///
    /// Panics if `index` is out of range.
    pub fn delete_variation(&self, index: usize) {
        drop(self.take_variation(index));
    }

    /// Picks a variation at random, weighted by probability, and returns a
    /// copy of its map.
    pub fn random_variation(&self) -> Option<Map> {
        self.random_variation_with(&mut rand::rng())
    }

    pub fn random_variation_with<R: Rng>(&self, rng: &mut R) -> Option<Map> {
        let variations = self.variations();
        let index = random_index(&variations, rng)?;
        Some(variations[index].map().clone())
    }

    /// Returns a new stamp where all variations have been flipped in the
    /// given direction.
    pub fn flipped(&self, direction: FlipDirection) -> TileStamp {
        self.transformed(|map| {
            if let Some(layer) = map.layer_mut(0) {
                layer.flip(direction);
            }
        })
    }

    /// Returns a new stamp where all variations have been rotated in the
    /// given direction.
    pub fn rotated(&self, direction: RotateDirection) -> TileStamp {
        self.transformed(|map| {
            let Some(layer) = map.layer_mut(0) else {
                return;
            };
            layer.rotate(direction);
            let (width, height) = (layer.width(), layer.height());
            map.width = width;
            map.height = height;
        })
    }

    fn transformed(&self, mut transform: impl FnMut(&mut Map)) -> TileStamp {
        let stamp = self.detached();
        for variation in &mut stamp.write().variations {
            transform(&mut variation.map);
        }
        stamp
    }

    pub fn to_json(&self, dir: &Path) -> Result<Value, MapFormatError> {
        let d = self.read();

        let variations = d
            .variations
            .iter()
            .map(|variation| {
                Ok(json!({
                    "probability": variation.probability,
                    "map": map_to_json(&variation.map, dir)?,
                }))
            })
            .collect::<Result<Vec<_>, MapFormatError>>()?;

        let mut stamp = json!({
            "name": d.name,
            "variations": variations,
        });
        if let Some(index) = d.quick_stamp_index {
            stamp["quickStampIndex"] = json!(index);
        }

        Ok(stamp)
    }

    /// Builds a stamp from its JSON form. Variations whose map cannot be
    /// decoded are skipped.
    pub fn from_json(json: &Value, map_dir: &Path, tilesets: &TilesetManager) -> TileStamp {
        let stamp = TileStamp::new();

        stamp.set_name(json.get("name").and_then(Value::as_str).unwrap_or_default());
        stamp.set_quick_stamp_index(
            json.get("quickStampIndex")
                .and_then(Value::as_i64)
                .and_then(|index| usize::try_from(index).ok())
                .filter(|index| *index < NUM_QUICK_STAMPS),
        );

        let variations = json
            .get("variations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for variation in variations {
            let map = match map_from_json(&variation["map"], map_dir) {
                Ok(map) => map,
                Err(e) => {
                    debug!("Failed to load map for stamp: {}", e);
                    continue;
                }
            };

            let probability = match variation.get("probability").and_then(Value::as_f64) {
                Some(probability) if is_valid_probability(probability) => probability,
                Some(probability) => {
                    debug!(
                        "Resetting invalid variation probability {} to {}",
                        probability, DEFAULT_VARIATION_PROBABILITY
                    );
                    DEFAULT_VARIATION_PROBABILITY
                }
                None => DEFAULT_VARIATION_PROBABILITY,
            };

            stamp.add_variation(map, probability, tilesets);
        }

        stamp
    }

    fn read(&self) -> RwLockReadGuard<'_, TileStampData> {
        self.d.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TileStampData> {
        self.d.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn random_index<R: Rng>(variations: &[StampVariation], rng: &mut R) -> Option<usize> {
    if variations.is_empty() {
        return None;
    }

    let mut thresholds = Vec::with_capacity(variations.len());
    let mut sum = 0.0;
    for variation in variations {
        sum += variation.probability;
        thresholds.push(sum);
    }

    let random = rng.random::<f64>() * sum;
    let index = thresholds.partition_point(|threshold| *threshold < random);

    // Rounding may leave the draw above the last threshold
    Some(index.min(variations.len() - 1))
}

impl PartialEq for TileStamp {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.d, &other.d)
    }
}

impl Eq for TileStamp {}

impl std::fmt::Debug for TileStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = self.read();
        f.debug_struct("TileStamp")
            .field("name", &d.name)
            .field("quick_stamp_index", &d.quick_stamp_index)
            .field("variations", &d.variations.len())
            .finish()
    }
}
