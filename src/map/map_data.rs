use serde::{Deserialize, Serialize};

use super::layer::TileLayer;
use super::tileset::{push_unique, SharedTileset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RenderOrder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

/// A tile map. Stamp variations are small maps holding a single tile layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    pub width: i32,
    pub height: i32,
    pub tile_width: u32,
    pub tile_height: u32,
    tilesets: Vec<SharedTileset>,
    layers: Vec<TileLayer>,
}

impl Map {
    pub fn new(
        orientation: Orientation,
        width: i32,
        height: i32,
        tile_width: u32,
        tile_height: u32,
    ) -> Self {
        Self {
            orientation,
            render_order: RenderOrder::default(),
            width,
            height,
            tile_width,
            tile_height,
            tilesets: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn tilesets(&self) -> &[SharedTileset] {
        &self.tilesets
    }

    /// Adds a tileset reference unless the map already has it.
    pub fn add_tileset(&mut self, tileset: &SharedTileset) {
        push_unique(&mut self.tilesets, tileset);
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&TileLayer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut TileLayer> {
        self.layers.get_mut(index)
    }

    /// Adds a layer, registering any tilesets it uses that the map lacks.
    pub fn add_layer(&mut self, layer: TileLayer) {
        for tileset in layer.used_tilesets() {
            self.add_tileset(&tileset);
        }
        self.layers.push(layer);
    }
}
