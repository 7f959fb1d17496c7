//! JSON map documents.
//!
//! Maps are written in the Tiled JSON layout: tilesets carry a `firstgid` and
//! tile layers store one global tile id per cell, with the flip flags in the
//! top three bits. Image paths are stored relative to a base directory when
//! possible.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layer::{Cell, TileLayer};
use super::map_data::{Map, Orientation, RenderOrder};
use super::tileset::{push_unique, SharedTileset, Tileset};

const FLIPPED_HORIZONTALLY_FLAG: u32 = 0x8000_0000;
const FLIPPED_VERTICALLY_FLAG: u32 = 0x4000_0000;
const FLIPPED_ANTI_DIAGONALLY_FLAG: u32 = 0x2000_0000;
const FLIP_FLAGS: u32 =
    FLIPPED_HORIZONTALLY_FLAG | FLIPPED_VERTICALLY_FLAG | FLIPPED_ANTI_DIAGONALLY_FLAG;

const TILE_LAYER_TYPE: &str = "tilelayer";

#[derive(Debug, Error)]
pub enum MapFormatError {
    #[error("malformed map document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("layer '{name}' has invalid size {width}x{height}")]
    InvalidLayerSize { name: String, width: i32, height: i32 },
    #[error("layer '{name}' has {actual} tiles, expected {expected}")]
    LayerDataSize {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("tile id {gid} is not covered by any tileset")]
    InvalidTile { gid: u32 },
    #[error("tile {tile_id} is out of range for tileset '{tileset}' with {tile_count} tiles")]
    TileOutOfRange {
        tileset: String,
        tile_id: u32,
        tile_count: u32,
    },
    #[error("tilesets need more global tile ids than fit in a layer cell")]
    TooManyTiles,
}

#[derive(Debug, Serialize, Deserialize)]
struct MapDocument {
    orientation: Orientation,
    #[serde(rename = "renderorder", default)]
    render_order: RenderOrder,
    width: i32,
    height: i32,
    #[serde(rename = "tilewidth")]
    tile_width: u32,
    #[serde(rename = "tileheight")]
    tile_height: u32,
    #[serde(default)]
    tilesets: Vec<TilesetDocument>,
    #[serde(default)]
    layers: Vec<LayerDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TilesetDocument {
    #[serde(rename = "firstgid")]
    first_gid: u32,
    #[serde(default)]
    name: String,
    #[serde(rename = "tilewidth")]
    tile_width: u32,
    #[serde(rename = "tileheight")]
    tile_height: u32,
    #[serde(rename = "tilecount", default)]
    tile_count: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default)]
    width: i32,
    #[serde(default)]
    height: i32,
    #[serde(default)]
    data: Vec<u32>,
}

/// Serializes `map`, writing image paths relative to `base_dir` where possible.
pub fn map_to_json(map: &Map, base_dir: &Path) -> Result<serde_json::Value, MapFormatError> {
    let mut tilesets: Vec<SharedTileset> = map.tilesets().to_vec();
    for layer in map.layers() {
        for tileset in layer.used_tilesets() {
            push_unique(&mut tilesets, &tileset);
        }
    }

    let mut first_gids = Vec::with_capacity(tilesets.len());
    let mut next_gid: u32 = 1;
    for tileset in &tilesets {
        first_gids.push(next_gid);
        next_gid = next_gid
            .checked_add(tileset.tile_count.max(1))
            .filter(|gid| gid & FLIP_FLAGS == 0)
            .ok_or(MapFormatError::TooManyTiles)?;
    }

    let gid_of = |cell: &Cell| -> Result<u32, MapFormatError> {
        let Some(tileset) = &cell.tileset else {
            return Ok(0);
        };
        if cell.tile_id >= tileset.tile_count {
            return Err(MapFormatError::TileOutOfRange {
                tileset: tileset.name.clone(),
                tile_id: cell.tile_id,
                tile_count: tileset.tile_count,
            });
        }
        let index = tilesets
            .iter()
            .position(|t| Arc::ptr_eq(t, tileset))
            .unwrap_or_default();
        // Ranges end below next_gid, which was checked to stay clear of the flags
        let mut gid = first_gids[index] + cell.tile_id;
        if cell.flipped_horizontally {
            gid |= FLIPPED_HORIZONTALLY_FLAG;
        }
        if cell.flipped_vertically {
            gid |= FLIPPED_VERTICALLY_FLAG;
        }
        if cell.flipped_anti_diagonally {
            gid |= FLIPPED_ANTI_DIAGONALLY_FLAG;
        }
        Ok(gid)
    };

    let mut layers = Vec::with_capacity(map.layers().len());
    for layer in map.layers() {
        layers.push(LayerDocument {
            kind: TILE_LAYER_TYPE.to_string(),
            name: layer.name.clone(),
            x: layer.x,
            y: layer.y,
            width: layer.width(),
            height: layer.height(),
            data: layer.cells().iter().map(&gid_of).collect::<Result<_, _>>()?,
        });
    }

    let document = MapDocument {
        orientation: map.orientation,
        render_order: map.render_order,
        width: map.width,
        height: map.height,
        tile_width: map.tile_width,
        tile_height: map.tile_height,
        tilesets: tilesets
            .iter()
            .zip(&first_gids)
            .map(|(tileset, first_gid)| TilesetDocument {
                first_gid: *first_gid,
                name: tileset.name.clone(),
                tile_width: tileset.tile_width,
                tile_height: tileset.tile_height,
                tile_count: tileset.tile_count,
                columns: tileset.columns,
                image: tileset
                    .image
                    .as_deref()
                    .map(|image| relative_path(image, base_dir)),
            })
            .collect(),
        layers,
    };

    Ok(serde_json::to_value(document)?)
}

/// Builds a map from a document produced by [`map_to_json`] (or Tiled).
pub fn map_from_json(value: &serde_json::Value, base_dir: &Path) -> Result<Map, MapFormatError> {
    let document = MapDocument::deserialize(value)?;

    let mut map = Map::new(
        document.orientation,
        document.width,
        document.height,
        document.tile_width,
        document.tile_height,
    );
    map.render_order = document.render_order;

    let mut tilesets: Vec<(u32, SharedTileset)> = Vec::with_capacity(document.tilesets.len());
    for ts in document.tilesets {
        let tileset = Tileset {
            name: ts.name,
            tile_width: ts.tile_width,
            tile_height: ts.tile_height,
            tile_count: ts.tile_count,
            columns: ts.columns,
            image: ts.image.map(|image| resolve_path(&image, base_dir)),
        }
        .into_shared();
        map.add_tileset(&tileset);
        tilesets.push((ts.first_gid, tileset));
    }
    tilesets.sort_by_key(|(first_gid, _)| *first_gid);

    for layer_doc in document.layers {
        if layer_doc.kind != TILE_LAYER_TYPE {
            debug!("Skipping unsupported layer type '{}'", layer_doc.kind);
            continue;
        }
        map.add_layer(decode_layer(layer_doc, &tilesets)?);
    }

    Ok(map)
}

fn decode_layer(
    doc: LayerDocument,
    tilesets: &[(u32, SharedTileset)],
) -> Result<TileLayer, MapFormatError> {
    if doc.width < 0 || doc.height < 0 {
        return Err(MapFormatError::InvalidLayerSize {
            name: doc.name,
            width: doc.width,
            height: doc.height,
        });
    }

    let expected = doc.width as usize * doc.height as usize;
    if doc.data.len() != expected {
        return Err(MapFormatError::LayerDataSize {
            name: doc.name,
            expected,
            actual: doc.data.len(),
        });
    }

    let mut layer = TileLayer::new(doc.name, doc.x, doc.y, doc.width, doc.height);
    for (index, gid) in doc.data.iter().copied().enumerate() {
        if gid == 0 {
            continue;
        }
        let cell = cell_from_gid(gid, tilesets)?;
        let x = (index % doc.width as usize) as i32;
        let y = (index / doc.width as usize) as i32;
        layer.set_cell(x, y, cell);
    }

    Ok(layer)
}

fn cell_from_gid(gid: u32, tilesets: &[(u32, SharedTileset)]) -> Result<Cell, MapFormatError> {
    let id = gid & !FLIP_FLAGS;
    let (first_gid, tileset) = tilesets
        .iter()
        .rev()
        .find(|(first_gid, _)| *first_gid <= id)
        .ok_or(MapFormatError::InvalidTile { gid })?;

    let tile_id = id - first_gid;
    if tile_id >= tileset.tile_count {
        return Err(MapFormatError::InvalidTile { gid });
    }

    Ok(Cell {
        tileset: Some(Arc::clone(tileset)),
        tile_id,
        flipped_horizontally: gid & FLIPPED_HORIZONTALLY_FLAG != 0,
        flipped_vertically: gid & FLIPPED_VERTICALLY_FLAG != 0,
        flipped_anti_diagonally: gid & FLIPPED_ANTI_DIAGONALLY_FLAG != 0,
    })
}

fn relative_path(path: &Path, base_dir: &Path) -> String {
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn resolve_path(path: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(path);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
