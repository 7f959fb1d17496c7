use std::sync::Arc;

use bevy::math::IVec2;

use super::region::Region;
use super::tileset::{push_unique, SharedTileset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Horizontally,
    Vertically,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// A single tile reference with its flip flags.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub tileset: Option<SharedTileset>,
    pub tile_id: u32,
    pub flipped_horizontally: bool,
    pub flipped_vertically: bool,
    pub flipped_anti_diagonally: bool,
}

impl Cell {
    pub fn new(tileset: &SharedTileset, tile_id: u32) -> Self {
        Self {
            tileset: Some(Arc::clone(tileset)),
            tile_id,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tileset.is_none()
    }

    fn flip_mask(&self) -> usize {
        (usize::from(self.flipped_horizontally) << 2)
            | (usize::from(self.flipped_vertically) << 1)
            | usize::from(self.flipped_anti_diagonally)
    }

    fn set_flip_mask(&mut self, mask: u8) {
        self.flipped_horizontally = mask & 4 != 0;
        self.flipped_vertically = mask & 2 != 0;
        self.flipped_anti_diagonally = mask & 1 != 0;
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        let same_tileset = match (&self.tileset, &other.tileset) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_tileset
            && (self.is_empty() || self.tile_id == other.tile_id)
            && self.flipped_horizontally == other.flipped_horizontally
            && self.flipped_vertically == other.flipped_vertically
            && self.flipped_anti_diagonally == other.flipped_anti_diagonally
    }
}

// Flip flag permutations for a quarter turn, indexed by (h << 2 | v << 1 | d).
const ROTATE_RIGHT_MASK: [u8; 8] = [5, 4, 1, 0, 7, 6, 3, 2];
const ROTATE_LEFT_MASK: [u8; 8] = [3, 2, 7, 6, 1, 0, 5, 4];

/// Row-major grid of cells positioned on its map.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    pub x: i32,
    pub y: i32,
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl TileLayer {
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
            cells: vec![Cell::default(); (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn position(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn cell_at(&self, x: i32, y: i32) -> Option<&Cell> {
        self.contains(x, y)
            .then(|| &self.cells[(x + y * self.width) as usize])
    }

    /// Sets the cell at (`x`, `y`). Coordinates outside the layer are ignored.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        if self.contains(x, y) {
            self.cells[(x + y * self.width) as usize] = cell;
        }
    }

    /// True when the layer covers no area.
    pub fn has_zero_size(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when no cell references a tile.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    /// Tilesets referenced by this layer, in order of first use.
    pub fn used_tilesets(&self) -> Vec<SharedTileset> {
        let mut tilesets = Vec::new();
        for tileset in self.cells.iter().filter_map(|c| c.tileset.as_ref()) {
            push_unique(&mut tilesets, tileset);
        }
        tilesets
    }

    pub fn flip(&mut self, direction: FlipDirection) {
        let mut flipped = Vec::with_capacity(self.cells.len());
        for y in 0..self.height {
            for x in 0..self.width {
                let source = match direction {
                    FlipDirection::Horizontally => self.index(self.width - 1 - x, y),
                    FlipDirection::Vertically => self.index(x, self.height - 1 - y),
                };
                let mut cell = self.cells[source].clone();
                match direction {
                    FlipDirection::Horizontally => {
                        cell.flipped_horizontally = !cell.flipped_horizontally
                    }
                    FlipDirection::Vertically => cell.flipped_vertically = !cell.flipped_vertically,
                }
                flipped.push(cell);
            }
        }
        self.cells = flipped;
    }

    /// Rotates the layer a quarter turn, swapping its width and height.
    pub fn rotate(&mut self, direction: RotateDirection) {
        let new_width = self.height;
        let new_height = self.width;
        let mut rotated = vec![Cell::default(); self.cells.len()];

        for y in 0..self.height {
            for x in 0..self.width {
                let mut cell = self.cells[self.index(x, y)].clone();
                let mask = cell.flip_mask();
                let (new_x, new_y, mask) = match direction {
                    RotateDirection::Right => (self.height - 1 - y, x, ROTATE_RIGHT_MASK[mask]),
                    RotateDirection::Left => (y, self.width - 1 - x, ROTATE_LEFT_MASK[mask]),
                };
                cell.set_flip_mask(mask);
                rotated[(new_x + new_y * new_width) as usize] = cell;
            }
        }

        self.width = new_width;
        self.height = new_height;
        self.cells = rotated;
    }

    /// Copies the cells inside `region` (layer-local coordinates) into a new,
    /// unnamed layer sized to the region's bounding rectangle.
    pub fn copy(&self, region: &Region) -> TileLayer {
        let Some(bounds) = region.bounding_rect() else {
            return TileLayer::new("", 0, 0, 0, 0);
        };

        let mut copied = TileLayer::new(
            "",
            0,
            0,
            bounds.max.x - bounds.min.x,
            bounds.max.y - bounds.min.y,
        );

        for y in bounds.min.y..bounds.max.y {
            for x in bounds.min.x..bounds.max.x {
                if !region.contains(x, y) {
                    continue;
                }
                if let Some(cell) = self.cell_at(x, y) {
                    copied.set_cell(x - bounds.min.x, y - bounds.min.y, cell.clone());
                }
            }
        }

        copied
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (x + y * self.width) as usize
    }
}
