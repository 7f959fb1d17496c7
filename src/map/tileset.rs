use std::path::PathBuf;
use std::sync::Arc;

/// Tilesets are shared between maps; identity is the allocation, not the value.
pub type SharedTileset = Arc<Tileset>;

#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub columns: u32,
    /// Absolute path of the tileset image, if the tileset is image based
    pub image: Option<PathBuf>,
}

impl Tileset {
    pub fn new(
        name: impl Into<String>,
        tile_width: u32,
        tile_height: u32,
        tile_count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            tile_width,
            tile_height,
            tile_count,
            columns: 0,
            image: None,
        }
    }

    pub fn into_shared(self) -> SharedTileset {
        Arc::new(self)
    }
}

/// Pushes `tileset` unless the same instance is already listed.
pub fn push_unique(tilesets: &mut Vec<SharedTileset>, tileset: &SharedTileset) {
    if !tilesets.iter().any(|t| Arc::ptr_eq(t, tileset)) {
        tilesets.push(Arc::clone(tileset));
    }
}
