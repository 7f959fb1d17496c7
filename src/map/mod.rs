mod format;
mod layer;
mod map_data;
mod region;
mod tileset;
mod tileset_manager;

pub use format::{map_from_json, map_to_json, MapFormatError};
pub use layer::{Cell, FlipDirection, RotateDirection, TileLayer};
pub use map_data::{Map, Orientation, RenderOrder};
pub use region::Region;
pub use tileset::{SharedTileset, Tileset};
pub use tileset_manager::{TilesetManager, TilesetReferences};
