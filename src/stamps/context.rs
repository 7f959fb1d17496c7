//! Deriving a stamp from what the user is working with.

use crate::editor::{DocumentManager, ToolState};
use crate::map::{Map, TilesetManager};

use super::tile_stamp::TileStamp;

/// Read-only view of the editor state a new stamp is harvested from.
#[derive(Clone, Copy)]
pub struct StampContext<'a> {
    pub tools: &'a ToolState,
    pub documents: &'a DocumentManager,
}

impl<'a> StampContext<'a> {
    pub fn new(tools: &'a ToolState, documents: &'a DocumentManager) -> Self {
        Self { tools, documents }
    }

    /// The stamp held by the active paint tool, or else a one-variation stamp
    /// copied from the tile selection. Empty when neither is available.
    pub fn stamp(&self, tilesets: &TilesetManager) -> TileStamp {
        if let Some(stamp) = self.tools.current_stamp() {
            return stamp.clone();
        }
        self.stamp_from_selection(tilesets).unwrap_or_default()
    }

    fn stamp_from_selection(&self, tilesets: &TilesetManager) -> Option<TileStamp> {
        let document = self.documents.current_document()?;
        let layer = document.current_tile_layer()?;
        if document.selected_area.is_empty() {
            return None;
        }

        let local_area = document.selected_area.translated(-layer.position());
        let copy = layer.copy(&local_area);
        if copy.has_zero_size() || copy.is_empty() {
            return None;
        }

        let source = &document.map;
        let mut map = Map::new(
            source.orientation,
            copy.width(),
            copy.height(),
            source.tile_width,
            source.tile_height,
        );
        map.render_order = source.render_order;
        map.add_layer(copy);

        Some(TileStamp::from_map(map, tilesets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{EditorTool, MapDocument};
    use crate::map::{Cell, Orientation, Region, RenderOrder, SharedTileset, TileLayer, Tileset};

    fn document_with_tiles(terrain: &SharedTileset, unused: &SharedTileset) -> MapDocument {
        let mut layer = TileLayer::new("ground", 2, 1, 4, 4);
        layer.set_cell(0, 0, Cell::new(terrain, 1));
        layer.set_cell(1, 0, Cell::new(terrain, 2));
        layer.set_cell(3, 3, Cell::new(unused, 9));

        let mut map = Map::new(Orientation::Isometric, 10, 10, 64, 32);
        map.render_order = RenderOrder::LeftUp;
        map.add_layer(layer);
        MapDocument::new(map)
    }

    fn tilesets() -> (SharedTileset, SharedTileset) {
        (
            Tileset::new("terrain", 64, 32, 16).into_shared(),
            Tileset::new("props", 64, 32, 16).into_shared(),
        )
    }

    #[test]
    fn test_nothing_to_harvest() {
        let tools = ToolState::default();
        let documents = DocumentManager::default();
        let context = StampContext::new(&tools, &documents);

        assert!(context.stamp(&TilesetManager::new()).is_empty());
    }

    #[test]
    fn test_tool_stamp_is_used_verbatim() {
        let (terrain, unused) = tilesets();
        let manager = TilesetManager::new();
        let held = TileStamp::from_map(
            document_with_tiles(&terrain, &unused).map,
            &manager,
        );

        let mut tools = ToolState::default();
        tools.set_stamp(held.clone());
        let documents = DocumentManager::default();

        let stamp = StampContext::new(&tools, &documents).stamp(&manager);
        assert_eq!(stamp, held);
    }

    #[test]
    fn test_selection_is_cropped_into_new_map() {
        let (terrain, unused) = tilesets();
        let manager = TilesetManager::new();
        let mut documents = DocumentManager::default();
        let mut document = document_with_tiles(&terrain, &unused);
        document.selected_area = Region::from_rect(2, 1, 2, 1);
        documents.open(document);

        let tools = ToolState {
            tool: EditorTool::TileSelect,
            ..Default::default()
        };
        let stamp = StampContext::new(&tools, &documents).stamp(&manager);

        assert_eq!(stamp.variation_count(), 1);
        let variations = stamp.variations();
        let map = variations[0].map();
        assert_eq!((map.width, map.height), (2, 1));
        assert_eq!(map.orientation, Orientation::Isometric);
        assert_eq!(map.render_order, RenderOrder::LeftUp);
        assert_eq!((map.tile_width, map.tile_height), (64, 32));
        assert_eq!(map.tilesets().len(), 1);
        assert!(std::sync::Arc::ptr_eq(&map.tilesets()[0], &terrain));
        assert_eq!(map.layers().len(), 1);
        assert_eq!(map.layer(0).unwrap().cell_at(1, 0).unwrap().tile_id, 2);
        assert_eq!(manager.reference_count(&terrain), 1);
        assert_eq!(manager.reference_count(&unused), 0);
    }

    #[test]
    fn test_empty_selection_crop_is_skipped() {
        let (terrain, unused) = tilesets();
        let mut documents = DocumentManager::default();
        let mut document = document_with_tiles(&terrain, &unused);
        document.selected_area = Region::from_rect(3, 3, 2, 2);
        documents.open(document);

        let tools = ToolState::default();
        let stamp = StampContext::new(&tools, &documents).stamp(&TilesetManager::new());
        assert!(stamp.is_empty());
    }

    #[test]
    fn test_empty_tool_stamp_falls_back_to_selection() {
        let (terrain, unused) = tilesets();
        let mut documents = DocumentManager::default();
        let mut document = document_with_tiles(&terrain, &unused);
        document.selected_area = Region::from_rect(2, 1, 1, 1);
        documents.open(document);

        let tools = ToolState::default();
        let stamp = StampContext::new(&tools, &documents).stamp(&TilesetManager::new());
        assert_eq!(stamp.variation_count(), 1);
    }
}
