//! Open map documents and their tile selections.

use bevy::prelude::*;

use crate::map::{Map, Region, TileLayer};

/// A map open in the editor.
#[derive(Debug, Clone)]
pub struct MapDocument {
    pub map: Map,
    pub current_layer: Option<usize>,
    /// Selected tiles, in map coordinates
    pub selected_area: Region,
}

impl MapDocument {
    pub fn new(map: Map) -> Self {
        let current_layer = (!map.layers().is_empty()).then_some(0);
        Self {
            map,
            current_layer,
            selected_area: Region::new(),
        }
    }

    pub fn current_tile_layer(&self) -> Option<&TileLayer> {
        self.current_layer.and_then(|index| self.map.layer(index))
    }
}

#[derive(Resource, Default)]
pub struct DocumentManager {
    documents: Vec<MapDocument>,
    current: Option<usize>,
}

impl DocumentManager {
    /// Opens `document` and makes it the current one.
    pub fn open(&mut self, document: MapDocument) -> usize {
        self.documents.push(document);
        let index = self.documents.len() - 1;
        self.current = Some(index);
        index
    }

    pub fn documents(&self) -> &[MapDocument] {
        &self.documents
    }

    pub fn current_document(&self) -> Option<&MapDocument> {
        self.current.and_then(|index| self.documents.get(index))
    }

    pub fn set_current(&mut self, index: usize) {
        if index < self.documents.len() {
            self.current = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Orientation;

    fn map_with_layer() -> Map {
        let mut map = Map::new(Orientation::Orthogonal, 4, 4, 32, 32);
        map.add_layer(TileLayer::new("ground", 0, 0, 4, 4));
        map
    }

    #[test]
    fn test_new_document_selects_first_layer() {
        let document = MapDocument::new(map_with_layer());
        assert_eq!(document.current_layer, Some(0));
        assert_eq!(document.current_tile_layer().map(|l| l.name.as_str()), Some("ground"));
        assert!(document.selected_area.is_empty());
    }

    #[test]
    fn test_document_without_layers() {
        let document = MapDocument::new(Map::new(Orientation::Orthogonal, 4, 4, 32, 32));
        assert!(document.current_tile_layer().is_none());
    }

    #[test]
    fn test_open_makes_document_current() {
        let mut documents = DocumentManager::default();
        assert!(documents.current_document().is_none());

        documents.open(MapDocument::new(map_with_layer()));
        let second = documents.open(MapDocument::new(map_with_layer()));
        assert_eq!(second, 1);
        assert_eq!(documents.documents().len(), 2);

        documents.set_current(0);
        documents.set_current(5);
        assert!(std::ptr::eq(
            documents.current_document().unwrap(),
            &documents.documents()[0]
        ));
    }
}
