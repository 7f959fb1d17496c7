use super::tile_stamp::TileStamp;

/// The stamp list shown to the user, in display order. A stamp appears at
/// most once.
#[derive(Debug, Default)]
pub struct TileStampModel {
    stamps: Vec<TileStamp>,
}

impl TileStampModel {
    pub fn stamps(&self) -> &[TileStamp] {
        &self.stamps
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn contains(&self, stamp: &TileStamp) -> bool {
        self.stamps.contains(stamp)
    }

    /// Appends `stamp`. Returns false if it was already listed.
    pub fn add_stamp(&mut self, stamp: TileStamp) -> bool {
        if self.contains(&stamp) {
            return false;
        }
        self.stamps.push(stamp);
        true
    }

    pub fn remove_stamp(&mut self, stamp: &TileStamp) -> bool {
        let Some(index) = self.stamps.iter().position(|s| s == stamp) else {
            return false;
        };
        self.stamps.remove(index);
        true
    }

    /// Empties the list, handing back the stamps it held.
    pub fn take_stamps(&mut self) -> Vec<TileStamp> {
        std::mem::take(&mut self.stamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_ignores_duplicates() {
        let mut model = TileStampModel::default();
        let stamp = TileStamp::new();

        assert!(model.add_stamp(stamp.clone()));
        assert!(!model.add_stamp(stamp.clone()));
        assert!(model.add_stamp(TileStamp::new()));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut model = TileStampModel::default();
        let stamp = TileStamp::new();
        model.add_stamp(stamp.clone());

        assert!(model.remove_stamp(&stamp));
        assert!(!model.remove_stamp(&stamp));
        assert!(model.is_empty());
    }

    #[test]
    fn test_take_stamps_keeps_order() {
        let mut model = TileStampModel::default();
        let first = TileStamp::new();
        let second = TileStamp::new();
        model.add_stamp(first.clone());
        model.add_stamp(second.clone());

        assert_eq!(model.take_stamps(), vec![first, second]);
        assert!(model.is_empty());
    }
}
