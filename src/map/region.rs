//! Tile selection regions.
//!
//! A region is a union of tile rectangles. Rectangles are half-open: `min` is
//! the first covered tile, `max` is one past the last one.

use bevy::math::{IRect, IVec2};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    rects: Vec<IRect>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Region covering `width` x `height` tiles starting at (`x`, `y`).
    pub fn from_rect(x: i32, y: i32, width: i32, height: i32) -> Self {
        let mut region = Self::new();
        region.add_rect(x, y, width, height);
        region
    }

    /// Adds a rectangle to the region. Degenerate rectangles are ignored.
    pub fn add_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.rects.push(IRect {
            min: IVec2::new(x, y),
            max: IVec2::new(x + width, y + height),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rects
            .iter()
            .any(|r| x >= r.min.x && x < r.max.x && y >= r.min.y && y < r.max.y)
    }

    /// Returns a copy of this region moved by `offset`.
    pub fn translated(&self, offset: IVec2) -> Self {
        Self {
            rects: self
                .rects
                .iter()
                .map(|r| IRect {
                    min: r.min + offset,
                    max: r.max + offset,
                })
                .collect(),
        }
    }

    /// Smallest rectangle containing the whole region, `None` when empty.
    pub fn bounding_rect(&self) -> Option<IRect> {
        let first = *self.rects.first()?;
        Some(self.rects.iter().skip(1).fold(first, |acc, r| IRect {
            min: acc.min.min(r.min),
            max: acc.max.max(r.max),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_region() {
        let region = Region::new();
        assert!(region.is_empty());
        assert!(region.bounding_rect().is_none());
        assert!(!region.contains(0, 0));
    }

    #[test]
    fn test_degenerate_rect_ignored() {
        let region = Region::from_rect(2, 2, 0, 5);
        assert!(region.is_empty());
    }

    #[test]
    fn test_contains_is_half_open() {
        let region = Region::from_rect(1, 1, 2, 2);
        assert!(region.contains(1, 1));
        assert!(region.contains(2, 2));
        assert!(!region.contains(3, 2));
        assert!(!region.contains(0, 1));
    }

    #[test]
    fn test_bounding_rect_of_union() {
        let mut region = Region::from_rect(0, 0, 2, 2);
        region.add_rect(4, 3, 1, 1);
        let bounds = region.bounding_rect().unwrap();
        assert_eq!(bounds.min, IVec2::new(0, 0));
        assert_eq!(bounds.max, IVec2::new(5, 4));
    }

    #[test]
    fn test_translated() {
        let region = Region::from_rect(3, 4, 1, 1).translated(IVec2::new(-3, -4));
        assert!(region.contains(0, 0));
        assert!(!region.contains(3, 4));
    }
}
