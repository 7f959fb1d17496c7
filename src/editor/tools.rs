use bevy::prelude::*;

use crate::map::{FlipDirection, Map, RotateDirection};
use crate::stamps::{ActiveStampChanged, TileStamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorTool {
    #[default]
    StampBrush,
    BucketFill,
    Eraser,
    TileSelect,
}

impl EditorTool {
    pub fn display_name(&self) -> &'static str {
        match self {
            EditorTool::StampBrush => "Stamp Brush (B)",
            EditorTool::BucketFill => "Bucket Fill (F)",
            EditorTool::Eraser => "Eraser (E)",
            EditorTool::TileSelect => "Rectangular Select (R)",
        }
    }

    pub fn all() -> &'static [EditorTool] {
        &[
            EditorTool::StampBrush,
            EditorTool::BucketFill,
            EditorTool::Eraser,
            EditorTool::TileSelect,
        ]
    }

    /// Tools that paint with a stamp.
    pub fn holds_stamp(&self) -> bool {
        matches!(self, EditorTool::StampBrush | EditorTool::BucketFill)
    }
}

/// Selected paint tool and the stamps held by the stamp-painting tools.
#[derive(Resource, Default)]
pub struct ToolState {
    pub tool: EditorTool,
    pub brush_stamp: TileStamp,
    pub fill_stamp: TileStamp,
    /// Variation shown under the cursor, re-rolled whenever the stamp changes
    pub preview: Option<Map>,
}

impl ToolState {
    /// The stamp held by the active tool, if it holds a non-empty one.
    pub fn current_stamp(&self) -> Option<&TileStamp> {
        let stamp = match self.tool {
            EditorTool::StampBrush => &self.brush_stamp,
            EditorTool::BucketFill => &self.fill_stamp,
            EditorTool::Eraser | EditorTool::TileSelect => return None,
        };
        (!stamp.is_empty()).then_some(stamp)
    }

    /// Makes `stamp` the painting stamp of both stamp tools.
    pub fn set_stamp(&mut self, stamp: TileStamp) {
        self.fill_stamp = stamp.clone();
        self.brush_stamp = stamp;
        if !self.tool.holds_stamp() {
            self.tool = EditorTool::StampBrush;
        }
        self.refresh_preview();
    }

    pub fn refresh_preview(&mut self) {
        self.preview = self.brush_stamp.random_variation();
    }

    /// Replaces the brush stamp with a transformed copy. The fill stamp
    /// follows when it was the same stamp.
    pub fn transform_stamp(&mut self, transform: StampTransform) {
        if self.brush_stamp.is_empty() {
            return;
        }

        let transformed = match transform {
            StampTransform::FlipHorizontally => {
                self.brush_stamp.flipped(FlipDirection::Horizontally)
            }
            StampTransform::FlipVertically => self.brush_stamp.flipped(FlipDirection::Vertically),
            StampTransform::RotateLeft => self.brush_stamp.rotated(RotateDirection::Left),
            StampTransform::RotateRight => self.brush_stamp.rotated(RotateDirection::Right),
        };

        if self.fill_stamp == self.brush_stamp {
            self.fill_stamp = transformed.clone();
        }
        self.brush_stamp = transformed;
        self.refresh_preview();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampTransform {
    FlipHorizontally,
    FlipVertically,
    RotateLeft,
    RotateRight,
}

/// Message to flip or rotate the stamp brush
#[derive(Message)]
pub struct TransformStampRequest {
    pub transform: StampTransform,
}

/// Message to switch the active paint tool
#[derive(Message)]
pub struct SelectToolRequest {
    pub tool: EditorTool,
}

pub fn apply_active_stamp(
    mut events: MessageReader<ActiveStampChanged>,
    mut tools: ResMut<ToolState>,
) {
    for event in events.read() {
        debug!("Active stamp is now '{}'", event.stamp.name());
        tools.set_stamp(event.stamp.clone());
    }
}

pub fn transform_stamp_system(
    mut events: MessageReader<TransformStampRequest>,
    mut tools: ResMut<ToolState>,
) {
    for event in events.read() {
        tools.transform_stamp(event.transform);
    }
}

pub fn select_tool_system(
    mut events: MessageReader<SelectToolRequest>,
    mut tools: ResMut<ToolState>,
) {
    for event in events.read() {
        if tools.tool != event.tool {
            info!("Switched to {}", event.tool.display_name());
            tools.tool = event.tool;
        }
    }
}
