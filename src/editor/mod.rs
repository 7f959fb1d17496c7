pub mod document;
pub mod tools;

pub use document::{DocumentManager, MapDocument};
pub use tools::{
    EditorTool, SelectToolRequest, StampTransform, ToolState, TransformStampRequest,
};

use bevy::prelude::*;

use crate::stamps::ActiveStampChanged;

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ToolState>()
            .init_resource::<DocumentManager>()
            .add_message::<TransformStampRequest>()
            .add_message::<SelectToolRequest>()
            .add_message::<ActiveStampChanged>()
            .add_systems(
                Update,
                (
                    tools::select_tool_system.run_if(on_message::<SelectToolRequest>),
                    tools::apply_active_stamp.run_if(on_message::<ActiveStampChanged>),
                    tools::transform_stamp_system.run_if(on_message::<TransformStampRequest>),
                )
                    .chain(),
            );
    }
}
