//! Tile stamps: reusable, weighted map fragments used by the paint tools.
//!
//! ## Module Structure
//!
//! - [`tile_stamp`] - Shared stamp handle and its variations
//! - [`storage`] - Stamp files in the stamps directory
//! - [`binary_json`] - Reader for stamps saved in the legacy binary format
//! - [`context`] - Harvesting a stamp from the active tool or tile selection
//! - [`manager`] - The stamp library with its quick slots
//! - [`messages`] - Requests into and notifications out of the library

mod binary_json;
mod context;
mod manager;
mod messages;
mod model;
mod storage;
mod systems;
mod tile_stamp;


pub use binary_json::BinaryJsonError;
pub use context::StampContext;
pub use manager::{quick_stamp_key_label, StampNotification, TileStampManager};
pub use messages::{
    ActiveStampChanged, AddStampVariationRequest, DeleteStampRequest, DeleteStampVariationRequest,
    NewStampRequest, QuickStampAction, QuickStampRequest, RenameStampRequest, SelectStampRequest,
    SelectStampVariationRequest, SetVariationProbabilityRequest, StampAdded, StampChanged,
    StampRemoved,
};
pub use model::TileStampModel;
pub use storage::StampStoreError;
pub use tile_stamp::{StampVariation, TileStamp, Variations};

use bevy::prelude::*;

use crate::config::{AppConfig, ConfigLoaded, StampsDirectoryChanged};
use crate::constants::NUM_QUICK_STAMPS;
use crate::map::TilesetManager;

/// Startup system that loads the stamp library from the configured directory
fn setup_stamp_manager(
    mut commands: Commands,
    config: Res<AppConfig>,
    tilesets: Res<TilesetManager>,
) {
    let mut manager = TileStampManager::new(config.stamps_directory(), tilesets.clone());
    manager.load_stamps();

    for stamp in manager.stamps() {
        debug!(
            "Stamp '{}' with {} variation(s)",
            stamp.name(),
            stamp.variation_count()
        );
    }
    for index in 0..NUM_QUICK_STAMPS {
        if let Some(stamp) = manager.quick_stamp(index) {
            info!(
                "Quick stamp {}: '{}'",
                quick_stamp_key_label(index),
                stamp.name()
            );
        }
    }

    commands.insert_resource(manager);
}

pub struct StampsPlugin;

impl Plugin for StampsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TilesetManager>()
            .add_message::<StampsDirectoryChanged>()
            .add_message::<NewStampRequest>()
            .add_message::<AddStampVariationRequest>()
            .add_message::<QuickStampRequest>()
            .add_message::<RenameStampRequest>()
            .add_message::<DeleteStampRequest>()
            .add_message::<DeleteStampVariationRequest>()
            .add_message::<SetVariationProbabilityRequest>()
            .add_message::<SelectStampRequest>()
            .add_message::<SelectStampVariationRequest>()
            .add_message::<StampAdded>()
            .add_message::<StampChanged>()
            .add_message::<StampRemoved>()
            .add_message::<ActiveStampChanged>()
            .add_systems(Startup, setup_stamp_manager.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    systems::stamps_directory_changed_system
                        .run_if(on_message::<StampsDirectoryChanged>),
                    systems::new_stamp_system.run_if(on_message::<NewStampRequest>),
                    systems::add_variation_system.run_if(on_message::<AddStampVariationRequest>),
                    systems::quick_stamp_system.run_if(on_message::<QuickStampRequest>),
                    systems::rename_stamp_system.run_if(on_message::<RenameStampRequest>),
                    systems::delete_stamp_system.run_if(on_message::<DeleteStampRequest>),
                    systems::delete_variation_system
                        .run_if(on_message::<DeleteStampVariationRequest>),
                    systems::set_probability_system
                        .run_if(on_message::<SetVariationProbabilityRequest>),
                    systems::select_stamp_system.run_if(on_message::<SelectStampRequest>),
                    systems::select_variation_system
                        .run_if(on_message::<SelectStampVariationRequest>),
                    systems::flush_stamp_notifications,
                )
                    .chain()
                    .run_if(resource_exists::<TileStampManager>),
            );
    }
}
