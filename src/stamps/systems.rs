use bevy::prelude::*;

use super::context::StampContext;
use super::manager::{StampNotification, TileStampManager};
use super::messages::*;
use crate::config::StampsDirectoryChanged;
use crate::constants::NUM_QUICK_STAMPS;
use crate::editor::{DocumentManager, ToolState};

pub fn stamps_directory_changed_system(
    mut events: MessageReader<StampsDirectoryChanged>,
    mut manager: ResMut<TileStampManager>,
) {
    for event in events.read() {
        manager.set_stamps_directory(event.path.clone());
    }
}

pub fn new_stamp_system(
    mut events: MessageReader<NewStampRequest>,
    mut manager: ResMut<TileStampManager>,
    tools: Res<ToolState>,
    documents: Res<DocumentManager>,
) {
    let context = StampContext::new(&tools, &documents);
    for _ in events.read() {
        manager.create_stamp(&context);
    }
}

pub fn add_variation_system(
    mut events: MessageReader<AddStampVariationRequest>,
    mut manager: ResMut<TileStampManager>,
    tools: Res<ToolState>,
    documents: Res<DocumentManager>,
) {
    let context = StampContext::new(&tools, &documents);
    for event in events.read() {
        manager.add_variation(&event.stamp, &context);
    }
}

pub fn quick_stamp_system(
    mut events: MessageReader<QuickStampRequest>,
    mut manager: ResMut<TileStampManager>,
    tools: Res<ToolState>,
    documents: Res<DocumentManager>,
) {
    let context = StampContext::new(&tools, &documents);
    for event in events.read() {
        if event.index >= NUM_QUICK_STAMPS {
            warn!("Ignoring quick stamp request for slot {}", event.index);
            continue;
        }

        match event.action {
            QuickStampAction::Select => manager.select_quick_stamp(event.index),
            QuickStampAction::Create => manager.create_quick_stamp(event.index, &context),
            QuickStampAction::Extend => manager.extend_quick_stamp(event.index, &context),
        }
    }
}

pub fn rename_stamp_system(
    mut events: MessageReader<RenameStampRequest>,
    mut manager: ResMut<TileStampManager>,
) {
    for event in events.read() {
        let old_name = event.stamp.name();
        if manager.rename_stamp(&event.stamp, &event.name) {
            info!("Renamed stamp '{}' to '{}'", old_name, event.name);
        }
    }
}

pub fn delete_stamp_system(
    mut events: MessageReader<DeleteStampRequest>,
    mut manager: ResMut<TileStampManager>,
) {
    for event in events.read() {
        info!("Deleting stamp '{}'", event.stamp.name());
        manager.remove_stamp(&event.stamp);
    }
}

pub fn delete_variation_system(
    mut events: MessageReader<DeleteStampVariationRequest>,
    mut manager: ResMut<TileStampManager>,
) {
    for event in events.read() {
        if event.index >= event.stamp.variation_count() {
            warn!(
                "Stamp '{}' has no variation {}",
                event.stamp.name(),
                event.index
            );
            continue;
        }
        manager.delete_variation(&event.stamp, event.index);
    }
}

pub fn set_probability_system(
    mut events: MessageReader<SetVariationProbabilityRequest>,
    mut manager: ResMut<TileStampManager>,
) {
    for event in events.read() {
        if event.index >= event.stamp.variation_count() {
            warn!(
                "Stamp '{}' has no variation {}",
                event.stamp.name(),
                event.index
            );
            continue;
        }
        manager.set_probability(&event.stamp, event.index, event.probability);
    }
}

pub fn select_stamp_system(
    mut events: MessageReader<SelectStampRequest>,
    mut manager: ResMut<TileStampManager>,
) {
    for event in events.read() {
        manager.select_stamp(&event.stamp);
    }
}

pub fn select_variation_system(
    mut events: MessageReader<SelectStampVariationRequest>,
    mut manager: ResMut<TileStampManager>,
) {
    for event in events.read() {
        if event.index >= event.stamp.variation_count() {
            warn!(
                "Stamp '{}' has no variation {}",
                event.stamp.name(),
                event.index
            );
            continue;
        }
        manager.select_variation(&event.stamp, event.index);
    }
}

/// Forwards the manager's pending notifications as messages.
pub fn flush_stamp_notifications(
    mut manager: ResMut<TileStampManager>,
    mut added: MessageWriter<StampAdded>,
    mut changed: MessageWriter<StampChanged>,
    mut removed: MessageWriter<StampRemoved>,
    mut active: MessageWriter<ActiveStampChanged>,
) {
    for notification in manager.drain_notifications() {
        match notification {
            StampNotification::Added(stamp) => {
                added.write(StampAdded { stamp });
            }
            StampNotification::Changed(stamp) => {
                changed.write(StampChanged { stamp });
            }
            StampNotification::Removed(stamp) => {
                removed.write(StampRemoved { stamp });
            }
            StampNotification::ActiveStampChanged(stamp) => {
                active.write(ActiveStampChanged { stamp });
            }
        }
    }
}
