//! Message types for the stamp library.

use bevy::prelude::*;

use super::tile_stamp::TileStamp;

/// Message to turn the current brush or tile selection into a new stamp
#[derive(Message)]
pub struct NewStampRequest;

/// Message to append the current brush or tile selection to a stamp
#[derive(Message)]
pub struct AddStampVariationRequest {
    pub stamp: TileStamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickStampAction {
    /// Paint with the stamp in the slot
    Select,
    /// Replace the slot with the current brush or selection
    Create,
    /// Add the current brush or selection to the slot's stamp
    Extend,
}

/// Message for a quick slot shortcut (keys 1 to 9)
#[derive(Message)]
pub struct QuickStampRequest {
    pub index: usize,
    pub action: QuickStampAction,
}

#[derive(Message)]
pub struct RenameStampRequest {
    pub stamp: TileStamp,
    pub name: String,
}

#[derive(Message)]
pub struct DeleteStampRequest {
    pub stamp: TileStamp,
}

#[derive(Message)]
pub struct DeleteStampVariationRequest {
    pub stamp: TileStamp,
    pub index: usize,
}

#[derive(Message)]
pub struct SetVariationProbabilityRequest {
    pub stamp: TileStamp,
    pub index: usize,
    pub probability: f64,
}

#[derive(Message)]
pub struct SelectStampRequest {
    pub stamp: TileStamp,
}

#[derive(Message)]
pub struct SelectStampVariationRequest {
    pub stamp: TileStamp,
    pub index: usize,
}

#[derive(Message, Debug, Clone)]
pub struct StampAdded {
    pub stamp: TileStamp,
}

#[derive(Message, Debug, Clone)]
pub struct StampChanged {
    pub stamp: TileStamp,
}

#[derive(Message, Debug, Clone)]
pub struct StampRemoved {
    pub stamp: TileStamp,
}

/// The stamp the paint tools should use from now on
#[derive(Message, Debug, Clone)]
pub struct ActiveStampChanged {
    pub stamp: TileStamp,
}
