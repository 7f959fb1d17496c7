//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Number of quick stamp slots, recalled with the keys 1 to 9
pub const NUM_QUICK_STAMPS: usize = 9;

/// File extension used for stamp files inside the stamps directory
pub const STAMP_FILE_EXTENSION: &str = "stamp";

/// Prefix for generated stamp names ("Stamp 1", "Stamp 2", ...)
pub const STAMP_NAME_PREFIX: &str = "Stamp";

/// Default weight of a newly added variation
pub const DEFAULT_VARIATION_PROBABILITY: f64 = 1.0;

/// Name of the directory below the data directory holding stamp files
pub const STAMPS_DIR_NAME: &str = "stamps";
