use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfigData {
    /// Directory holding the stamp files (platform default when unset)
    #[serde(default)]
    pub stamps_directory: Option<PathBuf>,
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: get_config_path(),
            dirty: false,
        }
    }
}

impl AppConfig {
    /// The stamps directory in effect.
    pub fn stamps_directory(&self) -> PathBuf {
        self.data
            .stamps_directory
            .clone()
            .unwrap_or_else(crate::paths::default_stamps_dir)
    }
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to change the stamps directory (`None` restores the default)
#[derive(Message)]
pub struct SetStampsDirectoryRequest {
    pub path: Option<PathBuf>,
}

/// Sent when the effective stamps directory changes
#[derive(Message)]
pub struct StampsDirectoryChanged {
    pub path: PathBuf,
}

/// Get the path to the config file (platform-appropriate location)
fn get_config_path() -> PathBuf {
    crate::paths::config_file()
}

/// Read config data, falling back to defaults with the reason when the file
/// cannot be used.
fn read_config_data(config_path: &std::path::Path) -> (AppConfigData, Option<String>) {
    if !config_path.exists() {
        info!("No config file found, using defaults");
        return (AppConfigData::default(), None);
    }

    match std::fs::read_to_string(config_path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(data) => {
                info!("Loaded config from {:?}", config_path);
                (data, None)
            }
            Err(e) => (
                AppConfigData::default(),
                Some(format!("Configuration file was corrupted: {}", e)),
            ),
        },
        Err(e) => (
            AppConfigData::default(),
            Some(format!("Could not read configuration file: {}", e)),
        ),
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(mut config: ResMut<AppConfig>) {
    let (data, reset_reason) = read_config_data(&config.config_path);
    config.data = data;
    config.dirty = false;

    if let Some(reason) = reset_reason {
        warn!("{}; using default settings", reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// System to change the stamps directory
fn set_stamps_directory_system(
    mut events: MessageReader<SetStampsDirectoryRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
    mut changed_events: MessageWriter<StampsDirectoryChanged>,
) {
    for event in events.read() {
        let previous = config.stamps_directory();
        config.data.stamps_directory = event.path.clone();
        config.dirty = true;
        save_events.write(SaveConfigRequest);

        let current = config.stamps_directory();
        if current != previous {
            info!("Set stamps directory to {:?}", current);
            changed_events.write(StampsDirectoryChanged { path: current });
        }
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .add_message::<SaveConfigRequest>()
            .add_message::<SetStampsDirectoryRequest>()
            .add_message::<StampsDirectoryChanged>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    set_stamps_directory_system.run_if(on_message::<SetStampsDirectoryRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_data_default() {
        let data = AppConfigData::default();
        assert!(data.stamps_directory.is_none());
    }

    #[test]
    fn test_app_config_data_serialization() {
        let data = AppConfigData {
            stamps_directory: Some(PathBuf::from("/path/to/stamps")),
        };

        let json = serde_json::to_string(&data).unwrap();
        let parsed: AppConfigData = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.stamps_directory, data.stamps_directory);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: AppConfigData = serde_json::from_str("{}").unwrap();
        assert!(parsed.stamps_directory.is_none());
    }

    #[test]
    fn test_stamps_directory_falls_back_to_default() {
        let mut config = AppConfig::default();
        assert_eq!(config.stamps_directory(), crate::paths::default_stamps_dir());

        config.data.stamps_directory = Some(PathBuf::from("/custom/stamps"));
        assert_eq!(config.stamps_directory(), PathBuf::from("/custom/stamps"));
    }

    #[test]
    fn test_read_config_data() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.json");

        let (data, reason) = read_config_data(&path);
        assert!(data.stamps_directory.is_none());
        assert!(reason.is_none());

        std::fs::write(&path, r#"{"stamps_directory": "/srv/stamps"}"#).unwrap();
        let (data, reason) = read_config_data(&path);
        assert_eq!(data.stamps_directory, Some(PathBuf::from("/srv/stamps")));
        assert!(reason.is_none());

        std::fs::write(&path, "{ not json").unwrap();
        let (data, reason) = read_config_data(&path);
        assert!(data.stamps_directory.is_none());
        assert!(reason.unwrap().contains("corrupted"));
    }

    #[test]
    fn test_corrupted_config_loads_defaults_at_startup() {
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        let mut app = App::new();
        app.insert_resource(AppConfig {
            data: AppConfigData {
                stamps_directory: Some(PathBuf::from("/stale")),
            },
            config_path: config_path.clone(),
            dirty: true,
        })
        .add_plugins(MinimalPlugins)
        .add_plugins(ConfigPlugin);
        app.update();

        let config = app.world().resource::<AppConfig>();
        assert!(config.data.stamps_directory.is_none());
        assert!(!config.dirty);
        assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "{ not json");
    }
}
