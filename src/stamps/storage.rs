//! Stamp files on disk.
//!
//! Each stamp lives in `<stamps dir>/<name>.stamp` as a JSON document. Files
//! are replaced atomically so an interrupted save leaves the previous version
//! intact. Legacy binary JSON files are still read.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde_json::Value;
use thiserror::Error;

use super::binary_json;
use super::tile_stamp::TileStamp;
use crate::constants::STAMP_FILE_EXTENSION;
use crate::map::{MapFormatError, TilesetManager};

#[derive(Debug, Error)]
pub enum StampStoreError {
    #[error("failed to create stamps directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to read stamp file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse stamp file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode stamp: {0}")]
    Encode(#[from] MapFormatError),
    #[error("failed to serialize stamp: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write stamp {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to commit stamp {path:?}: {source}")]
    Commit {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

pub fn stamp_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, STAMP_FILE_EXTENSION))
}

/// Whether `name` maps to a file directly inside the stamps directory.
pub fn is_valid_stamp_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Writes `stamp` to its file, creating the stamps directory if needed.
pub fn save_stamp(dir: &Path, stamp: &TileStamp) -> Result<PathBuf, StampStoreError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| StampStoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let path = stamp_file_path(dir, &stamp.name());
    let json = stamp.to_json(dir)?;
    let data = serde_json::to_vec(&json)?;
    atomic_write(dir, &path, &data)?;

    Ok(path)
}

fn atomic_write(dir: &Path, path: &Path, data: &[u8]) -> Result<(), StampStoreError> {
    let write_error = |source| StampStoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(data).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|source| StampStoreError::Commit {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

pub fn rename_stamp_file(dir: &Path, old_name: &str, new_name: &str) -> io::Result<()> {
    fs::rename(
        stamp_file_path(dir, old_name),
        stamp_file_path(dir, new_name),
    )
}

pub fn delete_stamp_file(dir: &Path, name: &str) -> io::Result<()> {
    fs::remove_file(stamp_file_path(dir, name))
}

/// Stamp files directly inside `dir`, sorted by path.
pub fn stamp_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No stamps read from {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == STAMP_FILE_EXTENSION)
        })
        .collect();
    files.sort();
    files
}

/// Reads a stamp document, accepting binary or text JSON.
pub fn read_stamp_document(path: &Path) -> Result<Value, StampStoreError> {
    let data = fs::read(path).map_err(|source| StampStoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if binary_json::is_binary_json(&data) {
        match binary_json::decode(&data) {
            Ok(document) => return Ok(document),
            Err(e) => debug!("{:?} is not valid binary JSON ({}), trying text", path, e),
        }
    }

    serde_json::from_slice(&data).map_err(|source| StampStoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_stamp_file(
    path: &Path,
    dir: &Path,
    tilesets: &TilesetManager,
) -> Result<TileStamp, StampStoreError> {
    let document = read_stamp_document(path)?;
    Ok(TileStamp::from_json(&document, dir, tilesets))
}

/// Loads every readable, non-empty stamp in `dir`. Files that fail to decode
/// are logged and skipped.
pub fn load_stamps(dir: &Path, tilesets: &TilesetManager) -> Vec<TileStamp> {
    let mut stamps = Vec::new();

    for path in stamp_files(dir) {
        match load_stamp_file(&path, dir, tilesets) {
            Ok(stamp) if stamp.is_empty() => {
                debug!("Skipping empty stamp {:?}", path);
            }
            Ok(stamp) => stamps.push(stamp),
            Err(e) => warn!("Skipping stamp: {}", e),
        }
    }

    stamps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Cell, Map, Orientation, TileLayer, Tileset};
    use serde_json::json;

    fn sample_stamp(name: &str, tilesets: &TilesetManager) -> TileStamp {
        let tileset = Tileset::new("terrain", 16, 16, 8).into_shared();
        let mut layer = TileLayer::new("", 0, 0, 2, 1);
        layer.set_cell(0, 0, Cell::new(&tileset, 5));
        let mut map = Map::new(Orientation::Orthogonal, 2, 1, 16, 16);
        map.add_layer(layer);

        let stamp = TileStamp::from_map(map, tilesets);
        stamp.set_name(name);
        stamp
    }

    #[test]
    fn test_stamp_file_path() {
        let path = stamp_file_path(Path::new("/data/stamps"), "Stamp 1");
        assert_eq!(path, PathBuf::from("/data/stamps/Stamp 1.stamp"));
    }

    #[test]
    fn test_stamp_names_stay_inside_directory() {
        assert!(is_valid_stamp_name("Stamp 1"));
        assert!(is_valid_stamp_name("trees.v2"));
        assert!(!is_valid_stamp_name(""));
        assert!(!is_valid_stamp_name(".."));
        assert!(!is_valid_stamp_name("../outside"));
        assert!(!is_valid_stamp_name("nested/name"));
        assert!(!is_valid_stamp_name("C:\\stamps"));
    }

    #[test]
    fn test_save_creates_directory_and_compact_json() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested/stamps");
        let tilesets = TilesetManager::new();

        let path = save_stamp(&dir, &sample_stamp("Grass", &tilesets)).unwrap();

        assert_eq!(path, dir.join("Grass.stamp"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains('\n'));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["name"], "Grass");
    }

    #[test]
    fn test_save_overwrites_previous_version() {
        let temp = tempfile::tempdir().unwrap();
        let tilesets = TilesetManager::new();
        let stamp = sample_stamp("Grass", &tilesets);

        save_stamp(temp.path(), &stamp).unwrap();
        stamp.set_probability(0, 4.0);
        save_stamp(temp.path(), &stamp).unwrap();

        let files = stamp_files(temp.path());
        assert_eq!(files.len(), 1);
        let loaded = load_stamp_file(&files[0], temp.path(), &tilesets).unwrap();
        assert_eq!(loaded.probability(0), 4.0);
    }

    #[test]
    fn test_save_fails_when_directory_is_a_file() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("stamps");
        fs::write(&blocker, b"not a directory").unwrap();
        let tilesets = TilesetManager::new();

        assert!(save_stamp(&blocker, &sample_stamp("Grass", &tilesets)).is_err());
    }

    #[test]
    fn test_load_skips_corrupt_file() {
        let temp = tempfile::tempdir().unwrap();
        let tilesets = TilesetManager::new();
        save_stamp(temp.path(), &sample_stamp("Good", &tilesets)).unwrap();
        fs::write(temp.path().join("Broken.stamp"), b"{\"name\": \"Broken\", ").unwrap();

        let stamps = load_stamps(temp.path(), &tilesets);
        assert_eq!(stamps.len(), 1);
        assert_eq!(stamps[0].name(), "Good");
    }

    #[test]
    fn test_load_skips_empty_stamps_and_other_files() {
        let temp = tempfile::tempdir().unwrap();
        let tilesets = TilesetManager::new();
        fs::write(
            temp.path().join("Empty.stamp"),
            json!({"name": "Empty", "variations": []}).to_string(),
        )
        .unwrap();
        fs::write(temp.path().join("array.stamp"), b"[1, 2, 3]").unwrap();
        fs::write(temp.path().join("notes.txt"), b"hello").unwrap();
        save_stamp(temp.path(), &sample_stamp("Kept", &tilesets)).unwrap();

        let stamps = load_stamps(temp.path(), &tilesets);
        assert_eq!(stamps.len(), 1);
        assert_eq!(stamps[0].name(), "Kept");
    }

    #[test]
    fn test_load_reads_binary_json() {
        let temp = tempfile::tempdir().unwrap();
        let tilesets = TilesetManager::new();
        let stamp = sample_stamp("Legacy", &tilesets);
        stamp.set_quick_stamp_index(Some(6));
        let json = stamp.to_json(temp.path()).unwrap();
        fs::write(
            temp.path().join("Legacy.stamp"),
            binary_json::tests::encode(&json),
        )
        .unwrap();

        let stamps = load_stamps(temp.path(), &tilesets);
        assert_eq!(stamps.len(), 1);
        assert_eq!(stamps[0].name(), "Legacy");
        assert_eq!(stamps[0].quick_stamp_index(), Some(6));
        let variations = stamps[0].variations();
        let map = variations[0].map();
        assert_eq!(map.layer(0).unwrap().cell_at(0, 0).unwrap().tile_id, 5);
    }

    #[test]
    fn test_load_missing_directory_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let tilesets = TilesetManager::new();
        assert!(load_stamps(&temp.path().join("missing"), &tilesets).is_empty());
    }

    #[test]
    fn test_rename_and_delete_files() {
        let temp = tempfile::tempdir().unwrap();
        let tilesets = TilesetManager::new();
        save_stamp(temp.path(), &sample_stamp("Old", &tilesets)).unwrap();

        rename_stamp_file(temp.path(), "Old", "New").unwrap();
        assert!(!stamp_file_path(temp.path(), "Old").exists());
        assert!(stamp_file_path(temp.path(), "New").exists());

        delete_stamp_file(temp.path(), "New").unwrap();
        assert!(stamp_files(temp.path()).is_empty());
    }
}
