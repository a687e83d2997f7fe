//! Snapshot persistence for the tile grid.
//!
//! The whole tile collection is written as one JSON document after every
//! mutation; there is no delta format and no versioning. The store is a
//! trait so the grid and app logic can be exercised against an in-memory
//! backend in tests.

use std::path::PathBuf;

use thiserror::Error;

use super::Tile;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait TileStore {
    /// Read the persisted snapshot. A missing or unreadable snapshot is
    /// "no saved tiles", never an error.
    fn load(&self) -> Vec<Tile>;

    /// Overwrite the snapshot with the full tile collection.
    fn save(&mut self, tiles: &[Tile]) -> Result<(), StoreError>;
}

/// JSON file under the user data dir.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default snapshot location, e.g. ~/.local/share/paddo/tiles.json.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?
            .join("paddo");
        Ok(data_dir.join("tiles.json"))
    }
}

impl TileStore for JsonFileStore {
    fn load(&self) -> Vec<Tile> {
        if !self.path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(tiles) => tiles,
                Err(e) => {
                    tracing::warn!("Failed to parse snapshot, starting empty: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read snapshot, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    fn save(&mut self, tiles: &[Tile]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(tiles)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Test/headless backend; holds the snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tiles: Vec<Tile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TileStore for MemoryStore {
    fn load(&self) -> Vec<Tile> {
        self.tiles.clone()
    }

    fn save(&mut self, tiles: &[Tile]) -> Result<(), StoreError> {
        self.tiles = tiles.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{TileDraft, TileGrid, TileVisual};

    fn sample_tiles() -> Vec<Tile> {
        let mut grid = TileGrid::new();
        grid.add(
            TileDraft {
                url: "https://example.com".to_string(),
                visual: TileVisual::Text { text: "Ex".to_string() },
                background: Some("#336699".to_string()),
            },
            5,
        );
        grid.add(
            TileDraft {
                url: "https://foo.com".to_string(),
                visual: TileVisual::Icon { icon: "/icons/foo.png".to_string() },
                background: None,
            },
            10,
        );
        grid.tiles().to_vec()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("tiles.json"));

        let tiles = sample_tiles();
        store.save(&tiles).unwrap();
        assert_eq!(store.load(), tiles);
    }

    #[test]
    fn save_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested/deeper/tiles.json"));
        store.save(&sample_tiles()).unwrap();
        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.json");
        std::fs::write(&path, "{ not json ]").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert!(store.load().is_empty());
        let tiles = sample_tiles();
        store.save(&tiles).unwrap();
        assert_eq!(store.load(), tiles);
    }
}
