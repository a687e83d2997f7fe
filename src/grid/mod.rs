pub mod drag;
pub mod store;

use serde::{Deserialize, Serialize};

/// Fixed grid dimensions: 6 columns, 36 slots total.
pub const GRID_COLUMNS: usize = 6;
pub const GRID_SIZE: usize = 36;

/// How a tile is shown in its slot. Tagged so a tile is either an icon
/// tile or a text tile at construction time, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "display_mode", rename_all = "snake_case")]
pub enum TileVisual {
    Icon { icon: String },
    Text { text: String },
}

impl TileVisual {
    /// Short label used in slot cells and status messages.
    pub fn label(&self) -> &str {
        match self {
            TileVisual::Icon { icon } => icon
                .rsplit('/')
                .next()
                .unwrap_or(icon),
            TileVisual::Text { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: String,
    pub url: String,
    #[serde(flatten)]
    pub visual: TileVisual,
    /// Hex color like "#1e1e2e". None means the theme's tile background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    pub position: usize,
}

/// Fields the editor collects before a tile exists. Id and position are
/// assigned by the grid on add.
#[derive(Debug, Clone)]
pub struct TileDraft {
    pub url: String,
    pub visual: TileVisual,
    pub background: Option<String>,
}

/// Result of a reconciliation, so the caller knows whether to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Source tile took the empty target slot.
    Moved,
    /// Source and target tiles exchanged positions.
    Swapped,
    /// Nothing to do (same slot, or no tile at source).
    NoOp,
}

/// The ordered collection of placed tiles. Position is the sole placement
/// key; the order of the backing vec is irrelevant and not preserved by
/// the snapshot.
#[derive(Debug, Default, Clone)]
pub struct TileGrid {
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from a loaded snapshot, repairing position collisions.
    ///
    /// A snapshot edited or corrupted outside the app can carry duplicate
    /// or out-of-range positions. Later offenders are reassigned to the
    /// first free slot; tiles that don't fit anywhere are dropped.
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        let mut grid = Self::new();
        for mut tile in tiles {
            let taken = tile.position >= GRID_SIZE
                || grid.tile_at(tile.position).is_some();
            if taken {
                let Some(free) = grid.first_free_slot() else {
                    tracing::warn!(id = %tile.id, "grid full, dropping tile from snapshot");
                    continue;
                };
                tracing::warn!(
                    id = %tile.id,
                    from = tile.position,
                    to = free,
                    "repaired tile position from snapshot"
                );
                tile.position = free;
            }
            grid.tiles.push(tile);
        }
        grid
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_at(&self, position: usize) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.position == position)
    }

    pub fn tile_by_id(&self, id: &str) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    fn first_free_slot(&self) -> Option<usize> {
        (0..GRID_SIZE).find(|&p| self.tile_at(p).is_none())
    }

    /// Place a new tile at `position` with a fresh id. Returns None if the
    /// slot is occupied or out of range.
    pub fn add(&mut self, draft: TileDraft, position: usize) -> Option<&Tile> {
        if position >= GRID_SIZE || self.tile_at(position).is_some() {
            return None;
        }
        self.tiles.push(Tile {
            id: ulid::Ulid::new().to_string(),
            url: draft.url,
            visual: draft.visual,
            background: draft.background,
            position,
        });
        self.tiles.last()
    }

    /// Replace the tile with a matching id. Position is taken from the
    /// stored tile, not the argument: edits never relocate.
    pub fn update(&mut self, updated: Tile) -> bool {
        match self.tiles.iter_mut().find(|t| t.id == updated.id) {
            Some(tile) => {
                let position = tile.position;
                *tile = Tile { position, ..updated };
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tiles.len();
        self.tiles.retain(|t| t.id != id);
        self.tiles.len() != before
    }

    /// The reconciler: resolve a drag from `source` onto `target`.
    ///
    /// Both inputs are grid positions. If both slots are occupied the two
    /// tiles swap positions; if only the source is occupied the tile moves
    /// to the empty target. Anything else (same slot, empty source, index
    /// out of range) is a no-op — inputs are best effort, never an error.
    pub fn move_tile(&mut self, source: usize, target: usize) -> MoveOutcome {
        if source == target || target >= GRID_SIZE {
            return MoveOutcome::NoOp;
        }
        let Some(src_idx) = self.tiles.iter().position(|t| t.position == source) else {
            return MoveOutcome::NoOp;
        };
        match self.tiles.iter().position(|t| t.position == target) {
            Some(dst_idx) => {
                self.tiles[src_idx].position = target;
                self.tiles[dst_idx].position = source;
                MoveOutcome::Swapped
            }
            None => {
                self.tiles[src_idx].position = target;
                MoveOutcome::Moved
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(url: &str, label: &str) -> TileDraft {
        TileDraft {
            url: url.to_string(),
            visual: TileVisual::Text { text: label.to_string() },
            background: None,
        }
    }

    fn icon_draft(url: &str, icon: &str) -> TileDraft {
        TileDraft {
            url: url.to_string(),
            visual: TileVisual::Icon { icon: icon.to_string() },
            background: None,
        }
    }

    #[test]
    fn add_assigns_fresh_ids() {
        let mut grid = TileGrid::new();
        let a = grid.add(draft("https://a", "A"), 0).unwrap().id.clone();
        let b = grid.add(draft("https://b", "B"), 1).unwrap().id.clone();
        assert_ne!(a, b);
        assert_eq!(grid.tile_at(0).unwrap().id, a);
        assert_eq!(grid.tile_at(1).unwrap().id, b);
    }

    #[test]
    fn add_refuses_occupied_or_out_of_range() {
        let mut grid = TileGrid::new();
        assert!(grid.add(draft("https://a", "A"), 3).is_some());
        assert!(grid.add(draft("https://b", "B"), 3).is_none());
        assert!(grid.add(draft("https://c", "C"), GRID_SIZE).is_none());
        assert_eq!(grid.tiles().len(), 1);
    }

    #[test]
    fn move_to_empty_slot() {
        let mut grid = TileGrid::new();
        let id = grid.add(draft("https://a", "A"), 4).unwrap().id.clone();
        assert_eq!(grid.move_tile(4, 9), MoveOutcome::Moved);
        assert!(grid.tile_at(4).is_none());
        assert_eq!(grid.tile_at(9).unwrap().id, id);
    }

    #[test]
    fn move_between_occupied_slots_swaps() {
        let mut grid = TileGrid::new();
        let a = grid.add(draft("https://a", "A"), 1).unwrap().id.clone();
        let b = grid.add(draft("https://b", "B"), 2).unwrap().id.clone();
        assert_eq!(grid.move_tile(1, 2), MoveOutcome::Swapped);
        assert_eq!(grid.tile_at(2).unwrap().id, a);
        assert_eq!(grid.tile_at(1).unwrap().id, b);
    }

    #[test]
    fn swap_preserves_tile_id_multiset() {
        let mut grid = TileGrid::new();
        for pos in [0, 7, 14, 21] {
            grid.add(draft("https://x", "X"), pos);
        }
        let mut ids: Vec<String> = grid.tiles().iter().map(|t| t.id.clone()).collect();
        ids.sort();

        for (src, dst) in [(0, 7), (7, 14), (14, 21), (21, 0), (0, 14)] {
            grid.move_tile(src, dst);
        }
        let mut after: Vec<String> = grid.tiles().iter().map(|t| t.id.clone()).collect();
        after.sort();
        assert_eq!(ids, after);
    }

    #[test]
    fn move_noops() {
        let mut grid = TileGrid::new();
        grid.add(draft("https://a", "A"), 5);
        let before = grid.tiles().to_vec();

        // Same slot.
        assert_eq!(grid.move_tile(5, 5), MoveOutcome::NoOp);
        // Empty source.
        assert_eq!(grid.move_tile(6, 7), MoveOutcome::NoOp);
        // Target out of range.
        assert_eq!(grid.move_tile(5, GRID_SIZE), MoveOutcome::NoOp);
        assert_eq!(grid.tiles(), &before[..]);
    }

    #[test]
    fn move_leaves_other_tiles_untouched() {
        let mut grid = TileGrid::new();
        grid.add(draft("https://a", "A"), 0);
        let bystander = grid.add(draft("https://b", "B"), 20).unwrap().clone();
        grid.move_tile(0, 35);
        assert_eq!(grid.tile_at(20), Some(&bystander));
    }

    #[test]
    fn update_preserves_position_and_matches_by_id() {
        let mut grid = TileGrid::new();
        let original = grid.add(icon_draft("https://a", "a.png"), 8).unwrap().clone();

        let mut edited = original.clone();
        edited.url = "https://edited".to_string();
        edited.visual = TileVisual::Text { text: "Ed".to_string() };
        edited.position = 30; // Must be ignored.
        assert!(grid.update(edited));

        let tile = grid.tile_at(8).unwrap();
        assert_eq!(tile.id, original.id);
        assert_eq!(tile.url, "https://edited");
        assert_eq!(tile.position, 8);

        let mut unknown = original;
        unknown.id = "no-such-id".to_string();
        assert!(!grid.update(unknown));
    }

    #[test]
    fn remove_deletes_exactly_the_matching_tile() {
        let mut grid = TileGrid::new();
        let a = grid.add(draft("https://a", "A"), 0).unwrap().id.clone();
        let b = grid.add(draft("https://b", "B"), 1).unwrap().clone();
        assert!(grid.remove(&a));
        assert!(!grid.remove(&a));
        assert_eq!(grid.tiles(), &[b]);
    }

    #[test]
    fn from_tiles_repairs_duplicate_positions() {
        let mk = |id: &str, pos: usize| Tile {
            id: id.to_string(),
            url: "https://x".to_string(),
            visual: TileVisual::Text { text: "X".to_string() },
            background: None,
            position: pos,
        };
        let grid = TileGrid::from_tiles(vec![mk("a", 3), mk("b", 3), mk("c", 99)]);
        assert_eq!(grid.tile_at(3).unwrap().id, "a");
        // "b" and "c" land on the first free slots.
        assert_eq!(grid.tile_at(0).unwrap().id, "b");
        assert_eq!(grid.tile_at(1).unwrap().id, "c");
        assert_eq!(grid.tiles().len(), 3);
    }

    #[test]
    fn visual_serde_is_tagged_by_display_mode() {
        let tile = Tile {
            id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            url: "https://example.com".to_string(),
            visual: TileVisual::Icon { icon: "icons/foo.png".to_string() },
            background: Some("#aabbcc".to_string()),
            position: 12,
        };
        let json = serde_json::to_string(&tile).unwrap();
        assert!(json.contains("\"display_mode\":\"icon\""));
        let back: Tile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tile);

        // Text tiles round-trip through the other arm of the union.
        let json = r#"{"id":"x","url":"https://t","display_mode":"text","text":"Ex","position":5}"#;
        let tile: Tile = serde_json::from_str(json).unwrap();
        assert_eq!(tile.visual, TileVisual::Text { text: "Ex".to_string() });
        assert_eq!(tile.background, None);
    }

    // The worked example: add A and B, swap them, then move A to an
    // empty slot.
    #[test]
    fn add_swap_then_move_scenario() {
        let mut grid = TileGrid::new();
        let a = grid
            .add(draft("https://example.com", "Ex"), 5)
            .unwrap()
            .id
            .clone();
        let b = grid
            .add(icon_draft("https://foo.com", "/icons/foo.png"), 10)
            .unwrap()
            .id
            .clone();

        assert_eq!(grid.move_tile(5, 10), MoveOutcome::Swapped);
        assert_eq!(grid.tile_at(10).unwrap().id, a);
        assert_eq!(grid.tile_at(5).unwrap().id, b);

        assert_eq!(grid.move_tile(10, 3), MoveOutcome::Moved);
        assert_eq!(grid.tile_at(3).unwrap().id, a);
        assert!(grid.tile_at(10).is_none());
    }
}
