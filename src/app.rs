use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::grid::drag::{DragEvent, DragState, SlotDrop};
use crate::grid::store::TileStore;
use crate::grid::{MoveOutcome, Tile, TileDraft, TileGrid, TileVisual, GRID_COLUMNS, GRID_SIZE};
use crate::ui;

/// How long status messages stay in the info line.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Fallback URL openers, tried in order when open_command is unset.
const OPENERS: &[&str] = &["xdg-open", "open", "wslview"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Editor,
    Confirm,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    /// New tile for a previously empty slot.
    Add { position: usize },
    /// Existing tile; id and position survive the edit.
    Edit { id: String },
}

/// Editor field navigation order. The icon and text fields are mutually
/// exclusive; Tab skips whichever the display mode hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Url,
    DisplayMode,
    Icon,
    Text,
    Background,
}

#[derive(Debug, Clone)]
pub struct EditorForm {
    pub mode: EditorMode,
    pub field: EditorField,
    pub url: String,
    pub show_icon: bool,
    pub icon: String,
    pub text: String,
    pub background: String,
    /// Index into the current suggestion list, if the user navigated it.
    pub suggestion: Option<usize>,
}

impl EditorForm {
    fn add(position: usize) -> Self {
        Self {
            mode: EditorMode::Add { position },
            field: EditorField::Url,
            url: String::new(),
            show_icon: true,
            icon: String::new(),
            text: String::new(),
            background: String::new(),
            suggestion: None,
        }
    }

    fn edit(tile: &Tile) -> Self {
        let (show_icon, icon, text) = match &tile.visual {
            TileVisual::Icon { icon } => (true, icon.clone(), String::new()),
            TileVisual::Text { text } => (false, String::new(), text.clone()),
        };
        Self {
            mode: EditorMode::Edit { id: tile.id.clone() },
            field: EditorField::Url,
            url: tile.url.clone(),
            show_icon,
            icon,
            text,
            background: tile.background.clone().unwrap_or_default(),
            suggestion: None,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            EditorField::Url => EditorField::DisplayMode,
            EditorField::DisplayMode if self.show_icon => EditorField::Icon,
            EditorField::DisplayMode => EditorField::Text,
            EditorField::Icon | EditorField::Text => EditorField::Background,
            EditorField::Background => EditorField::Url,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            EditorField::Url => EditorField::Background,
            EditorField::DisplayMode => EditorField::Url,
            EditorField::Icon | EditorField::Text => EditorField::DisplayMode,
            EditorField::Background if self.show_icon => EditorField::Icon,
            EditorField::Background => EditorField::Text,
        };
    }

    fn active_buffer(&mut self) -> &mut String {
        match self.field {
            EditorField::Url => &mut self.url,
            EditorField::Icon => &mut self.icon,
            EditorField::Text => &mut self.text,
            EditorField::Background => &mut self.background,
            // DisplayMode is a toggle, not a buffer; chars go nowhere.
            EditorField::DisplayMode => &mut self.text,
        }
    }

    /// Icon filenames matching what has been typed so far.
    pub fn suggestions<'a>(&self, icons: &'a [String]) -> Vec<&'a String> {
        let needle = self
            .icon
            .rsplit('/')
            .next()
            .unwrap_or(&self.icon)
            .to_lowercase();
        icons
            .iter()
            .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
            .collect()
    }

    fn visual(&self) -> TileVisual {
        if self.show_icon {
            TileVisual::Icon { icon: self.icon.clone() }
        } else {
            TileVisual::Text { text: self.text.clone() }
        }
    }

    fn draft(&self) -> TileDraft {
        TileDraft {
            url: self.url.clone(),
            visual: self.visual(),
            background: if self.background.trim().is_empty() {
                None
            } else {
                Some(self.background.trim().to_string())
            },
        }
    }
}

pub struct App {
    pub grid: TileGrid,
    store: Box<dyn TileStore>,
    pub config: AppConfig,

    /// Keyboard cursor, a slot index in [0, GRID_SIZE).
    pub cursor: usize,

    pub drag: DragState,
    /// Slot under the pointer while a mouse drag is in flight.
    pub drag_hover: Option<usize>,

    pub popup: Popup,
    pub editor: Option<EditorForm>,
    /// Tile id awaiting delete confirmation.
    pub pending_delete: Option<String>,

    pub available_icons: Vec<String>,

    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(store: Box<dyn TileStore>, config: AppConfig) -> Self {
        let grid = TileGrid::from_tiles(store.load());
        let available_icons = crate::icons::list_icons(&config.icons_dir());

        Self {
            grid,
            store,
            config,
            cursor: 0,
            drag: DragState::default(),
            drag_hover: None,
            popup: Popup::None,
            editor: None,
            pending_delete: None,
            available_icons,
            status_message: None,
            status_message_time: None,
        }
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Clear expired status messages. Called every loop iteration.
    pub fn tick(&mut self) {
        if let Some(at) = self.status_message_time {
            if at.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Write the full snapshot. Every mutation goes through here.
    fn persist(&mut self) {
        if let Err(e) = self.store.save(self.grid.tiles()) {
            tracing::warn!("Failed to persist tiles: {}", e);
            self.set_status(format!("Save failed: {}", e));
        }
    }

    /// Re-scan the icon directory.
    pub async fn refresh_icons(&mut self) {
        let dir = self.config.icons_dir();
        self.available_icons = tokio::task::spawn_blocking(move || crate::icons::list_icons(&dir))
            .await
            .unwrap_or_default();
        self.set_status(format!("{} icons available", self.available_icons.len()));
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            return self.handle_popup_key(key).await;
        }
        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        // Escape cancels an in-flight drag
        if key.code == KeyCode::Esc && self.drag.is_dragging() {
            self.drag.handle(DragEvent::Cancel);
            self.drag_hover = None;
            self.set_status("Move cancelled");
            return Ok(());
        }

        match key.code {
            // Grid navigation, wrapping at the edges
            KeyCode::Char('h') | KeyCode::Left => {
                self.cursor = (self.cursor + GRID_SIZE - 1) % GRID_SIZE;
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.cursor = (self.cursor + 1) % GRID_SIZE;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = (self.cursor + GRID_SIZE - GRID_COLUMNS) % GRID_SIZE;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.cursor = (self.cursor + GRID_COLUMNS) % GRID_SIZE;
            }

            // Space picks a tile up, Space again drops it
            KeyCode::Char(' ') => self.pick_or_place(),

            // Enter opens the tile's URL, or the add form on an empty slot
            KeyCode::Enter => {
                if self.grid.tile_at(self.cursor).is_some() {
                    self.open_tile(self.cursor).await;
                } else {
                    self.start_add(self.cursor);
                }
            }
            KeyCode::Char('o') => {
                if self.grid.tile_at(self.cursor).is_some() {
                    self.open_tile(self.cursor).await;
                }
            }

            KeyCode::Char('a') => {
                if self.grid.tile_at(self.cursor).is_none() {
                    self.start_add(self.cursor);
                } else {
                    self.set_status("Slot is occupied");
                }
            }
            KeyCode::Char('e') => self.start_edit(self.cursor),
            KeyCode::Char('d') | KeyCode::Delete => self.request_delete(self.cursor),

            KeyCode::Char('R') => self.refresh_icons().await,
            KeyCode::Char('?') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Editor => self.handle_editor_key(key),
            Popup::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::Confirm => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        self.confirm_delete();
                        self.popup = Popup::None;
                    }
                    KeyCode::Char('n') | KeyCode::Esc => {
                        self.pending_delete = None;
                        self.popup = Popup::None;
                    }
                    _ => {}
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    // --- drag / drop ---

    /// Keyboard pick/place on the cursor slot, through the same state
    /// machine as mouse drags.
    fn pick_or_place(&mut self) {
        if self.drag.is_dragging() {
            if let Some(drop) = self.drag.handle(DragEvent::PointerUp(self.cursor)) {
                self.apply_drop(drop);
            }
        } else if self.grid.tile_at(self.cursor).is_some() {
            self.drag.handle(DragEvent::PointerDown(self.cursor));
            self.set_status("Space drops the tile, Esc cancels");
        }
    }

    fn apply_drop(&mut self, drop: SlotDrop) {
        self.drag_hover = None;
        match self.grid.move_tile(drop.source, drop.target) {
            MoveOutcome::Moved => {
                self.persist();
                self.set_status(format!("Moved to slot {}", drop.target));
            }
            MoveOutcome::Swapped => {
                self.persist();
                self.set_status(format!("Swapped slots {} and {}", drop.source, drop.target));
            }
            MoveOutcome::NoOp => {}
        }
    }

    pub async fn handle_mouse(&mut self, mouse: MouseEvent, frame: Rect) -> Result<()> {
        // Popups own the screen; the grid underneath ignores the mouse.
        if self.popup != Popup::None {
            return Ok(());
        }

        let slot = ui::slot_at(ui::grid_area(frame), mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(slot) = slot {
                    self.cursor = slot;
                    self.drag.handle(DragEvent::PointerDown(slot));
                    self.drag_hover = Some(slot);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.drag.is_dragging() {
                    self.drag_hover = slot;
                }
            }
            MouseEventKind::Up(MouseButton::Left) => match slot {
                Some(slot) => {
                    if let Some(drop) = self.drag.handle(DragEvent::PointerUp(slot)) {
                        if drop.source == drop.target {
                            // A press and release on one slot is a click.
                            self.drag_hover = None;
                            if self.grid.tile_at(slot).is_some() {
                                self.open_tile(slot).await;
                            } else {
                                self.start_add(slot);
                            }
                        } else {
                            self.apply_drop(drop);
                        }
                    }
                }
                None => {
                    self.drag.handle(DragEvent::Cancel);
                    self.drag_hover = None;
                }
            },
            _ => {}
        }
        Ok(())
    }

    // --- tile actions ---

    /// Open the URL of the tile at `position` with the configured opener,
    /// falling back through common ones.
    async fn open_tile(&mut self, position: usize) {
        let Some(tile) = self.grid.tile_at(position) else {
            return;
        };
        let url = tile.url.clone();
        let label = tile.visual.label().to_string();

        let openers: Vec<String> = match &self.config.open_command {
            Some(cmd) => vec![cmd.clone()],
            None => OPENERS.iter().map(|s| s.to_string()).collect(),
        };

        for opener in &openers {
            match tokio::process::Command::new(opener)
                .arg(&url)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
            {
                Ok(_) => {
                    self.set_status(format!("Opened {}", label));
                    return;
                }
                Err(e) => {
                    tracing::debug!("Opener {} failed: {}", opener, e);
                }
            }
        }
        self.set_status(format!("No opener found (tried {})", openers.join(", ")));
    }

    fn start_add(&mut self, position: usize) {
        if self.grid.tile_at(position).is_some() {
            return;
        }
        self.editor = Some(EditorForm::add(position));
        self.popup = Popup::Editor;
    }

    fn start_edit(&mut self, position: usize) {
        if let Some(tile) = self.grid.tile_at(position) {
            self.editor = Some(EditorForm::edit(tile));
            self.popup = Popup::Editor;
        }
    }

    fn request_delete(&mut self, position: usize) {
        let Some(tile) = self.grid.tile_at(position) else {
            return;
        };
        let id = tile.id.clone();
        let label = tile.visual.label().to_string();
        if self.config.confirm_delete {
            self.pending_delete = Some(id);
            self.set_status(format!("Delete \"{}\"?", label));
            self.popup = Popup::Confirm;
        } else {
            self.grid.remove(&id);
            self.persist();
            self.set_status(format!("Deleted \"{}\"", label));
        }
    }

    fn confirm_delete(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            if self.grid.remove(&id) {
                self.persist();
                self.set_status("Tile deleted");
            }
        }
    }

    // --- editor ---

    fn handle_editor_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(mut form) = self.editor.take() else {
            self.popup = Popup::None;
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                self.popup = Popup::None;
                return Ok(());
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::F(2) => return self.submit_editor(form),
            KeyCode::Enter => {
                // Enter advances; on the last field it submits.
                if form.field == EditorField::Background {
                    return self.submit_editor(form);
                }
                form.next_field();
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if form.field == EditorField::DisplayMode =>
            {
                form.show_icon = !form.show_icon;
            }
            KeyCode::Down if form.field == EditorField::Icon => {
                self.cycle_suggestion(&mut form, 1);
            }
            KeyCode::Up if form.field == EditorField::Icon => {
                self.cycle_suggestion(&mut form, -1);
            }
            KeyCode::Backspace => {
                form.active_buffer().pop();
                form.suggestion = None;
            }
            KeyCode::Char(c) if form.field != EditorField::DisplayMode => {
                form.active_buffer().push(c);
                form.suggestion = None;
            }
            _ => {}
        }

        self.editor = Some(form);
        Ok(())
    }

    /// Step through the autocomplete list, writing the chosen icon path
    /// into the buffer.
    fn cycle_suggestion(&mut self, form: &mut EditorForm, step: isize) {
        let count = form.suggestions(&self.available_icons).len();
        if count == 0 {
            return;
        }
        let next = match form.suggestion {
            Some(i) => (i as isize + step).rem_euclid(count as isize) as usize,
            None if step > 0 => 0,
            None => count - 1,
        };
        let name = form.suggestions(&self.available_icons)[next].clone();
        form.icon = self
            .config
            .icons_dir()
            .join(&name)
            .to_string_lossy()
            .to_string();
        form.suggestion = Some(next);
    }

    fn submit_editor(&mut self, form: EditorForm) -> Result<()> {
        if form.url.trim().is_empty() {
            // Blocked client-side; keep the form open.
            self.set_status("URL is required");
            self.editor = Some(form);
            return Ok(());
        }

        match &form.mode {
            EditorMode::Add { position } => {
                if self.grid.add(form.draft(), *position).is_some() {
                    self.persist();
                    self.set_status(format!("Added tile at slot {}", position));
                } else {
                    self.set_status("Slot is no longer free");
                }
            }
            EditorMode::Edit { id } => {
                let Some(existing) = self.grid.tile_by_id(id) else {
                    self.set_status("Tile no longer exists");
                    self.popup = Popup::None;
                    return Ok(());
                };
                let draft = form.draft();
                let updated = Tile {
                    id: id.clone(),
                    url: draft.url,
                    visual: draft.visual,
                    background: draft.background,
                    position: existing.position,
                };
                if self.grid.update(updated) {
                    self.persist();
                    self.set_status("Tile updated");
                }
            }
        }
        self.popup = Popup::None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::store::MemoryStore;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, crossterm::event::KeyModifiers::NONE)
    }

    fn test_app() -> App {
        let config = AppConfig {
            icons_dir: Some(std::path::PathBuf::from("/nonexistent")),
            open_command: None,
            confirm_delete: true,
        };
        App::new(Box::new(MemoryStore::new()), config)
    }

    async fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn enter_on_empty_slot_opens_add_form() {
        let mut app = test_app();
        app.cursor = 5;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.popup, Popup::Editor);
        let form = app.editor.as_ref().unwrap();
        assert_eq!(form.mode, EditorMode::Add { position: 5 });
    }

    #[tokio::test]
    async fn add_form_submit_requires_url() {
        let mut app = test_app();
        app.cursor = 5;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        // Straight to submit with everything blank: blocked, form stays.
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        assert_eq!(app.popup, Popup::Editor);
        assert!(app.grid.is_empty());

        type_str(&mut app, "https://example.com").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.grid.tile_at(5).unwrap().url, "https://example.com");
    }

    #[tokio::test]
    async fn added_tile_is_persisted() {
        let mut app = test_app();
        app.cursor = 2;
        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        type_str(&mut app, "https://a").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();

        // The snapshot store saw the full collection.
        let saved = app.store.load();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].position, 2);
    }

    #[tokio::test]
    async fn edit_preserves_id_and_position() {
        let mut app = test_app();
        app.cursor = 7;
        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        type_str(&mut app, "https://a").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        let original = app.grid.tile_at(7).unwrap().clone();

        app.handle_key(key(KeyCode::Char('e'))).await.unwrap();
        assert_eq!(app.popup, Popup::Editor);
        type_str(&mut app, "/extra").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();

        let edited = app.grid.tile_at(7).unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.position, 7);
        assert_eq!(edited.url, "https://a/extra");
    }

    #[tokio::test]
    async fn delete_asks_then_removes_only_that_tile() {
        let mut app = test_app();
        for pos in [0, 1] {
            app.cursor = pos;
            app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
            type_str(&mut app, "https://x").await;
            app.handle_key(key(KeyCode::F(2))).await.unwrap();
        }
        let survivor = app.grid.tile_at(1).unwrap().clone();

        app.cursor = 0;
        app.handle_key(key(KeyCode::Char('d'))).await.unwrap();
        assert_eq!(app.popup, Popup::Confirm);
        app.handle_key(key(KeyCode::Char('y'))).await.unwrap();

        assert!(app.grid.tile_at(0).is_none());
        assert_eq!(app.grid.tile_at(1), Some(&survivor));
        assert_eq!(app.store.load().len(), 1);
    }

    #[tokio::test]
    async fn keyboard_pick_and_place_moves_the_tile() {
        let mut app = test_app();
        app.cursor = 4;
        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        type_str(&mut app, "https://a").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();

        app.handle_key(key(KeyCode::Char(' '))).await.unwrap();
        assert!(app.drag.is_dragging());
        app.cursor = 9;
        app.handle_key(key(KeyCode::Char(' '))).await.unwrap();

        assert!(!app.drag.is_dragging());
        assert!(app.grid.tile_at(4).is_none());
        assert!(app.grid.tile_at(9).is_some());
        assert_eq!(app.store.load()[0].position, 9);
    }

    #[tokio::test]
    async fn escape_cancels_a_keyboard_drag() {
        let mut app = test_app();
        app.cursor = 4;
        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        type_str(&mut app, "https://a").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();

        app.handle_key(key(KeyCode::Char(' '))).await.unwrap();
        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert!(!app.drag.is_dragging());
        assert!(app.grid.tile_at(4).is_some());
    }

    #[tokio::test]
    async fn space_on_empty_slot_does_not_start_a_drag() {
        let mut app = test_app();
        app.cursor = 11;
        app.handle_key(key(KeyCode::Char(' '))).await.unwrap();
        assert!(!app.drag.is_dragging());
    }

    #[tokio::test]
    async fn cursor_wraps_around_the_grid() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Left)).await.unwrap();
        assert_eq!(app.cursor, GRID_SIZE - 1);
        app.handle_key(key(KeyCode::Right)).await.unwrap();
        assert_eq!(app.cursor, 0);
        app.handle_key(key(KeyCode::Up)).await.unwrap();
        assert_eq!(app.cursor, GRID_SIZE - GRID_COLUMNS);
        app.handle_key(key(KeyCode::Down)).await.unwrap();
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn display_mode_toggle_switches_visual_arm() {
        let mut app = test_app();
        app.cursor = 0;
        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        type_str(&mut app, "https://a").await;
        // Url -> DisplayMode, toggle to text, -> Text field, type a label.
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        app.handle_key(key(KeyCode::Char(' '))).await.unwrap();
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        type_str(&mut app, "Ex").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();

        assert_eq!(
            app.grid.tile_at(0).unwrap().visual,
            TileVisual::Text { text: "Ex".to_string() }
        );
    }

    #[test]
    fn suggestions_filter_on_typed_basename() {
        let form = EditorForm {
            icon: "/some/dir/fo".to_string(),
            ..EditorForm::add(0)
        };
        let icons = vec![
            "foo.png".to_string(),
            "bar.svg".to_string(),
            "info.webp".to_string(),
        ];
        let matches: Vec<&String> = form.suggestions(&icons);
        assert_eq!(matches, vec![&icons[0], &icons[2]]);
    }
}
