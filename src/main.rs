mod app;
mod config;
mod grid;
mod icons;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use config::AppConfig;
use grid::store::{JsonFileStore, TileStore};
use grid::TileGrid;

#[derive(Parser, Debug)]
#[command(name = "paddo")]
#[command(version = "0.1.0")]
#[command(about = "A terminal-friendly launchpad grid")]
struct Args {
    /// Print the tile snapshot as JSON (for scripts)
    #[arg(short, long)]
    list: bool,

    /// Open the URL of the tile at a grid position and exit
    #[arg(short, long, value_name = "POSITION")]
    open: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Handle CLI-only commands
    if args.list {
        return print_tiles();
    }

    if let Some(position) = args.open {
        return open_position(position).await;
    }

    // Run TUI
    run_tui().await
}

fn load_store() -> Result<JsonFileStore> {
    let path = JsonFileStore::default_path()?;
    tracing::debug!("Snapshot path: {}", path.display());
    Ok(JsonFileStore::new(path))
}

fn print_tiles() -> Result<()> {
    let store = load_store()?;
    let grid = TileGrid::from_tiles(store.load());
    println!("{}", serde_json::to_string_pretty(grid.tiles())?);
    Ok(())
}

async fn open_position(position: usize) -> Result<()> {
    let store = load_store()?;
    let grid = TileGrid::from_tiles(store.load());
    let Some(tile) = grid.tile_at(position) else {
        anyhow::bail!("No tile at position {}", position);
    };

    let config = AppConfig::load().unwrap_or_default();
    let openers: Vec<String> = match config.open_command {
        Some(cmd) => vec![cmd],
        None => vec!["xdg-open".into(), "open".into(), "wslview".into()],
    };
    for opener in &openers {
        if tokio::process::Command::new(opener)
            .arg(&tile.url)
            .spawn()
            .is_ok()
        {
            println!("{}", tile.url);
            return Ok(());
        }
    }
    anyhow::bail!("No opener found (tried {})", openers.join(", "));
}

async fn run_tui() -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let store = load_store()?;
    let config = AppConfig::load().unwrap_or_default();
    let mut app = App::new(Box::new(store), config);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let frame = Rect::new(0, 0, size.width, size.height);
                    if let Err(e) = app.handle_mouse(mouse, frame).await {
                        app.status_message = Some(format!("Error: {}", e));
                    }
                }
                _ => {}
            }
        }

        // Expire stale status messages
        app.tick();
    }
}
