use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, EditorField, EditorForm, EditorMode, Popup};
use crate::grid::{Tile, TileVisual, GRID_COLUMNS, GRID_SIZE};
use crate::theme::{parse_hex_color, Theme};

const GRID_ROWS: usize = GRID_SIZE / GRID_COLUMNS;

// Theme colors loaded once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

fn accent() -> Color { theme().accent }
fn danger() -> Color { theme().danger }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn tile_bg() -> Color { theme().tile_bg }
fn bg_selected() -> Color { theme().bg_selected }
fn inactive() -> Color { theme().inactive }
fn header() -> Color { theme().header }

fn layout_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(8),    // Grid box
            Constraint::Length(1), // Footer
        ])
        .split(area)
}

/// The cell region of the grid (inside the grid box borders), for the
/// mouse hit test. Shares its layout math with `draw`.
pub fn grid_area(frame: Rect) -> Rect {
    let chunks = layout_chunks(frame);
    inner(chunks[1])
}

fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

/// Rectangle of one slot inside the grid cell region. Cells share the
/// available space evenly; the block of cells is centered horizontally.
pub fn slot_rect(grid: Rect, index: usize) -> Option<Rect> {
    if index >= GRID_SIZE {
        return None;
    }
    let cell_w = grid.width / GRID_COLUMNS as u16;
    let cell_h = grid.height / GRID_ROWS as u16;
    if cell_w < 3 || cell_h < 1 {
        return None;
    }
    let offset_x = (grid.width - cell_w * GRID_COLUMNS as u16) / 2;
    let col = (index % GRID_COLUMNS) as u16;
    let row = (index / GRID_COLUMNS) as u16;
    Some(Rect {
        x: grid.x + offset_x + col * cell_w,
        y: grid.y + row * cell_h,
        width: cell_w,
        height: cell_h,
    })
}

/// Which slot, if any, contains the terminal coordinate (column, row).
pub fn slot_at(grid: Rect, column: u16, row: u16) -> Option<usize> {
    for index in 0..GRID_SIZE {
        if let Some(rect) = slot_rect(grid, index) {
            if column >= rect.x
                && column < rect.x + rect.width
                && row >= rect.y
                && row < rect.y + rect.height
            {
                return Some(index);
            }
        }
    }
    None
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = layout_chunks(f.area());

    draw_info_line(f, app, chunks[0]);
    draw_grid_box(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    match app.popup {
        Popup::None => {}
        Popup::Editor => draw_editor(f, app),
        Popup::Confirm => draw_confirm_popup(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: in-flight drag > status message > ready
    let line = if let Some(source) = app.drag.source() {
        let label = app
            .grid
            .tile_at(source)
            .map(|t| t.visual.label().to_string())
            .unwrap_or_else(|| format!("slot {}", source));
        Line::from(vec![
            Span::styled("󰁁 ", Style::default().fg(accent())),
            Span::styled(format!("Moving {}", label), Style::default().fg(text())),
            Span::styled(" │ ", Style::default().fg(text_dim())),
            Span::styled("drop on a slot, Esc cancels", Style::default().fg(text_dim())),
        ])
    } else if let Some(ref status) = app.status_message {
        Line::from(vec![Span::styled(status, Style::default().fg(warning()))])
    } else {
        Line::from(vec![Span::styled("Ready", Style::default().fg(text_dim()))])
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_grid_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " paddo ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    f.render_widget(block, area);

    let grid = inner(area);
    if slot_rect(grid, 0).is_none() {
        let hint = Paragraph::new("Terminal too small")
            .style(Style::default().fg(text_dim()))
            .alignment(Alignment::Center);
        f.render_widget(hint, grid);
        return;
    }

    for index in 0..GRID_SIZE {
        let Some(rect) = slot_rect(grid, index) else {
            continue;
        };
        match app.grid.tile_at(index) {
            Some(tile) => draw_tile_cell(f, app, tile, index, rect),
            None => draw_empty_cell(f, app, index, rect),
        }
    }
}

fn cell_border(app: &App, index: usize) -> (Color, Modifier) {
    if app.drag.source() == Some(index) {
        (warning(), Modifier::BOLD)
    } else if app.drag_hover == Some(index) && app.drag.is_dragging() {
        (accent(), Modifier::BOLD)
    } else if app.cursor == index {
        (accent(), Modifier::empty())
    } else {
        (inactive(), Modifier::empty())
    }
}

fn draw_tile_cell(f: &mut Frame, app: &App, tile: &Tile, index: usize, rect: Rect) {
    let (border_color, border_mod) = cell_border(app, index);
    let bg = tile
        .background
        .as_deref()
        .and_then(parse_hex_color)
        .unwrap_or_else(tile_bg);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color).add_modifier(border_mod))
        .style(Style::default().bg(bg));

    let icon_glyph = match &tile.visual {
        TileVisual::Icon { .. } => "󰋩 ",
        TileVisual::Text { .. } => "",
    };
    let label = tile.visual.label();

    // Vertically center the label when the cell is tall enough.
    let inner_height = rect.height.saturating_sub(2);
    let pad = (inner_height.saturating_sub(1) / 2) as usize;
    let mut lines: Vec<Line> = std::iter::repeat_with(|| Line::from(""))
        .take(pad)
        .collect();
    lines.push(Line::from(vec![
        Span::styled(icon_glyph, Style::default().fg(text())),
        Span::styled(label, Style::default().fg(text()).add_modifier(Modifier::BOLD)),
    ]));

    let cell = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    f.render_widget(cell, rect);
}

fn draw_empty_cell(f: &mut Frame, app: &App, index: usize, rect: Rect) {
    let (border_color, border_mod) = cell_border(app, index);
    let hovering = app.drag.is_dragging() && app.drag_hover == Some(index);

    let mut style = Style::default();
    if hovering {
        style = style.bg(bg_selected());
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color).add_modifier(border_mod))
        .style(style);

    // A plus invites a click, but only on the cursor cell to keep the
    // grid quiet.
    let content = if app.cursor == index && !app.drag.is_dragging() {
        "+"
    } else {
        ""
    };

    let inner_height = rect.height.saturating_sub(2);
    let pad = (inner_height.saturating_sub(1) / 2) as usize;
    let mut lines: Vec<Line> = std::iter::repeat_with(|| Line::from(""))
        .take(pad)
        .collect();
    lines.push(Line::from(Span::styled(
        content,
        Style::default().fg(text_dim()),
    )));

    let cell = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    f.render_widget(cell, rect);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.popup {
        Popup::Editor => vec![
            ("Tab", "Field"),
            ("↑↓", "Icons"),
            ("F2", "Save"),
            ("Esc", "Cancel"),
        ],
        Popup::Confirm => vec![("y", "Yes"), ("n", "No")],
        Popup::Help => vec![("Esc", "Close")],
        Popup::None => {
            if app.drag.is_dragging() {
                vec![("Space", "Drop"), ("Esc", "Cancel")]
            } else {
                vec![
                    ("↑↓←→", "Nav"),
                    ("Enter", "Open/Add"),
                    ("Space", "Move"),
                    ("e", "Edit"),
                    ("d", "Del"),
                    ("?", "Help"),
                ]
            }
        }
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn field_input<'a>(title: &'a str, value: &'a str, active: bool) -> Paragraph<'a> {
    let border = if active { accent() } else { inactive() };
    let cursor = if active { "_" } else { "" };
    Paragraph::new(format!("{}{}", value, cursor))
        .style(Style::default().fg(text()))
        .block(
            Block::default()
                .title(Span::styled(
                    title,
                    Style::default().fg(if active { accent() } else { header() }),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
}

fn draw_editor(f: &mut Frame, app: &App) {
    let Some(form) = app.editor.as_ref() else {
        return;
    };
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 90 { 90 } else { 60 },
        if area.height < 35 { 90 } else { 75 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let title = match form.mode {
        EditorMode::Add { position } => format!(" 󰐕 Add Tile (slot {}) ", position),
        EditorMode::Edit { .. } => " 󰏫 Edit Tile ".to_string(),
    };
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(accent())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    f.render_widget(block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // URL
            Constraint::Length(1), // Display mode toggle
            Constraint::Length(3), // Icon or text
            Constraint::Min(3),    // Suggestions / spacer
            Constraint::Length(3), // Background color
            Constraint::Length(3), // Preview
            Constraint::Length(1), // Buttons
        ])
        .split(popup_area);

    f.render_widget(
        field_input(" URL (required) ", &form.url, form.field == EditorField::Url),
        inner[0],
    );

    // Display mode toggle
    let mode_active = form.field == EditorField::DisplayMode;
    let (icon_mark, text_mark) = if form.show_icon { ("◉", "○") } else { ("○", "◉") };
    let mode_line = Paragraph::new(Line::from(vec![
        Span::styled(
            " Display: ",
            Style::default().fg(if mode_active { accent() } else { header() }),
        ),
        Span::styled(format!("{} icon", icon_mark), Style::default().fg(text())),
        Span::styled("   ", Style::default()),
        Span::styled(format!("{} text", text_mark), Style::default().fg(text())),
        Span::styled(
            if mode_active { "   (Space toggles)" } else { "" },
            Style::default().fg(text_dim()),
        ),
    ]));
    f.render_widget(mode_line, inner[1]);

    if form.show_icon {
        f.render_widget(
            field_input(" Icon path ", &form.icon, form.field == EditorField::Icon),
            inner[2],
        );
        draw_icon_suggestions(f, app, form, inner[3]);
    } else {
        f.render_widget(
            field_input(" Text label ", &form.text, form.field == EditorField::Text),
            inner[2],
        );
    }

    f.render_widget(
        field_input(
            " Background color (#rrggbb) ",
            &form.background,
            form.field == EditorField::Background,
        ),
        inner[4],
    );

    // Live preview on the chosen background, like the tile will render.
    let bg = parse_hex_color(&form.background).unwrap_or_else(tile_bg);
    let preview_label = if form.show_icon {
        form.icon.rsplit('/').next().unwrap_or("").to_string()
    } else {
        form.text.clone()
    };
    let preview = Paragraph::new(Line::from(Span::styled(
        preview_label,
        Style::default().fg(text()).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(" Preview ", Style::default().fg(header())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(inactive()))
            .style(Style::default().bg(bg)),
    );
    f.render_widget(preview, inner[5]);

    let buttons = Paragraph::new(Line::from(vec![
        Span::styled("[ ", Style::default().fg(text_dim())),
        Span::styled("F2 = Save", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
        Span::styled(" ]  [ ", Style::default().fg(text_dim())),
        Span::styled("Esc = Cancel", Style::default().fg(danger())),
        Span::styled(" ]", Style::default().fg(text_dim())),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(buttons, inner[6]);
}

fn draw_icon_suggestions(f: &mut Frame, app: &App, form: &EditorForm, area: Rect) {
    let suggestions = form.suggestions(&app.available_icons);

    let lines: Vec<Line> = if app.available_icons.is_empty() {
        vec![Line::from(Span::styled(
            "  No icons available (press R in the grid to rescan)",
            Style::default().fg(text_dim()),
        ))]
    } else if suggestions.is_empty() {
        vec![Line::from(Span::styled(
            "  No matching icons",
            Style::default().fg(text_dim()),
        ))]
    } else {
        suggestions
            .iter()
            .take(area.height.saturating_sub(1) as usize)
            .enumerate()
            .map(|(i, name)| {
                let style = if form.suggestion == Some(i) {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default().fg(text_dim())
                };
                Line::from(Span::styled(format!("  󰋩 {}", name), style))
            })
            .collect()
    };

    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::NONE)
            .title(Span::styled(" Icons (↑↓ to pick) ", Style::default().fg(header()))),
    );
    f.render_widget(list, area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let message = app.status_message.as_deref().unwrap_or("Delete tile?");

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(warning()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes   "),
            Span::styled("n", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(warning())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(warning())),
    )
    .alignment(Alignment::Center);

    f.render_widget(confirm, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled("═══ Navigation ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  ↑↓←→ hjkl ", Style::default().fg(accent())),
            Span::raw("Move the cursor around the grid"),
        ]),
        Line::from(""),
        Line::from(Span::styled("═══ Tiles ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  Enter     ", Style::default().fg(accent())),
            Span::raw("Open the tile's URL (or add on an empty slot)"),
        ]),
        Line::from(vec![
            Span::styled("  a         ", Style::default().fg(accent())),
            Span::raw("Add a tile on the selected empty slot"),
        ]),
        Line::from(vec![
            Span::styled("  e         ", Style::default().fg(accent())),
            Span::raw("Edit the selected tile"),
        ]),
        Line::from(vec![
            Span::styled("  d         ", Style::default().fg(accent())),
            Span::raw("Delete the selected tile"),
        ]),
        Line::from(""),
        Line::from(Span::styled("═══ Rearranging ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  Space     ", Style::default().fg(accent())),
            Span::raw("Pick up the tile, Space again to drop it"),
        ]),
        Line::from(vec![
            Span::styled("  Mouse     ", Style::default().fg(accent())),
            Span::raw("Drag a tile onto another slot; occupied slots swap"),
        ]),
        Line::from(vec![
            Span::styled("  Esc       ", Style::default().fg(accent())),
            Span::raw("Cancel an in-flight move"),
        ]),
        Line::from(""),
        Line::from(Span::styled("═══ Icons ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  R         ", Style::default().fg(accent())),
            Span::raw("Rescan the icon directory"),
        ]),
        Line::from(""),
        Line::from(Span::styled("═══ Scripting ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  paddo --list        ", Style::default().fg(accent())),
            Span::raw("Print the tiles as JSON"),
        ]),
        Line::from(vec![
            Span::styled("  paddo --open <slot> ", Style::default().fg(accent())),
            Span::raw("Open a tile's URL from the shell"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 paddo Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
