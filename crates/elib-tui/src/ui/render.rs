use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use elib_core::Route;

use crate::app::{App, AppState};

use super::pages::{books, chat, landing, login, profile, signup};
use super::styles;

/// Block-letter banner shown on the landing page and in dialogs
pub const LOGO: [&str; 3] = [
    "╔═╗╦  ╦╔╗ ",
    "║╣ ║  ║╠╩╗",
    "╚═╝╩═╝╩╚═╝",
];

pub fn logo_lines(indent: usize) -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| {
            Line::from(Span::styled(
                format!("{}{}", " ".repeat(indent), row),
                styles::title_style(),
            ))
        })
        .collect()
}

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Navigation
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_nav_bar(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  Elib · {}", app.route.title());
    let right = match app.display_user() {
        Some(user) => format!("{}  [?] Help", user.user_name),
        _ => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_nav_bar(frame: &mut Frame, app: &App, area: Rect) {
    let entries: Vec<(&str, bool)> = if app.session.is_logged_in {
        vec![
            ("[1] Home", app.route == Route::Home),
            ("[2] Books", app.route == Route::Books),
            ("[3] Profile", app.route == Route::Profile),
            ("[c] Chat", app.chat_open),
        ]
    } else {
        vec![
            ("[h] Welcome", app.route == Route::Landing),
            ("[l] Login", app.route == Route::Login),
            ("[s] Sign up", app.route == Route::Signup),
        ]
    };

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, selected)) in entries.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(*label, styles::nav_style(*selected)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if app.route.requires_auth() && app.is_hydrating() {
        render_loading(frame, area);
        return;
    }

    let (page_area, chat_area) = if app.chat_open && app.route.requires_auth() {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    match app.route {
        Route::Landing => landing::render(frame, app, page_area),
        Route::Login => login::render(frame, app, page_area),
        Route::Signup => signup::render(frame, app, page_area),
        Route::Home | Route::Books => books::render(frame, app, page_area),
        Route::Profile => profile::render(frame, app, page_area),
    }

    if let Some(chat_area) = chat_area {
        chat::render(frame, app, chat_area);
    }
}

/// Placeholder for protected pages until the session is known
fn render_loading(frame: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from(""); (area.height / 3) as usize];
    lines.push(Line::from(Span::styled("Loading…", styles::muted_style())).centered());
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.route {
        Route::Login | Route::Signup => "[Tab] next field | [Esc] back",
        Route::Home | Route::Books => "[/] search | [←/→] page | [o] logout | [q]uit",
        Route::Profile => "[o] logout | [q]uit",
        Route::Landing => "[q]uit",
    };

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if app.is_hydrating() {
        " Restoring session… ".to_string()
    } else if app.session.is_logged_in {
        " Signed in ".to_string()
    } else {
        " Not signed in ".to_string()
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(50, 24, frame.area());
    frame.render_widget(Clear, area);

    let mut help_text = logo_lines(19);
    help_text.push(Line::from(Span::styled(
        format!("               version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    help_text.extend([
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-3", "Home / Books / Profile"),
        help_line("l / s", "Login / Sign up (signed out)"),
        help_line("Tab", "Next field"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Books", styles::highlight_style())),
        help_line("/", "Search (3+ characters)"),
        help_line("↑/↓", "Select book"),
        help_line("←/→", "Previous / next page"),
        help_line("Enter", "Book details"),
        Line::from(""),
        Line::from(Span::styled(" Other", styles::highlight_style())),
        help_line("c", "Toggle chat panel"),
        help_line("o", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("        Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(44, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(16);
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
