use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use elib_core::models::{ChatMessage, MessageRole};

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::utils::{format_timestamp, truncate};

/// Past conversations listed above the transcript
const MAX_SESSIONS_SHOWN: usize = 3;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(MAX_SESSIONS_SHOWN as u16 + 2),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    render_sessions(frame, app, chunks[0]);
    render_transcript(frame, app, chunks[1]);
    render_input(frame, app, chunks[2]);
}

fn render_sessions(frame: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let lines: Vec<Line> = if app.chat_sessions.is_empty() {
        vec![Line::from(Span::styled(" No earlier conversations", styles::muted_style()))]
    } else {
        app.chat_sessions
            .iter()
            .take(MAX_SESSIONS_SHOWN)
            .map(|s| Line::from(format!(" • {}", truncate(s.title(), width.saturating_sub(3)))))
            .collect()
    };

    let block = Block::default()
        .title(format!(" Conversations ({}) ", app.chat_sessions.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn message_lines(message: &ChatMessage) -> Vec<Line<'static>> {
    let label_style = match message.role {
        MessageRole::User => styles::user_message_style(),
        MessageRole::Assistant => styles::assistant_message_style(),
        MessageRole::System => styles::error_style(),
    };
    vec![
        Line::from(vec![
            Span::styled(message.role.label(), label_style),
            Span::styled(format!("  {}", format_timestamp(&message.timestamp)), styles::muted_style()),
        ]),
        Line::from(message.content.clone()),
        Line::from(""),
    ]
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = app.chat_messages.iter().flat_map(message_lines).collect();
    if app.chat_pending {
        lines.push(Line::from(Span::styled("Assistant is typing…", styles::muted_style())));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask anything about the books in the library.",
            styles::muted_style(),
        )));
    }

    // Keep the newest lines in view
    let inner_height = area.height.saturating_sub(2);
    let scroll = (lines.len() as u16).saturating_sub(inner_height);

    let block = Block::default()
        .title(" Assistant ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(matches!(app.focus, Focus::Chat)));

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Chat);
    let cursor = if focused { "▌" } else { "" };
    let width = area.width.saturating_sub(4) as usize;

    let chars: Vec<char> = app.chat_input.chars().collect();
    let start = chars.len().saturating_sub(width.saturating_sub(1));
    let visible: String = chars[start..].iter().collect();

    let block = Block::default()
        .title(" Message · Enter to send · Tab to switch ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(
        Paragraph::new(Line::from(format!(" {}{}", visible, cursor))).block(block),
        area,
    );
}
