use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::render::logo_lines;
use crate::ui::styles;

const TAGLINE: &str = "Your library, in the terminal";

const BLURB: &str = "Browse and search the catalog, keep your profile up to date \
                     and ask the library assistant about any book.";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let indent = (area.width as usize).saturating_sub(10) / 2;
    let mut lines = vec![Line::from("")];
    lines.extend(logo_lines(indent));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(TAGLINE, styles::highlight_style())).centered());
    lines.push(Line::from(""));
    lines.push(Line::from(BLURB).centered());
    lines.push(Line::from(""));

    let actions = if app.is_hydrating() {
        Line::from(Span::styled("Restoring session…", styles::muted_style()))
    } else {
        Line::from(vec![
            Span::styled("[l]", styles::help_key_style()),
            Span::styled(" Log in    ", styles::help_desc_style()),
            Span::styled("[s]", styles::help_key_style()),
            Span::styled(" Create an account", styles::help_desc_style()),
        ])
    };
    lines.push(actions.centered());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
