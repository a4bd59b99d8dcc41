use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::forms::LoginFocus;
use crate::ui::render::{centered_rect_fixed, logo_lines};
use crate::ui::styles;

/// Visible width of the input boxes
const FIELD_WIDTH: usize = 24;

/// Tail of `value` that fits the box, padded, with a cursor when focused
pub(crate) fn field_text(value: &str, focused: bool) -> String {
    let chars: Vec<char> = value.chars().collect();
    let start = chars.len().saturating_sub(FIELD_WIDTH - 1);
    let visible: String = chars[start..].iter().collect();
    let cursor = if focused { "▌" } else { "" };
    format!("{:<width$}", format!("{}{}", visible, cursor), width = FIELD_WIDTH)
}

pub(crate) fn masked(value: &str) -> String {
    "*".repeat(value.chars().count())
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.login;
    let height = if form.error.is_some() { 14 } else { 12 };
    let dialog = centered_rect_fixed(46, height, area);
    frame.render_widget(Clear, dialog);

    let mut lines = logo_lines(17);
    lines.push(Line::from(""));

    let email_focused = form.focus == LoginFocus::Email;
    lines.push(Line::from(vec![
        Span::styled("  Email:    [", styles::muted_style()),
        Span::styled(field_text(&form.email, email_focused), styles::field_style(email_focused)),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = form.focus == LoginFocus::Password;
    lines.push(Line::from(vec![
        Span::styled("  Password: [", styles::muted_style()),
        Span::styled(
            field_text(&masked(&form.password), password_focused),
            styles::field_style(password_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let button_focused = form.focus == LoginFocus::Button;
    let label = if form.submitting {
        " Logging in… "
    } else if button_focused {
        " ▶ Log in ◀ "
    } else {
        "   Log in   "
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(label, styles::button_style(button_focused, !form.submitting)),
        Span::raw("]"),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  No account? ", styles::muted_style()),
        Span::styled("[Ctrl+S]", styles::help_key_style()),
        Span::styled(" sign up", styles::muted_style()),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(" Log in ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_text_pads_and_scrolls() {
        assert_eq!(field_text("ann", false).chars().count(), FIELD_WIDTH);
        assert!(field_text("ann", true).starts_with("ann▌"));

        let long = "a".repeat(40) + "z";
        let shown = field_text(&long, true);
        assert_eq!(shown.chars().count(), FIELD_WIDTH);
        assert!(shown.ends_with("z▌"));
    }

    #[test]
    fn test_masked_counts_chars() {
        assert_eq!(masked("pässwörd"), "********");
    }
}
