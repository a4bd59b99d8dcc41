use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::forms::{SignupField, SignupForm};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

use super::login::{field_text, masked};

/// Validation messages stay hidden on untouched fields until a submit attempt
fn visible_error(form: &SignupForm, field: SignupField) -> Option<&'static str> {
    let touched = !form.value(field).is_empty() || form.error.is_some();
    if touched {
        form.errors().for_field(field)
    } else {
        None
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.signup;
    let dialog = centered_rect_fixed(58, 24, area);
    frame.render_widget(Clear, dialog);

    let mut lines = vec![Line::from("")];

    for field in SignupField::ALL.iter().copied() {
        if field == SignupField::Submit {
            continue;
        }
        let focused = form.focus == field;
        let value = if field.is_secret() {
            masked(form.value(field))
        } else {
            form.value(field).to_string()
        };
        let optional = if field == SignupField::Phone { " (optional)" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(format!("  {:<11}[", field.label()), styles::muted_style()),
            Span::styled(field_text(&value, focused), styles::field_style(focused)),
            Span::styled("]", styles::muted_style()),
            Span::styled(optional, styles::muted_style()),
        ]));

        match visible_error(form, field) {
            Some(message) => lines.push(Line::from(Span::styled(
                format!("             {}", message),
                styles::error_style(),
            ))),
            None => lines.push(Line::from("")),
        }
    }

    let focused = form.focus == SignupField::Submit;
    let enabled = form.is_valid() && !form.submitting;
    let label = if form.submitting {
        " Creating account… "
    } else if focused {
        " ▶ Create account ◀ "
    } else {
        "   Create account   "
    };
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(label, styles::button_style(focused, enabled)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(" Sign up ")
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
    fn test_untouched_fields_hide_errors() {
        let mut form = SignupForm::default();
        assert_eq!(visible_error(&form, SignupField::Username), None);

        form.email = "ann".to_string();
        assert_eq!(visible_error(&form, SignupField::Email), Some("Invalid email format"));

        form.error = Some("Please fix the highlighted fields".to_string());
        assert_eq!(visible_error(&form, SignupField::Username), Some("Username is required"));
    }
}
