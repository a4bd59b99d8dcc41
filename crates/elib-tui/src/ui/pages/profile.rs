use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

fn row(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", label), styles::muted_style()),
        Span::styled(value, styles::list_item_style()),
    ])
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Profile ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let Some(user) = app.profile_user() else {
        let text = if app.profile_loading {
            "  Loading profile…"
        } else {
            "  Profile unavailable"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, styles::muted_style())).block(block),
            area,
        );
        return;
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  [{}] ", user.initials()), styles::highlight_style()),
            Span::styled(user.full_name(), styles::title_style()),
        ]),
        Line::from(""),
        row("Username", user.user_name.clone()),
        row("Email", user.email.clone()),
        row("Phone", user.phone_display().to_string()),
        row("Member ID", user.user_id.to_string()),
    ];
    if app.profile_loading {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  Refreshing…", styles::muted_style())));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
