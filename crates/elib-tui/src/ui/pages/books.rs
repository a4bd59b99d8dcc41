use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use elib_core::models::Book;
use elib_core::queries::is_searchable;
use elib_core::Route;

use crate::app::{App, AppState, Focus};
use crate::ui::styles;
use crate::utils::{page_label, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let greeting_height = if app.route == Route::Home { 2 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(greeting_height),
            Constraint::Length(3), // Search box
            Constraint::Min(6),    // Book list
            Constraint::Length(8), // Detail pane
        ])
        .split(area);

    if app.route == Route::Home {
        render_greeting(frame, app, chunks[0]);
    }
    render_search(frame, app, chunks[1]);
    render_book_list(frame, app, chunks[2]);
    render_detail(frame, app, chunks[3]);
}

fn render_greeting(frame: &mut Frame, app: &App, area: Rect) {
    let name = app
        .session
        .user
        .as_ref()
        .map(|u| u.full_name())
        .unwrap_or_default();
    let line = Line::from(vec![
        Span::styled(" Welcome back, ", styles::muted_style()),
        Span::styled(name, styles::highlight_style()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_search(frame: &mut Frame, app: &App, area: Rect) {
    let searching = matches!(app.state, AppState::Searching);
    let query = app.search_query.as_str();

    let content = if query.is_empty() && !searching {
        Line::from(Span::styled(" Press / to search", styles::muted_style()))
    } else {
        let cursor = if searching { "▌" } else { "" };
        let mut spans = vec![Span::styled(format!(" {}{}", query, cursor), styles::search_style())];
        if !query.trim().is_empty() && !is_searchable(query) {
            spans.push(Span::styled("  (keep typing…)", styles::muted_style()));
        }
        Line::from(spans)
    };

    let block = Block::default()
        .title(" Search ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn book_line(book: &Book, width: usize) -> Line<'static> {
    let author_width = width / 3;
    let title_width = width.saturating_sub(author_width + 10);
    Line::from(vec![
        Span::raw(format!(" {:<w$}", truncate(&book.title, title_width), w = title_width)),
        Span::styled(
            format!(" {:<w$}", truncate(&book.author_name, author_width), w = author_width),
            styles::muted_style(),
        ),
        Span::styled(format!(" {:>6}", book.year_display()), styles::muted_style()),
    ])
}

fn render_book_list(frame: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .books
        .iter()
        .enumerate()
        .map(|(i, book)| {
            let style = if i == app.book_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(book_line(book, width)).style(style)
        })
        .collect();

    let status = if app.books_loading {
        " loading… ".to_string()
    } else {
        String::new()
    };
    let title = format!(" Books · {}{} ", page_label(app.books_page, app.has_next_page()), status);

    let focused = matches!(app.focus, Focus::Main) && !matches!(app.state, AppState::Searching);
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if items.is_empty() {
        let message = if let Some(ref error) = app.books_error {
            Span::styled(format!(" {}", error), styles::error_style())
        } else if app.books_loading {
            Span::styled(" Loading books…", styles::muted_style())
        } else {
            Span::styled(" No books found", styles::muted_style())
        };
        frame.render_widget(Paragraph::new(Line::from(message)).block(block), area);
        return;
    }

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.book_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let open = app.book_detail.as_ref();
    let book = open.or_else(|| app.books.get(app.book_selection));

    let block = Block::default()
        .title(if open.is_some() { " Details · Esc to close " } else { " Details " })
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(open.is_some()));

    let Some(book) = book else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(book.title.clone(), styles::highlight_style())),
        Line::from(vec![
            Span::styled("by ", styles::muted_style()),
            Span::raw(book.author_name.clone()),
            Span::styled(
                format!("  ·  {}  ·  {}", book.genre_display(), book.year_display()),
                styles::muted_style(),
            ),
        ]),
        Line::from(Span::styled(format!("ISBN {}", book.book_isbn), styles::muted_style())),
    ];
    match (&book.summary, open.is_some()) {
        (Some(summary), true) => lines.push(Line::from(summary.clone())),
        (Some(_), false) => lines.push(Line::from(Span::styled(
            "Enter for the summary",
            styles::muted_style(),
        ))),
        (None, _) => {}
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_line_fits_width() {
        let book = Book {
            book_isbn: "978-0".to_string(),
            title: "A Very Long Title That Will Not Fit In The Row".to_string(),
            summary: None,
            genre: None,
            published_year: Some(1965),
            author_name: "Frank Herbert".to_string(),
        };
        let line = book_line(&book, 60);
        let rendered: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(rendered.chars().count() <= 60);
        assert!(rendered.contains("..."));
        assert!(rendered.ends_with("1965"));
    }
}
