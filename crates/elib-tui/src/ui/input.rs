//! Keyboard input handling for the TUI.
//!
//! Overlays and text-entry modes get the key first; whatever they don't
//! consume falls through to the global shortcuts and then to the page.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use elib_core::queries::is_searchable;
use elib_core::Route;

use crate::app::{App, AppState, Focus};
use crate::forms::{can_add_char, LoginFocus, SignupField};

/// Chat questions may run longer than form fields
const MAX_CHAT_INPUT: usize = 1000;

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // Any key dismisses a transient status message
    app.status_message = None;

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return false;
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return false;
    }

    if matches!(app.state, AppState::Searching) {
        handle_search_input(app, key);
        return false;
    }

    match app.route {
        Route::Login => {
            handle_login_input(app, key);
            return false;
        }
        Route::Signup => {
            handle_signup_input(app, key);
            return false;
        }
        _ => {}
    }

    if app.chat_open && matches!(app.focus, Focus::Chat) {
        handle_chat_input(app, key);
        return false;
    }

    // Global shortcuts
    match key.code {
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return false;
        }
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return false;
        }
        _ => {}
    }

    if app.session.is_logged_in {
        match key.code {
            KeyCode::Char('1') => app.navigate(Route::Home),
            KeyCode::Char('2') => app.navigate(Route::Books),
            KeyCode::Char('3') => app.navigate(Route::Profile),
            KeyCode::Char('c') => app.toggle_chat(),
            KeyCode::Char('o') => app.logout(),
            KeyCode::Tab if app.chat_open => app.focus = Focus::Chat,
            _ => handle_page_input(app, key),
        }
    } else {
        match key.code {
            KeyCode::Char('l') => app.navigate(Route::Login),
            KeyCode::Char('s') => app.navigate(Route::Signup),
            KeyCode::Char('h') => app.navigate(Route::Landing),
            _ => {}
        }
    }
    false
}

fn handle_page_input(app: &mut App, key: KeyEvent) {
    match app.route {
        Route::Home | Route::Books => handle_books_input(app, key),
        Route::Profile => {
            if key.code == KeyCode::Char('r') {
                app.load_profile();
            }
        }
        _ => {}
    }
}

fn handle_books_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => {
            app.close_book_detail();
            app.state = AppState::Searching;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.close_book_detail();
            app.select_prev_book();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.close_book_detail();
            app.select_next_book();
        }
        KeyCode::Left | KeyCode::PageUp => {
            app.close_book_detail();
            app.prev_page();
        }
        KeyCode::Right | KeyCode::PageDown => {
            app.close_book_detail();
            app.next_page();
        }
        KeyCode::Enter => app.open_selected_book(),
        KeyCode::Esc => {
            if app.book_detail.is_some() {
                app.close_book_detail();
            } else if !app.search_query.is_empty() {
                app.search_query.clear();
                app.search_changed();
            }
        }
        KeyCode::Char('u') => app.load_books(),
        _ => {}
    }
}

/// The text a search actually runs with: nothing until it is long enough
fn effective_query(text: &str) -> &str {
    let trimmed = text.trim();
    if is_searchable(trimmed) {
        trimmed
    } else {
        ""
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    let before = effective_query(&app.search_query).to_string();

    match key.code {
        KeyCode::Esc => {
            app.search_query.clear();
            app.state = AppState::Normal;
        }
        KeyCode::Enter | KeyCode::Down => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            if can_add_char(app.search_query.chars().count(), c) {
                app.search_query.push(c);
            }
        }
        _ => {}
    }

    if effective_query(&app.search_query) != before {
        app.search_changed();
    }
}

fn handle_chat_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.toggle_chat(),
        KeyCode::Tab | KeyCode::BackTab => app.focus = Focus::Main,
        KeyCode::Enter => app.send_chat_message(),
        KeyCode::Backspace => {
            app.chat_input.pop();
        }
        KeyCode::Char(c) => {
            if app.chat_input.chars().count() < MAX_CHAT_INPUT && !c.is_control() {
                app.chat_input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s') {
            app.navigate(Route::Signup);
        }
        return;
    }

    let form = &mut app.login;
    match key.code {
        KeyCode::Esc => app.navigate(Route::Landing),
        KeyCode::Down | KeyCode::Tab => form.focus = form.focus.next(),
        KeyCode::Up | KeyCode::BackTab => form.focus = form.focus.prev(),
        KeyCode::Enter => match form.focus {
            LoginFocus::Email => form.focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.submit_login(),
        },
        KeyCode::Backspace => {
            if let Some(field) = form.active_field_mut() {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(field) = form.active_field_mut() {
                if can_add_char(field.chars().count(), c) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
}

fn handle_signup_input(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('l') {
            app.navigate(Route::Login);
        }
        return;
    }

    let form = &mut app.signup;
    match key.code {
        KeyCode::Esc => app.navigate(Route::Landing),
        KeyCode::Down | KeyCode::Tab => form.focus = form.focus.next(),
        KeyCode::Up | KeyCode::BackTab => form.focus = form.focus.prev(),
        KeyCode::Enter => {
            if form.focus == SignupField::Submit {
                app.submit_signup();
            } else {
                form.focus = form.focus.next();
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = form.active_field_mut() {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(field) = form.active_field_mut() {
                if can_add_char(field.chars().count(), c) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
}
