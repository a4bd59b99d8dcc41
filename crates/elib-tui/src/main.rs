//! Elib TUI - a terminal client for the Elib book library.
//!
//! Browse and search the catalog, manage your profile and chat with the
//! library assistant from the keyboard.

mod app;
mod forms;
#[cfg(test)]
mod testing;
mod ui;
mod utils;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use elib_core::auth::{MemoryTokenStore, TokenStore};
use elib_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "elib.log";

const USAGE: &str = "Usage: elib [--ephemeral] [--version]

  --ephemeral   keep the login token in memory only
  --version     print the version and exit

Environment: ELIB_API_URL, ELIB_TOKEN_STORAGE, ELIB_EMAIL, RUST_LOG";

/// Log to a daily file under the log dir. The terminal belongs to the UI,
/// so nothing is written to stderr while it runs. The returned guard must
/// stay alive for buffered lines to be flushed.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=elib_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config.log_dir().ok()?;
    std::fs::create_dir_all(&log_dir).ok()?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut ephemeral = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--ephemeral" => ephemeral = true,
            "--version" | "-V" => {
                println!("elib {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }

    let config_path = Config::config_path().ok();
    let config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };

    let _log_guard = init_tracing(&config);
    info!(version = env!("CARGO_PKG_VERSION"), "Elib TUI starting");

    let tokens: Arc<dyn TokenStore> = if ephemeral {
        info!("Ephemeral session, token kept in memory");
        Arc::new(MemoryTokenStore::new())
    } else {
        config.token_store().context("Failed to open token storage")?
    };

    let mut app = App::new(config, config_path, tokens)?;
    app.start_hydration();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown();

    if let Err(e) = result {
        error!(error = %e, "UI loop failed");
        eprintln!("Error: {}", e);
    }

    info!("Elib TUI shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Only presses; some terminals also report releases
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
