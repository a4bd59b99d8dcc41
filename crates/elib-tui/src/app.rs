//! Application state for the Elib terminal client.
//!
//! `App` owns everything the UI draws. Network work runs on spawned tasks
//! that report back through an mpsc channel; the main loop drains it every
//! tick via [`App::check_background_tasks`]. Navigation goes through the
//! shared [`RouteState`], so a redirect issued deep inside the HTTP pipeline
//! shows up here on the next tick.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use elib_core::api::ApiError;
use elib_core::auth::{SessionSnapshot, TokenStore};
use elib_core::models::{Book, ChatMessage, ChatResponse, ChatSession, MessageRole, UserProfile};
use elib_core::queries::is_searchable;
use elib_core::{Config, ElibClient, Navigator, QueryState, Route, RouteState};

use crate::forms::{LoginForm, SignupForm};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background result channel
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Environment variable that prefills the login email
pub const EMAIL_ENV: &str = "ELIB_EMAIL";

/// How often idle cache entries are swept
const GC_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Which panel receives typed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Main,
    Chat,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned network tasks.
enum BackgroundResult {
    Hydrated(SessionSnapshot),
    LoggedIn(Result<UserProfile, String>),
    SignedUp(Result<UserProfile, String>),
    /// A page of books; `seq` identifies the request so late answers to
    /// superseded requests can be dropped
    Books {
        seq: u64,
        state: QueryState<Vec<Book>>,
    },
    BookDetail(QueryState<Book>),
    CurrentUser(QueryState<UserProfile>),
    Profile(QueryState<UserProfile>),
    ChatReply(Result<ChatResponse, String>),
    ChatSessions(QueryState<Vec<ChatSession>>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    /// Where `config` is written back; `None` keeps it in memory only
    config_path: Option<PathBuf>,
    pub client: ElibClient,
    routes: RouteState,
    route_rx: watch::Receiver<Route>,

    // UI State
    pub route: Route,
    pub state: AppState,
    pub focus: Focus,
    pub session: SessionSnapshot,
    /// Cached `/users/me` answer shown in the title bar
    pub current_user: Option<UserProfile>,
    pub status_message: Option<String>,

    // Forms
    pub login: LoginForm,
    pub signup: SignupForm,

    // Books page
    pub books: Vec<Book>,
    pub books_page: usize,
    pub page_size: usize,
    pub books_loading: bool,
    pub books_error: Option<String>,
    pub book_selection: usize,
    pub search_query: String,
    pub book_detail: Option<Book>,
    books_seq: u64,

    // Profile page
    pub profile: Option<UserProfile>,
    pub profile_loading: bool,

    // Chat panel
    pub chat_open: bool,
    pub chat_input: String,
    pub chat_messages: Vec<ChatMessage>,
    pub chat_pending: bool,
    pub chat_sessions: Vec<ChatSession>,
    chat_session_id: Option<String>,

    // Cache housekeeping
    gc_interval: Duration,
    last_gc: Instant,

    // Background task channel
    result_rx: mpsc::Receiver<BackgroundResult>,
    result_tx: mpsc::Sender<BackgroundResult>,
}

impl App {
    /// Create the app against the configured backend
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let routes = RouteState::new(Route::Landing);
        let client = ElibClient::from_config(&config, tokens, Arc::new(routes.clone()))?;
        let mut app = Self::with_client(config, client, routes);
        app.config_path = config_path;
        Ok(app)
    }

    pub fn with_client(config: Config, client: ElibClient, routes: RouteState) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let email = std::env::var(EMAIL_ENV)
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();

        let route_rx = routes.subscribe();
        let route = *route_rx.borrow();
        let session = client.session.snapshot();
        let page_size = config.page_size();

        Self {
            config,
            config_path: None,
            client,
            routes,
            route_rx,
            route,
            state: AppState::Normal,
            focus: Focus::Main,
            session,
            current_user: None,
            status_message: None,
            login: LoginForm::new(email),
            signup: SignupForm::default(),
            books: Vec::new(),
            books_page: 0,
            page_size,
            books_loading: false,
            books_error: None,
            book_selection: 0,
            search_query: String::new(),
            book_detail: None,
            books_seq: 0,
            profile: None,
            profile_loading: false,
            chat_open: false,
            chat_input: String::new(),
            chat_messages: Vec::new(),
            chat_pending: false,
            chat_sessions: Vec::new(),
            chat_session_id: None,
            gc_interval: GC_INTERVAL,
            last_gc: Instant::now(),
            result_rx: rx,
            result_tx: tx,
        }
    }

    /// Run `task` on the runtime and deliver its result to the main loop
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = BackgroundResult> + Send + 'static,
    {
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = task.await;
            if let Err(e) = tx.send(result).await {
                error!(error = %e, "Failed to send background result - channel closed");
            }
        });
    }

    // =========================================================================
    // Session & Navigation
    // =========================================================================

    /// Restore the session from the stored token in the background
    pub fn start_hydration(&self) {
        let session = self.client.session.clone();
        self.spawn(async move { BackgroundResult::Hydrated(session.hydrate().await) });
    }

    pub fn is_hydrating(&self) -> bool {
        self.session.is_loading
    }

    pub fn navigate(&mut self, route: Route) {
        self.routes.navigate(route);
        self.sync_route();
    }

    /// Pick up route changes (ours or a redirect from a background task) and
    /// keep anonymous users off protected pages.
    pub fn sync_route(&mut self) {
        if self.route_rx.has_changed().unwrap_or(false) {
            let route = *self.route_rx.borrow_and_update();
            if route != self.route {
                self.enter_route(route);
            }
        }

        if self.route.requires_auth() && !self.session.is_loading && !self.session.is_logged_in {
            debug!(from = self.route.path(), "Not logged in, sending to login");
            self.routes.navigate(Route::Login);
            let route = *self.route_rx.borrow_and_update();
            self.enter_route(route);
        }
    }

    fn enter_route(&mut self, route: Route) {
        debug!(to = route.path(), "Entering route");
        self.route = route;
        self.state = AppState::Normal;
        if route.requires_auth() {
            self.load_current_user();
        } else {
            self.focus = Focus::Main;
            self.chat_open = false;
        }

        match route {
            Route::Home | Route::Books => self.load_books(),
            Route::Profile => self.load_profile(),
            Route::Login => {
                self.login.password.clear();
                self.login.submitting = false;
            }
            Route::Signup | Route::Landing => {}
        }
    }

    fn refresh_session(&mut self) {
        self.session = self.client.session.snapshot();
        if !self.session.is_logged_in {
            self.current_user = None;
        }
    }

    /// Usually answered from the entry seeded at login
    fn load_current_user(&self) {
        let auth = self.client.current_user.clone();
        self.spawn(async move { BackgroundResult::CurrentUser(auth.current_user().await) });
    }

    /// Name for the title bar: the cached current user, else the session's
    pub fn display_user(&self) -> Option<&UserProfile> {
        if !self.session.is_logged_in {
            return None;
        }
        self.current_user.as_ref().or(self.session.user.as_ref())
    }

    // =========================================================================
    // Auth actions
    // =========================================================================

    pub fn submit_login(&mut self) {
        if self.login.submitting {
            return;
        }
        if let Err(msg) = self.login.validate() {
            self.login.error = Some(msg.to_string());
            return;
        }

        self.login.error = None;
        self.login.submitting = true;
        let auth = self.client.auth.clone();
        let email = self.login.email.trim().to_string();
        let password = self.login.password.clone();
        self.spawn(async move {
            let result = auth
                .login(&email, &password)
                .await
                .map_err(|e| login_error_message(&e));
            BackgroundResult::LoggedIn(result)
        });
    }

    pub fn submit_signup(&mut self) {
        if self.signup.submitting {
            return;
        }
        if !self.signup.is_valid() {
            self.signup.error = Some("Please fix the highlighted fields".to_string());
            return;
        }

        self.signup.error = None;
        self.signup.submitting = true;
        let auth = self.client.auth.clone();
        let new_user = self.signup.to_new_user();
        self.spawn(async move {
            let result = auth
                .register(&new_user)
                .await
                .map_err(|e| e.user_message());
            BackgroundResult::SignedUp(result)
        });
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.client.auth.logout() {
            warn!(error = %e, "Logout did not fully clear the stored token");
        }
        self.books.clear();
        self.book_detail = None;
        self.current_user = None;
        self.profile = None;
        self.chat_messages.clear();
        self.chat_sessions.clear();
        self.chat_session_id = None;
        self.chat_open = false;
        self.refresh_session();
        self.status_message = Some("Logged out".to_string());
        self.sync_route();
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Fetch the current page. Rows already on screen stay until the answer
    /// arrives.
    pub fn load_books(&mut self) {
        self.books_seq += 1;
        self.books_loading = true;
        self.books_error = None;

        let seq = self.books_seq;
        let books = self.client.books.clone();
        let skip = self.books_page * self.page_size;
        let limit = self.page_size;
        let query = self.search_query.trim().to_string();

        self.spawn(async move {
            let state = if is_searchable(&query) {
                books.search(&query, skip, limit).await
            } else {
                books.page(skip, limit).await
            };
            BackgroundResult::Books { seq, state }
        });
    }

    pub fn has_next_page(&self) -> bool {
        self.books.len() >= self.page_size
    }

    pub fn next_page(&mut self) {
        if self.books_loading || !self.has_next_page() {
            return;
        }
        self.books_page += 1;
        self.book_selection = 0;
        self.load_books();
    }

    pub fn prev_page(&mut self) {
        if self.books_loading || self.books_page == 0 {
            return;
        }
        self.books_page -= 1;
        self.book_selection = 0;
        self.load_books();
    }

    /// Search text changed: start over from the first page
    pub fn search_changed(&mut self) {
        self.books_page = 0;
        self.book_selection = 0;
        self.load_books();
    }

    pub fn select_next_book(&mut self) {
        if self.book_selection + 1 < self.books.len() {
            self.book_selection += 1;
        }
    }

    pub fn select_prev_book(&mut self) {
        self.book_selection = self.book_selection.saturating_sub(1);
    }

    /// Show the selected book right away and refresh it from the server
    pub fn open_selected_book(&mut self) {
        let Some(book) = self.books.get(self.book_selection).cloned() else {
            return;
        };
        let books = self.client.books.clone();
        let isbn = book.book_isbn.clone();
        self.book_detail = Some(book);
        self.spawn(async move { BackgroundResult::BookDetail(books.detail(&isbn).await) });
    }

    pub fn close_book_detail(&mut self) {
        self.book_detail = None;
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub fn load_profile(&mut self) {
        self.profile_loading = true;
        let users = self.client.users.clone();
        self.spawn(async move { BackgroundResult::Profile(users.profile().await) });
    }

    /// Profile to show: the fetched one, or the session user meanwhile
    pub fn profile_user(&self) -> Option<&UserProfile> {
        self.profile.as_ref().or(self.session.user.as_ref())
    }

    // =========================================================================
    // Chat
    // =========================================================================

    pub fn toggle_chat(&mut self) {
        if !self.session.is_logged_in {
            return;
        }
        self.chat_open = !self.chat_open;
        self.focus = if self.chat_open { Focus::Chat } else { Focus::Main };
        if self.chat_open {
            self.load_chat_sessions();
        }
    }

    fn load_chat_sessions(&self) {
        let chat = self.client.chat.clone();
        self.spawn(async move { BackgroundResult::ChatSessions(chat.sessions().await) });
    }

    pub fn send_chat_message(&mut self) {
        let text = self.chat_input.trim().to_string();
        if text.is_empty() || self.chat_pending {
            return;
        }

        let user_id = self.session.user.as_ref().map_or(0, |u| u.user_id);
        let session_id = self
            .chat_session_id
            .get_or_insert_with(|| format!("{}-{}", user_id, Utc::now().timestamp_millis()))
            .clone();

        self.chat_messages.push(ChatMessage {
            content: text.clone(),
            role: MessageRole::User,
            timestamp: Utc::now().naive_utc(),
        });
        self.chat_input.clear();
        self.chat_pending = true;

        let chat = self.client.chat.clone();
        self.spawn(async move {
            let result = chat
                .send_message(&session_id, &text, None)
                .await
                .map_err(|e| e.user_message());
            BackgroundResult::ChatReply(result)
        });
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            results.push(result);
        }

        let any = !results.is_empty();
        for result in results {
            self.process_result(result);
        }
        if any {
            self.refresh_session();
        }
        self.sync_route();
        self.collect_garbage();
    }

    /// Sweep idle cache entries every `gc_interval`; each search keystroke
    /// leaves one behind
    fn collect_garbage(&mut self) {
        if self.last_gc.elapsed() < self.gc_interval {
            return;
        }
        self.last_gc = Instant::now();
        let removed = self.client.queries.collect_garbage();
        if removed > 0 {
            debug!(removed, "Dropped idle cache entries");
        }
    }

    fn process_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Hydrated(snapshot) => {
                info!(logged_in = snapshot.is_logged_in, "Session ready");
                let logged_in = snapshot.is_logged_in;
                self.session = snapshot;
                if logged_in && matches!(self.route, Route::Landing | Route::Login) {
                    self.routes.navigate(Route::Home);
                }
            }
            BackgroundResult::LoggedIn(Ok(user)) => {
                self.login.submitting = false;
                self.login.password.clear();
                self.status_message = Some(format!("Welcome, {}", user.full_name()));
                self.config.last_email = Some(self.login.email.trim().to_string());
                self.save_config();
            }
            BackgroundResult::LoggedIn(Err(message)) => {
                self.login.submitting = false;
                self.login.error = Some(message);
            }
            BackgroundResult::SignedUp(Ok(user)) => {
                self.login = LoginForm::new(user.email.clone());
                self.signup = SignupForm::default();
                self.status_message = Some("Account created. Please log in.".to_string());
            }
            BackgroundResult::SignedUp(Err(message)) => {
                self.signup.submitting = false;
                self.signup.error = Some(message);
            }
            BackgroundResult::Books { seq, state } => {
                if seq != self.books_seq {
                    debug!(seq, current = self.books_seq, "Dropping superseded books result");
                    return;
                }
                self.books_loading = false;
                match state {
                    QueryState::Success { data, .. } => {
                        self.books = data;
                    }
                    QueryState::Error { error, stale_data } => {
                        self.books_error = Some(error.user_message());
                        if let Some(data) = stale_data {
                            self.books = data;
                        }
                    }
                    QueryState::Idle => {}
                }
                if self.book_selection >= self.books.len() {
                    self.book_selection = self.books.len().saturating_sub(1);
                }
            }
            BackgroundResult::BookDetail(state) => {
                if let QueryState::Error { error, .. } = &state {
                    self.status_message = Some(error.user_message());
                }
                if let Some(book) = state.into_data() {
                    let still_open = self
                        .book_detail
                        .as_ref()
                        .is_some_and(|open| open.book_isbn == book.book_isbn);
                    if still_open {
                        self.book_detail = Some(book);
                    }
                }
            }
            BackgroundResult::CurrentUser(state) => {
                if let Some(user) = state.into_data() {
                    if self.session.is_logged_in {
                        self.current_user = Some(user);
                    }
                }
            }
            BackgroundResult::Profile(state) => {
                self.profile_loading = false;
                if let Some(err) = state.error() {
                    self.status_message = Some(err.user_message());
                }
                if let Some(profile) = state.into_data() {
                    self.profile = Some(profile);
                }
            }
            BackgroundResult::ChatReply(result) => {
                self.chat_pending = false;
                let message = match result {
                    Ok(reply) => {
                        // The session list was invalidated by the send
                        self.load_chat_sessions();
                        ChatMessage {
                            content: reply.assistant_response,
                            role: MessageRole::Assistant,
                            timestamp: reply.timestamp,
                        }
                    }
                    Err(message) => ChatMessage {
                        content: message,
                        role: MessageRole::System,
                        timestamp: Utc::now().naive_utc(),
                    },
                };
                self.chat_messages.push(message);
            }
            BackgroundResult::ChatSessions(state) => {
                if let Some(sessions) = state.into_data() {
                    self.chat_sessions = sessions;
                }
            }
        }
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(error = %e, path = %path.display(), "Failed to save config");
        }
    }

    /// Drop in-memory state before exit; the stored token survives
    pub fn shutdown(&mut self) {
        self.client.shutdown();
        self.state = AppState::Quitting;
    }
}

/// A rejected login gets one fixed message; anything else says what failed
fn login_error_message(error: &ApiError) -> String {
    if error.is_unauthorized() {
        "Invalid credentials".to_string()
    } else {
        error.user_message()
    }
}

// ============================================================================
// Tests
// ============================================================================
