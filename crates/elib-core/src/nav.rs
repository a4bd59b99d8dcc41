//! Page routing shared by the HTTP pipeline and the view layer.
//!
//! The pipeline only ever needs two things from navigation: where the user
//! is right now, and a way to send them to the login page.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Home,
    Books,
    Profile,
}

/// Where a 401 sends the user
pub const LOGIN_ROUTE: Route = Route::Login;

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Home => "/home",
            Route::Books => "/books",
            Route::Profile => "/profile",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Landing),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/home" => Some(Route::Home),
            "/books" => Some(Route::Books),
            "/profile" => Some(Route::Profile),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Landing => "Welcome",
            Route::Login => "Login",
            Route::Signup => "Sign up",
            Route::Home => "Home",
            Route::Books => "Books",
            Route::Profile => "My Profile",
        }
    }

    /// Pages that only make sense with a signed-in user
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Home | Route::Books | Route::Profile)
    }
}

pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    fn navigate(&self, route: Route);
}

/// Production navigator: a watch channel so any task can redirect and the
/// UI loop can pick the change up on its next tick.
#[derive(Clone)]
pub struct RouteState {
    tx: Arc<watch::Sender<Route>>,
}

impl RouteState {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }
}

impl Default for RouteState {
    fn default() -> Self {
        Self::new(Route::Landing)
    }
}

impl Navigator for RouteState {
    fn current(&self) -> Route {
        *self.tx.borrow()
    }

    fn navigate(&self, route: Route) {
        debug!(to = route.path(), "Navigate");
        self.tx.send_replace(route);
    }
}
