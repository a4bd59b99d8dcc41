//! Who is logged in right now.
//!
//! `SessionContext` is created once at startup, shared as
//! `Arc<SessionContext>` and torn down on exit. Its lifecycle:
//!
//! ```text
//! Unknown --hydrate--> Hydrating --ok--> Authenticated
//!                                \--err--> Anonymous
//! Authenticated --logout--> Anonymous --login--> Authenticated
//! ```
//!
//! The token itself always lives in the [`TokenStore`]; the session only
//! remembers the user it belongs to.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::models::UserProfile;

use super::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unknown,
    Hydrating,
    Authenticated,
    Anonymous,
}

/// Point-in-time view of the session for the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub is_logged_in: bool,
    pub is_loading: bool,
}

struct SessionState {
    phase: SessionPhase,
    user: Option<UserProfile>,
}

pub struct SessionContext {
    tokens: Arc<dyn TokenStore>,
    auth: AuthApi,
    state: RwLock<SessionState>,
}

impl SessionContext {
    pub fn new(tokens: Arc<dyn TokenStore>, auth: AuthApi) -> Self {
        Self {
            tokens,
            auth,
            state: RwLock::new(SessionState {
                phase: SessionPhase::Unknown,
                user: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Rebuild the session from a stored token. Runs once; later calls just
    /// report the current state.
    pub async fn hydrate(&self) -> SessionSnapshot {
        {
            let mut state = self.write();
            if state.phase != SessionPhase::Unknown {
                drop(state);
                return self.snapshot();
            }
            state.phase = SessionPhase::Hydrating;
        }

        let token = match self.tokens.get() {
            Some(token) => token,
            None => {
                debug!("No stored token, starting anonymous");
                self.finish_hydration(None);
                return self.snapshot();
            }
        };

        match self.auth.current_user_with_token(&token).await {
            Ok(user) => {
                info!(user_id = user.user_id, "Session restored from stored token");
                self.finish_hydration(Some(user));
            }
            Err(e) => {
                // Expired or revoked tokens land here; fall back quietly.
                debug!(error = %e, "Stored token rejected, starting anonymous");
                if self.tokens.get().as_deref() == Some(token.as_str()) {
                    if let Err(e) = self.tokens.remove() {
                        warn!(error = %e, "Failed to remove rejected token");
                    }
                }
                self.finish_hydration(None);
            }
        }

        self.snapshot()
    }

    fn finish_hydration(&self, user: Option<UserProfile>) {
        let mut state = self.write();
        // A login or logout during hydration takes precedence
        if state.phase != SessionPhase::Hydrating {
            return;
        }
        state.phase = if user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        };
        state.user = user;
    }

    /// Record a completed login. The network handshake happens before this.
    pub fn login(&self, user: UserProfile, token: &str) -> Result<()> {
        self.tokens.save(token)?;
        let mut state = self.write();
        info!(user_id = user.user_id, "Logged in");
        state.user = Some(user);
        state.phase = SessionPhase::Authenticated;
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        {
            let mut state = self.write();
            state.user = None;
            state.phase = SessionPhase::Anonymous;
        }
        info!("Logged out");
        self.tokens.remove()
    }

    /// Current state. If the token vanished from the store (a 401 elsewhere),
    /// the remembered user is dropped as well.
    pub fn snapshot(&self) -> SessionSnapshot {
        let token = self.tokens.get();
        let mut state = self.write();

        if token.is_none() && state.phase == SessionPhase::Authenticated {
            info!("Credential cleared elsewhere, session ended");
            state.user = None;
            state.phase = SessionPhase::Anonymous;
        }

        let user = state.user.clone();
        SessionSnapshot {
            phase: state.phase,
            is_logged_in: user.is_some() && token.is_some(),
            is_loading: matches!(state.phase, SessionPhase::Unknown | SessionPhase::Hydrating),
            user,
            token,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.snapshot().is_logged_in
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.snapshot().user
    }

    pub fn phase(&self) -> SessionPhase {
        self.read().phase
    }

    /// Forget the in-memory session without touching the stored token.
    pub fn teardown(&self) {
        let mut state = self.write();
        state.user = None;
        state.phase = SessionPhase::Unknown;
        debug!("Session torn down");
    }
}
