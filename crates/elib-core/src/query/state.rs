use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiError;

/// Default number of extra attempts after a failed read
pub const DEFAULT_RETRY: u32 = 1;

/// Pause between read attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Per-query behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a successful result counts as fresh. Zero means every
    /// fetch goes back to the server.
    pub stale_time: Duration,
    pub retry: u32,
    pub retry_delay: Duration,
    /// Disabled queries never run and report `Idle`
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retry: DEFAULT_RETRY,
            retry_delay: DEFAULT_RETRY_DELAY,
            enabled: true,
        }
    }
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// What a query currently has to show.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Disabled; nothing was fetched
    Idle,
    Success {
        data: T,
        is_stale: bool,
    },
    /// The last fetch failed. Data from an earlier success is kept around.
    Error {
        error: Arc<ApiError>,
        stale_data: Option<T>,
    },
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        QueryState::Idle
    }
}

impl<T> QueryState<T> {
    /// Best data available, fresh or not
    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success { data, .. } => Some(data),
            QueryState::Error { stale_data, .. } => stale_data.as_ref(),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            QueryState::Success { data, .. } => Some(data),
            QueryState::Error { stale_data, .. } => stale_data,
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Error { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, QueryState::Idle)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryState::Success { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Success { data, is_stale } => QueryState::Success {
                data: f(data),
                is_stale,
            },
            QueryState::Error { error, stale_data } => QueryState::Error {
                error,
                stale_data: stale_data.map(f),
            },
        }
    }
}
