//! Shared application state for request handlers.

use database::redis::ConnectionManager;

/// Cloned per handler; all members are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables.
    pub config: crate::config::Config,
    /// Redis connection manager (backs the review job producer).
    pub redis: ConnectionManager,
}
