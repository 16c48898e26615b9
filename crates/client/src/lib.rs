#![deny(unsafe_code)]

//! HTTP client for the Career Companion placement-officer service.

use std::sync::Arc;

mod backend;
mod http;
mod model;

pub use backend::{
    BackendConfig, BoxFuture, CHAT_PATH, ChatBackend, ChatError, ChatResult, DEFAULT_BASE_URL,
    DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, HEALTH_PATH,
};
pub use http::HttpChatBackend;
pub use model::{
    ChatRequest, ChatResponse, HealthStatus, HistoryEntry, SessionHistory, StudentProfile,
    UserContext,
};

/// Builds the default HTTP backend behind a shared trait object.
pub fn create_backend(config: BackendConfig) -> ChatResult<Arc<dyn ChatBackend>> {
    Ok(Arc::new(HttpChatBackend::new(config)?))
}
