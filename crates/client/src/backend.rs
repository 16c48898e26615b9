use std::time::Duration;

pub use futures::future::BoxFuture;
use snafu::Snafu;

use crate::model::{ChatRequest, ChatResponse, HealthStatus, SessionHistory};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const CHAT_PATH: &str = "/api/chat";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}{CHAT_PATH}", self.base_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}{HEALTH_PATH}", self.base_url)
    }

    /// The session id is pushed as one escaped path segment.
    pub fn history_url(&self, session_id: &str) -> String {
        let Ok(mut url) = reqwest::Url::parse(&self.base_url) else {
            // Unparsable bases fail again at request time with a network error.
            return format!("{}/api/session/{session_id}/history", self.base_url);
        };

        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "session", session_id, "history"]);
        }
        url.to_string()
    }

    /// Port the backend is expected on, falling back to the stock port when
    /// the base URL cannot be parsed.
    pub fn port(&self) -> u16 {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.port_or_known_default())
            .unwrap_or(DEFAULT_PORT)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Every way a chat exchange can fail.
///
/// The widget shows one apology for all of them; the variants exist for
/// logging and for callers that want to tell failures apart.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ChatError {
    #[snafu(display("failed to build http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("request to {url} failed on `{stage}`: {source}"))]
    Network {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("backend returned status {status} on `{stage}`: {body}"))]
    ServerStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("backend response could not be parsed on `{stage}`: {source}"))]
    MalformedResponse {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("request task failed on `{stage}`: {message}"))]
    TaskJoin {
        stage: &'static str,
        message: String,
    },
}

impl ChatError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::BuildClient { stage, .. }
            | Self::Network { stage, .. }
            | Self::ServerStatus { stage, .. }
            | Self::MalformedResponse { stage, .. }
            | Self::TaskJoin { stage, .. } => stage,
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::ServerStatus { status, .. } => *status >= 500 || *status == 429,
            Self::BuildClient { .. } | Self::MalformedResponse { .. } | Self::TaskJoin { .. } => {
                false
            }
        }
    }
}

/// Remote Career Companion service as seen by the widget.
pub trait ChatBackend: Send + Sync {
    fn config(&self) -> &BackendConfig;
    fn send_chat<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ChatResult<ChatResponse>>;
    fn health<'a>(&'a self) -> BoxFuture<'a, ChatResult<HealthStatus>>;
    fn session_history<'a>(
        &'a self,
        session_id: &'a str,
    ) -> BoxFuture<'a, ChatResult<SessionHistory>>;
}
