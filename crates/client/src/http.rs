use futures::FutureExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::backend::{
    BackendConfig, BoxFuture, BuildClientSnafu, ChatBackend, ChatResult, MalformedResponseSnafu,
    NetworkSnafu, ServerStatusSnafu,
};
use crate::model::{ChatRequest, ChatResponse, HealthStatus, SessionHistory};

/// Longest error body kept in [`crate::ChatError::ServerStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// [`ChatBackend`] speaking JSON over HTTP with reqwest.
pub struct HttpChatBackend {
    config: BackendConfig,
    client: Client,
}

impl HttpChatBackend {
    pub fn new(config: BackendConfig) -> ChatResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context(BuildClientSnafu {
                stage: "http-backend-new",
            })?;

        Ok(Self { config, client })
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        url: &str,
        stage: &'static str,
    ) -> ChatResult<T> {
        let status = response.status();
        let payload = response.text().await.context(NetworkSnafu {
            stage,
            url: url.to_string(),
        })?;

        if !status.is_success() {
            return ServerStatusSnafu {
                stage,
                status: status.as_u16(),
                body: truncate_body(&payload),
            }
            .fail();
        }

        serde_json::from_str(&payload).context(MalformedResponseSnafu { stage })
    }

    async fn post_chat(&self, request: ChatRequest) -> ChatResult<ChatResponse> {
        let url = self.config.chat_url();
        tracing::debug!(
            url = %url,
            has_session = request.session_id.is_some(),
            message_chars = request.message.chars().count(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context(NetworkSnafu {
                stage: "send-chat-request",
                url: url.clone(),
            })?;

        Self::read_json(response, &url, "read-chat-response").await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        stage: &'static str,
    ) -> ChatResult<T> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context(NetworkSnafu {
                stage,
                url: url.clone(),
            })?;

        Self::read_json(response, &url, stage).await
    }
}

impl ChatBackend for HttpChatBackend {
    fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn send_chat<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ChatResult<ChatResponse>> {
        self.post_chat(request).boxed()
    }

    fn health<'a>(&'a self) -> BoxFuture<'a, ChatResult<HealthStatus>> {
        self.get_json(self.config.health_url(), "health-check").boxed()
    }

    fn session_history<'a>(
        &'a self,
        session_id: &'a str,
    ) -> BoxFuture<'a, ChatResult<SessionHistory>> {
        self.get_json(self.config.history_url(session_id), "session-history")
            .boxed()
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }

    let mut truncated = body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();
    truncated.push('…');
    truncated
}
