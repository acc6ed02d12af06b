//! Delivery of alert and digest text

use crate::NotifierError;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the webhook URL
pub const WEBHOOK_URL_VAR: &str = "NOTIFIER_WEBHOOK_URL";
/// Environment variable holding an optional bearer token
pub const TOKEN_VAR: &str = "NOTIFIER_TOKEN";

/// A publishing channel for alerts and digests.
///
/// Posting is best-effort: callers log failures and move on.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str {
        "UnnamedNotifier"
    }

    async fn post(&self, text: &str, image: Option<&[u8]>) -> Result<(), NotifierError>;
}

/// Credential material for the webhook notifier
#[derive(Clone, Debug)]
pub struct WebhookCredentials {
    pub url: String,
    pub token: Option<String>,
}

impl WebhookCredentials {
    /// Read credentials from the environment
    pub fn from_env() -> Result<Self, NotifierError> {
        let url = std::env::var(WEBHOOK_URL_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| NotifierError::MissingCredential(WEBHOOK_URL_VAR.to_string()))?;
        let token = std::env::var(TOKEN_VAR).ok().filter(|v| !v.trim().is_empty());
        Ok(Self { url, token })
    }
}

/// Posts messages to an HTTP webhook.
///
/// Text-only messages are sent as `{"content": text}` JSON; messages with an
/// image are sent as a multipart form with `content` and `file` parts.
pub struct WebhookNotifier {
    client: reqwest::Client,
    credentials: WebhookCredentials,
}

impl WebhookNotifier {
    pub fn new(credentials: WebhookCredentials, timeout: Duration) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "WebhookNotifier"
    }

    async fn post(&self, text: &str, image: Option<&[u8]>) -> Result<(), NotifierError> {
        let mut request = self.client.post(&self.credentials.url);
        if let Some(token) = &self.credentials.token {
            request = request.bearer_auth(token);
        }

        request = match image {
            Some(bytes) => {
                let file = Part::bytes(bytes.to_vec())
                    .file_name("digest.svg")
                    .mime_str("image/svg+xml")?;
                request.multipart(Form::new().text("content", text.to_string()).part("file", file))
            }
            None => request.json(&serde_json::json!({ "content": text })),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Rejected(status.as_u16()));
        }

        debug!("Webhook accepted message ({} bytes)", text.len());
        Ok(())
    }
}
