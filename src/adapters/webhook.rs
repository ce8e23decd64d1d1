use crate::adapters::http::ensure_success;
use crate::domain::model::PostedMessage;
use crate::domain::ports::Notifier;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Incoming-webhook notifier. The channel is fixed by the webhook and no
/// message ts comes back, so thread replies are not possible.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn post_message(
        &self,
        _channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage> {
        if thread_ts.is_some() {
            tracing::warn!("⚠️ Webhook delivery cannot reply in threads; posting top-level");
        }

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        ensure_success("slack webhook", response).await?;

        Ok(PostedMessage::default())
    }
}
