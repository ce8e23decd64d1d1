use crate::domain::model::{ChatMessage, MenuDate, MenuDay, PostedMessage, UploadRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_menu(&self, date: &MenuDate) -> Result<MenuDay>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage>;
}

#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Uploads `request.data` and returns the final file id.
    async fn upload(&self, request: UploadRequest) -> Result<String>;
}
