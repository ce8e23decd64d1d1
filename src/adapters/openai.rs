use crate::adapters::http::{ensure_success, error_message_from_body};
use crate::domain::model::ChatMessage;
use crate::domain::ports::{ImageGenerator, TextGenerator};
use crate::utils::error::{LunchError, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completion and image-generation client for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    token: String,
    image_model: String,
    image_size: String,
}

impl OpenAiClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        image_model: impl Into<String>,
        image_size: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            image_model: image_model.into(),
            image_size: image_size.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        tracing::debug!("Requesting chat completion ({} message(s), model {})", messages.len(), model);

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.token)
            .json(&ChatCompletionRequest { model, messages })
            .send()
            .await?;

        let body: ChatCompletionResponse = ensure_success(SERVICE, response).await?.json().await?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LunchError::api(SERVICE, 200, "no choices in response"))
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        tracing::debug!("Requesting image ({}, {})", self.image_model, self.image_size);

        let response = self
            .client
            .post(self.endpoint("images/generations"))
            .bearer_auth(&self.token)
            .json(&ImageRequest {
                model: &self.image_model,
                prompt,
                n: 1,
                size: &self.image_size,
                response_format: "b64_json",
            })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // 錯誤時 body 也帶有 error 欄位，先嘗試解析
        let body: ImageResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                let message = error_message_from_body(&text).unwrap_or(text);
                return Err(LunchError::api(SERVICE, status.as_u16(), message));
            }
            Err(e) => return Err(LunchError::SerializationError(e)),
        };

        if let Some(error) = body.error {
            return Err(LunchError::api(SERVICE, status.as_u16(), error.message));
        }
        if !status.is_success() {
            return Err(LunchError::api(SERVICE, status.as_u16(), "image request failed"));
        }

        let encoded = body
            .data
            .into_iter()
            .next()
            .map(|d| d.b64_json)
            .filter(|b64| !b64.is_empty())
            .ok_or_else(|| LunchError::api(SERVICE, status.as_u16(), "no image returned"))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| LunchError::api(SERVICE, status.as_u16(), format!("decode b64: {}", e)))
    }
}
