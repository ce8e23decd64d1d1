use crate::adapters::http::ensure_success;
use crate::domain::model::{PostedMessage, UploadRequest, UploadSession};
use crate::domain::ports::{FileUploader, Notifier};
use crate::utils::error::{LunchError, Result};
use crate::utils::retry::LinearBackoff;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "slack";

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
    ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    upload_url: String,
    #[serde(default)]
    file_id: String,
}

#[derive(Debug, Serialize)]
struct CompleteUploadRequest<'a> {
    files: Vec<CompleteUploadFile<'a>>,
    channel_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CompleteUploadFile<'a> {
    id: &'a str,
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompleteUploadResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    #[serde(default)]
    id: String,
}

/// Slack Web API client: `chat.postMessage` and the external upload flow.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: Client,
    api_base: String,
    token: String,
    backoff: LinearBackoff,
}

impl SlackClient {
    pub fn new(client: Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            backoff: LinearBackoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: LinearBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Phase 1: `files.getUploadURLExternal`.
    pub async fn request_upload_slot(&self, filename: &str, length: usize) -> Result<UploadSession> {
        let slot_error = |message: String| LunchError::UploadSlotError { message };

        let length = length.to_string();
        let response = self
            .client
            .post(self.method_url("files.getUploadURLExternal"))
            .bearer_auth(&self.token)
            .form(&[("filename", filename), ("length", length.as_str())])
            .send()
            .await
            .map_err(|e| slot_error(e.to_string()))?;

        let response = ensure_success(SERVICE, response)
            .await
            .map_err(|e| slot_error(e.to_string()))?;
        let body: UploadUrlResponse = response.json().await.map_err(|e| slot_error(e.to_string()))?;

        if !body.ok {
            return Err(slot_error(body.error.unwrap_or_else(|| "unknown error".to_string())));
        }
        if body.upload_url.is_empty() || body.file_id.is_empty() {
            return Err(slot_error("missing upload_url or file_id".to_string()));
        }

        tracing::debug!("Got upload URL for file {}", body.file_id);
        Ok(UploadSession {
            upload_url: body.upload_url,
            file_id: body.file_id,
        })
    }

    async fn put_once(&self, session: &UploadSession, data: &[u8]) -> Result<()> {
        let response = self
            .client
            .put(&session.upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            // Vec body 會帶上精確的 Content-Length
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| LunchError::TransientNetworkError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LunchError::TransientNetworkError {
                message: format!("upload PUT failed: {}", status),
            });
        }
        Ok(())
    }

    /// Phase 2: PUT the bytes to the presigned URL, retrying any failure.
    pub async fn transfer(&self, session: &UploadSession, data: &[u8]) -> Result<()> {
        self.backoff
            .run(move |attempt| {
                tracing::debug!("Upload PUT attempt {}/{}", attempt, self.backoff.max_attempts);
                self.put_once(session, data)
            })
            .await
            .map_err(|(attempts, last)| LunchError::UploadTransferError {
                attempts,
                message: last.to_string(),
            })
    }

    /// Phase 3: `files.completeUploadExternal`; returns the final file id.
    pub async fn complete_upload(
        &self,
        session: &UploadSession,
        title: &str,
        channel_id: &str,
        thread_ts: Option<&str>,
    ) -> Result<String> {
        let finalize_error = |message: String| LunchError::UploadFinalizeError { message };

        let request = CompleteUploadRequest {
            files: vec![CompleteUploadFile {
                id: &session.file_id,
                title,
            }],
            channel_id,
            thread_ts,
        };

        let response = self
            .client
            .post(self.method_url("files.completeUploadExternal"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| finalize_error(e.to_string()))?;

        let response = ensure_success(SERVICE, response)
            .await
            .map_err(|e| finalize_error(e.to_string()))?;
        let body: CompleteUploadResponse = response.json().await.map_err(|e| finalize_error(e.to_string()))?;

        if !body.ok {
            return Err(finalize_error(body.error.unwrap_or_else(|| "unknown error".to_string())));
        }

        body.files
            .into_iter()
            .map(|f| f.id)
            .find(|id| !id.is_empty())
            .ok_or_else(|| finalize_error("upload completed but no file id returned".to_string()))
    }
}

#[async_trait]
impl Notifier for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage> {
        let response = self
            .client
            .post(self.method_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&PostMessageRequest {
                channel,
                text,
                thread_ts,
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: PostMessageResponse = ensure_success(SERVICE, response).await?.json().await?;
        if !body.ok {
            return Err(LunchError::api(
                SERVICE,
                status,
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(PostedMessage { ts: body.ts })
    }
}

#[async_trait]
impl FileUploader for SlackClient {
    async fn upload(&self, request: UploadRequest) -> Result<String> {
        if request.data.is_empty() {
            return Err(LunchError::UploadSlotError {
                message: "no data provided".to_string(),
            });
        }

        let session = self.request_upload_slot(&request.filename, request.data.len()).await?;
        self.transfer(&session, &request.data).await?;
        self.complete_upload(
            &session,
            &request.title,
            &request.channel_id,
            request.thread_ts.as_deref(),
        )
        .await
    }
}
