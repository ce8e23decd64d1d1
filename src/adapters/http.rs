use crate::utils::error::{LunchError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("lunchbot/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// 非 2xx 回應轉成 ApiResponseError，盡量帶上回應內容
pub async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body).unwrap_or_else(|| {
        if body.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body
        }
    });
    Err(LunchError::api(service, status.as_u16(), message))
}

/// Pulls `error.message` (OpenAI) or a plain `error` string (Slack) out of a JSON body.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    match error {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}
