use crate::domain::calendar;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 目標日期的德文表示，例如 "Donnerstag, 20. Juli"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDate {
    pub date: NaiveDate,
    pub weekday_de: &'static str,
    pub weekday_en: &'static str,
    pub day: u32,
    pub month_de: &'static str,
}

impl MenuDate {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            weekday_de: calendar::german_weekday(date.weekday()),
            weekday_en: calendar::english_weekday(date.weekday()),
            day: date.day(),
            month_de: calendar::german_month(date.month()),
        }
    }

    pub fn today() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub fn label(&self) -> String {
        format!("{}, {}. {}", self.weekday_de, self.day, self.month_de)
    }
}

/// One calendar day's raw menu text and the dish extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDay {
    pub label: String,
    pub block: String,
    pub lunch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Presigned upload target; valid for a single upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_url: String,
    pub file_id: String,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub title: String,
    pub data: Vec<u8>,
    pub channel_id: String,
    pub thread_ts: Option<String>,
}

/// 發送結果；Webhook 不會回傳 ts，因此無法開討論串
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedMessage {
    pub ts: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Describe,
    PostText,
    GenerateImage,
    Upload,
    PostImage,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Describe => "describe",
            Stage::PostText => "post-text",
            Stage::GenerateImage => "generate-image",
            Stage::Upload => "upload",
            Stage::PostImage => "post-image",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub date_label: String,
    pub lunch: String,
    pub description: Option<String>,
    pub message_ts: Option<String>,
    pub file_id: Option<String>,
    pub completed: Vec<Stage>,
}
