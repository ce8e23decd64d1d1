use thiserror::Error;

#[derive(Error, Debug)]
pub enum LunchError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{service} returned an error (status {status}): {message}")]
    ApiResponseError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Not found: {message}")]
    NotFoundError { message: String },

    #[error("Upload slot could not be acquired: {message}")]
    UploadSlotError { message: String },

    #[error("Upload transfer failed after {attempts} attempt(s): {message}")]
    UploadTransferError { attempts: u32, message: String },

    #[error("Upload could not be finalized: {message}")]
    UploadFinalizeError { message: String },

    #[error("Transient network error: {message}")]
    TransientNetworkError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    NotFound,
    Api,
    Upload,
    Network,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LunchError {
    pub fn api(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        LunchError::ApiResponseError {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LunchError::NotFoundError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LunchError::ConfigError { .. }
            | LunchError::MissingConfigError { .. }
            | LunchError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LunchError::NotFoundError { .. } => ErrorCategory::NotFound,
            LunchError::ApiError(_) | LunchError::ApiResponseError { .. } => ErrorCategory::Api,
            LunchError::UploadSlotError { .. }
            | LunchError::UploadTransferError { .. }
            | LunchError::UploadFinalizeError { .. } => ErrorCategory::Upload,
            LunchError::TransientNetworkError { .. } => ErrorCategory::Network,
            LunchError::IoError(_) | LunchError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 今天沒有菜單不算失敗
            ErrorCategory::NotFound => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Api | ErrorCategory::Upload => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LunchError::MissingConfigError { .. } => {
                "Set the missing environment variable or pass the matching command-line flag"
            }
            LunchError::InvalidConfigValueError { .. } | LunchError::ConfigError { .. } => {
                "Check the configuration values and the settings file"
            }
            LunchError::NotFoundError { .. } => {
                "The cafeteria may be closed today, or the page layout changed; check the menu page"
            }
            LunchError::ApiError(_) | LunchError::TransientNetworkError { .. } => {
                "Check the network connection and try again"
            }
            LunchError::ApiResponseError { status, .. } if *status == 401 || *status == 403 => {
                "Check that the API tokens are valid and carry the required scopes"
            }
            LunchError::ApiResponseError { .. } => "Inspect the API response and retry later",
            LunchError::UploadSlotError { .. } => {
                "Check that the Slack token has the files:write scope"
            }
            LunchError::UploadTransferError { .. } => {
                "The presigned upload URL was unreachable; retry the run"
            }
            LunchError::UploadFinalizeError { .. } => {
                "Check that the bot is a member of the target channel"
            }
            LunchError::IoError(_) | LunchError::SerializationError(_) => {
                "This is likely a bug; rerun with --verbose and report the log"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::NotFound => format!("No lunch today: {}", self),
            ErrorCategory::Api => format!("A remote service failed: {}", self),
            ErrorCategory::Upload => format!("Image upload failed: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LunchError>;
