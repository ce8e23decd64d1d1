pub mod settings;

use crate::core::menu::MenuLayout;
use crate::core::pipeline::PipelineOptions;
use crate::utils::error::Result;
use crate::utils::validation::{require_non_empty, validate_range, validate_url, Validate};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use self::settings::Settings;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Delivery {
    /// chat.postMessage with a bot token (threads and image uploads)
    Chat,
    /// Incoming webhook (text only)
    Webhook,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "lunchbot")]
#[command(about = "Posts today's cafeteria lunch to Slack")]
pub struct CliConfig {
    /// Date to look up (YYYY-MM-DD); defaults to today
    pub date: Option<NaiveDate>,

    #[arg(long, env = "MENU_URL")]
    pub menu_url: Option<String>,

    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub slack_token: Option<String>,

    #[arg(long, env = "OPENAI_TOKEN", hide_env_values = true)]
    pub openai_token: Option<String>,

    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub channel_id: Option<String>,

    #[arg(long, value_enum, default_value = "chat")]
    pub delivery: Delivery,

    #[arg(long, help = "Do not ask the language model to describe the dish")]
    pub no_description: bool,

    #[arg(long, help = "Do not generate and upload an image")]
    pub no_image: bool,

    #[arg(long, help = "Post everything top-level instead of in a thread")]
    pub no_thread: bool,

    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    #[arg(long, env = "LUNCHBOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_range("timeout_secs", self.timeout_secs, 1, 600)?;
        if let Some(url) = &self.menu_url {
            validate_url("MENU_URL", url)?;
        }
        if let Some(url) = self.webhook_url.as_deref().filter(|u| !u.is_empty()) {
            validate_url("SLACK_WEBHOOK_URL", url)?;
        }
        Ok(())
    }
}

/// Delivery target resolved from the CLI/environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryConfig {
    Chat { token: String, channel_id: String },
    Webhook { url: String },
}

impl DeliveryConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryConfig::Chat { .. } => "chat",
            DeliveryConfig::Webhook { .. } => "webhook",
        }
    }
}

/// Validated once at startup and handed to every component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub date: Option<NaiveDate>,
    pub menu_url: String,
    pub delivery: DeliveryConfig,
    pub openai_token: Option<String>,
    pub describe: bool,
    pub generate_image: bool,
    pub threaded_replies: bool,
    pub timeout: Duration,
    pub settings: Settings,
}

impl AppConfig {
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        cli.validate()?;

        let settings = match &cli.config {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Settings::from_file(path)?
            }
            None => Settings::default(),
        };
        settings.validate()?;

        Self::from_parts(cli, settings)
    }

    pub fn from_parts(cli: &CliConfig, settings: Settings) -> Result<Self> {
        let menu_url = require_non_empty("MENU_URL", &cli.menu_url)?;
        validate_url("MENU_URL", &menu_url)?;

        let delivery = match cli.delivery {
            Delivery::Chat => {
                let token = require_non_empty("SLACK_TOKEN", &cli.slack_token)?;
                let channel = cli.channel_id.clone().or_else(|| settings.slack.channel_id.clone());
                let channel_id = require_non_empty("SLACK_CHANNEL_ID", &channel)?;
                DeliveryConfig::Chat { token, channel_id }
            }
            Delivery::Webhook => {
                let url = require_non_empty("SLACK_WEBHOOK_URL", &cli.webhook_url)?;
                validate_url("SLACK_WEBHOOK_URL", &url)?;
                DeliveryConfig::Webhook { url }
            }
        };

        let is_chat = matches!(delivery, DeliveryConfig::Chat { .. });
        let describe = !cli.no_description;
        // 圖片上傳需要 bot token，Webhook 模式下關閉
        let generate_image = !cli.no_image && is_chat;
        if !cli.no_image && !is_chat {
            tracing::info!("Image generation disabled: webhook delivery cannot upload files");
        }

        let openai_token = if describe || generate_image {
            Some(require_non_empty("OPENAI_TOKEN", &cli.openai_token)?)
        } else {
            cli.openai_token.clone().filter(|t| !t.trim().is_empty())
        };

        Ok(Self {
            date: cli.date,
            menu_url,
            delivery,
            openai_token,
            describe,
            generate_image,
            threaded_replies: !cli.no_thread && is_chat,
            timeout: Duration::from_secs(cli.timeout_secs),
            settings,
        })
    }

    pub fn menu_layout(&self) -> MenuLayout {
        self.settings.menu.layout()
    }

    pub fn channel_id(&self) -> &str {
        match &self.delivery {
            DeliveryConfig::Chat { channel_id, .. } => channel_id,
            DeliveryConfig::Webhook { .. } => "",
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            describe: self.describe,
            generate_image: self.generate_image,
            threaded_replies: self.threaded_replies,
            channel_id: self.channel_id().to_string(),
            chat_model: self.settings.openai.chat_model.clone(),
            image_filename: self.settings.slack.image_filename.clone(),
            image_title: self.settings.slack.image_title.clone(),
            prompts: self.settings.prompts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::LunchError;
    use std::sync::{Mutex, MutexGuard};

    const ENV_FALLBACKS: [&str; 6] = [
        "MENU_URL",
        "SLACK_WEBHOOK_URL",
        "SLACK_TOKEN",
        "OPENAI_TOKEN",
        "SLACK_CHANNEL_ID",
        "LUNCHBOT_CONFIG",
    ];

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 只看命令列參數，不受本機已匯出的環境變數影響
    fn parse_args_only(args: &[&str]) -> CliConfig {
        for var in ENV_FALLBACKS {
            std::env::remove_var(var);
        }
        let mut argv = vec!["lunchbot"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    fn parse(args: &[&str]) -> CliConfig {
        let _guard = env_lock();
        parse_args_only(args)
    }

    fn full_chat_args() -> Vec<&'static str> {
        vec![
            "--menu-url",
            "https://kantine.example.com/speiseplan",
            "--slack-token",
            "xoxb-1",
            "--openai-token",
            "sk-1",
            "--channel-id",
            "C0LUNCH",
        ]
    }

    #[test]
    fn test_chat_config() {
        let cli = parse(&full_chat_args());
        let config = AppConfig::from_parts(&cli, Settings::default()).unwrap();

        assert_eq!(
            config.delivery,
            DeliveryConfig::Chat {
                token: "xoxb-1".to_string(),
                channel_id: "C0LUNCH".to_string()
            }
        );
        assert!(config.describe && config.generate_image && config.threaded_replies);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.pipeline_options().channel_id, "C0LUNCH");
    }

    #[test]
    fn test_date_argument() {
        let mut args = vec!["2023-07-20"];
        args.extend(full_chat_args());
        let cli = parse(&args);
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2023, 7, 20));
    }

    #[test]
    fn test_invalid_date_argument_is_rejected() {
        assert!(CliConfig::try_parse_from(["lunchbot", "20.07.2023"]).is_err());
    }

    #[test]
    fn test_missing_menu_url() {
        let cli = parse(&["--slack-token", "xoxb-1", "--channel-id", "C1", "--openai-token", "sk"]);
        let err = AppConfig::from_parts(&cli, Settings::default()).unwrap_err();
        assert!(matches!(err, LunchError::MissingConfigError { field } if field == "MENU_URL"));
    }

    #[test]
    fn test_missing_openai_token_when_describing() {
        let cli = parse(&[
            "--menu-url",
            "https://kantine.example.com",
            "--slack-token",
            "xoxb-1",
            "--channel-id",
            "C1",
        ]);
        let err = AppConfig::from_parts(&cli, Settings::default()).unwrap_err();
        assert!(matches!(err, LunchError::MissingConfigError { field } if field == "OPENAI_TOKEN"));
    }

    #[test]
    fn test_openai_token_optional_without_ai_features() {
        let cli = parse(&[
            "--menu-url",
            "https://kantine.example.com",
            "--slack-token",
            "xoxb-1",
            "--channel-id",
            "C1",
            "--no-description",
            "--no-image",
        ]);
        let config = AppConfig::from_parts(&cli, Settings::default()).unwrap();
        assert!(config.openai_token.is_none());
    }

    #[test]
    fn test_webhook_delivery_disables_threads_and_images() {
        let cli = parse(&[
            "--menu-url",
            "https://kantine.example.com",
            "--delivery",
            "webhook",
            "--webhook-url",
            "https://hooks.slack.com/services/T/B/X",
            "--openai-token",
            "sk-1",
        ]);
        let config = AppConfig::from_parts(&cli, Settings::default()).unwrap();

        assert!(matches!(config.delivery, DeliveryConfig::Webhook { .. }));
        assert!(!config.generate_image);
        assert!(!config.threaded_replies);
        assert!(config.describe);
    }

    #[test]
    fn test_channel_from_settings() {
        let cli = parse(&[
            "--menu-url",
            "https://kantine.example.com",
            "--slack-token",
            "xoxb-1",
            "--openai-token",
            "sk-1",
        ]);
        let mut settings = Settings::default();
        settings.slack.channel_id = Some("C0FROMFILE".to_string());

        let config = AppConfig::from_parts(&cli, settings).unwrap();
        assert_eq!(config.channel_id(), "C0FROMFILE");
    }

    #[test]
    fn test_exported_env_does_not_fill_missing_fields() {
        let _guard = env_lock();
        std::env::set_var("MENU_URL", "https://kantine.example.com/speiseplan");
        std::env::set_var("OPENAI_TOKEN", "sk-from-env");

        let cli = parse_args_only(&["--slack-token", "xoxb-1", "--channel-id", "C1"]);

        assert_eq!(cli.menu_url, None);
        assert_eq!(cli.openai_token, None);
    }

    #[test]
    fn test_timeout_range() {
        let mut args = full_chat_args();
        args.extend(["--timeout-secs", "0"]);
        assert!(parse(&args).validate().is_err());
    }
}
