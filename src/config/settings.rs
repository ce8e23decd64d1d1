use crate::core::menu::MenuLayout;
use crate::utils::error::{LunchError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 可選的 TOML 設定檔；所有欄位都有預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub menu: MenuSettings,
    pub openai: OpenAiSettings,
    pub slack: SlackSettings,
    pub prompts: PromptSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuSettings {
    pub container_class: String,
    pub block_class: String,
    pub day_separator: String,
    pub start_marker: String,
    pub end_marker: String,
}

impl Default for MenuSettings {
    fn default() -> Self {
        let layout = MenuLayout::default();
        Self {
            container_class: layout.container_class,
            block_class: layout.block_class,
            day_separator: layout.day_separator,
            start_marker: layout.start_marker,
            end_marker: layout.end_marker,
        }
    }
}

impl MenuSettings {
    pub fn layout(&self) -> MenuLayout {
        MenuLayout {
            container_class: self.container_class.clone(),
            block_class: self.block_class.clone(),
            day_separator: self.day_separator.clone(),
            start_marker: self.start_marker.clone(),
            end_marker: self.end_marker.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub image_size: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4.1".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackSettings {
    pub api_base_url: String,
    pub channel_id: Option<String>,
    pub image_filename: String,
    pub image_title: String,
    pub upload_attempts: u32,
    pub upload_backoff_ms: u64,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://slack.com/api".to_string(),
            channel_id: None,
            image_filename: "todays-lunch.png".to_string(),
            image_title: "Today’s lunch image".to_string(),
            upload_attempts: 3,
            upload_backoff_ms: 500,
        }
    }
}

/// Message and prompt templates. `{lunch}` and `{date}` are substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub menu_message: String,
    pub system: Option<String>,
    pub describe: String,
    pub image: String,
    pub image_caption: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            menu_message: "🍽️ Heute Mittag ({date}): {lunch}".to_string(),
            system: None,
            describe: "Heute Mittag gibt es {lunch} zu essen. Ich kann mir leider nichts darunter vorstellen. Bitte beschreibe mir dieses Gericht. Bitte verzichte auf Höflichkeitsformen in deiner Antwort wie z.B. Gerne!".to_string(),
            image: "Generiere ein Bild von {lunch}".to_string(),
            image_caption: "🖼️ So könnte {lunch} aussehen".to_string(),
        }
    }
}

impl PromptSettings {
    pub fn render(template: &str, lunch: &str, date_label: &str) -> String {
        template.replace("{lunch}", lunch).replace("{date}", date_label)
    }
}

impl Settings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LunchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LunchError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SLACK_CHANNEL_ID})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("openai.base_url", &self.openai.base_url)?;
        validate_url("slack.api_base_url", &self.slack.api_base_url)?;
        validate_non_empty_string("openai.chat_model", &self.openai.chat_model)?;
        validate_non_empty_string("openai.image_model", &self.openai.image_model)?;
        validate_non_empty_string("menu.block_class", &self.menu.block_class)?;
        validate_non_empty_string("menu.day_separator", &self.menu.day_separator)?;
        validate_non_empty_string("menu.start_marker", &self.menu.start_marker)?;
        validate_non_empty_string("menu.end_marker", &self.menu.end_marker)?;
        validate_non_empty_string("slack.image_filename", &self.slack.image_filename)?;
        crate::utils::validation::validate_range("slack.upload_attempts", self.slack.upload_attempts, 1, 10)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::from_toml_str("").unwrap();

        assert_eq!(settings.openai.chat_model, "gpt-4.1");
        assert_eq!(settings.openai.image_model, "dall-e-3");
        assert_eq!(settings.slack.upload_attempts, 3);
        assert_eq!(settings.menu.layout(), MenuLayout::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let toml_content = r#"
[menu]
start_marker = "Mittagessen"

[openai]
chat_model = "gpt-4o-mini"

[prompts]
image = "Ein Foto von {lunch} auf einem Kantinentablett"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();

        assert_eq!(settings.menu.start_marker, "Mittagessen");
        assert_eq!(settings.menu.end_marker, "Dessert");
        assert_eq!(settings.openai.chat_model, "gpt-4o-mini");
        assert_eq!(settings.openai.image_size, "1024x1024");
        assert_eq!(
            PromptSettings::render(&settings.prompts.image, "Bò Kho", "Donnerstag, 20. Juli"),
            "Ein Foto von Bò Kho auf einem Kantinentablett"
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LUNCHBOT_TEST_CHANNEL", "C0TESTCHAN");

        let toml_content = r#"
[slack]
channel_id = "${LUNCHBOT_TEST_CHANNEL}"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.slack.channel_id.as_deref(), Some("C0TESTCHAN"));

        std::env::remove_var("LUNCHBOT_TEST_CHANNEL");
    }

    #[test]
    fn test_settings_validation() {
        let toml_content = r#"
[openai]
base_url = "not a url"
"#;
        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Settings::from_toml_str("[menu\nstart_marker = 1").unwrap_err();
        assert!(matches!(err, LunchError::ConfigError { .. }));
    }

    #[test]
    fn test_settings_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[slack]\nimage_filename = \"mittag.png\"\n")
            .unwrap();

        let settings = Settings::from_file(temp_file.path()).unwrap();
        assert_eq!(settings.slack.image_filename, "mittag.png");
    }

    #[test]
    fn test_render_date_placeholder() {
        let text = PromptSettings::render(
            &PromptSettings::default().menu_message,
            "Bò Kho",
            "Donnerstag, 20. Juli",
        );
        assert_eq!(text, "🍽️ Heute Mittag (Donnerstag, 20. Juli): Bò Kho");
    }
}
