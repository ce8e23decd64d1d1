// Application layer: wires the validated configuration into a ready-to-run pipeline.

use crate::adapters::http::build_client;
use crate::adapters::menu_page::HttpMenuSource;
use crate::adapters::openai::OpenAiClient;
use crate::adapters::slack::SlackClient;
use crate::adapters::webhook::WebhookNotifier;
use crate::config::{AppConfig, DeliveryConfig};
use crate::core::pipeline::LunchPipeline;
use crate::utils::error::Result;
use crate::utils::retry::LinearBackoff;
use std::time::Duration;

pub fn build_pipeline(config: &AppConfig) -> Result<LunchPipeline> {
    let client = build_client(config.timeout)?;

    let menu = HttpMenuSource::new(client.clone(), config.menu_url.clone(), config.menu_layout());

    let openai = config.openai_token.as_ref().map(|token| {
        let openai = &config.settings.openai;
        OpenAiClient::new(
            client.clone(),
            openai.base_url.clone(),
            token.clone(),
            openai.image_model.clone(),
            openai.image_size.clone(),
        )
    });

    let mut pipeline = match &config.delivery {
        DeliveryConfig::Chat { token, .. } => {
            let slack_settings = &config.settings.slack;
            let slack = SlackClient::new(client.clone(), slack_settings.api_base_url.clone(), token.clone())
                .with_backoff(LinearBackoff::new(
                    slack_settings.upload_attempts,
                    Duration::from_millis(slack_settings.upload_backoff_ms),
                ));
            LunchPipeline::new(config.pipeline_options(), Box::new(menu), Box::new(slack.clone()))
                .with_uploader(Box::new(slack))
        }
        DeliveryConfig::Webhook { url } => LunchPipeline::new(
            config.pipeline_options(),
            Box::new(menu),
            Box::new(WebhookNotifier::new(client.clone(), url.clone())),
        ),
    };

    if let Some(openai) = openai {
        if config.describe {
            pipeline = pipeline.with_writer(Box::new(openai.clone()));
        }
        if config.generate_image {
            pipeline = pipeline.with_painter(Box::new(openai));
        }
    }

    Ok(pipeline)
}
