use crate::config::settings::PromptSettings;
use crate::domain::model::{
    ChatMessage, MenuDate, MenuDay, PostedMessage, RunReport, Stage, UploadRequest,
};
use crate::domain::ports::{FileUploader, ImageGenerator, MenuSource, Notifier, TextGenerator};
use crate::utils::error::{ErrorCategory, LunchError, Result};

/// Feature flags and per-run parameters for [`LunchPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub describe: bool,
    pub generate_image: bool,
    pub threaded_replies: bool,
    pub channel_id: String,
    pub chat_model: String,
    pub image_filename: String,
    pub image_title: String,
    pub prompts: PromptSettings,
}

/// Fetch → Describe → PostText → GenerateImage → Upload → PostImage → Done.
///
/// Stages run strictly in order. The first failing stage ends the run and its
/// error is returned; messages already posted stay posted.
pub struct LunchPipeline {
    options: PipelineOptions,
    menu: Box<dyn MenuSource>,
    notifier: Box<dyn Notifier>,
    writer: Option<Box<dyn TextGenerator>>,
    painter: Option<Box<dyn ImageGenerator>>,
    uploader: Option<Box<dyn FileUploader>>,
}

impl LunchPipeline {
    pub fn new(
        options: PipelineOptions,
        menu: Box<dyn MenuSource>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            options,
            menu,
            notifier,
            writer: None,
            painter: None,
            uploader: None,
        }
    }

    pub fn with_writer(mut self, writer: Box<dyn TextGenerator>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_painter(mut self, painter: Box<dyn ImageGenerator>) -> Self {
        self.painter = Some(painter);
        self
    }

    pub fn with_uploader(mut self, uploader: Box<dyn FileUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub async fn fetch(&self, date: &MenuDate) -> Result<MenuDay> {
        self.menu.fetch_menu(date).await
    }

    /// `None` when describing is disabled or no text generator is configured.
    pub async fn describe(&self, day: &MenuDay) -> Result<Option<String>> {
        let Some(writer) = self.writer.as_ref().filter(|_| self.options.describe) else {
            return Ok(None);
        };

        let prompts = &self.options.prompts;
        let mut messages = Vec::new();
        if let Some(system) = &prompts.system {
            messages.push(ChatMessage::system(PromptSettings::render(system, &day.lunch, &day.label)));
        }
        messages.push(ChatMessage::user(PromptSettings::render(
            &prompts.describe,
            &day.lunch,
            &day.label,
        )));

        let description = writer.complete(&self.options.chat_model, &messages).await?;
        tracing::debug!("📝 Description: {}", description);
        Ok(Some(description))
    }

    /// Posts the menu message. With threaded replies the description becomes the
    /// first reply, otherwise it is appended to the message itself.
    pub async fn post_text(&self, day: &MenuDay, description: Option<&str>) -> Result<PostedMessage> {
        let channel = &self.options.channel_id;
        let mut text = PromptSettings::render(&self.options.prompts.menu_message, &day.lunch, &day.label);

        if let (Some(description), false) = (description, self.options.threaded_replies) {
            text.push_str("\n\n");
            text.push_str(description);
        }

        let posted = self.notifier.post_message(channel, &text, None).await?;
        tracing::info!("💬 Menu posted (ts: {})", posted.ts.as_deref().unwrap_or("-"));

        if let (Some(description), true) = (description, self.options.threaded_replies) {
            match posted.ts.as_deref() {
                Some(ts) => {
                    self.notifier.post_message(channel, description, Some(ts)).await?;
                }
                None => {
                    tracing::warn!("⚠️ Notifier returned no ts; posting description without thread");
                    self.notifier.post_message(channel, description, None).await?;
                }
            }
        }

        Ok(posted)
    }

    fn image_enabled(&self) -> bool {
        if !self.options.generate_image {
            return false;
        }
        if self.painter.is_none() || self.uploader.is_none() {
            tracing::warn!("⚠️ Image generation requested but no image client or uploader is configured; skipping");
            return false;
        }
        true
    }

    pub async fn generate_image(&self, day: &MenuDay) -> Result<Option<Vec<u8>>> {
        let Some(painter) = self.painter.as_ref() else {
            return Ok(None);
        };
        let prompt = PromptSettings::render(&self.options.prompts.image, &day.lunch, &day.label);
        let image = painter.generate_image(&prompt).await?;
        tracing::info!("🎨 Generated image ({} bytes)", image.len());
        Ok(Some(image))
    }

    pub async fn upload(&self, image: Vec<u8>, thread_ts: Option<&str>) -> Result<Option<String>> {
        let Some(uploader) = self.uploader.as_ref() else {
            return Ok(None);
        };
        let request = UploadRequest {
            filename: self.options.image_filename.clone(),
            title: self.options.image_title.clone(),
            data: image,
            channel_id: self.options.channel_id.clone(),
            thread_ts: thread_ts.map(str::to_string),
        };
        let file_id = uploader.upload(request).await?;
        tracing::info!("📤 Uploaded image as {}", file_id);
        Ok(Some(file_id))
    }

    /// Threaded caption under the menu message; nothing to do outside a thread.
    pub async fn post_image(&self, day: &MenuDay, thread_ts: Option<&str>) -> Result<Option<PostedMessage>> {
        let Some(ts) = thread_ts else {
            return Ok(None);
        };
        let caption = PromptSettings::render(&self.options.prompts.image_caption, &day.lunch, &day.label);
        let posted = self
            .notifier
            .post_message(&self.options.channel_id, &caption, Some(ts))
            .await?;
        Ok(Some(posted))
    }

    pub async fn run(&self, date: &MenuDate) -> Result<RunReport> {
        let mut report = RunReport {
            date_label: date.label(),
            ..Default::default()
        };

        tracing::info!("🔎 Checking menu for {}", report.date_label);
        let day = self.fetch(date).await.map_err(|e| stage_failed(Stage::Fetch, e))?;
        tracing::info!("🍽️ Today's lunch: {}", day.lunch);
        report.lunch = day.lunch.clone();
        report.completed.push(Stage::Fetch);

        let description = self.describe(&day).await.map_err(|e| stage_failed(Stage::Describe, e))?;
        if description.is_some() {
            report.completed.push(Stage::Describe);
        }
        report.description = description;

        let posted = self
            .post_text(&day, report.description.as_deref())
            .await
            .map_err(|e| stage_failed(Stage::PostText, e))?;
        report.message_ts = posted.ts;
        report.completed.push(Stage::PostText);

        if self.image_enabled() {
            let thread_ts = report
                .message_ts
                .clone()
                .filter(|_| self.options.threaded_replies);

            let image = self
                .generate_image(&day)
                .await
                .map_err(|e| stage_failed(Stage::GenerateImage, e))?;
            report.completed.push(Stage::GenerateImage);

            if let Some(image) = image {
                report.file_id = self
                    .upload(image, thread_ts.as_deref())
                    .await
                    .map_err(|e| stage_failed(Stage::Upload, e))?;
                report.completed.push(Stage::Upload);

                let caption = self
                    .post_image(&day, thread_ts.as_deref())
                    .await
                    .map_err(|e| stage_failed(Stage::PostImage, e))?;
                if caption.is_some() {
                    report.completed.push(Stage::PostImage);
                }
            }
        }

        report.completed.push(Stage::Done);
        Ok(report)
    }
}

fn stage_failed(stage: Stage, e: LunchError) -> LunchError {
    if e.category() == ErrorCategory::NotFound {
        tracing::warn!("🤷 Stage '{}' found nothing: {}", stage, e);
    } else {
        tracing::error!("❌ Stage '{}' failed, skipping remaining stages: {}", stage, e);
    }
    e
}
