use clap::Parser;
use lunchbot::app::build_pipeline;
use lunchbot::domain::model::MenuDate;
use lunchbot::utils::error::ErrorSeverity;
use lunchbot::utils::logger;
use lunchbot::{AppConfig, CliConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting lunchbot");

    // 驗證配置（只做一次）
    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let date = config.date.map(MenuDate::from_date).unwrap_or_else(MenuDate::today);
    let pipeline = build_pipeline(&config)?;
    if cli.verbose {
        let options = pipeline.options();
        tracing::debug!(
            "Delivery: {}, describe: {}, image: {}, threads: {}",
            config.delivery.kind(),
            options.describe,
            options.generate_image,
            options.threaded_replies
        );
    }

    match pipeline.run(&date).await {
        Ok(report) => {
            tracing::info!(
                "✅ Successfully sent menu to Slack ({}: {}, stages: {})",
                report.date_label,
                report.lunch,
                report
                    .completed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" → ")
            );
            if let Some(file_id) = &report.file_id {
                tracing::info!("🖼️ Image file: {}", file_id);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Lunch run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0, // 今天沒有午餐
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(exit_code);
            }
            tracing::info!("Today there seems to be no lunch; nothing posted");
        }
    }

    Ok(())
}
