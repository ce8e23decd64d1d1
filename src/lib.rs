pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{AppConfig, CliConfig};
pub use core::pipeline::{LunchPipeline, PipelineOptions};
pub use utils::error::{LunchError, Result};
