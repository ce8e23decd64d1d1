pub mod html;
pub mod menu;
pub mod pipeline;

pub use crate::domain::model::{MenuDate, MenuDay, RunReport, Stage};
pub use crate::domain::ports::{FileUploader, ImageGenerator, MenuSource, Notifier, TextGenerator};
pub use crate::utils::error::Result;
