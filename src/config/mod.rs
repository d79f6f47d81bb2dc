//! Configuration module
//!
//! This module contains components for loading and validating settings.

mod loader;
mod model;

pub use loader::{load_or_default, load_settings, save_settings, settings_path};
pub use model::{
    CleanupSettings, CsvSettings, ImageSettings, OcrSettings, PdfSettings, Settings,
    TranslateSettings,
};
