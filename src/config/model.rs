//! Configuration data structures
//!
//! This module contains the data structures for the YAML settings file.
//! Every field has a default, so an empty or partial file is valid.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DELETE_AFTER_SECS, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG,
    DEFAULT_TRANSLATE_ENDPOINT, TRANSLATE_CHUNK_CHARS,
};

/// Settings for the file toolkit
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Layout of text rendered into PDF pages
    pub pdf: PdfSettings,
    /// Layout of text rendered into images
    pub image: ImageSettings,
    /// Delimiter handling for delimited text
    pub csv: CsvSettings,
    /// OCR defaults
    pub ocr: OcrSettings,
    /// Translation service settings
    pub translate: TranslateSettings,
    /// Scheduled removal of produced files
    pub cleanup: CleanupSettings,
    /// Extra directories searched for TrueType fonts
    pub font_dirs: Vec<PathBuf>,
    /// Explicit paths for external programs, keyed by program name
    pub tools: BTreeMap<String, PathBuf>,
}

/// PDF text layout, in points
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PdfSettings {
    pub margin: f32,
    /// Font size for tabular output
    pub table_font_size: f32,
    /// Line gap for tabular output
    pub table_line_gap: f32,
    /// Font size for plain text output
    pub text_font_size: f32,
    /// Line gap for plain text output
    pub text_line_gap: f32,
    /// Font size used for DOCX runs, in points
    pub docx_font_size: f32,
}

impl Default for PdfSettings {
    fn default() -> Self {
        PdfSettings {
            margin: 40.0,
            table_font_size: 10.0,
            table_line_gap: 14.0,
            text_font_size: 12.0,
            text_line_gap: 16.0,
            docx_font_size: 11.0,
        }
    }
}

/// Raster text layout, in pixels
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImageSettings {
    /// Width of images rendered from tables and JSON
    pub width: u32,
    pub margin: u32,
    pub font_size: f32,
    pub line_height: u32,
    /// Table rows per image in split mode
    pub lines_per_image: usize,
    /// Width of images rendered from plain text
    pub text_width: u32,
    /// Page height of images rendered from plain text
    pub text_page_height: u32,
    pub text_font_size: f32,
    /// Text lines per image in split mode
    pub text_lines_per_image: usize,
    /// Resolution used when rasterising PDF pages
    pub dpi: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        ImageSettings {
            width: 1200,
            margin: 40,
            font_size: 12.0,
            line_height: 18,
            lines_per_image: 60,
            text_width: 1240,
            text_page_height: 1754,
            text_font_size: 24.0,
            text_lines_per_image: 70,
            dpi: 150,
        }
    }
}

/// Delimited text settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CsvSettings {
    /// Delimiter written by CSV → TXT and read by TXT → CSV
    pub text_delimiter: char,
    /// Sniff the delimiter of TXT input instead of assuming `text_delimiter`
    pub auto_detect: bool,
    /// Also write an XLSX copy next to CSV output
    pub xlsx_copy: bool,
}

impl Default for CsvSettings {
    fn default() -> Self {
        CsvSettings {
            text_delimiter: '\t',
            auto_detect: false,
            xlsx_copy: false,
        }
    }
}

/// OCR settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OcrSettings {
    /// Language codes such as `en,hi`, or `auto`
    pub lang: String,
    /// Resolution used when rasterising PDF pages for OCR
    pub dpi: u32,
    /// Apply median filtering and contrast boost before OCR
    pub strong_preprocess: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        OcrSettings {
            lang: "auto".to_string(),
            dpi: 300,
            strong_preprocess: false,
        }
    }
}

/// Translation settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TranslateSettings {
    pub source: String,
    pub target: String,
    pub endpoint: String,
    /// Maximum characters per request
    pub chunk_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TranslateSettings {
    fn default() -> Self {
        TranslateSettings {
            source: DEFAULT_SOURCE_LANG.to_string(),
            target: DEFAULT_TARGET_LANG.to_string(),
            endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            chunk_size: TRANSLATE_CHUNK_CHARS,
            timeout_secs: 30,
        }
    }
}

/// Scheduled removal of produced files
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CleanupSettings {
    /// Remove outputs automatically after `delete_after_secs`
    pub enabled: bool,
    pub delete_after_secs: u64,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        CleanupSettings {
            enabled: false,
            delete_after_secs: DEFAULT_DELETE_AFTER_SECS,
        }
    }
}

impl Settings {
    /// Validates the settings
    ///
    /// # Errors
    /// Returns an error with a helpful message if a size is zero or a
    /// required string is empty
    pub fn validate(&self) -> Result<()> {
        if self.pdf.table_font_size <= 0.0 || self.pdf.text_font_size <= 0.0 {
            return Err(anyhow!("PDF font sizes must be greater than zero."));
        }
        if self.pdf.table_line_gap <= 0.0 || self.pdf.text_line_gap <= 0.0 {
            return Err(anyhow!("PDF line gaps must be greater than zero."));
        }
        if self.image.width <= 2 * self.image.margin || self.image.text_width <= 2 * self.image.margin {
            return Err(anyhow!(
                "Image width must be larger than twice the margin ({}px).",
                self.image.margin
            ));
        }
        if self.image.line_height == 0 || self.image.font_size <= 0.0 || self.image.text_font_size <= 0.0 {
            return Err(anyhow!("Image font size and line height must be greater than zero."));
        }
        if self.image.lines_per_image == 0 || self.image.text_lines_per_image == 0 {
            return Err(anyhow!("Lines per image must be greater than zero."));
        }
        if self.image.dpi == 0 || self.ocr.dpi == 0 {
            return Err(anyhow!("DPI must be greater than zero."));
        }
        if self.translate.chunk_size == 0 {
            return Err(anyhow!("Translation chunk size must be greater than zero."));
        }
        if self.translate.endpoint.trim().is_empty() {
            return Err(anyhow!("Translation endpoint cannot be empty."));
        }
        if self.ocr.lang.trim().is_empty() {
            return Err(anyhow!("OCR language cannot be empty. Use `auto` to detect it."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.pdf.margin, 40.0);
        assert_eq!(settings.image.lines_per_image, 60);
        assert_eq!(settings.translate.chunk_size, 4000);
        assert_eq!(settings.cleanup.delete_after_secs, 300);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings: Settings = serde_yaml::from_str("image:\n  width: 800\n").unwrap();
        assert_eq!(settings.image.width, 800);
        // Fields that were not given keep their defaults
        assert_eq!(settings.image.margin, 40);
        assert_eq!(settings.ocr.lang, "auto");
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let mut settings = Settings::default();
        settings.translate.chunk_size = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("chunk size"));
    }
}
