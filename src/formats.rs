//! File formats and the table of supported conversions

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{Error, unknown_format_error};

/// A file format known to the toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    Csv,
    Xlsx,
    Txt,
    Json,
    Docx,
    Pdf,
    Png,
    Jpg,
    Jpeg,
    Gif,
    Tiff,
    Bmp,
    /// Container for split image output, never a source
    Zip,
}

impl Format {
    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Xlsx => "xlsx",
            Format::Txt => "txt",
            Format::Json => "json",
            Format::Docx => "docx",
            Format::Pdf => "pdf",
            Format::Png => "png",
            Format::Jpg => "jpg",
            Format::Jpeg => "jpeg",
            Format::Gif => "gif",
            Format::Tiff => "tiff",
            Format::Bmp => "bmp",
            Format::Zip => "zip",
        }
    }

    /// Whether the format is a raster image
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            Format::Png | Format::Jpg | Format::Jpeg | Format::Gif | Format::Tiff | Format::Bmp
        )
    }

    /// Short upper-case label used in menus
    pub fn label(&self) -> String {
        self.extension().to_uppercase()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "csv" => Ok(Format::Csv),
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(Format::Xlsx),
            "txt" | "text" => Ok(Format::Txt),
            "json" | "ndjson" | "jsonl" => Ok(Format::Json),
            "docx" | "doc" => Ok(Format::Docx),
            "pdf" => Ok(Format::Pdf),
            "png" | "image" | "img" => Ok(Format::Png),
            "jpg" => Ok(Format::Jpg),
            "jpeg" => Ok(Format::Jpeg),
            "gif" => Ok(Format::Gif),
            "tiff" | "tif" => Ok(Format::Tiff),
            "bmp" => Ok(Format::Bmp),
            "zip" => Ok(Format::Zip),
            _ => Err(unknown_format_error(s)),
        }
    }
}

/// What a conversion produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Format(Format),
    /// Plain text recognised by OCR from every PDF page
    TxtOcr,
}

impl Target {
    /// Extension of the default output file
    pub fn extension(&self) -> &'static str {
        match self {
            Target::Format(format) => format.extension(),
            Target::TxtOcr => "txt",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Format(format) => write!(f, "{format}"),
            Target::TxtOcr => f.write_str("txt ocr"),
        }
    }
}

impl From<Format> for Target {
    fn from(format: Format) -> Self {
        Target::Format(format)
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "txt ocr" | "txt-ocr" | "txt_ocr" | "ocr" => Ok(Target::TxtOcr),
            _ => Format::from_str(&normalized).map(Target::Format),
        }
    }
}

/// One numbered line of the interactive target menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub key: String,
    pub label: String,
    pub target: Target,
}

/// Infer the format of a file from its extension
///
/// Returns `None` for names without a dot and for unknown extensions.
pub fn infer_format(path: &Path) -> Option<Format> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| Format::from_str(ext).ok())
        .filter(|format| *format != Format::Zip)
}

const CSV_TARGETS: &[Target] = &[
    Target::Format(Format::Pdf),
    Target::Format(Format::Txt),
    Target::Format(Format::Png),
    Target::Format(Format::Docx),
    Target::Format(Format::Xlsx),
    Target::Format(Format::Json),
];

const XLSX_TARGETS: &[Target] = &[
    Target::Format(Format::Csv),
    Target::Format(Format::Pdf),
    Target::Format(Format::Txt),
    Target::Format(Format::Docx),
    Target::Format(Format::Json),
    Target::Format(Format::Png),
];

const TXT_TARGETS: &[Target] = &[
    Target::Format(Format::Csv),
    Target::Format(Format::Pdf),
    Target::Format(Format::Docx),
    Target::Format(Format::Json),
    Target::Format(Format::Xlsx),
    Target::Format(Format::Png),
];

const JSON_TARGETS: &[Target] = &[
    Target::Format(Format::Csv),
    Target::Format(Format::Txt),
    Target::Format(Format::Xlsx),
    Target::Format(Format::Docx),
    Target::Format(Format::Pdf),
    Target::Format(Format::Png),
];

const DOCX_TARGETS: &[Target] = &[
    Target::Format(Format::Txt),
    Target::Format(Format::Pdf),
    Target::Format(Format::Xlsx),
    Target::Format(Format::Csv),
    Target::Format(Format::Json),
    Target::Format(Format::Png),
];

const PDF_TARGETS: &[Target] = &[
    Target::Format(Format::Txt),
    Target::Format(Format::Docx),
    Target::Format(Format::Png),
    Target::Format(Format::Csv),
    Target::Format(Format::Xlsx),
    Target::Format(Format::Json),
    Target::TxtOcr,
];

const PNG_TARGETS: &[Target] = &[
    Target::Format(Format::Jpg),
    Target::Format(Format::Jpeg),
    Target::Format(Format::Txt),
];

const JPG_TARGETS: &[Target] = &[
    Target::Format(Format::Png),
    Target::Format(Format::Jpeg),
    Target::Format(Format::Txt),
];

const JPEG_TARGETS: &[Target] = &[
    Target::Format(Format::Png),
    Target::Format(Format::Jpg),
    Target::Format(Format::Txt),
];

const GIF_TARGETS: &[Target] = &[Target::Format(Format::Png), Target::Format(Format::Txt)];

const OCR_ONLY_TARGETS: &[Target] = &[Target::Format(Format::Txt)];

/// Every source format in menu order
pub const SOURCE_FORMATS: &[Format] = &[
    Format::Csv,
    Format::Xlsx,
    Format::Txt,
    Format::Json,
    Format::Docx,
    Format::Pdf,
    Format::Png,
    Format::Jpg,
    Format::Jpeg,
    Format::Gif,
    Format::Tiff,
    Format::Bmp,
];

/// Targets a source format can be converted to, in menu order
pub fn supported_targets(source: Format) -> &'static [Target] {
    match source {
        Format::Csv => CSV_TARGETS,
        Format::Xlsx => XLSX_TARGETS,
        Format::Txt => TXT_TARGETS,
        Format::Json => JSON_TARGETS,
        Format::Docx => DOCX_TARGETS,
        Format::Pdf => PDF_TARGETS,
        Format::Png => PNG_TARGETS,
        Format::Jpg => JPG_TARGETS,
        Format::Jpeg => JPEG_TARGETS,
        Format::Gif => GIF_TARGETS,
        Format::Tiff | Format::Bmp => OCR_ONLY_TARGETS,
        Format::Zip => &[],
    }
}

/// Whether a source/target pair has a converter
pub fn is_supported(source: Format, target: Target) -> bool {
    supported_targets(source).contains(&target)
}

/// Numbered menu entries for a source format
pub fn menu_entries(source: Format) -> Vec<MenuEntry> {
    supported_targets(source)
        .iter()
        .enumerate()
        .map(|(index, target)| MenuEntry {
            key: (index + 1).to_string(),
            label: menu_label(source, *target),
            target: *target,
        })
        .collect()
}

fn menu_label(source: Format, target: Target) -> String {
    match target {
        Target::TxtOcr => format!("{} → TXT OCR", source.label()),
        Target::Format(Format::Png) if !source.is_image() => {
            format!("{} → PNG (image)", source.label())
        }
        Target::Format(Format::Txt) if source.is_image() => {
            format!("{} → TXT (OCR)", source.label())
        }
        Target::Format(format) => format!("{} → {}", source.label(), format.label()),
    }
}
