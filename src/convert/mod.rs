//! Converters and the table that dispatches to them
//!
//! Each source format has a module whose functions share the [`Converter`]
//! signature. Readers turn input into a [`Table`], text lines or a JSON value
//! and the writers in [`crate::render`] turn those into output files.

pub mod csv;
pub mod docx;
pub mod image;
pub mod json;
pub mod pdf;
pub mod txt;
pub mod xlsx;

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, info};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::cleanup::schedule_delete;
use crate::config::Settings;
use crate::constants::{EXCEL_UTF8_NOTICE, PDF_TABLE_CHUNK_CHARS};
use crate::errors::{
    Error, Result, generic_error, invalid_input_error, unsupported_conversion_error,
};
use crate::fonts::FontBook;
use crate::formats::{Format, SOURCE_FORMATS, Target, supported_targets};
use crate::render::Table;
use crate::render::pdf::TextPdf;
use crate::render::raster::{RasterLayout, write_images};
use crate::render::sheet::write_xlsx;
use crate::script::scan_scripts;
use crate::tools::Tools;
use crate::utils::{ensure_parent_dir, remove_partial_output};

/// How DOCX → PDF renders the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocxPdfMode {
    /// LibreOffice when available, otherwise the built-in text renderer
    #[default]
    Auto,
    /// Rasterise every page and rebuild the PDF from page images
    Image,
}

impl FromStr for DocxPdfMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(DocxPdfMode::Auto),
            "image" => Ok(DocxPdfMode::Image),
            other => Err(generic_error(&format!(
                "Unknown DOCX → PDF mode '{other}', expected 'auto' or 'image'"
            ))),
        }
    }
}

impl fmt::Display for DocxPdfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocxPdfMode::Auto => f.write_str("auto"),
            DocxPdfMode::Image => f.write_str("image"),
        }
    }
}

/// Knobs shared by every converter
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Delimiter for delimited text; `None` uses the per-format default
    pub delimiter: Option<char>,
    /// Sniff the delimiter of TXT input
    pub auto_delimiter: bool,
    /// Split long image output into pages; `None` asks on stdin
    pub split: Option<bool>,
    /// Merge multi-page image output into one image; `None` asks on stdin
    pub merge_pages: Option<bool>,
    /// Resolution for rasterising PDF pages
    pub dpi: u32,
    /// Overrides the configured font size of the output
    pub font_size: Option<f32>,
    /// OCR language codes or `auto`
    pub lang: String,
    pub strong_preprocess: bool,
    pub docx_mode: DocxPdfMode,
    /// Skip PDF pages without multi-column rows in PDF → CSV
    pub strict_tables: bool,
    /// Also write an XLSX copy next to CSV output
    pub xlsx_copy: bool,
    /// Sheet to read from a workbook; the first sheet when `None`
    pub sheet: Option<String>,
    /// Remove the outputs after this long
    pub delete_after: Option<Duration>,
    pub settings: Settings,
    pub tools: Tools,
}

impl ConversionOptions {
    /// Options with every default taken from the settings
    pub fn from_settings(settings: &Settings) -> ConversionOptions {
        ConversionOptions {
            delimiter: None,
            auto_delimiter: settings.csv.auto_detect,
            split: None,
            merge_pages: None,
            dpi: settings.image.dpi,
            font_size: None,
            lang: settings.ocr.lang.clone(),
            strong_preprocess: settings.ocr.strong_preprocess,
            docx_mode: DocxPdfMode::Auto,
            strict_tables: false,
            xlsx_copy: settings.csv.xlsx_copy,
            sheet: None,
            delete_after: settings
                .cleanup
                .enabled
                .then(|| Duration::from_secs(settings.cleanup.delete_after_secs)),
            settings: settings.clone(),
            tools: Tools::new(settings.tools.clone()),
        }
    }

    /// The split choice, asking on stdin when it was not given
    pub fn resolve_split(&self, lines: usize) -> bool {
        self.split.unwrap_or_else(|| {
            ask_yes_no(
                &format!("Output has {lines} lines. Split into multiple images?"),
                true,
            )
        })
    }

    /// The merge choice, asking on stdin when it was not given
    pub fn resolve_merge(&self, pages: usize) -> bool {
        self.merge_pages.unwrap_or_else(|| {
            ask_yes_no(
                &format!("Document has {pages} pages. Merge them into one image?"),
                false,
            )
        })
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions::from_settings(&Settings::default())
    }
}

/// What a conversion produced
#[derive(Debug, Default)]
pub struct ConversionOutput {
    /// The main artifact: a file, a zip of pages or a directory
    pub path: PathBuf,
    /// Secondary files such as an XLSX copy
    pub extras: Vec<PathBuf>,
    /// Rows, lines or pages written
    pub records: usize,
    /// Notices for the user
    pub notes: Vec<String>,
    /// Pending removals of the outputs; join them to wait for the deletion
    pub cleanup: Vec<JoinHandle<()>>,
}

impl ConversionOutput {
    pub fn new(path: PathBuf, records: usize) -> ConversionOutput {
        ConversionOutput {
            path,
            records,
            ..Default::default()
        }
    }
}

/// Signature shared by all converters
pub type Converter = fn(&Path, &Path, &ConversionOptions) -> Result<ConversionOutput>;

static CONVERTERS: Lazy<HashMap<(Format, Target), Converter>> = Lazy::new(|| {
    let mut table: HashMap<(Format, Target), Converter> = HashMap::new();
    let mut add = |source: Format, target: Format, converter: Converter| {
        table.insert((source, Target::Format(target)), converter);
    };

    add(Format::Csv, Format::Pdf, csv::to_pdf);
    add(Format::Csv, Format::Txt, csv::to_txt);
    add(Format::Csv, Format::Png, csv::to_png);
    add(Format::Csv, Format::Docx, csv::to_docx);
    add(Format::Csv, Format::Xlsx, csv::to_xlsx);
    add(Format::Csv, Format::Json, csv::to_json);

    add(Format::Xlsx, Format::Csv, xlsx::to_csv);
    add(Format::Xlsx, Format::Pdf, xlsx::to_pdf);
    add(Format::Xlsx, Format::Txt, xlsx::to_txt);
    add(Format::Xlsx, Format::Docx, xlsx::to_docx);
    add(Format::Xlsx, Format::Json, xlsx::to_json);
    add(Format::Xlsx, Format::Png, xlsx::to_png);

    add(Format::Txt, Format::Csv, txt::to_csv);
    add(Format::Txt, Format::Pdf, txt::to_pdf);
    add(Format::Txt, Format::Docx, txt::to_docx);
    add(Format::Txt, Format::Json, txt::to_json);
    add(Format::Txt, Format::Xlsx, txt::to_xlsx);
    add(Format::Txt, Format::Png, txt::to_png);

    add(Format::Json, Format::Csv, json::to_csv);
    add(Format::Json, Format::Txt, json::to_txt);
    add(Format::Json, Format::Xlsx, json::to_xlsx);
    add(Format::Json, Format::Docx, json::to_docx);
    add(Format::Json, Format::Pdf, json::to_pdf);
    add(Format::Json, Format::Png, json::to_png);

    add(Format::Docx, Format::Txt, docx::to_txt);
    add(Format::Docx, Format::Pdf, docx::to_pdf);
    add(Format::Docx, Format::Xlsx, docx::to_xlsx);
    add(Format::Docx, Format::Csv, docx::to_csv);
    add(Format::Docx, Format::Json, docx::to_json);
    add(Format::Docx, Format::Png, docx::to_png);

    add(Format::Pdf, Format::Txt, pdf::to_txt);
    add(Format::Pdf, Format::Docx, pdf::to_docx);
    add(Format::Pdf, Format::Png, pdf::to_png);
    add(Format::Pdf, Format::Csv, pdf::to_csv);
    add(Format::Pdf, Format::Xlsx, pdf::to_xlsx);
    add(Format::Pdf, Format::Json, pdf::to_json);
    table.insert((Format::Pdf, Target::TxtOcr), pdf::to_txt_ocr);

    for source in SOURCE_FORMATS.iter().filter(|format| format.is_image()) {
        for target in supported_targets(*source) {
            let converter: Converter = match target {
                Target::Format(Format::Txt) => image::to_txt,
                _ => image::convert_image,
            };
            table.insert((*source, *target), converter);
        }
    }
    table
});

/// Look up the converter for a pair
pub fn converter_for(source: Format, target: Target) -> Option<Converter> {
    CONVERTERS.get(&(source, target)).copied()
}

/// Input path with the extension of the target, e.g. `report.csv` → `report.xlsx`
pub fn default_output_path(input: &Path, target: Target) -> PathBuf {
    input.with_extension(target.extension())
}

/// Convert `input` into `output`
///
/// A failed conversion removes the output it left behind unless the file
/// existed before the run.
///
/// # Errors
/// Returns `UnsupportedConversion` for pairs without a converter, an input
/// error when the input is missing, and any error of the converter
pub fn run_conversion(
    source: Format,
    target: Target,
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ConversionOutput> {
    let converter = converter_for(source, target).ok_or_else(|| {
        unsupported_conversion_error(source.extension(), &target.to_string())
    })?;

    if !input.is_file() {
        return Err(invalid_input_error(input.to_path_buf(), "Input file not found"));
    }
    if input == output {
        return Err(invalid_input_error(
            input.to_path_buf(),
            "Output path is the same as the input",
        ));
    }
    ensure_parent_dir(output)?;

    let existed = output.exists();
    debug!("Converting {} ({}) → {} ({})", input.display(), source, output.display(), target);
    match converter(input, output, options) {
        Ok(mut result) => {
            info!(
                "Converted {} → {} ({} records)",
                input.display(),
                result.path.display(),
                result.records
            );
            if let Some(delay) = options.delete_after {
                let paths: Vec<PathBuf> = std::iter::once(&result.path)
                    .chain(result.extras.iter())
                    .cloned()
                    .collect();
                result.cleanup = paths
                    .into_iter()
                    .map(|path| schedule_delete(path, delay))
                    .collect();
                result
                    .notes
                    .push(format!("Output will be deleted in {}s", delay.as_secs()));
            }
            Ok(result)
        }
        Err(e) => {
            error!("Conversion of {} failed: {}", input.display(), e);
            if !existed {
                remove_partial_output(output);
            }
            Err(e)
        }
    }
}

/// Ask a yes/no question on stdin; EOF or a blank answer gives `default`
pub fn ask_yes_no(question: &str, default: bool) -> bool {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt_yes_no(&mut stdin.lock(), &mut stdout, question, default)
}

/// Ask a yes/no question on any reader and writer
pub fn prompt_yes_no<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    question: &str,
    default: bool,
) -> bool {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let _ = write!(writer, "{question} {hint}: ");
    let _ = writer.flush();

    let mut answer = String::new();
    match reader.read_line(&mut answer) {
        Ok(0) | Err(_) => default,
        Ok(_) => match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        },
    }
}

/// Serialise JSON with a custom indent, keeping non-ASCII text literal
pub(crate) fn to_pretty_json<T: Serialize>(value: &T, indent: usize) -> Result<String> {
    let indent = " ".repeat(indent);
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Render lines the way CSV and XLSX tables go to PDF
pub(crate) fn write_table_pdf(
    lines: &[String],
    output: &Path,
    options: &ConversionOptions,
) -> Result<ConversionOutput> {
    let pdf_settings = &options.settings.pdf;
    let font_size = options.font_size.unwrap_or(pdf_settings.table_font_size);
    let mut pdf = TextPdf::new(
        &title_of(output),
        pdf_settings.margin,
        font_size,
        pdf_settings.table_line_gap.max(font_size),
    );
    for line in lines {
        pdf.push_chunked(line, PDF_TABLE_CHUNK_CHARS);
    }
    let pages = pdf.save(output)?;
    debug!("Wrote {} lines on {} pages", lines.len(), pages);
    Ok(ConversionOutput::new(output.to_path_buf(), lines.len()))
}

/// Render text lines as PNG output
///
/// Up to `single_limit` lines always give one image. Longer output follows
/// the split choice.
pub(crate) fn write_line_images(
    lines: &[String],
    output: &Path,
    options: &ConversionOptions,
    layout: RasterLayout,
    lines_per_image: usize,
    single_limit: usize,
) -> Result<ConversionOutput> {
    let fonts = FontBook::load(&options.settings.font_dirs)?;
    let split = lines.len() > single_limit && options.resolve_split(lines.len());
    let rendered = write_images(lines, output, &layout, &fonts, lines_per_image, split)?;
    let mut result = ConversionOutput::new(rendered.path, lines.len());
    if split {
        result
            .notes
            .push(format!("{} images packed into a zip archive", rendered.images));
    }
    Ok(result)
}

/// Layout for tables and JSON rendered as images
pub(crate) fn table_layout(options: &ConversionOptions) -> RasterLayout {
    let image = &options.settings.image;
    let font_size = options.font_size.unwrap_or(image.font_size);
    RasterLayout {
        width: image.width,
        margin: image.margin,
        font_size,
        line_height: scaled_line_height(image.line_height, image.font_size, font_size),
        page_height: None,
    }
}

/// Layout for plain text rendered as page-sized images
pub(crate) fn text_layout(options: &ConversionOptions) -> RasterLayout {
    let image = &options.settings.image;
    let font_size = options.font_size.unwrap_or(image.text_font_size);
    RasterLayout {
        width: image.text_width,
        margin: image.margin,
        font_size,
        line_height: (font_size * 1.4).ceil() as u32,
        page_height: Some(image.text_page_height),
    }
}

fn scaled_line_height(configured: u32, configured_size: f32, size: f32) -> u32 {
    if configured_size <= 0.0 {
        return configured;
    }
    ((configured as f32) * size / configured_size).ceil().max(1.0) as u32
}

/// Write an XLSX copy next to CSV output when asked to
pub(crate) fn add_xlsx_copy(
    result: &mut ConversionOutput,
    table: &Table,
    options: &ConversionOptions,
) -> Result<()> {
    if !options.xlsx_copy {
        return Ok(());
    }
    let copy = result.path.with_extension("xlsx");
    write_xlsx(&copy, &[("Sheet1".to_string(), table.clone())], true)?;
    result.extras.push(copy);
    Ok(())
}

/// Add the Excel import hint when CSV output holds non-ASCII text
pub(crate) fn add_utf8_notice(result: &mut ConversionOutput, table: &Table) {
    let text = table
        .all_rows()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    let report = scan_scripts(&text);
    if report.has_non_ascii {
        result.notes.push(EXCEL_UTF8_NOTICE.to_string());
        result
            .notes
            .push(format!("Detected scripts: {}", report.names()));
    }
}

/// Document title from the output file name
pub(crate) fn title_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string())
}

/// Records of a JSON value: the items of an array, or the value itself
pub(crate) fn json_records(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::menu_entries;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_every_listed_pair_has_a_converter() {
        for source in SOURCE_FORMATS {
            for entry in menu_entries(*source) {
                assert!(
                    converter_for(*source, entry.target).is_some(),
                    "no converter for {} → {}",
                    source,
                    entry.target
                );
            }
        }
    }

    #[test]
    fn test_unsupported_pair() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.csv");
        std::fs::write(&input, "a,b").unwrap();

        let err = run_conversion(
            Format::Csv,
            Target::Format(Format::Zip),
            &input,
            &dir.path().join("a.zip"),
            &ConversionOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Conversion not supported: csv → zip");
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let err = run_conversion(
            Format::Csv,
            Target::Format(Format::Json),
            &dir.path().join("missing.csv"),
            &dir.path().join("out.json"),
            &ConversionOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("data/report.csv"), Target::Format(Format::Xlsx)),
            PathBuf::from("data/report.xlsx")
        );
        assert_eq!(
            default_output_path(Path::new("scan.pdf"), Target::TxtOcr),
            PathBuf::from("scan.txt")
        );
    }

    #[test]
    fn test_prompt_yes_no() {
        let mut out = Vec::new();
        assert!(prompt_yes_no(&mut Cursor::new("y\n"), &mut out, "Split?", false));
        assert!(!prompt_yes_no(&mut Cursor::new("no\n"), &mut out, "Split?", true));
        // EOF and blank answers fall back to the default
        assert!(prompt_yes_no(&mut Cursor::new(""), &mut out, "Split?", true));
        assert!(!prompt_yes_no(&mut Cursor::new("\n"), &mut out, "Split?", false));
        assert!(String::from_utf8(out).unwrap().contains("Split? [Y/n]"));
    }

    #[test]
    fn test_pretty_json_indent_and_unicode() {
        let value = serde_json::json!({"name": "दिल्ली"});
        let text = to_pretty_json(&value, 4).unwrap();
        assert_eq!(text, "{\n    \"name\": \"दिल्ली\"\n}");
    }

    #[test]
    fn test_docx_mode_parsing() {
        assert_eq!(DocxPdfMode::from_str("Image").unwrap(), DocxPdfMode::Image);
        assert!(DocxPdfMode::from_str("html").is_err());
    }
}
