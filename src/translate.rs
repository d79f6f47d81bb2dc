//! Machine translation of text files

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::TranslateSettings;
use crate::convert::{ConversionOptions, docx, pdf};
use crate::errors::{Result, translation_error};
use crate::formats::{Format, infer_format};
use crate::tools::Tools;
use crate::utils::{ensure_parent_dir, read_text_file, write_text_file};

/// A translation service
pub trait Translator {
    /// Translate `text` from `source` (or `auto`) into `target`
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// The public Google Translate endpoint used by browser extensions
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<GoogleTranslator> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| translation_error(&format!("Failed to build HTTP client: {e}")))?;
        Ok(GoogleTranslator {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_settings(settings: &TranslateSettings) -> Result<GoogleTranslator> {
        GoogleTranslator::new(&settings.endpoint, Duration::from_secs(settings.timeout_secs))
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| translation_error(&format!("Request failed: {e}")))?;

        let body: Value = response
            .json()
            .map_err(|e| translation_error(&format!("Unreadable response: {e}")))?;
        parse_response(&body)
    }
}

/// Join the translated segments of a `translate_a/single` response
///
/// The body is a nested array whose first element lists segments as
/// `[translated, original, ...]`.
pub fn parse_response(body: &Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| translation_error("Unexpected response shape"))?;
    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}

/// Cut text into pieces of at most `max_chars` characters
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Translate text of any length, one request per chunk
///
/// Empty text returns an empty string without a request.
pub fn translate_text(
    translator: &dyn Translator,
    text: &str,
    source: &str,
    target: &str,
    chunk_size: usize,
) -> Result<String> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    let chunks = split_chunks(text, chunk_size);
    debug!("Translating {} chunks from {} to {}", chunks.len(), source, target);

    let translated = chunks
        .iter()
        .map(|chunk| translator.translate(chunk, source, target))
        .collect::<Result<Vec<String>>>()?;
    Ok(translated.join("\n"))
}

/// Default output path: `notes.pdf` → `notes.translated.txt`
pub fn default_translation_path(input: &Path) -> PathBuf {
    input.with_extension("translated.txt")
}

/// Read the text of a file, extracting it from PDF and DOCX documents
///
/// PDF pages without a text layer go through OCR when the tools exist.
pub fn extract_text(input: &Path, tools: &Tools) -> Result<String> {
    match infer_format(input) {
        Some(Format::Pdf) => {
            let options = ConversionOptions {
                tools: tools.clone(),
                ..Default::default()
            };
            let (pages, notes) = pdf::page_texts_with_ocr(input, &options)?;
            for note in notes {
                warn!("{note}");
            }
            Ok(pdf::join_pages(&pages))
        }
        Some(Format::Docx) => Ok(docx::read_document(input, tools)?.plain_text()),
        _ => read_text_file(input),
    }
}

/// Translate a file and write the result as UTF-8 text
///
/// # Errors
/// Returns an error if the input cannot be read, a request fails, or the
/// output cannot be written
pub fn translate_file(
    translator: &dyn Translator,
    input: &Path,
    output: &Path,
    source: &str,
    target: &str,
    chunk_size: usize,
    tools: &Tools,
) -> Result<usize> {
    let text = extract_text(input, tools)?;
    let translated = translate_text(translator, &text, source, target, chunk_size)?;

    ensure_parent_dir(output)?;
    write_text_file(output, &translated, false)?;
    info!("Translated {} into {}", input.display(), output.display());
    Ok(translated.chars().count())
}
