//! PDF input: text extraction with lopdf, page images with pdftoppm

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;
use log::{debug, info, warn};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::constants::PROGRESS_EVERY_ROWS;
use crate::convert::csv::write_csv;
use crate::convert::{ConversionOptions, ConversionOutput, add_xlsx_copy, to_pretty_json};
use crate::errors::{Result, file_operation_error, no_table_error, pdf_error};
use crate::ocr::{Tesseract, recognize_text};
use crate::render::Table;
use crate::render::docx::DocxBuilder;
use crate::render::raster::merge_vertical;
use crate::render::sheet::write_xlsx;
use crate::render::table::text_to_rows;
use crate::tools::{PDFTOPPM, TESSERACT};
use crate::utils::{remove_partial_output, sibling_with_suffix, write_text_file};

fn load(path: &Path) -> Result<Document> {
    Document::load(path).map_err(|e| pdf_error(&format!("Failed to open {}: {}", path.display(), e)))
}

/// Number of pages in a PDF
pub fn page_count(path: &Path) -> Result<usize> {
    Ok(load(path)?.get_pages().len())
}

/// Extracted text of every page in order; unreadable pages give empty text
pub fn extract_page_texts(path: &Path) -> Result<Vec<String>> {
    let document = load(path)?;
    let pages = document.get_pages();
    debug!("{} has {} pages", path.display(), pages.len());

    Ok(pages
        .keys()
        .map(|number| match document.extract_text(&[*number]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not extract text from page {number}: {e}");
                String::new()
            }
        })
        .collect())
}

fn temp_dir() -> Result<TempDir> {
    TempDir::new()
        .map_err(|e| file_operation_error(e, std::env::temp_dir(), "create temporary directory in"))
}

/// OCR every page image; `only` limits recognition to those 0-based page indexes
fn ocr_pages(
    input: &Path,
    options: &ConversionOptions,
    dpi: u32,
    lang: &str,
    only: Option<&[usize]>,
) -> Result<Vec<(usize, String)>> {
    let dir = temp_dir()?;
    let pages = options.tools.pdf_to_page_images(input, dpi, dir.path())?;
    let engine = Tesseract::new(options.tools.clone());

    let mut texts = Vec::new();
    for (index, page) in pages.iter().enumerate() {
        if only.is_some_and(|wanted| !wanted.contains(&index)) {
            continue;
        }
        let text = recognize_text(&engine, page, lang, options.strong_preprocess)?;
        debug!("OCR page {}: {} characters", index + 1, text.chars().count());
        texts.push((index, text));
    }
    Ok(texts)
}

/// Rows of every page; in strict mode pages without multi-column rows are skipped
///
/// Returns the rows and the 1-based numbers of skipped pages.
pub fn collect_table_rows(pages: &[String], strict: bool) -> (Vec<Vec<String>>, Vec<usize>) {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for (index, text) in pages.iter().enumerate() {
        let page_rows = text_to_rows(text);
        if strict && page_rows.iter().all(|row| row.len() < 2) {
            skipped.push(index + 1);
            continue;
        }
        for row in page_rows {
            rows.push(row);
            if rows.len() % PROGRESS_EVERY_ROWS == 0 {
                info!("Processed rows: {} (page {}/{})", rows.len(), index + 1, pages.len());
            }
        }
    }
    (rows, skipped)
}

/// `{ page, text, tables }` for every page; `tables` only when a row has several cells
pub fn pages_to_json(pages: &[String]) -> Value {
    Value::Array(
        pages
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let mut page = json!({ "page": index + 1, "text": text });
                let rows = text_to_rows(text);
                if rows.iter().any(|row| row.len() > 1) {
                    page["tables"] = json!([rows]);
                }
                page
            })
            .collect(),
    )
}

/// Text of every page, with pages lacking a text layer OCR'd when the tools exist
///
/// Returns the page texts and the notices for the user.
pub fn page_texts_with_ocr(
    input: &Path,
    options: &ConversionOptions,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut pages = extract_page_texts(input)?;
    let mut notes = Vec::new();

    let empty: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, text)| text.trim().is_empty())
        .map(|(index, _)| index)
        .collect();
    if !empty.is_empty() {
        let tools = &options.tools;
        if tools.is_available(PDFTOPPM) && tools.is_available(TESSERACT) {
            info!("Running OCR on {} pages without a text layer", empty.len());
            let dpi = options.settings.ocr.dpi;
            let recognized = ocr_pages(input, options, dpi, &options.lang, Some(empty.as_slice()))?;
            for (index, text) in recognized {
                pages[index] = text;
            }
        } else {
            let numbers: Vec<String> = empty.iter().map(|index| (index + 1).to_string()).collect();
            notes.push(format!(
                "Pages without extractable text: {}. Install pdftoppm and tesseract to OCR them.",
                numbers.join(", ")
            ));
        }
    }
    Ok((pages, notes))
}

/// Pages joined with blank lines
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Page text joined with blank lines; empty pages are OCR'd when the tools exist
pub fn to_txt(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let (pages, notes) = page_texts_with_ocr(input, options)?;
    write_text_file(output, &join_pages(&pages), false)?;
    let mut result = ConversionOutput::new(output.to_path_buf(), pages.len());
    result.notes = notes;
    Ok(result)
}

/// OCR every page regardless of its text layer
pub fn to_txt_ocr(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let lang = if options.lang.trim().eq_ignore_ascii_case("auto") {
        "en,hi"
    } else {
        options.lang.as_str()
    };
    let pages = ocr_pages(input, options, options.settings.ocr.dpi, lang, None)?;
    let text = pages
        .iter()
        .map(|(_, text)| text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    write_text_file(output, &text, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), pages.len()))
}

pub fn to_docx(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let pages = extract_page_texts(input)?;
    let font_size = options
        .font_size
        .unwrap_or(options.settings.pdf.docx_font_size);

    let mut builder = DocxBuilder::new(font_size);
    for (index, text) in pages.iter().enumerate() {
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            builder = builder.paragraph(line);
        }
        if index + 1 < pages.len() {
            builder = builder.page_break();
        }
    }
    builder.save(output)?;
    let mut result = ConversionOutput::new(output.to_path_buf(), pages.len());
    result.notes.push("Images in the PDF are not carried over".to_string());
    Ok(result)
}

/// Directory that receives page images for an output path
///
/// A path with an extension such as `report.png` becomes `report_pages/`.
pub fn image_dir_for(output: &Path) -> PathBuf {
    if output.extension().is_some() {
        sibling_with_suffix(output, "_pages")
    } else {
        output.to_path_buf()
    }
}

/// Page images in a directory: `page_1.png`, `page_merged.png` or `page_N.png` each
pub fn to_png(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let dir = temp_dir()?;
    let rendered = options.tools.pdf_to_page_images(input, options.dpi, dir.path())?;
    let count = rendered.len();
    let merge = count > 1 && options.resolve_merge(count);

    let out_dir = image_dir_for(output);
    write_page_images(&rendered, &out_dir, merge)?;
    info!("Wrote {} pages into {}", count, out_dir.display());
    Ok(ConversionOutput::new(out_dir, count))
}

/// Fill `out_dir` with page images
///
/// A directory created here is removed again when writing fails.
fn write_page_images(rendered: &[PathBuf], out_dir: &Path, merge: bool) -> Result<()> {
    let existed = out_dir.exists();
    fs::create_dir_all(out_dir)
        .map_err(|e| file_operation_error(e, out_dir.to_path_buf(), "create"))?;

    let result = copy_page_images(rendered, out_dir, merge);
    if result.is_err() && !existed {
        remove_partial_output(out_dir);
    }
    result
}

fn copy_page_images(rendered: &[PathBuf], out_dir: &Path, merge: bool) -> Result<()> {
    if merge {
        let images = rendered
            .iter()
            .map(|page| -> Result<image::RgbImage> { Ok(image::open(page)?.to_rgb8()) })
            .collect::<Result<Vec<_>>>()?;
        merge_vertical(&images)
            .save_with_format(out_dir.join("page_merged.png"), image::ImageFormat::Png)?;
        return Ok(());
    }
    for (index, page) in rendered.iter().enumerate() {
        let to = out_dir.join(format!("page_{}.png", index + 1));
        fs::copy(page, &to).map_err(|e| file_operation_error(e, to, "write"))?;
    }
    Ok(())
}

pub fn to_csv(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let pages = extract_page_texts(input)?;
    let (rows, skipped) = collect_table_rows(&pages, options.strict_tables);
    if rows.is_empty() {
        return Err(no_table_error(input.to_path_buf()));
    }

    let table = Table {
        header: Vec::new(),
        rows,
    };
    let written = write_csv(output, &table, ',', true)?;
    let mut result = ConversionOutput::new(output.to_path_buf(), written);
    if !skipped.is_empty() {
        let numbers: Vec<String> = skipped.iter().map(usize::to_string).collect();
        result
            .notes
            .push(format!("Pages skipped (no table): {}", numbers.join(", ")));
    }
    add_xlsx_copy(&mut result, &table, options)?;
    Ok(result)
}

pub fn to_xlsx(input: &Path, output: &Path, _options: &ConversionOptions) -> Result<ConversionOutput> {
    let pages = extract_page_texts(input)?;
    let (rows, _) = collect_table_rows(&pages, false);
    let table = Table {
        header: Vec::new(),
        rows,
    };
    let written = write_xlsx(output, &[("Sheet1".to_string(), table)], true)?;
    Ok(ConversionOutput::new(output.to_path_buf(), written))
}

pub fn to_json(input: &Path, output: &Path, _options: &ConversionOptions) -> Result<ConversionOutput> {
    let pages = extract_page_texts(input)?;
    write_text_file(output, &to_pretty_json(&pages_to_json(&pages), 2)?, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), pages.len()))
}
