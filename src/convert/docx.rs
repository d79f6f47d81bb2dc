//! Word document input (docx, and doc through LibreOffice)

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table as DocxTable, TableCellContent,
    TableChild, TableRowChild, read_docx,
};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::convert::csv::write_csv;
use crate::convert::pdf::page_count;
use crate::convert::{
    ConversionOptions, ConversionOutput, DocxPdfMode, add_utf8_notice, title_of, to_pretty_json,
};
use crate::errors::{
    Result, document_error, file_operation_error, invalid_input_error, no_table_error,
};
use crate::render::Table;
use crate::render::archive::zip_files;
use crate::render::pdf::TextPdf;
use crate::render::raster::merge_vertical;
use crate::render::sheet::write_xlsx;
use crate::tools::{SOFFICE, Tools};
use crate::utils::{force_extension, write_text_file};

/// Columns a table needs to be exported as data
const MIN_TABLE_COLUMNS: usize = 4;
/// Rows a table needs to be exported as data
const MIN_TABLE_ROWS: usize = 2;

static LOOSE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\t,;]").expect("Failed to compile regex pattern for LOOSE_SEPARATORS"));

/// A top-level piece of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    /// Cell text keeps its paragraphs joined with `\n`
    Table(Table),
}

/// Text content of a Word document in reading order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxContent {
    pub blocks: Vec<Block>,
    /// Whether the package holds embedded media
    pub has_images: bool,
}

impl DocxContent {
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(text) => Some(text.as_str()),
            Block::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Paragraph(_) => None,
        })
    }

    /// Paragraphs, then every table as tab-separated lines with a blank line between tables
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for paragraph in self.paragraphs() {
            out.push_str(paragraph);
            out.push('\n');
        }
        for (index, table) in self.tables().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&flat_cells(table).to_delimited('\t'));
        }
        out
    }

    /// Tables with enough columns, rows and filled rows to be exported as data
    pub fn data_tables(&self) -> Vec<Table> {
        self.tables()
            .filter(|table| is_data_table(table))
            .map(flat_cells)
            .collect()
    }
}

/// Whether a table is large enough and holds data
///
/// A meaningful row fills at least half of the columns and has one cell of
/// three or more characters.
pub fn is_data_table(table: &Table) -> bool {
    let columns = table.column_count();
    let rows = table.all_rows().count();
    let meaningful = table
        .all_rows()
        .filter(|row| {
            let filled: Vec<&str> = row
                .iter()
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect();
            filled.len() >= columns / 2 && filled.iter().any(|cell| cell.chars().count() >= 3)
        })
        .count();
    columns >= MIN_TABLE_COLUMNS && rows >= MIN_TABLE_ROWS && meaningful >= MIN_TABLE_ROWS
}

/// Cells on one line each, trimmed
fn flat_cells(table: &Table) -> Table {
    let flatten = |row: &Vec<String>| -> Vec<String> {
        row.iter()
            .map(|cell| cell.replace('\n', " ").trim().to_string())
            .collect()
    };
    Table {
        header: flatten(&table.header),
        rows: table.rows.iter().map(flatten).collect(),
    }
}

fn collect_paragraph_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(text) => out.push_str(&text.text),
                        RunChild::Tab(_) => out.push('\t'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => collect_paragraph_text(&link.children, out),
            _ => {}
        }
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    collect_paragraph_text(&paragraph.children, &mut text);
    text
}

fn read_table(table: &DocxTable) -> Table {
    let mut rows = Vec::with_capacity(table.rows.len());
    for child in &table.rows {
        let TableChild::TableRow(row) = child else {
            continue;
        };
        let cells = row
            .cells
            .iter()
            .filter_map(|cell_child| {
                let TableRowChild::TableCell(cell) = cell_child else {
                    return None;
                };
                let text = cell
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        TableCellContent::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(text)
            })
            .collect();
        rows.push(cells);
    }
    Table::from_rows(rows)
}

fn has_media(bytes: &[u8]) -> Result<bool> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let found = archive.file_names().any(|name| name.starts_with("word/media/"));
    Ok(found)
}

/// Parse the bytes of a `.docx` package
pub fn parse_document(bytes: &[u8]) -> Result<DocxContent> {
    let docx = read_docx(bytes).map_err(|e| document_error(&format!("Failed to read DOCX: {e}")))?;
    let mut blocks = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => blocks.push(Block::Paragraph(paragraph_text(paragraph))),
            DocumentChild::Table(table) => blocks.push(Block::Table(read_table(table))),
            _ => {}
        }
    }
    Ok(DocxContent {
        blocks,
        has_images: has_media(bytes)?,
    })
}

fn is_legacy_doc(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("doc"))
}

/// Read a `.docx`, converting a legacy `.doc` with LibreOffice first
///
/// # Errors
/// Returns an error if the file cannot be read or converted, or is not a Word document
pub fn read_document(path: &Path, tools: &Tools) -> Result<DocxContent> {
    let bytes = if is_legacy_doc(path) {
        let dir = temp_dir()?;
        let converted = tools.libreoffice_convert(path, "docx", dir.path())?;
        debug!("Converted legacy document to {}", converted.display());
        fs::read(&converted).map_err(|e| file_operation_error(e, converted, "read"))?
    } else {
        fs::read(path).map_err(|e| file_operation_error(e, path.to_path_buf(), "read"))?
    };
    parse_document(&bytes)
}

fn temp_dir() -> Result<TempDir> {
    TempDir::new()
        .map_err(|e| file_operation_error(e, std::env::temp_dir(), "create temporary directory in"))
}

fn read(input: &Path, options: &ConversionOptions) -> Result<DocxContent> {
    read_document(input, &options.tools)
}

fn reject_images(input: &Path, content: &DocxContent) -> Result<()> {
    if content.has_images {
        return Err(invalid_input_error(
            input.to_path_buf(),
            "Document contains images, which cannot be exported as data",
        ));
    }
    Ok(())
}

fn data_tables(input: &Path, content: &DocxContent) -> Result<Vec<Table>> {
    reject_images(input, content)?;
    let tables = content.data_tables();
    if tables.is_empty() {
        return Err(no_table_error(input.to_path_buf()));
    }
    debug!("Found {} data tables", tables.len());
    Ok(tables)
}

/// Lay the document out with the built-in PDF writer
fn render_native_pdf(content: &DocxContent, output: &Path, options: &ConversionOptions) -> Result<usize> {
    let settings = &options.settings.pdf;
    let font_size = options.font_size.unwrap_or(settings.text_font_size);
    let mut pdf = TextPdf::new(
        &title_of(output),
        settings.margin,
        font_size,
        settings.text_line_gap.max(font_size),
    );
    for block in &content.blocks {
        match block {
            Block::Paragraph(text) => pdf.push_wrapped(text),
            Block::Table(table) => {
                for line in flat_cells(table).to_lines() {
                    pdf.push_wrapped(&line);
                }
            }
        }
    }
    pdf.save(output)
}

/// Convert with LibreOffice into a temporary directory
fn libreoffice_pdf(input: &Path, tools: &Tools, dir: &TempDir) -> Result<PathBuf> {
    tools.libreoffice_convert(input, "pdf", dir.path())
}

/// Rasterise a PDF into page images inside `dir`
fn page_images(pdf: &Path, options: &ConversionOptions, dir: &TempDir) -> Result<Vec<image::RgbImage>> {
    let pages_dir = dir.path().join("pages");
    fs::create_dir_all(&pages_dir).map_err(|e| file_operation_error(e, pages_dir.clone(), "create"))?;
    options
        .tools
        .pdf_to_page_images(pdf, options.dpi, &pages_dir)?
        .iter()
        .map(|page| -> Result<image::RgbImage> { Ok(image::open(page)?.to_rgb8()) })
        .collect()
}

pub fn to_txt(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let content = read(input, options)?;
    let text = content.plain_text();
    write_text_file(output, &text, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), text.lines().count()))
}

pub fn to_pdf(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let dir = temp_dir()?;
    match options.docx_mode {
        DocxPdfMode::Image => {
            let rendered = libreoffice_pdf(input, &options.tools, &dir)?;
            let pages = page_images(&rendered, options, &dir)?;
            let mut pdf = TextPdf::new(&title_of(output), 0.0, 12.0, 14.0);
            let count = pages.len();
            for page in pages {
                pdf.add_image_page(page);
            }
            pdf.save(output)?;
            Ok(ConversionOutput::new(output.to_path_buf(), count))
        }
        DocxPdfMode::Auto => {
            if options.tools.is_available(SOFFICE) {
                match libreoffice_pdf(input, &options.tools, &dir) {
                    Ok(rendered) => {
                        fs::copy(&rendered, output)
                            .map_err(|e| file_operation_error(e, output.to_path_buf(), "write"))?;
                        let pages = page_count(output)?;
                        return Ok(ConversionOutput::new(output.to_path_buf(), pages));
                    }
                    Err(e) => warn!("LibreOffice conversion failed, using the built-in renderer: {e}"),
                }
            }
            let content = read(input, options)?;
            let pages = render_native_pdf(&content, output, options)?;
            let mut result = ConversionOutput::new(output.to_path_buf(), pages);
            result
                .notes
                .push("LibreOffice unavailable, layout was simplified".to_string());
            Ok(result)
        }
    }
}

pub fn to_csv(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let content = read(input, options)?;
    let tables = data_tables(input, &content)?;
    let combined = Table {
        header: Vec::new(),
        rows: tables
            .iter()
            .flat_map(|table| table.all_rows().cloned().collect::<Vec<_>>())
            .collect(),
    };
    let rows = write_csv(output, &combined, ',', true)?;
    let mut result = ConversionOutput::new(output.to_path_buf(), rows);
    add_utf8_notice(&mut result, &combined);
    Ok(result)
}

pub fn to_xlsx(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let content = read(input, options)?;
    let sheets: Vec<(String, Table)> = data_tables(input, &content)?
        .into_iter()
        .enumerate()
        .map(|(index, table)| (format!("Table{}", index + 1), table))
        .collect();
    let rows = write_xlsx(output, &sheets, true)?;
    Ok(ConversionOutput::new(output.to_path_buf(), rows))
}

/// JSON payload of a document
///
/// Paragraph text that is itself JSON wins. Otherwise large enough tables
/// are written as arrays of rows, header row included, and as a last resort
/// paragraphs split on tabs, commas or semicolons into four or more parts
/// form one table.
pub fn document_json(input: &Path, content: &DocxContent) -> Result<Value> {
    let raw: Vec<&str> = content
        .paragraphs()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();
    let joined = raw.join("\n");
    if (joined.starts_with('{') || joined.starts_with('['))
        && let Ok(value) = serde_json::from_str::<Value>(&joined)
    {
        return Ok(value);
    }

    let tables: Vec<Value> = content
        .tables()
        .map(flat_cells)
        .filter(|table| table.column_count() >= MIN_TABLE_COLUMNS && table.all_rows().count() >= MIN_TABLE_ROWS)
        .map(|table| table_rows(&table))
        .collect();
    if !tables.is_empty() {
        return Ok(json!({ "tables": tables }));
    }

    let rows: Vec<Vec<String>> = raw
        .iter()
        .map(|line| {
            LOOSE_SEPARATORS
                .split(line)
                .map(|part| part.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|parts| parts.len() >= MIN_TABLE_COLUMNS)
        .collect();
    if !rows.is_empty() {
        return Ok(json!({ "tables": [table_rows(&Table::from_rows(rows))] }));
    }
    Err(no_table_error(input.to_path_buf()))
}

fn table_rows(table: &Table) -> Value {
    Value::Array(
        table
            .all_rows()
            .map(|row| Value::Array(row.iter().cloned().map(Value::String).collect()))
            .collect(),
    )
}

pub fn to_json(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let content = read(input, options)?;
    reject_images(input, &content)?;
    let value = document_json(input, &content)?;
    let records = match &value {
        Value::Array(items) => items.len(),
        _ => 1,
    };
    write_text_file(output, &to_pretty_json(&value, 2)?, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), records))
}

/// Write rendered pages as one PNG, a merged PNG, or a zip of `page_N.png`
fn write_page_images(
    pages: Vec<image::RgbImage>,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ConversionOutput> {
    let count = pages.len();
    if count == 1 || (count > 1 && options.resolve_merge(count)) {
        let path = force_extension(output, "png");
        let image = if count == 1 { pages.into_iter().next() } else { Some(merge_vertical(&pages)) };
        if let Some(image) = image {
            image.save_with_format(&path, image::ImageFormat::Png)?;
        }
        info!("Wrote {} pages into {}", count, path.display());
        return Ok(ConversionOutput::new(path, count));
    }

    let zip_path = force_extension(output, "zip");
    let dir = temp_dir()?;
    let mut files = Vec::with_capacity(count);
    for (index, page) in pages.iter().enumerate() {
        let path = dir.path().join(format!("page_{}.png", index + 1));
        page.save_with_format(&path, image::ImageFormat::Png)?;
        files.push(path);
    }
    zip_files(&files, &zip_path)?;
    Ok(ConversionOutput::new(zip_path, count))
}

pub fn to_png(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let dir = temp_dir()?;
    let rendered = libreoffice_pdf(input, &options.tools, &dir)?;
    let pages = page_images(&rendered, options, &dir)?;
    write_page_images(pages, output, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::docx::DocxBuilder;
    use tempfile::tempdir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_docx(dir: &Path) -> PathBuf {
        let path = dir.join("in.docx");
        let table = Table::from_rows(vec![
            row(&["id", "name", "city", "zip"]),
            row(&["1", "Asha", "Pune", "411001"]),
            row(&["2", "Li", "北京", "100000"]),
        ]);
        DocxBuilder::new(11.0)
            .paragraph("Quarterly report")
            .table(&table)
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_parse_paragraphs_and_tables() {
        let dir = tempdir().unwrap();
        let path = sample_docx(dir.path());
        let content = read_document(&path, &Tools::default()).unwrap();

        assert_eq!(content.paragraphs().collect::<Vec<_>>(), vec!["Quarterly report"]);
        assert_eq!(content.tables().count(), 1);
        assert!(!content.has_images);
        assert_eq!(content.data_tables()[0].rows[1], row(&["2", "Li", "北京", "100000"]));
    }

    #[test]
    fn test_plain_text_lists_tables_after_paragraphs() {
        let dir = tempdir().unwrap();
        let path = sample_docx(dir.path());
        let content = read_document(&path, &Tools::default()).unwrap();
        let text = content.plain_text();

        assert!(text.starts_with("Quarterly report\nid\tname\tcity\tzip\n"));
    }

    #[test]
    fn test_is_data_table() {
        let narrow = Table::from_rows(vec![row(&["a", "b"]), row(&["1", "2"])]);
        assert!(!is_data_table(&narrow));

        let empty = Table::from_rows(vec![row(&["a", "b", "c", "d"]), row(&["", "", "", ""])]);
        assert!(!is_data_table(&empty));

        // Layout tables: mostly blank cells or only short labels
        let sparse = Table::from_rows(vec![
            row(&["Name", "", "", ""]),
            row(&["Signature", "", "", ""]),
        ]);
        assert!(!is_data_table(&sparse));
        let short = Table::from_rows(vec![row(&["a", "b", "c", "d"]), row(&["1", "2", "3", "4"])]);
        assert!(!is_data_table(&short));

        let data = Table::from_rows(vec![
            row(&["id", "name", "", ""]),
            row(&["1", "Asha", "Pune", ""]),
        ]);
        assert!(is_data_table(&data));
    }

    #[test]
    fn test_document_without_tables_fails_for_csv() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("prose.docx");
        DocxBuilder::new(11.0).paragraph("Only prose").save(&input).unwrap();

        let err = to_csv(&input, &dir.path().join("out.csv"), &ConversionOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("No table found"));
    }

    #[test]
    fn test_document_json_prefers_embedded_json() {
        let content = DocxContent {
            blocks: vec![
                Block::Paragraph("{\"a\":".to_string()),
                Block::Paragraph(" 1}".to_string()),
            ],
            has_images: false,
        };
        assert_eq!(document_json(Path::new("x.docx"), &content).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_document_json_from_loose_lines() {
        let content = DocxContent {
            blocks: vec![
                Block::Paragraph("id;name;city;zip".to_string()),
                Block::Paragraph("1;Asha;Pune;411001".to_string()),
                Block::Paragraph("not a row".to_string()),
            ],
            has_images: false,
        };
        let value = document_json(Path::new("x.docx"), &content).unwrap();
        assert_eq!(
            value["tables"][0],
            json!([["id", "name", "city", "zip"], ["1", "Asha", "Pune", "411001"]])
        );
    }

    #[test]
    fn test_document_json_keeps_header_row() {
        let table = Table::from_rows(vec![
            row(&["id", "", "id", "note"]),
            row(&["1", "x", "2", "long note"]),
        ]);
        let content = DocxContent {
            blocks: vec![Block::Table(table)],
            has_images: false,
        };
        let value = document_json(Path::new("x.docx"), &content).unwrap();
        assert_eq!(
            value,
            json!({"tables": [[["id", "", "id", "note"], ["1", "x", "2", "long note"]]]})
        );
    }

    #[test]
    fn test_docx_to_xlsx_names_sheets() {
        let dir = tempdir().unwrap();
        let input = sample_docx(dir.path());
        let output = dir.path().join("out.xlsx");

        let result = to_xlsx(&input, &output, &ConversionOptions::default()).unwrap();
        assert_eq!(result.records, 3);
        let table = crate::render::sheet::read_table(&output, Some("Table1")).unwrap();
        assert_eq!(table.header, row(&["id", "name", "city", "zip"]));
    }
}
