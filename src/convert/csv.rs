//! CSV input and the CSV writer shared by other converters

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use crate::constants::TABLE_LINES_PER_IMAGE;
use crate::convert::{
    ConversionOptions, ConversionOutput, table_layout, to_pretty_json, write_line_images,
    write_table_pdf,
};
use crate::errors::{Result, file_operation_error, invalid_input_error};
use crate::render::Table;
use crate::render::docx::DocxBuilder;
use crate::render::sheet::write_xlsx;
use crate::render::table::auto_detect_delimiter;
use crate::utils::{read_text_file, write_text_file};

/// Delimiters tried when sniffing CSV input, in order
pub const CSV_DELIMITERS: &[char] = &[',', '\t', ';', '|'];

fn delimiter_byte(delimiter: char, path: &Path) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(invalid_input_error(
            path.to_path_buf(),
            &format!("Delimiter '{delimiter}' is not a single-byte character"),
        ))
    }
}

/// Parse delimited text into a table; ragged rows are kept as they are
pub fn parse_delimited(text: &str, delimiter: char, path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter, path)?)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table::from_rows(rows))
}

/// Read a CSV file; without an explicit delimiter it is sniffed, defaulting to `,`
pub fn read_csv_table(path: &Path, delimiter: Option<char>) -> Result<Table> {
    let text = read_text_file(path)?;
    let delimiter =
        delimiter.unwrap_or_else(|| auto_detect_delimiter(&text, CSV_DELIMITERS, ','));
    debug!("Reading {} with delimiter {:?}", path.display(), delimiter);
    parse_delimited(&text, delimiter, path)
}

/// Write a table as CSV, optionally with a UTF-8 byte order mark for Excel
pub fn write_csv(path: &Path, table: &Table, delimiter: char, with_bom: bool) -> Result<usize> {
    let mut file =
        File::create(path).map_err(|e| file_operation_error(e, path.to_path_buf(), "create"))?;
    if with_bom {
        file.write_all(b"\xEF\xBB\xBF")
            .map_err(|e| file_operation_error(e, path.to_path_buf(), "write"))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter, path)?)
        .flexible(true)
        .from_writer(file);
    let mut written = 0;
    for row in table.all_rows() {
        writer.write_record(row)?;
        written += 1;
    }
    writer
        .flush()
        .map_err(|e| file_operation_error(e, path.to_path_buf(), "write"))?;
    Ok(written)
}

/// Objects keyed by header; missing cells become `null`
pub fn table_to_records(table: &Table) -> Vec<Value> {
    let keys = table.keys();
    table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = keys
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let value = row
                        .get(i)
                        .map(|cell| Value::String(cell.clone()))
                        .unwrap_or(Value::Null);
                    (key.clone(), value)
                })
                .collect();
            Value::Object(object)
        })
        .collect()
}

fn read(input: &Path, options: &ConversionOptions) -> Result<Table> {
    read_csv_table(input, options.delimiter)
}

pub fn to_xlsx(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    let rows = write_xlsx(output, &[("Sheet1".to_string(), table)], false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), rows))
}

pub fn to_pdf(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    write_table_pdf(&table.to_lines(), output, options)
}

pub fn to_docx(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    let font_size = options
        .font_size
        .unwrap_or(options.settings.pdf.docx_font_size);
    DocxBuilder::new(font_size).table(&table).save(output)?;
    Ok(ConversionOutput::new(
        output.to_path_buf(),
        table.all_rows().count(),
    ))
}

/// The explicit delimiter picks the output separator here; the input is sniffed
pub fn to_txt(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read_csv_table(input, None)?;
    let delimiter = options
        .delimiter
        .unwrap_or(options.settings.csv.text_delimiter);
    let text = table.to_delimited(delimiter);
    write_text_file(output, &text, false)?;
    Ok(ConversionOutput::new(
        output.to_path_buf(),
        table.all_rows().count(),
    ))
}

pub fn to_json(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    let records = table_to_records(&table);
    write_text_file(output, &to_pretty_json(&records, 4)?, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), records.len()))
}

pub fn to_png(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    if table.is_empty() {
        return Err(invalid_input_error(input.to_path_buf(), "CSV is empty"));
    }
    let lines_per_image = options.settings.image.lines_per_image.max(1);
    write_line_images(
        &table.to_lines(),
        output,
        options,
        table_layout(options),
        lines_per_image,
        TABLE_LINES_PER_IMAGE.min(lines_per_image),
    )
}
