//! Workbook input (xlsx, xls, ods)

use std::path::Path;

use serde_json::{Map, Value};

use crate::constants::TABLE_LINES_PER_IMAGE;
use crate::convert::csv::write_csv;
use crate::convert::{
    ConversionOptions, ConversionOutput, add_utf8_notice, table_layout, to_pretty_json,
    write_line_images, write_table_pdf,
};
use crate::errors::Result;
use crate::render::Table;
use crate::render::docx::DocxBuilder;
use crate::render::sheet::read_table;
use crate::utils::write_text_file;

fn read(input: &Path, options: &ConversionOptions) -> Result<Table> {
    read_table(input, options.sheet.as_deref())
}

/// Objects keyed by header with blank headers named `column_N`; missing cells become `""`
pub fn sheet_records(table: &Table) -> Vec<Value> {
    let keys = table.keys();
    table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = keys
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let cell = row.get(i).cloned().unwrap_or_default();
                    (key.clone(), Value::String(cell))
                })
                .collect();
            Value::Object(object)
        })
        .collect()
}

pub fn to_csv(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    let rows = write_csv(output, &table, ',', true)?;
    let mut result = ConversionOutput::new(output.to_path_buf(), rows);
    add_utf8_notice(&mut result, &table);
    Ok(result)
}

pub fn to_pdf(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    write_table_pdf(&table.to_lines(), output, options)
}

pub fn to_txt(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    write_text_file(output, &table.to_delimited('\t'), false)?;
    Ok(ConversionOutput::new(
        output.to_path_buf(),
        table.all_rows().count(),
    ))
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

pub fn to_json(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
    let records = sheet_records(&table);
    write_text_file(output, &to_pretty_json(&records, 2)?, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), records.len()))
}

pub fn to_png(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let table = read(input, options)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sheet::write_xlsx;
    use serde_json::json;
    use tempfile::tempdir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn workbook(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("in.xlsx");
        let table = Table::from_rows(vec![row(&["id", "", "city"]), row(&["1", "x"]), row(&["2", "y", "दिल्ली"])]);
        write_xlsx(&path, &[("Data".to_string(), table)], false).unwrap();
        path
    }

    #[test]
    fn test_sheet_records() {
        let table = Table::from_rows(vec![row(&["id", ""]), row(&["1"])]);
        assert_eq!(sheet_records(&table), vec![json!({"id": "1", "column_2": ""})]);
    }

    #[test]
    fn test_to_json_uses_two_space_indent() {
        let dir = tempdir().unwrap();
        let input = workbook(dir.path());
        let output = dir.path().join("out.json");

        let result = to_json(&input, &output, &ConversionOptions::default()).unwrap();
        assert_eq!(result.records, 2);
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": \"1\""));
        assert!(text.contains("\"column_2\": \"x\""));
    }

    #[test]
    fn test_to_csv_adds_notice_for_non_ascii() {
        let dir = tempdir().unwrap();
        let input = workbook(dir.path());
        let output = dir.path().join("out.csv");

        let result = to_csv(&input, &output, &ConversionOptions::default()).unwrap();
        assert_eq!(result.records, 3);
        assert!(result.notes.iter().any(|note| note.contains("Devanagari")));
        assert!(std::fs::read(&output).unwrap().starts_with(b"\xEF\xBB\xBF"));
    }
}
