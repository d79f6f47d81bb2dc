//! JSON and newline-delimited JSON input

use std::path::Path;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::constants::JSON_LINES_PER_IMAGE;
use crate::convert::csv::write_csv;
use crate::convert::{
    ConversionOptions, ConversionOutput, add_utf8_notice, json_records, table_layout, title_of,
    to_pretty_json, write_line_images,
};
use crate::errors::{Result, parsing_error};
use crate::render::Table;
use crate::render::docx::DocxBuilder;
use crate::render::pdf::TextPdf;
use crate::render::sheet::write_xlsx;
use crate::render::table::{cell_text, flatten_json};
use crate::utils::{read_text_file, write_text_file};

/// Parsed JSON input
#[derive(Debug, Clone, PartialEq)]
pub enum JsonInput {
    /// A single JSON document
    Document(Value),
    /// One value per line; `skipped` holds the 1-based numbers of bad lines
    Lines { records: Vec<Value>, skipped: Vec<usize> },
}

impl JsonInput {
    /// Parse a document, falling back to one value per non-blank line
    ///
    /// # Errors
    /// Returns a parsing error when neither reading yields a value
    pub fn parse(text: &str) -> Result<JsonInput> {
        let whole_error = match serde_json::from_str::<Value>(text) {
            Ok(value) => return Ok(JsonInput::Document(value)),
            Err(e) => e,
        };

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(value) => records.push(value),
                Err(e) => {
                    warn!("Skipping bad line {}: {}", index + 1, e);
                    skipped.push(index + 1);
                }
            }
        }
        if records.is_empty() {
            return Err(parsing_error("JSON", &whole_error.to_string()));
        }
        debug!("Read {} NDJSON records", records.len());
        Ok(JsonInput::Lines { records, skipped })
    }

    /// Records: array items, a lone document, or the parsed lines
    pub fn records(&self) -> Vec<&Value> {
        match self {
            JsonInput::Document(value) => json_records(value),
            JsonInput::Lines { records, .. } => records.iter().collect(),
        }
    }

    /// Whether the input is a list of records rather than one document
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            JsonInput::Document(Value::Array(_)) | JsonInput::Lines { .. }
        )
    }

    /// `Skipping bad line N` notes for NDJSON input
    pub fn notes(&self) -> Vec<String> {
        match self {
            JsonInput::Lines { skipped, .. } => skipped
                .iter()
                .map(|line| format!("Skipping bad line {line}"))
                .collect(),
            JsonInput::Document(_) => Vec::new(),
        }
    }

    /// Indented text: the document, or one `--- Record N ---` block per line
    pub fn pretty_text(&self) -> Result<String> {
        match self {
            JsonInput::Document(value) => to_pretty_json(value, 4),
            JsonInput::Lines { records, .. } => {
                let mut out = String::new();
                for (index, record) in records.iter().enumerate() {
                    out.push_str(&format!("--- Record {} ---\n", index + 1));
                    out.push_str(&to_pretty_json(record, 4)?);
                    out.push_str("\n\n");
                }
                Ok(out.trim_end().to_string())
            }
        }
    }
}

fn read(input: &Path) -> Result<JsonInput> {
    JsonInput::parse(&read_text_file(input)?)
}

/// Build a table from maps, collecting column names in first-seen order
fn maps_to_table(maps: Vec<Map<String, Value>>) -> Table {
    let mut header: Vec<String> = Vec::new();
    for map in &maps {
        for key in map.keys() {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
    }
    let rows = maps
        .iter()
        .map(|map| {
            header
                .iter()
                .map(|key| map.get(key).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    Table { header, rows }
}

/// Objects keep their keys; other records go in a `value` column
pub fn records_to_table(records: &[&Value]) -> Table {
    let maps = records
        .iter()
        .map(|record| match record {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), (*other).clone());
                map
            }
        })
        .collect();
    maps_to_table(maps)
}

/// Every record flattened to `a.b[0].c` columns
pub fn flattened_table(records: &[&Value]) -> Table {
    maps_to_table(records.iter().map(|record| flatten_json(record)).collect())
}

fn with_notes(mut result: ConversionOutput, input: &JsonInput) -> ConversionOutput {
    result.notes.extend(input.notes());
    result
}

pub fn to_csv(input: &Path, output: &Path, _options: &ConversionOptions) -> Result<ConversionOutput> {
    let parsed = read(input)?;
    let table = records_to_table(&parsed.records());
    write_csv(output, &table, ',', true)?;
    let mut result = ConversionOutput::new(output.to_path_buf(), table.rows.len());
    add_utf8_notice(&mut result, &table);
    Ok(with_notes(result, &parsed))
}

pub fn to_xlsx(input: &Path, output: &Path, _options: &ConversionOptions) -> Result<ConversionOutput> {
    let parsed = read(input)?;
    let table = flattened_table(&parsed.records());
    write_xlsx(output, &[("Sheet1".to_string(), table.clone())], true)?;
    let result = ConversionOutput::new(output.to_path_buf(), table.rows.len());
    Ok(with_notes(result, &parsed))
}

pub fn to_txt(input: &Path, output: &Path, _options: &ConversionOptions) -> Result<ConversionOutput> {
    let parsed = read(input)?;
    let text = parsed.pretty_text()?;
    write_text_file(output, &text, false)?;
    let result = ConversionOutput::new(output.to_path_buf(), parsed.records().len());
    Ok(with_notes(result, &parsed))
}

pub fn to_pdf(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let parsed = read(input)?;
    let text = parsed.pretty_text()?;
    let settings = &options.settings.pdf;
    let font_size = options.font_size.unwrap_or(settings.text_font_size);
    let mut pdf = TextPdf::new(
        &title_of(output),
        settings.margin,
        font_size,
        settings.text_line_gap.max(font_size),
    );
    pdf.push_wrapped(&text);
    pdf.save(output)?;
    let result = ConversionOutput::new(output.to_path_buf(), text.lines().count());
    Ok(with_notes(result, &parsed))
}

pub fn to_docx(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let parsed = read(input)?;
    let font_size = options
        .font_size
        .unwrap_or(options.settings.pdf.docx_font_size);
    let mut builder = DocxBuilder::new(font_size).heading("JSON Data Export");

    if parsed.is_list() {
        for (index, record) in parsed.records().iter().enumerate() {
            builder = builder
                .paragraph(&format!("Record {}:", index + 1))
                .lines(&to_pretty_json(record, 4)?);
        }
    } else {
        builder = builder.lines(&parsed.pretty_text()?);
    }
    builder.save(output)?;
    let result = ConversionOutput::new(output.to_path_buf(), parsed.records().len());
    Ok(with_notes(result, &parsed))
}

pub fn to_png(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let parsed = read(input)?;
    let lines: Vec<String> = parsed.pretty_text()?.lines().map(str::to_string).collect();
    let result = write_line_images(
        &lines,
        output,
        options,
        table_layout(options),
        JSON_LINES_PER_IMAGE,
        JSON_LINES_PER_IMAGE,
    )?;
    Ok(with_notes(result, &parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_parse_document_and_ndjson() {
        assert!(matches!(
            JsonInput::parse("[1, 2]").unwrap(),
            JsonInput::Document(_)
        ));

        let parsed = JsonInput::parse("{\"a\":1}\nbroken\n\n{\"a\":2}\n").unwrap();
        assert_eq!(parsed.records().len(), 2);
        assert_eq!(parsed.notes(), vec!["Skipping bad line 2"]);
        assert!(JsonInput::parse("nope\nstill nope").is_err());
    }

    #[test]
    fn test_records_to_table_grows_header() {
        let first = json!({"id": 1, "meta": {"k": "v"}});
        let second = json!({"id": 2, "extra": true});
        let scalar = json!("loose");
        let table = records_to_table(&[&first, &second, &scalar]);

        assert_eq!(table.header, vec!["id", "meta", "extra", "value"]);
        assert_eq!(table.rows[0], vec!["1", "{\"k\":\"v\"}", "", ""]);
        assert_eq!(table.rows[1], vec!["2", "", "true", ""]);
        assert_eq!(table.rows[2], vec!["", "", "", "loose"]);
    }

    #[test]
    fn test_flattened_table() {
        let record = json!({"a": {"b": [{"c": 1}]}});
        let table = flattened_table(&[&record]);
        assert_eq!(table.header, vec!["a.b[0].c"]);
        assert_eq!(table.rows[0], vec!["1"]);
    }

    #[test]
    fn test_ndjson_to_txt_writes_record_blocks() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.json");
        std::fs::write(&input, "{\"a\":1}\n{\"a\":2}\n").unwrap();
        let output = dir.path().join("out.txt");

        let result = to_txt(&input, &output, &ConversionOptions::default()).unwrap();
        assert_eq!(result.records, 2);
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("--- Record 1 ---\n{\n    \"a\": 1\n}"));
        assert!(text.contains("--- Record 2 ---"));
    }

    #[test]
    fn test_single_object_to_csv() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.json");
        std::fs::write(&input, "{\"name\": \"Asha\", \"age\": 30}").unwrap();
        let output = dir.path().join("out.csv");

        let result = to_csv(&input, &output, &ConversionOptions::default()).unwrap();
        assert_eq!(result.records, 1);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "\u{feff}name,age\nAsha,30\n");
    }
}
