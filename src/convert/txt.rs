//! Plain text input

use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::constants::TXT_SINGLE_IMAGE_LINES;
use crate::convert::csv::{CSV_DELIMITERS, write_csv};
use crate::convert::{
    ConversionOptions, ConversionOutput, add_utf8_notice, add_xlsx_copy, text_layout, title_of,
    to_pretty_json, write_line_images,
};
use crate::errors::Result;
use crate::render::Table;
use crate::render::docx::DocxBuilder;
use crate::render::pdf::TextPdf;
use crate::render::sheet::write_xlsx;
use crate::render::table::{auto_detect_delimiter, split_row};
use crate::utils::{read_text_file, write_text_file};

/// Delimiter of text input: explicit, sniffed, or the configured default
fn text_delimiter(text: &str, options: &ConversionOptions) -> char {
    let default = options.settings.csv.text_delimiter;
    match options.delimiter {
        Some(delimiter) => delimiter,
        None if options.auto_delimiter => auto_detect_delimiter(text, CSV_DELIMITERS, default),
        None => default,
    }
}

/// Split every non-blank line into cells
pub fn text_to_table(text: &str, delimiter: char) -> Table {
    let rows = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| split_row(line, delimiter))
        .collect();
    Table::from_rows(rows)
}

pub fn to_pdf(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let text = read_text_file(input)?;
    let settings = &options.settings.pdf;
    let font_size = options.font_size.unwrap_or(settings.text_font_size);
    let mut pdf = TextPdf::new(
        &title_of(output),
        settings.margin,
        font_size,
        settings.text_line_gap.max(font_size),
    );
    pdf.push_wrapped(&text);
    let pages = pdf.save(output)?;
    debug!("Wrote {} pages", pages);
    Ok(ConversionOutput::new(output.to_path_buf(), text.lines().count()))
}

pub fn to_docx(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let text = read_text_file(input)?;
    let font_size = options
        .font_size
        .unwrap_or(options.settings.pdf.docx_font_size);
    let mut builder = DocxBuilder::new(font_size);
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        builder = builder.paragraph(line);
    }
    let paragraphs = builder.save(output)?;
    Ok(ConversionOutput::new(output.to_path_buf(), paragraphs))
}

pub fn to_json(input: &Path, output: &Path, _options: &ConversionOptions) -> Result<ConversionOutput> {
    let text = read_text_file(input)?;
    let lines: Vec<Value> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Value::String(line.to_string()))
        .collect();
    write_text_file(output, &to_pretty_json(&lines, 4)?, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), lines.len()))
}

pub fn to_csv(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let text = read_text_file(input)?;
    let delimiter = text_delimiter(&text, options);
    debug!("Splitting {} on {:?}", input.display(), delimiter);

    let table = text_to_table(&text, delimiter);
    let rows = write_csv(output, &table, ',', true)?;
    let mut result = ConversionOutput::new(output.to_path_buf(), rows);
    add_utf8_notice(&mut result, &table);
    add_xlsx_copy(&mut result, &table, options)?;
    Ok(result)
}

pub fn to_xlsx(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let text = read_text_file(input)?;
    let table = text_to_table(&text, options.delimiter.unwrap_or('\t'));
    let rows = write_xlsx(output, &[("Sheet1".to_string(), table)], true)?;
    Ok(ConversionOutput::new(output.to_path_buf(), rows))
}

pub fn to_png(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let text = read_text_file(input)?;
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    write_line_images(
        &lines,
        output,
        options,
        text_layout(options),
        options.settings.image.text_lines_per_image.max(1),
        TXT_SINGLE_IMAGE_LINES,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_text_to_table_skips_blank_lines() {
        let table = text_to_table("a\tb\n\n1\t2\n", '\t');
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_delimiter_choice() {
        let mut options = ConversionOptions::default();
        assert_eq!(text_delimiter("a;b", &options), '\t');

        options.auto_delimiter = true;
        assert_eq!(text_delimiter("a;b", &options), ';');
        assert_eq!(text_delimiter("plain", &options), '\t');

        options.delimiter = Some('|');
        assert_eq!(text_delimiter("a;b", &options), '|');
    }

    #[test]
    fn test_to_json_keeps_trimmed_non_blank_lines() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "  first \n\n second\n").unwrap();
        let output = dir.path().join("out.json");

        let result = to_json(&input, &output, &ConversionOptions::default()).unwrap();
        assert_eq!(result.records, 2);
        let value: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!(["first", "second"]));
    }

    #[test]
    fn test_to_csv_with_xlsx_copy() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "name\tcity\nAsha\tदिल्ली\n").unwrap();
        let output = dir.path().join("out.csv");
        let options = ConversionOptions {
            xlsx_copy: true,
            ..Default::default()
        };

        let result = to_csv(&input, &output, &options).unwrap();
        assert_eq!(result.records, 2);
        assert_eq!(result.extras, vec![dir.path().join("out.xlsx")]);
        assert!(dir.path().join("out.xlsx").exists());
        assert!(!result.notes.is_empty());

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "\u{feff}name,city\nAsha,दिल्ली\n");
    }
}
