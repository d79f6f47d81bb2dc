use std::fs;
use std::path::Path;

use file_toolkit::fonts::FontBook;
use file_toolkit::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;

fn convert(source: Format, target: Format, input: &Path, output: &Path) -> Result<ConversionOutput> {
    run_conversion(
        source,
        Target::Format(target),
        input,
        output,
        &ConversionOptions::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_to_xlsx_to_json() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("people.csv");
        fs::write(&csv, "name,city\nAsha,Pune\nRavi,दिल्ली\n").unwrap();

        let xlsx = dir.path().join("people.xlsx");
        let result = convert(Format::Csv, Format::Xlsx, &csv, &xlsx).unwrap();
        assert_eq!(result.path, xlsx);

        let json_path = dir.path().join("people.json");
        let result = convert(Format::Xlsx, Format::Json, &xlsx, &json_path).unwrap();
        assert_eq!(result.records, 2);

        let value: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(
            value,
            json!([
                {"name": "Asha", "city": "Pune"},
                {"name": "Ravi", "city": "दिल्ली"}
            ])
        );
    }

    #[test]
    fn test_ndjson_to_csv_reports_bad_lines() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("events.json");
        fs::write(&input, "{\"id\": 1}\n{oops\n{\"id\": 2, \"tag\": \"x\"}\n").unwrap();
        let output = dir.path().join("events.csv");

        let result = convert(Format::Json, Format::Csv, &input, &output).unwrap();
        assert_eq!(result.records, 2);
        assert!(result.notes.iter().any(|note| note == "Skipping bad line 2"));

        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(text, "\u{feff}id,tag\n1,\n2,x\n");
    }

    #[test]
    fn test_txt_to_docx_to_txt() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, "First line\n\nSecond line\n").unwrap();

        let docx = dir.path().join("notes.docx");
        let result = convert(Format::Txt, Format::Docx, &input, &docx).unwrap();
        assert_eq!(result.records, 2);

        let back = dir.path().join("back.txt");
        convert(Format::Docx, Format::Txt, &docx, &back).unwrap();
        let text = fs::read_to_string(&back).unwrap();
        assert!(text.contains("First line"));
        assert!(text.contains("Second line"));
    }

    #[test]
    fn test_csv_to_txt_uses_tab() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("data.csv");
        fs::write(&input, "a;b\n1;2\n").unwrap();
        let output = dir.path().join("data.txt");

        convert(Format::Csv, Format::Txt, &input, &output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "a\tb\n1\t2\n");
    }

    #[test]
    fn test_unsupported_pair() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("data.csv");
        fs::write(&input, "a\n").unwrap();

        let err = run_conversion(
            Format::Csv,
            Target::TxtOcr,
            &input,
            &dir.path().join("out.txt"),
            &ConversionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedConversion { .. }));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let err = convert(
            Format::Csv,
            Format::Json,
            &dir.path().join("nope.csv"),
            &dir.path().join("nope.json"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }

    #[test]
    fn test_output_must_differ_from_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("data.json");
        fs::write(&input, "[]").unwrap();

        // Read as text, written back as JSON over itself
        let err = convert(Format::Txt, Format::Json, &input, &input).unwrap_err();
        assert!(err.to_string().contains("same as the input"));
        assert_eq!(fs::read_to_string(&input).unwrap(), "[]");
    }

    #[test]
    fn test_failed_conversion_keeps_existing_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.json");
        fs::write(&input, "{ not json").unwrap();
        let output = dir.path().join("broken.csv");
        fs::write(&output, "previous").unwrap();

        assert!(convert(Format::Json, Format::Csv, &input, &output).is_err());
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_output_directories_are_created() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("lines.txt");
        fs::write(&input, "one\ntwo\n").unwrap();
        let output = dir.path().join("nested/deeper/lines.json");

        convert(Format::Txt, Format::Json, &input, &output).unwrap();
        assert!(output.is_file());
    }

    #[test]
    fn test_docx_with_table_to_csv() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("report.json");
        fs::write(
            &input,
            r#"[{"id": 1, "name": "alpha", "qty": 3, "price": 9},
                {"id": 2, "name": "beta", "qty": 4, "price": 7}]"#,
        )
        .unwrap();

        // JSON → CSV → DOCX builds a document holding one data table
        let csv = dir.path().join("report.csv");
        convert(Format::Json, Format::Csv, &input, &csv).unwrap();
        let docx = dir.path().join("report.docx");
        convert(Format::Csv, Format::Docx, &csv, &docx).unwrap();

        let back = dir.path().join("back.csv");
        let result = convert(Format::Docx, Format::Csv, &docx, &back).unwrap();
        assert_eq!(result.records, 3);
        let text = fs::read_to_string(&back).unwrap();
        assert!(text.contains("id,name,qty,price"));
        assert!(text.contains("2,beta,4,7"));
    }

    #[test]
    fn test_long_text_to_split_png_archive() {
        // Rendering needs a system font
        if FontBook::load(&[]).is_err() {
            return;
        }
        let dir = tempdir().unwrap();
        let input = dir.path().join("long.txt");
        let text: Vec<String> = (1..=120).map(|n| format!("line {n}")).collect();
        fs::write(&input, text.join("\n")).unwrap();

        let options = ConversionOptions {
            split: Some(true),
            ..Default::default()
        };
        let result = run_conversion(
            Format::Txt,
            Target::Format(Format::Png),
            &input,
            &dir.path().join("long.png"),
            &options,
        )
        .unwrap();
        assert_eq!(result.path, dir.path().join("long.zip"));
        assert!(result.path.is_file());
    }
}
