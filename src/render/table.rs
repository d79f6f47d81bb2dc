//! In-memory tables and the heuristics that build them from loose text

use serde_json::{Map, Value};

use crate::constants::ROW_SEPARATOR;

/// A header row plus data rows; rows may be ragged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table whose first row is the header
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Table {
        if rows.is_empty() {
            return Table::default();
        }
        let header = rows.remove(0);
        Table { header, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    /// Widest row, header included
    pub fn column_count(&self) -> usize {
        self.all_rows().map(|row| row.len()).max().unwrap_or(0)
    }

    /// Header followed by the data rows
    pub fn all_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        let header = if self.header.is_empty() {
            None
        } else {
            Some(&self.header)
        };
        header.into_iter().chain(self.rows.iter())
    }

    /// Every row rendered as `a | b | c`
    pub fn to_lines(&self) -> Vec<String> {
        self.all_rows().map(|row| row.join(ROW_SEPARATOR)).collect()
    }

    /// Every row joined with `delimiter`
    pub fn to_delimited(&self, delimiter: char) -> String {
        let delimiter = delimiter.to_string();
        let mut out = String::new();
        for row in self.all_rows() {
            out.push_str(&row.join(&delimiter));
            out.push('\n');
        }
        out
    }

    /// Data rows with at least one non-blank cell
    pub fn meaningful_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .count()
    }

    /// Header names with blanks replaced by `column_N`
    pub fn keys(&self) -> Vec<String> {
        let width = self.column_count();
        (0..width)
            .map(|i| match self.header.get(i) {
                Some(name) if !name.trim().is_empty() => name.clone(),
                _ => format!("column_{}", i + 1),
            })
            .collect()
    }
}

/// Pick the delimiter of a text sample
///
/// The first candidate that occurs in the first non-blank line wins.
/// When none occurs, `default` is returned.
pub fn auto_detect_delimiter(sample: &str, candidates: &[char], default: char) -> char {
    let first_line = sample.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    candidates
        .iter()
        .copied()
        .find(|candidate| first_line.contains(*candidate))
        .unwrap_or(default)
}

/// Split a line into trimmed cells
pub fn split_row(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(|cell| cell.trim().to_string()).collect()
}

/// Delimiters tried on the first line of extracted page text, in order
const PAGE_DELIMITERS: [char; 3] = [',', '\t', '|'];

/// Turn extracted page text into rows
///
/// Every line is split on the first of `,`, tab and `|` found in the first
/// line. Text with none of them is split on tabs, which leaves one cell per
/// line.
pub fn text_to_rows(page_text: &str) -> Vec<Vec<String>> {
    let lines: Vec<&str> = page_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let Some(first) = lines.first() else {
        return Vec::new();
    };

    let delimiter = auto_detect_delimiter(first, &PAGE_DELIMITERS, '\t');
    lines.iter().map(|line| split_row(line, delimiter)).collect()
}

/// Flatten nested JSON into dotted keys
///
/// Objects join their keys with `.` and arrays append `[i]`, so
/// `{"a": {"b": [1]}}` becomes `{"a.b[0]": 1}`. Scalars at the top level are
/// stored under `value`.
pub fn flatten_json(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    match value {
        Value::Object(_) | Value::Array(_) => flatten_into(value, "", &mut out),
        other => {
            out.insert("value".to_string(), other.clone());
        }
    }
    out
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Map<String, Value>) {
    match value {
        Value::Object(map) => {
            if map.is_empty() && !prefix.is_empty() {
                out.insert(prefix.to_string(), Value::Object(Map::new()));
            }
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, &path, out);
            }
        }
        Value::Array(items) => {
            if items.is_empty() && !prefix.is_empty() {
                out.insert(prefix.to_string(), Value::Array(Vec::new()));
            }
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, &format!("{prefix}[{index}]"), out);
            }
        }
        scalar => {
            out.insert(prefix.to_string(), scalar.clone());
        }
    }
}

/// Whether text looks like newline-delimited JSON
///
/// True when the whole text is not one JSON document but every non-blank
/// line is.
pub fn is_ndjson(text: &str) -> bool {
    if serde_json::from_str::<Value>(text).is_ok() {
        return false;
    }
    let mut lines = text.lines().filter(|line| !line.trim().is_empty()).peekable();
    lines.peek().is_some() && lines.all(|line| serde_json::from_str::<Value>(line).is_ok())
}

/// Render a JSON scalar or structure as a plain cell value
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_auto_detect_delimiter() {
        assert_eq!(auto_detect_delimiter("a;b;c\n1;2;3", &[',', '\t', ';', '|'], '\t'), ';');
        assert_eq!(auto_detect_delimiter("\n a,b", &[',', '\t'], '\t'), ',');
        // Nothing matches, so the default is used
        assert_eq!(auto_detect_delimiter("plain words", &[',', '|'], '\t'), '\t');
        // First candidate wins when several occur
        assert_eq!(auto_detect_delimiter("a,b|c", &['|', ','], '\t'), '|');
    }

    #[test]
    fn test_text_to_rows_picks_delimiter_from_first_line() {
        let rows = text_to_rows("name, age\nAlice, 30\n\nBob, 25\n");
        assert_eq!(rows, vec![row(&["name", "age"]), row(&["Alice", "30"]), row(&["Bob", "25"])]);

        let rows = text_to_rows("a | b\nc | d");
        assert_eq!(rows[1], row(&["c", "d"]));
    }

    #[test]
    fn test_text_to_rows_prefers_tab_over_pipe() {
        let rows = text_to_rows("a\tb | c\n1\t2 | 3");
        assert_eq!(rows, vec![row(&["a", "b | c"]), row(&["1", "2 | 3"])]);
    }

    #[test]
    fn test_text_to_rows_without_delimiter_keeps_lines_whole() {
        let rows = text_to_rows("Item      Qty   Price\nApple juice   2   3.50");
        assert_eq!(rows, vec![row(&["Item      Qty   Price"]), row(&["Apple juice   2   3.50"])]);
        assert!(text_to_rows("   \n  ").is_empty());
    }

    #[test]
    fn test_flatten_json() {
        let value = json!({"id": 1, "user": {"name": "A", "tags": ["x", "y"]}});
        let flat = flatten_json(&value);
        assert_eq!(flat.get("id"), Some(&json!(1)));
        assert_eq!(flat.get("user.name"), Some(&json!("A")));
        assert_eq!(flat.get("user.tags[1]"), Some(&json!("y")));

        let scalar = flatten_json(&json!(5));
        assert_eq!(scalar.get("value"), Some(&json!(5)));
    }

    #[test]
    fn test_is_ndjson() {
        assert!(is_ndjson("{\"a\":1}\n{\"a\":2}\n"));
        assert!(!is_ndjson("[{\"a\":1}]"));
        assert!(!is_ndjson("{\"a\":1}\nnot json"));
        assert!(!is_ndjson(""));
    }

    #[test]
    fn test_table_helpers() {
        let table = Table::from_rows(vec![
            row(&["a", ""]),
            row(&["1", "2", "3"]),
            row(&["", ""]),
        ]);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.meaningful_rows(), 1);
        assert_eq!(table.keys(), vec!["a", "column_2", "column_3"]);
        assert_eq!(table.to_lines()[1], "1 | 2 | 3");
        assert_eq!(table.to_delimited('\t'), "a\t\n1\t2\t3\n\t\n");
    }
}
