//! Reading workbooks with calamine and writing them with rust_xlsxwriter

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use log::{debug, info};
use rust_xlsxwriter::{Format, Workbook};

use crate::errors::{Result, spreadsheet_error};
use crate::render::table::Table;
use crate::script::{Script, detect_script, office_font};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Render a cell as text; whole floats print without a fraction
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Read one sheet of a workbook into a table whose first row is the header
///
/// `sheet` picks a sheet by name; without it the first sheet is used.
///
/// # Errors
/// Returns an error if the workbook cannot be opened, has no sheets, or the
/// named sheet does not exist
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| spreadsheet_error(&format!("Failed to open {}: {}", path.display(), e)))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                spreadsheet_error(&format!(
                    "Sheet '{}' not found. Available sheets: {}",
                    wanted,
                    names.join(", ")
                ))
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| spreadsheet_error("Workbook has no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| spreadsheet_error(&format!("Failed to read sheet '{name}': {e}")))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    debug!("Read {} rows from sheet '{}'", rows.len(), name);
    Ok(Table::from_rows(rows))
}

/// Write tables to an XLSX workbook, one sheet per table
///
/// With `script_fonts` on, cells holding non-Latin text get the office font
/// for their script so Excel shows them without substitution.
///
/// # Errors
/// Returns an error if a table exceeds the sheet limits or the file cannot be saved
pub fn write_xlsx(path: &Path, sheets: &[(String, Table)], script_fonts: bool) -> Result<usize> {
    let mut workbook = Workbook::new();
    let mut formats: HashMap<Script, Format> = HashMap::new();
    let mut written = 0;

    for (name, table) in sheets {
        let row_count = table.all_rows().count();
        if row_count > MAX_ROWS || table.column_count() > MAX_COLUMNS {
            return Err(spreadsheet_error(&format!(
                "Sheet '{name}' is too large for XLSX ({row_count} rows, {} columns)",
                table.column_count()
            )));
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;

        for (row_index, row) in table.all_rows().enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let row_number = row_index as u32;
                let col_number = col_index as u16;
                let script = if script_fonts {
                    detect_script(cell)
                } else {
                    Script::Latin
                };
                if script == Script::Latin {
                    worksheet.write_string(row_number, col_number, cell)?;
                } else {
                    let format = formats
                        .entry(script)
                        .or_insert_with(|| Format::new().set_font_name(office_font(script)));
                    worksheet.write_string_with_format(row_number, col_number, cell, format)?;
                }
            }
            written += 1;
        }
    }

    if sheets.is_empty() {
        workbook.add_worksheet();
    }
    workbook.save(path)?;
    info!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}
