//! Building Word documents with docx-rs

use std::fs::File;
use std::path::Path;

use docx_rs::{
    BreakType, Docx, Paragraph, Run, RunFonts, Table as DocxTable, TableCell, TableRow,
};
use log::debug;

use crate::errors::{Result, document_error, file_operation_error};
use crate::render::table::Table;
use crate::script::{detect_script, office_font};

/// Accumulates paragraphs and tables, then packs them into a `.docx`
pub struct DocxBuilder {
    docx: Docx,
    /// Run size in half-points, as Word stores it
    half_points: usize,
    blocks: usize,
}

impl DocxBuilder {
    /// Start an empty document whose runs use `font_size` points
    pub fn new(font_size: f32) -> DocxBuilder {
        DocxBuilder {
            docx: Docx::new(),
            half_points: (font_size * 2.0).round().max(2.0) as usize,
            blocks: 0,
        }
    }

    fn run(&self, text: &str) -> Run {
        let font = office_font(detect_script(text));
        Run::new()
            .add_text(text)
            .size(self.half_points)
            .fonts(
                RunFonts::new()
                    .ascii(font)
                    .hi_ansi(font)
                    .east_asia(font)
                    .cs(font),
            )
    }

    /// Add a bold heading twice the body size
    pub fn heading(mut self, text: &str) -> Self {
        let run = self.run(text).bold().size(self.half_points * 2);
        self.docx = self.docx.add_paragraph(Paragraph::new().add_run(run));
        self.blocks += 1;
        self
    }

    /// Add a paragraph; the font follows the script of the text
    pub fn paragraph(mut self, text: &str) -> Self {
        let run = self.run(text);
        self.docx = self.docx.add_paragraph(Paragraph::new().add_run(run));
        self.blocks += 1;
        self
    }

    /// Add a multi-line block, one paragraph per line
    pub fn lines(mut self, text: &str) -> Self {
        for line in text.lines() {
            self = self.paragraph(line);
        }
        self
    }

    /// Add a table; ragged rows are padded with empty cells
    pub fn table(mut self, table: &Table) -> Self {
        let width = table.column_count().max(1);
        let rows: Vec<TableRow> = table
            .all_rows()
            .map(|row| {
                let cells = (0..width)
                    .map(|i| {
                        let text = row.get(i).map(String::as_str).unwrap_or("");
                        TableCell::new().add_paragraph(Paragraph::new().add_run(self.run(text)))
                    })
                    .collect();
                TableRow::new(cells)
            })
            .collect();
        if !rows.is_empty() {
            self.docx = self.docx.add_table(DocxTable::new(rows));
            self.blocks += 1;
        }
        self
    }

    /// Start the following content on a new page
    pub fn page_break(mut self) -> Self {
        self.docx = self
            .docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        self
    }

    /// Paragraphs and tables added so far
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Pack the document into `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or packed
    pub fn save(self, path: &Path) -> Result<usize> {
        let file = File::create(path).map_err(|e| file_operation_error(e, path.to_path_buf(), "create"))?;
        let blocks = self.blocks;
        self.docx
            .build()
            .pack(file)
            .map_err(|e| document_error(&format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Wrote {} blocks to {}", blocks, path.display());
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builder_counts_blocks_and_writes_zip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.docx");

        let table = Table::from_rows(vec![vec!["a".to_string(), "b".to_string()], vec!["1".to_string()]]);
        let builder = DocxBuilder::new(11.0)
            .heading("Title")
            .paragraph("नमस्ते")
            .page_break()
            .table(&table);
        assert_eq!(builder.blocks(), 3);

        builder.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // A .docx is a zip archive
        assert!(bytes.starts_with(b"PK"));
    }
}
