//! Writing simple text and image PDFs with printpdf

use std::fs;
use std::path::Path;

use image::RgbImage;
use log::debug;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};

use crate::errors::{Result, file_operation_error};

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;

/// Average Helvetica glyph width as a share of the font size
const HELVETICA_WIDTH_FACTOR: f32 = 0.5;

enum PageContent {
    Lines(Vec<(f32, String)>),
    Image(RgbImage),
}

/// A top-to-bottom text flow on A4 pages using the built-in Helvetica font
///
/// Lines are laid out from the top margin downwards and a new page starts
/// when the cursor would cross the bottom margin.
pub struct TextPdf {
    title: String,
    margin: f32,
    font_size: f32,
    line_gap: f32,
    pages: Vec<PageContent>,
    cursor: f32,
}

impl TextPdf {
    /// Create a writer; all measurements are in points
    pub fn new(title: &str, margin: f32, font_size: f32, line_gap: f32) -> TextPdf {
        TextPdf {
            title: title.to_string(),
            margin,
            font_size,
            line_gap,
            pages: Vec::new(),
            cursor: 0.0,
        }
    }

    fn page_height() -> f32 {
        Mm(A4_HEIGHT_MM).into_pt().0
    }

    fn page_width() -> f32 {
        Mm(A4_WIDTH_MM).into_pt().0
    }

    /// Characters that fit between the margins at the current font size
    pub fn chars_per_line(&self) -> usize {
        let usable = Self::page_width() - 2.0 * self.margin;
        ((usable / (self.font_size * HELVETICA_WIDTH_FACTOR)) as usize).max(1)
    }

    fn start_page(&mut self) {
        self.pages.push(PageContent::Lines(Vec::new()));
        self.cursor = Self::page_height() - self.margin;
    }

    /// Add one line without wrapping
    pub fn push_line(&mut self, line: &str) {
        let needs_page = match self.pages.last() {
            Some(PageContent::Lines(_)) => self.cursor < self.margin,
            _ => true,
        };
        if needs_page {
            self.start_page();
        }
        let y = self.cursor;
        if let Some(PageContent::Lines(lines)) = self.pages.last_mut() {
            lines.push((y, sanitize(line)));
        }
        self.cursor -= self.line_gap;
    }

    /// Add a line cut into pieces of at most `max_chars` characters
    pub fn push_chunked(&mut self, line: &str, max_chars: usize) {
        for chunk in chunk_chars(line, max_chars) {
            self.push_line(&chunk);
        }
    }

    /// Add text word-wrapped to the page width; empty lines keep their space
    pub fn push_wrapped(&mut self, text: &str) {
        let width = self.chars_per_line();
        for line in wrap_words(text, width) {
            self.push_line(&line);
        }
    }

    /// Continue on a fresh page
    pub fn page_break(&mut self) {
        self.start_page();
    }

    /// Add a page holding one image scaled to fit inside the margins
    pub fn add_image_page(&mut self, image: RgbImage) {
        self.pages.push(PageContent::Image(image));
        // Text after an image page starts on a new page
        self.cursor = -1.0;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialise the document
    pub fn to_bytes(self) -> Vec<u8> {
        let page_w = Mm(A4_WIDTH_MM);
        let page_h = Mm(A4_HEIGHT_MM);
        let mut doc = PdfDocument::new(&self.title);
        let mut pages = Vec::with_capacity(self.pages.len());

        for content in self.pages {
            let ops = match content {
                PageContent::Lines(lines) => text_ops(&lines, self.margin, self.font_size),
                PageContent::Image(image) => image_ops(&mut doc, image, self.margin),
            };
            pages.push(PdfPage::new(page_w, page_h, ops));
        }
        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        debug!("Writing PDF '{}' with {} pages", self.title, pages.len());
        doc.with_pages(pages);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        doc.save(&PdfSaveOptions::default(), &mut warnings)
    }

    /// Serialise the document into `path`
    pub fn save(self, path: &Path) -> Result<usize> {
        let pages = self.page_count().max(1);
        let bytes = self.to_bytes();
        fs::write(path, bytes).map_err(|e| file_operation_error(e, path.to_path_buf(), "write"))?;
        Ok(pages)
    }
}

fn text_ops(lines: &[(f32, String)], margin: f32, font_size: f32) -> Vec<Op> {
    let mut ops = Vec::with_capacity(lines.len() * 5);
    for (y, line) in lines {
        if line.is_empty() {
            continue;
        }
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(margin),
                y: Pt(*y),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(font_size),
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.clone())],
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::EndTextSection);
    }
    ops
}

fn image_ops(doc: &mut PdfDocument, image: RgbImage, margin: f32) -> Vec<Op> {
    let (width, height) = image.dimensions();
    let raw = RawImage {
        pixels: RawImageData::U8(image.into_raw()),
        width: width as usize,
        height: height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };
    let id = doc.add_image(&raw);

    let dpi: f32 = 72.0;
    let usable_w = TextPdf::page_width() - 2.0 * margin;
    let usable_h = TextPdf::page_height() - 2.0 * margin;
    let scale = (usable_w / width as f32).min(usable_h / height as f32);
    let rendered_h = height as f32 * scale;

    vec![Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(Pt(margin)),
            translate_y: Some(Pt(TextPdf::page_height() - margin - rendered_h)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(dpi),
            rotate: None,
        },
    }]
}

/// The built-in fonts only cover Latin-1, so other characters become `?`
fn sanitize(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if (c as u32) < 0x20 => ' ',
            c if (c as u32) <= 0xFF => c,
            '–' | '—' => '-',
            '‘' | '’' => '\'',
            '“' | '”' => '"',
            _ => '?',
        })
        .collect()
}

/// Cut a line into pieces of `max_chars` characters; an empty line yields one blank piece
pub fn chunk_chars(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_chars.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Word-wrap text so no line exceeds `max_width` characters
///
/// Existing newlines are kept, blank lines stay blank, and words longer than
/// the width are force-broken.
pub fn wrap_words(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let mut pieces = chunk_chars(word, max_width);
                let last = pieces.pop().unwrap_or_default();
                result.extend(pieces);
                current_len = last.chars().count();
                current = last;
            } else if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words("the quick brown fox", 9), vec!["the quick", "brown fox"]);
        // Blank lines are kept
        assert_eq!(wrap_words("a\n\nb", 10), vec!["a", "", "b"]);
        // Long words are broken
        assert_eq!(wrap_words("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_chunk_chars_counts_characters() {
        assert_eq!(chunk_chars("नमस्ते", 2).len(), 3);
        assert_eq!(chunk_chars("", 180), vec![String::new()]);
    }

    #[test]
    fn test_sanitize_replaces_unsupported_characters() {
        assert_eq!(sanitize("café\tok"), "café ok");
        assert_eq!(sanitize("你好"), "??");
        assert_eq!(sanitize("a — b"), "a - b");
    }

    #[test]
    fn test_pages_break_at_bottom_margin() {
        let mut pdf = TextPdf::new("test", 40.0, 10.0, 14.0);
        // A4 is ~842pt tall, so 100 lines at 14pt need two pages
        for i in 0..100 {
            pdf.push_line(&format!("line {i}"));
        }
        assert_eq!(pdf.page_count(), 2);
    }

    #[test]
    fn test_save_writes_pdf_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let mut pdf = TextPdf::new("test", 40.0, 12.0, 16.0);
        pdf.push_wrapped("hello world");
        pdf.add_image_page(RgbImage::new(10, 10));
        let pages = pdf.save(&path).unwrap();

        assert_eq!(pages, 2);
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
