//! Rendering text lines into PNG images

use std::path::{Path, PathBuf};

use ab_glyph::PxScale;
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::draw_text_mut;
use log::{debug, info, warn};
use rayon::prelude::*;
use tempfile::TempDir;

use crate::constants::MAX_SAFE_IMAGE_HEIGHT;
use crate::errors::{Result, file_operation_error};
use crate::fonts::FontBook;
use crate::render::archive::zip_files;
use crate::render::pdf::wrap_words;
use crate::script::detect_script;
use crate::utils::force_extension;

/// Average glyph width as a share of the font size, used for wrapping
const GLYPH_WIDTH_FACTOR: f32 = 0.6;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Geometry of rendered text images, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterLayout {
    pub width: u32,
    pub margin: u32,
    pub font_size: f32,
    pub line_height: u32,
    /// Minimum height of each image; `None` sizes images to their content
    pub page_height: Option<u32>,
}

impl RasterLayout {
    /// Characters that fit on one line
    pub fn max_chars(&self) -> usize {
        let usable = self.width.saturating_sub(2 * self.margin) as f32;
        ((usable / (self.font_size * GLYPH_WIDTH_FACTOR)) as usize).max(1)
    }

    /// Height needed for `lines` wrapped lines
    pub fn height_for(&self, lines: usize) -> u32 {
        let content = self.margin * 2 + lines as u32 * self.line_height;
        match self.page_height {
            Some(page) => content.max(page),
            None => content,
        }
    }
}

/// Where rendered images ended up
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOutput {
    /// A single PNG or a zip of pages
    pub path: PathBuf,
    pub images: usize,
}

/// Wrap one line to the layout width
pub fn wrap_for_width(line: &str, layout: &RasterLayout) -> Vec<String> {
    let wrapped = wrap_words(line, layout.max_chars());
    if wrapped.is_empty() {
        vec![String::new()]
    } else {
        wrapped
    }
}

/// Render lines onto one white image, choosing a font per line by script
pub fn render_lines(lines: &[String], layout: &RasterLayout, fonts: &FontBook) -> RgbImage {
    let wrapped: Vec<(String, &ab_glyph::FontVec)> = lines
        .iter()
        .flat_map(|line| {
            let font = fonts.font_for(detect_script(line));
            wrap_for_width(line, layout)
                .into_iter()
                .map(move |piece| (piece, font))
        })
        .collect();

    let height = layout.height_for(wrapped.len());
    if height > MAX_SAFE_IMAGE_HEIGHT {
        warn!(
            "Image height {height}px is very large. Consider split output for better reliability."
        );
    }

    let mut image = RgbImage::from_pixel(layout.width, height, WHITE);
    let scale = PxScale::from(layout.font_size);
    let mut y = layout.margin as i32;
    for (piece, font) in &wrapped {
        if !piece.trim().is_empty() {
            draw_text_mut(&mut image, BLACK, layout.margin as i32, y, scale, *font, piece);
        }
        y += layout.line_height as i32;
    }
    image
}

/// Stack images top to bottom on a white background
pub fn merge_vertical(images: &[RgbImage]) -> RgbImage {
    let width = images.iter().map(|img| img.width()).max().unwrap_or(1);
    let height: u32 = images.iter().map(|img| img.height()).sum::<u32>().max(1);
    let mut merged = RgbImage::from_pixel(width, height, WHITE);
    let mut offset: i64 = 0;
    for img in images {
        imageops::replace(&mut merged, img, 0, offset);
        offset += img.height() as i64;
    }
    merged
}

fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Render lines as one PNG or as a zip of pages
///
/// With `split` off, every line goes into one image at `output` with its
/// extension forced to `.png`. With `split` on, lines are cut into groups of
/// `lines_per_image`, each group is rendered in parallel into a temporary
/// directory as `page_N.png`, and the pages are zipped at `output` with its
/// extension forced to `.zip`.
///
/// # Errors
/// Returns an error if an image cannot be written or the archive cannot be built
pub fn write_images(
    lines: &[String],
    output: &Path,
    layout: &RasterLayout,
    fonts: &FontBook,
    lines_per_image: usize,
    split: bool,
) -> Result<RasterOutput> {
    if !split {
        let path = force_extension(output, "png");
        let image = render_lines(lines, layout, fonts);
        save_png(&image, &path)?;
        info!("Rendered {} lines into {}", lines.len(), path.display());
        return Ok(RasterOutput { path, images: 1 });
    }

    let zip_path = force_extension(output, "zip");
    let pages_dir = TempDir::new()
        .map_err(|e| file_operation_error(e, std::env::temp_dir(), "create temporary directory in"))?;

    let chunks: Vec<&[String]> = lines.chunks(lines_per_image.max(1)).collect();
    let page_files = chunks
        .par_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let page_path = pages_dir.path().join(format!("page_{}.png", index + 1));
            let image = render_lines(chunk, layout, fonts);
            save_png(&image, &page_path)?;
            debug!("Rendered {}", page_path.display());
            Ok(page_path)
        })
        .collect::<Result<Vec<PathBuf>>>()?;

    zip_files(&page_files, &zip_path)?;
    info!("Rendered {} images into {}", page_files.len(), zip_path.display());
    Ok(RasterOutput {
        path: zip_path,
        images: page_files.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RasterLayout {
        RasterLayout {
            width: 1200,
            margin: 40,
            font_size: 12.0,
            line_height: 18,
            page_height: None,
        }
    }

    #[test]
    fn test_max_chars_formula() {
        // (1200 - 80) / (12 * 0.6) = 155.5
        assert_eq!(layout().max_chars(), 155);
    }

    #[test]
    fn test_height_for() {
        assert_eq!(layout().height_for(10), 80 + 180);

        let paged = RasterLayout {
            page_height: Some(1754),
            ..layout()
        };
        assert_eq!(paged.height_for(10), 1754);
        assert_eq!(paged.height_for(200), 80 + 200 * 18);
    }

    #[test]
    fn test_wrap_for_width_never_empty() {
        assert_eq!(wrap_for_width("", &layout()), vec![String::new()]);
        let long = "word ".repeat(100);
        assert!(wrap_for_width(&long, &layout()).len() > 1);
    }

    #[test]
    fn test_merge_vertical() {
        let top = RgbImage::from_pixel(10, 5, Rgb([0, 0, 0]));
        let bottom = RgbImage::from_pixel(20, 7, Rgb([0, 0, 0]));
        let merged = merge_vertical(&[top, bottom]);

        assert_eq!(merged.dimensions(), (20, 12));
        // The area to the right of the narrower top image stays white
        assert_eq!(merged.get_pixel(15, 2), &WHITE);
        assert_eq!(merged.get_pixel(15, 8), &BLACK);
    }
}
