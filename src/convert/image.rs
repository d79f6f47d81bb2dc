//! Raster image input

use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use log::debug;

use crate::convert::{ConversionOptions, ConversionOutput};
use crate::errors::{Result, invalid_input_error};
use crate::ocr::{Tesseract, ocr_image};
use crate::utils::write_text_file;

/// Composite an image onto white, dropping its alpha channel
pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |channel: u8| ((channel as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Re-encode an image in the format named by the output extension
pub fn convert_image(input: &Path, output: &Path, _options: &ConversionOptions) -> Result<ConversionOutput> {
    let format = ImageFormat::from_path(output).map_err(|_| {
        invalid_input_error(output.to_path_buf(), "Output extension is not an image format")
    })?;
    let image = image::open(input)?;
    debug!("Re-encoding {}x{} image as {:?}", image.width(), image.height(), format);

    if format == ImageFormat::Jpeg {
        flatten_on_white(&image).save_with_format(output, format)?;
    } else {
        image.save_with_format(output, format)?;
    }
    Ok(ConversionOutput::new(output.to_path_buf(), 1))
}

/// Recognise the text of an image
pub fn to_txt(input: &Path, output: &Path, options: &ConversionOptions) -> Result<ConversionOutput> {
    let engine = Tesseract::new(options.tools.clone());
    let text = ocr_image(&engine, input, &options.lang, options.strong_preprocess)?;
    write_text_file(output, &text, false)?;
    Ok(ConversionOutput::new(output.to_path_buf(), text.lines().count()))
}
