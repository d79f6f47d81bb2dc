//! Optical character recognition through the tesseract command line

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::median_filter;
use log::{debug, info};

use crate::errors::{Result, file_operation_error, generic_error};
use crate::script::guess_language;
use crate::tools::{TESSERACT, Tools};

/// Languages used for the quick detection pass and for `auto`
pub const AUTO_LANGS: &[&str] = &["en", "hi"];

/// Language codes the recogniser is asked for after detection
const SUPPORTED_LANGS: &[&str] = &[
    "en", "hi", "es", "fr", "de", "ru", "ja", "ko", "ch_sim", "ch_tra", "ar", "el",
];

/// Something that turns an image file into text
pub trait OcrEngine {
    /// Recognise text in `image` using tesseract-style language codes (`eng+hin`)
    fn recognize(&self, image: &Path, langs: &str) -> Result<String>;
}

/// The tesseract executable
pub struct Tesseract {
    tools: Tools,
}

impl Tesseract {
    pub fn new(tools: Tools) -> Tesseract {
        Tesseract { tools }
    }
}

impl OcrEngine for Tesseract {
    fn recognize(&self, image: &Path, langs: &str) -> Result<String> {
        let output = self.tools.run(
            TESSERACT,
            [
                image.as_os_str(),
                "stdout".as_ref(),
                "-l".as_ref(),
                langs.as_ref(),
                "--oem".as_ref(),
                "3".as_ref(),
                "--psm".as_ref(),
                "6".as_ref(),
            ],
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Map short language codes to tesseract codes joined with `+`
///
/// Unknown codes pass through unchanged, so `eng` or `tam` still work.
pub fn tesseract_langs(codes: &[String]) -> String {
    codes
        .iter()
        .map(|code| match code.as_str() {
            "en" => "eng",
            "hi" => "hin",
            "es" => "spa",
            "fr" => "fra",
            "de" => "deu",
            "ru" => "rus",
            "ja" => "jpn",
            "ko" => "kor",
            "ch_sim" => "chi_sim",
            "ch_tra" => "chi_tra",
            "ar" => "ara",
            "el" => "ell",
            other => other,
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Parse `en,hi` style input; `auto` stands for the detection languages
pub fn parse_langs(input: &str) -> Vec<String> {
    if input.trim().eq_ignore_ascii_case("auto") {
        return AUTO_LANGS.iter().map(|lang| lang.to_string()).collect();
    }
    input
        .split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

/// Scale contrast around mid-grey, then scale brightness
fn enhance(image: &GrayImage, contrast: f32, brightness: f32) -> GrayImage {
    let mean = if image.is_empty() {
        128.0
    } else {
        image.pixels().map(|p| p[0] as f32).sum::<f32>() / (image.width() * image.height()) as f32
    };
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[0] as f32;
        let contrasted = mean + contrast * (value - mean);
        Luma([(contrasted * brightness).clamp(0.0, 255.0) as u8])
    })
}

/// Prepare an image for recognition
///
/// The image is always converted to greyscale. Strong mode also removes
/// speckle with a 3×3 median filter and doubles the contrast and lifts the
/// brightness by half, which helps faint scans.
pub fn preprocess(image: &DynamicImage, strong: bool) -> GrayImage {
    let gray = image.to_luma8();
    if !strong {
        return gray;
    }
    let filtered = median_filter(&gray, 1, 1);
    enhance(&filtered, 2.0, 1.5)
}

/// Pick recognition languages for `auto` from a quick first pass
///
/// The script of the first-pass text suggests a language, which is used
/// together with English. Unsupported guesses fall back to English alone.
pub fn detect_langs(first_pass: &str) -> Vec<String> {
    if first_pass.trim().is_empty() {
        return vec!["en".to_string()];
    }
    let guess = guess_language(first_pass);
    debug!("Detected language: {guess}");
    if guess == "en" {
        vec!["en".to_string()]
    } else if SUPPORTED_LANGS.contains(&guess) {
        vec![guess.to_string(), "en".to_string()]
    } else {
        vec!["en".to_string()]
    }
}

/// Recognise text in an image file; the result may be empty
///
/// # Errors
/// Returns an error if the image cannot be read or the engine fails
pub fn recognize_text(
    engine: &dyn OcrEngine,
    path: &Path,
    lang: &str,
    strong: bool,
) -> Result<String> {
    let image = image::open(path)?;
    let prepared = preprocess(&image, strong);

    let temp = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .map_err(|e| file_operation_error(e, std::env::temp_dir(), "create temporary file in"))?;
    prepared.save_with_format(temp.path(), image::ImageFormat::Png)?;

    let langs = if lang.trim().eq_ignore_ascii_case("auto") {
        let quick = engine.recognize(temp.path(), &tesseract_langs(&parse_langs("auto")))?;
        detect_langs(&quick)
    } else {
        parse_langs(lang)
    };
    let tess_langs = tesseract_langs(&langs);
    info!("Running OCR on {} with {}", path.display(), tess_langs);

    Ok(engine.recognize(temp.path(), &tess_langs)?.trim().to_string())
}

/// Recognise text in an image file
///
/// # Errors
/// Returns an error if the image cannot be read, the engine fails, or no
/// text is recognised
pub fn ocr_image(engine: &dyn OcrEngine, path: &Path, lang: &str, strong: bool) -> Result<String> {
    let text = recognize_text(engine, path, lang, strong)?;
    if text.is_empty() {
        return Err(generic_error(&format!(
            "OCR produced no text for {}",
            path.display()
        )));
    }
    Ok(text)
}
