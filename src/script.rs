//! Writing-system detection used to pick fonts and guess OCR languages

use std::collections::BTreeSet;
use std::fmt;

/// Writing system of a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Script {
    Latin,
    Devanagari,
    Cjk,
    Hangul,
    Arabic,
    Greek,
    /// Non-ASCII text outside the ranges above
    Other,
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Script::Latin => "Latin",
            Script::Devanagari => "Devanagari",
            Script::Cjk => "CJK",
            Script::Hangul => "Hangul",
            Script::Arabic => "Arabic",
            Script::Greek => "Greek",
            Script::Other => "Other",
        };
        f.write_str(name)
    }
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn is_kana(c: char) -> bool {
    ('\u{3040}'..='\u{30FF}').contains(&c)
}

fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c) || ('\u{3400}'..='\u{4DBF}').contains(&c) || is_kana(c)
}

fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7AF}').contains(&c)
}

fn is_arabic(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c) || ('\u{0750}'..='\u{077F}').contains(&c)
}

fn is_greek(c: char) -> bool {
    ('\u{0370}'..='\u{03FF}').contains(&c)
}

/// Classify `text` into a single script bucket
///
/// The first character that falls in a known range (Devanagari, CJK,
/// Hangul, Arabic, Greek) decides. Text with no such character is `Other`
/// when it holds non-ASCII characters and `Latin` otherwise, including
/// empty text.
pub fn detect_script(text: &str) -> Script {
    text.chars()
        .find_map(script_of)
        .unwrap_or(if text.is_ascii() {
            Script::Latin
        } else {
            Script::Other
        })
}

fn script_of(c: char) -> Option<Script> {
    if is_devanagari(c) {
        Some(Script::Devanagari)
    } else if is_cjk(c) {
        Some(Script::Cjk)
    } else if is_hangul(c) {
        Some(Script::Hangul)
    } else if is_arabic(c) {
        Some(Script::Arabic)
    } else if is_greek(c) {
        Some(Script::Greek)
    } else {
        None
    }
}

/// Every script present in a text, for user notices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub scripts: BTreeSet<Script>,
    pub has_non_ascii: bool,
}

impl ScriptReport {
    /// Comma separated script names, e.g. `CJK, Devanagari`
    pub fn names(&self) -> String {
        self.scripts
            .iter()
            .map(|script| script.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Collect every non-Latin script used anywhere in `text`
pub fn scan_scripts(text: &str) -> ScriptReport {
    let mut report = ScriptReport::default();
    for c in text.chars() {
        if c.is_ascii() {
            continue;
        }
        report.has_non_ascii = true;
        let script = script_of(c).unwrap_or(Script::Other);
        report.scripts.insert(script);
    }
    report
}

/// Font family name used in office documents for a script
pub fn office_font(script: Script) -> &'static str {
    match script {
        Script::Latin => "Times New Roman",
        Script::Devanagari => "Nirmala UI",
        Script::Cjk => "SimSun",
        Script::Hangul => "Malgun Gothic",
        Script::Arabic => "Amiri",
        Script::Greek => "Palatino Linotype",
        Script::Other => "Arial",
    }
}

/// TrueType file names tried, in order, when rasterising text of a script
pub fn raster_font_candidates(script: Script) -> &'static [&'static str] {
    match script {
        Script::Latin | Script::Greek => &[
            "LiberationSans-Regular.ttf",
            "DejaVuSans.ttf",
            "arial.ttf",
            "Arial.ttf",
        ],
        Script::Devanagari => &[
            "NotoSansDevanagari-Regular.ttf",
            "NotoSansDevanagari-Medium.ttf",
            "Nirmala.ttf",
        ],
        Script::Cjk => &[
            "NotoSansCJK-Regular.ttc",
            "NotoSansCJKsc-Regular.otf",
            "wqy-microhei.ttc",
            "msyh.ttc",
        ],
        Script::Hangul => &["NotoSansKR-Regular.otf", "NotoSansCJK-Regular.ttc", "malgun.ttf"],
        Script::Arabic => &["NotoSansArabic-Regular.ttf", "Amiri-Regular.ttf", "arial.ttf"],
        Script::Other => &["DejaVuSans.ttf"],
    }
}

/// Fonts tried after the script-specific candidates
pub const FALLBACK_RASTER_FONTS: &[&str] = &["arialuni.ttf", "NotoSans-Regular.ttf", "DejaVuSans.ttf"];

/// Guess a language code for OCR from the script of a text sample
pub fn guess_language(text: &str) -> &'static str {
    match detect_script(text) {
        Script::Devanagari => "hi",
        Script::Cjk if text.chars().any(is_kana) => "ja",
        Script::Cjk => "ch_sim",
        Script::Hangul => "ko",
        Script::Arabic => "ar",
        Script::Greek => "el",
        Script::Latin | Script::Other => "en",
    }
}
