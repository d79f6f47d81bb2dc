//! Locating TrueType fonts for raster text rendering

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use log::{debug, warn};

use crate::errors::{Result, generic_error};
use crate::script::{FALLBACK_RASTER_FONTS, Script, raster_font_candidates};

/// Directories searched for fonts after the configured ones
pub const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:/Windows/Fonts",
];

const ALL_SCRIPTS: [Script; 7] = [
    Script::Latin,
    Script::Devanagari,
    Script::Cjk,
    Script::Hangul,
    Script::Arabic,
    Script::Greek,
    Script::Other,
];

/// Find the first existing font file named `name` under `dirs`
///
/// Each directory is searched recursively, so `/usr/share/fonts` finds
/// `/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf`.
pub fn find_font_file(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    for dir in dirs {
        let direct = dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }
        let pattern = format!("{}/**/{}", dir.display(), name);
        let Ok(paths) = glob::glob(&pattern) else {
            continue;
        };
        if let Some(found) = paths.flatten().find(|path| path.is_file()) {
            return Some(found);
        }
    }
    None
}

/// Fonts loaded once per conversion, one per script
pub struct FontBook {
    fonts: Vec<FontVec>,
    by_script: HashMap<Script, usize>,
}

impl FontBook {
    /// Load a font for every script from the configured and system directories
    ///
    /// Scripts without a dedicated font share the first font found. The
    /// call fails only if no usable font exists at all.
    ///
    /// # Errors
    /// Returns an error if no font file can be found or parsed
    pub fn load(extra_dirs: &[PathBuf]) -> Result<FontBook> {
        let mut dirs: Vec<PathBuf> = extra_dirs.to_vec();
        dirs.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));

        let mut fonts = Vec::new();
        let mut loaded: HashMap<PathBuf, usize> = HashMap::new();
        let mut by_script = HashMap::new();

        for script in ALL_SCRIPTS {
            let candidates = raster_font_candidates(script)
                .iter()
                .chain(FALLBACK_RASTER_FONTS.iter());
            for name in candidates {
                let Some(path) = find_font_file(name, &dirs) else {
                    continue;
                };
                if let Some(index) = loaded.get(&path) {
                    by_script.insert(script, *index);
                    break;
                }
                match load_font(&path) {
                    Ok(font) => {
                        debug!("Using {} for {} text", path.display(), script);
                        fonts.push(font);
                        loaded.insert(path, fonts.len() - 1);
                        by_script.insert(script, fonts.len() - 1);
                        break;
                    }
                    Err(e) => warn!("{e}"),
                }
            }
        }

        if fonts.is_empty() {
            return Err(generic_error(
                "No TrueType font found. Install fonts-dejavu or fonts-noto, or list a font directory under `font_dirs` in the configuration.",
            ));
        }
        Ok(FontBook { fonts, by_script })
    }

    /// Build a book from a single font, used for every script
    pub fn single(font: FontVec) -> FontBook {
        FontBook {
            fonts: vec![font],
            by_script: HashMap::new(),
        }
    }

    /// Font for a script, falling back to the first loaded font
    pub fn font_for(&self, script: Script) -> &FontVec {
        let index = self.by_script.get(&script).copied().unwrap_or(0);
        &self.fonts[index]
    }
}

fn load_font(path: &Path) -> Result<FontVec> {
    let data = fs::read(path)
        .map_err(|e| generic_error(&format!("Failed to read font {}: {}", path.display(), e)))?;
    FontVec::try_from_vec(data)
        .map_err(|e| generic_error(&format!("Invalid font {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_font_file_searches_recursively() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("truetype/noto");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("NotoSans-Regular.ttf"), b"not really a font").unwrap();

        let found = find_font_file("NotoSans-Regular.ttf", &[dir.path().to_path_buf()]);
        assert_eq!(found, Some(nested.join("NotoSans-Regular.ttf")));

        assert!(find_font_file("missing.ttf", &[dir.path().to_path_buf()]).is_none());
    }

    #[test]
    fn test_invalid_font_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"garbage").unwrap();

        assert!(load_font(&path).is_err());
    }
}
