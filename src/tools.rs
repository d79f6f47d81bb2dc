//! Locating and running external programs
//!
//! LibreOffice, poppler's `pdftoppm` and `tesseract` are optional. Conversions
//! that need one fail with a `ToolMissing` error naming it when it is absent.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Mutex;

use log::{debug, trace};
use once_cell::sync::Lazy;

use crate::errors::{Result, external_tool_error, generic_error, tool_missing_error};

/// LibreOffice command line entry point
pub const SOFFICE: &str = "soffice";
/// Poppler PDF rasteriser
pub const PDFTOPPM: &str = "pdftoppm";
/// Tesseract OCR engine
pub const TESSERACT: &str = "tesseract";

/// Probe results by command name; a probe spawns the program once
static PROBED: Lazy<Mutex<HashMap<String, bool>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn candidates(tool: &str) -> &'static [&'static str] {
    match tool {
        SOFFICE => &["soffice", "libreoffice"],
        PDFTOPPM => &["pdftoppm"],
        TESSERACT => &["tesseract"],
        _ => &[],
    }
}

fn probe_arg(tool: &str) -> &'static str {
    if tool == PDFTOPPM { "-v" } else { "--version" }
}

fn probe(command: &str, arg: &str) -> bool {
    if let Ok(cache) = PROBED.lock()
        && let Some(found) = cache.get(command)
    {
        return *found;
    }
    let found = Command::new(command)
        .arg(arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok();
    trace!("Probed {command}: {found}");
    if let Ok(mut cache) = PROBED.lock() {
        cache.insert(command.to_string(), found);
    }
    found
}

/// Find a program on `PATH` by probing its usual command names
pub fn find_tool(tool: &str) -> Option<PathBuf> {
    candidates(tool)
        .iter()
        .find(|command| probe(command, probe_arg(tool)))
        .map(PathBuf::from)
}

/// External programs, with optional explicit paths from the configuration
#[derive(Debug, Clone, Default)]
pub struct Tools {
    overrides: BTreeMap<String, PathBuf>,
}

impl Tools {
    pub fn new(overrides: BTreeMap<String, PathBuf>) -> Tools {
        Tools { overrides }
    }

    /// Find a program: the configured path first, then the usual command names
    ///
    /// # Errors
    /// Returns `ToolMissing` when neither is available
    pub fn locate(&self, tool: &str) -> Result<PathBuf> {
        if let Some(path) = self.overrides.get(tool) {
            if path.exists() {
                return Ok(path.clone());
            }
            debug!("Configured path for {} does not exist: {}", tool, path.display());
        }
        find_tool(tool).ok_or_else(|| tool_missing_error(tool))
    }

    pub fn is_available(&self, tool: &str) -> bool {
        self.locate(tool).is_ok()
    }

    /// Run a program to completion and return its output
    ///
    /// # Errors
    /// Returns `ToolMissing` if the program cannot be found and
    /// `ExternalTool` if it exits unsuccessfully
    pub fn run<I, S>(&self, tool: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.locate(tool)?;
        let mut command = Command::new(&program);
        command.args(args);
        debug!("Running {command:?}");

        let output = command
            .output()
            .map_err(|e| external_tool_error(tool, &e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                output.status.to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(external_tool_error(tool, &detail));
        }
        Ok(output)
    }

    /// Convert a document with LibreOffice, e.g. `.doc` → `docx` or `.docx` → `pdf`
    ///
    /// # Errors
    /// Returns an error if LibreOffice is missing, fails, or writes nothing
    pub fn libreoffice_convert(&self, input: &Path, to: &str, outdir: &Path) -> Result<PathBuf> {
        self.run(
            SOFFICE,
            [
                OsStr::new("--headless"),
                OsStr::new("--convert-to"),
                OsStr::new(to),
                OsStr::new("--outdir"),
                outdir.as_os_str(),
                input.as_os_str(),
            ],
        )?;

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let expected = outdir.join(format!("{stem}.{to}"));
        if expected.exists() {
            return Ok(expected);
        }
        // Some versions change the file name, so take whatever was produced
        let pattern = format!("{}/*.{}", outdir.display(), to);
        glob::glob(&pattern)
            .map_err(|e| generic_error(&format!("Invalid pattern {pattern}: {e}")))?
            .flatten()
            .next()
            .ok_or_else(|| external_tool_error(SOFFICE, &format!("no {to} file was produced")))
    }

    /// Rasterise every PDF page into `dir` and return the images in page order
    ///
    /// # Errors
    /// Returns an error if pdftoppm is missing, fails, or produces no pages
    pub fn pdf_to_page_images(&self, pdf: &Path, dpi: u32, dir: &Path) -> Result<Vec<PathBuf>> {
        let prefix = dir.join("page");
        let dpi = dpi.to_string();
        self.run(
            PDFTOPPM,
            [
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-png"),
                pdf.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;

        let pattern = format!("{}/page-*.png", dir.display());
        let mut pages: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| generic_error(&format!("Invalid pattern {pattern}: {e}")))?
            .flatten()
            .collect();
        pages.sort_by_key(|path| page_number(path));
        if pages.is_empty() {
            return Err(external_tool_error(PDFTOPPM, "no pages were rendered"));
        }
        debug!("Rendered {} pages of {}", pages.len(), pdf.display());
        Ok(pages)
    }
}

/// Page number from a pdftoppm file name such as `page-07.png`
pub fn page_number(path: &Path) -> usize {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('-').next())
        .and_then(|number| number.parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), 1);
        assert_eq!(page_number(Path::new("page-010.png")), 10);
        assert_eq!(page_number(Path::new("cover.png")), usize::MAX);
    }

    #[test]
    fn test_unknown_tool_is_missing() {
        let tools = Tools::default();
        let err = tools.locate("definitely-not-a-real-tool").unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-tool not found"));
    }

    #[test]
    fn test_override_must_exist() {
        let mut overrides = BTreeMap::new();
        overrides.insert("no-such-tool".to_string(), PathBuf::from("/nonexistent/bin/tool"));
        let tools = Tools::new(overrides);
        assert!(!tools.is_available("no-such-tool"));
    }
}
