use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::{debug, warn};

use crate::constants::{APPLICATION, ORGANIZATION, QUALIFIER};
use crate::errors::{Result, file_operation_error, generic_error};

/// Locate the platform configuration directory, creating it when missing
pub(crate) fn find_project_folder() -> Result<ProjectDirs> {
    let folder = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .ok_or_else(|| generic_error("Failed to determine project directories"))?;

    if !folder.config_dir().exists() {
        create_dir_all(folder.config_dir())
            .map_err(|e| file_operation_error(e, folder.config_dir().to_path_buf(), "create"))?;
    }
    Ok(folder)
}

/// Create the parent directory of `path` if it does not exist yet
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        create_dir_all(parent).map_err(|e| file_operation_error(e, parent.to_path_buf(), "create"))?;
        debug!("Created directory {}", parent.display());
    }
    Ok(())
}

/// Return `path` with its extension replaced by `extension` unless it already has it
///
/// The comparison ignores case, so `Out.PNG` is left as it is for `png`.
pub fn force_extension(path: &Path, extension: &str) -> PathBuf {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
    if matches {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

/// Path next to `path` with the stem suffixed, e.g. `report.csv` → `report_images`
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

/// Remove a partially written output, ignoring a file that was never created
pub fn remove_partial_output(path: &Path) {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        return;
    };
    match result {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}

/// Decode raw bytes into text
///
/// A byte order mark decides the encoding when present. Otherwise the bytes
/// are read as UTF-8, falling back to Windows-1252 for legacy files.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return text.into_owned();
    }
    let (text, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    if !had_errors {
        return text.into_owned();
    }
    debug!("Input is not valid UTF-8, decoding as Windows-1252");
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Read a text file, detecting its encoding
pub fn read_text_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| file_operation_error(e, path.to_path_buf(), "read"))?;
    Ok(decode_text(&bytes))
}

/// Write UTF-8 text, optionally prefixed with a byte order mark for Excel
pub fn write_text_file(path: &Path, text: &str, with_bom: bool) -> Result<()> {
    let mut bytes = Vec::with_capacity(text.len() + 3);
    if with_bom {
        bytes.extend_from_slice(b"\xEF\xBB\xBF");
    }
    bytes.extend_from_slice(text.as_bytes());
    fs::write(path, bytes).map_err(|e| file_operation_error(e, path.to_path_buf(), "write"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_force_extension() {
        assert_eq!(
            force_extension(Path::new("out/report"), "png"),
            PathBuf::from("out/report.png")
        );
        assert_eq!(
            force_extension(Path::new("out/report.csv"), "zip"),
            PathBuf::from("out/report.zip")
        );
        assert_eq!(
            force_extension(Path::new("Report.PNG"), "png"),
            PathBuf::from("Report.PNG")
        );
    }

    #[test]
    fn test_sibling_with_suffix() {
        assert_eq!(
            sibling_with_suffix(Path::new("/data/report.csv"), "_images"),
            PathBuf::from("/data/report_images")
        );
    }

    #[test]
    fn test_decode_text_variants() {
        // UTF-8 with a byte order mark
        assert_eq!(decode_text(b"\xEF\xBB\xBFname,age"), "name,age");
        // UTF-16LE with a byte order mark
        assert_eq!(decode_text(b"\xFF\xFEa\x00b\x00"), "ab");
        // Latin-1 bytes that are not valid UTF-8
        assert_eq!(decode_text(b"caf\xE9"), "café");
    }

    #[test]
    fn test_ensure_parent_dir_and_bom_writing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/deeper/out.csv");

        ensure_parent_dir(&target).unwrap();
        write_text_file(&target, "a,b\n", true).unwrap();

        let bytes = fs::read(&target).unwrap();
        assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
        assert_eq!(read_text_file(&target).unwrap(), "a,b\n");
    }

    #[test]
    fn test_remove_partial_output() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("partial.csv");
        fs::write(&file, "x").unwrap();

        remove_partial_output(&file);
        assert!(!file.exists());

        // Removing a missing path is a no-op
        remove_partial_output(&file);
    }
}
