//! Packing rendered pages into a zip archive

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{Result, file_operation_error, generic_error};

/// Write `files` into a deflated zip at `zip_path`, stored by file name only
///
/// # Errors
/// Returns an error if a file cannot be read or the archive cannot be written
pub fn zip_files(files: &[PathBuf], zip_path: &Path) -> Result<()> {
    let file = File::create(zip_path)
        .map_err(|e| file_operation_error(e, zip_path.to_path_buf(), "create"))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| generic_error(&format!("Invalid file name: {}", path.display())))?;
        let bytes = fs::read(path).map_err(|e| file_operation_error(e, path.clone(), "read"))?;
        writer.start_file(name, options)?;
        writer
            .write_all(&bytes)
            .map_err(|e| file_operation_error(e, zip_path.to_path_buf(), "write"))?;
        debug!("Added {name} to {}", zip_path.display());
    }

    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_zip_files_stores_names_only() {
        let dir = tempdir().unwrap();
        let pages = dir.path().join("pages");
        fs::create_dir_all(&pages).unwrap();
        let first = pages.join("page_1.png");
        let second = pages.join("page_2.png");
        fs::write(&first, b"one").unwrap();
        fs::write(&second, b"two").unwrap();

        let zip_path = dir.path().join("out.zip");
        zip_files(&[first, second], &zip_path).unwrap();

        let archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["page_1.png", "page_2.png"]);
    }
}
