//! Delayed removal of produced files

use std::fs;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

/// Remove `path` after `delay` on a background thread
///
/// Directories are removed with their contents. Removal is best effort: a
/// failure is logged and nothing happens if the process exits first.
pub fn schedule_delete(path: PathBuf, delay: Duration) -> JoinHandle<()> {
    debug!("Scheduling removal of {} in {:?}", path.display(), delay);
    thread::spawn(move || {
        thread::sleep(delay);
        let result = if path.is_dir() {
            fs_extra::dir::remove(&path).map_err(|e| e.to_string())
        } else if path.exists() {
            fs::remove_file(&path).map_err(|e| e.to_string())
        } else {
            return;
        };
        match result {
            Ok(()) => info!("Deleted {}", path.display()),
            Err(e) => warn!("Could not delete {}: {}", path.display(), e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_is_removed_after_delay() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("out.csv");
        fs::write(&file, "a,b").unwrap();

        schedule_delete(file.clone(), Duration::from_millis(10))
            .join()
            .unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_directory_is_removed_with_contents() {
        let dir = tempdir().unwrap();
        let pages = dir.path().join("pages");
        fs::create_dir(&pages).unwrap();
        fs::write(pages.join("page_1.png"), b"x").unwrap();

        schedule_delete(pages.clone(), Duration::ZERO).join().unwrap();
        assert!(!pages.exists());
    }

    #[test]
    fn test_missing_path_is_ignored() {
        let dir = tempdir().unwrap();
        schedule_delete(dir.path().join("gone"), Duration::ZERO)
            .join()
            .unwrap();
    }
}
