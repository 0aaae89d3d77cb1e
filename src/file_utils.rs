// File utilities for the diarization API
//
// This module contains utility functions for the per-request temp file lifecycle.
// Each request owns a unique directory holding the raw upload and the converted
// PCM file; the whole directory is removed when the request completes.

use log::{debug, error};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use uuid::Uuid;

use crate::config::JobPaths;

/// Generate a unique per-request directory with paths for the raw upload and
/// the converted WAV file.
///
/// # Errors
///
/// Returns an IO error if directory creation fails.
pub fn generate_unique_job_paths(base_dir: &str) -> io::Result<JobPaths> {
    let id = Uuid::new_v4().to_string();
    let folder = Path::new(base_dir).join(&id);

    fs::create_dir_all(&folder)?;

    let raw_file = folder.join(format!("upload_{}.audio", id));
    let wav_file = folder.join(format!("converted_{}.wav", id));

    Ok(JobPaths {
        folder,
        raw_file,
        wav_file,
        id,
    })
}

/// Save uploaded file data to the filesystem
pub fn save_file_data(data: &[u8], file_path: &Path) -> io::Result<()> {
    let mut file = File::create(file_path)?;
    file.write_all(data)?;
    Ok(())
}

/// Clean up a request's directory and everything in it.
///
/// This function logs errors but doesn't return them to the caller: cleanup
/// runs on every exit path and must never mask the original outcome.
pub fn cleanup_folder(folder_path: &Path) {
    if let Err(e) = fs::remove_dir_all(folder_path) {
        error!(
            "Failed to clean up folder {}: {}",
            folder_path.display(),
            e
        );
    } else {
        debug!("Cleaned up folder: {}", folder_path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn job_paths_are_unique_and_inside_the_base_dir() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_str().unwrap();

        let first = generate_unique_job_paths(base).unwrap();
        let second = generate_unique_job_paths(base).unwrap();

        assert_ne!(first.id, second.id);
        assert!(first.folder.starts_with(dir.path()));
        assert!(first.raw_file.starts_with(&first.folder));
        assert!(first.wav_file.starts_with(&first.folder));
        assert!(first.folder.is_dir());
    }

    #[test]
    fn cleanup_removes_the_folder_and_its_contents() {
        let dir = tempdir().unwrap();
        let paths = generate_unique_job_paths(dir.path().to_str().unwrap()).unwrap();

        save_file_data(b"not really audio", &paths.raw_file).unwrap();
        assert!(paths.raw_file.exists());

        cleanup_folder(&paths.folder);
        assert!(!paths.folder.exists());
        assert!(!paths.raw_file.exists());
    }

    #[test]
    fn cleanup_of_a_missing_folder_does_not_panic() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("never-created");
        cleanup_folder(&gone);
    }
}
