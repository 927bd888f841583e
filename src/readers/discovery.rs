use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DATA_FILE_EXTENSION, METADATA_FILE_EXTENSION};
use std::fs;
use std::path::{Path, PathBuf};

/// Data files of a station directory, sorted by file name, optionally truncated to the first `limit`
pub fn discover_data_files(dir: &Path, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ProcessingError::Discovery(format!(
            "Source path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files = files_with_extension(dir, DATA_FILE_EXTENSION)?;
    if let Some(limit) = limit {
        files.truncate(limit);
    }

    if files.is_empty() {
        return Err(ProcessingError::Discovery(format!(
            "No .{} files found in {}",
            DATA_FILE_EXTENSION,
            dir.display()
        )));
    }

    tracing::info!(
        directory = %dir.display(),
        files = files.len(),
        "Discovered station log files"
    );

    Ok(files)
}

/// First metadata description file in the directory, by file name
pub fn find_metadata_file(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(files_with_extension(dir, METADATA_FILE_EXTENSION)?
        .into_iter()
        .next())
}

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
