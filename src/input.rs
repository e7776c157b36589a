//! Input discovery for the folder-based batch

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::config::OutputFormat;
use crate::error::{Result, PadResizeError};
use crate::processing::{has_supported_extension, ProcessingItem};

/// List the supported images directly inside `input_dir`, sorted by path.
///
/// Subdirectories are not descended into.
pub async fn discover_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(PadResizeError::config(format!(
            "The specified input folder does not exist: {}",
            input_dir.display()
        )));
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(input_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();

        if entry.file_type().await?.is_file() && has_supported_extension(&path) {
            files.push(path);
        } else {
            debug!("Skipping {:?}", path);
        }
    }

    // Sort files for consistent processing order
    files.sort();
    Ok(files)
}

/// Batch items for every supported image in `input_dir`
pub async fn folder_items(
    input_dir: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<Vec<ProcessingItem>> {
    let files = discover_images(input_dir).await?;

    Ok(files
        .iter()
        .map(|path| ProcessingItem::from_path(path, output_dir, format))
        .collect())
}
