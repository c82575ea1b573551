use std::fs;
use std::path::{Path, PathBuf};

use crate::EmbedError;

/// File extensions picked up from an image directory (case-insensitive).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Image files directly inside `dir`, sorted by path. Matrix rows of image
/// models follow this order.
pub fn image_files(dir: &Path) -> Result<Vec<PathBuf>, EmbedError> {
    if !dir.is_dir() {
        return Err(EmbedError::InvalidInput(format!(
            "image directory {} does not exist",
            dir.display()
        )));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_image && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
