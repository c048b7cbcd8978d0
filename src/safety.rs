//! Safety checks for files written by downloads.
//!
//! Downloads only ever create new files inside the configured directory; these
//! checks reject anything that would land elsewhere or replace a directory.

use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};

/// Make sure the download directory exists and is a directory.
///
/// # Returns
/// * The directory path, created if it was missing
pub fn prepare_download_dir(dir: &Path) -> Result<PathBuf> {
    if dir.exists() {
        if !dir.is_dir() {
            bail!("Download path is not a directory: {:?}", dir);
        }
    } else {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create download directory: {:?}", dir))?;
    }
    Ok(dir.to_path_buf())
}

/// Validates that an output file path is safe to write.
///
/// Checks:
/// - Output must be a direct child of `dir`
/// - File name must not contain parent/root components
/// - Output must not be an existing directory
pub fn validate_output_path(dir: &Path, output: &Path) -> Result<()> {
    if output.parent() != Some(dir) {
        bail!(
            "Safety check failed: output '{}' is not inside '{}'",
            output.display(),
            dir.display()
        );
    }

    let file_name = output.file_name().map(Path::new);
    let plain_name = file_name.is_some_and(|name| {
        name.components().all(|c| matches!(c, Component::Normal(_)))
    });
    if !plain_name {
        bail!(
            "Safety check failed: '{}' does not end in a plain file name",
            output.display()
        );
    }

    if output.is_dir() {
        bail!(
            "Safety check failed: output '{}' is an existing directory",
            output.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("downloads/nested");
        assert_eq!(prepare_download_dir(&dir).unwrap(), dir);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_rejects_file_as_dir() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = prepare_download_dir(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_valid_output() {
        let dir = PathBuf::from("/tmp/music");
        assert!(validate_output_path(&dir, &dir.join("A - Song.m4a")).is_ok());
    }

    #[test]
    fn test_output_outside_dir() {
        let dir = PathBuf::from("/tmp/music");
        let result = validate_output_path(&dir, Path::new("/tmp/other/A - Song.m4a"));
        assert!(result.unwrap_err().to_string().contains("is not inside"));

        let nested = validate_output_path(&dir, &dir.join("sub/A - Song.m4a"));
        assert!(nested.is_err());
    }

    #[test]
    fn test_output_is_directory() {
        let root = tempfile::tempdir().unwrap();
        let sub = root.path().join("album");
        std::fs::create_dir(&sub).unwrap();
        let err = validate_output_path(root.path(), &sub).unwrap_err();
        assert!(err.to_string().contains("existing directory"));
    }
}
