//! Artifact path handling for exports.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::capture::types::ExportMode;

/// Build the target path for a new export:
/// `<output_dir>/quickrewind-<mode>-<timestamp>.gif`, where the timestamp
/// sorts lexicographically by capture time.
pub fn artifact_path(output_dir: &Path, mode: ExportMode) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    output_dir.join(format!("quickrewind-{}-{}.gif", mode.as_str(), timestamp))
}

/// Ensure the output directory exists, creating it if necessary.
pub fn ensure_directory_exists(directory: &Path) -> io::Result<PathBuf> {
    if !directory.exists() {
        log::info!("Creating output directory: {}", directory.display());
        fs::create_dir_all(directory)?;
    }

    // Canonicalize to resolve relative paths; fall back to the raw path if
    // that fails (e.g. exotic mounts).
    Ok(directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf()))
}

/// Directory used by the frame-sequence fallback: the target filename with
/// its extension stripped and `_sequence` appended, as a sibling of the
/// target.
pub fn sequence_dir(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frames".to_string());
    target.with_file_name(format!("{stem}_sequence"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_encodes_mode_and_extension() {
        let path = artifact_path(Path::new("/out"), ExportMode::Buffer);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("quickrewind-buffer-"));
        assert!(name.ends_with(".gif"));

        let path = artifact_path(Path::new("/out"), ExportMode::Recording);
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("quickrewind-recording-")
        );
    }

    #[test]
    fn sequence_dir_strips_extension_and_appends_suffix() {
        let dir = sequence_dir(Path::new("/out/quickrewind-buffer-20250101-120000.gif"));
        assert_eq!(
            dir,
            PathBuf::from("/out/quickrewind-buffer-20250101-120000_sequence")
        );
    }
}
