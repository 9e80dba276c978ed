use std::path::PathBuf;
use tempfile::TempDir;

/// Writes `contents` to `file_name` inside a fresh temporary directory.
///
/// Keep the returned `TempDir` in scope for as long as you need the file.
pub fn write_temp_file(file_name: &str, contents: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let path = tmp.path().join(file_name);
    std::fs::write(&path, contents).expect("failed to write temp file");
    (tmp, path)
}
