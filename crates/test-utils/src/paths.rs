//! Filesystem helpers for local-mode sources.
//!
//! Local mode reads a night's assets from `<root>/<night>/`. These helpers
//! build such a tree inside a temporary directory.

use std::path::{Path, PathBuf};

use crate::generators::night_assets;

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("eon_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Write `assets` into `<root>/<night>/` and return that directory.
pub fn write_night_dir(
    root: &Path,
    night: &str,
    assets: &[(String, Vec<u8>)],
) -> std::io::Result<PathBuf> {
    let dir = root.join(night);
    std::fs::create_dir_all(&dir)?;
    for (name, payload) in assets {
        std::fs::write(dir.join(name), payload)?;
    }
    Ok(dir)
}

/// A temporary local root holding the complete asset set of `night`.
pub fn local_root_with_night(night: &str) -> tempfile::TempDir {
    let root = temp_test_dir();
    write_night_dir(root.path(), night, &night_assets(night))
        .expect("Failed to write night assets");
    root
}
