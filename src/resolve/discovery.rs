//! Finds every proto source below a directory

use crate::fs::FileSystem;
use crate::paths;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const PROTO_EXTENSION: &str = ".proto";

/// Returns normalized absolute paths of all `.proto` files under `root`
/// (extension matched case-insensitively), sorted for deterministic output.
pub fn discover(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs
        .list_files(root)?
        .into_iter()
        .filter(|p| is_proto_file(p))
        .map(|p| paths::normalize(&p))
        .collect();
    files.sort();
    Ok(files)
}

pub fn is_proto_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().ends_with(PROTO_EXTENSION))
        .unwrap_or(false)
}
