//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Abstraction over the file system operations the resolver needs
pub trait FileSystem: Send + Sync {
    /// Check if path is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Read raw file contents. Callers decide how to treat invalid UTF-8.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// List every file below `root` at any depth, in no particular order.
    /// Symlinks that point at regular files are listed under their link path.
    ///
    /// Fails when `root` or any directory below it cannot be read.
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Directory that relative paths are resolved against
    fn current_dir(&self) -> Result<PathBuf>;
}
