use super::FileSystem;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).context(format!("Failed to read file {:?}", path))
    }

    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(root).context(format!("Failed to read directory {:?}", root))?;

        let mut files = Vec::new();
        for result in WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build()
        {
            let entry =
                result.with_context(|| format!("Failed to walk directory {:?}", root))?;

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            // Linked directories are not descended into; linked files are kept
            if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context(format!("Failed to create directory {:?}", path))
    }

    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("Failed to determine current directory")
    }
}
