use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
struct MockEntry {
    content: Option<Vec<u8>>,
    kind: EntryKind,
    readable: bool,
}

impl MockEntry {
    fn dir() -> Self {
        Self {
            content: None,
            kind: EntryKind::Directory,
            readable: true,
        }
    }
}

/// In-memory file system rooted at `/mock` (or a custom root)
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let fs = Self {
            files: RwLock::new(HashMap::new()),
            root,
        };
        let root = fs.root.clone();
        fs.add_dir(root);
        fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        self.add_file_bytes(path, content.as_bytes());
    }

    pub fn add_file_bytes(&self, path: impl AsRef<Path>, content: &[u8]) {
        self.insert(
            path.as_ref(),
            MockEntry {
                content: Some(content.to_vec()),
                kind: EntryKind::File,
                readable: true,
            },
        );
    }

    /// Adds a file that shows up in listings but fails to read
    pub fn add_unreadable_file(&self, path: impl AsRef<Path>) {
        self.insert(
            path.as_ref(),
            MockEntry {
                content: None,
                kind: EntryKind::File,
                readable: false,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::dir());
    }

    /// Adds a directory that exists but makes any listing through it fail
    pub fn add_unreadable_dir(&self, path: impl AsRef<Path>) {
        self.insert(
            path.as_ref(),
            MockEntry {
                readable: false,
                ..MockEntry::dir()
            },
        );
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let path = self.normalize_path(path);
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            ensure_parents(&mut files, parent);
        }
        files.insert(path, entry);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        let path = self.normalize_path(path);
        self.files.read().unwrap().get(&path).map(|e| e.kind)
    }
}

fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        files.entry(current.clone()).or_insert_with(MockEntry::dir);
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.kind_of(path) == Some(EntryKind::File)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.kind_of(path) == Some(EntryKind::Directory)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Failed to read file {:?}", path))
    }

    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = self.normalize_path(root);
        if self.kind_of(&root) != Some(EntryKind::Directory) {
            return Err(anyhow!("Failed to read directory {:?}", root));
        }

        let files = self.files.read().unwrap();
        let mut listed = Vec::new();
        for (path, entry) in files.iter().filter(|(path, _)| path.starts_with(&root)) {
            match entry.kind {
                EntryKind::Directory if !entry.readable => {
                    return Err(anyhow!("Failed to walk directory {:?}", path));
                }
                EntryKind::File => listed.push(path.clone()),
                EntryKind::Directory => {}
            }
        }

        Ok(listed)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.is_file(path) {
            return Err(anyhow!("Failed to create directory {:?}", path));
        }
        self.add_dir(path);
        Ok(())
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }
}
