//! Search-root deduplication.
//!
//! protoc treats two spellings of the same include directory as two logical
//! roots and then reports every file under it as defined twice. Roots are
//! therefore compared by canonical key, never by the caller's text.

use crate::paths;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Ordered set of canonical absolute directories
#[derive(Debug, Clone)]
pub struct SearchRootSet {
    base: PathBuf,
    roots: Vec<PathBuf>,
    keys: HashSet<String>,
}

impl SearchRootSet {
    /// Relative roots inserted later are resolved against `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            roots: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Returns false when the directory was already present under any spelling
    pub fn insert(&mut self, root: &Path) -> bool {
        let canonical = paths::absolutize(root, &self.base);
        if self.keys.insert(paths::comparison_key(&canonical)) {
            self.roots.push(canonical);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, root: &Path) -> bool {
        let canonical = paths::absolutize(root, &self.base);
        self.keys.contains(&paths::comparison_key(&canonical))
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.roots
    }
}

/// Primary root first, then extra roots in caller order, then roots found by
/// walking up from the primary root.
pub fn dedupe_roots(
    base: &Path,
    primary: &Path,
    extra: &[PathBuf],
    discovered: &[PathBuf],
) -> Vec<PathBuf> {
    let mut set = SearchRootSet::new(base);
    set.insert(primary);
    for root in extra.iter().chain(discovered) {
        set.insert(root);
    }
    set.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spellings_collapse_to_one_root() {
        let roots = dedupe_roots(
            Path::new("/work"),
            Path::new("/work/proto"),
            &[
                PathBuf::from("/work/proto/"),
                PathBuf::from("proto"),
                PathBuf::from("./proto/../proto"),
            ],
            &[],
        );

        assert_eq!(roots, vec![PathBuf::from("/work/proto")]);
    }

    #[test]
    fn test_primary_root_first_and_order_kept() {
        let roots = dedupe_roots(
            Path::new("/work"),
            Path::new("proto"),
            &[PathBuf::from("/vendor/b"), PathBuf::from("/vendor/a")],
            &[PathBuf::from("/work")],
        );

        assert_eq!(
            roots,
            vec![
                PathBuf::from("/work/proto"),
                PathBuf::from("/vendor/b"),
                PathBuf::from("/vendor/a"),
                PathBuf::from("/work"),
            ]
        );
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let once = dedupe_roots(
            Path::new("/work"),
            Path::new("proto/"),
            &[PathBuf::from("../shared"), PathBuf::from("/work/proto")],
            &[PathBuf::from("/")],
        );
        let twice = dedupe_roots(Path::new("/work"), &once[0], &once[1..], &[]);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_insert_reports_duplicates() {
        let mut set = SearchRootSet::new("/work");

        assert!(set.insert(Path::new("/work/a")));
        assert!(!set.insert(Path::new("a/")));
        assert!(set.contains(Path::new("./a")));
        assert_eq!(set.len(), 1);
    }

    #[cfg(any(windows, target_os = "macos"))]
    #[test]
    fn test_case_variants_collapse_on_case_insensitive_platforms() {
        let mut set = SearchRootSet::new("/work");

        assert!(set.insert(Path::new("/work/Proto")));
        assert!(!set.insert(Path::new("/work/proto")));
    }
}
