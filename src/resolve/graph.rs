//! Import graph construction.
//!
//! A literal `L` imported from file `F` is looked up, in order, next to `F`,
//! under the primary root, under each extra root, and finally under the
//! ancestors of the primary root (at most `max_ascent` levels up). The first
//! existing file wins. In-degree counts distinct importing files, never
//! import statements.

use super::source::SourceFile;
use crate::fs::FileSystem;
use crate::paths;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an import literal ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ImportTarget {
    /// Resolved to one of the discovered files
    Discovered(PathBuf),
    /// Resolved to an existing file that discovery did not return
    External(PathBuf),
    Unresolved,
}

impl ImportTarget {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImportTarget::Discovered(p) | ImportTarget::External(p) => Some(p),
            ImportTarget::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ImportTarget::Unresolved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEdge {
    pub from: PathBuf,
    pub literal: String,
    pub target: ImportTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedImport {
    pub file: PathBuf,
    pub literal: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    in_degree: BTreeMap<PathBuf, usize>,
    edges: Vec<ImportEdge>,
    unresolved: Vec<UnresolvedImport>,
    ancestor_roots: Vec<PathBuf>,
}

impl ImportGraph {
    /// Number of distinct discovered files importing `path`
    pub fn in_degree(&self, path: &Path) -> usize {
        self.in_degree.get(path).copied().unwrap_or(0)
    }

    pub fn in_degrees(&self) -> &BTreeMap<PathBuf, usize> {
        &self.in_degree
    }

    pub fn edges(&self) -> &[ImportEdge] {
        &self.edges
    }

    pub fn unresolved(&self) -> &[UnresolvedImport] {
        &self.unresolved
    }

    /// Ancestor directories of the primary root that satisfied an import
    pub fn ancestor_roots(&self) -> &[PathBuf] {
        &self.ancestor_roots
    }
}

pub struct GraphBuilder<'a> {
    fs: &'a dyn FileSystem,
    primary_root: &'a Path,
    extra_roots: &'a [PathBuf],
    max_ascent: usize,
}

struct Resolution {
    path: PathBuf,
    via_ancestor: Option<PathBuf>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        primary_root: &'a Path,
        extra_roots: &'a [PathBuf],
        max_ascent: usize,
    ) -> Self {
        Self {
            fs,
            primary_root,
            extra_roots,
            max_ascent,
        }
    }

    pub fn build(&self, files: &[SourceFile]) -> ImportGraph {
        let index: HashMap<String, usize> = files
            .iter()
            .enumerate()
            .map(|(i, f)| (paths::comparison_key(&f.path), i))
            .collect();

        let mut graph = ImportGraph::default();
        for file in files {
            graph.in_degree.insert(file.path.clone(), 0);
        }

        let mut counted: HashSet<(usize, usize)> = HashSet::new();
        let mut ancestor_keys: HashSet<String> = HashSet::new();

        for (from_idx, file) in files.iter().enumerate() {
            let mut seen_literals: HashSet<&str> = HashSet::new();

            for literal in &file.declared_imports {
                if !seen_literals.insert(literal.as_str()) {
                    continue;
                }

                let target = match self.resolve(file, literal) {
                    Some(resolution) => {
                        if let Some(root) = resolution.via_ancestor {
                            if ancestor_keys.insert(paths::comparison_key(&root)) {
                                debug!(root = %root.display(), "Import resolved via ancestor directory");
                                graph.ancestor_roots.push(root);
                            }
                        }

                        match index.get(&paths::comparison_key(&resolution.path)) {
                            Some(&to_idx) => {
                                let to_path = &files[to_idx].path;
                                if to_idx != from_idx && counted.insert((from_idx, to_idx)) {
                                    *graph.in_degree.entry(to_path.clone()).or_insert(0) += 1;
                                }
                                ImportTarget::Discovered(to_path.clone())
                            }
                            None => ImportTarget::External(resolution.path),
                        }
                    }
                    None => {
                        debug!(
                            file = %file.path.display(),
                            import = %literal,
                            "Import could not be resolved against any search root"
                        );
                        graph.unresolved.push(UnresolvedImport {
                            file: file.path.clone(),
                            literal: literal.clone(),
                        });
                        ImportTarget::Unresolved
                    }
                };

                graph.edges.push(ImportEdge {
                    from: file.path.clone(),
                    literal: literal.clone(),
                    target,
                });
            }
        }

        graph
    }

    fn resolve(&self, from: &SourceFile, literal: &str) -> Option<Resolution> {
        let direct = from
            .path
            .parent()
            .into_iter()
            .chain(std::iter::once(self.primary_root))
            .chain(self.extra_roots.iter().map(PathBuf::as_path));

        for dir in direct {
            if let Some(path) = self.candidate(dir, literal) {
                return Some(Resolution {
                    path,
                    via_ancestor: None,
                });
            }
        }

        let mut dir = self.primary_root.parent();
        for _ in 0..self.max_ascent {
            let Some(current) = dir else { break };
            if let Some(path) = self.candidate(current, literal) {
                return Some(Resolution {
                    path,
                    via_ancestor: Some(current.to_path_buf()),
                });
            }
            dir = current.parent();
        }

        None
    }

    fn candidate(&self, dir: &Path, literal: &str) -> Option<PathBuf> {
        let candidate = paths::normalize(&dir.join(literal));
        self.fs.is_file(&candidate).then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn source(path: &str, imports: &[&str]) -> SourceFile {
        let mut file = SourceFile::new(PathBuf::from(path));
        file.declared_imports = imports.iter().map(|s| s.to_string()).collect();
        file
    }

    fn mock_with(paths: &[&str]) -> MockFileSystem {
        let fs = MockFileSystem::new();
        for p in paths {
            fs.add_file(p, "");
        }
        fs
    }

    #[test]
    fn test_resolves_relative_to_primary_root() {
        let fs = mock_with(&["/mock/proto/a.proto", "/mock/proto/b/b.proto"]);
        let root = PathBuf::from("/mock/proto");
        let files = vec![
            source("/mock/proto/a.proto", &["b/b.proto"]),
            source("/mock/proto/b/b.proto", &[]),
        ];

        let graph = GraphBuilder::new(&fs, &root, &[], 8).build(&files);

        assert_eq!(graph.in_degree(Path::new("/mock/proto/b/b.proto")), 1);
        assert_eq!(graph.in_degree(Path::new("/mock/proto/a.proto")), 0);
        assert!(graph.unresolved().is_empty());
    }

    #[test]
    fn test_file_directory_wins_over_root() {
        let fs = mock_with(&[
            "/mock/proto/sub/a.proto",
            "/mock/proto/sub/types.proto",
            "/mock/proto/types.proto",
        ]);
        let root = PathBuf::from("/mock/proto");
        let files = vec![
            source("/mock/proto/sub/a.proto", &["types.proto"]),
            source("/mock/proto/sub/types.proto", &[]),
            source("/mock/proto/types.proto", &[]),
        ];

        let graph = GraphBuilder::new(&fs, &root, &[], 8).build(&files);

        assert_eq!(graph.in_degree(Path::new("/mock/proto/sub/types.proto")), 1);
        assert_eq!(graph.in_degree(Path::new("/mock/proto/types.proto")), 0);
    }

    #[test]
    fn test_extra_root_in_caller_order() {
        let fs = mock_with(&[
            "/mock/proto/a.proto",
            "/mock/vendor1/dep.proto",
            "/mock/vendor2/dep.proto",
        ]);
        let root = PathBuf::from("/mock/proto");
        let extras = vec![PathBuf::from("/mock/vendor1"), PathBuf::from("/mock/vendor2")];
        let files = vec![source("/mock/proto/a.proto", &["dep.proto"])];

        let graph = GraphBuilder::new(&fs, &root, &extras, 8).build(&files);

        assert_eq!(
            graph.edges()[0].target,
            ImportTarget::External(PathBuf::from("/mock/vendor1/dep.proto"))
        );
        assert!(graph.ancestor_roots().is_empty());
    }

    #[test]
    fn test_upward_walk_records_ancestor_root() {
        let fs = mock_with(&["/mock/repo/api/v1/a.proto", "/mock/repo/common/types.proto"]);
        let root = PathBuf::from("/mock/repo/api/v1");
        let files = vec![source("/mock/repo/api/v1/a.proto", &["common/types.proto"])];

        let graph = GraphBuilder::new(&fs, &root, &[], 8).build(&files);

        assert_eq!(graph.ancestor_roots(), &[PathBuf::from("/mock/repo")]);
        assert!(graph.edges()[0].target.is_resolved());
    }

    #[test]
    fn test_upward_walk_is_bounded() {
        let fs = mock_with(&["/mock/repo/api/v1/a.proto", "/mock/repo/common/types.proto"]);
        let root = PathBuf::from("/mock/repo/api/v1");
        let files = vec![source("/mock/repo/api/v1/a.proto", &["common/types.proto"])];

        let graph = GraphBuilder::new(&fs, &root, &[], 1).build(&files);

        assert_eq!(graph.unresolved().len(), 1);
        assert!(graph.ancestor_roots().is_empty());
    }

    #[test]
    fn test_unresolved_never_increases_in_degree() {
        let fs = mock_with(&["/mock/proto/a.proto"]);
        let root = PathBuf::from("/mock/proto");
        let files = vec![source("/mock/proto/a.proto", &["missing.proto"])];

        let graph = GraphBuilder::new(&fs, &root, &[], 8).build(&files);

        assert_eq!(
            graph.unresolved(),
            &[UnresolvedImport {
                file: PathBuf::from("/mock/proto/a.proto"),
                literal: "missing.proto".to_string(),
            }]
        );
        assert!(graph.in_degrees().values().all(|&d| d == 0));
        assert_eq!(graph.edges()[0].target, ImportTarget::Unresolved);
    }

    #[test]
    fn test_duplicate_imports_count_once() {
        let fs = mock_with(&["/mock/proto/a.proto", "/mock/proto/b.proto"]);
        let root = PathBuf::from("/mock/proto");
        let files = vec![
            source("/mock/proto/a.proto", &["b.proto", "b.proto", "./b.proto"]),
            source("/mock/proto/b.proto", &[]),
        ];

        let graph = GraphBuilder::new(&fs, &root, &[], 8).build(&files);

        assert_eq!(graph.in_degree(Path::new("/mock/proto/b.proto")), 1);
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn test_in_degree_counts_distinct_importers() {
        let fs = mock_with(&[
            "/mock/proto/a.proto",
            "/mock/proto/b.proto",
            "/mock/proto/common.proto",
        ]);
        let root = PathBuf::from("/mock/proto");
        let files = vec![
            source("/mock/proto/a.proto", &["common.proto"]),
            source("/mock/proto/b.proto", &["common.proto"]),
            source("/mock/proto/common.proto", &[]),
        ];

        let graph = GraphBuilder::new(&fs, &root, &[], 8).build(&files);

        assert_eq!(graph.in_degree(Path::new("/mock/proto/common.proto")), 2);
    }

    #[test]
    fn test_self_import_is_not_counted() {
        let fs = mock_with(&["/mock/proto/a.proto"]);
        let root = PathBuf::from("/mock/proto");
        let files = vec![source("/mock/proto/a.proto", &["a.proto"])];

        let graph = GraphBuilder::new(&fs, &root, &[], 8).build(&files);

        assert_eq!(graph.in_degree(Path::new("/mock/proto/a.proto")), 0);
    }
}
