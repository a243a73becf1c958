//! Source-set resolution: which files to list and which roots to pass.

pub mod discovery;
pub mod filter;
pub mod graph;
pub mod roots;
pub mod scanner;
pub mod source;

pub use discovery::{discover, is_proto_file, PROTO_EXTENSION};
pub use filter::{filter, should_compile, InclusionDecision};
pub use graph::{GraphBuilder, ImportEdge, ImportGraph, ImportTarget, UnresolvedImport};
pub use roots::{dedupe_roots, SearchRootSet};
pub use scanner::{ImportScanner, ScanOutcome};
pub use source::SourceFile;

use crate::fs::FileSystem;
use crate::paths;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_MAX_ASCENT: usize = 8;

/// Result of one resolution run
#[derive(Debug, Clone)]
pub struct ResolvedSourceSet {
    pub files: Vec<SourceFile>,
    /// Empty when import detection is disabled
    pub graph: ImportGraph,
    pub decision: InclusionDecision,
    /// Deduplicated search roots, primary root first
    pub roots: Vec<PathBuf>,
}

impl ResolvedSourceSet {
    pub fn compile_set(&self) -> &[PathBuf] {
        &self.decision.compile
    }
}

pub struct SourceSetResolver<'a> {
    fs: &'a dyn FileSystem,
    base: PathBuf,
    primary_root: PathBuf,
    extra_roots: Vec<PathBuf>,
    max_ascent: usize,
    auto_detect_imports: bool,
    scanner: ImportScanner,
}

impl<'a> SourceSetResolver<'a> {
    /// `base` is the directory relative roots are resolved against
    pub fn new(fs: &'a dyn FileSystem, base: &Path, primary_root: &Path) -> Self {
        Self {
            fs,
            base: base.to_path_buf(),
            primary_root: paths::absolutize(primary_root, base),
            extra_roots: Vec::new(),
            max_ascent: DEFAULT_MAX_ASCENT,
            auto_detect_imports: true,
            scanner: ImportScanner::new(),
        }
    }

    pub fn with_extra_roots(mut self, roots: &[PathBuf]) -> Self {
        self.extra_roots = roots
            .iter()
            .map(|r| paths::absolutize(r, &self.base))
            .collect();
        self
    }

    pub fn with_max_ascent(mut self, max_ascent: usize) -> Self {
        self.max_ascent = max_ascent;
        self
    }

    pub fn with_auto_detect_imports(mut self, enabled: bool) -> Self {
        self.auto_detect_imports = enabled;
        self
    }

    pub fn primary_root(&self) -> &Path {
        &self.primary_root
    }

    pub fn resolve(&self, discovered: Vec<PathBuf>) -> ResolvedSourceSet {
        if !self.auto_detect_imports {
            debug!("Import detection disabled; listing every discovered file");
            let files: Vec<SourceFile> = discovered.into_iter().map(SourceFile::new).collect();
            let decision = InclusionDecision {
                compile: files.iter().map(|f| f.path.clone()).collect(),
                ..Default::default()
            };
            let roots = dedupe_roots(&self.base, &self.primary_root, &self.extra_roots, &[]);
            return ResolvedSourceSet {
                files,
                graph: ImportGraph::default(),
                decision,
                roots,
            };
        }

        let files: Vec<SourceFile> = discovered
            .into_iter()
            .map(|path| self.scanner.scan_file(self.fs, path))
            .collect();

        let graph = GraphBuilder::new(
            self.fs,
            &self.primary_root,
            &self.extra_roots,
            self.max_ascent,
        )
        .build(&files);

        let decision = filter(&files, &graph);
        let roots = dedupe_roots(
            &self.base,
            &self.primary_root,
            &self.extra_roots,
            graph.ancestor_roots(),
        );

        info!(
            discovered = files.len(),
            compile = decision.compile.len(),
            omitted = decision.omitted.len(),
            unresolved = graph.unresolved().len(),
            roots = roots.len(),
            "Resolved proto source set"
        );

        ResolvedSourceSet {
            files,
            graph,
            decision,
            roots,
        }
    }
}
