//! Decides which files are listed explicitly on the compiler command line.
//!
//! Listing a file that another listed file also imports makes protoc report
//! its types as defined twice, so files that only exist to be imported are
//! left for the compiler to pull in on its own.

use super::graph::ImportGraph;
use super::source::SourceFile;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionDecision {
    /// Files to pass explicitly, in input order
    pub compile: Vec<PathBuf>,

    /// Files expected to be reached through imports
    pub omitted: Vec<PathBuf>,

    /// The rule kept nothing and every input file was listed instead
    pub fallback_applied: bool,
}

/// Whether a single file belongs in the explicit list
pub fn should_compile(file: &SourceFile, in_degree: usize) -> bool {
    in_degree == 0
        || file.has_service_definition
        || (file.has_message_definition && in_degree == 0)
}

pub fn filter(files: &[SourceFile], graph: &ImportGraph) -> InclusionDecision {
    let mut decision = InclusionDecision::default();

    for file in files {
        if should_compile(file, graph.in_degree(&file.path)) {
            decision.compile.push(file.path.clone());
        } else {
            decision.omitted.push(file.path.clone());
        }
    }

    if decision.compile.is_empty() && !files.is_empty() {
        warn!(
            files = files.len(),
            "Inclusion filter kept no files; listing every discovered file instead"
        );
        return InclusionDecision {
            compile: files.iter().map(|f| f.path.clone()).collect(),
            omitted: Vec::new(),
            fallback_applied: true,
        };
    }

    decision
}
