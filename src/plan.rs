//! The resolved, not-yet-executed compiler invocation

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Non-fatal findings surfaced in verbose output and plan reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An import that matched no file under any known root. protoc may still
    /// find it through a root the resolver does not know about.
    UnresolvedImport { file: PathBuf, literal: String },

    /// A discovered file whose content could not be scanned
    UnreadableFile { file: PathBuf, error: String },

    /// A compile-set file that had to be passed as an absolute path
    OutsideRoot { file: PathBuf, root: PathBuf },

    /// The inclusion filter kept nothing, so every file was listed
    FilterFallback { files: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedImport { file, literal } => {
                write!(f, "unresolved import \"{}\" in {}", literal, file.display())
            }
            Diagnostic::UnreadableFile { file, error } => {
                write!(f, "could not scan {}: {}", file.display(), error)
            }
            Diagnostic::OutsideRoot { file, root } => write!(
                f,
                "{} is outside {} and is passed as an absolute path",
                file.display(),
                root.display()
            ),
            Diagnostic::FilterFallback { files } => write!(
                f,
                "import filtering kept no files; all {} discovered files are listed",
                files
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompilePlan {
    /// Compiler program, as validated by the toolchain check or as configured
    pub program: String,
    pub working_dir: PathBuf,
    pub primary_root: PathBuf,
    pub output_dir: PathBuf,
    pub roots: Vec<PathBuf>,
    pub discovered: usize,
    pub compile_set: Vec<PathBuf>,
    pub omitted: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub fallback_applied: bool,
    pub args: Vec<String>,
}

impl CompilePlan {
    /// Program and arguments joined by spaces, for display only
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The file arguments, i.e. everything after the flags
    pub fn file_args(&self) -> &[String] {
        let start = self.args.len().saturating_sub(self.compile_set.len());
        &self.args[start..]
    }
}
