//! Best-effort lexical scan of proto sources.
//!
//! This is not a parser. Markers inside string literals or block comments
//! are reported as if they were real declarations, and statements split
//! across lines are not recognized.

use super::source::SourceFile;
use crate::fs::FileSystem;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, warn};

/// What a single file declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub imports: Vec<String>,
    pub has_service: bool,
    pub has_message: bool,
}

pub struct ImportScanner {
    import_re: Regex,
    service_re: Regex,
    message_re: Regex,
}

impl ImportScanner {
    pub fn new() -> Self {
        Self {
            import_re: Regex::new(
                r#"\bimport\s+(?:(?:public|weak)\s+)?(?:"([^"]*)"|'([^']*)')"#,
            )
            .expect("valid regex"),
            service_re: Regex::new(r"\bservice\s+[A-Za-z_][A-Za-z0-9_]*\s*\{")
                .expect("valid regex"),
            message_re: Regex::new(r"\bmessage\s+[A-Za-z_][A-Za-z0-9_]*\s*\{")
                .expect("valid regex"),
        }
    }

    pub fn scan(&self, content: &str) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for line in content.lines() {
            let code = strip_line_comment(line);

            for caps in self.import_re.captures_iter(code) {
                if let Some(literal) = caps.get(1).or_else(|| caps.get(2)) {
                    outcome.imports.push(literal.as_str().to_string());
                }
            }

            if !outcome.has_service && self.service_re.is_match(code) {
                outcome.has_service = true;
            }
            if !outcome.has_message && self.message_re.is_match(code) {
                outcome.has_message = true;
            }
        }

        outcome
    }

    /// Reads and scans one file. A read failure is recorded on the returned
    /// `SourceFile` instead of being propagated.
    pub fn scan_file(&self, fs: &dyn FileSystem, path: PathBuf) -> SourceFile {
        let mut file = SourceFile::new(path);

        match fs.read(&file.path) {
            Ok(bytes) => {
                // Stray non-UTF-8 bytes (usually in comments) must not hide imports
                let content = String::from_utf8_lossy(&bytes);
                let outcome = self.scan(&content);
                debug!(
                    file = %file.path.display(),
                    imports = outcome.imports.len(),
                    service = outcome.has_service,
                    message = outcome.has_message,
                    "Scanned proto file"
                );
                file.declared_imports = outcome.imports;
                file.has_service_definition = outcome.has_service;
                file.has_message_definition = outcome.has_message;
            }
            Err(e) => {
                warn!(
                    file = %file.path.display(),
                    error = %e,
                    "Skipping unreadable proto file for import detection"
                );
                file.scan_error = Some(format!("{:#}", e));
            }
        }

        file
    }
}

impl Default for ImportScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_line_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}
