use serde::Serialize;
use std::path::PathBuf;

/// A discovered schema file and what the lexical scan found in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Absolute, normalized path
    pub path: PathBuf,

    /// Import literals in declaration order, verbatim
    pub declared_imports: Vec<String>,

    pub has_service_definition: bool,
    pub has_message_definition: bool,

    /// Set when the file could not be read; imports and markers are then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_error: Option<String>,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            declared_imports: Vec::new(),
            has_service_definition: false,
            has_message_definition: false,
            scan_error: None,
        }
    }

    pub fn was_scanned(&self) -> bool {
        self.scan_error.is_none()
    }
}
