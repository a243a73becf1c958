use crate::config::ConfigError;
use crate::executor::ExecError;
use crate::toolchain::ToolchainError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a compile before or while protoc runs
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to walk proto directory {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    #[error("no .proto files found in {0}")]
    NoProtoFiles(PathBuf),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("failed to create output directory {path}: {message}")]
    OutputDir { path: PathBuf, message: String },

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("protoc execution failed ({}): {output}", exit_description(.exit_code))]
    CompilerFailed {
        exit_code: Option<i32>,
        output: String,
    },
}

impl CompileError {
    /// Combined compiler output, when protoc ran and failed
    pub fn output(&self) -> Option<&str> {
        match self {
            CompileError::CompilerFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, CompileError::Config(_))
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}
