//! protosweep - duplicate-free protoc invocations for whole proto trees
//!
//! protoc has no recursive wildcard on platforms whose shell does not expand
//! `**/*.proto`, and listing every file in a tree by hand makes protoc report
//! the same types as defined twice when a listed file is also imported by
//! another listed file. This crate discovers the `.proto` files under a
//! directory, reads their import declarations, lists only the files nothing
//! else pulls in, and passes each include root exactly once.
//!
//! # Example
//!
//! ```no_run
//! use protosweep::CompilerConfig;
//!
//! # async fn run() -> Result<(), protosweep::CompileError> {
//! // Defaults: the go plugin with paths=source_relative
//! let output = protosweep::compile("api/proto", "gen/go").await?;
//! println!("{}", output);
//!
//! let config = CompilerConfig::builder()
//!     .with_proto_dir("api/proto/v1")
//!     .with_workspace_dir("api/proto")
//!     .with_output_dir("gen")
//!     .with_plugins(["go", "go-grpc"])
//!     .build();
//! protosweep::compile_with(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`resolve`]: discovery, import scanning, the import graph, inclusion
//!   filtering and root deduplication
//! - [`command`]: protoc argument assembly
//! - [`compiler`]: orchestration of a full run
//! - [`cli`]: the `protosweep` binary's argument parsing and handlers

pub mod cli;
pub mod command;
pub mod compiler;
pub mod config;
pub mod error;
pub mod executor;
pub mod fs;
pub mod paths;
pub mod plan;
pub mod progress;
pub mod resolve;
pub mod toolchain;
pub mod util;

pub use compiler::{CompileOutput, Compiler};
pub use config::{CompilerConfig, CompilerConfigBuilder, ConfigError, SharedConfig};
pub use error::CompileError;
pub use executor::{CancellationToken, ExecError, Executor, ProcessExecutor};
pub use plan::{CompilePlan, Diagnostic};
pub use resolve::{ResolvedSourceSet, SourceSetResolver};
pub use toolchain::ToolchainError;
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

use std::path::PathBuf;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Compiles every proto under `proto_dir` into `output_dir` with the default
/// settings and returns protoc's combined output.
pub async fn compile(
    proto_dir: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
) -> Result<String, CompileError> {
    let config = CompilerConfig::builder()
        .with_proto_dir(proto_dir)
        .with_output_dir(output_dir)
        .build();
    compile_with(config).await
}

pub async fn compile_with(config: CompilerConfig) -> Result<String, CompileError> {
    let output = Compiler::new(config).compile().await?;
    Ok(output.output)
}

/// Like [`compile`], but panics on failure. For build scripts and tests.
pub async fn must_compile(proto_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> String {
    match compile(proto_dir, output_dir).await {
        Ok(output) => output,
        Err(e) => panic!("protosweep: compile failed: {}", e),
    }
}

pub async fn must_compile_with(config: CompilerConfig) -> String {
    match compile_with(config).await {
        Ok(output) => output,
        Err(e) => panic!("protosweep: compile failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_protosweep() {
        assert_eq!(NAME, "protosweep");
    }
}
