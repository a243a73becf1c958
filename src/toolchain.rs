//! Locating protoc and its output plugins before anything runs

use crate::command::Plugin;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("{program} command not found in PATH")]
    ProtocNotFound { program: String, remediation: String },

    #[error("protoc plugin \"{plugin}\" not found in PATH")]
    PluginNotFound {
        plugin: String,
        binary: String,
        remediation: String,
    },
}

impl ToolchainError {
    /// Platform-specific installation hint
    pub fn remediation(&self) -> &str {
        match self {
            ToolchainError::ProtocNotFound { remediation, .. }
            | ToolchainError::PluginNotFound { remediation, .. } => remediation,
        }
    }
}

/// Finds executables by name
pub trait ToolLocator: Send + Sync {
    fn lookup(&self, tool: &str) -> Option<PathBuf>;
}

/// Searches the directories of a `PATH`-style list
#[derive(Debug, Clone)]
pub struct PathLocator {
    dirs: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl PathLocator {
    pub fn from_env() -> Self {
        let dirs = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();
        Self::with_dirs(dirs)
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        let mut extensions = vec![String::new()];
        if cfg!(windows) {
            let pathext = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
            extensions.extend(
                pathext
                    .split(';')
                    .filter(|e| !e.is_empty())
                    .map(|e| e.to_lowercase()),
            );
        }
        Self { dirs, extensions }
    }
}

impl Default for PathLocator {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ToolLocator for PathLocator {
    fn lookup(&self, tool: &str) -> Option<PathBuf> {
        let as_path = Path::new(tool);
        if as_path.components().count() > 1 {
            return as_path.is_file().then(|| as_path.to_path_buf());
        }

        for dir in &self.dirs {
            for ext in &self.extensions {
                let candidate = dir.join(format!("{}{}", tool, ext));
                if candidate.is_file() {
                    debug!(tool, path = %candidate.display(), "Found tool");
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// Proof that protoc and every non-built-in plugin were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToolchain {
    protoc: PathBuf,
    plugins: Vec<(String, PathBuf)>,
}

impl ValidatedToolchain {
    pub fn protoc(&self) -> &Path {
        &self.protoc
    }

    pub fn plugins(&self) -> &[(String, PathBuf)] {
        &self.plugins
    }
}

pub fn validate(
    locator: &dyn ToolLocator,
    program: &str,
    plugins: &[Plugin],
) -> Result<ValidatedToolchain, ToolchainError> {
    let protoc = locator
        .lookup(program)
        .ok_or_else(|| ToolchainError::ProtocNotFound {
            program: program.to_string(),
            remediation: remediation(program),
        })?;

    let mut found = Vec::new();
    for plugin in plugins {
        let Some(binary) = &plugin.binary else {
            continue;
        };
        let path = locator
            .lookup(binary)
            .ok_or_else(|| ToolchainError::PluginNotFound {
                plugin: plugin.name.clone(),
                binary: binary.clone(),
                remediation: remediation(binary),
            })?;
        found.push((plugin.name.clone(), path));
    }

    Ok(ValidatedToolchain {
        protoc,
        plugins: found,
    })
}

/// Availability of one tool, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: Option<PathBuf>,
    pub builtin: bool,
}

pub fn check(locator: &dyn ToolLocator, program: &str, plugins: &[Plugin]) -> Vec<ToolStatus> {
    let mut statuses = vec![ToolStatus {
        name: program.to_string(),
        path: locator.lookup(program),
        builtin: false,
    }];

    for plugin in plugins {
        statuses.push(match &plugin.binary {
            Some(binary) => ToolStatus {
                name: binary.clone(),
                path: locator.lookup(binary),
                builtin: false,
            },
            None => ToolStatus {
                name: plugin.name.clone(),
                path: None,
                builtin: true,
            },
        });
    }

    statuses
}

pub fn remediation(tool: &str) -> String {
    let go_install = match tool {
        "protoc-gen-go" => Some("go install google.golang.org/protobuf/cmd/protoc-gen-go@latest"),
        "protoc-gen-go-grpc" => {
            Some("go install google.golang.org/grpc/cmd/protoc-gen-go-grpc@latest")
        }
        _ => None,
    };

    if let Some(cmd) = go_install {
        let path_hint = if cfg!(windows) {
            "and make sure %USERPROFILE%\\go\\bin is in PATH"
        } else {
            "and make sure $(go env GOPATH)/bin is in PATH"
        };
        return format!("Install it with `{}` {}", cmd, path_hint);
    }

    if tool.starts_with("protoc-gen-") {
        return format!(
            "Install the {} plugin and make sure its directory is in PATH",
            tool
        );
    }

    if cfg!(windows) {
        "Download protoc from https://github.com/protocolbuffers/protobuf/releases, \
         extract it, and add its bin directory to PATH (or run `choco install protoc`)"
            .to_string()
    } else if cfg!(target_os = "macos") {
        "Install it with `brew install protobuf`".to_string()
    } else {
        "Install it with your package manager (e.g. `apt install protobuf-compiler`) \
         or download a release from https://github.com/protocolbuffers/protobuf/releases"
            .to_string()
    }
}
