use crate::command::PluginOutput;
use crate::fs::FileSystem;
use crate::paths;
use crate::resolve::DEFAULT_MAX_ASCENT;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PROTOC: &str = "protoc";
const DEFAULT_PLUGIN: &str = "go";
const DEFAULT_GO_OPT: &str = "paths=source_relative";
const MAX_ASCENT_LIMIT: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("proto directory not specified")]
    MissingProtoDir,

    #[error("workspace directory not specified")]
    MissingWorkspaceDir,

    #[error("output directory not specified")]
    MissingOutputDir,

    #[error("proto directory does not exist: {0}")]
    ProtoDirNotFound(PathBuf),

    #[error("workspace directory does not exist: {0}")]
    WorkspaceDirNotFound(PathBuf),

    #[error("proto directory {proto_dir} must be within workspace directory {workspace_dir}")]
    NotWithinWorkspace {
        proto_dir: PathBuf,
        workspace_dir: PathBuf,
    },

    #[error("Failed to determine current directory: {0}")]
    CurrentDir(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Immutable settings for one compiler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Directory searched for `.proto` files
    pub proto_dir: PathBuf,
    /// Primary include root; file arguments are relative to it
    pub workspace_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extra include roots, in the order they are searched
    pub proto_paths: Vec<PathBuf>,
    pub plugins: Vec<String>,
    pub plugin_options: BTreeMap<String, Vec<String>>,
    pub verbose: bool,
    pub auto_detect_imports: bool,
    /// How many directories above the primary root an import may be found in
    pub max_ascent: usize,
    pub timeout: Option<Duration>,
    pub protoc: String,
}

/// Absolute, normalized paths produced by [`CompilerConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub base: PathBuf,
    pub proto_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub output_dir: PathBuf,
    pub proto_paths: Vec<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfigBuilder::default().build()
    }
}

impl CompilerConfig {
    pub fn builder() -> CompilerConfigBuilder {
        CompilerConfigBuilder::default()
    }

    /// Checks required paths and workspace containment, in that order
    pub fn validate(&self, fs: &dyn FileSystem) -> Result<ResolvedPaths, ConfigError> {
        if self.proto_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingProtoDir);
        }
        if self.workspace_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingWorkspaceDir);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }

        if self.plugins.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "Plugin names cannot be empty".to_string(),
            ));
        }
        if self.max_ascent > MAX_ASCENT_LIMIT {
            return Err(ConfigError::ValidationFailed(format!(
                "Max ascent cannot exceed {} levels",
                MAX_ASCENT_LIMIT
            )));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ValidationFailed(
                "Timeout must be greater than zero".to_string(),
            ));
        }

        let base = fs
            .current_dir()
            .map_err(|e| ConfigError::CurrentDir(format!("{:#}", e)))?;

        let proto_dir = paths::absolutize(&self.proto_dir, &base);
        if !fs.is_dir(&proto_dir) {
            return Err(ConfigError::ProtoDirNotFound(self.proto_dir.clone()));
        }

        let workspace_dir = paths::absolutize(&self.workspace_dir, &base);
        if !fs.is_dir(&workspace_dir) {
            return Err(ConfigError::WorkspaceDirNotFound(self.workspace_dir.clone()));
        }

        if paths::relative_to(&proto_dir, &workspace_dir).is_none() {
            return Err(ConfigError::NotWithinWorkspace {
                proto_dir: self.proto_dir.clone(),
                workspace_dir: self.workspace_dir.clone(),
            });
        }

        Ok(ResolvedPaths {
            output_dir: paths::absolutize(&self.output_dir, &base),
            proto_paths: self
                .proto_paths
                .iter()
                .map(|p| paths::absolutize(p, &base))
                .collect(),
            proto_dir,
            workspace_dir,
            base,
        })
    }

    /// Requested outputs in order, each name once, with its options
    pub fn plugin_outputs(&self) -> Vec<PluginOutput> {
        let mut seen = Vec::new();
        for name in &self.plugins {
            if !seen.contains(name) {
                seen.push(name.clone());
            }
        }

        seen.iter()
            .map(|name| {
                let options = self.plugin_options.get(name).cloned().unwrap_or_default();
                PluginOutput::new(name, options)
            })
            .collect()
    }
}

impl fmt::Display for CompilerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Protosweep Configuration:")?;
        writeln!(f, "  Proto dir:      {}", self.proto_dir.display())?;
        writeln!(f, "  Workspace dir:  {}", self.workspace_dir.display())?;
        writeln!(f, "  Output dir:     {}", self.output_dir.display())?;
        if !self.proto_paths.is_empty() {
            let joined: Vec<String> = self
                .proto_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            writeln!(f, "  Proto paths:    {}", joined.join(", "))?;
        }
        writeln!(f, "  Plugins:        {}", self.plugins.join(", "))?;
        for (name, opts) in &self.plugin_options {
            writeln!(f, "  {} options: {}", name, opts.join(","))?;
        }
        writeln!(f, "  Auto-detect:    {}", self.auto_detect_imports)?;
        writeln!(f, "  Max ascent:     {}", self.max_ascent)?;
        match self.timeout {
            Some(t) => writeln!(f, "  Timeout:        {}s", t.as_secs())?,
            None => writeln!(f, "  Timeout:        none")?,
        }
        write!(f, "  Protoc:         {}", self.protoc)
    }
}

/// Chained construction of a [`CompilerConfig`]
#[derive(Debug, Clone)]
pub struct CompilerConfigBuilder {
    proto_dir: PathBuf,
    workspace_dir: Option<PathBuf>,
    output_dir: PathBuf,
    proto_paths: Vec<PathBuf>,
    plugins: Vec<String>,
    plugin_options: BTreeMap<String, Vec<String>>,
    verbose: bool,
    auto_detect_imports: bool,
    max_ascent: usize,
    timeout: Option<Duration>,
    protoc: String,
}

impl Default for CompilerConfigBuilder {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

impl CompilerConfigBuilder {
    /// Defaults with `PROTOSWEEP_*` overrides taken from `lookup` instead of
    /// the process environment. Unparsable values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let protoc = lookup("PROTOSWEEP_PROTOC").unwrap_or_else(|| DEFAULT_PROTOC.to_string());

        let max_ascent = lookup("PROTOSWEEP_MAX_ASCENT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_ASCENT);

        let timeout = lookup("PROTOSWEEP_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        let auto_detect_imports = lookup("PROTOSWEEP_AUTO_DETECT_IMPORTS")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let mut plugin_options = BTreeMap::new();
        plugin_options.insert("go".to_string(), vec![DEFAULT_GO_OPT.to_string()]);
        plugin_options.insert("go-grpc".to_string(), vec![DEFAULT_GO_OPT.to_string()]);

        Self {
            proto_dir: PathBuf::from("."),
            workspace_dir: None,
            output_dir: PathBuf::from("."),
            proto_paths: Vec::new(),
            plugins: vec![DEFAULT_PLUGIN.to_string()],
            plugin_options,
            verbose: false,
            auto_detect_imports,
            max_ascent,
            timeout,
            protoc,
        }
    }
}

impl CompilerConfigBuilder {
    pub fn with_proto_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.proto_dir = dir.into();
        self
    }

    /// Defaults to the proto directory when never set
    pub fn with_workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = Some(dir.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Replaces the extra include roots
    pub fn with_proto_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.proto_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the options passed to one plugin's output flag
    pub fn with_plugin_opts<I, S>(mut self, plugin: &str, opts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugin_options
            .insert(plugin.to_string(), opts.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_go_opts<I, S>(self, opts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_plugin_opts("go", opts)
    }

    pub fn with_go_grpc_opts<I, S>(self, opts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_plugin_opts("go-grpc", opts)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_auto_detect_imports(mut self, enabled: bool) -> Self {
        self.auto_detect_imports = enabled;
        self
    }

    pub fn with_max_ascent(mut self, levels: usize) -> Self {
        self.max_ascent = levels;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_protoc(mut self, program: impl Into<String>) -> Self {
        self.protoc = program.into();
        self
    }

    pub fn build(self) -> CompilerConfig {
        CompilerConfig {
            workspace_dir: self.workspace_dir.unwrap_or_else(|| self.proto_dir.clone()),
            proto_dir: self.proto_dir,
            output_dir: self.output_dir,
            proto_paths: self.proto_paths,
            plugins: self.plugins,
            plugin_options: self.plugin_options,
            verbose: self.verbose,
            auto_detect_imports: self.auto_detect_imports,
            max_ascent: self.max_ascent,
            timeout: self.timeout,
            protoc: self.protoc,
        }
    }
}

/// Mutable configuration shared between threads.
///
/// Updates are serialized by a mutex. A run works from a [`snapshot`], so a
/// long compile never holds the lock and never blocks another caller from
/// configuring an independent invocation.
///
/// [`snapshot`]: SharedConfig::snapshot
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<Mutex<CompilerConfigBuilder>>,
}

impl SharedConfig {
    pub fn new(builder: CompilerConfigBuilder) -> Self {
        Self {
            inner: Arc::new(Mutex::new(builder)),
        }
    }

    /// Replaces the builder with `f`'s result. If `f` panics the previous
    /// builder stays in place.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(CompilerConfigBuilder) -> CompilerConfigBuilder,
    {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let next = f(guard.clone());
        *guard = next;
    }

    pub fn snapshot(&self) -> CompilerConfig {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::collections::HashMap;

    fn mock_workspace() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir("workspace/proto/api");
        fs.add_dir("elsewhere");
        fs
    }

    fn builder_with_env(vars: &[(&str, &str)]) -> CompilerConfigBuilder {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CompilerConfigBuilder::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = builder_with_env(&[]).build();

        assert_eq!(config.proto_dir, PathBuf::from("."));
        assert_eq!(config.workspace_dir, PathBuf::from("."));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.plugins, vec!["go"]);
        assert_eq!(
            config.plugin_options.get("go"),
            Some(&vec!["paths=source_relative".to_string()])
        );
        assert_eq!(
            config.plugin_options.get("go-grpc"),
            Some(&vec!["paths=source_relative".to_string()])
        );
        assert!(config.auto_detect_imports);
        assert_eq!(config.max_ascent, DEFAULT_MAX_ASCENT);
        assert_eq!(config.protoc, "protoc");
    }

    #[test]
    fn test_workspace_defaults_to_proto_dir() {
        let config = CompilerConfig::builder().with_proto_dir("/custom/proto").build();
        assert_eq!(config.workspace_dir, PathBuf::from("/custom/proto"));

        let config = CompilerConfig::builder()
            .with_proto_dir("/custom/proto")
            .with_workspace_dir("/custom")
            .build();
        assert_eq!(config.workspace_dir, PathBuf::from("/custom"));
    }

    #[test]
    fn test_builder_chain() {
        let config = CompilerConfig::builder()
            .with_proto_dir("/test/proto")
            .with_output_dir("/test/output")
            .with_proto_paths(["/path1", "/path2"])
            .with_plugins(["go", "go-grpc"])
            .with_go_opts(["paths=source_relative", "module=test"])
            .with_go_grpc_opts(["paths=source_relative"])
            .with_verbose(true)
            .build();

        assert_eq!(config.proto_paths, vec![PathBuf::from("/path1"), PathBuf::from("/path2")]);
        assert_eq!(config.plugins, vec!["go", "go-grpc"]);
        assert_eq!(
            config.plugin_options["go"],
            vec!["paths=source_relative", "module=test"]
        );
        assert!(config.verbose);
    }

    #[test]
    fn test_plugin_outputs_deduplicate_names() {
        let config = CompilerConfig::builder()
            .with_plugins(["go", "python", "go"])
            .build();

        let outputs = config.plugin_outputs();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].options, vec!["paths=source_relative"]);
        assert!(outputs[1].options.is_empty());
    }

    #[test]
    fn test_validate_missing_paths() {
        let fs = mock_workspace();

        let config = CompilerConfig::builder().with_proto_dir("").build();
        assert!(matches!(
            config.validate(&fs),
            Err(ConfigError::MissingProtoDir)
        ));

        let config = CompilerConfig::builder()
            .with_proto_dir("workspace/proto")
            .with_workspace_dir("")
            .build();
        assert!(matches!(
            config.validate(&fs),
            Err(ConfigError::MissingWorkspaceDir)
        ));

        let config = CompilerConfig::builder()
            .with_proto_dir("workspace/proto")
            .with_output_dir("")
            .build();
        assert!(matches!(
            config.validate(&fs),
            Err(ConfigError::MissingOutputDir)
        ));
    }

    #[test]
    fn test_validate_nonexistent_dirs() {
        let fs = mock_workspace();

        let config = CompilerConfig::builder().with_proto_dir("nope").build();
        assert!(matches!(
            config.validate(&fs),
            Err(ConfigError::ProtoDirNotFound(_))
        ));

        let config = CompilerConfig::builder()
            .with_proto_dir("workspace/proto")
            .with_workspace_dir("missing")
            .build();
        assert!(matches!(
            config.validate(&fs),
            Err(ConfigError::WorkspaceDirNotFound(_))
        ));
    }

    #[test]
    fn test_validate_containment() {
        let fs = mock_workspace();

        let config = CompilerConfig::builder()
            .with_proto_dir("elsewhere")
            .with_workspace_dir("workspace")
            .build();
        let err = config.validate(&fs).unwrap_err();

        assert!(matches!(err, ConfigError::NotWithinWorkspace { .. }));
        assert!(err.to_string().contains("must be within workspace directory"));
    }

    #[test]
    fn test_validate_resolves_relative_paths() {
        let fs = mock_workspace();

        let config = CompilerConfig::builder()
            .with_proto_dir("workspace/proto/api/")
            .with_workspace_dir("./workspace")
            .with_output_dir("gen")
            .with_proto_paths(["vendor/"])
            .build();
        let resolved = config.validate(&fs).unwrap();

        assert_eq!(resolved.base, PathBuf::from("/mock"));
        assert_eq!(resolved.proto_dir, PathBuf::from("/mock/workspace/proto/api"));
        assert_eq!(resolved.workspace_dir, PathBuf::from("/mock/workspace"));
        assert_eq!(resolved.output_dir, PathBuf::from("/mock/gen"));
        assert_eq!(resolved.proto_paths, vec![PathBuf::from("/mock/vendor")]);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let fs = mock_workspace();

        let config = CompilerConfig::builder()
            .with_proto_dir("workspace")
            .with_max_ascent(1000)
            .build();
        assert!(matches!(
            config.validate(&fs),
            Err(ConfigError::ValidationFailed(_))
        ));

        let config = CompilerConfig::builder()
            .with_proto_dir("workspace")
            .with_timeout(Some(Duration::ZERO))
            .build();
        assert!(matches!(
            config.validate(&fs),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = builder_with_env(&[
            ("PROTOSWEEP_PROTOC", "/opt/protoc/bin/protoc"),
            ("PROTOSWEEP_MAX_ASCENT", "2"),
            ("PROTOSWEEP_TIMEOUT", "90"),
            ("PROTOSWEEP_AUTO_DETECT_IMPORTS", "false"),
        ])
        .build();

        assert_eq!(config.protoc, "/opt/protoc/bin/protoc");
        assert_eq!(config.max_ascent, 2);
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
        assert!(!config.auto_detect_imports);
    }

    #[test]
    fn test_invalid_env_values_fall_back() {
        let config = builder_with_env(&[
            ("PROTOSWEEP_MAX_ASCENT", "lots"),
            ("PROTOSWEEP_TIMEOUT", "soon"),
            ("PROTOSWEEP_AUTO_DETECT_IMPORTS", "maybe"),
        ])
        .build();

        assert_eq!(config.max_ascent, DEFAULT_MAX_ASCENT);
        assert_eq!(config.timeout, None);
        assert!(config.auto_detect_imports);
    }

    #[test]
    fn test_builder_overrides_env_defaults() {
        let config = builder_with_env(&[("PROTOSWEEP_MAX_ASCENT", "2")])
            .with_max_ascent(5)
            .build();

        assert_eq!(config.max_ascent, 5);
    }

    #[test]
    fn test_shared_config_snapshot_is_independent() {
        let shared = SharedConfig::new(CompilerConfig::builder().with_proto_dir("/a"));
        let before = shared.snapshot();

        shared.update(|b| b.with_proto_dir("/b").with_plugins(["java"]));
        let after = shared.snapshot();

        assert_eq!(before.proto_dir, PathBuf::from("/a"));
        assert_eq!(after.proto_dir, PathBuf::from("/b"));
        assert_eq!(after.plugins, vec!["java"]);
    }

    #[test]
    fn test_shared_config_across_threads() {
        let shared = SharedConfig::default();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.update(|b| b.with_proto_paths([format!("/root{}", i)]));
                    shared.snapshot()
                })
            })
            .collect();

        for handle in handles {
            let snapshot = handle.join().unwrap();
            assert_eq!(snapshot.proto_paths.len(), 1);
        }
    }

    #[test]
    fn test_shared_config_survives_panicking_update() {
        let shared = SharedConfig::new(
            CompilerConfig::builder()
                .with_proto_dir("/a")
                .with_plugins(["java"]),
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            shared.update(|_| panic!("update aborted"));
        }));
        assert!(result.is_err());

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.proto_dir, PathBuf::from("/a"));
        assert_eq!(snapshot.plugins, vec!["java"]);

        shared.update(|b| b.with_proto_dir("/b"));
        assert_eq!(shared.snapshot().proto_dir, PathBuf::from("/b"));
        assert_eq!(shared.snapshot().plugins, vec!["java"]);
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", builder_with_env(&[]).build());
        assert!(display.contains("Protosweep Configuration:"));
        assert!(display.contains("Plugins:"));
    }
}
