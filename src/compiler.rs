//! Orchestrates one run: validate, discover, resolve, assemble, execute.

use crate::command::{CommandAssembler, Plugin};
use crate::config::{CompilerConfig, ResolvedPaths};
use crate::error::CompileError;
use crate::executor::{CancellationToken, Executor, Invocation, ProcessExecutor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::plan::{CompilePlan, Diagnostic};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use crate::resolve::{self, SourceSetResolver};
use crate::toolchain::{self, PathLocator, ToolLocator, ToolStatus, ValidatedToolchain};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Result of a successful compile
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Combined stdout and stderr of protoc
    pub output: String,
    pub plan: CompilePlan,
}

/// Compiler bound to one immutable configuration.
///
/// Collaborators are trait objects so tests can swap in an in-memory file
/// system, a fake tool locator, or an executor that never spawns anything.
pub struct Compiler {
    config: CompilerConfig,
    fs: Arc<dyn FileSystem>,
    locator: Arc<dyn ToolLocator>,
    executor: Arc<dyn Executor>,
    progress: Arc<dyn ProgressHandler>,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            locator: Arc::new(PathLocator::from_env()),
            executor: Arc::new(ProcessExecutor::with_timeout(config.timeout)),
            progress: Arc::new(LoggingHandler::new(config.verbose)),
            config,
        }
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn ToolLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_progress_handler(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn plugins(&self) -> Vec<Plugin> {
        self.config
            .plugin_outputs()
            .into_iter()
            .map(|o| o.plugin)
            .collect()
    }

    /// Every `.proto` file under the proto directory, sorted
    pub fn find_files(&self) -> Result<Vec<PathBuf>, CompileError> {
        let paths = self.config.validate(self.fs.as_ref())?;
        self.discover(&paths)
    }

    fn discover(&self, paths: &ResolvedPaths) -> Result<Vec<PathBuf>, CompileError> {
        resolve::discover(self.fs.as_ref(), &paths.proto_dir).map_err(|e| {
            CompileError::Discovery {
                path: paths.proto_dir.clone(),
                message: format!("{:#}", e),
            }
        })
    }

    /// Fails on the first missing tool
    pub fn check_toolchain(&self) -> Result<ValidatedToolchain, CompileError> {
        let toolchain =
            toolchain::validate(self.locator.as_ref(), &self.config.protoc, &self.plugins())?;
        debug!(protoc = %toolchain.protoc().display(), "Toolchain validated");
        Ok(toolchain)
    }

    /// Status of every tool, for reporting
    pub fn toolchain_status(&self) -> Vec<ToolStatus> {
        toolchain::check(self.locator.as_ref(), &self.config.protoc, &self.plugins())
    }

    /// Resolves the invocation without checking tools or running anything
    pub fn plan(&self) -> Result<CompilePlan, CompileError> {
        let paths = self.config.validate(self.fs.as_ref())?;
        self.build_plan(&paths, self.config.protoc.clone())
    }

    fn build_plan(&self, paths: &ResolvedPaths, program: String) -> Result<CompilePlan, CompileError> {
        self.progress.on_progress(&ProgressEvent::Started {
            proto_dir: paths.proto_dir.display().to_string(),
        });

        let scan_start = Instant::now();
        let discovered = self.discover(paths)?;
        if discovered.is_empty() {
            return Err(CompileError::NoProtoFiles(self.config.proto_dir.clone()));
        }
        self.progress.on_progress(&ProgressEvent::DiscoveryComplete {
            files: discovered.clone(),
            scan_time: scan_start.elapsed(),
        });

        let discovered_count = discovered.len();
        let resolved = SourceSetResolver::new(self.fs.as_ref(), &paths.base, &paths.workspace_dir)
            .with_extra_roots(&paths.proto_paths)
            .with_max_ascent(self.config.max_ascent)
            .with_auto_detect_imports(self.config.auto_detect_imports)
            .resolve(discovered);

        let mut diagnostics = Vec::new();
        for file in &resolved.files {
            if let Some(error) = &file.scan_error {
                diagnostics.push(Diagnostic::UnreadableFile {
                    file: file.path.clone(),
                    error: error.clone(),
                });
            }
        }
        for unresolved in resolved.graph.unresolved() {
            diagnostics.push(Diagnostic::UnresolvedImport {
                file: unresolved.file.clone(),
                literal: unresolved.literal.clone(),
            });
        }
        if resolved.decision.fallback_applied {
            diagnostics.push(Diagnostic::FilterFallback {
                files: discovered_count,
            });
        }

        let outputs = self.config.plugin_outputs();
        let assembled = CommandAssembler::new(&paths.workspace_dir, &paths.output_dir, &outputs)
            .assemble(&resolved.roots, resolved.compile_set());
        diagnostics.extend(assembled.diagnostics);

        self.progress.on_progress(&ProgressEvent::ResolutionComplete {
            compile: resolved.decision.compile.len(),
            omitted: resolved.decision.omitted.len(),
            roots: resolved.roots.len(),
            diagnostics: diagnostics.clone(),
        });

        Ok(CompilePlan {
            program,
            working_dir: paths.workspace_dir.clone(),
            primary_root: paths.workspace_dir.clone(),
            output_dir: paths.output_dir.clone(),
            roots: resolved.roots,
            discovered: discovered_count,
            compile_set: resolved.decision.compile,
            omitted: resolved.decision.omitted,
            diagnostics,
            fallback_applied: resolved.decision.fallback_applied,
            args: assembled.args,
        })
    }

    pub async fn compile(&self) -> Result<CompileOutput, CompileError> {
        self.compile_with_cancel(&CancellationToken::new()).await
    }

    /// Runs protoc; cancelling the token kills it
    pub async fn compile_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CompileOutput, CompileError> {
        let start = Instant::now();
        let result = self.run(cancel).await;

        match &result {
            Ok(_) => self.progress.on_progress(&ProgressEvent::Completed {
                total_time: start.elapsed(),
            }),
            Err(e) => self.progress.on_progress(&ProgressEvent::Failed {
                error: e.to_string(),
            }),
        }

        result
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<CompileOutput, CompileError> {
        let paths = self.config.validate(self.fs.as_ref())?;
        let toolchain = self.check_toolchain()?;
        let plan = self.build_plan(&paths, toolchain.protoc().display().to_string())?;

        self.fs
            .create_dir_all(&plan.output_dir)
            .map_err(|e| CompileError::OutputDir {
                path: plan.output_dir.clone(),
                message: format!("{:#}", e),
            })?;

        let invocation = Invocation {
            program: toolchain.protoc().to_path_buf(),
            args: plan.args.clone(),
            working_dir: plan.working_dir.clone(),
        };

        self.progress.on_progress(&ProgressEvent::CompilerStarted {
            command_line: plan.command_line(),
        });

        let run_start = Instant::now();
        let output = self.executor.run(&invocation, cancel).await?;

        self.progress.on_progress(&ProgressEvent::CompilerFinished {
            success: output.success,
            output: output.combined_output.clone(),
            run_time: run_start.elapsed(),
        });

        if !output.success {
            return Err(CompileError::CompilerFailed {
                exit_code: output.exit_code,
                output: output.combined_output,
            });
        }

        info!(files = plan.compile_set.len(), "protoc completed");
        Ok(CompileOutput {
            output: output.combined_output,
            plan,
        })
    }
}
