//! Progress handler trait and events

use crate::plan::Diagnostic;
use std::path::PathBuf;
use std::time::Duration;

/// Events emitted while a compile run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { proto_dir: String },

    /// Proto files were found under the proto directory
    DiscoveryComplete {
        files: Vec<PathBuf>,
        scan_time: Duration,
    },

    /// Compile set and roots were decided
    ResolutionComplete {
        compile: usize,
        omitted: usize,
        roots: usize,
        diagnostics: Vec<Diagnostic>,
    },

    /// protoc is about to be spawned
    CompilerStarted { command_line: String },

    /// protoc exited
    CompilerFinished {
        success: bool,
        output: String,
        run_time: Duration,
    },

    Completed { total_time: Duration },

    Failed { error: String },
}

/// Trait for handling progress events during a compile run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
