//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing.
///
/// With `verbose` set, discovered files, diagnostics and the full command
/// line are logged at info level; otherwise only at debug.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler {
    verbose: bool,
}

impl LoggingHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { proto_dir } => {
                info!(proto_dir = %proto_dir, "Starting protoc run");
            }
            ProgressEvent::DiscoveryComplete { files, scan_time } => {
                info!(
                    files = files.len(),
                    scan_time_ms = scan_time.as_millis() as u64,
                    "Proto discovery complete"
                );
                for file in files {
                    if self.verbose {
                        info!(file = %file.display(), "Found proto file");
                    } else {
                        debug!(file = %file.display(), "Found proto file");
                    }
                }
            }
            ProgressEvent::ResolutionComplete {
                compile,
                omitted,
                roots,
                diagnostics,
            } => {
                info!(compile, omitted, roots, "Source set resolved");
                for diagnostic in diagnostics {
                    if self.verbose {
                        info!(diagnostic = %diagnostic, "Resolution note");
                    } else {
                        debug!(diagnostic = %diagnostic, "Resolution note");
                    }
                }
            }
            ProgressEvent::CompilerStarted { command_line } => {
                if self.verbose {
                    info!(command = %command_line, "Running protoc");
                } else {
                    debug!(command = %command_line, "Running protoc");
                }
            }
            ProgressEvent::CompilerFinished {
                success,
                output,
                run_time,
            } => {
                if *success && self.verbose && !output.trim().is_empty() {
                    info!(
                        run_time_ms = run_time.as_millis() as u64,
                        output = %output.trim_end(),
                        "protoc finished"
                    );
                } else if *success {
                    debug!(run_time_ms = run_time.as_millis() as u64, "protoc finished");
                } else {
                    warn!(
                        run_time_ms = run_time.as_millis() as u64,
                        output = %output.trim_end(),
                        "protoc reported errors"
                    );
                }
            }
            ProgressEvent::Completed { total_time } => {
                info!(total_time_ms = total_time.as_millis() as u64, "Compile complete");
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Compile failed");
            }
        }
    }
}
