//! Running the external compiler.
//!
//! Cancellation and deadlines apply only here; resolution is plain local
//! computation and is never interrupted.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to collect compiler output: {0}")]
    Io(#[from] io::Error),

    #[error("compiler execution was cancelled")]
    Cancelled,

    #[error("compiler execution timed out after {0:?}")]
    TimedOut(Duration),
}

/// Shared flag that aborts a running compiler when set
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelState>,
}

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once `cancel` has been called
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Program, arguments and working directory of one compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// stdout followed by stderr
    pub combined_output: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<ExecOutput, ExecError>;
}

/// Runs the compiler as a child process; the child is killed on cancel or timeout
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<ExecOutput, ExecError> {
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        debug!(
            program = %invocation.program.display(),
            args = invocation.args.len(),
            cwd = %invocation.working_dir.display(),
            "Spawning compiler"
        );

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: invocation.program.display().to_string(),
                source,
            })?;

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(t) => {
                    tokio::time::sleep(t).await;
                    t
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            output = child.wait_with_output() => {
                let output = output?;
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                Ok(ExecOutput {
                    combined_output: combined,
                    exit_code: output.status.code(),
                    success: output.status.success(),
                })
            }
            _ = cancel.cancelled() => {
                warn!("Compiler run cancelled; killing process");
                Err(ExecError::Cancelled)
            }
            elapsed = deadline => {
                warn!(timeout_ms = elapsed.as_millis() as u64, "Compiler run timed out; killing process");
                Err(ExecError::TimedOut(elapsed))
            }
        }
    }
}
