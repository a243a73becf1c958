//! Subcommand handlers. Each returns the process exit code.

use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::commands::{CheckArgs, CompileArgs, PlanArgs};
use super::output::OutputFormatter;
use crate::compiler::Compiler;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::executor::CancellationToken;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

pub async fn handle_compile(args: &CompileArgs, quiet: bool, verbose: bool) -> i32 {
    let mut builder = args.source.to_builder(verbose);
    if let Some(secs) = args.timeout {
        builder = builder.with_timeout(Some(Duration::from_secs(secs)));
    }
    let config = builder.build();
    debug!("Using configuration:\n{}", config);

    let compiler = Compiler::new(config);
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping protoc");
            interrupt.cancel();
        }
    });

    let result = compiler.compile_with_cancel(&cancel).await;
    signal_task.abort();

    match result {
        Ok(output) => {
            if !quiet && !output.output.is_empty() {
                print!("{}", output.output);
            }
            info!(
                files = output.plan.compile_set.len(),
                output_dir = %output.plan.output_dir.display(),
                "Generated code"
            );
            EXIT_OK
        }
        Err(e) => report_error(&e),
    }
}

pub async fn handle_plan(args: &PlanArgs, verbose: bool) -> i32 {
    let config = args.source.to_builder(verbose).build();
    let compiler = Compiler::new(config);

    let plan = match compiler.plan() {
        Ok(plan) => plan,
        Err(e) => return report_error(&e),
    };

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_plan(&plan) {
        Ok(output) => {
            println!("{}", output);
            EXIT_OK
        }
        Err(e) => {
            error!("Failed to format plan: {:#}", e);
            EXIT_FAILURE
        }
    }
}

pub async fn handle_check(args: &CheckArgs) -> i32 {
    let mut builder = CompilerConfig::builder().with_plugins(args.plugins.iter().cloned());
    if let Some(protoc) = &args.protoc {
        builder = builder.with_protoc(protoc);
    }
    let compiler = Compiler::new(builder.build());

    let statuses = compiler.toolchain_status();
    let missing = statuses
        .iter()
        .filter(|s| !s.builtin && s.path.is_none())
        .count();

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_tools(&statuses) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Failed to format tool report: {:#}", e);
            return EXIT_FAILURE;
        }
    }

    if missing > 0 {
        warn!(missing, "Some tools are not installed");
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

fn report_error(e: &CompileError) -> i32 {
    error!("{}", e);

    match e {
        CompileError::Toolchain(t) => {
            eprintln!("\n{}", t.remediation());
            eprintln!("Run 'protosweep check' to see which tools are available");
        }
        CompileError::NoProtoFiles(_) => {
            eprintln!("\nCheck --proto-dir; only files ending in .proto are considered");
        }
        CompileError::Config(_) => {
            eprintln!("\nPlease check your command-line arguments and PROTOSWEEP_* environment variables.");
        }
        _ => {}
    }

    if e.is_config_error() {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}
