use protosweep::cli::commands::{CliArgs, Commands};
use protosweep::cli::handlers::{handle_check, handle_compile, handle_plan};
use protosweep::util::logging::{self, parse_level, LoggingConfig};
use protosweep::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("protosweep v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Compile(compile_args) => {
            handle_compile(compile_args, args.quiet, args.verbose).await
        }
        Commands::Plan(plan_args) => handle_plan(plan_args, args.verbose).await,
        Commands::Check(check_args) => handle_check(check_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("PROTOSWEEP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    logging::init_logging(LoggingConfig {
        level,
        use_json: logging::json_from_env(),
        ..Default::default()
    });
}
