pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CheckArgs, CliArgs, Commands, CompileArgs, PlanArgs, SourceArgs};
pub use output::{OutputFormat, OutputFormatter};
