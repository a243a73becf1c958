use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{CompilerConfig, CompilerConfigBuilder};

/// Compile whole proto trees with a single, duplicate-free protoc invocation
#[derive(Parser, Debug)]
#[command(
    name = "protosweep",
    about = "Compile whole proto trees with a single, duplicate-free protoc invocation",
    version,
    author,
    long_about = "protosweep finds every .proto file under a directory, reads their imports, \
                  and runs protoc once with only the files nothing else imports. Each include \
                  root is passed exactly once, so protoc never sees the same file twice."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Log discovered files, resolution notes and the protoc command"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run protoc over a proto tree",
        long_about = "Discovers .proto files, selects the ones to list explicitly, creates the \
                      output directory and runs protoc.\n\n\
                      Examples:\n  \
                      protosweep compile -p api/proto -o gen\n  \
                      protosweep compile -p api/proto/v1 -w api/proto -o gen --plugins go,go-grpc\n  \
                      protosweep compile -p proto -I third_party --plugins python"
    )]
    Compile(CompileArgs),

    #[command(
        about = "Show the protoc invocation without running it",
        long_about = "Resolves the compile set and include roots and prints them along with any \
                      diagnostics. Nothing is executed and no tools are required.\n\n\
                      Examples:\n  \
                      protosweep plan -p api/proto\n  \
                      protosweep plan -p api/proto --format json"
    )]
    Plan(PlanArgs),

    #[command(
        about = "Check that protoc and the requested plugins are installed",
        long_about = "Looks up protoc and every plugin binary in PATH and reports what is \
                      missing, with installation hints.\n\n\
                      Examples:\n  \
                      protosweep check\n  \
                      protosweep check --plugins go,go-grpc --format json"
    )]
    Check(CheckArgs),
}

/// Flags shared by every subcommand that resolves a proto tree
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(
        short = 'p',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory containing .proto files"
    )]
    pub proto_dir: PathBuf,

    #[arg(
        short = 'w',
        long,
        value_name = "DIR",
        help = "Primary include root (defaults to the proto directory)"
    )]
    pub workspace_dir: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Output directory for generated code"
    )]
    pub output_dir: PathBuf,

    #[arg(
        short = 'I',
        long = "proto-path",
        value_name = "DIR",
        value_delimiter = ',',
        help = "Additional include root (repeatable or comma separated)"
    )]
    pub proto_paths: Vec<PathBuf>,

    #[arg(
        long,
        value_name = "NAMES",
        value_delimiter = ',',
        default_value = "go",
        help = "Plugins to run, in order"
    )]
    pub plugins: Vec<String>,

    #[arg(
        long = "go-opt",
        value_name = "OPTS",
        value_delimiter = ',',
        default_value = "paths=source_relative",
        help = "Options for protoc-gen-go"
    )]
    pub go_opts: Vec<String>,

    #[arg(
        long = "go-grpc-opt",
        value_name = "OPTS",
        value_delimiter = ',',
        default_value = "paths=source_relative",
        help = "Options for protoc-gen-go-grpc"
    )]
    pub go_grpc_opts: Vec<String>,

    #[arg(
        long = "plugin-opt",
        value_name = "NAME=OPT",
        value_parser = parse_plugin_opt,
        help = "Option for any plugin, e.g. grpc-gateway=logtostderr=true (repeatable)"
    )]
    pub plugin_opts: Vec<(String, String)>,

    #[arg(
        long,
        help = "List every discovered file instead of only the ones nothing imports"
    )]
    pub no_auto_detect_imports: bool,

    #[arg(
        long,
        value_name = "LEVELS",
        help = "How many directories above the workspace an import may be found in"
    )]
    pub max_ascent: Option<usize>,

    #[arg(long, value_name = "PROGRAM", help = "protoc program name or path")]
    pub protoc: Option<String>,
}

impl SourceArgs {
    /// Starts from environment-aware defaults and applies the flags on top
    pub fn to_builder(&self, verbose: bool) -> CompilerConfigBuilder {
        let mut builder = CompilerConfig::builder()
            .with_proto_dir(&self.proto_dir)
            .with_output_dir(&self.output_dir)
            .with_proto_paths(self.proto_paths.iter().cloned())
            .with_plugins(self.plugins.iter().cloned())
            .with_go_opts(self.go_opts.iter().cloned())
            .with_go_grpc_opts(self.go_grpc_opts.iter().cloned())
            .with_verbose(verbose);

        if let Some(dir) = &self.workspace_dir {
            builder = builder.with_workspace_dir(dir);
        }
        if self.no_auto_detect_imports {
            builder = builder.with_auto_detect_imports(false);
        }
        if let Some(levels) = self.max_ascent {
            builder = builder.with_max_ascent(levels);
        }
        if let Some(protoc) = &self.protoc {
            builder = builder.with_protoc(protoc);
        }

        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (name, opt) in &self.plugin_opts {
            match grouped.iter_mut().find(|(n, _)| n == name) {
                Some((_, opts)) => opts.push(opt.clone()),
                None => grouped.push((name.clone(), vec![opt.clone()])),
            }
        }
        for (name, opts) in grouped {
            builder = builder.with_plugin_opts(&name, opts);
        }

        builder
    }
}

#[derive(Parser, Debug, Clone)]
pub struct CompileArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Kill protoc if it runs longer than this"
    )]
    pub timeout: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    #[arg(
        long,
        value_name = "NAMES",
        value_delimiter = ',',
        default_value = "go",
        help = "Plugins to check"
    )]
    pub plugins: Vec<String>,

    #[arg(long, value_name = "PROGRAM", help = "protoc program name or path")]
    pub protoc: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_plugin_opt(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, opt)) if !name.is_empty() && !opt.is_empty() => {
            Ok((name.to_string(), opt.to_string()))
        }
        _ => Err(format!(
            "Invalid plugin option: {}. Expected NAME=OPTION, e.g. grpc-gateway=logtostderr=true",
            s
        )),
    }
}
