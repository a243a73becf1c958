//! Output formatting for multiple formats
//!
//! Plans and tool reports render as JSON, YAML, or human-readable text.
//!
//! # Example
//!
//! ```ignore
//! use protosweep::cli::output::{OutputFormat, OutputFormatter};
//!
//! let plan = compiler.plan()?;
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! println!("{}", formatter.format_plan(&plan)?);
//! ```

use anyhow::{Context, Result};
use std::fmt::Write as _;

use crate::plan::CompilePlan;
use crate::toolchain::{self, ToolStatus};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_plan(&self, plan: &CompilePlan) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(plan).context("Failed to serialize plan to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(plan).context("Failed to serialize plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_plan_human(plan)),
        }
    }

    pub fn format_tools(&self, tools: &[ToolStatus]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(tools)
                .context("Failed to serialize tool report to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(tools).context("Failed to serialize tool report to YAML")
            }
            OutputFormat::Human => Ok(self.format_tools_human(tools)),
        }
    }

    fn format_plan_human(&self, plan: &CompilePlan) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Proto files: {} discovered, {} listed", plan.discovered, plan.compile_set.len());
        let _ = writeln!(out, "Working directory: {}", plan.working_dir.display());
        let _ = writeln!(out, "Output directory:  {}", plan.output_dir.display());

        let _ = writeln!(out, "\nInclude roots:");
        for root in &plan.roots {
            let _ = writeln!(out, "  {}", root.display());
        }

        let _ = writeln!(out, "\nCompile:");
        for file in plan.file_args() {
            let _ = writeln!(out, "  {}", file);
        }

        if !plan.omitted.is_empty() {
            let _ = writeln!(out, "\nReached through imports:");
            for file in &plan.omitted {
                let _ = writeln!(out, "  {}", file.display());
            }
        }

        if !plan.diagnostics.is_empty() {
            let _ = writeln!(out, "\nNotes:");
            for diagnostic in &plan.diagnostics {
                let _ = writeln!(out, "  - {}", diagnostic);
            }
        }

        let _ = write!(out, "\nCommand:\n  {}", plan.command_line());
        out
    }

    fn format_tools_human(&self, tools: &[ToolStatus]) -> String {
        let mut out = String::new();

        for tool in tools {
            if tool.builtin {
                let _ = writeln!(out, "✓ {:<22} built into protoc", tool.name);
                continue;
            }
            match &tool.path {
                Some(path) => {
                    let _ = writeln!(out, "✓ {:<22} {}", tool.name, path.display());
                }
                None => {
                    let _ = writeln!(out, "✗ {:<22} not found in PATH", tool.name);
                    let _ = writeln!(out, "  {}", toolchain::remediation(&tool.name));
                }
            }
        }

        out.trim_end().to_string()
    }
}
