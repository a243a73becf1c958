use super::plugin::Plugin;
use crate::paths;
use crate::plan::Diagnostic;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One requested output and its options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutput {
    pub plugin: Plugin,
    pub options: Vec<String>,
}

impl PluginOutput {
    pub fn new(name: &str, options: Vec<String>) -> Self {
        Self {
            plugin: Plugin::lookup(name),
            options,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledCommand {
    pub args: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds the argument list in a fixed order: include roots, plugin outputs,
/// then files relative to the primary root. Every path is rendered with
/// forward slashes so identical inputs give identical text on every host.
pub struct CommandAssembler<'a> {
    primary_root: &'a Path,
    output_dir: &'a Path,
    outputs: &'a [PluginOutput],
}

impl<'a> CommandAssembler<'a> {
    pub fn new(primary_root: &'a Path, output_dir: &'a Path, outputs: &'a [PluginOutput]) -> Self {
        Self {
            primary_root,
            output_dir,
            outputs,
        }
    }

    pub fn assemble(&self, roots: &[PathBuf], compile_set: &[PathBuf]) -> AssembledCommand {
        let mut command = AssembledCommand::default();

        for root in roots {
            command.args.push("-I".to_string());
            command.args.push(paths::to_slash(root));
        }

        let output_dir = paths::to_slash(self.output_dir);
        for output in self.outputs {
            command
                .args
                .push(output.plugin.output_arg(&output.options, &output_dir));
        }

        for file in compile_set {
            match paths::relative_to(file, self.primary_root) {
                Some(rel) => command.args.push(paths::to_slash(&rel)),
                None => {
                    warn!(
                        file = %file.display(),
                        root = %self.primary_root.display(),
                        "Proto file lies outside the primary root; passing absolute path"
                    );
                    command.diagnostics.push(Diagnostic::OutsideRoot {
                        file: file.clone(),
                        root: self.primary_root.to_path_buf(),
                    });
                    command.args.push(paths::to_slash(file));
                }
            }
        }

        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go_outputs() -> Vec<PluginOutput> {
        vec![
            PluginOutput::new("go", vec!["paths=source_relative".to_string()]),
            PluginOutput::new("go-grpc", vec!["paths=source_relative".to_string()]),
        ]
    }

    #[test]
    fn test_argument_order() {
        let outputs = go_outputs();
        let assembler =
            CommandAssembler::new(Path::new("/work/proto"), Path::new("/work/gen"), &outputs);

        let command = assembler.assemble(
            &[PathBuf::from("/work/proto"), PathBuf::from("/work/vendor")],
            &[
                PathBuf::from("/work/proto/a.proto"),
                PathBuf::from("/work/proto/api/v1/svc.proto"),
            ],
        );

        assert_eq!(
            command.args,
            vec![
                "-I",
                "/work/proto",
                "-I",
                "/work/vendor",
                "--go_out=paths=source_relative:/work/gen",
                "--go-grpc_out=paths=source_relative:/work/gen",
                "a.proto",
                "api/v1/svc.proto",
            ]
        );
        assert!(command.diagnostics.is_empty());
    }

    #[test]
    fn test_file_outside_root_is_flagged() {
        let outputs = Vec::new();
        let assembler =
            CommandAssembler::new(Path::new("/work/proto"), Path::new("/work/gen"), &outputs);

        let command = assembler.assemble(
            &[PathBuf::from("/work/proto")],
            &[PathBuf::from("/elsewhere/x.proto")],
        );

        assert_eq!(command.args.last().map(String::as_str), Some("/elsewhere/x.proto"));
        assert_eq!(
            command.diagnostics,
            vec![Diagnostic::OutsideRoot {
                file: PathBuf::from("/elsewhere/x.proto"),
                root: PathBuf::from("/work/proto"),
            }]
        );
    }

    #[test]
    fn test_unknown_plugin_gets_its_options() {
        let outputs = vec![PluginOutput::new(
            "grpc-gateway",
            vec!["logtostderr=true".to_string()],
        )];
        let assembler =
            CommandAssembler::new(Path::new("/work/proto"), Path::new("/work/gen"), &outputs);

        let command = assembler.assemble(&[], &[]);

        assert_eq!(command.args, vec!["--grpc-gateway_out=logtostderr=true:/work/gen"]);
    }
}
