//! Output generator lookup.
//!
//! Known generators map to a fixed output flag. Anything else follows
//! protoc's own convention: `--<name>_out`, served by a `protoc-gen-<name>`
//! executable on `PATH`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSpec {
    pub name: &'static str,
    pub out_flag: &'static str,
    /// Executable protoc spawns for this output; `None` for generators
    /// compiled into protoc itself
    pub binary: Option<&'static str>,
}

pub const KNOWN_PLUGINS: &[PluginSpec] = &[
    PluginSpec {
        name: "go",
        out_flag: "go_out",
        binary: Some("protoc-gen-go"),
    },
    PluginSpec {
        name: "go-grpc",
        out_flag: "go-grpc_out",
        binary: Some("protoc-gen-go-grpc"),
    },
    PluginSpec { name: "cpp", out_flag: "cpp_out", binary: None },
    PluginSpec { name: "csharp", out_flag: "csharp_out", binary: None },
    PluginSpec { name: "java", out_flag: "java_out", binary: None },
    PluginSpec { name: "kotlin", out_flag: "kotlin_out", binary: None },
    PluginSpec { name: "objc", out_flag: "objc_out", binary: None },
    PluginSpec { name: "php", out_flag: "php_out", binary: None },
    PluginSpec { name: "pyi", out_flag: "pyi_out", binary: None },
    PluginSpec { name: "python", out_flag: "python_out", binary: None },
    PluginSpec { name: "ruby", out_flag: "ruby_out", binary: None },
];

/// A resolved output generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: String,
    pub out_flag: String,
    pub binary: Option<String>,
}

impl Plugin {
    pub fn lookup(name: &str) -> Self {
        match KNOWN_PLUGINS.iter().find(|spec| spec.name == name) {
            Some(spec) => Self {
                name: spec.name.to_string(),
                out_flag: spec.out_flag.to_string(),
                binary: spec.binary.map(str::to_string),
            },
            None => Self {
                name: name.to_string(),
                out_flag: format!("{}_out", name),
                binary: Some(format!("protoc-gen-{}", name)),
            },
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.binary.is_none()
    }

    /// `--<flag>=<opt1,opt2:>output`
    pub fn output_arg(&self, options: &[String], output_dir: &str) -> String {
        format!("--{}={}", self.out_flag, join_options(options, output_dir))
    }
}

/// Options joined with commas and separated from the directory by a colon;
/// the colon is omitted when there are no options.
pub fn join_options(options: &[String], output_dir: &str) -> String {
    let opts: Vec<&str> = options
        .iter()
        .map(String::as_str)
        .filter(|o| !o.is_empty())
        .collect();
    if opts.is_empty() {
        output_dir.to_string()
    } else {
        format!("{}:{}", opts.join(","), output_dir)
    }
}
