//! Turns a resolved source set into protoc arguments

pub mod assembler;
pub mod plugin;

pub use assembler::{AssembledCommand, CommandAssembler, PluginOutput};
pub use plugin::{Plugin, PluginSpec, KNOWN_PLUGINS};
