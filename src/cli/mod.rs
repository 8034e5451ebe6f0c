pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BuildArgs, CliArgs, Commands, ConfigArgs, InitScriptArgs};
pub use output::{OutputFormat, OutputFormatter};
