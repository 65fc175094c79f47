//! CLI surface

pub mod commands;

pub use commands::CliArgs;
