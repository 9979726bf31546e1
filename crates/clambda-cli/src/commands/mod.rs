//! Subcommand implementations

pub mod call;
pub mod functions;
pub mod symbols;
