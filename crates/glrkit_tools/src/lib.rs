//! glrkit tools - command-line utilities over compiled parse tables
//!
//! This crate backs the `glrkit` binary: table reports, Graphviz export of
//! the automaton, and parsing of pre-tokenized input.

pub mod cli;
pub mod error;
pub mod report;
pub mod tokens;
pub mod visualize;

pub use error::ToolError;
pub use report::TableReport;
pub use visualize::generate_dot;
