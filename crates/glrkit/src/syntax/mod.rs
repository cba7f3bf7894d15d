//! Spans and the syntax tree produced by parsing.

mod node;
pub mod pretty;
mod text;

pub use node::SyntaxNode;
pub use pretty::{PrettyConfig, render_source, render_tagged};
pub use text::{TextRange, TextSize};
