//! # Tree Rendering
//!
//! Two textual forms of a [`SyntaxNode`]:
//!
//! - **tagged**: one line per node, indented by depth. Interior nodes print
//!   their nonterminal, leaves their lexeme kind and quoted text:
//!
//!   ```text
//!   S@0..4
//!     B@0..2
//!       a "a"@0..1
//!       B@1..2
//!         b "b"@1..2
//!   ```
//!
//! - **source**: the original text under the node, reproduced from the
//!   source it was tokenized from.

use crate::syntax::SyntaxNode;
use std::fmt::Write;

/// Options for [`render_tagged`].
#[derive(Debug, Clone)]
pub struct PrettyConfig {
    /// Indentation added per tree level
    pub indent: String,
    /// Append `@start..end` to every node
    pub show_ranges: bool,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            indent: "  ".into(),
            show_ranges: true,
        }
    }
}

impl PrettyConfig {
    /// Tagged form without byte ranges, convenient in assertions.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            show_ranges: false,
            ..Self::default()
        }
    }
}

/// Render `node` in tagged, indented form. Every line ends with a newline.
#[must_use]
pub fn render_tagged(node: &SyntaxNode, config: &PrettyConfig) -> String {
    let mut out = String::new();
    let mut stack = vec![(node, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        for _ in 0..depth {
            out.push_str(&config.indent);
        }
        match node {
            SyntaxNode::Leaf(token) => {
                // writing into a String cannot fail
                let _ = write!(out, "{} {:?}", token.kind, token.text.as_str());
            }
            SyntaxNode::Interior {
                nonterminal,
                children,
            } => {
                let _ = write!(out, "{nonterminal}");
                stack.extend(children.iter().rev().map(|c| (c.as_ref(), depth + 1)));
            }
        }
        if config.show_ranges
            && let Some(range) = node.span()
        {
            let _ = write!(out, "@{range}");
        }
        out.push('\n');
    }
    out
}

/// The text of `source` under `node`, or an empty string for a node that
/// covers no tokens or does not fit `source`.
#[must_use]
pub fn render_source<'s>(node: &SyntaxNode, source: &'s str) -> &'s str {
    node.source_text(source).unwrap_or_default()
}
