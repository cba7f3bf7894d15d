//! # GLR (Generalized LR) Backend
//!
//! A conflict-preserving table and the runtime that executes it.
//!
//! ## Overview
//!
//! [`GlrTable`] is built from the canonical LR(1) automaton like
//! [`CanonicalTable`](crate::backend::lr::CanonicalTable), but keeps every
//! action of a conflicted cell. [`GlrParser`] runs any
//! [`ParseTable`](crate::backend::ParseTable): whenever a cell offers several
//! actions it forks the current branch, one child per action.
//!
//! ## Algorithm
//!
//! 1. Match the next token to a terminal (literal, then pattern, then plain
//!    lexeme kind).
//! 2. For every live branch, look up the actions for its top state. No action
//!    kills the branch; several fork it.
//! 3. A reduce pops the rule's length, pushes the goto state with a new
//!    interior node and looks up the same terminal again; a shift ends the
//!    branch's turn for this token.
//! 4. A branch that shifts into the same state stack as an earlier branch is
//!    merged into it (dropped).
//! 5. The first branch to accept wins. If none survives a token, the input is
//!    rejected.
//!
//! Branches live in a [`TreeStack`]: forked branches share their history as
//! common ancestor segments, and dead branches are merged away.

mod parser;
mod stack;
mod table;

pub use parser::{GlrParser, ParseOutcome};
pub use stack::{Branch, TreeStack};
pub use table::GlrTable;

/// Limits and output options for [`GlrParser`].
#[derive(Debug, Clone)]
pub struct GlrConfig {
    /// Maximum number of live branches; exceeding it fails the parse
    pub max_branches: usize,
    /// Maximum number of reductions while processing a single token, summed
    /// over all branches. Guards against unit cycles in the grammar.
    pub max_reductions_per_token: usize,
    /// Splice temporary nonterminals out of the accepted tree
    pub clean_tree: bool,
}

impl Default for GlrConfig {
    fn default() -> Self {
        Self {
            max_branches: 1000,
            max_reductions_per_token: 100_000,
            clean_tree: true,
        }
    }
}
