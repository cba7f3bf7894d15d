//! # Parsing Tables
//!
//! Table construction and execution.
//!
//! ## Table flavors
//!
//! - [`lr::CanonicalTable`]: canonical LR(1), at most one action per cell;
//!   any conflict aborts construction.
//! - [`glr::GlrTable`]: the same automaton with every conflicting action kept;
//!   ambiguity is resolved at runtime.
//! - [`compiled::CompiledTable`]: a dense, serializable snapshot of either.
//!
//! All three implement [`ParseTable`], which is everything the runtime
//! ([`glr::GlrParser`]) needs: a [`SymbolTable`], action lists and gotos.
//!
//! ## Usage
//!
//! ```rust
//! use glrkit::backend::glr::{GlrConfig, GlrParser, GlrTable};
//! use glrkit::backend::TableBackend;
//! use glrkit::testing::{char_tokens, sample_grammar};
//!
//! let table = GlrTable::build(&sample_grammar())?;
//! let parser = GlrParser::new(&table, GlrConfig::default());
//! let outcome = parser.parse(char_tokens("abab"))?;
//! assert_eq!(outcome.root.text(), "abab");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compiled;
pub mod glr;
pub mod lr;
mod symbols;

pub use symbols::{RuleShape, SymbolTable};

use crate::error::TableError;
use crate::grammar::Grammar;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Index of an automaton state.
pub type StateId = u32;

/// A table action for one (state, terminal) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Consume the terminal and enter the state
    Shift(StateId),
    /// Reduce by the rule with this index
    Reduce(u32),
    /// Input recognized
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(state) => write!(f, "shift {state}"),
            Self::Reduce(rule) => write!(f, "reduce {rule}"),
            Self::Accept => f.write_str("accept"),
        }
    }
}

/// Which construction produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TableFlavor {
    Canonical,
    Generalized,
}

impl TableFlavor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Generalized => "glr",
        }
    }
}

impl fmt::Display for TableFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size figures for a built table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TableStats {
    pub flavor: TableFlavor,
    pub states: usize,
    pub terminals: usize,
    pub nonterminals: usize,
    pub rules: usize,
    /// Total number of actions over all cells
    pub actions: usize,
    pub gotos: usize,
    /// Cells holding more than one action
    pub conflicted_cells: usize,
}

/// Read access to a parsing table, whatever its construction or storage.
///
/// Terminals and nonterminals are addressed by their index in
/// [`symbols()`](Self::symbols). Terminal 0 is the terminator.
pub trait ParseTable {
    fn flavor(&self) -> TableFlavor;

    fn symbols(&self) -> &SymbolTable;

    fn state_count(&self) -> usize;

    /// The state parsing starts in.
    fn initial_state(&self) -> StateId {
        0
    }

    /// Actions for `terminal` in `state`, in table order; empty if none.
    fn actions(&self, state: StateId, terminal: u32) -> SmallVec<[Action; 2]>;

    fn goto(&self, state: StateId, nonterminal: u32) -> Option<StateId>;

    /// Terminals with at least one action in `state`.
    fn expected_terminals(&self, state: StateId) -> Vec<u32> {
        (0..self.symbols().terminal_count())
            .filter(|&terminal| !self.actions(state, terminal).is_empty())
            .collect()
    }

    fn stats(&self) -> TableStats {
        let symbols = self.symbols();
        let mut stats = TableStats {
            flavor: self.flavor(),
            states: self.state_count(),
            terminals: symbols.terminals().len(),
            nonterminals: symbols.nonterminals().len(),
            rules: symbols.rules().len(),
            actions: 0,
            gotos: 0,
            conflicted_cells: 0,
        };
        for state in 0..self.state_count() {
            let state = StateId::try_from(state).unwrap_or(StateId::MAX);
            for terminal in 0..symbols.terminal_count() {
                let count = self.actions(state, terminal).len();
                stats.actions += count;
                if count > 1 {
                    stats.conflicted_cells += 1;
                }
            }
            for nonterminal in 0..symbols.nonterminal_count() {
                if self.goto(state, nonterminal).is_some() {
                    stats.gotos += 1;
                }
            }
        }
        stats
    }
}

/// A table that can be built from a grammar.
pub trait TableBackend: ParseTable + Sized {
    /// Simplify a copy of `grammar` and build the table from it.
    ///
    /// # Errors
    ///
    /// Grammar errors from simplification and FIRST analysis; canonical
    /// builders additionally report conflicts.
    fn build(grammar: &Grammar) -> Result<Self, TableError>;
}
