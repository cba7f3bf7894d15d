//! # Canonical LR(1)
//!
//! The canonical collection of LR(1) item sets and the conflict-free table
//! built from it.
//!
//! ## Algorithm
//!
//! 1. Augment the grammar with `S' -> S` and index it ([`IndexedGrammar`])
//! 2. Close `S' -> • S, $` and explore `Go` transitions breadth-first
//!    ([`Automaton`]); states are identified by their item sets
//! 3. Walk every item of every state and fill the action and goto cells
//!    ([`CanonicalTable`]); two different actions in one cell is a
//!    [`Conflict`](crate::error::Conflict)
//!
//! The generalized builder in [`crate::backend::glr`] reuses steps 1 and 2.

mod automaton;
mod grammar;
mod item;
mod table;

pub use automaton::Automaton;
pub use grammar::{
    AUGMENTED_RULE, AUGMENTED_START, IndexedGrammar, IndexedRule, RuleDisplay, SymbolRef, TERMINATOR,
};
pub use item::{Item, ItemDisplay, ItemSet, ItemSetDisplay};
pub use table::CanonicalTable;

pub(crate) use table::{TableEntry, build_automaton, for_each_entry};
