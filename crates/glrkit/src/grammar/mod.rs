//! # Grammar Model
//!
//! Context-free grammars over [`Terminal`]s and [`NonTerminal`]s.
//!
//! ## Building a grammar
//!
//! Rules are added directly ([`Grammar::add_rule`],
//! [`Grammar::add_alternatives`]) or from an EBNF-like [`RegularForm`]
//! ([`Grammar::add_regular`]), which expands into plain rules over fresh
//! temporary nonterminals.
//!
//! ```rust
//! use glrkit::grammar::{Grammar, NonTerminal, RegularForm, Terminal};
//! use glrkit::sentence;
//!
//! let list = NonTerminal::new("List");
//! let mut grammar = Grammar::new(list.clone());
//! // List -> item (',' item)*
//! let form = RegularForm::concat([
//!     Terminal::kind("item").into(),
//!     RegularForm::star(RegularForm::Sentence(sentence![',', "item"])),
//! ]);
//! grammar.add_regular(list, &form)?;
//! grammar.simplify()?;
//! # Ok::<(), glrkit::grammar::GrammarError>(())
//! ```
//!
//! ## Analysis
//!
//! [`Grammar::simplify`] and [`Grammar::minimize`] clean a grammar up before
//! table construction; [`FirstSets`] computes FIRST sets.

mod builder;
mod first;
mod regular;
mod sentence;
mod simplify;
mod symbol;

pub use builder::Grammar;
pub use first::{FirstSet, FirstSets};
pub use regular::RegularForm;
pub use sentence::{ProductionRule, SentenceForm};
pub use symbol::{LexemeKind, NonTerminal, NonTerminalName, Pattern, Refinement, Symbol, Terminal};

pub use crate::error::GrammarError;
