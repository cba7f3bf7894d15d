//! # glrkit
//!
//! Canonical LR(1) and GLR parsing tables for context-free grammars, and a
//! GLR runtime that executes them against a token stream.
//!
//! ## Overview
//!
//! - **Grammars** are sets of production rules over [`grammar::Terminal`]s
//!   and [`grammar::NonTerminal`]s, written directly or expanded from
//!   EBNF-like [`grammar::RegularForm`]s.
//! - **Tables** come in two flavors built from the same canonical LR(1)
//!   automaton: [`backend::lr::CanonicalTable`] rejects conflicts,
//!   [`backend::glr::GlrTable`] keeps them for the runtime to explore.
//! - **Compiled tables** ([`backend::compiled::CompiledTable`]) are dense
//!   snapshots that can be saved and loaded instead of rebuilt.
//! - **Parsing** with [`backend::glr::GlrParser`] forks on ambiguous cells
//!   and returns the first accepted [`syntax::SyntaxNode`] tree, with
//!   synthesized nonterminals spliced out.
//!
//! Tokenization is external: any lexer producing [`lexer::Token`]s will do.
//!
//! ## Quick Start
//!
//! ```rust
//! use glrkit::backend::TableBackend;
//! use glrkit::backend::glr::{GlrConfig, GlrParser, GlrTable};
//! use glrkit::grammar::{Grammar, NonTerminal, RegularForm};
//! use glrkit::sentence;
//! use glrkit::testing::char_tokens;
//!
//! // List -> ( x ( , x )* )
//! let list = NonTerminal::new("List");
//! let mut grammar = Grammar::new(list.clone());
//! grammar.add_regular(
//!     list,
//!     &RegularForm::concat([
//!         RegularForm::from(sentence!['(', 'x']),
//!         RegularForm::star(sentence![',', 'x']),
//!         RegularForm::from(sentence![')']),
//!     ]),
//! )?;
//!
//! let table = GlrTable::build(&grammar)?;
//! let parser = GlrParser::new(&table, GlrConfig::default());
//! let outcome = parser.parse(char_tokens("(x,x,x)"))?;
//!
//! // the repetition's helper nonterminal is gone: all tokens hang off List
//! assert_eq!(outcome.root.children().len(), 7);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Symbols, rules, simplification, regular forms, FIRST sets
//! - [`backend`] - Automaton, table builders, compiled tables, GLR runtime
//! - [`syntax`] - Spans and the syntax tree
//! - [`lexer`] - The token boundary type
//! - [`parser`] - Parse events and metrics
//! - [`error`] - Error types
//! - [`testing`] - Fixtures for tests and benchmarks

pub mod backend;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod testing;

pub use backend::compiled::CompiledTable;
pub use backend::glr::{GlrConfig, GlrParser, GlrTable, ParseOutcome};
pub use backend::lr::CanonicalTable;
pub use backend::{Action, ParseTable, TableBackend};
pub use error::{FormatError, GrammarError, ParseError, SyntaxError, TableError};
pub use grammar::{Grammar, NonTerminal, RegularForm, SentenceForm, Symbol, Terminal};
pub use lexer::Token;
pub use parser::{ParseEvent, ParseEventHandler, ParseMetrics};
pub use syntax::{SyntaxNode, TextRange, TextSize};
