//! # Error Types
//!
//! Every stage of the pipeline has its own error enum:
//!
//! - [`GrammarError`]: malformed grammars (bad repetition bounds, undefined or
//!   unproductive nonterminals, cyclic FIRST dependencies)
//! - [`TableError`]: table construction failures, chiefly canonical
//!   [`Conflict`]s
//! - [`ParseError`]: runtime failures (unmatched tokens, rejected input,
//!   exceeded limits)
//! - [`FormatError`]: compiled table files that cannot be read
//! - [`SyntaxError`]: misuse of syntax tree operations
//!
//! None of these are recoverable within a parse attempt; the caller fixes the
//! grammar or the input and tries again.
//!
//! ## Diagnostics Support
//!
//! With the `diagnostics` feature, [`ParseError`] derives
//! [`miette::Diagnostic`] and labels the offending source range.

use crate::backend::Action;
use crate::grammar::{NonTerminal, Terminal};
use crate::lexer::Token;
use crate::syntax::TextRange;
use compact_str::CompactString;
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

#[derive(Debug, Clone, Error)]
pub enum GrammarError {
    #[error("invalid repetition bounds: min {min} exceeds max {max}")]
    InvalidRepetition { min: usize, max: usize },

    #[error("invalid terminal pattern `{pattern}`")]
    InvalidPattern {
        pattern: CompactString,
        #[source]
        source: regex::Error,
    },

    #[error("nonterminal `{0}` is used but has no rules")]
    UndefinedNonTerminal(NonTerminal),

    #[error("nonterminal `{0}` only derives itself; no terminal-yielding alternative exists")]
    UnresolvableRecursion(NonTerminal),

    #[error("initial nonterminal `{0}` derives no finite terminal string")]
    EmptyLanguage(NonTerminal),

    #[error("no fresh temporary nonterminal ids are left")]
    TemporariesExhausted,
}

/// Which pair of actions collided in a canonical table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    /// Any collision involving `accept`
    Other,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ShiftReduce => "shift/reduce",
            Self::ReduceReduce => "reduce/reduce",
            Self::Other => "action",
        })
    }
}

/// A canonical table cell that would need two different actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: u32,
    pub terminal: Terminal,
    pub existing: Action,
    pub incoming: Action,
}

impl Conflict {
    #[must_use]
    pub const fn kind(&self) -> ConflictKind {
        match (self.existing, self.incoming) {
            (Action::Shift(_), Action::Reduce(_)) | (Action::Reduce(_), Action::Shift(_)) => {
                ConflictKind::ShiftReduce
            }
            (Action::Reduce(_), Action::Reduce(_)) => ConflictKind::ReduceReduce,
            _ => ConflictKind::Other,
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} conflict in state {} on `{}`: {} vs {}",
            self.kind(),
            self.state,
            self.terminal,
            self.existing,
            self.incoming
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum TableError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("grammar is not LR(1): {0}")]
    Conflict(Box<Conflict>),
}

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    #[error("token {token} at position {position} matches no terminal of the grammar")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(glr::unmatched_token)))]
    UnmatchedToken {
        token: Token,
        position: usize,
        #[cfg_attr(feature = "diagnostics", label("Unknown token"))]
        range: TextRange,
    },

    #[error("input rejected: no parse survives past position {position}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(glr::rejected)))]
    Rejected {
        position: usize,
        #[cfg_attr(feature = "diagnostics", label("Parsing stopped here"))]
        range: TextRange,
    },

    #[error("more than {limit} live branches at position {position}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(glr::branch_limit)))]
    BranchLimit { limit: usize, position: usize },

    #[error("more than {limit} reductions while processing position {position}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(glr::reduction_limit)))]
    ReductionLimit { limit: usize, position: usize },

    #[error("malformed parse table: {message}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(glr::malformed_table)))]
    MalformedTable { message: String },

    #[error("accepted tree cannot be cleaned: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(glr::temporary_root)))]
    Tree(#[from] SyntaxError),
}

impl ParseError {
    /// Index of the token at which parsing stopped, if the error has one.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::UnmatchedToken { position, .. }
            | Self::Rejected { position, .. }
            | Self::BranchLimit { position, .. }
            | Self::ReductionLimit { position, .. } => Some(*position),
            Self::MalformedTable { .. } | Self::Tree(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: invalid number")]
    InvalidNumber {
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("line {line}: invalid terminal pattern")]
    InvalidPattern {
        line: usize,
        #[source]
        source: regex::Error,
    },
}

impl FormatError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("cannot clean a tree whose root `{0}` is temporary")]
    TemporaryRoot(NonTerminal),
}
