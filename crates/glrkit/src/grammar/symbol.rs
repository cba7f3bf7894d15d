//! Grammar symbols: lexeme kinds, terminals, nonterminals.

use crate::grammar::GrammarError;
use crate::lexer::Token;
use compact_str::CompactString;
use regex::Regex;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

/// Source of fresh ids for temporary nonterminals. Holds the next id to hand
/// out; `u32::MAX` means every id is taken.
static NEXT_SYNTHETIC_ID: AtomicU32 = AtomicU32::new(1);

fn allocate_id(counter: &AtomicU32) -> Option<u32> {
    counter
        .fetch_update(AtomicOrdering::Relaxed, AtomicOrdering::Relaxed, |next| next.checked_add(1))
        .ok()
}

fn reserve_id(counter: &AtomicU32, id: u32) {
    counter.fetch_max(id.saturating_add(1), AtomicOrdering::Relaxed);
}

/// A category of token (identifier, number, keyword...) independent of its text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LexemeKind(CompactString);

impl LexemeKind {
    #[must_use]
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LexemeKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A compiled whole-text regular expression.
///
/// Equality, ordering and hashing go through the source text, so two patterns
/// written identically are the same refinement.
#[derive(Clone)]
pub struct Pattern {
    source: CompactString,
    regex: Regex,
}

impl Pattern {
    /// Compile `source`; the pattern must match a token's entire text.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error for an invalid pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.into(),
            regex,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source.cmp(&other.source)
    }
}

/// Exact-match refinement distinguishing terminals that share a lexeme kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Refinement {
    /// Token text must equal this string
    Literal(CompactString),
    /// Token text must match this pattern in full
    Pattern(Pattern),
}

impl Refinement {
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == text,
            Self::Pattern(pattern) => pattern.is_match(text),
        }
    }
}

/// A grammar terminal: a lexeme kind with an optional refinement, or the
/// end-of-input sentinel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Terminal {
    /// End of input; carries no lexeme
    Terminator,
    Lexeme {
        kind: LexemeKind,
        refinement: Option<Refinement>,
    },
}

impl Terminal {
    /// Terminal matching any token of `kind`.
    #[must_use]
    pub fn kind(kind: impl Into<CompactString>) -> Self {
        Self::Lexeme {
            kind: LexemeKind::new(kind),
            refinement: None,
        }
    }

    /// Terminal matching tokens of `kind` whose text is exactly `text`.
    #[must_use]
    pub fn literal(kind: impl Into<CompactString>, text: impl Into<CompactString>) -> Self {
        Self::Lexeme {
            kind: LexemeKind::new(kind),
            refinement: Some(Refinement::Literal(text.into())),
        }
    }

    /// Terminal matching tokens of `kind` whose whole text matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::InvalidPattern`] if `pattern` does not compile.
    pub fn pattern(kind: impl Into<CompactString>, pattern: &str) -> Result<Self, GrammarError> {
        let pattern = Pattern::new(pattern).map_err(|source| GrammarError::InvalidPattern {
            pattern: pattern.into(),
            source,
        })?;
        Ok(Self::Lexeme {
            kind: LexemeKind::new(kind),
            refinement: Some(Refinement::Pattern(pattern)),
        })
    }

    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(self, Self::Terminator)
    }

    #[must_use]
    pub const fn lexeme_kind(&self) -> Option<&LexemeKind> {
        match self {
            Self::Terminator => None,
            Self::Lexeme { kind, .. } => Some(kind),
        }
    }

    #[must_use]
    pub const fn refinement(&self) -> Option<&Refinement> {
        match self {
            Self::Terminator => None,
            Self::Lexeme { refinement, .. } => refinement.as_ref(),
        }
    }

    /// Whether `token` satisfies this terminal. The terminator never matches
    /// a real token.
    #[must_use]
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Self::Terminator => false,
            Self::Lexeme { kind, refinement } => {
                *kind == token.kind && refinement.as_ref().is_none_or(|r| r.matches(&token.text))
            }
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminator => f.write_str("$"),
            Self::Lexeme {
                kind,
                refinement: None,
            } => write!(f, "{kind}"),
            Self::Lexeme {
                kind,
                refinement: Some(Refinement::Literal(text)),
            } => write!(f, "{kind}{text:?}"),
            Self::Lexeme {
                kind,
                refinement: Some(Refinement::Pattern(pattern)),
            } => write!(f, "{kind}/{}/", pattern.as_str()),
        }
    }
}

/// A named grammar symbol defined by production rules.
///
/// Temporary nonterminals are synthesized (by regular-form expansion or table
/// augmentation). Each carries a process-unique id, so two temporaries never
/// compare equal even when they share a display name, and they are spliced out
/// of cleaned syntax trees.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct NonTerminal {
    name: CompactString,
    synthetic: Option<u32>,
}

impl NonTerminal {
    #[must_use]
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            synthetic: None,
        }
    }

    /// A fresh temporary nonterminal; `hint` only affects its display name.
    ///
    /// # Panics
    ///
    /// If the process has used up every temporary id; see
    /// [`try_temporary`](Self::try_temporary).
    #[must_use]
    pub fn temporary(hint: impl Into<CompactString>) -> Self {
        match Self::try_temporary(hint) {
            Ok(nonterminal) => nonterminal,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`temporary`](Self::temporary), but fails instead of reusing an id
    /// once they are exhausted.
    ///
    /// # Errors
    ///
    /// [`GrammarError::TemporariesExhausted`] when no fresh id is left.
    pub fn try_temporary(hint: impl Into<CompactString>) -> Result<Self, GrammarError> {
        let id = allocate_id(&NEXT_SYNTHETIC_ID).ok_or(GrammarError::TemporariesExhausted)?;
        Ok(Self {
            name: hint.into(),
            synthetic: Some(id),
        })
    }

    /// Rebuild a nonterminal read back from storage, keeping fresh ids clear of
    /// the restored one.
    pub(crate) fn restore(name: impl Into<CompactString>, synthetic: Option<u32>) -> Self {
        if let Some(id) = synthetic {
            reserve_id(&NEXT_SYNTHETIC_ID, id);
        }
        Self {
            name: name.into(),
            synthetic,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.synthetic.is_some()
    }

    #[must_use]
    pub const fn synthetic_id(&self) -> Option<u32> {
        self.synthetic
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.synthetic {
            None => f.write_str(&self.name),
            Some(id) => write!(f, "{}#{id}", self.name),
        }
    }
}

impl From<&str> for NonTerminal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A closed set of nonterminals, typically a language definition's enum.
///
/// Implementors map each variant to a static name; the name is the
/// nonterminal's identity inside a [`Grammar`](crate::grammar::Grammar).
///
/// ```
/// use glrkit::grammar::{NonTerminal, NonTerminalName};
///
/// #[derive(Clone, Copy)]
/// enum Json {
///     Value,
///     Object,
/// }
///
/// impl NonTerminalName for Json {
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Value => "Value",
///             Self::Object => "Object",
///         }
///     }
/// }
///
/// assert_eq!(Json::Object.nonterminal(), NonTerminal::new("Object"));
/// ```
pub trait NonTerminalName {
    fn name(&self) -> &'static str;

    fn nonterminal(&self) -> NonTerminal {
        NonTerminal::new(self.name())
    }
}

/// Terminal or nonterminal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl Symbol {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    #[must_use]
    pub const fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::NonTerminal(_) => None,
        }
    }

    #[must_use]
    pub const fn as_nonterminal(&self) -> Option<&NonTerminal> {
        match self {
            Self::Terminal(_) => None,
            Self::NonTerminal(n) => Some(n),
        }
    }
}

impl From<Terminal> for Symbol {
    fn from(terminal: Terminal) -> Self {
        Self::Terminal(terminal)
    }
}

impl From<NonTerminal> for Symbol {
    fn from(nonterminal: NonTerminal) -> Self {
        Self::NonTerminal(nonterminal)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(t) => t.fmt(f),
            Self::NonTerminal(n) => n.fmt(f),
        }
    }
}
