use crate::grammar::LexemeKind;
use crate::syntax::TextRange;
use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A token handed to the parser by an external tokenizer.
///
/// Tokens carry their lexeme kind, the exact matched text and the byte range
/// that text occupies in the source. Grammar terminals match on the kind and,
/// when refined, on the text.
///
/// # Example
///
/// ```rust
/// use glrkit::lexer::Token;
/// use glrkit::syntax::{TextRange, TextSize};
///
/// let token = Token::new(
///     "number",
///     "42",
///     TextRange::at(TextSize::from(0), TextSize::from(2)),
/// );
/// assert_eq!(token.kind.as_str(), "number");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Token {
    /// The lexeme kind (e.g. `ident`, `number`)
    pub kind: LexemeKind,
    /// The source text this token represents
    pub text: CompactString,
    /// Byte range of the token in the source text
    pub range: TextRange,
}

impl Token {
    #[must_use]
    pub fn new(
        kind: impl Into<LexemeKind>,
        text: impl Into<CompactString>,
        range: TextRange,
    ) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            range,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})@{}", self.kind, self.text.as_str(), self.range)
    }
}
