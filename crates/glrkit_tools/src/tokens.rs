//! Tokens files for `glrkit parse`
//!
//! One token per line, `kind<TAB>text`. The text may use `\t`, `\n` and `\\`
//! escapes; a line without a tab is a token whose text equals its kind.
//! Blank lines are skipped. Ranges are assigned as if the token texts were
//! laid end to end.

use crate::ToolError;
use glrkit::syntax::{TextRange, TextSize};
use glrkit::Token;

/// # Errors
///
/// [`ToolError::TokenLine`] for an empty kind or a bad escape.
pub fn read_tokens(input: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut offset = TextSize::zero();
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let (kind, text) = match line.split_once('\t') {
            Some((kind, text)) => (kind, unescape(text, line_no)?),
            None => (line, line.to_string()),
        };
        if kind.is_empty() {
            return Err(ToolError::TokenLine {
                line: line_no,
                message: "empty lexeme kind".into(),
            });
        }
        let range = TextRange::at(offset, TextSize::of(&text));
        offset = range.end();
        tokens.push(Token::new(kind, text, range));
    }
    Ok(tokens)
}

fn unescape(text: &str, line: usize) -> Result<String, ToolError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            _ => {
                return Err(ToolError::TokenLine {
                    line,
                    message: "bad escape".into(),
                });
            }
        }
    }
    Ok(out)
}
