//! # Tokens
//!
//! Tokenization itself is external: callers run whatever lexer suits their
//! language and hand the parser a sequence of [`Token`]s. This module only
//! defines that boundary type.

mod token;

pub use token::Token;
