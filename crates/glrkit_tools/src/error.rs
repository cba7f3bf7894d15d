use glrkit::{FormatError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("cannot read table: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("tokens line {line}: {message}")]
    TokenLine { line: usize, message: String },
}
