//! Error types for flashcard-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while reading a model reply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no JSON object found in model reply")]
    NoJsonObject,

    #[error("invalid JSON in model reply: {0}")]
    InvalidJson(String),

    #[error("model reply has no non-empty \"title\"")]
    MissingTitle,

    #[error("model reply has no \"flashcards\" array")]
    MissingFlashcards,

    #[error("flashcard {index} has no \"{field}\" string")]
    InvalidCard { index: usize, field: &'static str },
}
