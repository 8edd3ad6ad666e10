//! Core flashcard library shared by the backend service and its tests.
//!
//! Provides:
//! - Prompt construction for flashcard generation
//! - Parser for the model's JSON reply
//! - Display helpers for flip mode
//! - Shared types (GeneratedDeck, GeneratedCard, wire flags)

pub mod display;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod types;

pub use display::{sides, Sides};
pub use error::{ParseError, Result};
pub use parser::{extract_json_object, parse_reply, ReplyMode};
pub use prompt::build_prompt;
pub use types::{GeneratedCard, GeneratedDeck};
