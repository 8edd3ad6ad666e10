//! Parser for the model's flashcard reply.
//!
//! # Format
//! ```json
//! {
//!   "title": "Photosynthesis",
//!   "description": "Light and dark reactions",
//!   "flashcards": [
//!     { "question": "Where does it happen?", "answer": "In the chloroplast." }
//!   ]
//! }
//! ```
//!
//! In [`ReplyMode::Strict`] the reply must be exactly one such object, optionally
//! wrapped in a single Markdown code fence.
//! [`ReplyMode::Lenient`] also accepts prose around it and takes the first
//! balanced `{...}` block that parses as JSON.

use serde_json::{Map, Value};

use crate::error::{ParseError, Result};
use crate::types::{GeneratedCard, GeneratedDeck};

/// How much surrounding noise a reply may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    #[default]
    Strict,
    Lenient,
}

/// Parse and validate a model reply.
pub fn parse_reply(reply: &str, mode: ReplyMode) -> Result<GeneratedDeck> {
    match mode {
        ReplyMode::Strict => {
            let body = strip_code_fence(reply);
            if !body.starts_with('{') {
                return Err(ParseError::NoJsonObject);
            }
            let value: Value =
                serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
            let object = value.as_object().ok_or(ParseError::NoJsonObject)?;
            validate(object)
        }
        ReplyMode::Lenient => parse_first_object(reply),
    }
}

/// Drop one surrounding Markdown code fence, with or without a language tag.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // The opening fence runs to the end of its line, language tag included.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => return trimmed,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Validate the first balanced `{...}` block that is valid JSON.
///
/// Blocks that fail to parse (set notation, template braces) are skipped.
fn parse_first_object(reply: &str) -> Result<GeneratedDeck> {
    let mut first_error = None;

    for (start, _) in reply.match_indices('{') {
        let Some(end) = balanced_end(reply, start) else {
            continue;
        };
        match serde_json::from_str::<Value>(&reply[start..end]) {
            Ok(Value::Object(object)) => return validate(&object),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(ParseError::InvalidJson(e.to_string()));
            }
        }
    }

    Err(first_error.unwrap_or(ParseError::NoJsonObject))
}

/// Find the first balanced JSON object in `text`.
///
/// Braces inside string literals (including escaped quotes) do not count.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    balanced_end(text, start).map(|end| &text[start..end])
}

/// Byte offset just past the `}` closing the brace at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn validate(object: &Map<String, Value>) -> Result<GeneratedDeck> {
    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingTitle)?;

    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from);

    let cards = object
        .get("flashcards")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingFlashcards)?;

    let flashcards = cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            let field = |name: &'static str| {
                card.get(name)
                    .and_then(Value::as_str)
                    .map(String::from)
                    .ok_or(ParseError::InvalidCard { index, field: name })
            };
            Ok(GeneratedCard {
                question: field("question")?,
                answer: field("answer")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneratedDeck {
        title: title.to_string(),
        description,
        flashcards,
    })
}
