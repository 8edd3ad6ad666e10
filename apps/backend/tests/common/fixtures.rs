//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};

/// Minimal PNG header; enough for anything that only checks bytes round-trip.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F'];

/// A model reply holding `num_cards` cards.
pub fn deck_reply(num_cards: usize) -> String {
    deck_json("Photosynthesis", num_cards).to_string()
}

pub fn deck_json(title: &str, num_cards: usize) -> Value {
    let cards: Vec<Value> = (0..num_cards)
        .map(|i| {
            json!({
                "question": format!("Question {}?", i + 1),
                "answer": format!("Answer {}.", i + 1),
            })
        })
        .collect();

    json!({
        "title": title,
        "description": "Generated from homework",
        "flashcards": cards,
    })
}

/// Body for POST /generate-flashcards.
pub fn generate_request(image_ids: &[i64], model: &str, instructions: Option<&str>) -> Value {
    let mut body = json!({
        "imageIds": image_ids,
        "model": model,
    });
    if let Some(text) = instructions {
        body["customInstructions"] = json!(text);
    }
    body
}
