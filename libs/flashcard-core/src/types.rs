//! Core types for flashcard generation.

use serde::{Deserialize, Serialize};

/// One question/answer pair produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub question: String,
    pub answer: String,
}

/// A validated flashcard set as produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDeck {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub flashcards: Vec<GeneratedCard>,
}

impl GeneratedDeck {
    /// Cards paired with their position, which becomes `order_index`.
    pub fn indexed_cards(&self) -> impl Iterator<Item = (i64, &GeneratedCard)> {
        self.flashcards
            .iter()
            .enumerate()
            .map(|(i, card)| (i as i64, card))
    }
}

/// Serde helpers for boolean columns that travel as `0|1` on the wire.
///
/// Serialization always emits an integer. Deserialization accepts a JSON
/// boolean or any integer, where zero is false.
pub mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }

    impl From<Raw> for bool {
        fn from(raw: Raw) -> Self {
            match raw {
                Raw::Bool(b) => b,
                Raw::Int(n) => n != 0,
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Raw::deserialize(deserializer).map(Into::into)
    }

    /// Same encoding for optional fields; use with `#[serde(default)]`.
    pub mod option {
        use super::Raw;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<bool>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(b) => serializer.serialize_some(&u8::from(*b)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<bool>, D::Error> {
            Option::<Raw>::deserialize(deserializer).map(|raw| raw.map(Into::into))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        #[serde(with = "flag")]
        flip_mode: bool,
        #[serde(default, with = "flag::option")]
        dont_know: Option<bool>,
    }

    #[test]
    fn flag_serializes_as_integer() {
        let row = Row {
            flip_mode: true,
            dont_know: Some(false),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({ "flip_mode": 1, "dont_know": 0 }));
    }

    #[test]
    fn flag_accepts_bool_or_integer() {
        let row: Row = serde_json::from_str(r#"{"flip_mode": 1, "dont_know": true}"#).unwrap();
        assert_eq!(
            row,
            Row {
                flip_mode: true,
                dont_know: Some(true)
            }
        );

        let row: Row = serde_json::from_str(r#"{"flip_mode": false}"#).unwrap();
        assert!(!row.flip_mode);
        assert_eq!(row.dont_know, None);
    }

    #[test]
    fn flag_rejects_strings() {
        let result: std::result::Result<Row, _> = serde_json::from_str(r#"{"flip_mode": "yes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn indexed_cards_follow_array_order() {
        let deck = GeneratedDeck {
            title: "Cells".to_string(),
            description: None,
            flashcards: vec![
                GeneratedCard {
                    question: "Q0".to_string(),
                    answer: "A0".to_string(),
                },
                GeneratedCard {
                    question: "Q1".to_string(),
                    answer: "A1".to_string(),
                },
            ],
        };
        let order: Vec<(i64, &str)> = deck
            .indexed_cards()
            .map(|(i, c)| (i, c.question.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "Q0"), (1, "Q1")]);
    }
}
