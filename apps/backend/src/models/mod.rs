//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

pub use flashcard_core::types::flag;
pub use flashcard_core::{GeneratedCard, GeneratedDeck};

// === Database Entity Types ===

/// Uploaded image metadata
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: i64,
    pub filename: String,
    pub filepath: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

/// One recorded call to the LLM provider
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LlmInteraction {
    pub id: i64,
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub tokens_used: Option<i64>,
    pub cost: Option<f64>,
    pub custom_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Link between an interaction and an image, in submission order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InteractionImage {
    pub id: i64,
    pub interaction_id: i64,
    pub image_id: i64,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FlashcardSet {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub llm_interaction_id: i64,
    #[serde(with = "flag")]
    pub flip_mode: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Flashcard {
    pub id: i64,
    pub set_id: i64,
    pub question: String,
    pub answer: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Per-card "don't know" marker within a set
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudyProgress {
    pub id: i64,
    pub set_id: i64,
    pub flashcard_id: i64,
    #[serde(with = "flag")]
    pub dont_know: bool,
    pub marked_at: DateTime<Utc>,
}

// === Repository Input Types ===

#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub filepath: String,
    pub mime_type: String,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub tokens_used: Option<i64>,
    pub cost: Option<f64>,
    pub custom_instructions: Option<String>,
    /// Images in the order they were sent to the model
    pub image_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewFlashcardSet {
    pub title: String,
    pub description: Option<String>,
    pub llm_interaction_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewFlashcard {
    pub set_id: i64,
    pub question: String,
    pub answer: String,
    pub order_index: i64,
}

/// Everything one successful generation run persists.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub interaction: NewInteraction,
    pub deck: GeneratedDeck,
}

/// Partial update of a flashcard set.
///
/// `None` leaves a field untouched. For `description`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "flag::option")]
    pub flip_mode: Option<bool>,
}

impl SetPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.flip_mode.is_none()
    }
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// A set together with its visible cards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetWithCards {
    #[serde(flatten)]
    pub set: FlashcardSet,
    pub flashcards: Vec<Flashcard>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetListResponse {
    pub success: bool,
    pub sets: Vec<SetWithCards>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFlashcardRequest {
    pub set_id: Option<i64>,
    pub question: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateFlashcardRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// `imageIds` may be a list or a single id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageIds {
    One(i64),
    Many(Vec<i64>),
}

impl ImageIds {
    pub fn into_vec(self) -> Vec<i64> {
        match self {
            ImageIds::One(id) => vec![id],
            ImageIds::Many(ids) => ids,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub image_ids: Option<ImageIds>,
    /// Single-image form kept for older clients
    pub image_id: Option<i64>,
    pub model: Option<String>,
    pub custom_instructions: Option<String>,
}

impl GenerateRequest {
    pub fn ids(&self) -> Vec<i64> {
        match (&self.image_ids, self.image_id) {
            (Some(ids), _) => ids.clone().into_vec(),
            (None, Some(id)) => vec![id],
            (None, None) => Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub flashcard_set: FlashcardSet,
    pub flashcards: Vec<Flashcard>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecentInstructionsResponse {
    pub instructions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetIdQuery {
    pub set_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkProgressRequest {
    pub set_id: Option<i64>,
    pub flashcard_id: Option<i64>,
    #[serde(default, with = "flag::option")]
    pub dont_know: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressListResponse {
    pub progress: Vec<StudyProgress>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub progress: StudyProgress,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub image: Image,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub images: Vec<Image>,
}

// Study view types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StudyViewQuery {
    #[serde(default)]
    pub only_dont_know: bool,
}

/// A card as presented for study, sides already swapped for flip mode
#[derive(Debug, Serialize, Deserialize)]
pub struct StudyCard {
    pub id: i64,
    pub front: String,
    pub back: String,
    pub order_index: i64,
    #[serde(with = "flag")]
    pub dont_know: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudyViewResponse {
    pub set: FlashcardSet,
    pub cards: Vec<StudyCard>,
    pub dont_know_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_patch_distinguishes_null_from_absent() {
        let patch: SetPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert!(!patch.is_empty());

        let patch: SetPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn set_patch_accepts_numeric_flip_mode() {
        let patch: SetPatch = serde_json::from_str(r#"{"flip_mode": 1}"#).unwrap();
        assert_eq!(patch.flip_mode, Some(true));
        assert!(patch.title.is_none());
    }

    #[test]
    fn generate_request_accepts_single_or_many_ids() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"imageIds": [3, 1], "model": "m"}"#).unwrap();
        assert_eq!(req.ids(), vec![3, 1]);

        let req: GenerateRequest =
            serde_json::from_str(r#"{"imageIds": 7, "model": "m"}"#).unwrap();
        assert_eq!(req.ids(), vec![7]);

        let req: GenerateRequest = serde_json::from_str(r#"{"imageId": 9, "model": "m"}"#).unwrap();
        assert_eq!(req.ids(), vec![9]);

        let req: GenerateRequest = serde_json::from_str(r#"{"model": "m"}"#).unwrap();
        assert!(req.ids().is_empty());
    }

    #[test]
    fn mark_progress_request_accepts_boolean_flag() {
        let req: MarkProgressRequest =
            serde_json::from_str(r#"{"setId": 1, "flashcardId": 2, "dontKnow": false}"#).unwrap();
        assert_eq!(req.dont_know, Some(false));

        let req: MarkProgressRequest =
            serde_json::from_str(r#"{"setId": 1, "flashcardId": 2}"#).unwrap();
        assert_eq!(req.dont_know, None);
    }
}
