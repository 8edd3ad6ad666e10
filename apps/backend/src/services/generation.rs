//! Turn uploaded homework images into a persisted flashcard set.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::LlmConfig;
use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::{NewGeneration, NewInteraction, SetWithCards};
use crate::services::llm::{CompletionClient, CompletionRequest};
use crate::services::storage::ImageStore;

pub const MISSING_KEY_MESSAGE: &str =
    "OpenRouter API key not configured. Set OPENROUTER_API_KEY in .env";

/// One generation request after route-level decoding.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub image_ids: Vec<i64>,
    pub model: String,
    pub custom_instructions: Option<String>,
}

pub struct GenerationService {
    db: Arc<Database>,
    store: Arc<ImageStore>,
    client: Option<Arc<dyn CompletionClient>>,
    config: LlmConfig,
}

impl GenerationService {
    /// `client` is `None` when no provider credential is configured.
    pub fn new(
        db: Arc<Database>,
        store: Arc<ImageStore>,
        client: Option<Arc<dyn CompletionClient>>,
        config: LlmConfig,
    ) -> Self {
        Self {
            db,
            store,
            client,
            config,
        }
    }

    /// Run one generation end to end.
    ///
    /// Nothing is written unless the model reply parses; the interaction,
    /// its image links, the set and its cards then land in one transaction.
    pub async fn generate(&self, input: GenerationInput) -> Result<SetWithCards> {
        if input.image_ids.is_empty() {
            return Err(ApiError::BadRequest("imageIds is required".to_string()));
        }
        let model = input.model.trim();
        if model.is_empty() {
            return Err(ApiError::BadRequest("model is required".to_string()));
        }
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ApiError::Config(MISSING_KEY_MESSAGE.to_string()))?;

        let image_ids = dedupe(&input.image_ids);
        let custom_instructions = input
            .custom_instructions
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut image_urls = Vec::with_capacity(image_ids.len());
        for id in &image_ids {
            let image = self
                .db
                .get_image(*id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Image not found: {}", id)))?;
            let bytes = self.store.read(&image.filepath).await?;
            image_urls.push(data_uri(&image.mime_type, &bytes));
        }

        let prompt = flashcard_core::build_prompt(image_ids.len(), custom_instructions.as_deref());
        let request = CompletionRequest {
            model: model.to_string(),
            prompt: prompt.clone(),
            image_urls,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            json_mode: self.config.reply_mode == flashcard_core::ReplyMode::Strict,
        };

        let completion = client.complete(&request).await?;

        let deck = flashcard_core::parse_reply(&completion.content, self.config.reply_mode)
            .map_err(|e| {
                tracing::warn!("Unparseable reply from {}: {}", model, completion.content);
                ApiError::from(e)
            })?;

        let created = self
            .db
            .persist_generation(&NewGeneration {
                interaction: NewInteraction {
                    model: model.to_string(),
                    prompt,
                    response: completion.content,
                    tokens_used: completion.total_tokens,
                    cost: None,
                    custom_instructions,
                    image_ids,
                },
                deck,
            })
            .await?;

        tracing::info!(
            "Generated set {} with {} cards using {}",
            created.set.id,
            created.flashcards.len(),
            model
        );

        Ok(created)
    }
}

/// Keep the first occurrence of each id, preserving submission order.
fn dedupe(ids: &[i64]) -> Vec<i64> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
