//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext backed by an in-memory database and a temporary upload directory
//! - ScriptedClient standing in for the LLM provider
//! - Helper functions for creating test data

#![allow(dead_code)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use homework_flashcards_backend::build_router;
use homework_flashcards_backend::config::LlmConfig;
use homework_flashcards_backend::db::Database;
use homework_flashcards_backend::models::*;
use homework_flashcards_backend::services::llm::{
    Completion, CompletionClient, CompletionRequest, LlmError,
};
use homework_flashcards_backend::services::storage::ImageStore;
use homework_flashcards_backend::AppState;

/// Completion client that replays a fixed reply and records every request.
pub struct ScriptedClient {
    reply: Result<String, u16>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with an API error carrying `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> CompletionRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no completion request recorded")
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(content) => Ok(Completion {
                content: content.clone(),
                total_tokens: Some(321),
            }),
            Err(status) => Err(LlmError::Api {
                status: *status,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

/// Test context containing database, upload directory and router.
pub struct TestContext {
    pub db: Arc<Database>,
    pub storage: Arc<ImageStore>,
    pub client: Option<Arc<ScriptedClient>>,
    upload_dir: TempDir,
    app: Router,
}

impl TestContext {
    /// Context whose LLM replies with a valid three-card deck.
    pub async fn new() -> Self {
        Self::with_client(Some(ScriptedClient::replying(fixtures::deck_reply(3)))).await
    }

    /// Context whose LLM replies with `reply`.
    pub async fn with_reply(reply: impl Into<String>) -> Self {
        Self::with_client(Some(ScriptedClient::replying(reply))).await
    }

    /// Context with no provider credential configured.
    pub async fn without_client() -> Self {
        Self::with_client(None).await
    }

    pub async fn with_client(client: Option<ScriptedClient>) -> Self {
        Self::with_config(client, LlmConfig::default()).await
    }

    pub async fn with_config(client: Option<ScriptedClient>, llm: LlmConfig) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to open in-memory database");

        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let client = client.map(Arc::new);
        let dyn_client = client
            .clone()
            .map(|c| c as Arc<dyn CompletionClient>);

        let state = AppState::new(db, ImageStore::new(upload_dir.path()), dyn_client, llm);
        let app = build_router(state.clone(), upload_dir.path(), 1024 * 1024);

        Self {
            db: state.db.clone(),
            storage: state.storage.clone(),
            client,
            upload_dir,
            app,
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).expect("Failed to start test server")
    }

    pub fn client(&self) -> &ScriptedClient {
        self.client.as_deref().expect("context has no client")
    }

    /// Store bytes on disk and record the image row.
    pub async fn create_image(&self, filename: &str, mime_type: &str, content: &[u8]) -> Image {
        let stored = self
            .storage
            .save(filename, content)
            .await
            .expect("Failed to store image");

        self.db
            .create_image(&NewImage {
                filename: filename.to_string(),
                filepath: stored.public_path,
                mime_type: mime_type.to_string(),
                size: content.len() as i64,
            })
            .await
            .expect("Failed to create image")
    }

    /// Record an interaction without images, for sets created outside generation.
    pub async fn create_interaction(&self, custom_instructions: Option<&str>) -> LlmInteraction {
        self.db
            .create_interaction(&NewInteraction {
                model: "test/model".to_string(),
                prompt: "prompt".to_string(),
                response: "{}".to_string(),
                tokens_used: None,
                cost: None,
                custom_instructions: custom_instructions.map(str::to_string),
                image_ids: Vec::new(),
            })
            .await
            .expect("Failed to create interaction")
    }

    /// Create a set holding `cards` in order.
    pub async fn create_set(&self, title: &str, cards: &[(&str, &str)]) -> SetWithCards {
        let interaction = self.create_interaction(None).await;
        let set = self
            .db
            .create_set(&NewFlashcardSet {
                title: title.to_string(),
                description: None,
                llm_interaction_id: interaction.id,
            })
            .await
            .expect("Failed to create set");

        let mut flashcards = Vec::new();
        for (question, answer) in cards {
            flashcards.push(
                self.db
                    .create_flashcard(set.id, question, answer)
                    .await
                    .expect("Failed to create flashcard"),
            );
        }

        SetWithCards { set, flashcards }
    }

    /// Rows in `table`, including soft-deleted ones.
    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count rows")
    }

    pub fn upload_path(&self) -> &std::path::Path {
        self.upload_dir.path()
    }
}
