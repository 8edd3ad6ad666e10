pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LlmConfig};
use crate::db::Database;
use crate::services::generation::GenerationService;
use crate::services::llm::{CompletionClient, OpenRouterClient};
use crate::services::storage::ImageStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub storage: Arc<ImageStore>,
    pub generator: Arc<GenerationService>,
}

impl AppState {
    /// Wire the services together. `client` is `None` without a provider key.
    pub fn new(
        db: Database,
        storage: ImageStore,
        client: Option<Arc<dyn CompletionClient>>,
        llm: LlmConfig,
    ) -> Self {
        let db = Arc::new(db);
        let storage = Arc::new(storage);
        let generator = Arc::new(GenerationService::new(
            db.clone(),
            storage.clone(),
            client,
            llm,
        ));

        Self {
            db,
            storage,
            generator,
        }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        // Flashcard set routes
        .route(
            "/flashcard-sets",
            get(routes::sets::list).delete(routes::sets::delete),
        )
        .route(
            "/flashcard-sets/:id",
            get(routes::sets::get).patch(routes::sets::update),
        )
        .route("/flashcard-sets/:id/study", get(routes::study::view))
        // Flashcard routes
        .route("/flashcards", post(routes::flashcards::create))
        .route(
            "/flashcards/:id",
            patch(routes::flashcards::update).delete(routes::flashcards::delete),
        )
        // Generation routes
        .route("/generate-flashcards", post(routes::generate::generate))
        .route("/recent-instructions", get(routes::instructions::recent))
        // Study progress routes
        .route(
            "/study-progress",
            get(routes::study::progress)
                .post(routes::study::mark)
                .delete(routes::study::reset),
        )
        // Image routes
        .route("/upload", post(routes::upload::upload))
        .route("/images", get(routes::images::list))
}

/// Build the full router, served both at the root and under `/api`.
pub fn build_router(state: AppState, upload_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(api_routes())
        .nest("/api", api_routes())
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let storage = ImageStore::new(&config.upload_dir);
    storage.ensure_dir().await?;

    let client = match &config.llm.api_key {
        Some(key) => {
            let client = OpenRouterClient::new(&config.llm, key.clone())?;
            Some(Arc::new(client) as Arc<dyn CompletionClient>)
        }
        None => {
            tracing::warn!("OPENROUTER_API_KEY is not set; flashcard generation is disabled");
            None
        }
    };

    let state = AppState::new(db.clone(), storage, client, config.llm.clone());
    let app = build_router(state, &config.upload_dir, config.max_upload_bytes);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
