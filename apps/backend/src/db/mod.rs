//! SQLite database operations

pub mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    /// Set when `llm_interactions` still carries the first revision's `image_id NOT NULL`.
    legacy_image_column: Arc<AtomicBool>,
}

impl Database {
    /// Connect to a SQLite database URL, creating the file if necessary
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?;
        if let Some(parent) = options.get_filename().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::connect_with(options, 5).await
    }

    /// Open a database file at `path`, creating parent directories as needed
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new().filename(path);
        Self::connect_with(options, 5).await
    }

    /// Open a migrated in-memory database (for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single long-lived connection keeps the memory database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options.foreign_keys(true))
            .await?;

        let db = Self {
            pool,
            legacy_image_column: Arc::new(AtomicBool::new(false)),
        };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn connect_with(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let options = options
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            legacy_image_column: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === Schema Migration ===

    /// Create missing tables, then add missing columns.
    ///
    /// Individual failures are logged and skipped; a required table that is
    /// still absent afterwards is fatal.
    pub async fn run_migrations(&self) -> Result<()> {
        for statement in schema::TABLES {
            if let Err(e) = sqlx::query(statement).execute(&self.pool).await {
                tracing::warn!("Table creation failed: {}", e);
            }
        }

        let existing = self.table_names().await?;
        let missing: Vec<&str> = schema::REQUIRED_TABLES
            .iter()
            .copied()
            .filter(|t| !existing.iter().any(|e| e == t))
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::Migration(format!(
                "required tables missing: {}",
                missing.join(", ")
            )));
        }

        for statement in schema::INDEXES {
            if let Err(e) = sqlx::query(statement).execute(&self.pool).await {
                tracing::warn!("Index creation failed: {}", e);
            }
        }

        for migration in schema::COLUMN_MIGRATIONS {
            let columns = self.column_names(migration.table).await?;
            if columns.iter().any(|c| c == migration.column) {
                continue;
            }

            match sqlx::query(&migration.alter_statement())
                .execute(&self.pool)
                .await
            {
                Ok(_) => tracing::info!(
                    "Added column {}.{}",
                    migration.table,
                    migration.column
                ),
                Err(e) => tracing::warn!(
                    "Could not add column {}.{}: {}",
                    migration.table,
                    migration.column,
                    e
                ),
            }
        }

        for statement in schema::LATE_INDEXES {
            if let Err(e) = sqlx::query(statement).execute(&self.pool).await {
                tracing::warn!("Index creation failed: {}", e);
            }
        }

        let (table, column) = schema::LEGACY_IMAGE_COLUMN;
        let legacy = self.column_names(table).await?.iter().any(|c| c == column);
        if legacy {
            tracing::info!("Legacy {}.{} column detected", table, column);
        }
        self.legacy_image_column.store(legacy, Ordering::Relaxed);

        Ok(())
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table'",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Column names of `table`, via `PRAGMA table_info`
    pub async fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?1)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }

    // === Image Repository ===

    /// Record an uploaded image
    pub async fn create_image(&self, image: &NewImage) -> Result<Image> {
        let image = sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (filename, filepath, mime_type, size, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, filename, filepath, mime_type, size, created_at
            "#,
        )
        .bind(&image.filename)
        .bind(&image.filepath)
        .bind(&image.mime_type)
        .bind(image.size)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(image)
    }

    /// Get image by ID
    pub async fn get_image(&self, id: i64) -> Result<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(
            r#"
            SELECT id, filename, filepath, mime_type, size, created_at
            FROM images
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    /// All images, newest first
    pub async fn list_images(&self) -> Result<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT id, filename, filepath, mime_type, size, created_at
            FROM images
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    // === LLM Interaction Repository ===

    /// Record an interaction and its image links in one transaction
    pub async fn create_interaction(&self, interaction: &NewInteraction) -> Result<LlmInteraction> {
        let mut tx = self.pool.begin().await?;
        let created = self.insert_interaction(&mut tx, interaction).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn insert_interaction(
        &self,
        conn: &mut SqliteConnection,
        interaction: &NewInteraction,
    ) -> Result<LlmInteraction> {
        let legacy = self.legacy_image_column.load(Ordering::Relaxed);
        let sql = if legacy {
            r#"
            INSERT INTO llm_interactions (model, prompt, response, tokens_used, cost,
                                          custom_instructions, created_at, image_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id, model, prompt, response, tokens_used, cost, custom_instructions, created_at
            "#
        } else {
            r#"
            INSERT INTO llm_interactions (model, prompt, response, tokens_used, cost,
                                          custom_instructions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, model, prompt, response, tokens_used, cost, custom_instructions, created_at
            "#
        };

        let mut query = sqlx::query_as::<_, LlmInteraction>(sql)
            .bind(&interaction.model)
            .bind(&interaction.prompt)
            .bind(&interaction.response)
            .bind(interaction.tokens_used)
            .bind(interaction.cost)
            .bind(&interaction.custom_instructions)
            .bind(Utc::now());
        if legacy {
            query = query.bind(interaction.image_ids.first().copied());
        }
        let created = query.fetch_one(&mut *conn).await?;

        for (order_index, image_id) in interaction.image_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO interaction_images (interaction_id, image_id, order_index)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(created.id)
            .bind(image_id)
            .bind(order_index as i64)
            .execute(&mut *conn)
            .await?;
        }

        Ok(created)
    }

    /// Get interaction by ID
    pub async fn get_interaction(&self, id: i64) -> Result<Option<LlmInteraction>> {
        let interaction = sqlx::query_as::<_, LlmInteraction>(
            r#"
            SELECT id, model, prompt, response, tokens_used, cost, custom_instructions, created_at
            FROM llm_interactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(interaction)
    }

    /// Image links of an interaction, in submission order
    pub async fn get_interaction_links(&self, interaction_id: i64) -> Result<Vec<InteractionImage>> {
        let links = sqlx::query_as::<_, InteractionImage>(
            r#"
            SELECT id, interaction_id, image_id, order_index
            FROM interaction_images
            WHERE interaction_id = ?1
            ORDER BY order_index
            "#,
        )
        .bind(interaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    /// Images sent in an interaction, in submission order
    pub async fn get_interaction_images(&self, interaction_id: i64) -> Result<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT i.id, i.filename, i.filepath, i.mime_type, i.size, i.created_at
            FROM images i
            JOIN interaction_images ii ON ii.image_id = i.id
            WHERE ii.interaction_id = ?1
            ORDER BY ii.order_index
            "#,
        )
        .bind(interaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Interactions that included an image, newest first
    pub async fn get_interactions_by_image(&self, image_id: i64) -> Result<Vec<LlmInteraction>> {
        let interactions = sqlx::query_as::<_, LlmInteraction>(
            r#"
            SELECT l.id, l.model, l.prompt, l.response, l.tokens_used, l.cost,
                   l.custom_instructions, l.created_at
            FROM llm_interactions l
            JOIN interaction_images ii ON ii.interaction_id = l.id
            WHERE ii.image_id = ?1
            ORDER BY l.created_at DESC, l.id DESC
            "#,
        )
        .bind(image_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(interactions)
    }

    /// Distinct non-blank custom instructions, most recently used first
    pub async fn get_recent_custom_instructions(&self, limit: i64) -> Result<Vec<String>> {
        let instructions = sqlx::query_scalar::<_, String>(
            r#"
            SELECT custom_instructions
            FROM llm_interactions
            WHERE custom_instructions IS NOT NULL AND TRIM(custom_instructions) != ''
            GROUP BY custom_instructions
            ORDER BY MAX(created_at) DESC, MAX(id) DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(instructions)
    }

    // === Flashcard Set Repository ===

    /// Create a set
    pub async fn create_set(&self, set: &NewFlashcardSet) -> Result<FlashcardSet> {
        let created = Self::insert_set(&mut *self.pool.acquire().await?, set).await?;
        Ok(created)
    }

    async fn insert_set(conn: &mut SqliteConnection, set: &NewFlashcardSet) -> Result<FlashcardSet> {
        let created = sqlx::query_as::<_, FlashcardSet>(
            r#"
            INSERT INTO flashcard_sets (title, description, llm_interaction_id, flip_mode, created_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            RETURNING id, title, description, llm_interaction_id, flip_mode, created_at
            "#,
        )
        .bind(&set.title)
        .bind(&set.description)
        .bind(set.llm_interaction_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    /// Get set by ID
    pub async fn get_set(&self, id: i64) -> Result<Option<FlashcardSet>> {
        let set = sqlx::query_as::<_, FlashcardSet>(
            r#"
            SELECT id, title, description, llm_interaction_id, flip_mode, created_at
            FROM flashcard_sets
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(set)
    }

    /// All sets, newest first
    pub async fn list_sets(&self) -> Result<Vec<FlashcardSet>> {
        let sets = sqlx::query_as::<_, FlashcardSet>(
            r#"
            SELECT id, title, description, llm_interaction_id, flip_mode, created_at
            FROM flashcard_sets
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sets)
    }

    /// All sets with their visible cards, newest set first
    pub async fn list_sets_with_cards(&self) -> Result<Vec<SetWithCards>> {
        let sets = self.list_sets().await?;

        let cards = sqlx::query_as::<_, Flashcard>(
            r#"
            SELECT id, set_id, question, answer, order_index, created_at, deleted_at
            FROM flashcards
            WHERE deleted_at IS NULL
            ORDER BY set_id, order_index, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_set: HashMap<i64, Vec<Flashcard>> = HashMap::new();
        for card in cards {
            by_set.entry(card.set_id).or_default().push(card);
        }

        Ok(sets
            .into_iter()
            .map(|set| SetWithCards {
                flashcards: by_set.remove(&set.id).unwrap_or_default(),
                set,
            })
            .collect())
    }

    /// Apply a partial update; fields absent from the patch keep their value
    pub async fn update_set(&self, id: i64, patch: &SetPatch) -> Result<Option<FlashcardSet>> {
        let (set_description, description) = match &patch.description {
            Some(value) => (true, value.clone()),
            None => (false, None),
        };

        let set = sqlx::query_as::<_, FlashcardSet>(
            r#"
            UPDATE flashcard_sets
            SET title = COALESCE(?1, title),
                description = CASE WHEN ?2 THEN ?3 ELSE description END,
                flip_mode = COALESCE(?4, flip_mode)
            WHERE id = ?5
            RETURNING id, title, description, llm_interaction_id, flip_mode, created_at
            "#,
        )
        .bind(&patch.title)
        .bind(set_description)
        .bind(description)
        .bind(patch.flip_mode)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(set)
    }

    /// Hard delete; cards and study progress go with it via cascade
    pub async fn delete_set(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM flashcard_sets WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Flashcard Repository ===

    /// Append a card after the set's visible cards
    pub async fn create_flashcard(&self, set_id: i64, question: &str, answer: &str) -> Result<Flashcard> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM flashcard_sets WHERE id = ?1")
            .bind(set_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound(format!("Flashcard set {}", set_id)));
        }

        // Next slot after the highest visible index; equals the visible count when there are no gaps.
        let order_index: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(order_index) + 1, 0)
            FROM flashcards
            WHERE set_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(set_id)
        .fetch_one(&mut *tx)
        .await?;

        let card = Self::insert_flashcard(
            &mut tx,
            &NewFlashcard {
                set_id,
                question: question.to_string(),
                answer: answer.to_string(),
                order_index,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(card)
    }

    async fn insert_flashcard(conn: &mut SqliteConnection, card: &NewFlashcard) -> Result<Flashcard> {
        let created = sqlx::query_as::<_, Flashcard>(
            r#"
            INSERT INTO flashcards (set_id, question, answer, order_index, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, set_id, question, answer, order_index, created_at, deleted_at
            "#,
        )
        .bind(card.set_id)
        .bind(&card.question)
        .bind(&card.answer)
        .bind(card.order_index)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    /// Insert all cards or none
    pub async fn bulk_create_flashcards(&self, cards: &[NewFlashcard]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let created = Self::insert_flashcards(&mut tx, cards).await?;
        tx.commit().await?;

        Ok(created.len())
    }

    async fn insert_flashcards(conn: &mut SqliteConnection, cards: &[NewFlashcard]) -> Result<Vec<Flashcard>> {
        let mut created = Vec::with_capacity(cards.len());
        for card in cards {
            created.push(Self::insert_flashcard(&mut *conn, card).await?);
        }

        Ok(created)
    }

    /// Get a visible card by ID
    pub async fn get_flashcard(&self, id: i64) -> Result<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(
            r#"
            SELECT id, set_id, question, answer, order_index, created_at, deleted_at
            FROM flashcards
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Visible cards of a set, ascending by `order_index`
    pub async fn get_flashcards_by_set(&self, set_id: i64) -> Result<Vec<Flashcard>> {
        let cards = sqlx::query_as::<_, Flashcard>(
            r#"
            SELECT id, set_id, question, answer, order_index, created_at, deleted_at
            FROM flashcards
            WHERE set_id = ?1 AND deleted_at IS NULL
            ORDER BY order_index, id
            "#,
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    /// Replace question and answer of a visible card
    pub async fn update_flashcard(&self, id: i64, question: &str, answer: &str) -> Result<Option<Flashcard>> {
        let card = sqlx::query_as::<_, Flashcard>(
            r#"
            UPDATE flashcards
            SET question = ?1, answer = ?2
            WHERE id = ?3 AND deleted_at IS NULL
            RETURNING id, set_id, question, answer, order_index, created_at, deleted_at
            "#,
        )
        .bind(question)
        .bind(answer)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Soft delete; study progress rows are kept
    pub async fn delete_flashcard(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE flashcards
            SET deleted_at = ?1
            WHERE id = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Generation ===

    /// Persist interaction, links, set and cards as one transaction
    pub async fn persist_generation(&self, generation: &NewGeneration) -> Result<SetWithCards> {
        let mut tx = self.pool.begin().await?;

        let interaction = self.insert_interaction(&mut tx, &generation.interaction).await?;

        let set = Self::insert_set(
            &mut tx,
            &NewFlashcardSet {
                title: generation.deck.title.clone(),
                description: generation.deck.description.clone(),
                llm_interaction_id: interaction.id,
            },
        )
        .await?;

        let cards: Vec<NewFlashcard> = generation
            .deck
            .indexed_cards()
            .map(|(order_index, card)| NewFlashcard {
                set_id: set.id,
                question: card.question.clone(),
                answer: card.answer.clone(),
                order_index,
            })
            .collect();
        let flashcards = Self::insert_flashcards(&mut tx, &cards).await?;

        tx.commit().await?;
        Ok(SetWithCards { set, flashcards })
    }

    // === Study Progress Repository ===

    /// All progress rows of a set
    pub async fn get_progress_by_set(&self, set_id: i64) -> Result<Vec<StudyProgress>> {
        let progress = sqlx::query_as::<_, StudyProgress>(
            r#"
            SELECT id, set_id, flashcard_id, dont_know, marked_at
            FROM study_progress
            WHERE set_id = ?1
            ORDER BY flashcard_id
            "#,
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Upsert the marker for one card, overwriting flag and timestamp in place.
    ///
    /// The card must be a visible card of `set_id`.
    pub async fn mark_dont_know(&self, set_id: i64, flashcard_id: i64, dont_know: bool) -> Result<StudyProgress> {
        let belongs: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM flashcards WHERE id = ?1 AND set_id = ?2 AND deleted_at IS NULL",
        )
        .bind(flashcard_id)
        .bind(set_id)
        .fetch_optional(&self.pool)
        .await?;
        if belongs.is_none() {
            return Err(ApiError::NotFound(format!(
                "Flashcard {} in set {}",
                flashcard_id, set_id
            )));
        }

        let progress = sqlx::query_as::<_, StudyProgress>(
            r#"
            INSERT INTO study_progress (set_id, flashcard_id, dont_know, marked_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (set_id, flashcard_id) DO UPDATE SET
                dont_know = excluded.dont_know,
                marked_at = excluded.marked_at
            RETURNING id, set_id, flashcard_id, dont_know, marked_at
            "#,
        )
        .bind(set_id)
        .bind(flashcard_id)
        .bind(dont_know)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Remove every progress row of a set
    pub async fn reset_progress(&self, set_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM study_progress WHERE set_id = ?1")
            .bind(set_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
