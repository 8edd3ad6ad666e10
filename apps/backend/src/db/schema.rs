//! SQLite schema definitions.

/// Tables the service cannot run without.
pub const REQUIRED_TABLES: &[&str] = &[
    "images",
    "llm_interactions",
    "interaction_images",
    "flashcard_sets",
    "flashcards",
    "study_progress",
];

/// Table definitions, applied one statement at a time.
pub const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS images (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        filepath TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        size INTEGER NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS llm_interactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        model TEXT NOT NULL,
        prompt TEXT NOT NULL,
        response TEXT NOT NULL,
        tokens_used INTEGER,
        cost REAL,
        custom_instructions TEXT,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS interaction_images (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        interaction_id INTEGER NOT NULL REFERENCES llm_interactions(id) ON DELETE CASCADE,
        image_id INTEGER NOT NULL REFERENCES images(id) ON DELETE CASCADE,
        order_index INTEGER NOT NULL,
        UNIQUE (interaction_id, image_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS flashcard_sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        llm_interaction_id INTEGER NOT NULL REFERENCES llm_interactions(id) ON DELETE CASCADE,
        flip_mode INTEGER NOT NULL DEFAULT 0,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS flashcards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        set_id INTEGER NOT NULL REFERENCES flashcard_sets(id) ON DELETE CASCADE,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        order_index INTEGER NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        deleted_at DATETIME
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS study_progress (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        set_id INTEGER NOT NULL REFERENCES flashcard_sets(id) ON DELETE CASCADE,
        flashcard_id INTEGER NOT NULL REFERENCES flashcards(id) ON DELETE CASCADE,
        dont_know INTEGER NOT NULL DEFAULT 0,
        marked_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (set_id, flashcard_id)
    )
    "#,
];

/// Indexes over columns present since the first schema revision.
pub const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_interaction_images_interaction ON interaction_images(interaction_id)",
    "CREATE INDEX IF NOT EXISTS idx_interaction_images_image ON interaction_images(image_id)",
    "CREATE INDEX IF NOT EXISTS idx_flashcard_sets_llm_interaction_id ON flashcard_sets(llm_interaction_id)",
    "CREATE INDEX IF NOT EXISTS idx_flashcards_set_id ON flashcards(set_id, order_index)",
    "CREATE INDEX IF NOT EXISTS idx_study_progress_set_id ON study_progress(set_id)",
];

/// A column added after a table was first shipped.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMigration {
    pub table: &'static str,
    pub column: &'static str,
    pub definition: &'static str,
}

impl ColumnMigration {
    pub fn alter_statement(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.table, self.column, self.definition
        )
    }
}

/// Additive column migrations, applied when the column check finds it missing.
pub const COLUMN_MIGRATIONS: &[ColumnMigration] = &[
    ColumnMigration {
        table: "flashcard_sets",
        column: "flip_mode",
        definition: "INTEGER NOT NULL DEFAULT 0",
    },
    ColumnMigration {
        table: "flashcards",
        column: "deleted_at",
        definition: "DATETIME",
    },
    ColumnMigration {
        table: "llm_interactions",
        column: "custom_instructions",
        definition: "TEXT",
    },
];

/// Indexes over migrated columns; created after the column migrations ran.
pub const LATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_flashcards_deleted ON flashcards(deleted_at)",
];

/// Column from the first revision, when each interaction had exactly one image.
pub const LEGACY_IMAGE_COLUMN: (&str, &str) = ("llm_interactions", "image_id");
