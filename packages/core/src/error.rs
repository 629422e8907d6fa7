use thiserror::Error;

/// Unified application error.
///
/// Every layer (config, storage, parsing, lookups) fails through this type so
/// the binary can report a single message and exit code.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} with name '{key}' already exists")]
    Duplicate { kind: &'static str, key: String },

    #[error("Invalid date '{input}' (expected YYYY-MM-DD): {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound { kind, key: key.into() }
    }

    pub fn duplicate(kind: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate { kind, key: key.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// `true` for lookups that missed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Map a database error to `Duplicate` when it is a unique-constraint
    /// violation, otherwise wrap it unchanged.
    pub fn from_insert(err: sqlx::Error, kind: &'static str, key: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::duplicate(kind, key);
            }
        }
        Self::Database(err)
    }
}
