use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Remote transport errors
///
/// `Timeout`, `Network`, `Http` and `InvalidResponse` describe a single
/// attempt. Callers of `TransportClient::request` only ever see `Exhausted`
/// (all attempts failed); `Client` and `Encode` fail before any attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{message}")]
    Exhausted { message: String, attempts: u32 },

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    /// Number of attempts made before giving up, if this is a final failure.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            TransportError::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
