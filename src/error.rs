//! Error types for the survey funnel.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Enrichment error: {0}")]
    Enrich(#[from] EnrichError),
}

/// Configuration-related errors.
///
/// Every variable has a default or an optional fallback; only a
/// malformed value is an error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Shorthand for a missing session row.
    pub fn session_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "session".to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Validation errors from the question flow.
///
/// These block advancement only; they are never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Question {0} has no sufficient answer")]
    InsufficientAnswer(String),

    #[error("Invalid email address for question {question}: {message}")]
    InvalidEmail { question: String, message: String },

    #[error("Already at the first question")]
    AtStart,

    #[error("Survey is already complete")]
    AlreadyComplete,
}

/// Result-enrichment errors (narrative / certificate collaborators).
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("Narrative provider request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from narrative provider: {0}")]
    InvalidResponse(String),

    #[error("Certificate renderer not configured: {0}")]
    RendererUnavailable(String),

    #[error("Session is not completed yet")]
    NotCompleted,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for EnrichError {
    fn from(e: reqwest::Error) -> Self {
        Self::RequestFailed(e.to_string())
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
