use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown return reason: {0}")]
    UnknownReason(String),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("No rule set for reason '{reason}' in category '{category}'")]
    UnmappedReason { category: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Empty query")]
    EmptyQuery,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
