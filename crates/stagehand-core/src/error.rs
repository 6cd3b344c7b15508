use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagehandError {
    #[error("'{file}' not found in published content (available: {})", available.join(", "))]
    TargetNotFound {
        file: String,
        available: Vec<String>,
    },

    #[error("a pending change already exists: confirm or cancel it first")]
    PendingUnresolved,

    #[error("nothing is pending")]
    NothingPending,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("invalid artifact path '{0}': must be relative and stay inside the content root")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StagehandError>;
