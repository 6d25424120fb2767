use thiserror::Error;

#[derive(Error, Debug)]
pub enum LegendasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Inference service transport error: {0}")]
    Transport(String),

    #[error("Inference service error: {0}")]
    Inference(String),

    #[error("Inference service is not available at {0}")]
    ServiceUnavailable(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Failed to translate batch {batch} after {attempts} attempts")]
    BatchTranslationFailed { batch: usize, attempts: u32 },

    #[error("Translation incomplete: {unresolved} entries are still untranslated")]
    IncompleteTranslation { unresolved: usize },

    #[error("Subtitle file contains no entries")]
    EmptyInput,

    #[error("Translation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl LegendasError {
    /// Transport-level failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, LegendasError>;
