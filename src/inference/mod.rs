// Inference service abstraction
//
// The pipeline only talks to the language model through `InferenceService`:
// - OllamaClient: streamed generation against a local ollama server
// - Backoff: retry helper for transport failures
//
// Tests substitute the trait with `MockInferenceService` or a hand-written stub.

pub mod backoff;
pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use backoff::{retry_with_backoff, BackoffPolicy};
pub use ollama::OllamaClient;
use crate::error::Result;

/// A single text generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub seed: u64,
    pub stop: Vec<String>,
}

/// Installed model as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Run a generation and return the complete output text.
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// List installed models. Used as the liveness check.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}
