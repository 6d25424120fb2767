use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{BackoffConfig, TranslateConfig};
use crate::error::{LegendasError, Result};
use super::{retry_with_backoff, BackoffPolicy, GenerateRequest, InferenceService, ModelInfo};

/// Ollama HTTP client
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    backoff: BackoffPolicy,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions<'a>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions<'a> {
    seed: u64,
    stop: &'a [String],
}

/// One line of the newline-delimited generate stream
#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    pub fn new(config: &TranslateConfig, backoff: &BackoffConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            backoff: BackoffPolicy::from(backoff),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn generate_once(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = OllamaGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: true,
            options: OllamaOptions {
                seed: request.seed,
                stop: &request.stop,
            },
        };

        debug!("Sending generate request to {} (seed {})", url, request.seed);

        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LegendasError::Transport(format!("HTTP request failed: {}", e)))?;
        let response = check_status(response).await?;

        let mut stream = response.bytes_stream();
        let mut accumulator = StreamAccumulator::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| LegendasError::Transport(format!("Generate stream interrupted: {}", e)))?;
            accumulator.push(&chunk)?;
            if accumulator.is_done() {
                break;
            }
        }

        accumulator.finish()
    }

    async fn list_models_once(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.endpoint);

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| LegendasError::Transport(format!("Failed to connect to ollama: {}", e)))?;
        let response = check_status(response).await?;

        let tags: OllamaTagsResponse = response.json().await
            .map_err(|e| LegendasError::Inference(format!("Failed to parse model list: {}", e)))?;

        Ok(tags.models)
    }
}

#[async_trait]
impl InferenceService for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        retry_with_backoff(&self.backoff, "generate", || self.generate_once(&request)).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self.list_models_once().await?;
        info!("ollama at {} reports {} installed model(s)", self.endpoint, models.len());
        Ok(models)
    }
}

/// Server errors are transient, everything else is reported as is.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = format!("ollama API error {}: {}", status, error_text);
    if status.is_server_error() {
        Err(LegendasError::Transport(message))
    } else {
        Err(LegendasError::Inference(message))
    }
}

/// Concatenates the `response` field of each streamed JSON line.
#[derive(Debug, Default)]
struct StreamAccumulator {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamAccumulator {
    fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.consume_line(&line)?;
        }
        Ok(())
    }

    fn consume_line(&mut self, line: &[u8]) -> Result<()> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let chunk: OllamaStreamChunk = serde_json::from_str(line)
            .map_err(|e| LegendasError::Inference(format!("Invalid generate stream chunk: {}", e)))?;

        if let Some(error) = chunk.error {
            return Err(LegendasError::Inference(error));
        }

        self.text.push_str(&chunk.response);
        self.done |= chunk.done;
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn finish(mut self) -> Result<String> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.consume_line(&rest)?;
        }

        if !self.done {
            return Err(LegendasError::Transport(
                "Generate stream ended before completion".to_string(),
            ));
        }
        Ok(self.text)
    }
}
