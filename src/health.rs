use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::inference::{InferenceService, ModelInfo};

/// Liveness check run before any translation work starts.
pub struct HealthProbe {
    service: Arc<dyn InferenceService>,
    endpoint: String,
}

impl HealthProbe {
    pub fn new(service: Arc<dyn InferenceService>, endpoint: impl Into<String>) -> Self {
        Self {
            service,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Never fails: any error from the service means "not available".
    pub async fn is_available(&self) -> bool {
        match self.service.list_models().await {
            Ok(_) => {
                info!("Inference service at {} is available", self.endpoint);
                true
            }
            Err(e) => {
                warn!("Inference service at {} is not available: {}", self.endpoint, e);
                false
            }
        }
    }

    pub async fn installed_models(&self) -> Result<Vec<ModelInfo>> {
        self.service.list_models().await
    }
}
