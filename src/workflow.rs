use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::cancel::CancelFlag;
use crate::config::Config;
use crate::error::{LegendasError, Result};
use crate::health::HealthProbe;
use crate::inference::{InferenceService, ModelInfo, OllamaClient};
use crate::progress::ProgressSink;
use crate::store::{read_subtitle, translated_output_path, write_translated};
use crate::subtitle::SubtitleDocument;
use crate::translate::{BatchOrchestrator, RunSummary};

/// Result of translating one file
#[derive(Debug, Clone)]
pub struct TranslatedFile {
    pub output_path: PathBuf,
    pub summary: RunSummary,
}

pub struct Workflow {
    config: Config,
    probe: HealthProbe,
    orchestrator: BatchOrchestrator,
}

impl Workflow {
    /// Build a workflow talking to the ollama server named in `config`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let service = Arc::new(OllamaClient::new(&config.translate, &config.backoff)?);
        Ok(Self::with_service(config, service))
    }

    pub fn with_service(config: Config, service: Arc<dyn InferenceService>) -> Self {
        let probe = HealthProbe::new(service.clone(), config.translate.endpoint.clone());
        let orchestrator = BatchOrchestrator::new(service, &config.translate);

        Self {
            config,
            probe,
            orchestrator,
        }
    }

    /// Translate a subtitle file and write the result next to it (or to `output`).
    /// Nothing is written unless every entry was translated.
    pub async fn translate_file<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Option<&Path>,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<TranslatedFile> {
        let input_path = input_path.as_ref();
        info!("Translating subtitle file: {}", input_path.display());

        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => translated_output_path(input_path, &self.config.output.language_tag),
        };
        if output_path == input_path {
            return Err(LegendasError::Config(format!(
                "Output path {} would overwrite the input file",
                output_path.display()
            )));
        }

        let content = read_subtitle(input_path).await?;
        let mut document = SubtitleDocument::parse(&content);
        info!("Parsed {} subtitle entries", document.len());

        let summary = self.orchestrator
            .translate_document(&mut document, progress, cancel)
            .await?;

        write_translated(&output_path, &document.serialize()).await?;

        Ok(TranslatedFile {
            output_path,
            summary,
        })
    }

    /// Parse a subtitle file without translating it.
    pub async fn inspect_file<P: AsRef<Path>>(&self, input_path: P) -> Result<SubtitleDocument> {
        let content = read_subtitle(input_path).await?;
        Ok(SubtitleDocument::parse(&content))
    }

    /// Run the health probe and list installed models.
    pub async fn check_service(&self) -> Result<Vec<ModelInfo>> {
        if !self.probe.is_available().await {
            return Err(LegendasError::ServiceUnavailable(self.probe.endpoint().to_string()));
        }
        self.probe.installed_models().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
