use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelFlag;
use crate::config::TranslateConfig;
use crate::error::{LegendasError, Result};
use crate::health::HealthProbe;
use crate::inference::InferenceService;
use crate::progress::{percent, Phase, ProgressEvent, ProgressSink, RunState};
use crate::subtitle::{SubtitleDocument, SubtitleEntry};
use super::client::TranslationClient;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub entries: usize,
    pub batches: usize,
    pub sweep_groups: usize,
    pub swept_entries: usize,
}

/// Drives a whole document through the translation client, one batch at a time.
pub struct BatchOrchestrator {
    client: TranslationClient,
    probe: HealthProbe,
    batch_size: usize,
    batch_delay: Duration,
}

impl BatchOrchestrator {
    pub fn new(service: Arc<dyn InferenceService>, config: &TranslateConfig) -> Self {
        Self {
            client: TranslationClient::new(service.clone(), config),
            probe: HealthProbe::new(service, config.endpoint.clone()),
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
        }
    }

    /// Translate every entry of `document` in place.
    ///
    /// Runs `Probing -> Batching -> Sweeping -> Done`; any error ends the run
    /// in `Failed` (or `Cancelled`). On error the document may hold some
    /// translations but must not be persisted.
    pub async fn translate_document(
        &self,
        document: &mut SubtitleDocument,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<RunSummary> {
        progress.on_event(&ProgressEvent::State(RunState::Idle));

        let outcome = self.run(document, progress, cancel).await;
        let final_state = match &outcome {
            Ok(_) => RunState::Done,
            Err(e) if e.is_cancelled() => RunState::Cancelled,
            Err(_) => RunState::Failed,
        };

        if let Err(e) = &outcome {
            if e.is_cancelled() {
                info!("Translation cancelled by request");
            } else {
                error!("Translation run failed: {}", e);
            }
        }

        progress.on_event(&ProgressEvent::State(final_state));
        outcome
    }

    async fn run(
        &self,
        document: &mut SubtitleDocument,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<RunSummary> {
        if document.is_empty() {
            return Err(LegendasError::EmptyInput);
        }

        progress.on_event(&ProgressEvent::State(RunState::Probing));
        if !self.probe.is_available().await {
            return Err(LegendasError::ServiceUnavailable(self.probe.endpoint().to_string()));
        }

        progress.on_event(&ProgressEvent::State(RunState::Batching));
        let positions: Vec<usize> = (0..document.len()).collect();
        let batches: Vec<&[usize]> = positions.chunks(self.batch_size).collect();
        let total = batches.len();

        info!(
            "Translating {} entries in {} batch(es) of up to {}",
            document.len(),
            total,
            self.batch_size
        );

        for (i, batch) in batches.iter().enumerate() {
            self.process_group(document, batch, Phase::Batching, i + 1, total, progress, cancel)
                .await?;

            if i + 1 < total {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        progress.on_event(&ProgressEvent::State(RunState::Sweeping));
        let groups = self.untranslated_groups(document);
        let sweep_total = groups.len();
        let swept_entries: usize = groups.values().map(Vec::len).sum();

        if sweep_total > 0 {
            info!(
                "Sweep pass: {} untranslated entries in {} group(s)",
                swept_entries, sweep_total
            );
        }

        for (i, members) in groups.values().enumerate() {
            self.process_group(document, members, Phase::Sweeping, i + 1, sweep_total, progress, cancel)
                .await?;

            if i + 1 < sweep_total {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        let unresolved = document.untranslated_count();
        if unresolved > 0 {
            return Err(LegendasError::IncompleteTranslation { unresolved });
        }

        info!("All {} entries translated", document.len());
        Ok(RunSummary {
            entries: document.len(),
            batches: total,
            sweep_groups: sweep_total,
            swept_entries,
        })
    }

    /// Translate the entries at `positions` and write accepted translations back.
    #[allow(clippy::too_many_arguments)]
    async fn process_group(
        &self,
        document: &mut SubtitleDocument,
        positions: &[usize],
        phase: Phase,
        batch_number: usize,
        total: usize,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(LegendasError::Cancelled);
        }

        progress.on_event(&ProgressEvent::Batch {
            phase,
            batch: batch_number,
            total,
        });
        info!("{:?}: batch {} ({} entries)", phase, batch_number, positions.len());

        let mut result = {
            let entries: Vec<&SubtitleEntry> = positions
                .iter()
                .map(|&pos| &document.entries()[pos])
                .collect();
            self.client.translate_batch(&entries, batch_number).await?
        };

        let mut written = 0;
        for &pos in positions {
            let entry = &mut document.entries_mut()[pos];
            if let Some(lines) = result.remove(entry.index) {
                if lines.len() != entry.text.len() {
                    debug!(
                        "Entry {}: {} line(s) translated into {}",
                        entry.index,
                        entry.text.len(),
                        lines.len()
                    );
                }
                entry.translation = Some(lines);
                written += 1;
            }
        }

        if written < positions.len() {
            warn!(
                "{:?}: batch {} left {} entries untranslated",
                phase,
                batch_number,
                positions.len() - written
            );
        }

        let translated = document.len() - document.untranslated_count();
        progress.on_event(&ProgressEvent::Progress {
            translated,
            total: document.len(),
            percent: percent(translated, document.len()),
        });

        Ok(())
    }

    /// Untranslated entries grouped by the batch their index falls into.
    fn untranslated_groups(&self, document: &SubtitleDocument) -> BTreeMap<usize, Vec<usize>> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (pos, entry) in document.entries().iter().enumerate() {
            if !entry.is_translated() {
                let group = entry.index.saturating_sub(1) as usize / self.batch_size;
                groups.entry(group).or_default().push(pos);
            }
        }
        groups
    }
}
