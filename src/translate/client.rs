use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{LegendasError, Result};
use crate::inference::{GenerateRequest, InferenceService};
use crate::subtitle::SubtitleEntry;
use super::prompt::PromptBuilder;
use super::response::{parse_translations, TranslatedEntry, TranslationResult};

/// Sends one batch of entries to the model and reconciles partial answers.
pub struct TranslationClient {
    service: Arc<dyn InferenceService>,
    prompt: PromptBuilder,
    model: String,
    stop_sequences: Vec<String>,
    max_attempts: u32,
    base_seed: u64,
}

impl TranslationClient {
    pub fn new(service: Arc<dyn InferenceService>, config: &TranslateConfig) -> Self {
        Self {
            service,
            prompt: PromptBuilder::new(&config.source_language, &config.target_language),
            model: config.model.clone(),
            stop_sequences: config.stop_sequences.clone(),
            max_attempts: config.max_attempts.max(1),
            base_seed: config.base_seed,
        }
    }

    /// Translate `entries`, returning whatever translations could be obtained.
    ///
    /// When the model answers for fewer entries than requested, everything
    /// after the highest index it did answer is sent again as a smaller
    /// request, with a fresh attempt budget. Gaps below that index are left
    /// for the caller. Fails with `BatchTranslationFailed` when the batch, or
    /// any of its smaller follow-up requests, runs out of attempts without a
    /// parseable answer.
    pub async fn translate_batch(
        &self,
        entries: &[&SubtitleEntry],
        batch_number: usize,
    ) -> Result<TranslationResult> {
        let mut result = TranslationResult::default();
        let mut pending: Vec<&SubtitleEntry> = entries.to_vec();
        let mut attempts = 0;
        let mut requests = 0;
        // Whether the current `pending` set ever got a parseable answer.
        let mut parsed = false;

        while !pending.is_empty() && attempts < self.max_attempts {
            let seed = self.base_seed.wrapping_add(requests);
            requests += 1;

            let translations = match self.request(&pending, batch_number, seed).await {
                Ok(translations) => translations,
                Err(LegendasError::MalformedResponse(reason)) => {
                    attempts += 1;
                    warn!(
                        "Batch {}: unusable response (attempt {}/{}): {}",
                        batch_number, attempts, self.max_attempts, reason
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            parsed = true;

            let received = translations.len();
            let highest = merge_requested(&mut result, &pending, translations);

            let remaining: Vec<&SubtitleEntry> = match highest {
                Some(highest) => pending.iter().copied().filter(|e| e.index > highest).collect(),
                None => pending.clone(),
            };

            info!(
                "Batch {}: received {} translation(s) for {} entries, {} unserved",
                batch_number,
                received,
                pending.len(),
                remaining.len()
            );

            if remaining.is_empty() {
                break;
            }

            if remaining.len() < pending.len() {
                debug!(
                    "Batch {}: requesting entries {}..={} again",
                    batch_number,
                    remaining[0].index,
                    remaining[remaining.len() - 1].index
                );
                pending = remaining;
                attempts = 0;
                parsed = false;
            } else {
                attempts += 1;
                warn!(
                    "Batch {}: no usable translations (attempt {}/{})",
                    batch_number, attempts, self.max_attempts
                );
            }
        }

        if !pending.is_empty() && !parsed {
            return Err(LegendasError::BatchTranslationFailed {
                batch: batch_number,
                attempts,
            });
        }

        Ok(result)
    }

    async fn request(
        &self,
        entries: &[&SubtitleEntry],
        batch_number: usize,
        seed: u64,
    ) -> Result<Vec<TranslatedEntry>> {
        let prompt = self.prompt.build(entries)?;
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            seed,
            stop: self.stop_sequences.clone(),
        };

        let raw = self.service.generate(request).await?;
        debug!("Batch {} raw response: {}", batch_number, raw);

        if raw.trim().is_empty() {
            return Err(LegendasError::MalformedResponse(format!(
                "empty response received for batch {}",
                batch_number
            )));
        }

        parse_translations(&raw)
    }
}

/// Merge translations for requested indices only; returns the highest index accepted.
fn merge_requested(
    result: &mut TranslationResult,
    requested: &[&SubtitleEntry],
    translations: Vec<TranslatedEntry>,
) -> Option<u32> {
    let wanted: HashSet<u32> = requested.iter().map(|e| e.index).collect();
    let mut highest = None;

    for translated in translations {
        if !wanted.contains(&translated.index) {
            debug!("Ignoring translation for unrequested index {}", translated.index);
            continue;
        }
        if !is_usable(&translated.lines) {
            warn!(
                "Ignoring translation for index {}: empty or multi-line text {:?}",
                translated.index, translated.lines
            );
            continue;
        }
        if result.insert(translated.index, translated.lines) {
            highest = highest.max(Some(translated.index));
        }
    }

    highest
}

/// A translation must fit back into an SRT block: at least one line, and no
/// line that is blank or spans several lines.
fn is_usable(lines: &[String]) -> bool {
    !lines.is_empty()
        && lines
            .iter()
            .all(|line| !line.trim().is_empty() && !line.contains(['\n', '\r']))
}
