use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{LegendasError, Result};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// One translated entry as returned by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedEntry {
    pub index: u32,
    pub lines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    #[serde(default)]
    translations: Option<Vec<TranslatedEntry>>,
}

/// Translations keyed by entry index. An index is only ever stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationResult {
    translations: BTreeMap<u32, Vec<String>>,
}

impl TranslationResult {
    /// Store a translation unless the index already has one.
    pub fn insert(&mut self, index: u32, lines: Vec<String>) -> bool {
        if self.translations.contains_key(&index) {
            return false;
        }
        self.translations.insert(index, lines);
        true
    }

    pub fn get(&self, index: u32) -> Option<&[String]> {
        self.translations.get(&index).map(Vec::as_slice)
    }

    pub fn remove(&mut self, index: u32) -> Option<Vec<String>> {
        self.translations.remove(&index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.translations.contains_key(&index)
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.translations.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// Strip reasoning regions and pull the JSON out of a fenced block if there is one.
pub fn sanitize(raw: &str) -> String {
    let without_thinking = strip_thinking(raw);
    let trimmed = without_thinking.trim();

    match extract_fenced_block(trimmed) {
        Some(block) => block.to_string(),
        None => trimmed.to_string(),
    }
}

/// Parse sanitized model output. Anything that is not the expected JSON
/// object is reported as `MalformedResponse`.
pub fn parse_translations(raw: &str) -> Result<Vec<TranslatedEntry>> {
    let content = sanitize(raw);
    if content.is_empty() {
        return Err(LegendasError::MalformedResponse("empty response".to_string()));
    }

    let response: TranslationResponse = serde_json::from_str(&content)
        .map_err(|e| LegendasError::MalformedResponse(e.to_string()))?;

    Ok(response.translations.unwrap_or_default())
}

fn strip_thinking(raw: &str) -> String {
    let mut text = raw.to_string();

    while let Some(start) = text.find(THINK_OPEN) {
        match text[start..].find(THINK_CLOSE) {
            Some(offset) => {
                text.replace_range(start..start + offset + THINK_CLOSE.len(), "");
            }
            None => break,
        }
    }

    // Some templates open the reasoning block in the prompt, so only the
    // closing tag shows up in the output.
    if !text.contains(THINK_OPEN) {
        if let Some(end) = text.find(THINK_CLOSE) {
            text.replace_range(..end + THINK_CLOSE.len(), "");
        }
    }

    text
}

fn extract_fenced_block(text: &str) -> Option<&str> {
    let (start, marker) = match text.find("```json") {
        Some(pos) => (pos, "```json".len()),
        None => (text.find("```")?, "```".len()),
    };

    let body = &text[start + marker..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}
