use std::collections::HashSet;
use tracing::{debug, warn};

/// One caption block: index, timing line and text lines.
///
/// The timestamp is carried exactly as read and is never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub index: u32,
    pub timestamp: String,
    pub text: Vec<String>,
    pub translation: Option<Vec<String>>,
}

impl SubtitleEntry {
    pub fn new(index: u32, timestamp: impl Into<String>, text: Vec<String>) -> Self {
        Self {
            index,
            timestamp: timestamp.into(),
            text,
            translation: None,
        }
    }

    pub fn is_translated(&self) -> bool {
        self.translation.is_some()
    }

    /// Lines written on output: the translation when present, else the original text.
    pub fn visible_lines(&self) -> &[String] {
        self.translation.as_deref().unwrap_or(&self.text)
    }
}

/// Ordered subtitle entries of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    entries: Vec<SubtitleEntry>,
}

impl SubtitleDocument {
    /// Parse SRT text. Blocks without an integer index line or without at
    /// least one text line are skipped, as are repeated indices.
    pub fn parse(content: &str) -> Self {
        let normalized = content.replace("\r\n", "\n");
        let normalized = normalized.trim_start_matches('\u{feff}');

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut block: Vec<&str> = Vec::new();

        for line in normalized.split('\n').chain(std::iter::once("")) {
            if !line.trim().is_empty() {
                block.push(line);
                continue;
            }
            if block.is_empty() {
                continue;
            }

            match parse_block(&block) {
                Some(entry) if seen.insert(entry.index) => entries.push(entry),
                Some(entry) => warn!("Skipping subtitle block with repeated index {}", entry.index),
                None => debug!("Skipping malformed subtitle block: {:?}", block.first()),
            }
            block.clear();
        }

        Self { entries }
    }

    /// Render as SRT text. Untranslated entries fall back to their original text.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{}\n{}\n{}\n",
                    entry.index,
                    entry.timestamp,
                    entry.visible_lines().join("\n")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [SubtitleEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn untranslated_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_translated()).count()
    }
}

impl From<Vec<SubtitleEntry>> for SubtitleDocument {
    fn from(entries: Vec<SubtitleEntry>) -> Self {
        Self { entries }
    }
}

fn parse_block(lines: &[&str]) -> Option<SubtitleEntry> {
    if lines.len() < 3 {
        return None;
    }

    let index = lines[0].trim().parse::<u32>().ok()?;
    let text = lines[2..].iter().map(|l| l.to_string()).collect();

    Some(SubtitleEntry::new(index, lines[1], text))
}
