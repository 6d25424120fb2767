use serde::Serialize;

use crate::error::Result;
use crate::subtitle::SubtitleEntry;

/// Request body sent to the model. Timestamps are deliberately absent.
#[derive(Debug, Serialize)]
struct BatchRequestBody<'a> {
    entries: Vec<RequestEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestEntry<'a> {
    index: u32,
    lines: &'a [String],
}

/// Builds the fixed instruction preamble followed by the JSON request body.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    preamble: String,
}

impl PromptBuilder {
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            preamble: build_preamble(source_language, target_language),
        }
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn build(&self, entries: &[&SubtitleEntry]) -> Result<String> {
        let body = BatchRequestBody {
            entries: entries
                .iter()
                .map(|entry| RequestEntry {
                    index: entry.index,
                    lines: &entry.text,
                })
                .collect(),
        };

        let json = serde_json::to_string(&body)?;
        Ok(format!("{}{}", self.preamble, json))
    }
}

fn build_preamble(source_language: &str, target_language: &str) -> String {
    format!(
        r#"[INST] Translate the subtitles from {} to {}.

Rules:
- Return ONLY a JSON object
- Translate EVERY entry
- Keep formatting markers (italics, tags, etc.) exactly as they are
- Keep the number of lines of every entry
- Keep the original indices
- Translate ONLY the text in "lines"
- Do NOT create new entries
- Do NOT drop entries
- Do NOT add extra fields

Input format:
{{
  "entries": [
    {{
      "index": number,
      "lines": string[]
    }}
  ]
}}

Output format:
{{
  "translations": [
    {{
      "index": number,
      "lines": string[]
    }}
  ]
}}

Translate: [/INST]
"#,
        source_language, target_language
    )
}
