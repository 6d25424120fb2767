// Batched subtitle translation
//
// - Prompt: instruction preamble plus the `{index, lines}` request body
// - Response: reasoning/fence stripping and JSON parsing of model output
// - Client: one batch per call, re-requesting the unserved tail
// - Orchestrator: sequential batches, sweep pass, final completeness check

pub mod client;
pub mod orchestrator;
pub mod prompt;
pub mod response;

pub use client::TranslationClient;
pub use orchestrator::{BatchOrchestrator, RunSummary};
pub use prompt::PromptBuilder;
pub use response::{parse_translations, sanitize, TranslatedEntry, TranslationResult};
