//! Legendas - Batched Subtitle Translation
//! 
//! Translates SRT subtitle files with a local ollama model, a batch of
//! entries per request, with retries and a reconciliation sweep for entries
//! the model skipped.

pub mod cli;
pub mod config;
pub mod error;
pub mod subtitle;
pub mod inference;
pub mod translate;
pub mod health;
pub mod progress;
pub mod cancel;
pub mod store;
pub mod workflow;
