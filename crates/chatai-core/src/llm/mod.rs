//! Answer service and the Generative Language API client

mod client;
mod types;

pub use client::GeminiClient;
pub use types::*;

use async_trait::async_trait;

use crate::Result;

/// Something that turns a question into a markdown answer.
///
/// Implementations report transport problems, non-2xx responses and
/// unexpected envelopes as errors; callers decide what to show instead.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String>;
}
