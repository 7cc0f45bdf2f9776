//! Generative Language API types

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// A single-turn request carrying the question as one text part
    pub fn from_question(question: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::text(question)],
        }
    }
}

/// A turn: optional role plus its parts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

/// Content part; only text parts are used here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Success envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Decode the response body text.
    ///
    /// Invalid JSON is a decode failure like any other unexpected shape.
    pub fn from_body(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::Decode(format!("Invalid response body: {}", e)))
    }

    /// The answer text at `candidates[0].content.parts[0].text`
    pub fn into_text(self) -> Result<String> {
        let block_reason = self
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!(" (prompt blocked: {})", r))
            .unwrap_or_default();

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Decode(format!("Response has no candidates{}", block_reason)))?;

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        let content = candidate.content.ok_or_else(|| {
            Error::Decode(format!(
                "Candidate has no content (finish reason: {})",
                finish_reason
            ))
        })?;

        content
            .parts
            .into_iter()
            .next()
            .ok_or_else(|| Error::Decode("Candidate content has no parts".to_string()))?
            .text
            .ok_or_else(|| Error::Decode("First part has no text".to_string()))
    }
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
