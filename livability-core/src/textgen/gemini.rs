use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::http;

use super::{DEFAULT_INSTRUCTION, TextGenerator};

const GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Returned when the service answers without any candidate text.
pub const NO_RESPONSE: &str = "No response";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_else(|| NO_RESPONSE.to_string())
    }
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self { api_key, http: http::client_with_timeout(timeout, None)? })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, instruction: Option<&str>, prompt: &str) -> Result<String> {
        let instruction = instruction.unwrap_or(DEFAULT_INSTRUCTION);
        let body = GenerateRequest {
            contents: [Content { parts: [Part { text: instruction }, Part { text: prompt }] }],
        };

        debug!(prompt_len = prompt.len(), "requesting Gemini completion");
        let res = self
            .http
            .post(GENERATE_URL)
            .header("X-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let parsed: GenerateResponse = http::decode_json(res, "Gemini").await?;
        Ok(parsed.into_text())
    }
}
