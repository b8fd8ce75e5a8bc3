//! Narrow contract for generative-text backends.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Config, error::ReportError, provider::ProviderId, textgen::gemini::GeminiClient};

pub mod gemini;

/// Used when the caller does not supply an instruction.
pub const DEFAULT_INSTRUCTION: &str = "You are an AI assistant for a city improvement chat. \
Your goal is to help participants come up with ideas and advice on how to make the city better: \
quality of life, environment, infrastructure, safety and public services. \
Respond in a friendly, clear and constructive way, suggest practical solutions, proven practices \
and modern technologies that can be applied locally. Avoid political topics or conflicts. \
Skip acknowledgements and get straight to the point.";

#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    /// Generate text for `prompt`, steered by `instruction` or [`DEFAULT_INSTRUCTION`].
    async fn generate(&self, instruction: Option<&str>, prompt: &str) -> anyhow::Result<String>;
}

/// `None` when no generation key is configured.
pub fn text_generator_from_config(config: &Config) -> anyhow::Result<Option<Box<dyn TextGenerator>>> {
    let Some(api_key) = config.provider_api_key(ProviderId::Gemini) else {
        return Ok(None);
    };
    let client = GeminiClient::new(api_key.to_owned(), config.timeouts.generation())?;
    Ok(Some(Box::new(client)))
}

/// Pass a free-form prompt straight to the generator.
pub async fn ask(
    generator: &dyn TextGenerator,
    instruction: Option<&str>,
    prompt: &str,
) -> Result<String, ReportError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ReportError::InvalidInput("prompt is required".into()));
    }
    let instruction = instruction.map(str::trim).filter(|i| !i.is_empty());

    generator
        .generate(instruction, prompt)
        .await
        .map_err(ReportError::GenerationFailure)
}
