use chrono::NaiveDate;
use tracing::debug;

use crate::{
    Config,
    error::ReportError,
    provider::ProviderId,
    textgen::{TextGenerator, text_generator_from_config},
};

/// Upper bound on whitespace-separated tokens in an answer.
pub const MAX_ADVICE_WORDS: usize = 50;

/// Short, metric-driven improvement suggestions for a city.
#[derive(Debug)]
pub struct AdviceComposer {
    generator: Box<dyn TextGenerator>,
}

impl AdviceComposer {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let id = ProviderId::Gemini;
        let generator = text_generator_from_config(config)?.ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured for provider '{id}'.\n\
                 Hint: run `livability configure {id}` or set {}.",
                id.env_var()
            )
        })?;
        Ok(Self::new(generator))
    }

    /// Ask for advice and cut the answer to [`MAX_ADVICE_WORDS`] tokens.
    ///
    /// The cut is purely token based and may end mid-sentence.
    pub async fn compose(
        &self,
        city: &str,
        date: Option<NaiveDate>,
        metrics: &serde_json::Value,
    ) -> Result<String, ReportError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ReportError::InvalidInput("city is required".into()));
        }

        let prompt = advice_prompt(city, date, metrics);
        debug!(city, prompt_len = prompt.len(), "requesting city advice");

        let answer = self
            .generator
            .generate(None, &prompt)
            .await
            .map_err(ReportError::GenerationFailure)?;

        Ok(truncate_words(&answer, MAX_ADVICE_WORDS))
    }
}

fn advice_prompt(city: &str, date: Option<NaiveDate>, metrics: &serde_json::Value) -> String {
    let date = date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    format!(
        "Short answer, no more than {MAX_ADVICE_WORDS} words. Provide practical, non-political, \
         community-driven suggestions to improve the city '{city}' (date={date}). \
         Base them on the metrics below and cover infrastructure, environment, safety and public services.\n\
         Metrics:\n{metrics}\n\nRespond concisely."
    )
}

/// Keep the first `max` whitespace-separated tokens, joined by single spaces.
pub fn truncate_words(text: &str, max: usize) -> String {
    text.split_whitespace().take(max).collect::<Vec<_>>().join(" ")
}
