use anyhow::{Context as _, Result};

/// Which strategy populates a session's question list. Exactly one is
/// active per process; the two are never combined within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    /// Pattern-extract questions from the document text
    Markers,
    /// Ask the LLM to draft short reflective questions from an excerpt
    Llm,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub model: String,
    pub question_source: QuestionSource,
    pub port: u16,
}

impl ServiceConfig {
    /// Resolve configuration from the process environment.
    /// `OPENROUTER_API_KEY` is required; everything else has defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .context("OPENROUTER_API_KEY environment variable is required")?;

        let model =
            std::env::var("REPORT_MODEL").unwrap_or_else(|_| "openai/gpt-4o-mini".to_string());

        let question_source = match std::env::var("QUESTION_SOURCE").as_deref() {
            Ok("llm") => QuestionSource::Llm,
            _ => QuestionSource::Markers,
        };

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .unwrap_or(3000);

        Ok(Self {
            api_key,
            model,
            question_source,
            port,
        })
    }
}
