//! Generation capability boundary and concrete LLM providers.

use anyhow::Result;

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Trait implemented by concrete generation backends.
pub trait LlmProvider {
    /// Produces a completion for the assembled prompt.
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Request envelope shared by the providers.
pub struct GenerationRequest<'a> {
    /// Fully assembled prompt, context block included.
    pub prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token budget.
    pub max_tokens: usize,
}
