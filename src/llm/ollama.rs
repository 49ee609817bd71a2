//! Local Ollama generation provider.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationRequest, LlmProvider};

/// Blocking client for a local Ollama `/api/generate` endpoint.
///
/// Useful when analysis should stay on-host; no API key involved.
pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaProvider {
    /// Builds a new provider against `base_url` (e.g. `http://127.0.0.1:11434`).
    pub fn new(base_url: String, model: String) -> Result<Self> {
        anyhow::ensure!(!model.trim().is_empty(), "missing Ollama model name");
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("failed to build Ollama HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model,
        })
    }
}

impl LlmProvider for OllamaProvider {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .context("failed to reach Ollama; is the service running?")?;
        if !resp.status().is_success() {
            bail!("Ollama returned an error status: {}", resp.status());
        }
        let parsed: GenerateResponse =
            resp.json().context("failed to parse Ollama response")?;
        Ok(parsed.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
