//! RAG orchestration: retrieval plus grounded answer generation.

use anyhow::Result;
use serde::Serialize;
use tracing::{error, info};

use crate::embedder::TextEmbedder;
use crate::index::VectorIndex;
use crate::llm::{GenerationRequest, LlmProvider};

/// Fixed answer when retrieval finds nothing.
pub const NO_RESULTS_ANSWER: &str = "No relevant logs found to analyze this issue.";
/// Fixed answer when the generation backend fails.
pub const GENERATION_ERROR_ANSWER: &str =
    "Error generating explanation. Please check the generation backend.";
/// Fixed notice when no generation backend is configured.
pub const RETRIEVAL_ONLY_ANSWER: &str =
    "No generation backend configured; returning retrieved log excerpts only.";

/// Outcome of a single `analyze` call.
///
/// Every terminal state (no results, generation failure, success) produces
/// this same shape, so callers never branch on error types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Generated explanation, or one of the fixed fallback answers.
    pub answer: String,
    /// Retrieved log excerpts backing the answer, most relevant first.
    pub source_chunks: Vec<String>,
}

/// Question-answering engine over an indexed log corpus.
pub struct RetrievalEngine<'a, E> {
    index: &'a VectorIndex<E>,
    provider: Option<&'a dyn LlmProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl<'a, E: TextEmbedder> RetrievalEngine<'a, E> {
    /// Builds an engine over `index`, optionally wired to a generation
    /// backend. Without a provider, `analyze` degrades to retrieval-only.
    pub fn new(index: &'a VectorIndex<E>, provider: Option<&'a dyn LlmProvider>) -> Self {
        Self {
            index,
            provider,
            temperature: 0.2,
            max_tokens: 400,
        }
    }

    /// Overrides the sampling parameters passed to the provider.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: usize) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Retrieves the top-`k` most relevant chunks for `query`.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>> {
        self.index.search(query, k)
    }

    /// Full RAG flow: retrieve, assemble context, generate.
    ///
    /// Retrieval failures propagate as errors; generation failures do not.
    /// A failed generation call is logged and folded into a fixed answer
    /// while the retrieved chunks are still returned, so retrieval success
    /// is never discarded.
    pub fn analyze(&self, query: &str, k: usize) -> Result<QueryResult> {
        let chunks = self.retrieve(query, k)?;
        if chunks.is_empty() {
            return Ok(QueryResult {
                answer: NO_RESULTS_ANSWER.to_string(),
                source_chunks: Vec::new(),
            });
        }

        let Some(provider) = self.provider else {
            return Ok(QueryResult {
                answer: RETRIEVAL_ONLY_ANSWER.to_string(),
                source_chunks: chunks,
            });
        };

        let context_block = chunks.join("\n\n");
        let prompt = build_prompt(&context_block, query);
        info!(retrieved = chunks.len(), "generating incident explanation");
        let request = GenerationRequest {
            prompt: &prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        match provider.generate(&request) {
            Ok(answer) => Ok(QueryResult {
                answer,
                source_chunks: chunks,
            }),
            Err(err) => {
                error!(error = %err, "generation backend failed");
                Ok(QueryResult {
                    answer: GENERATION_ERROR_ANSWER.to_string(),
                    source_chunks: chunks,
                })
            }
        }
    }
}

fn build_prompt(context_block: &str, question: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are an expert SRE and data engineer assistant. Analyze the following \
         log entries to answer the user's question. If the logs do not contain \
         enough information, state that clearly.\n\n",
    );
    prompt.push_str("Logs:\n");
    prompt.push_str(context_block);
    prompt.push_str("\n\nQuestion:\n");
    prompt.push_str(question);
    prompt.push_str("\n\nAnalysis (Root Cause & Explanation):");
    prompt
}
