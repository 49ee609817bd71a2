use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lograg::{LlmProvider, OllamaProvider, OpenAiEmbedder, OpenAiProvider, RetrievalEngine, VectorIndex};

#[derive(Parser, Debug)]
#[command(
    name = "lograg-query",
    about = "Ask a natural-language incident question against the indexed logs"
)]
struct QueryCli {
    /// Question to answer (e.g. "Why did payment fail?")
    query: String,

    /// Number of log chunks to retrieve
    #[arg(long, default_value_t = 3)]
    k: usize,

    /// Path to the persisted index bundle
    #[arg(
        long,
        env = "LOGRAG_INDEX",
        default_value = "data/processed/log_index.jsonl"
    )]
    index_path: PathBuf,

    /// API key for the embedding endpoint (always required to embed the query)
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_api_key: String,

    /// Embedding model identifier (must match the one used at indexing time)
    #[arg(
        long,
        env = "LOGRAG_EMBED_MODEL",
        default_value = "text-embedding-3-small"
    )]
    embed_model: String,

    /// Base URL for the OpenAI-compatible API
    #[arg(
        long,
        env = "LOGRAG_OPENAI_BASE",
        default_value = "https://api.openai.com/v1"
    )]
    openai_base_url: String,

    /// Generation backend: openai, ollama, or none (retrieval only)
    #[arg(long, env = "LOGRAG_LLM_PROVIDER", default_value = "openai")]
    llm_provider: String,

    /// Chat model used for the generated explanation
    #[arg(long, env = "LOGRAG_CHAT_MODEL", default_value = "gpt-4o-mini")]
    chat_model: String,

    /// Ollama endpoint (used with --llm-provider ollama)
    #[arg(long, env = "LOGRAG_OLLAMA_URL", default_value = "http://127.0.0.1:11434")]
    ollama_url: String,

    /// Ollama model identifier
    #[arg(long, env = "LOGRAG_OLLAMA_MODEL", default_value = "llama3")]
    ollama_model: String,

    /// Sampling temperature for the answer model
    #[arg(long, default_value_t = 0.2)]
    temperature: f32,

    /// Maximum tokens to request from the completion model
    #[arg(long, default_value_t = 400)]
    max_completion_tokens: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = QueryCli::parse();
    let embedder = OpenAiEmbedder::new(
        cli.openai_api_key.clone(),
        cli.openai_base_url.clone(),
        cli.embed_model.clone(),
        Duration::from_secs(30),
        5,
        32,
    )?;

    let mut index = VectorIndex::new(embedder);
    index.load(&cli.index_path)?;
    if !index.is_initialized() {
        bail!(
            "index at {} is empty; run lograg-pipeline first",
            cli.index_path.display()
        );
    }

    let provider: Option<Box<dyn LlmProvider>> = match cli.llm_provider.to_lowercase().as_str() {
        "openai" => Some(Box::new(OpenAiProvider::new(
            cli.openai_api_key.clone(),
            cli.openai_base_url.clone(),
            cli.chat_model.clone(),
        )?)),
        "ollama" => Some(Box::new(OllamaProvider::new(
            cli.ollama_url.clone(),
            cli.ollama_model.clone(),
        )?)),
        "none" => None,
        other => bail!("unsupported llm provider '{}'; use openai, ollama, or none", other),
    };

    let engine = RetrievalEngine::new(&index, provider.as_deref())
        .with_sampling(cli.temperature, cli.max_completion_tokens);
    let result = engine.analyze(&cli.query, cli.k)?;

    println!("--- Root Cause Analysis ---\n{}\n", result.answer);
    println!("--- Supporting Log Evidence ---");
    for (i, chunk) in result.source_chunks.iter().enumerate() {
        println!("[{}] {}", i + 1, chunk.trim());
    }
    Ok(())
}
