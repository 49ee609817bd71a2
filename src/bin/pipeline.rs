use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lograg::{run_pipeline, ChunkConfig, OpenAiEmbedder};

#[derive(Parser, Debug)]
#[command(
    name = "lograg-pipeline",
    about = "Ingest a log file, embed its records, and persist the semantic index"
)]
struct PipelineCli {
    /// Path to the newline-delimited JSON log file
    #[arg(long, env = "LOGRAG_LOG_FILE", default_value = "data/raw/app.log")]
    log_file: PathBuf,

    /// Destination for the persisted index bundle
    #[arg(
        long,
        env = "LOGRAG_INDEX",
        default_value = "data/processed/log_index.jsonl"
    )]
    index_path: PathBuf,

    /// API key for the embedding endpoint
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_api_key: String,

    /// Embedding model identifier
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

    /// Maximum characters per chunk
    #[arg(long, env = "LOGRAG_CHUNK_SIZE", default_value_t = 1000)]
    chunk_size: usize,

    /// Overlapping characters between consecutive chunks
    #[arg(long, env = "LOGRAG_CHUNK_OVERLAP", default_value_t = 100)]
    chunk_overlap: usize,

    /// Max chunks per embedding request
    #[arg(long, env = "LOGRAG_EMBED_BATCH", default_value_t = 32)]
    batch_size: usize,

    /// Max seconds to wait for each embedding request
    #[arg(long, env = "LOGRAG_EMBED_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Number of retries for rate limits or transient errors
    #[arg(long, env = "LOGRAG_EMBED_MAX_RETRIES", default_value_t = 5)]
    max_retries: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = PipelineCli::parse();
    let embedder = OpenAiEmbedder::new(
        cli.openai_api_key,
        cli.openai_base_url,
        cli.embed_model,
        Duration::from_secs(cli.timeout_secs.max(1)),
        cli.max_retries,
        cli.batch_size,
    )?;
    let config = ChunkConfig {
        chunk_size: cli.chunk_size,
        overlap: cli.chunk_overlap,
    };
    run_pipeline(&cli.log_file, &cli.index_path, embedder, &config)
}
