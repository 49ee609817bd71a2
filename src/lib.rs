#![warn(missing_docs)]
//! Retrieval-augmented incident analysis over newline-delimited JSON logs.
//!
//! The pipeline ingests log records, normalizes and chunks them into
//! embeddable text, indexes the chunks in a persistent vector index, and
//! answers natural-language incident questions grounded in the retrieved
//! excerpts.

pub mod embedder;
pub mod engine;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod processor;
pub mod record;

pub use embedder::{OpenAiEmbedder, TextEmbedder};
pub use engine::{QueryResult, RetrievalEngine};
pub use index::{VectorEntry, VectorIndex};
pub use ingest::{follow, load_bulk, LogFollower};
pub use llm::{GenerationRequest, LlmProvider, OllamaProvider, OpenAiProvider};
pub use pipeline::run_pipeline;
pub use processor::{chunk, normalize, process_batch, ChunkConfig};
pub use record::{LogRecord, StructuredRecord};
