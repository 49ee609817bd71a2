//! Embedding capability boundary.

use anyhow::Result;

pub mod openai;

pub use openai::OpenAiEmbedder;

/// Trait implemented by concrete embedding backends.
///
/// Implementations must be deterministic enough that identical text yields
/// comparable vectors across indexing and querying against the same index.
pub trait TextEmbedder {
    /// Embeds a batch of texts, returning one vector per input in input order.
    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Maximum inputs accepted per [`TextEmbedder::embed_batch`] call.
    fn batch_size(&self) -> usize {
        32
    }
}
