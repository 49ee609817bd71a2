//! In-memory vector index with JSONL persistence and cosine-ranked search.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::embedder::TextEmbedder;

/// One stored chunk: its embedding, the source text, and optional metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Embedding vector produced by the configured backend.
    pub embedding: Vec<f32>,
    /// The chunk text exactly as it was added.
    pub text: String,
    /// Optional caller-supplied metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// First line of a persisted index bundle.
#[derive(Serialize, Deserialize)]
struct BundleHeader {
    dimensions: usize,
    entries: usize,
}

/// Semantic index over text chunks.
///
/// Entries are append-only in memory; `load` replaces them wholesale. The
/// embedding backend is injected so indexing and querying always use the
/// same vector space.
pub struct VectorIndex<E> {
    embedder: E,
    entries: Vec<VectorEntry>,
    dimensions: Option<usize>,
}

impl<E: TextEmbedder> VectorIndex<E> {
    /// Creates an empty index over the given embedding backend.
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            dimensions: None,
        }
    }

    /// True once the index holds at least one entry.
    pub fn is_initialized(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimensionality, fixed by the first added batch.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Embeds `texts` and appends the resulting entries.
    ///
    /// All batches are embedded before anything is appended, so an embedding
    /// failure leaves the index exactly as it was. The first successful call
    /// establishes the index dimensionality; later calls must match it.
    pub fn add(
        &mut self,
        texts: &[String],
        metadatas: Option<&[BTreeMap<String, String>]>,
    ) -> Result<()> {
        if texts.is_empty() {
            warn!("no texts provided to add");
            return Ok(());
        }
        if let Some(metas) = metadatas {
            anyhow::ensure!(
                metas.len() == texts.len(),
                "got {} metadata entries for {} texts",
                metas.len(),
                texts.len()
            );
        }

        let batch = self.embedder.batch_size().max(1);
        let mut vectors = Vec::with_capacity(texts.len());
        for group in texts.chunks(batch) {
            let refs: Vec<&str> = group.iter().map(String::as_str).collect();
            let embedded = self
                .embedder
                .embed_batch(&refs)
                .context("embedding batch failed")?;
            anyhow::ensure!(
                embedded.len() == refs.len(),
                "embedder returned {} vectors for {} inputs",
                embedded.len(),
                refs.len()
            );
            vectors.extend(embedded);
        }

        let dims = vectors[0].len();
        match self.dimensions {
            None => self.dimensions = Some(dims),
            Some(existing) => anyhow::ensure!(
                existing == dims,
                "embedding dimensionality {} does not match index dimensionality {}",
                dims,
                existing
            ),
        }
        for vector in &vectors {
            anyhow::ensure!(
                vector.len() == dims,
                "embedder returned mixed dimensionalities ({} and {})",
                vector.len(),
                dims
            );
        }

        for (i, (text, vector)) in texts.iter().zip(vectors).enumerate() {
            self.entries.push(VectorEntry {
                embedding: vector,
                text: text.clone(),
                metadata: metadatas.map(|metas| metas[i].clone()),
            });
        }
        info!(added = texts.len(), total = self.entries.len(), "indexed chunks");
        Ok(())
    }

    /// Persists all entries as a JSONL bundle at `path`.
    ///
    /// An empty index is a logged no-op. The bundle is written to a sibling
    /// temp file and renamed into place, so a failed save never corrupts an
    /// existing bundle.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.entries.is_empty() {
            warn!("vector index is empty; skipping save");
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let staged = path.with_extension("jsonl.tmp");
        {
            let file = File::create(&staged)
                .with_context(|| format!("failed to create {}", staged.display()))?;
            let mut writer = BufWriter::new(file);
            let header = BundleHeader {
                dimensions: self.dimensions.unwrap_or(0),
                entries: self.entries.len(),
            };
            serde_json::to_writer(&mut writer, &header)?;
            writer.write_all(b"\n")?;
            for entry in &self.entries {
                serde_json::to_writer(&mut writer, entry)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&staged, path)
            .with_context(|| format!("failed to move bundle into {}", path.display()))?;
        info!(entries = self.entries.len(), path = %path.display(), "index saved");
        Ok(())
    }

    /// Replaces in-memory entries with the bundle at `path`.
    ///
    /// A missing bundle leaves the index empty with a warning; callers should
    /// check [`VectorIndex::is_initialized`] before searching.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            warn!(path = %path.display(), "index bundle not found; starting empty");
            return Ok(());
        }
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut reader = BufReader::new(file);
        let mut header_line = String::new();
        reader
            .read_line(&mut header_line)
            .context("failed to read bundle header")?;
        let header: BundleHeader =
            serde_json::from_str(header_line.trim()).context("invalid bundle header")?;

        let mut entries = Vec::with_capacity(header.entries);
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read line {}", line_no + 2))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: VectorEntry = serde_json::from_str(&line)
                .with_context(|| format!("invalid bundle entry at line {}", line_no + 2))?;
            anyhow::ensure!(
                entry.embedding.len() == header.dimensions,
                "bundle entry at line {} has dimensionality {} (header says {})",
                line_no + 2,
                entry.embedding.len(),
                header.dimensions
            );
            entries.push(entry);
        }
        anyhow::ensure!(
            entries.len() == header.entries,
            "bundle holds {} entries (header says {})",
            entries.len(),
            header.entries
        );

        self.dimensions = (!entries.is_empty()).then_some(header.dimensions);
        self.entries = entries;
        info!(entries = self.entries.len(), path = %path.display(), "index loaded");
        Ok(())
    }

    /// Returns up to `k` stored texts ranked by descending cosine similarity
    /// to `query`.
    ///
    /// An empty index returns an empty vector, never an error. Ties rank by
    /// insertion order (stable sort over entries in insertion order).
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let embedded = self
            .embedder
            .embed_batch(&[query])
            .context("failed to embed query")?;
        let query_vector = embedded
            .into_iter()
            .next()
            .context("embedder returned no vector for query")?;

        let mut ranked: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&entry.embedding, &query_vector)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(i, _)| self.entries[i].text.clone())
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
