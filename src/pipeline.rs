//! End-to-end ingestion pipeline: load, process, embed, persist.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::embedder::TextEmbedder;
use crate::index::VectorIndex;
use crate::ingest;
use crate::processor::{self, ChunkConfig};

/// Runs the full ingestion pipeline: bulk load, normalize + chunk, embed,
/// and persist the index bundle at `index_path`.
///
/// An empty or missing log source is not a failure; the run ends early with
/// a warning. An embedding failure aborts the run before anything is written
/// to disk, so a previously saved bundle is never corrupted.
pub fn run_pipeline<E: TextEmbedder>(
    log_source: &Path,
    index_path: &Path,
    embedder: E,
    config: &ChunkConfig,
) -> Result<()> {
    info!(source = %log_source.display(), "starting ingestion pipeline");

    let records = ingest::load_bulk(log_source);
    if records.is_empty() {
        warn!("no log records loaded; nothing to index");
        return Ok(());
    }

    let chunks = processor::process_batch(&records, config);
    info!(
        records = records.len(),
        chunks = chunks.len(),
        "processed log records"
    );

    let mut index = VectorIndex::new(embedder);
    index
        .add(&chunks, None)
        .context("embedding capability failed; aborting pipeline run")?;
    index.save(index_path)?;
    info!(path = %index_path.display(), "pipeline completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::testing::HashEmbedder;
    use anyhow::anyhow;
    use std::io::Write;

    struct BrokenEmbedder;

    impl TextEmbedder for BrokenEmbedder {
        fn embed_batch(&self, _inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
            Err(anyhow!("embedding endpoint unreachable"))
        }
    }

    fn write_log_fixture(file: &mut tempfile::NamedTempFile) {
        writeln!(
            file,
            r#"{{"timestamp":"2024-05-01T10:00:00","service":"payment-gateway","level":"ERROR","message":"Payment declined: Gateway Timeout (504)"}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"2024-05-01T10:00:01","service":"auth-service","level":"INFO","message":"User login successful"}}"#
        )
        .unwrap();
        writeln!(file, "garbage line").unwrap();
        file.flush().unwrap();
    }

    #[test]
    fn pipeline_builds_a_searchable_bundle() {
        let mut log_file = tempfile::NamedTempFile::new().unwrap();
        write_log_fixture(&mut log_file);
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("log_index.jsonl");

        run_pipeline(
            log_file.path(),
            &bundle,
            HashEmbedder,
            &ChunkConfig::default(),
        )
        .unwrap();
        assert!(bundle.exists());

        let mut index = VectorIndex::new(HashEmbedder);
        index.load(&bundle).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search("payment gateway timeout", 1).unwrap();
        assert!(results[0].contains("Payment declined"));
    }

    #[test]
    fn pipeline_with_missing_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("log_index.jsonl");
        run_pipeline(
            Path::new("/nonexistent/app.log"),
            &bundle,
            HashEmbedder,
            &ChunkConfig::default(),
        )
        .unwrap();
        assert!(!bundle.exists());
    }

    #[test]
    fn embedding_failure_aborts_before_any_write() {
        let mut log_file = tempfile::NamedTempFile::new().unwrap();
        write_log_fixture(&mut log_file);
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("log_index.jsonl");

        let err = run_pipeline(
            log_file.path(),
            &bundle,
            BrokenEmbedder,
            &ChunkConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("embedding capability failed"));
        assert!(!bundle.exists());
    }
}
