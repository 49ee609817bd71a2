//! Normalization and chunking of log records into embeddable text.

use crate::record::LogRecord;

/// Prefix applied to unparseable lines carried through as raw text.
pub const RAW_MARKER: &str = "RAW LOG: ";
/// Placeholder rendered when a record carries no timestamp.
pub const UNKNOWN_TIME: &str = "UNKNOWN_TIME";
/// Placeholder rendered when a record carries no service identifier.
pub const UNKNOWN_SERVICE: &str = "UNKNOWN_SERVICE";
/// Severity assumed when a record carries no level.
pub const DEFAULT_LEVEL: &str = "INFO";

const STACK_TRACE_HEADER: &str = "Stack Trace:";

/// Chunking tuning knobs, measured in characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Maximum characters per emitted chunk.
    pub chunk_size: usize,
    /// Characters of shared context between consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

/// Renders a record into its canonical embeddable form.
///
/// Structured records become `"[timestamp] [service] [level]: message"`, with
/// placeholder tokens standing in for absent fields and any stack trace
/// appended under a fixed header. Raw records are passed through behind
/// [`RAW_MARKER`]. The rendered shape is load-bearing: it is the exact text
/// that gets embedded, so retrieval quality depends on reproducing it.
pub fn normalize(record: &LogRecord) -> String {
    match record {
        LogRecord::Raw(line) => format!("{RAW_MARKER}{line}"),
        LogRecord::Structured(rec) => {
            let timestamp = rec.timestamp.as_deref().unwrap_or(UNKNOWN_TIME);
            let service = rec.service.as_deref().unwrap_or(UNKNOWN_SERVICE);
            let level = rec.level.as_deref().unwrap_or(DEFAULT_LEVEL);
            let mut text = format!("[{timestamp}] [{service}] [{level}]: {}", rec.message);
            if let Some(trace) = rec.stack_trace.as_deref() {
                if !trace.is_empty() {
                    text.push('\n');
                    text.push_str(STACK_TRACE_HEADER);
                    text.push('\n');
                    text.push_str(trace);
                }
            }
            text
        }
    }
}

/// Splits `text` into chunks of at most `chunk_size` characters with
/// `overlap` characters of shared context between consecutive chunks.
///
/// Cut positions prefer, in order: the last paragraph boundary (`"\n\n"`),
/// the last line boundary, the last space, and finally a hard cut at the
/// size limit. Lengths are counted in characters, not bytes, so multi-byte
/// input never splits inside a code point.
pub fn chunk(text: &str, config: &ChunkConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let size = config.chunk_size.max(1);
    let overlap = config.overlap.min(size.saturating_sub(1));
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let hard_end = (start + size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            pick_break(&chars, start, hard_end, overlap)
        };
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }
    chunks
}

/// Chooses a cut position in `(start, hard_end]`. Cuts land just after the
/// separator so the next chunk opens on fresh content, and never closer than
/// `overlap + 1` characters from `start` so the window always advances.
fn pick_break(chars: &[char], start: usize, hard_end: usize, overlap: usize) -> usize {
    let min_break = start + overlap + 1;
    for j in (min_break..=hard_end).rev() {
        if j >= 2 && chars[j - 1] == '\n' && chars[j - 2] == '\n' {
            return j;
        }
    }
    for j in (min_break..=hard_end).rev() {
        if chars[j - 1] == '\n' {
            return j;
        }
    }
    for j in (min_break..=hard_end).rev() {
        if chars[j - 1] == ' ' {
            return j;
        }
    }
    hard_end
}

/// Normalizes and chunks a batch of records, preserving input order.
pub fn process_batch(records: &[LogRecord], config: &ChunkConfig) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| chunk(&normalize(record), config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StructuredRecord;

    fn record(
        timestamp: Option<&str>,
        service: Option<&str>,
        level: Option<&str>,
        message: &str,
    ) -> LogRecord {
        LogRecord::Structured(StructuredRecord {
            timestamp: timestamp.map(String::from),
            service: service.map(String::from),
            level: level.map(String::from),
            message: message.to_string(),
            stack_trace: None,
        })
    }

    #[test]
    fn normalize_renders_canonical_template() {
        let rec = record(
            Some("2024-05-01T10:00:00"),
            Some("payment-gateway"),
            Some("ERROR"),
            "Payment declined: Gateway Timeout (504)",
        );
        assert_eq!(
            normalize(&rec),
            "[2024-05-01T10:00:00] [payment-gateway] [ERROR]: Payment declined: Gateway Timeout (504)"
        );
    }

    #[test]
    fn normalize_fills_placeholders_for_missing_fields() {
        let rec = record(None, None, None, "Health check OK");
        assert_eq!(
            normalize(&rec),
            "[UNKNOWN_TIME] [UNKNOWN_SERVICE] [INFO]: Health check OK"
        );
    }

    #[test]
    fn normalize_appends_stack_trace_under_header() {
        let rec = LogRecord::Structured(StructuredRecord {
            timestamp: Some("2024-05-01T10:00:00".into()),
            service: Some("inventory-db".into()),
            level: Some("ERROR".into()),
            message: "ConnectionRefusedError: max connections reached".into(),
            stack_trace: Some("Traceback (most recent call last)...\n  File 'db.py', line 42".into()),
        });
        let text = normalize(&rec);
        assert!(text.starts_with("[2024-05-01T10:00:00] [inventory-db] [ERROR]:"));
        assert!(text.contains("\nStack Trace:\nTraceback"));
    }

    #[test]
    fn normalize_marks_raw_lines_once() {
        let rec = LogRecord::raw("kernel: oom-killer invoked");
        assert_eq!(normalize(&rec), "RAW LOG: kernel: oom-killer invoked");
        assert_eq!(normalize(&rec).matches(RAW_MARKER).count(), 1);
    }

    #[test]
    fn chunk_returns_whole_text_when_short() {
        let config = ChunkConfig::default();
        assert_eq!(chunk("short line", &config), vec!["short line".to_string()]);
        assert!(chunk("", &config).is_empty());
    }

    #[test]
    fn chunk_respects_size_and_reconstructs_source() {
        let config = ChunkConfig {
            chunk_size: 40,
            overlap: 10,
        };
        let text = "one two three four five six seven eight nine ten \
                    eleven twelve thirteen fourteen fifteen sixteen seventeen";
        let chunks = chunk(text, &config);
        assert!(chunks.len() > 1);
        for piece in &chunks {
            assert!(piece.chars().count() <= config.chunk_size);
        }

        // dropping each chunk's trailing overlap and concatenating recovers
        // the original text exactly
        let mut rebuilt = String::new();
        for piece in &chunks[..chunks.len() - 1] {
            let keep = piece.chars().count() - config.overlap;
            rebuilt.extend(piece.chars().take(keep));
        }
        rebuilt.push_str(chunks.last().unwrap());
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn chunk_prefers_paragraph_then_line_breaks() {
        let config = ChunkConfig {
            chunk_size: 30,
            overlap: 5,
        };
        let text = "first paragraph here\n\nsecond paragraph that keeps going past the limit";
        let chunks = chunk(text, &config);
        // cut lands right after the paragraph boundary
        assert!(chunks[0].ends_with("\n\n"), "chunk was {:?}", chunks[0]);

        let line_text = "line one stays intact\nline two keeps going past the limit";
        let line_chunks = chunk(line_text, &config);
        assert!(line_chunks[0].ends_with('\n'), "chunk was {:?}", line_chunks[0]);
    }

    #[test]
    fn chunk_hard_cuts_unbroken_text() {
        let config = ChunkConfig {
            chunk_size: 16,
            overlap: 4,
        };
        let text = "x".repeat(50);
        let chunks = chunk(&text, &config);
        for piece in &chunks {
            assert!(piece.chars().count() <= 16);
        }
        let mut rebuilt = String::new();
        for piece in &chunks[..chunks.len() - 1] {
            let keep = piece.chars().count() - config.overlap;
            rebuilt.extend(piece.chars().take(keep));
        }
        rebuilt.push_str(chunks.last().unwrap());
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn process_batch_preserves_record_order() {
        let config = ChunkConfig::default();
        let records = vec![
            record(None, Some("auth-service"), Some("INFO"), "User login successful"),
            record(None, Some("checkout-service"), Some("INFO"), "Cart updated"),
        ];
        let chunks = process_batch(&records, &config);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("auth-service"));
        assert!(chunks[1].contains("checkout-service"));
    }
}
