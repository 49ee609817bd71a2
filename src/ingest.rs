//! Log acquisition: eager bulk loads and tail-following over NDJSON sources.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::record::{LogRecord, StructuredRecord};

/// Reads an entire newline-delimited JSON log source eagerly.
///
/// A missing or unreadable source yields an empty vector, never an error.
/// Blank lines are skipped silently; lines that fail to parse are skipped
/// with a warning and excluded from the returned sequence.
pub fn load_bulk(path: &Path) -> Vec<LogRecord> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            error!(path = %path.display(), error = %err, "log source unavailable");
            return Vec::new();
        }
    };

    let reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(path = %path.display(), error = %err, "stopped reading log source");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StructuredRecord>(&line) {
            Ok(record) => records.push(record.into()),
            Err(err) => {
                warn!(line = line_no + 1, error = %err, "skipping malformed log line");
                skipped += 1;
            }
        }
    }
    info!(
        loaded = records.len(),
        skipped,
        path = %path.display(),
        "bulk load complete"
    );
    records
}

/// Starts tailing `path` for newly appended records.
///
/// The follower positions itself at the current end of the source, so
/// historical lines are never replayed. See [`LogFollower`] for the
/// per-iteration contract.
pub fn follow(path: &Path, poll_interval: Duration) -> LogFollower {
    LogFollower::new(path, poll_interval)
}

/// Infinite iterator over records appended to a growing log source.
///
/// Each `next()` call blocks until a full newline-terminated line is
/// available, sleeping `poll_interval` between polls. A partially written
/// line is buffered and retried rather than parsed, so a concurrent writer
/// is never misread mid-line. Malformed lines are dropped silently (the
/// stream is lossy-tolerant, unlike bulk loading). The iterator terminates
/// only on an unrecoverable read fault, which is logged; dropping the
/// iterator at any point releases the underlying file handle.
pub struct LogFollower {
    reader: Option<BufReader<File>>,
    partial: String,
    poll_interval: Duration,
    path: PathBuf,
}

impl LogFollower {
    fn new(path: &Path, poll_interval: Duration) -> Self {
        let reader = match File::open(path) {
            Ok(mut file) => match file.seek(SeekFrom::End(0)) {
                Ok(_) => Some(BufReader::new(file)),
                Err(err) => {
                    error!(path = %path.display(), error = %err, "cannot seek log source");
                    None
                }
            },
            Err(err) => {
                error!(path = %path.display(), error = %err, "cannot follow log source");
                None
            }
        };
        Self {
            reader,
            partial: String::new(),
            poll_interval,
            path: path.to_path_buf(),
        }
    }
}

impl Iterator for LogFollower {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        loop {
            let reader = self.reader.as_mut()?;
            match reader.read_line(&mut self.partial) {
                Ok(0) => thread::sleep(self.poll_interval),
                Ok(_) => {
                    if !self.partial.ends_with('\n') {
                        // writer is mid-line; wait for the rest
                        thread::sleep(self.poll_interval);
                        continue;
                    }
                    let line = std::mem::take(&mut self.partial);
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Ok(record) = serde_json::from_str::<StructuredRecord>(trimmed) {
                        return Some(record.into());
                    }
                }
                Err(err) => {
                    error!(
                        path = %self.path.display(),
                        error = %err,
                        "follow terminated by read error"
                    );
                    self.reader = None;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bulk_load_counts_well_formed_lines_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"service":"auth-service","message":"login ok"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file, r#"{{"service":"checkout-service","message":"cart updated"}}"#).unwrap();
        file.flush().unwrap();

        let records = load_bulk(file.path());
        assert_eq!(records.len(), 2);
        match &records[0] {
            LogRecord::Structured(rec) => assert_eq!(rec.message, "login ok"),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn bulk_load_of_missing_source_is_empty() {
        let records = load_bulk(Path::new("/nonexistent/app.log"));
        assert!(records.is_empty());
    }

    #[test]
    fn follow_yields_only_newly_appended_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"message":"historical line"}}"#).unwrap();
        file.flush().unwrap();

        let mut follower = follow(file.path(), Duration::from_millis(5));

        writeln!(file, r#"{{"service":"payment-gateway","message":"new line"}}"#).unwrap();
        file.flush().unwrap();

        let record = follower.next().expect("follower should yield the new line");
        match record {
            LogRecord::Structured(rec) => {
                assert_eq!(rec.message, "new line");
                assert_eq!(rec.service.as_deref(), Some("payment-gateway"));
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn follow_buffers_partially_written_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut follower = follow(file.path(), Duration::from_millis(5));

        // first half of the line, no newline yet
        write!(file, r#"{{"message":"split"#).unwrap();
        file.flush().unwrap();

        // run a few polls in a helper thread so the partial read happens
        // before the line is completed
        let handle = thread::spawn(move || follower.next());
        thread::sleep(Duration::from_millis(25));

        writeln!(file, r#" across writes"}}"#).unwrap();
        file.flush().unwrap();

        let record = handle.join().unwrap().expect("completed line should parse");
        match record {
            LogRecord::Structured(rec) => assert_eq!(rec.message, "split across writes"),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn follow_drops_malformed_lines_silently() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut follower = follow(file.path(), Duration::from_millis(5));

        writeln!(file, "not json at all").unwrap();
        writeln!(file, r#"{{"service":"inventory-db","message":"survivor"}}"#).unwrap();
        file.flush().unwrap();

        let record = follower.next().expect("valid line should still arrive");
        match record {
            LogRecord::Structured(rec) => {
                assert_eq!(rec.message, "survivor");
                assert_eq!(rec.service.as_deref(), Some("inventory-db"));
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn follow_of_missing_source_terminates_immediately() {
        let mut follower = follow(Path::new("/nonexistent/app.log"), Duration::from_millis(5));
        assert!(follower.next().is_none());
    }
}
