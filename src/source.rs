use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::{FeedbackError, Result};
use crate::models::FeedbackRecord;

pub fn read_csv(path: &Path) -> Result<Vec<FeedbackRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for row in reader.deserialize::<FeedbackRecord>() {
        records.push(row?);
    }

    debug!(path = %path.display(), records = records.len(), "read feedback csv");
    Ok(records)
}

/// Reads a JSON array of feedback records.
pub fn read_json(path: &Path) -> Result<Vec<FeedbackRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let records: Vec<FeedbackRecord> = serde_json::from_reader(reader)?;

    debug!(path = %path.display(), records = records.len(), "read feedback json");
    Ok(records)
}

/// Picks a reader from the file extension.
pub fn read_path(path: &Path) -> Result<Vec<FeedbackRecord>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => read_csv(path),
        Some("json") => read_json(path),
        _ => Err(FeedbackError::UnsupportedFormat(path.to_path_buf())),
    }
}
