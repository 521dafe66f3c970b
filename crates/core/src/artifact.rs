// Working-tree artifacts: the activity data file, the daily progress log,
// and the backfill log. Each commit needs some content change to carry;
// these files are that content.

use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// First two lines of the progress log. Entries are inserted below them,
/// newest first.
const PROGRESS_HEADER: [&str; 2] = ["# Daily Progress", ""];

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("artifact serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One record in the activity data file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEntry {
    pub date: DateTime<Local>,
    pub id: Uuid,
}

impl ActivityEntry {
    pub fn new(date: DateTime<Local>) -> Self {
        Self { date, id: Uuid::new_v4() }
    }
}

/// Append an entry to the JSON activity file and return the new length.
///
/// A legacy file holding a single object is coerced to a one-element
/// array. A file that fails to parse is logged and treated as empty; the
/// log only ever grows, nothing is deduplicated.
pub fn append_activity_entry(path: &Path, entry: &ActivityEntry) -> Result<usize, ArtifactError> {
    let mut entries = match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(single) => vec![single],
            Err(error) => {
                warn!(path = %path.display(), %error, "activity file is not valid JSON, starting fresh");
                Vec::new()
            }
        },
        Err(error) if error.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(error) => return Err(error.into()),
    };

    entries.push(serde_json::to_value(entry)?);
    let count = entries.len();

    let rendered = serde_json::to_string_pretty(&Value::Array(entries))?;
    std::fs::write(path, rendered)?;
    Ok(count)
}

/// Read the activity file back as a JSON array (empty when absent).
pub fn read_activity_entries(path: &Path) -> Result<Vec<Value>, ArtifactError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw)? {
            Value::Array(items) => Ok(items),
            single => Ok(vec![single]),
        },
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(error) => Err(error.into()),
    }
}

/// Insert a progress entry directly below the log header (line 3).
///
/// A missing file is seeded with the header first; a file shorter than the
/// header is padded so the entry always lands in the same place.
pub fn append_progress_entry(path: &Path, entry: &str) -> Result<(), ArtifactError> {
    let mut lines: Vec<String> = match std::fs::read_to_string(path) {
        Ok(raw) => raw.lines().map(str::to_string).collect(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            PROGRESS_HEADER.iter().map(|line| line.to_string()).collect()
        }
        Err(error) => return Err(error.into()),
    };

    while lines.len() < PROGRESS_HEADER.len() {
        lines.push(String::new());
    }
    lines.insert(PROGRESS_HEADER.len(), entry.to_string());

    std::fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

/// Append one line to the flat backfill log.
pub fn append_backfill_line(path: &Path, line: &str) -> Result<(), ArtifactError> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}
