//! Locked JSON record I/O
//!
//! fs2 advisory locks guard every record file so a CLI invocation and a
//! background refresh touching the same record cannot corrupt it. Locks
//! are cooperative - all store access goes through these two helpers.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decode a JSON record under a shared lock.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("Failed to open record: {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to lock record for reading: {}", path.display()))?;
    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read record: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to decode record: {}", path.display()))
}

/// Encode a record as pretty JSON under an exclusive lock.
///
/// The file is opened without truncation and emptied only once the lock
/// is held, so a concurrent reader never observes a half-written record.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content =
        serde_json::to_string_pretty(value).context("Failed to encode record as JSON")?;
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open record for writing: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to lock record for writing: {}", path.display()))?;
    file.set_len(0)
        .with_context(|| format!("Failed to truncate record: {}", path.display()))?;
    let mut writer = BufWriter::new(&file);
    writer
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to write record: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush record: {}", path.display()))
}
