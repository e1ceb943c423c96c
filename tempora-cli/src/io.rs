//! File I/O for the batch CLI

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a jsonl corpus file.
pub fn load_corpus(path: &str) -> Result<String> {
    let path = Path::new(path);
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read file: {}", canonical.display()))
}

/// Write the exported corpus next to wherever the caller asked.
pub fn write_corpus(path: &str, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path))
}
