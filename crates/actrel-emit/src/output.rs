//! All-or-nothing output files.
//!
//! Text is written to a temporary file beside the destination and renamed
//! over it, so a reader sees either the old file or the complete new one.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Result, TranslateError};
use crate::pipeline::Translation;

/// File extension of generated specifications.
pub const EXTENSION: &str = "als";

/// What [`write_output`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The destination already held identical content.
    Unchanged,
}

/// Write `text` to `path` atomically, skipping the write when the content is
/// already there.
pub fn write_output(path: &Path, text: &str) -> Result<WriteOutcome> {
    let io_err = |source| TranslateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Ok(existing) = std::fs::read(path) {
        if digest(&existing) == digest(text.as_bytes()) {
            info!(path = %path.display(), "output unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(text.as_bytes()).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;

    debug!(path = %path.display(), bytes = text.len(), "wrote output");
    Ok(WriteOutcome::Written)
}

/// Write a translation to `<dir>/<Class>.als`.
pub fn write_translation(dir: &Path, translation: &Translation) -> Result<(PathBuf, WriteOutcome)> {
    let path = output_path(dir, &translation.class);
    let outcome = write_output(&path, &translation.text)?;
    Ok((path, outcome))
}

pub fn output_path(dir: &Path, class: &str) -> PathBuf {
    dir.join(format!("{class}.{EXTENSION}"))
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}
