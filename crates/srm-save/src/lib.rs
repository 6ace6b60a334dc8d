//! srm-save: exact-size save blob I/O.
//!
//! Loads and writes fixed-size SRAM snapshots. A read or write either
//! transfers the whole declared size or fails; truncated files surface
//! as errors, never as short buffers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use srm_core::RawBuffer;

/// Save I/O errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("save file not found: {path}")]
    NotFound { path: String },

    #[error("wrong save size for '{path}': expected {expected} bytes, found {actual}")]
    InvalidSize {
        path: String,
        expected: usize,
        actual: usize,
    },
}

/// Load an exact-size snapshot from `path`.
///
/// Fails with `NotFound` when the path is missing and `InvalidSize`
/// when the file holds anything other than `expected_len` bytes.
pub fn load_buffer(path: impl AsRef<Path>, expected_len: usize) -> Result<RawBuffer, SaveError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SaveError::NotFound {
            path: path.display().to_string(),
        },
        _ => SaveError::Io(e),
    })?;
    if bytes.len() != expected_len {
        return Err(SaveError::InvalidSize {
            path: path.display().to_string(),
            expected: expected_len,
            actual: bytes.len(),
        });
    }
    Ok(RawBuffer::from_bytes(bytes))
}

/// Write a snapshot to `path`, all or nothing.
///
/// The bytes land in a temp file next to the destination first and are
/// renamed over `path` only after the written length checks out, so a
/// failed write never leaves a truncated save in place. Writing to a
/// fresh path instead of the source file is the non-destructive edit
/// path; the caller picks by choosing `path`.
pub fn save_buffer(buffer: &RawBuffer, path: impl AsRef<Path>) -> Result<(), SaveError> {
    let path = path.as_ref();
    let tmp = tmp_path(path);

    fs::write(&tmp, buffer.as_slice())?;
    let written = fs::metadata(&tmp)?.len() as usize;
    if written != buffer.len() {
        fs::remove_file(&tmp).ok();
        return Err(SaveError::InvalidSize {
            path: path.display().to_string(),
            expected: buffer.len(),
            actual: written,
        });
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Check if a save file exists
pub fn buffer_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
