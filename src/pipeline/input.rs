//! Input resolution: validate a user-supplied path and load the package.
//!
//! Every `.docx` is a zip archive, so the first four bytes must be the local
//! file header signature `PK\x03\x04`. Checking this up front gives callers
//! a clear [`Docx2HtmlError::NotADocx`] rather than a zip parser message
//! about a missing central directory.

use crate::error::Docx2HtmlError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Zip local file header signature.
pub const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Check the zip signature of an in-memory document.
pub fn check_magic(bytes: &[u8], path: &Path) -> Result<(), Docx2HtmlError> {
    if bytes.len() < 4 || bytes[..4] != ZIP_MAGIC {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Docx2HtmlError::NotADocx {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

fn map_read_error(e: std::io::Error, path: PathBuf) -> Docx2HtmlError {
    match e.kind() {
        ErrorKind::PermissionDenied => Docx2HtmlError::PermissionDenied { path },
        _ => Docx2HtmlError::FileNotFound { path },
    }
}

/// Read a local `.docx`, validating existence, permissions and magic bytes.
pub fn read_local(path: impl AsRef<Path>) -> Result<Vec<u8>, Docx2HtmlError> {
    let path = path.as_ref().to_path_buf();
    if !path.exists() {
        return Err(Docx2HtmlError::FileNotFound { path });
    }
    let bytes = std::fs::read(&path).map_err(|e| map_read_error(e, path.clone()))?;
    check_magic(&bytes, &path)?;
    debug!("Read local document: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Async variant of [`read_local`].
pub async fn read_local_async(path: impl AsRef<Path>) -> Result<Vec<u8>, Docx2HtmlError> {
    let path = path.as_ref().to_path_buf();
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| map_read_error(e, path.clone()))?;
    check_magic(&bytes, &path)?;
    debug!("Read local document: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Display name of a document: its file stem, or `document`.
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}
