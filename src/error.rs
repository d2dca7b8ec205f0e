//! Error types for the edgequake-docx2html library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Docx2HtmlError`]: **fatal**, the conversion cannot proceed at all
//!   (bad input file, converter failure, broken tree transformation).
//!   Returned as `Err(Docx2HtmlError)` from the top-level `convert*`
//!   functions. Callers never receive a partially transformed document.
//!
//! * [`ExtractionError`]: **non-fatal**, the structural inventory could not
//!   be read from `word/document.xml`. The pipeline carries on with an empty
//!   inventory (image reconciliation simply inserts nothing) and the error is
//!   stored in [`crate::output::ConversionOutput::inventory_error`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docx2html library.
#[derive(Debug, Error)]
pub enum Docx2HtmlError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Word file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a zip-packaged document.
    #[error("File is not a valid .docx package: '{path}'\nFirst bytes: {magic:?}")]
    NotADocx { path: PathBuf, magic: [u8; 4] },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The docx→HTML converter rejected the document (unsupported or corrupt).
    #[error("Converter '{converter}' failed: {detail}")]
    ConversionFailed { converter: String, detail: String },

    /// An unexpected failure while rewriting the document tree.
    #[error("HTML transformation failed: {detail}")]
    TransformFailed { detail: String },

    /// Inventory extraction failed where it is the only requested result
    /// (see [`crate::convert::inspect`]).
    #[error(transparent)]
    Inventory(#[from] ExtractionError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error raised while reading the structural inventory.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// The bytes are not a readable zip package.
    #[error("cannot open document package: {detail}")]
    OpenPackage { detail: String },

    /// The package has no part with the expected name.
    #[error("document package has no '{part}' part")]
    MissingPart { part: String },

    /// The part exists but is not well-formed XML.
    #[error("'{part}' is not well-formed XML: {detail}")]
    MalformedXml { part: String, detail: String },
}
