//! # edgequake-docx2html
//!
//! Convert Word (`.docx`) documents to clean, publication-ready HTML.
//!
//! ## Why this crate?
//!
//! Generic docx→HTML converters reproduce what the author *did*, not what
//! they *meant*: bold paragraphs standing in for headings, a table of
//! contents made of page numbers and tab leaders, megabytes of inline image
//! data, tables without headers. This crate runs a fixed pipeline of
//! structural heuristics over the converter output and produces a fragment
//! that drops straight into a Bootstrap-styled CMS page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx
//!  │
//!  ├─ 1. Inventory   per-paragraph text + image counts from document.xml
//!  ├─ 2. Convert     docx → HTML with inline data: images (pluggable)
//!  ├─ 3. Strip       large inline images → numbered placeholders
//!  ├─ 4. Headings    bold-only short paragraphs → <h2>
//!  ├─ 5. Typography  ’ apostrophes, unbreakable hyphenated words
//!  ├─ 6. TOC         numbered anchor list after "Table des matières"
//!  ├─ 7. Images      placeholders for pictures the converter dropped
//!  ├─ 8. Sanitize    attribute whitelist, span/ins flattening, heading ids
//!  ├─ 9. Tables      caption / thead.well / tbody, responsive wrapper
//!  └─ 10. Classes    user-defined per-tag classes, then serialisation
//! ```
//!
//! Steps 1 and 2–3 are independent and run concurrently in the async API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docx2html::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .custom_class("h2", "title is-4")
//!         .build()?;
//!     let output = convert("rapport.docx", &config).await?;
//!     println!("{}", output.html);
//!     eprintln!("{} titles, {} images", output.stats.titles_converted, output.stats.image_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docx2html` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-docx2html = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod dom;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_batch, BatchItem};
pub use config::{ConversionConfig, ConversionConfigBuilder, OutputMode};
pub use convert::{
    convert, convert_bytes, convert_document, convert_sync, convert_to_file, inspect,
    transform_html,
};
pub use error::{Docx2HtmlError, ExtractionError};
pub use output::{ConversionOutput, ConversionStats, DocumentInventory, ParagraphRecord};
pub use pipeline::classes::CustomClassMap;
pub use pipeline::render::{DocxHtmlConverter, HtmlConverter};
pub use pipeline::toc::TocEntry;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
