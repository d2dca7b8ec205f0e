//! Pipeline stages for Word-to-HTML conversion.
//!
//! Each submodule implements exactly one transformation step over either
//! the package bytes, the raw HTML string, or the parsed [`Dom`].
//!
//! ## Data Flow
//!
//! ```text
//! bytes ─┬─▶ inventory ──────────────────────────────────┐
//!        └─▶ render ──▶ strip ──▶ Dom                     │
//!   headings ──▶ typography ──▶ toc ──▶ images ◀─────────┘
//!   ──▶ sanitize ──▶ tables ──▶ classes ──▶ serialize
//! ```
//!
//! 1. [`input`] reads the file and checks the zip magic
//! 2. [`inventory`] reads per-paragraph text and image counts straight from
//!    `word/document.xml`
//! 3. [`render`] turns the package into HTML with inline `data:` images
//!    (pluggable through [`render::HtmlConverter`]; [`encode`] builds the URIs)
//! 4. [`strip`] replaces large inline images by numbered placeholders before
//!    the HTML is parsed
//! 5. [`transform`] runs the tree stages in their fixed order on one
//!    exclusively owned [`Dom`]
//!
//! The stages after parsing are synchronous and CPU-bound; the async API runs
//! them on the blocking pool.

pub mod classes;
pub mod encode;
pub mod headings;
pub mod images;
pub mod input;
pub mod inventory;
pub(crate) mod package;
pub mod render;
pub mod sanitize;
pub mod serialize;
pub mod strip;
pub mod tables;
pub mod toc;
pub mod typography;

use crate::config::ConversionConfig;
use crate::dom::Dom;
use crate::output::{ConversionStats, DocumentInventory};
use toc::TocEntry;
use tracing::debug;

/// Result of the tree stages over one document.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub html: String,
    /// Every counter except `images_stripped` and `total_duration_ms`, which
    /// belong to the caller.
    pub stats: ConversionStats,
    pub toc: Option<Vec<TocEntry>>,
}

/// Run the tree stages over already-stripped HTML.
pub fn transform(
    html: &str,
    inventory: &DocumentInventory,
    name: &str,
    config: &ConversionConfig,
) -> TransformOutput {
    let mut dom = Dom::parse_fragment(html);

    let titles_converted = headings::promote(&mut dom);
    let typography = typography::normalize(&mut dom);
    let toc = toc::rebuild(&mut dom);
    let images_inserted = images::reconcile(&mut dom, inventory, config);
    let sanitized = sanitize::clean(&mut dom);
    let tables_processed = tables::restructure(&mut dom, config);
    let captions_from_lists = if config.list_captions {
        tables::captions_from_lists(&mut dom)
    } else {
        0
    };
    let custom_classes_applied = classes::apply(&mut dom, &config.custom_classes);

    let stats = ConversionStats {
        image_count: dom.select(&["img"]).len(),
        titles_converted,
        apostrophes_changed: typography.apostrophes_changed,
        hyphen_words_wrapped: typography.hyphen_words_wrapped,
        toc_converted: toc.is_some(),
        tables_processed,
        titles_with_id: sanitized.titles_with_id,
        paragraph_count: inventory.len(),
        images_inserted,
        captions_from_lists,
        custom_classes_applied,
        ..Default::default()
    };
    debug!("Transform stats for '{}': {:?}", name, stats);

    TransformOutput {
        html: serialize::render_output(&dom, name, config.output_mode),
        stats,
        toc,
    }
}
