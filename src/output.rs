//! Output types: the structural inventory, conversion statistics and the
//! assembled result of one conversion.

use crate::error::ExtractionError;
use crate::pipeline::toc::TocEntry;
use serde::{Deserialize, Serialize};

/// One `w:p` paragraph of `word/document.xml`, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    /// 0-based position among all paragraphs of the document body.
    pub index: usize,
    /// Concatenated `w:t` text, trimmed.
    pub text: String,
    /// `image_count > 0`.
    pub has_image: bool,
    /// Number of `w:drawing` and `w:object` elements in the paragraph.
    pub image_count: usize,
}

/// Ordered paragraph records read directly from the Word package.
///
/// Immutable once extracted. An empty inventory is valid and simply means the
/// reconciler has nothing to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInventory {
    records: Vec<ParagraphRecord>,
}

impl DocumentInventory {
    pub fn new(records: Vec<ParagraphRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ParagraphRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that carry at least one image.
    pub fn with_images(&self) -> impl Iterator<Item = &ParagraphRecord> {
        self.records.iter().filter(|r| r.has_image)
    }

    /// Total number of images the source document contains.
    pub fn expected_images(&self) -> usize {
        self.with_images().map(|r| r.image_count).sum()
    }
}

/// Summary counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// `img` elements in the final output.
    pub image_count: usize,
    /// Paragraphs promoted to `h2`.
    pub titles_converted: usize,
    /// Straight apostrophes replaced by `’`.
    pub apostrophes_changed: usize,
    /// Hyphenated words wrapped in `span.nowrap`.
    pub hyphen_words_wrapped: usize,
    /// Whether a table-of-contents list was rebuilt.
    pub toc_converted: bool,
    /// Tables restructured.
    pub tables_processed: usize,
    /// `h2` elements carrying an `id` in the final output.
    pub titles_with_id: usize,
    /// Records in the structural inventory.
    pub paragraph_count: usize,
    /// Inline `data:` images replaced by placeholders before parsing.
    pub images_stripped: usize,
    /// Placeholder images inserted by the reconciler.
    pub images_inserted: usize,
    /// One-item lists turned into table captions.
    pub captions_from_lists: usize,
    /// Elements whose class list was extended by the custom class map.
    pub custom_classes_applied: usize,
    /// Wall-clock time of the conversion.
    pub total_duration_ms: u64,
}

/// The result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Cleaned HTML (fragment or document, see [`crate::config::OutputMode`]).
    pub html: String,
    pub stats: ConversionStats,
    /// The inventory the reconciler worked from.
    pub inventory: DocumentInventory,
    /// The rebuilt table of contents, when one was found.
    pub toc: Option<Vec<TocEntry>>,
    /// Set when the inventory could not be read and an empty one was used.
    pub inventory_error: Option<ExtractionError>,
}
