//! Structural inventory: per-paragraph text and image counts read directly
//! from `word/document.xml`.
//!
//! The converter's HTML may lose images or merge paragraphs; the inventory is
//! the independent view the image reconciler compares it against. Every `w:p`
//! descendant of the document counts, including paragraphs nested in tables,
//! text boxes and content controls, in document order.

use crate::error::ExtractionError;
use crate::output::{DocumentInventory, ParagraphRecord};
use crate::pipeline::package::{self, is_wml, DOCUMENT_PART};
use tracing::debug;

/// Read the structural inventory of a `.docx` package held in memory.
pub fn extract(bytes: &[u8]) -> Result<DocumentInventory, ExtractionError> {
    let mut zip = package::open(bytes).map_err(|e| ExtractionError::OpenPackage {
        detail: e.to_string(),
    })?;

    let xml_content =
        package::read_text(&mut zip, DOCUMENT_PART).ok_or_else(|| ExtractionError::MissingPart {
            part: DOCUMENT_PART.to_string(),
        })?;

    let inventory = extract_from_xml(&xml_content)?;
    debug!(
        "Inventory: {} paragraphs, {} expected images",
        inventory.len(),
        inventory.expected_images()
    );
    Ok(inventory)
}

/// Build the inventory from the text of `word/document.xml`.
pub fn extract_from_xml(xml_content: &str) -> Result<DocumentInventory, ExtractionError> {
    let xml =
        roxmltree::Document::parse(xml_content).map_err(|e| ExtractionError::MalformedXml {
            part: DOCUMENT_PART.to_string(),
            detail: e.to_string(),
        })?;

    let records = xml
        .descendants()
        .filter(|n| is_wml(*n, "p"))
        .enumerate()
        .map(|(index, para)| {
            let text: String = para
                .descendants()
                .filter(|n| is_wml(*n, "t"))
                .filter_map(|n| n.text())
                .collect();
            let image_count = para
                .descendants()
                .filter(|n| is_wml(*n, "drawing") || is_wml(*n, "object"))
                .count();
            ParagraphRecord {
                index,
                text: text.trim().to_string(),
                has_image: image_count > 0,
                image_count,
            }
        })
        .collect();

    Ok(DocumentInventory::new(records))
}
