//! Shared helpers for reading parts out of a Word (OOXML) zip package.
//!
//! Both the inventory extractor and the built-in converter open the same
//! in-memory package; namespace constants and small `roxmltree` lookups live
//! here so the two agree on what a paragraph, a run or an image is.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const VML_NS: &str = "urn:schemas-microsoft-com:vml";

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const STYLES_PART: &str = "word/styles.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";

pub type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open an in-memory zip package.
pub fn open(bytes: &[u8]) -> Result<Package<'_>, zip::result::ZipError> {
    ZipArchive::new(Cursor::new(bytes))
}

/// Read a text part, `None` if absent or not UTF-8.
pub fn read_text(zip: &mut Package<'_>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Read a binary part, `None` if absent.
pub fn read_bytes(zip: &mut Package<'_>, name: &str) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    zip.by_name(name).ok()?.read_to_end(&mut data).ok()?;
    Some(data)
}

/// `true` if `node` is the WordprocessingML element `name`.
pub fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

/// First WordprocessingML child named `name`.
pub fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

/// `w:val` of the child `child`.
pub fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// A WML toggle property (`w:b`, `w:i`, …). Present without `w:val`, or with a
/// value other than `0`/`false`/`none`, means on.
pub fn wml_bool(parent: roxmltree::Node, name: &str) -> bool {
    wml(parent, name).is_some_and(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| v != "0" && v != "false" && v != "none")
    })
}

/// Relationship id → target, from a `.rels` part.
pub fn parse_rels_xml(xml_content: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return rels;
    };
    for node in xml.root_element().children() {
        if node.tag_name().name() == "Relationship" {
            if let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) {
                rels.insert(id.to_string(), target.to_string());
            }
        }
    }
    rels
}

/// Zip path of a relationship target relative to `word/`.
pub fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(abs) => abs.to_string(),
        None => {
            let mut parts: Vec<&str> = vec!["word"];
            for seg in target.split('/') {
                match seg {
                    ".." => {
                        parts.pop();
                    }
                    "." | "" => {}
                    s => parts.push(s),
                }
            }
            parts.join("/")
        }
    }
}

/// Flatten `w:sdt` wrappers: descend into `w:sdtContent` and collect the
/// effective children.
pub fn collect_block_nodes<'a>(parent: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if is_wml(child, "sdt") {
            if let Some(content) = wml(child, "sdtContent") {
                nodes.extend(collect_block_nodes(content));
            }
        } else if child.is_element() {
            nodes.push(child);
        }
    }
    nodes
}

/// `r:embed` of the first `a:blip` below `container`.
pub fn find_blip_embed<'a>(container: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    container
        .descendants()
        .find(|n| n.tag_name().name() == "blip" && n.tag_name().namespace() == Some(DML_NS))
        .and_then(|n| n.attribute((REL_NS, "embed")))
}

/// `r:id` of the first `v:imagedata` below `container`.
pub fn find_imagedata_id<'a>(container: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    container
        .descendants()
        .find(|n| n.tag_name().name() == "imagedata" && n.tag_name().namespace() == Some(VML_NS))
        .and_then(|n| n.attribute((REL_NS, "id")))
}
