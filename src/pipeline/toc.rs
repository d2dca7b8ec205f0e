//! Table-of-contents reconstruction.
//!
//! Word's automatic tables of contents rarely survive conversion as anything
//! useful: page numbers, tab leaders and field codes end up as loose text in
//! a list. This stage finds the first heading titled like a table of
//! contents, takes the first list that follows it, and rewrites that list as
//! a clean numbered hierarchy of in-page anchors:
//!
//! ```text
//! <ul>
//!   <li><a href="#1">1. Chapter A</a>
//!     <ul>
//!       <li><a href="#1.1">1.1 Part 1</a></li>
//!       <li><a href="#1.2">1.2 Part 2</a></li>
//!     </ul>
//!   </li>
//!   <li><a href="#2">2. Chapter B</a></li>
//! </ul>
//! ```
//!
//! The anchors line up with the ids the sanitizer later gives numbered `h2`
//! headings. At most one list is converted per document.

use crate::dom::{Dom, NodeId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const LIST_TAGS: &[&str] = &["ul", "ol"];

/// Normalised titles that identify a table of contents.
const TOC_TITLES: &[&str] = &["table des matieres", "table of contents"];

/// Deepest level rebuilt.
pub const MAX_DEPTH: usize = 3;

static RE_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+){0,2})(\.?)(\s*)").unwrap());

/// One rebuilt table-of-contents item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Dot-joined composite number, e.g. `2.1`.
    pub number: String,
    /// Target of the anchor (without `#`).
    pub anchor_id: String,
    /// Visible anchor text, e.g. `2. Chapter B` or `2.1 Part 1`.
    pub label: String,
    pub children: Vec<TocEntry>,
}

/// Rebuild the first table-of-contents list. `None` when nothing was converted.
pub fn rebuild(dom: &mut Dom) -> Option<Vec<TocEntry>> {
    let heading = dom
        .select(HEADING_TAGS)
        .into_iter()
        .find(|&h| is_toc_title(&dom.text_content(h)))?;

    let Some(list) = dom
        .following_siblings(heading)
        .into_iter()
        .find(|&s| dom.is_one_of(s, LIST_TAGS))
    else {
        debug!("TOC heading found but no list follows it");
        return None;
    };

    dom.set_tag(list, "ul");
    let entries = rebuild_level(dom, list, "", 1);
    debug!("Rebuilt TOC with {} top-level entries", entries.len());
    Some(entries)
}

/// Whether a heading text names a table of contents, ignoring case,
/// diacritics and spacing.
pub fn is_toc_title(text: &str) -> bool {
    let normalized = normalize_title(text);
    TOC_TITLES.iter().any(|t| normalized.contains(t))
}

fn normalize_title(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip leading `1`, `1.2`, `1.2.3` numbering (with optional trailing dot).
///
/// A prefix glued to the title (`1.Intro`, `2.1Contexte`) is stripped when it
/// carries a dot; a bare number must be followed by whitespace or end the
/// text, so `3D printing` keeps its `3`.
fn strip_number_prefix(text: &str) -> String {
    let mut current = text.trim();
    while let Some(caps) = RE_NUMBER_PREFIX.captures(current) {
        let whole = caps.get(0).map_or(0, |m| m.end());
        let dotted = caps[1].contains('.') || !caps[2].is_empty();
        let separated = !caps[3].is_empty() || whole == current.len();
        if !(dotted || separated) {
            break;
        }
        current = current[whole..].trim_start();
    }
    current.to_string()
}

/// Text of `li` excluding any nested list.
fn own_text(dom: &Dom, li: NodeId) -> String {
    let mut text = String::new();
    let mut stack: Vec<NodeId> = dom.children(li).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if dom.is_one_of(node, LIST_TAGS) {
            continue;
        }
        if let Some(t) = dom.text(node) {
            text.push_str(t);
        }
        stack.extend(dom.children(node).iter().rev().copied());
    }
    text
}

fn rebuild_level(dom: &mut Dom, list: NodeId, parent_number: &str, level: usize) -> Vec<TocEntry> {
    let items: Vec<NodeId> = dom
        .child_elements(list)
        .into_iter()
        .filter(|&c| dom.is_tag(c, "li"))
        .collect();

    let mut entries = Vec::new();
    for li in items {
        let collapsed = own_text(dom, li).split_whitespace().collect::<Vec<_>>().join(" ");
        let text = strip_number_prefix(&collapsed);
        if text.is_empty() {
            dom.detach(li);
            continue;
        }

        let number = if parent_number.is_empty() {
            (entries.len() + 1).to_string()
        } else {
            format!("{parent_number}.{}", entries.len() + 1)
        };
        let label = if level == 1 {
            format!("{number}. {text}")
        } else {
            format!("{number} {text}")
        };

        let nested = dom
            .children(li)
            .iter()
            .copied()
            .find(|&c| dom.is_one_of(c, LIST_TAGS));
        let (children, sublist) = match nested {
            Some(n) if level < MAX_DEPTH => {
                let children = rebuild_level(dom, n, &number, level + 1);
                let fresh = dom.create_element("ul");
                for item in dom.child_elements(n) {
                    if dom.is_tag(item, "li") {
                        dom.append(fresh, item);
                    }
                }
                (children, Some(fresh))
            }
            _ => (Vec::new(), None),
        };

        dom.clear_children(li);
        dom.clear_attrs(li);
        let href = format!("#{number}");
        let anchor = dom.create_element_with("a", &[("href", href.as_str())]);
        dom.set_text_content(anchor, label.clone());
        dom.append(li, anchor);
        if let Some(fresh) = sublist.filter(|_| !children.is_empty()) {
            dom.append(li, fresh);
        }

        entries.push(TocEntry {
            anchor_id: number.clone(),
            number,
            label,
            children,
        });
    }
    entries
}
