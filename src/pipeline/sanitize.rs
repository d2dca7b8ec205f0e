//! Final clean-up of the tree before tables are restructured.
//!
//! Order matters and is fixed:
//!
//! 1. drop empty paragraphs (no text, no image inside, no image after them);
//! 2. unwrap every `div`;
//! 3. strip presentational attributes outside the whitelist;
//! 4. reduce spans to the single `nowrap` form;
//! 5. flatten `ins` and the remaining non-`nowrap` spans to text;
//! 6. give every `h2` a document-unique `id`.
//!
//! The table restructurer runs after this stage, so the `div.table-responsive`
//! wrappers it adds are never unwrapped here.

use crate::dom::{Dom, NodeId};
use crate::pipeline::typography::NOWRAP_CLASS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Elements that keep `style`, `class`, `id` and `name`.
const ATTRIBUTE_WHITELIST: &[&str] = &["img", "h2", "a", "ul", "ol", "li", "span"];

/// Attributes stripped from every other element.
const STRIPPED_ATTRIBUTES: &[&str] = &["style", "class", "id", "name"];

static RE_LEADING_NUMERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)*)").unwrap());

/// Counters for one sanitising pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub paragraphs_removed: usize,
    pub containers_unwrapped: usize,
    pub elements_flattened: usize,
    /// `h2` elements carrying an `id` once the pass is done.
    pub titles_with_id: usize,
}

/// Run every sanitising step in order.
pub fn clean(dom: &mut Dom) -> SanitizeStats {
    let stats = SanitizeStats {
        paragraphs_removed: remove_empty_paragraphs(dom),
        containers_unwrapped: unwrap_containers(dom),
        ..Default::default()
    };
    strip_attributes(dom);
    let elements_flattened = flatten_inline(dom);
    let titles_with_id = assign_heading_ids(dom);

    let stats = SanitizeStats {
        elements_flattened,
        titles_with_id,
        ..stats
    };
    debug!("Sanitize: {:?}", stats);
    stats
}

fn remove_empty_paragraphs(dom: &mut Dom) -> usize {
    let mut removed = 0;
    for p in dom.select(&["p"]) {
        let has_text = !dom.text_content(p).trim().is_empty();
        let has_img = !dom.select_within(p, &["img"]).is_empty();
        let img_after = dom
            .following_siblings(p)
            .into_iter()
            .any(|s| dom.is_tag(s, "img"));
        if !has_text && !has_img && !img_after {
            dom.detach(p);
            removed += 1;
        }
    }
    removed
}

fn unwrap_containers(dom: &mut Dom) -> usize {
    let divs = dom.select(&["div"]);
    for &div in &divs {
        dom.unwrap(div);
    }
    divs.len()
}

fn strip_attributes(dom: &mut Dom) {
    let root = dom.root();
    for el in dom.descendants(root) {
        let Some(tag) = dom.tag(el) else {
            continue;
        };
        if tag == "span" {
            sanitize_span(dom, el);
        } else if !ATTRIBUTE_WHITELIST.contains(&tag) {
            for attr in STRIPPED_ATTRIBUTES {
                dom.remove_attr(el, attr);
            }
        }
    }
}

/// Keep a span untouched only if its class is exactly `nowrap`. Otherwise
/// clear it, and re-mark it `nowrap` if its markup still mentions one.
fn sanitize_span(dom: &mut Dom, span: NodeId) {
    if dom.classes(span) == [NOWRAP_CLASS] {
        return;
    }
    dom.clear_attrs(span);
    if dom.outer_html(span).contains(NOWRAP_CLASS) {
        dom.set_attr(span, "class", NOWRAP_CLASS);
    }
}

/// Replace `ins` elements, then spans without `nowrap`, by their text.
fn flatten_inline(dom: &mut Dom) -> usize {
    let mut flattened = 0;
    for ins in dom.select(&["ins"]) {
        if dom.is_attached(ins) {
            dom.flatten_to_text(ins);
            flattened += 1;
        }
    }
    for span in dom.select(&["span"]) {
        if dom.is_attached(span) && !dom.has_class(span, NOWRAP_CLASS) {
            dom.flatten_to_text(span);
            flattened += 1;
        }
    }
    flattened
}

/// Give every `h2` without an id its leading numeral (`2.3`) or its 1-based
/// ordinal among `h2`s, suffixed `-2`, `-3`, … when already taken.
///
/// Numbered headings are served first so they keep the ids the rebuilt table
/// of contents links to.
fn assign_heading_ids(dom: &mut Dom) -> usize {
    let root = dom.root();
    let mut taken: HashSet<String> = dom
        .descendants(root)
        .into_iter()
        .filter_map(|n| dom.attr(n, "id").map(str::to_string))
        .collect();

    let headings = dom.select(&["h2"]);
    let (numbered, unnumbered): (Vec<_>, Vec<_>) = headings
        .iter()
        .enumerate()
        .filter(|&(_, &h2)| !dom.has_attr(h2, "id"))
        .map(|(ordinal, &h2)| {
            let numeral = RE_LEADING_NUMERAL
                .captures(&dom.text_content(h2))
                .map(|c| c[1].to_string());
            (h2, numeral.ok_or(ordinal + 1))
        })
        .partition(|(_, base)| base.is_ok());

    for (h2, base) in numbered.into_iter().chain(unnumbered) {
        let base = base.unwrap_or_else(|ordinal| ordinal.to_string());
        let id = unique_id(&base, &taken);
        taken.insert(id.clone());
        dom.set_attr(h2, "id", id);
    }

    headings.iter().filter(|&&h| dom.has_attr(h, "id")).count()
}

fn unique_id(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
