//! Heading promotion: bold-only short paragraphs become `<h2>`.
//!
//! Word authors often fake section titles with a bold paragraph instead of a
//! heading style. A paragraph is promoted when nearly all of its text is
//! emphasised and it reads like a title rather than a sentence or a call to
//! action.

use crate::dom::{Dom, NodeId};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const EMPHASIS_TAGS: &[&str] = &["strong", "b"];

/// Minimum share of emphasised characters.
const MIN_EMPHASIS_RATIO: f64 = 0.8;
/// Maximum title length, in characters.
const MAX_TITLE_CHARS: usize = 100;
/// Maximum number of whitespace-separated words.
const MAX_TITLE_WORDS: usize = 15;

/// Lower-case fragments that mark a call to action, never a title.
const ACTION_WORDS: &[&str] = &["cliquez", "voir", "télécharger", "lire", "plus d'info"];

static RE_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s*%").unwrap());
static RE_PRICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\d+").unwrap());

/// Promote qualifying `<p>` elements. Returns the number promoted.
pub fn promote(dom: &mut Dom) -> usize {
    let mut promoted = 0;
    for p in dom.select(&["p"]) {
        let total = dom.text_content(p).trim().to_string();
        let emphasis: usize = outermost_emphasis(dom, p)
            .into_iter()
            .map(|e| dom.text_content(e).trim().chars().count())
            .sum();

        if !looks_like_title(&total, emphasis) {
            continue;
        }

        let h2 = dom.create_element("h2");
        dom.set_text_content(h2, total);
        dom.replace(p, h2);
        promoted += 1;
    }
    debug!("Promoted {} paragraphs to h2", promoted);
    promoted
}

/// `strong`/`b` descendants of `p` with no emphasis ancestor below `p`.
fn outermost_emphasis(dom: &Dom, p: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = dom.children(p).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if dom.is_one_of(node, EMPHASIS_TAGS) {
            found.push(node);
        } else {
            stack.extend(dom.children(node).iter().rev().copied());
        }
    }
    found
}

/// The title rules, on the trimmed paragraph text and the emphasised length.
fn looks_like_title(total: &str, emphasis_chars: usize) -> bool {
    let total_chars = total.chars().count();
    if emphasis_chars == 0 || total_chars == 0 || total_chars > MAX_TITLE_CHARS {
        return false;
    }
    if (emphasis_chars as f64) / (total_chars as f64) < MIN_EMPHASIS_RATIO {
        return false;
    }
    if total.ends_with('.') || total.ends_with(',') {
        return false;
    }
    if total.split_whitespace().count() > MAX_TITLE_WORDS {
        return false;
    }
    let lower = total.to_lowercase();
    if ACTION_WORDS.iter().any(|w| lower.contains(w)) {
        return false;
    }
    !RE_PERCENT.is_match(total) && !RE_PRICE.is_match(total)
}
