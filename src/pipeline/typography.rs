//! Typographic normalisation of text nodes.
//!
//! Two rules, applied to every visible text node:
//!
//! 1. straight apostrophes `'` become typographic `’`;
//! 2. hyphenated words (`porte-parole`, `Jean-Pierre`) are wrapped in
//!    `<span class="nowrap">` so browsers never break the line at the hyphen.
//!
//! Text already inside a `span.nowrap` is skipped, which makes the pass
//! idempotent.

use crate::dom::{Dom, NodeId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Add;
use tracing::debug;

pub const NOWRAP_CLASS: &str = "nowrap";

const TYPOGRAPHIC_APOSTROPHE: &str = "\u{2019}";

static RE_HYPHENATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-ZÀ-ÿ]+(?:-[a-zA-ZÀ-ÿ]+)+\b").unwrap());

/// Counters for one normalisation pass (or one text node).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypographyStats {
    pub apostrophes_changed: usize,
    pub hyphen_words_wrapped: usize,
}

impl Add for TypographyStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            apostrophes_changed: self.apostrophes_changed + rhs.apostrophes_changed,
            hyphen_words_wrapped: self.hyphen_words_wrapped + rhs.hyphen_words_wrapped,
        }
    }
}

/// Normalise every eligible text node of the tree.
pub fn normalize(dom: &mut Dom) -> TypographyStats {
    let eligible: Vec<NodeId> = dom
        .text_nodes()
        .into_iter()
        .filter(|&t| is_eligible(dom, t))
        .collect();
    let stats = eligible
        .into_iter()
        .map(|t| normalize_text_node(dom, t))
        .fold(TypographyStats::default(), Add::add);
    debug!(
        "Typography: {} apostrophes, {} hyphenated words",
        stats.apostrophes_changed, stats.hyphen_words_wrapped
    );
    stats
}

fn is_eligible(dom: &Dom, text: NodeId) -> bool {
    let in_raw = dom
        .parent(text)
        .is_some_and(|p| dom.is_one_of(p, &["script", "style"]));
    let in_nowrap = dom
        .ancestor_where(text, |a| dom.is_tag(a, "span") && dom.has_class(a, NOWRAP_CLASS))
        .is_some();
    !in_raw && !in_nowrap
}

/// Rewrite one text node in place, or splice it into text and `span` nodes.
fn normalize_text_node(dom: &mut Dom, id: NodeId) -> TypographyStats {
    let Some(original) = dom.text(id) else {
        return TypographyStats::default();
    };
    let apostrophes = original.matches('\'').count();
    let text = original.replace('\'', TYPOGRAPHIC_APOSTROPHE);

    let ranges: Vec<(usize, usize)> = RE_HYPHENATED
        .find_iter(&text)
        .map(|m| (m.start(), m.end()))
        .collect();

    if ranges.is_empty() {
        if apostrophes > 0 {
            dom.set_text(id, text);
        }
        return TypographyStats {
            apostrophes_changed: apostrophes,
            hyphen_words_wrapped: 0,
        };
    }

    let mut nodes = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut cursor = 0;
    for &(start, end) in &ranges {
        if start > cursor {
            nodes.push(dom.create_text(&text[cursor..start]));
        }
        let span = dom.create_element_with("span", &[("class", NOWRAP_CLASS)]);
        let word = dom.create_text(&text[start..end]);
        dom.append(span, word);
        nodes.push(span);
        cursor = end;
    }
    if cursor < text.len() {
        nodes.push(dom.create_text(&text[cursor..]));
    }
    dom.splice(id, &nodes);

    TypographyStats {
        apostrophes_changed: apostrophes,
        hyphen_words_wrapped: ranges.len(),
    }
}
