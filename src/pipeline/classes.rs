//! Custom per-tag classes appended after the pipeline.
//!
//! Users paste rules such as `h2` → `class="title is-4"` straight out of
//! their CMS templates, so rule values are normalised before use: a stray
//! `class=` prefix and quotes are dropped and the rest is split on
//! whitespace.

use crate::dom::Dom;
use crate::error::Docx2HtmlError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordered tag → class tokens rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomClassMap {
    rules: Vec<(String, Vec<String>)>,
}

impl CustomClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add classes for `tag`, merging with any rule already present for it.
    /// Rules with an empty tag or no tokens are ignored.
    pub fn insert(&mut self, tag: &str, classes: &str) {
        let tag = tag.trim().to_ascii_lowercase();
        let tokens = normalize_classes(classes);
        if tag.is_empty() || tokens.is_empty() {
            return;
        }
        match self.rules.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, existing)) => {
                for token in tokens {
                    if !existing.contains(&token) {
                        existing.push(token);
                    }
                }
            }
            None => self.rules.push((tag, tokens)),
        }
    }

    /// Parse `{"h2": "title is-4", "table": ["striped"]}`.
    pub fn from_json(json: &str) -> Result<Self, Docx2HtmlError> {
        let value: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| Docx2HtmlError::InvalidConfig(format!("Invalid class map JSON: {e}")))?;

        let mut map = Self::new();
        for (tag, classes) in value {
            match classes {
                serde_json::Value::String(s) => map.insert(&tag, &s),
                serde_json::Value::Array(items) => {
                    for item in items {
                        let serde_json::Value::String(s) = item else {
                            return Err(Docx2HtmlError::InvalidConfig(format!(
                                "Classes for '{tag}' must be strings"
                            )));
                        };
                        map.insert(&tag, &s);
                    }
                }
                other => {
                    return Err(Docx2HtmlError::InvalidConfig(format!(
                        "Classes for '{tag}' must be a string or a list, got {other}"
                    )))
                }
            }
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.rules.iter().map(|(t, c)| (t.as_str(), c.as_slice()))
    }
}

/// `class="a b"`, `'a b'` and `a  b` all give `["a", "b"]`.
fn normalize_classes(raw: &str) -> Vec<String> {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned
        .get(..6)
        .filter(|p| p.eq_ignore_ascii_case("class="))
        .and_then(|_| cleaned.get(6..))
    {
        cleaned = rest;
    }
    let cleaned = cleaned.replace(['"', '\''], " ");

    let mut tokens: Vec<String> = Vec::new();
    for token in cleaned.split_whitespace() {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Append configured classes to every matching element. Returns the number
/// of elements whose `class` changed.
pub fn apply(dom: &mut Dom, map: &CustomClassMap) -> usize {
    let mut changed = 0;
    for (tag, tokens) in map.iter() {
        for el in dom.select(&[tag]) {
            let mut classes: Vec<String> = dom.classes(el).into_iter().map(str::to_string).collect();
            let before = classes.len();
            for token in tokens {
                if !classes.contains(token) {
                    classes.push(token.clone());
                }
            }
            if classes.len() != before {
                dom.set_attr(el, "class", classes.join(" "));
                changed += 1;
            }
        }
    }
    if changed > 0 {
        debug!("Classes: {} elements updated", changed);
    }
    changed
}

/// Parse a serialised fragment, apply the map and serialise it back.
pub fn apply_to_html(html: &str, map: &CustomClassMap) -> String {
    if map.is_empty() {
        return html.to_string();
    }
    let mut dom = Dom::parse_fragment(html);
    apply(&mut dom, map);
    dom.to_html()
}
