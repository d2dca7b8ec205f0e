//! Image reconciliation between the inventory and the HTML tree.
//!
//! Converters silently drop some pictures (linked images, unsupported
//! formats, shapes). When the tree holds fewer `img` elements than the
//! inventory expects, placeholders are inserted after the block whose text
//! best resembles the paragraph that carried the image in the source.
//!
//! The match is a word-overlap heuristic, not an alignment: the first block
//! sharing any word longer than three characters with the first fifty
//! characters of the record wins. Blocks are never excluded explicitly; a
//! block that received placeholders is followed by an `img` and so is not
//! picked again.

use crate::config::ConversionConfig;
use crate::dom::{Dom, NodeId};
use crate::output::DocumentInventory;
use crate::pipeline::strip::{PLACEHOLDER_CLASS, PLACEHOLDER_STYLE};
use tracing::{debug, info};

const BLOCK_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Records and blocks shorter than this (in chars) are never matched.
const MIN_TEXT_CHARS: usize = 10;
/// Only this many leading chars of a record feed the candidate words.
const RECORD_PREFIX_CHARS: usize = 50;
/// Candidate words must be longer than this.
const MIN_WORD_CHARS: usize = 3;

/// Insert missing placeholder images. Returns the number inserted.
pub fn reconcile(dom: &mut Dom, inventory: &DocumentInventory, config: &ConversionConfig) -> usize {
    let expected = inventory.expected_images();
    let actual = dom.select(&["img"]).len();
    if actual >= expected {
        debug!("Images: {} present, {} expected; nothing to insert", actual, expected);
        return 0;
    }

    let blocks: Vec<(NodeId, String)> = dom
        .select(BLOCK_TAGS)
        .into_iter()
        .map(|b| (b, dom.text_content(b).trim().to_lowercase()))
        .collect();

    let mut total = actual;

    for record in inventory.with_images() {
        if total >= expected {
            break;
        }
        if record.text.is_empty() || record.text.chars().count() <= MIN_TEXT_CHARS {
            continue;
        }
        let words = candidate_words(&record.text);
        if words.is_empty() {
            continue;
        }

        let target = blocks.iter().find(|(block, text)| {
            text.chars().count() > MIN_TEXT_CHARS
                && words.iter().any(|w| text.contains(w.as_str()))
                && !followed_by_image(dom, *block)
        });
        let Some(&(block, _)) = target else {
            continue;
        };

        let mut anchor = block;
        for _ in 0..record.image_count {
            if total >= expected {
                break;
            }
            total += 1;
            let img = placeholder(dom, &config.placeholder_src, total);
            dom.insert_after(anchor, img);
            anchor = img;
        }
    }

    let inserted = total - actual;
    info!(
        "Images: {} present, {} expected, {} placeholders inserted",
        actual, expected, inserted
    );
    inserted
}

/// Lower-case words (> 3 chars) of the first 50 chars of a record.
fn candidate_words(text: &str) -> Vec<String> {
    let prefix: String = text.chars().take(RECORD_PREFIX_CHARS).collect();
    prefix
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_WORD_CHARS)
        .map(str::to_string)
        .collect()
}

fn followed_by_image(dom: &Dom, block: NodeId) -> bool {
    dom.next_element_sibling(block)
        .is_some_and(|s| dom.is_tag(s, "img"))
}

fn placeholder(dom: &mut Dom, src: &str, n: usize) -> NodeId {
    let alt = format!("Image {n}");
    dom.create_element_with(
        "img",
        &[
            ("src", src),
            ("alt", alt.as_str()),
            ("class", PLACEHOLDER_CLASS),
            ("style", PLACEHOLDER_STYLE),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ParagraphRecord;

    fn inventory(records: &[(&str, usize)]) -> DocumentInventory {
        DocumentInventory::new(
            records
                .iter()
                .enumerate()
                .map(|(index, (text, n))| ParagraphRecord {
                    index,
                    text: text.to_string(),
                    has_image: *n > 0,
                    image_count: *n,
                })
                .collect(),
        )
    }

    fn alts(dom: &Dom) -> Vec<String> {
        dom.select(&["img"])
            .into_iter()
            .filter_map(|i| dom.attr(i, "alt").map(str::to_string))
            .collect()
    }

    #[test]
    fn inserts_missing_images_after_matching_block() {
        let mut dom = Dom::parse_fragment(
            "<p>Le schéma du réseau électrique régional</p>\
             <img src=\"img_sample.jpg\" alt=\"Image 1\"/>\
             <p>Photographie du chantier principal</p><p>Fin</p>",
        );
        let inv = inventory(&[
            ("Le schéma du réseau électrique régional", 1),
            ("Photographie du chantier principal", 2),
        ]);
        let n = reconcile(&mut dom, &inv, &ConversionConfig::default());
        assert_eq!(n, 2);
        assert_eq!(alts(&dom), vec!["Image 1", "Image 2", "Image 3"]);
        let chantier = dom.select(&["p"])[1];
        let next = dom.next_element_sibling(chantier).unwrap();
        assert_eq!(dom.attr(next, "alt"), Some("Image 2"));
        assert_eq!(dom.attr(next, "src"), Some("img_sample.jpg"));
        assert_eq!(dom.attr(next, "class"), Some("sample-img"));
    }

    #[test]
    fn nothing_to_do_when_counts_match() {
        let mut dom = Dom::parse_fragment("<p>Légende de la figure</p><img src=\"a\"/>");
        let inv = inventory(&[("Légende de la figure", 1)]);
        assert_eq!(reconcile(&mut dom, &inv, &ConversionConfig::default()), 0);
    }

    #[test]
    fn short_records_and_blocks_are_ignored() {
        let mut dom = Dom::parse_fragment("<p>Logo</p><p>Courte</p>");
        let inv = inventory(&[("Logo", 1), ("Courte", 1)]);
        assert_eq!(reconcile(&mut dom, &inv, &ConversionConfig::default()), 0);
    }

    #[test]
    fn never_exceeds_expected_total() {
        let mut dom = Dom::parse_fragment("<p>Graphique des ventes annuelles</p>");
        let inv = inventory(&[("Graphique des ventes annuelles", 2), ("", 1)]);
        let n = reconcile(&mut dom, &inv, &ConversionConfig::default());
        assert_eq!(n, 2);
        assert_eq!(alts(&dom), vec!["Image 1", "Image 2"]);
    }

    #[test]
    fn block_already_followed_by_image_is_skipped() {
        let mut dom = Dom::parse_fragment(
            "<p>Carte de la région Occitanie</p><img src=\"x\"/>\
             <p>Autre carte de la région</p>",
        );
        let inv = inventory(&[("Carte de la région Occitanie", 2)]);
        let n = reconcile(&mut dom, &inv, &ConversionConfig::default());
        assert_eq!(n, 1);
        let second = dom.select(&["p"])[1];
        assert!(followed_by_image(&dom, second));
    }

    #[test]
    fn each_record_takes_the_next_free_block() {
        let mut dom = Dom::parse_fragment(
            "<p>Présentation générale du projet</p><p>Présentation détaillée du projet</p>",
        );
        let inv = inventory(&[
            ("Présentation générale du projet", 1),
            ("Présentation détaillée du projet", 1),
        ]);
        assert_eq!(reconcile(&mut dom, &inv, &ConversionConfig::default()), 2);
        let ps = dom.select(&["p"]);
        assert!(followed_by_image(&dom, ps[0]));
        assert!(followed_by_image(&dom, ps[1]));
    }

    #[test]
    fn candidate_words_use_first_fifty_chars() {
        let text = format!("{} motcléfinal", "a ".repeat(30));
        assert!(candidate_words(&text).is_empty());
        assert_eq!(candidate_words("Le grand Schéma"), vec!["grand", "schéma"]);
    }
}
