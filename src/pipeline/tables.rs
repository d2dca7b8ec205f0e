//! Table restructuring for Bootstrap-styled output.
//!
//! Every table leaves this stage with the same shape:
//!
//! ```text
//! <div class="table-responsive">
//!   <table class="table table-bordered">
//!     <caption>…</caption>
//!     <thead class="well"><tr><th scope="col">…</th>…</tr></thead>
//!     <tbody><tr><td scope="row">…</td>…</tr>…</tbody>
//!   </table>
//! </div>
//! ```

use crate::config::ConversionConfig;
use crate::dom::{Dom, NodeId};
use tracing::debug;

pub const TABLE_CLASS: &str = "table table-bordered";
pub const HEADER_CLASS: &str = "well";
pub const WRAPPER_CLASS: &str = "table-responsive";

const ROW_GROUPS: &[&str] = &["thead", "tbody", "tfoot"];
const CELL_TAGS: &[&str] = &["td", "th"];

/// List captions at or above this length (in chars) are left alone.
const MAX_LIST_CAPTION_CHARS: usize = 100;

/// Restructure every table. Returns the number of tables processed.
pub fn restructure(dom: &mut Dom, config: &ConversionConfig) -> usize {
    let tables = dom.select(&["table"]);
    for &table in &tables {
        restructure_table(dom, table, &config.table_caption);
    }
    debug!("Tables: {} restructured", tables.len());
    tables.len()
}

fn restructure_table(dom: &mut Dom, table: NodeId, default_caption: &str) {
    dom.set_attr(table, "class", TABLE_CLASS);

    let caption = match dom.child_by_tag(table, "caption") {
        Some(c) => c,
        None => {
            let c = dom.create_element("caption");
            dom.set_text_content(c, default_caption);
            c
        }
    };

    if dom.child_by_tag(table, "thead").is_none() {
        let thead = dom.create_element_with("thead", &[("class", HEADER_CLASS)]);
        if let Some(row) = first_row(dom, table) {
            for cell in dom.child_elements(row) {
                if dom.is_one_of(cell, CELL_TAGS) {
                    dom.set_tag(cell, "th");
                    dom.set_attr(cell, "scope", "col");
                }
            }
            dom.append(thead, row);
        }
        dom.append(table, thead);
    }

    let tbody = match dom.child_by_tag(table, "tbody") {
        Some(b) => b,
        None => {
            let b = dom.create_element("tbody");
            dom.append(table, b);
            b
        }
    };
    for child in dom.child_elements(table) {
        if dom.is_tag(child, "tr") {
            dom.append(tbody, child);
        }
    }

    reorder_children(dom, table, caption);

    for group in dom.child_elements(table) {
        if !dom.is_tag(group, "tbody") {
            continue;
        }
        for row in dom.child_elements(group) {
            let first_cell = dom
                .child_elements(row)
                .into_iter()
                .find(|&c| dom.is_one_of(c, CELL_TAGS));
            if let Some(cell) = first_cell {
                dom.set_attr(cell, "scope", "row");
            }
        }
    }

    let wrapped = dom
        .parent(table)
        .is_some_and(|p| dom.is_tag(p, "div") && dom.has_class(p, WRAPPER_CLASS));
    if !wrapped {
        let wrapper = dom.create_element_with("div", &[("class", WRAPPER_CLASS)]);
        dom.wrap(table, wrapper);
    }
}

/// First `tr` of the table, looking at direct rows and inside row groups.
fn first_row(dom: &Dom, table: NodeId) -> Option<NodeId> {
    dom.child_elements(table).into_iter().find_map(|child| {
        if dom.is_tag(child, "tr") {
            Some(child)
        } else if dom.is_one_of(child, ROW_GROUPS) {
            dom.child_by_tag(child, "tr")
        } else {
            None
        }
    })
}

/// Caption first, then `thead`, then `tbody` groups, then everything else.
fn reorder_children(dom: &mut Dom, table: NodeId, caption: NodeId) {
    let mut ordered: Vec<NodeId> = dom
        .child_elements(table)
        .into_iter()
        .filter(|&c| c != caption)
        .collect();
    ordered.sort_by_key(|&c| match dom.tag(c) {
        Some("thead") => 0,
        Some("tbody") => 1,
        _ => 2,
    });

    dom.clear_children(table);
    dom.append(table, caption);
    for child in ordered {
        dom.append(table, child);
    }
}

/// Turn a one-item list right before a table wrapper into that table's
/// caption. Returns the number of captions set.
pub fn captions_from_lists(dom: &mut Dom) -> usize {
    let mut converted = 0;
    for wrapper in dom.select(&["div"]) {
        if !dom.has_class(wrapper, WRAPPER_CLASS) {
            continue;
        }
        let Some(list) = dom.previous_element_sibling(wrapper) else {
            continue;
        };
        if !dom.is_one_of(list, &["ul", "ol"]) {
            continue;
        }
        let items = dom.child_elements(list);
        if items.len() != 1 || !dom.is_tag(items[0], "li") || is_toc_item(dom, items[0]) {
            continue;
        }
        let text = dom.text_content(list).trim().to_string();
        if text.is_empty() || text.chars().count() >= MAX_LIST_CAPTION_CHARS {
            continue;
        }
        let caption = dom
            .child_by_tag(wrapper, "table")
            .and_then(|t| dom.child_by_tag(t, "caption"));
        if let Some(caption) = caption {
            dom.set_text_content(caption, text);
            dom.detach(list);
            converted += 1;
        }
    }
    if converted > 0 {
        debug!("Tables: {} captions taken from lists", converted);
    }
    converted
}

/// A rebuilt table-of-contents item: its content is an in-page anchor.
fn is_toc_item(dom: &Dom, li: NodeId) -> bool {
    dom.child_elements(li).into_iter().any(|c| {
        dom.is_tag(c, "a") && dom.attr(c, "href").is_some_and(|h| h.starts_with('#'))
    })
}
