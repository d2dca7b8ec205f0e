//! Serialisation of the final tree.

use crate::config::OutputMode;
use crate::dom::Dom;

/// Stylesheet embedded in [`OutputMode::Document`] output.
pub const DOCUMENT_STYLESHEET: &str = r#"body {
    font-family: Georgia, "Times New Roman", serif;
    line-height: 1.6;
    max-width: 800px;
    margin: 0 auto;
    padding: 20px;
    color: #333;
    font-feature-settings: "liga", "kern";
    text-rendering: optimizeLegibility;
}
h2 {
    color: #2c3e50;
    font-size: 1.5em;
    margin: 25px 0 15px 0;
    padding-bottom: 8px;
    border-bottom: 2px solid #3498db;
    font-family: Arial, sans-serif;
}
.sample-img {
    max-width: 300px;
    height: auto;
    border: 2px solid #3498db;
    border-radius: 5px;
    display: block;
    margin: 15px 0;
    box-shadow: 0 2px 8px rgba(0,0,0,0.1);
}
.nowrap {
    white-space: nowrap;
    color: #2c3e50;
    font-weight: 500;
}
strong {
    font-weight: bold;
    color: #2c3e50;
}
p {
    margin: 12px 0;
    text-align: justify;
}
.table-responsive { overflow-x: auto; }
table { width: 100%; border-collapse: collapse; margin: 20px 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; font-weight: bold; }"#;

/// Render the tree as a fragment or as a standalone page titled after `name`.
pub fn render_output(dom: &Dom, name: &str, mode: OutputMode) -> String {
    let fragment = render_fragment(dom);
    match mode {
        OutputMode::Fragment => fragment,
        OutputMode::Document => render_document(&fragment, name),
    }
}

/// Top-level nodes, one per line, whitespace-only text dropped.
pub fn render_fragment(dom: &Dom) -> String {
    let root = dom.root();
    dom.children(root)
        .iter()
        .filter(|&&n| dom.text(n).is_none_or(|t| !t.trim().is_empty()))
        .map(|&n| dom.outer_html(n))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_document(body: &str, name: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{} - Converti</title>\n\
         <style>\n{}\n</style>\n\
         </head>\n\
         <body>\n{}\n</body>\n\
         </html>\n",
        html_escape::encode_text(name),
        DOCUMENT_STYLESHEET,
        body
    )
}
