//! docx → HTML conversion: the converter seam and the built-in converter.
//!
//! The tree stages treat the converter as a black box that turns package
//! bytes into HTML with inline `data:` images. [`HtmlConverter`] is that
//! seam; callers can plug in any implementation through
//! [`crate::config::ConversionConfigBuilder::converter`].
//!
//! [`DocxHtmlConverter`] is the default. It reads `document.xml` together
//! with its relationships, `styles.xml` and `numbering.xml` and produces
//! semantic HTML only: headings from style names, lists from numbering
//! definitions, basic run formatting, links, tables and images. Layout
//! (fonts, colours, spacing, page geometry) is deliberately ignored.

use crate::config::ConversionConfig;
use crate::error::Docx2HtmlError;
use crate::pipeline::encode;
use crate::pipeline::package::{
    self, collect_block_nodes, find_blip_embed, find_imagedata_id, is_wml, resolve_target, wml,
    wml_attr, wml_bool, Package, DOCUMENT_PART, DOCUMENT_RELS_PART, NUMBERING_PART, STYLES_PART,
    WML_NS,
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use roxmltree::Node;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Turns the bytes of a `.docx` package into an HTML fragment.
///
/// Implementations are called from the blocking thread pool and must be
/// `Send + Sync`.
pub trait HtmlConverter: Send + Sync {
    /// Short name used in logs and in [`Docx2HtmlError::ConversionFailed`].
    fn name(&self) -> &str;

    /// Convert a whole package. Images are expected as `data:` URIs.
    fn convert(&self, docx: &[u8]) -> Result<String, Docx2HtmlError>;
}

/// The configured converter, or the built-in one.
pub fn resolve_converter(config: &ConversionConfig) -> Arc<dyn HtmlConverter> {
    match config.converter {
        Some(ref c) => Arc::clone(c),
        None => Arc::new(DocxHtmlConverter),
    }
}

/// Built-in semantic converter.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxHtmlConverter;

impl HtmlConverter for DocxHtmlConverter {
    fn name(&self) -> &str {
        "docx"
    }

    fn convert(&self, docx: &[u8]) -> Result<String, Docx2HtmlError> {
        let fail = |detail: String| Docx2HtmlError::ConversionFailed {
            converter: self.name().to_string(),
            detail,
        };

        let mut zip = package::open(docx).map_err(|e| fail(format!("not a zip package: {e}")))?;
        let xml_content = package::read_text(&mut zip, DOCUMENT_PART)
            .ok_or_else(|| fail(format!("missing {DOCUMENT_PART} (is this a .docx file?)")))?;
        let xml = roxmltree::Document::parse(&xml_content)
            .map_err(|e| fail(format!("malformed {DOCUMENT_PART}: {e}")))?;
        let body = wml(xml.root_element(), "body").ok_or_else(|| fail("missing w:body".into()))?;

        let rels = package::read_text(&mut zip, DOCUMENT_RELS_PART)
            .map(|x| package::parse_rels_xml(&x))
            .unwrap_or_default();
        let styles = package::read_text(&mut zip, STYLES_PART)
            .map(|x| parse_style_names(&x))
            .unwrap_or_default();
        let numbering = package::read_text(&mut zip, NUMBERING_PART)
            .map(|x| Numbering::parse(&x))
            .unwrap_or_default();

        let mut writer = HtmlWriter {
            zip,
            rels,
            styles,
            numbering,
            images: 0,
        };
        let mut out = String::new();
        writer.write_blocks(body, &mut out);
        debug!(
            "{} converter: {} bytes of HTML, {} inline images",
            self.name(),
            out.len(),
            writer.images
        );
        Ok(out)
    }
}

// ── Styles & numbering ───────────────────────────────────────────────────

/// styleId → display name, lower-cased.
fn parse_style_names(xml_content: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return names;
    };
    for style in xml.root_element().children().filter(|n| is_wml(*n, "style")) {
        if let (Some(id), Some(name)) = (style.attribute((WML_NS, "styleId")), wml_attr(style, "name")) {
            names.insert(id.to_string(), name.to_lowercase());
        }
    }
    names
}

/// Heading level of a style name or id (`heading 2`, `Titre3`, `Title`).
fn heading_level(style: &str) -> Option<u8> {
    let name = style.trim().to_lowercase();
    if name == "title" || name == "titre" {
        return Some(1);
    }
    for prefix in ["heading", "titre"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if let Ok(level) = rest.trim().parse::<u8>() {
                if (1..=6).contains(&level) {
                    return Some(level);
                }
            }
        }
    }
    None
}

#[derive(Debug, Default)]
struct Numbering {
    /// abstractNumId → (ilvl → numFmt)
    abstract_nums: HashMap<String, HashMap<usize, String>>,
    /// numId → abstractNumId
    num_to_abstract: HashMap<String, String>,
}

impl Numbering {
    fn parse(xml_content: &str) -> Self {
        let mut numbering = Self::default();
        let Ok(xml) = roxmltree::Document::parse(xml_content) else {
            return numbering;
        };
        for node in xml.root_element().children() {
            if is_wml(node, "abstractNum") {
                let Some(abs_id) = node.attribute((WML_NS, "abstractNumId")) else {
                    continue;
                };
                let levels = node
                    .children()
                    .filter(|l| is_wml(*l, "lvl"))
                    .filter_map(|lvl| {
                        let ilvl = lvl.attribute((WML_NS, "ilvl"))?.parse::<usize>().ok()?;
                        let fmt = wml_attr(lvl, "numFmt").unwrap_or("bullet").to_string();
                        Some((ilvl, fmt))
                    })
                    .collect();
                numbering.abstract_nums.insert(abs_id.to_string(), levels);
            } else if is_wml(node, "num") {
                if let (Some(num_id), Some(abs_id)) =
                    (node.attribute((WML_NS, "numId")), wml_attr(node, "abstractNumId"))
                {
                    numbering
                        .num_to_abstract
                        .insert(num_id.to_string(), abs_id.to_string());
                }
            }
        }
        numbering
    }

    /// `ul` for bullets (or unknown numbering), `ol` for any counter format.
    fn list_tag(&self, num_id: &str, ilvl: usize) -> &'static str {
        let fmt = self
            .num_to_abstract
            .get(num_id)
            .and_then(|abs| self.abstract_nums.get(abs))
            .and_then(|levels| levels.get(&ilvl));
        match fmt.map(String::as_str) {
            None | Some("bullet") | Some("none") => "ul",
            Some(_) => "ol",
        }
    }
}

/// `(numId, ilvl)` of a numbered paragraph.
fn num_pr<'a>(ppr: Node<'a, 'a>) -> Option<(&'a str, usize)> {
    let num = wml(ppr, "numPr")?;
    let num_id = wml_attr(num, "numId")?;
    if num_id == "0" {
        return None;
    }
    let ilvl = wml_attr(num, "ilvl")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
        .min(8);
    Some((num_id, ilvl))
}

// ── Inline formatting ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunFormat {
    bold: bool,
    italic: bool,
    strike: bool,
    superscript: bool,
    subscript: bool,
}

impl RunFormat {
    fn from_rpr(rpr: Node) -> Self {
        let vert = wml_attr(rpr, "vertAlign");
        Self {
            bold: wml_bool(rpr, "b"),
            italic: wml_bool(rpr, "i"),
            strike: wml_bool(rpr, "strike") || wml_bool(rpr, "dstrike"),
            superscript: vert == Some("superscript"),
            subscript: vert == Some("subscript"),
        }
    }

    fn wrap(&self, inner: &str) -> String {
        let mut html = inner.to_string();
        for (on, tag) in [
            (self.subscript, "sub"),
            (self.superscript, "sup"),
            (self.strike, "s"),
            (self.italic, "em"),
            (self.bold, "strong"),
        ] {
            if on {
                html = format!("<{tag}>{html}</{tag}>");
            }
        }
        html
    }
}

/// A piece of already-escaped inline HTML carrying one run format.
struct Segment {
    format: RunFormat,
    html: String,
}

/// Join segments, merging neighbours with identical formatting so adjacent
/// bold runs produce one `<strong>`.
fn render_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < segments.len() {
        let format = segments[i].format;
        let mut merged = String::new();
        while i < segments.len() && segments[i].format == format {
            merged.push_str(&segments[i].html);
            i += 1;
        }
        out.push_str(&format.wrap(&merged));
    }
    out
}

// ── Lists ────────────────────────────────────────────────────────────────

/// Open `ul`/`ol` elements, innermost last. Each open list has an open `li`.
#[derive(Default)]
struct ListStack {
    open: Vec<&'static str>,
}

impl ListStack {
    fn open_item(&mut self, level: usize, tag: &'static str, out: &mut String) {
        while self.open.len() > level + 1 {
            self.close_one(out);
        }
        if self.open.len() == level + 1 {
            if self.open.last() == Some(&tag) {
                out.push_str("</li>");
            } else {
                self.close_one(out);
            }
        }
        while self.open.len() < level {
            self.open.push(tag);
            out.push_str(&format!("<{tag}><li>"));
        }
        if self.open.len() == level {
            self.open.push(tag);
            out.push_str(&format!("<{tag}>"));
        }
        out.push_str("<li>");
    }

    fn close_one(&mut self, out: &mut String) {
        if let Some(tag) = self.open.pop() {
            out.push_str(&format!("</li></{tag}>"));
        }
    }

    fn close_all(&mut self, out: &mut String) {
        while !self.open.is_empty() {
            self.close_one(out);
        }
    }
}

// ── Writer ───────────────────────────────────────────────────────────────

struct HtmlWriter<'z> {
    zip: Package<'z>,
    rels: HashMap<String, String>,
    styles: HashMap<String, String>,
    numbering: Numbering,
    images: usize,
}

impl HtmlWriter<'_> {
    fn write_blocks<'a>(&mut self, parent: Node<'a, 'a>, out: &mut String) {
        let mut lists = ListStack::default();
        for block in collect_block_nodes(parent) {
            if is_wml(block, "p") {
                self.write_paragraph(block, &mut lists, out);
            } else if is_wml(block, "tbl") {
                lists.close_all(out);
                self.write_table(block, out);
            }
        }
        lists.close_all(out);
    }

    fn write_paragraph<'a>(&mut self, p: Node<'a, 'a>, lists: &mut ListStack, out: &mut String) {
        let ppr = wml(p, "pPr");
        let heading = ppr
            .and_then(|pr| wml_attr(pr, "pStyle"))
            .and_then(|id| heading_level(self.styles.get(id).map(String::as_str).unwrap_or(id)));

        let mut segments = Vec::new();
        self.collect_inline(p, &mut segments);
        let body = render_segments(&segments);

        if let Some(level) = heading {
            lists.close_all(out);
            if !body.trim().is_empty() {
                out.push_str(&format!("<h{level}>{body}</h{level}>"));
            }
            return;
        }

        if let Some((num_id, ilvl)) = ppr.and_then(num_pr) {
            let tag = self.numbering.list_tag(num_id, ilvl);
            lists.open_item(ilvl, tag, out);
            out.push_str(&body);
            return;
        }

        lists.close_all(out);
        if !body.trim().is_empty() {
            out.push_str(&format!("<p>{body}</p>"));
        }
    }

    fn collect_inline<'a>(&mut self, node: Node<'a, 'a>, segments: &mut Vec<Segment>) {
        for child in node.children().filter(|n| n.is_element()) {
            if child.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match child.tag_name().name() {
                "r" => self.write_run(child, segments),
                "hyperlink" => {
                    let mut inner = Vec::new();
                    self.collect_inline(child, &mut inner);
                    let body = render_segments(&inner);
                    if body.is_empty() {
                        continue;
                    }
                    let href = child
                        .attribute((package::REL_NS, "id"))
                        .and_then(|id| self.rels.get(id).cloned())
                        .or_else(|| child.attribute((WML_NS, "anchor")).map(|a| format!("#{a}")));
                    let html = match href {
                        Some(h) => format!(r#"<a href="{}">{body}</a>"#, encode_double_quoted_attribute(&h)),
                        None => body,
                    };
                    segments.push(Segment {
                        format: RunFormat::default(),
                        html,
                    });
                }
                "ins" => {
                    let mut inner = Vec::new();
                    self.collect_inline(child, &mut inner);
                    let body = render_segments(&inner);
                    if !body.is_empty() {
                        segments.push(Segment {
                            format: RunFormat::default(),
                            html: format!("<ins>{body}</ins>"),
                        });
                    }
                }
                "smartTag" | "customXml" | "fldSimple" | "moveTo" => {
                    self.collect_inline(child, segments)
                }
                "sdt" => {
                    if let Some(content) = wml(child, "sdtContent") {
                        self.collect_inline(content, segments);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_run<'a>(&mut self, run: Node<'a, 'a>, segments: &mut Vec<Segment>) {
        let format = wml(run, "rPr").map(RunFormat::from_rpr).unwrap_or_default();
        let mut html = String::new();
        for child in run.children().filter(|n| n.is_element()) {
            let name = child.tag_name().name();
            if child.tag_name().namespace() != Some(WML_NS) {
                if name == "AlternateContent" {
                    if let Some(img) = self.alternate_content_image(child) {
                        html.push_str(&img);
                    }
                }
                continue;
            }
            match name {
                "t" => html.push_str(&encode_text(child.text().unwrap_or(""))),
                "tab" => html.push('\t'),
                "noBreakHyphen" => html.push('-'),
                "br" | "cr" => {
                    if child
                        .attribute((WML_NS, "type"))
                        .is_none_or(|t| t == "textWrapping")
                    {
                        html.push_str("<br/>");
                    }
                }
                "drawing" => {
                    if let Some(img) = self.drawing_image(child) {
                        html.push_str(&img);
                    }
                }
                "pict" | "object" => {
                    if let Some(img) = find_imagedata_id(child).and_then(|id| self.image_tag(id, None)) {
                        html.push_str(&img);
                    }
                }
                _ => {}
            }
        }
        if !html.is_empty() {
            segments.push(Segment { format, html });
        }
    }

    fn drawing_image<'a>(&mut self, drawing: Node<'a, 'a>) -> Option<String> {
        let embed = find_blip_embed(drawing)?;
        let alt = drawing
            .descendants()
            .find(|n| n.tag_name().name() == "docPr")
            .and_then(|n| n.attribute("descr"));
        self.image_tag(embed, alt)
    }

    /// `mc:AlternateContent`: prefer the DrawingML choice, else the VML fallback.
    fn alternate_content_image<'a>(&mut self, alt: Node<'a, 'a>) -> Option<String> {
        let branch = |name: &str| alt.children().find(|n| n.tag_name().name() == name);
        if let Some(drawing) = branch("Choice")
            .and_then(|c| c.descendants().find(|n| is_wml(*n, "drawing")))
        {
            return self.drawing_image(drawing);
        }
        branch("Fallback")
            .and_then(find_imagedata_id)
            .and_then(|id| self.image_tag(id, None))
    }

    fn image_tag(&mut self, rel_id: &str, alt: Option<&str>) -> Option<String> {
        let path = resolve_target(self.rels.get(rel_id)?);
        let bytes = package::read_bytes(&mut self.zip, &path)?;
        let uri = encode::data_uri(&bytes, &path);
        self.images += 1;
        Some(match alt.filter(|a| !a.is_empty()) {
            Some(a) => format!(r#"<img src="{uri}" alt="{}" />"#, encode_double_quoted_attribute(a)),
            None => format!(r#"<img src="{uri}" />"#),
        })
    }

    fn write_table<'a>(&mut self, tbl: Node<'a, 'a>, out: &mut String) {
        let rows: Vec<Node> = collect_block_nodes(tbl)
            .into_iter()
            .filter(|n| is_wml(*n, "tr"))
            .collect();
        let header_rows = rows
            .iter()
            .take_while(|r| {
                wml(**r, "trPr").is_some_and(|pr| wml_bool(pr, "tblHeader"))
            })
            .count();

        out.push_str("<table>");
        if header_rows > 0 {
            out.push_str("<thead>");
            for row in &rows[..header_rows] {
                self.write_row(*row, "th", out);
            }
            out.push_str("</thead>");
        }
        for row in &rows[header_rows..] {
            self.write_row(*row, "td", out);
        }
        out.push_str("</table>");
    }

    fn write_row<'a>(&mut self, row: Node<'a, 'a>, cell_tag: &str, out: &mut String) {
        out.push_str("<tr>");
        for cell in collect_block_nodes(row).into_iter().filter(|n| is_wml(*n, "tc")) {
            let span = wml(cell, "tcPr")
                .and_then(|pr| wml_attr(pr, "gridSpan"))
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|&n| n > 1);
            match span {
                Some(n) => out.push_str(&format!(r#"<{cell_tag} colspan="{n}">"#)),
                None => out.push_str(&format!("<{cell_tag}>")),
            }
            self.write_blocks(cell, out);
            out.push_str(&format!("</{cell_tag}>"));
        }
        out.push_str("</tr>");
    }
}
