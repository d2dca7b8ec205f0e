//! End-to-end tests for edgequake-docx2html.
//!
//! Every test builds a small `.docx` in memory (see `common/mod.rs`) and runs
//! it through the public API, built-in converter included.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

mod common;

use common::DocxBuilder;
use edgequake_docx2html::pipeline::classes::apply_to_html;
use edgequake_docx2html::{
    convert, convert_batch, convert_bytes, convert_document, transform_html, ConversionConfig,
    ConversionProgressCallback, ConversionStats, Docx2HtmlError, DocumentInventory,
    ExtractionError, HtmlConverter, OutputMode,
};
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn img_count(html: &str) -> usize {
    Html::parse_fragment(html).select(&sel("img")).count()
}

/// A converter that ignores the package and returns fixed HTML.
struct FixedHtml(&'static str);

impl HtmlConverter for FixedHtml {
    fn name(&self) -> &str {
        "fixed"
    }

    fn convert(&self, _docx: &[u8]) -> Result<String, Docx2HtmlError> {
        Ok(self.0.to_string())
    }
}

fn with_converter(html: &'static str) -> ConversionConfig {
    ConversionConfig::builder()
        .converter(Arc::new(FixedHtml(html)))
        .build()
        .unwrap()
}

struct PanickingConverter;

impl HtmlConverter for PanickingConverter {
    fn name(&self) -> &str {
        "panicking"
    }

    fn convert(&self, _docx: &[u8]) -> Result<String, Docx2HtmlError> {
        panic!("converter crashed")
    }
}

// ── Headings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bold_paragraph_is_promoted() {
    let bytes = DocxBuilder::new()
        .bold_paragraph("Section One")
        .bold_paragraph("50% off today only")
        .paragraph("Body text of the first section.")
        .build();

    let out = convert_bytes(bytes, "headings", &ConversionConfig::default())
        .await
        .unwrap();

    assert_eq!(out.stats.titles_converted, 1);
    assert!(out.html.contains(">Section One</h2>"), "got: {}", out.html);
    assert!(
        out.html.contains("<p><strong>50% off today only</strong></p>"),
        "got: {}",
        out.html
    );
}

// ── Table of contents ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_toc_is_renumbered_with_anchors() {
    let bytes = DocxBuilder::new()
        .heading(1, "Table des matières")
        .list_item(0, "Chapter A")
        .list_item(1, "Part 1")
        .list_item(1, "Part 2")
        .list_item(0, "Chapter B")
        .heading(2, "1. Chapter A")
        .paragraph("Premier chapitre.")
        .heading(2, "2. Chapter B")
        .paragraph("Second chapitre.")
        .build();

    let out = convert_bytes(bytes, "toc", &ConversionConfig::default())
        .await
        .unwrap();

    assert!(out.stats.toc_converted);
    for anchor in [
        r##"<a href="#1">1. Chapter A</a>"##,
        r##"<a href="#1.1">1.1 Part 1</a>"##,
        r##"<a href="#1.2">1.2 Part 2</a>"##,
        r##"<a href="#2">2. Chapter B</a>"##,
    ] {
        assert!(out.html.contains(anchor), "missing {anchor} in {}", out.html);
    }
    assert!(!out.html.contains("<ol"));
    assert!(out.html.contains(r#"<h2 id="1">1. Chapter A</h2>"#));
    assert!(out.html.contains(r#"<h2 id="2">2. Chapter B</h2>"#));

    let toc = out.toc.expect("toc entries");
    assert_eq!(toc.len(), 2);
    assert_eq!(toc[0].label, "1. Chapter A");
    let children: Vec<&str> = toc[0].children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(children, vec!["1.1 Part 1", "1.2 Part 2"]);
    assert!(toc[1].children.is_empty());
}

#[tokio::test]
async fn test_toc_heading_without_list_is_left_alone() {
    let bytes = DocxBuilder::new()
        .heading(1, "Table of Contents")
        .paragraph("Nothing to see here.")
        .build();
    let out = convert_bytes(bytes, "toc", &ConversionConfig::default())
        .await
        .unwrap();
    assert!(!out.stats.toc_converted);
    assert!(out.toc.is_none());
}

#[tokio::test]
async fn test_glued_toc_entry_before_a_table_is_not_a_caption() {
    let config = with_converter(
        "<h2>Table des matières</h2><ul><li>1.Introduction</li></ul>\
         <table><tr><td>a</td></tr></table>",
    );
    let bytes = DocxBuilder::new().paragraph("placeholder").build();
    let out = convert_bytes(bytes, "toc", &config).await.unwrap();

    assert!(out.stats.toc_converted);
    assert_eq!(out.stats.captions_from_lists, 0);
    assert!(
        out.html.contains(r##"<a href="#1">1. Introduction</a>"##),
        "got: {}",
        out.html
    );
    assert!(out.html.contains("<caption>(Tableau)</caption>"));
    assert_eq!(out.toc.expect("toc entries")[0].label, "1. Introduction");
}

// ── Images ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_images_are_reconciled() {
    let bytes = DocxBuilder::new()
        .paragraph("Introduction au réseau de distribution")
        .image_paragraph("", 1, 0)
        .image_paragraph("Photographie du bâtiment principal", 0, 2)
        .paragraph("Conclusion")
        .build();

    let out = convert_bytes(bytes, "images", &ConversionConfig::default())
        .await
        .unwrap();

    assert_eq!(out.inventory.expected_images(), 3);
    assert_eq!(out.stats.images_stripped, 1);
    assert_eq!(out.stats.images_inserted, 2);
    assert_eq!(out.stats.image_count, 3);
    assert_eq!(img_count(&out.html), 3);
    assert!(!out.html.contains("data:image"));

    let after_photo = out
        .html
        .split("<p>Photographie du bâtiment principal</p>")
        .nth(1)
        .expect("photo paragraph");
    let alt2 = after_photo.find(r#"alt="Image 2""#).expect("second placeholder");
    let alt3 = after_photo.find(r#"alt="Image 3""#).expect("third placeholder");
    assert!(alt2 < alt3);
    assert!(after_photo.find("Conclusion").is_some_and(|c| c > alt3));
}

#[tokio::test]
async fn test_no_placeholders_when_counts_match() {
    let bytes = DocxBuilder::new()
        .image_paragraph("Schéma général de l'installation", 1, 0)
        .build();
    let out = convert_bytes(bytes, "images", &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.stats.images_inserted, 0);
    assert_eq!(out.stats.image_count, 1);
}

// ── Sanitizer ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sanitized_output_respects_whitelist() {
    let config = with_converter(
        r#"<div class="WordSection1">
             <p class="MsoNormal" style="margin:0" id="p1">Texte <span style="color:red">rouge</span> et <span class="nowrap">demi-tarif</span></p>
             <h2 class="titre" style="color:blue">Objectifs</h2>
             <ul class="liste"><li style="margin:0">point</li></ul>
             <p><ins>ajouté</ins> ici</p>
             <p class="MsoNormal"> </p>
           </div>"#,
    );
    let bytes = DocxBuilder::new().paragraph("Texte rouge").build();
    let out = convert_bytes(bytes, "sanitize", &config).await.unwrap();

    let fragment = Html::parse_fragment(&out.html);
    let whitelist = ["img", "h2", "a", "ul", "ol", "li", "span"];
    for el in fragment.select(&sel("*")) {
        let name = el.value().name();
        if name == "span" {
            assert_eq!(el.value().attr("class"), Some("nowrap"), "span in {}", out.html);
            assert_eq!(el.value().attrs().count(), 1);
        } else if !whitelist.contains(&name) {
            for attr in ["class", "id", "style"] {
                assert!(el.value().attr(attr).is_none(), "<{name} {attr}> in {}", out.html);
            }
        }
    }
    assert!(!out.html.contains("<div"));
    assert!(!out.html.contains("<ins"));
    assert!(out.html.contains("<p>ajouté ici</p>"));
    assert_eq!(fragment.select(&sel("p")).count(), 2);
    assert_eq!(out.stats.titles_with_id, 1);
}

// ── Tables ───────────────────────────────────────────────────────────────────

fn element_children(el: ElementRef<'_>) -> Vec<String> {
    el.children()
        .filter_map(ElementRef::wrap)
        .map(|c| c.value().name().to_string())
        .collect()
}

#[tokio::test]
async fn test_tables_are_normalised() {
    let bytes = DocxBuilder::new()
        .paragraph("Résultats trimestriels")
        .table(&[&["Nom", "Valeur"], &["Alpha", "1"], &["Beta", "2"]])
        .paragraph("Entre deux tableaux")
        .table(&[&["Seul"]])
        .build();

    let out = convert_bytes(bytes, "tables", &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.stats.tables_processed, 2);

    let fragment = Html::parse_fragment(&out.html);
    let tables: Vec<ElementRef> = fragment.select(&sel("table")).collect();
    assert_eq!(tables.len(), 2);
    for table in &tables {
        let parent = table
            .parent()
            .and_then(ElementRef::wrap)
            .expect("table parent");
        assert_eq!(parent.value().name(), "div");
        assert_eq!(parent.value().attr("class"), Some("table-responsive"));
        assert_eq!(table.value().attr("class"), Some("table table-bordered"));
        assert_eq!(element_children(*table), vec!["caption", "thead", "tbody"]);
    }

    let first = tables[0];
    let caption = first.select(&sel("caption")).next().unwrap();
    assert_eq!(caption.text().collect::<String>(), "(Tableau)");
    let headers: Vec<ElementRef> = first.select(&sel("thead th")).collect();
    assert_eq!(headers.len(), 2);
    assert!(headers.iter().all(|h| h.value().attr("scope") == Some("col")));
    for row in first.select(&sel("tbody tr")) {
        let cell = row.children().filter_map(ElementRef::wrap).next().unwrap();
        assert_eq!(cell.value().attr("scope"), Some("row"));
    }
}

#[tokio::test]
async fn test_single_item_list_becomes_caption() {
    let bytes = DocxBuilder::new()
        .list_item(0, "Tableau 1 : Répartition des coûts")
        .table(&[&["Poste", "Montant"], &["Études", "1200"]])
        .build();

    let out = convert_bytes(bytes, "caption", &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.stats.captions_from_lists, 1);
    assert!(
        out.html
            .contains("<caption>Tableau 1 : Répartition des coûts</caption>"),
        "got: {}",
        out.html
    );
    assert!(!out.html.contains("<ol"));

    let config = ConversionConfig::builder().list_captions(false).build().unwrap();
    let bytes = DocxBuilder::new()
        .list_item(0, "Tableau 1 : Répartition des coûts")
        .table(&[&["Poste", "Montant"]])
        .build();
    let out = convert_document(&bytes, "caption", &config).unwrap();
    assert_eq!(out.stats.captions_from_lists, 0);
    assert!(out.html.contains("<caption>(Tableau)</caption>"));
}

// ── Typography ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_typography_is_idempotent() {
    let bytes = DocxBuilder::new()
        .paragraph("L'arc-en-ciel du porte-parole")
        .build();
    let config = ConversionConfig::default();
    let first = convert_bytes(bytes, "typo", &config).await.unwrap();

    assert_eq!(first.stats.apostrophes_changed, 1);
    assert_eq!(first.stats.hyphen_words_wrapped, 2);
    assert!(first.html.contains(
        r#"L’<span class="nowrap">arc-en-ciel</span> du <span class="nowrap">porte-parole</span>"#
    ));

    let second =
        transform_html(&first.html, &DocumentInventory::default(), "typo", &config).unwrap();
    assert_eq!(second.stats.apostrophes_changed, 0);
    assert_eq!(second.stats.hyphen_words_wrapped, 0);
    assert_eq!(
        Html::parse_fragment(&second.html).select(&sel("span.nowrap")).count(),
        2
    );
}

// ── Custom classes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_custom_classes_merge_without_duplicates() {
    let bytes = DocxBuilder::new()
        .heading(2, "Objectifs")
        .paragraph("Premier paragraphe.")
        .heading(2, "Méthode")
        .build();
    let config = ConversionConfig::builder()
        .custom_class("h2", "section-title")
        .custom_class("p", r#"class="lead text-muted""#)
        .build()
        .unwrap();

    let out = convert_bytes(bytes, "classes", &config).await.unwrap();
    let fragment = Html::parse_fragment(&out.html);
    let h2s: Vec<ElementRef> = fragment.select(&sel("h2")).collect();
    assert_eq!(h2s.len(), 2);
    assert!(h2s
        .iter()
        .all(|h| h.value().attr("class") == Some("section-title")));
    let p = fragment.select(&sel("p")).next().unwrap();
    assert_eq!(p.value().attr("class"), Some("lead text-muted"));
    assert_eq!(out.stats.custom_classes_applied, 3);

    let again = apply_to_html(&out.html, &config.custom_classes);
    assert_eq!(again.matches("section-title").count(), 2);
    assert_eq!(again.matches("lead").count(), 1);
}

// ── Output modes ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_document_mode_wraps_fragment() {
    let bytes = DocxBuilder::new().paragraph("Contenu du rapport.").build();
    let config = ConversionConfig::builder()
        .output_mode(OutputMode::Document)
        .build()
        .unwrap();

    let out = convert_bytes(bytes, "Rapport & annexes", &config).await.unwrap();
    assert!(out.html.starts_with("<!DOCTYPE html>"));
    assert!(out.html.contains("<title>Rapport &amp; annexes - Converti</title>"));
    assert!(out.html.contains("<style>"));
    assert!(out.html.contains("<body>\n<p>Contenu du rapport.</p>\n</body>"));
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_broken_inventory_is_not_fatal() {
    let config = with_converter("<p>Texte converti ailleurs</p>");
    let out = convert_bytes(b"not a zip".to_vec(), "broken", &config)
        .await
        .unwrap();
    assert!(matches!(
        out.inventory_error,
        Some(ExtractionError::OpenPackage { .. })
    ));
    assert!(out.inventory.is_empty());
    assert_eq!(out.html, "<p>Texte converti ailleurs</p>");
}

#[tokio::test]
async fn test_converter_failure_is_fatal() {
    let err = convert_bytes(b"PK\x03\x04garbage".to_vec(), "bad", &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Docx2HtmlError::ConversionFailed { .. }), "got: {err}");
}

#[tokio::test]
async fn test_converter_panic_is_reported_not_unwound() {
    let config = ConversionConfig::builder()
        .converter(Arc::new(PanickingConverter))
        .build()
        .unwrap();
    let bytes = DocxBuilder::new().paragraph("Texte").build();

    let err = convert_document(&bytes, "panic", &config).unwrap_err();
    assert!(matches!(err, Docx2HtmlError::TransformFailed { .. }), "got: {err}");

    let err = convert_bytes(bytes, "panic", &config).await.unwrap_err();
    assert!(matches!(err, Docx2HtmlError::TransformFailed { .. }), "got: {err}");
}

#[tokio::test]
async fn test_missing_file() {
    let err = convert("/nonexistent/rapport.docx", &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Docx2HtmlError::FileNotFound { .. }));
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Counter {
    started: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    succeeded: AtomicUsize,
}

impl ConversionProgressCallback for Counter {
    fn on_document_start(&self, _name: &str, _index: usize, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_complete(&self, _name: &str, _stats: &ConversionStats) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_error(&self, _name: &str, _error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_complete(&self, _total: usize, succeeded: usize) {
        self.succeeded.store(succeeded, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_batch_converts_each_input() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.docx");
    let b = dir.path().join("b.docx");
    let c = dir.path().join("c.docx");
    std::fs::write(&a, DocxBuilder::new().bold_paragraph("Premier titre").build()).unwrap();
    std::fs::write(&b, DocxBuilder::new().paragraph("Deuxième document.").build()).unwrap();
    std::fs::write(&c, b"plain text, not a package").unwrap();
    let out_dir = dir.path().join("html");

    let counter = Arc::new(Counter::default());
    let config = ConversionConfig::builder()
        .concurrency(2)
        .progress_callback(counter.clone())
        .build()
        .unwrap();

    let items = convert_batch(&[a.clone(), b, c], Some(&out_dir), &config).await;
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].input, a);
    assert!(items[0].is_ok());
    assert!(items[1].is_ok());
    assert!(matches!(items[2].error, Some(Docx2HtmlError::NotADocx { .. })));

    assert_eq!(items[0].stats.as_ref().unwrap().titles_converted, 1);
    let html = std::fs::read_to_string(out_dir.join("a_converted.html")).unwrap();
    assert!(html.contains("Premier titre</h2>"));
    assert!(out_dir.join("b_converted.html").exists());
    assert!(!out_dir.join("c_converted.html").exists());

    assert_eq!(counter.started.load(Ordering::SeqCst), 3);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 2);
    assert_eq!(counter.failed.load(Ordering::SeqCst), 1);
    assert_eq!(counter.succeeded.load(Ordering::SeqCst), 2);
}

#[test]
fn test_stats_serialise_to_json() {
    let bytes = DocxBuilder::new().bold_paragraph("Synthèse").build();
    let out = convert_document(&bytes, "json", &ConversionConfig::default()).unwrap();
    let json = serde_json::to_value(&out.stats).unwrap();
    assert_eq!(json["titles_converted"], 1);
    assert_eq!(json["paragraph_count"], 1);
}
