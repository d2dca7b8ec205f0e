//! Conversion entry points.
//!
//! Every entry point funnels into the same two halves:
//!
//! 1. the **front half** reads the package twice, independently: the
//!    structural inventory straight from `word/document.xml`, and the HTML
//!    produced by the configured [`HtmlConverter`] with its inline images
//!    stripped;
//! 2. the **tree half** ([`crate::pipeline::transform`]) parses that HTML and
//!    runs every rewriting stage in a fixed order.
//!
//! The async API runs the two front-half reads concurrently on the blocking
//! pool and then the tree half on the blocking pool too. The sync API runs
//! the same steps one after another on the calling thread.
//!
//! [`HtmlConverter`]: crate::pipeline::render::HtmlConverter

use crate::config::ConversionConfig;
use crate::error::{Docx2HtmlError, ExtractionError};
use crate::output::{ConversionOutput, ConversionStats, DocumentInventory};
use crate::pipeline::{self, input, inventory, render, strip, TransformOutput};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a `.docx` file to HTML.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(Docx2HtmlError)` only for fatal errors:
/// - File not found / permission denied
/// - Not a zip package
/// - Converter failure
///
/// A broken inventory is not fatal: the conversion carries on without image
/// reconciliation and reports the problem in
/// [`ConversionOutput::inventory_error`].
pub async fn convert(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docx2HtmlError> {
    let path = path.as_ref();
    let bytes = input::read_local_async(path).await?;
    convert_bytes(bytes, input::document_name(path), config).await
}

/// Convert an in-memory `.docx` package.
///
/// `name` is used for logging and as the `<title>` in
/// [`crate::config::OutputMode::Document`] output.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docx2html::{convert_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("rapport.docx")?;
/// let output = convert_bytes(bytes, "rapport", &ConversionConfig::default()).await?;
/// println!("{}", output.html);
/// # Ok(())
/// # }
/// ```
pub async fn convert_bytes(
    bytes: Vec<u8>,
    name: impl Into<String>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docx2HtmlError> {
    let total_start = Instant::now();
    let name = name.into();
    info!("Starting conversion: {}", name);

    // ── Front half: inventory ∥ convert + strip ──────────────────────────
    let bytes: Arc<[u8]> = bytes.into();
    let converter = render::resolve_converter(config);

    let inventory_bytes = Arc::clone(&bytes);
    let inventory_task =
        tokio::task::spawn_blocking(move || inventory::extract(&inventory_bytes));

    let render_bytes = Arc::clone(&bytes);
    let strip_config = config.clone();
    let render_task = tokio::task::spawn_blocking(move || {
        let raw = converter.convert(&render_bytes)?;
        Ok::<_, Docx2HtmlError>(strip::strip_embedded_images(&raw, &strip_config))
    });

    let (inventory_result, render_result) = tokio::join!(inventory_task, render_task);
    let (stripped, images_stripped) = render_result.map_err(|e| join_failed("convert", e))??;
    let (inventory, inventory_error) =
        settle_inventory(&name, inventory_result.map_err(|e| join_failed("inventory", e))?);

    // ── Tree half ────────────────────────────────────────────────────────
    let transform_config = config.clone();
    let (transformed, inventory, name) = tokio::task::spawn_blocking(move || {
        let out = pipeline::transform(&stripped, &inventory, &name, &transform_config);
        (out, inventory, name)
    })
    .await
    .map_err(|e| join_failed("transform", e))?;

    Ok(assemble(
        &name,
        transformed,
        inventory,
        inventory_error,
        images_stripped,
        total_start,
    ))
}

/// Convert an in-memory package on the calling thread.
///
/// Same result as [`convert_bytes`], without a runtime. A panic in the
/// converter or in a tree stage is reported as
/// [`Docx2HtmlError::TransformFailed`], as on the async path.
pub fn convert_document(
    bytes: &[u8],
    name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docx2HtmlError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", name);

    let (inventory, inventory_error) = settle_inventory(name, inventory::extract(bytes));
    let converter = render::resolve_converter(config);
    let (stripped, images_stripped) = guarded("convert", || {
        let raw = converter.convert(bytes)?;
        Ok::<_, Docx2HtmlError>(strip::strip_embedded_images(&raw, config))
    })??;
    let transformed = guarded("transform", || {
        pipeline::transform(&stripped, &inventory, name, config)
    })?;

    Ok(assemble(
        name,
        transformed,
        inventory,
        inventory_error,
        images_stripped,
        total_start,
    ))
}

/// Synchronous wrapper around [`convert`].
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docx2HtmlError> {
    let path = path.as_ref();
    let bytes = input::read_local(path)?;
    convert_document(&bytes, &input::document_name(path), config)
}

/// Convert a `.docx` and write the HTML directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Docx2HtmlError> {
    let output = convert(path, config).await?;
    write_output(output_path.as_ref(), &output.html).await?;
    Ok(output.stats)
}

/// Read the structural inventory without converting content.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentInventory, Docx2HtmlError> {
    let bytes = input::read_local_async(path).await?;
    let inventory = tokio::task::spawn_blocking(move || inventory::extract(&bytes))
        .await
        .map_err(|e| join_failed("inventory", e))??;
    Ok(inventory)
}

/// Run the HTML half of the pipeline over caller-supplied converter output.
///
/// Useful when the HTML comes from an external converter run elsewhere.
/// Inline images are stripped first, exactly as in a full conversion.
pub fn transform_html(
    html: &str,
    inventory: &DocumentInventory,
    name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Docx2HtmlError> {
    let total_start = Instant::now();
    let (stripped, images_stripped) = strip::strip_embedded_images(html, config);
    let transformed = guarded("transform", || {
        pipeline::transform(&stripped, inventory, name, config)
    })?;
    Ok(assemble(
        name,
        transformed,
        inventory.clone(),
        None,
        images_stripped,
        total_start,
    ))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Atomic write: temp file next to the target, then rename.
pub(crate) async fn write_output(path: &Path, html: &str) -> Result<(), Docx2HtmlError> {
    let write_failed = |e: std::io::Error| Docx2HtmlError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, html).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    debug!("Wrote {} bytes to {}", html.len(), path.display());
    Ok(())
}

/// Fall back to an empty inventory when extraction failed.
fn settle_inventory(
    name: &str,
    result: Result<DocumentInventory, ExtractionError>,
) -> (DocumentInventory, Option<ExtractionError>) {
    match result {
        Ok(inventory) => {
            if inventory.is_empty() {
                warn!("{}: inventory is empty; no images will be reconciled", name);
            }
            (inventory, None)
        }
        Err(e) => {
            warn!("{}: inventory unavailable ({}); continuing without it", name, e);
            (DocumentInventory::default(), Some(e))
        }
    }
}

/// Run a synchronous stage, turning a panic into `TransformFailed`.
fn guarded<T>(stage: &str, f: impl FnOnce() -> T) -> Result<T, Docx2HtmlError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!("{} stage panicked: {}", stage, reason);
        Docx2HtmlError::TransformFailed {
            detail: format!("{stage} stage panicked: {reason}"),
        }
    })
}

fn join_failed(stage: &str, e: tokio::task::JoinError) -> Docx2HtmlError {
    Docx2HtmlError::TransformFailed {
        detail: format!("{stage} task did not complete: {e}"),
    }
}

fn assemble(
    name: &str,
    transformed: TransformOutput,
    inventory: DocumentInventory,
    inventory_error: Option<ExtractionError>,
    images_stripped: usize,
    total_start: Instant,
) -> ConversionOutput {
    let stats = ConversionStats {
        images_stripped,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ..transformed.stats
    };
    info!(
        "Conversion complete: {}: {} titles, {} images ({} inserted), {} tables, {}ms",
        name,
        stats.titles_converted,
        stats.image_count,
        stats.images_inserted,
        stats.tables_processed,
        stats.total_duration_ms
    );
    ConversionOutput {
        html: transformed.html,
        stats,
        inventory,
        toc: transformed.toc,
        inventory_error,
    }
}
