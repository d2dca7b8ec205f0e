//! Batch conversion: many documents, converted concurrently.
//!
//! Documents are independent, so they are driven through
//! `futures::stream::buffer_unordered` with [`ConversionConfig::concurrency`]
//! in flight at once. One failing document never stops the others; each
//! input gets its own [`BatchItem`], returned in input order.

use crate::config::ConversionConfig;
use crate::convert::{convert, write_output};
use crate::error::Docx2HtmlError;
use crate::output::ConversionStats;
use crate::pipeline::input::document_name;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Suffix appended to the stem of every output file.
pub const OUTPUT_SUFFIX: &str = "_converted.html";

/// Outcome for one input of a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    /// Where the HTML was (or would have been) written.
    pub output: PathBuf,
    pub stats: Option<ConversionStats>,
    pub error: Option<Docx2HtmlError>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// `<stem>_converted.html`, next to the input or inside `out_dir`.
pub fn output_path_for(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let file_name = format!("{}{}", document_name(input), OUTPUT_SUFFIX);
    match out_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

/// Convert every input and write its HTML. Returns one item per input, in
/// input order.
pub async fn convert_batch(
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    config: &ConversionConfig,
) -> Vec<BatchItem> {
    let total = inputs.len();
    info!("Starting batch of {} documents", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut items: Vec<(usize, BatchItem)> = stream::iter(inputs.iter().enumerate().map(
        |(idx, input)| {
            let output = output_path_for(input, out_dir);
            async move {
                let item = convert_one(input, output, idx + 1, total, config).await;
                (idx, item)
            }
        },
    ))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await;

    items.sort_by_key(|(idx, _)| *idx);
    let items: Vec<BatchItem> = items.into_iter().map(|(_, item)| item).collect();

    let succeeded = items.iter().filter(|i| i.is_ok()).count();
    info!("Batch complete: {}/{} documents converted", succeeded, total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }
    items
}

async fn convert_one(
    input: &Path,
    output: PathBuf,
    index: usize,
    total: usize,
    config: &ConversionConfig,
) -> BatchItem {
    let name = document_name(input);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(&name, index, total);
    }

    let result = match convert(input, config).await {
        Ok(out) => write_output(&output, &out.html).await.map(|()| out.stats),
        Err(e) => Err(e),
    };

    match result {
        Ok(stats) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(&name, &stats);
            }
            BatchItem {
                input: input.to_path_buf(),
                output,
                stats: Some(stats),
                error: None,
            }
        }
        Err(e) => {
            warn!("{}: {}", input.display(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(&name, &e.to_string());
            }
            BatchItem {
                input: input.to_path_buf(),
                output,
                stats: None,
                error: Some(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        let input = Path::new("/data/rapport annuel.docx");
        assert_eq!(
            output_path_for(input, None),
            PathBuf::from("/data/rapport annuel_converted.html")
        );
        assert_eq!(
            output_path_for(input, Some(Path::new("/out"))),
            PathBuf::from("/out/rapport annuel_converted.html")
        );
    }

    #[tokio::test]
    async fn empty_batch() {
        let items = convert_batch(&[], None, &ConversionConfig::default()).await;
        assert!(items.is_empty());
    }
}
