//! Progress-callback trait for batch conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as [`crate::batch::convert_batch`] works through its inputs. The
//! CLI drives its progress bar from these events.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docx2html::{ConversionConfig, ConversionProgressCallback, ConversionStats};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, name: &str, stats: &ConversionStats) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}: {name} ({} titles)", stats.titles_converted);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ConversionStats;
use std::sync::Arc;

/// Called by the batch driver as it converts each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// Documents are converted concurrently, so `on_document_start`,
/// `on_document_complete` and `on_document_error` may be called from
/// different threads and in any order. Protect shared mutable state with
/// `Mutex` or atomics.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any document is read.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a document is read.
    ///
    /// # Arguments
    /// * `name`:  document name (file stem)
    /// * `index`: 1-indexed position in the batch
    /// * `total`: number of documents in the batch
    fn on_document_start(&self, name: &str, index: usize, total: usize) {
        let _ = (name, index, total);
    }

    /// Called when a document converted and its output was written.
    fn on_document_complete(&self, name: &str, stats: &ConversionStats) {
        let _ = (name, stats);
    }

    /// Called when a document failed.
    ///
    /// # Arguments
    /// * `error`: human-readable error description
    fn on_document_error(&self, name: &str, error: &str) {
        let _ = (name, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
