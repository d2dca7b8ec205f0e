//! Configuration types for Word-to-HTML conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds every knob so a
//! config can be shared across the blocking pool and across the documents of
//! a batch without copying.

use crate::error::Docx2HtmlError;
use crate::pipeline::classes::CustomClassMap;
use crate::pipeline::render::HtmlConverter;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default `src` written into every placeholder image.
pub const DEFAULT_PLACEHOLDER_SRC: &str = "img_sample.jpg";

/// Default caption given to tables that have none.
pub const DEFAULT_TABLE_CAPTION: &str = "(Tableau)";

/// Configuration for a Word-to-HTML conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docx2html::{ConversionConfig, OutputMode};
///
/// let config = ConversionConfig::builder()
///     .placeholder_src("images/placeholder.png")
///     .output_mode(OutputMode::Document)
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// `src` of every placeholder image. Default: `img_sample.jpg`.
    ///
    /// Images are never recovered from the package; both the stripper and the
    /// reconciler point at this one fixed reference.
    pub placeholder_src: String,

    /// Minimum length (in characters after `data:image/`) of an inline image
    /// payload before it is replaced by a placeholder. Default: 100.
    ///
    /// Shorter payloads are tracking pixels or bullets and are left as is.
    pub inline_image_threshold: usize,

    /// Caption text given to tables without a caption. Default: `(Tableau)`.
    pub table_caption: String,

    /// Bare fragment or full standalone document. Default: [`OutputMode::Fragment`].
    pub output_mode: OutputMode,

    /// Extra classes appended per tag after the pipeline. Default: empty.
    pub custom_classes: CustomClassMap,

    /// Turn a one-item list placed right before a table into its caption.
    /// Default: true.
    pub list_captions: bool,

    /// docx→HTML converter. If None, uses [`crate::pipeline::render::DocxHtmlConverter`].
    pub converter: Option<Arc<dyn HtmlConverter>>,

    /// Number of documents converted at once by [`crate::batch::convert_batch`].
    /// Default: 4.
    ///
    /// Each document is transformed on the blocking pool, so values above the
    /// number of cores rarely help.
    pub concurrency: usize,

    /// Optional progress callback for batch events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            placeholder_src: DEFAULT_PLACEHOLDER_SRC.to_string(),
            inline_image_threshold: 100,
            table_caption: DEFAULT_TABLE_CAPTION.to_string(),
            output_mode: OutputMode::default(),
            custom_classes: CustomClassMap::default(),
            list_captions: true,
            converter: None,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("placeholder_src", &self.placeholder_src)
            .field("inline_image_threshold", &self.inline_image_threshold)
            .field("table_caption", &self.table_caption)
            .field("output_mode", &self.output_mode)
            .field("custom_classes", &self.custom_classes)
            .field("list_captions", &self.list_captions)
            .field(
                "converter",
                &self.converter.as_ref().map(|c| c.name().to_string()),
            )
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn placeholder_src(mut self, src: impl Into<String>) -> Self {
        self.config.placeholder_src = src.into();
        self
    }

    pub fn inline_image_threshold(mut self, n: usize) -> Self {
        self.config.inline_image_threshold = n;
        self
    }

    pub fn table_caption(mut self, caption: impl Into<String>) -> Self {
        self.config.table_caption = caption.into();
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    pub fn custom_classes(mut self, map: CustomClassMap) -> Self {
        self.config.custom_classes = map;
        self
    }

    /// Add one tag → classes rule on top of those already configured.
    pub fn custom_class(mut self, tag: &str, classes: &str) -> Self {
        self.config.custom_classes.insert(tag, classes);
        self
    }

    pub fn list_captions(mut self, v: bool) -> Self {
        self.config.list_captions = v;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn HtmlConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Docx2HtmlError> {
        let c = &self.config;
        if c.placeholder_src.trim().is_empty() {
            return Err(Docx2HtmlError::InvalidConfig(
                "Placeholder src must not be empty".into(),
            ));
        }
        if c.placeholder_src.contains('"') {
            return Err(Docx2HtmlError::InvalidConfig(format!(
                "Placeholder src must not contain a double quote, got {:?}",
                c.placeholder_src
            )));
        }
        if c.inline_image_threshold == 0 {
            return Err(Docx2HtmlError::InvalidConfig(
                "Inline image threshold must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Shape of the serialised result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// Top-level nodes joined by newlines, ready to paste into a CMS. (default)
    #[default]
    Fragment,
    /// A standalone HTML5 page with a `<title>` and the built-in stylesheet.
    Document,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.placeholder_src, "img_sample.jpg");
        assert_eq!(c.inline_image_threshold, 100);
        assert_eq!(c.table_caption, "(Tableau)");
        assert_eq!(c.output_mode, OutputMode::Fragment);
        assert!(c.list_captions);
        assert!(c.custom_classes.is_empty());
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn builder_sets_fields() {
        let c = ConversionConfig::builder()
            .placeholder_src("p.png")
            .table_caption("Table")
            .custom_class("h2", "title big")
            .list_captions(false)
            .build()
            .unwrap();
        assert_eq!(c.placeholder_src, "p.png");
        assert_eq!(c.table_caption, "Table");
        assert_eq!(c.custom_classes.len(), 1);
        assert!(!c.list_captions);
    }

    #[test]
    fn concurrency_is_clamped_to_one() {
        let c = ConversionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = ConversionConfig::builder()
            .inline_image_threshold(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Docx2HtmlError::InvalidConfig(_)));
    }

    #[test]
    fn quoted_placeholder_is_rejected() {
        let err = ConversionConfig::builder()
            .placeholder_src("a\"b.jpg")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("double quote"));
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = ConversionConfig::default();
        let s = format!("{c:?}");
        assert!(s.contains("placeholder_src"));
        assert!(s.contains("converter: None"));
    }
}
