//! Embedded-image stripping on the raw converter output.
//!
//! Inline `data:` images can weigh megabytes. They are swapped for a fixed
//! placeholder reference before the HTML is parsed, so the tree stages never
//! carry the payloads around. Short payloads (tracking pixels, bullets) stay
//! as they are.

use crate::config::ConversionConfig;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// Inline style of every placeholder image.
pub const PLACEHOLDER_STYLE: &str =
    "max-width: 300px; height: auto; border: 1px solid #ddd; margin: 10px 0;";

/// Class of every placeholder image.
pub const PLACEHOLDER_CLASS: &str = "sample-img";

static RE_INLINE_IMG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]*?src="data:image/([^"]*)"[^>]*>"#).unwrap());

/// Placeholder `<img>` markup for the `n`-th image (1-based).
pub fn placeholder_tag(placeholder_src: &str, n: usize) -> String {
    format!(
        r#"<img src="{placeholder_src}" alt="Image {n}" class="{PLACEHOLDER_CLASS}" style="{PLACEHOLDER_STYLE}" />"#
    )
}

/// Replace every long inline image by a placeholder.
///
/// Returns the rewritten HTML and the number of replacements. The payload
/// length is measured in characters after `data:image/`, MIME subtype
/// included.
pub fn strip_embedded_images(html: &str, config: &ConversionConfig) -> (String, usize) {
    let mut count = 0usize;
    let out = RE_INLINE_IMG.replace_all(html, |caps: &Captures| {
        let payload = &caps[1];
        if payload.chars().count() < config.inline_image_threshold {
            return caps[0].to_string();
        }
        count += 1;
        placeholder_tag(&config.placeholder_src, count)
    });
    debug!("Stripped {} inline images", count);
    (out.into_owned(), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_payload() -> String {
        format!("png;base64,{}", "A".repeat(200))
    }

    #[test]
    fn long_images_are_replaced_in_order() {
        let html = format!(
            r#"<p>a<img src="data:image/{p}" /></p><p><img alt="x" src="data:image/{p}"></p>"#,
            p = long_payload()
        );
        let (out, n) = strip_embedded_images(&html, &ConversionConfig::default());
        assert_eq!(n, 2);
        assert!(out.contains(r#"alt="Image 1""#));
        assert!(out.contains(r#"alt="Image 2""#));
        assert!(!out.contains("base64"));
        assert_eq!(out.matches(r#"src="img_sample.jpg""#).count(), 2);
        assert!(out.contains(r#"class="sample-img""#));
    }

    #[test]
    fn short_payloads_are_kept() {
        let html = r#"<p><img src="data:image/gif;base64,R0lGOD" /></p>"#;
        let (out, n) = strip_embedded_images(html, &ConversionConfig::default());
        assert_eq!(n, 0);
        assert_eq!(out, html);
    }

    #[test]
    fn threshold_is_configurable() {
        let html = r#"<img src="data:image/gif;base64,R0lGOD" />"#;
        let config = ConversionConfig::builder()
            .inline_image_threshold(10)
            .placeholder_src("ph.png")
            .build()
            .unwrap();
        let (out, n) = strip_embedded_images(html, &config);
        assert_eq!(n, 1);
        assert_eq!(out, placeholder_tag("ph.png", 1));
    }

    #[test]
    fn non_data_images_are_untouched() {
        let html = r#"<img src="https://example.com/a.png" />"#;
        let (out, n) = strip_embedded_images(html, &ConversionConfig::default());
        assert_eq!((out.as_str(), n), (html, 0));
    }
}
