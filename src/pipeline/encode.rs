//! Image encoding: raw media bytes → `data:` URI for inline `<img>` tags.
//!
//! The built-in converter inlines every picture the way common docx→HTML
//! converters do, so the stripper downstream sees the same input whichever
//! converter produced it. The MIME type is sniffed from the bytes first;
//! the part name's extension is only a fallback (EMF/WMF and friends).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type for an image, by content sniffing then by extension.
pub fn mime_type(bytes: &[u8], path_hint: &str) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    let ext = path_hint
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "image/octet-stream",
    }
}

/// Encode an image as a base64 `data:` URI.
pub fn data_uri(bytes: &[u8], path_hint: &str) -> String {
    let mime = mime_type(bytes, path_hint);
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} ({}) → {} bytes base64", path_hint, mime, b64.len());
    format!("data:{mime};base64,{b64}")
}
