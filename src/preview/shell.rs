//! Fixed HTML document wrapping the rendered SVG.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::render::SvgMarkup;

static NONCE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fresh CSP nonce: 32 hex chars, unique per call.
pub fn nonce() -> String {
    let count = NONCE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut hasher = blake3::Hasher::new();
    hasher.update(&count.to_le_bytes());
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    hex::encode(&hasher.finalize().as_bytes()[..16])
}

/// Wrap `svg` in the preview page.
///
/// The page centers the diagram in the full viewport and scales it down to
/// fit. The content policy only admits inline style and script carrying
/// this call's nonce, and same-origin images.
pub fn html_for_svg(title: &str, svg: &SvgMarkup) -> String {
    let nonce = nonce();
    let title = escape_text(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; img-src 'self' 'unsafe-inline'; script-src 'nonce-{nonce}'; style-src 'self' 'unsafe-inline' 'nonce-{nonce}';">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style nonce="{nonce}">
body, html {{
    margin: 0;
    padding: 0;
    overflow: hidden;
}}
#svg-container {{
    position: absolute;
    top: 0;
    left: 0;
    width: 100%;
    height: 100%;
    display: flex;
    align-items: center;
    justify-content: center;
}}
svg {{
    max-width: 100%;
    max-height: 100%;
}}
</style>
</head>
<body>
<div id="svg-container">
{svg}
</div>
</body>
</html>
"#
    )
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
