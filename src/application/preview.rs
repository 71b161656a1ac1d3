//! Plain-text excerpts and representative images for list views.
//!
//! The default implementation is lightweight pattern matching over the raw
//! markup, not an HTML parser: it only recognises double-quoted `src`
//! attributes and is not entity-aware. The trait exists so a real parser can
//! replace it without touching callers.

use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]+src="([^"]+)""#).expect("valid image pattern"));
static TAG_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

pub trait PreviewRenderer: Send + Sync {
    /// `src` of the first `<img>` tag, or `None` when the markup has none.
    fn first_image(&self, html: &str) -> Option<String>;

    /// Remove tag-like spans. Cosmetic only; not a sanitizer.
    fn strip_html(&self, html: &str) -> String;

    /// Leading `max_chars` characters of the stripped text.
    fn excerpt(&self, html: &str, max_chars: usize) -> String {
        self.strip_html(html).chars().take(max_chars).collect()
    }
}

/// Regex-backed default renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternPreview;

impl PreviewRenderer for PatternPreview {
    fn first_image(&self, html: &str) -> Option<String> {
        FIRST_IMAGE
            .captures(html)
            .map(|captures| captures[1].to_string())
    }

    fn strip_html(&self, html: &str) -> String {
        TAG_SPAN.replace_all(html, "").into_owned()
    }
}
