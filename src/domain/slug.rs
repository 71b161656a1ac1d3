//! Utilities for deriving and validating URL-safe post identifiers.
//!
//! Slugs are restricted to `[a-z0-9-]`. Derivation bridges ASCII
//! slugification (`slug` crate) with Chinese transliteration (`pinyin`
//! crate), so a title like “基线对齐” becomes `ji-xian-dui-qi`. Forms accept
//! an explicit slug and reject invalid input rather than auto-correcting it;
//! only the legacy backfill path generates slugs on its own.

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

/// Fallback base when a title yields no slug-safe characters at all.
const FALLBACK_BASE: &str = "post";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug must not be empty")]
    Empty,
    #[error("slug can only contain lowercase letters, numbers, and hyphens")]
    InvalidCharacters,
}

/// Derive a base slug from a human-readable title. May return an empty
/// string when nothing representable remains.
pub fn derive_slug(title: &str) -> String {
    slugify(transliterate_to_ascii(title))
}

/// The form pre-pass applied to user-supplied slugs: trim, lowercase, and
/// turn inner spaces into hyphens. Validation happens separately.
pub fn normalize_slug_input(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "-")
}

/// Enforce the slug character set: non-empty, `^[a-z0-9-]+$`.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.is_empty() {
        return Err(SlugError::Empty);
    }
    if slug
        .bytes()
        .any(|byte| !matches!(byte, b'a'..=b'z' | b'0'..=b'9' | b'-'))
    {
        return Err(SlugError::InvalidCharacters);
    }
    Ok(())
}

/// Generate a slug for a legacy row that predates the slug column. The
/// creation-time suffix keeps concurrent backfills from colliding on
/// identical titles.
pub fn backfill_slug(title: &str, created_unix: i64) -> String {
    let base = derive_slug(title);
    let base = if base.is_empty() {
        FALLBACK_BASE
    } else {
        base.as_str()
    };
    format!("{base}-{created_unix}")
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Hello World"), "hello-world");
        assert_eq!(derive_slug("C'est l'été!"), "c-est-l-ete");
    }

    #[test]
    fn derive_slug_transliterates_chinese() {
        assert_eq!(derive_slug("Rust 基础教程"), "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn normalize_matches_the_form_pre_pass() {
        assert_eq!(normalize_slug_input("  My First Post "), "my-first-post");
        assert_eq!(normalize_slug_input("Already-Good"), "already-good");
    }

    #[test]
    fn validate_rejects_empty_and_foreign_characters() {
        assert_eq!(validate_slug(""), Err(SlugError::Empty));
        assert_eq!(
            validate_slug("hello_world"),
            Err(SlugError::InvalidCharacters)
        );
        assert_eq!(validate_slug("snakes & ladders"), Err(SlugError::InvalidCharacters));
        assert_eq!(validate_slug("post-42"), Ok(()));
    }

    #[test]
    fn backfill_appends_creation_time_suffix() {
        assert_eq!(backfill_slug("Hello World", 1700000000), "hello-world-1700000000");
        assert_eq!(backfill_slug("???", 1700000000), "post-1700000000");
    }
}
