//! Clean-slug derivation for imported and newly created content.
//!
//! Titles are transliterated (`pinyin`) before slugification (`slug`) so a
//! title like “基线对齐” still yields `ji-xian-dui-qi`. Uniqueness is decided by
//! a caller-supplied predicate, keeping persistence out of this module.

use std::future::Future;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

/// Clean slug used when a title produces nothing usable.
pub const FALLBACK_SLUG: &str = "untitled";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a clean slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(transliterate_to_ascii(input));
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Like [`derive_slug`] but never fails, using [`FALLBACK_SLUG`] instead.
pub fn derive_slug_or_fallback(input: &str) -> String {
    derive_slug(input).unwrap_or_else(|_| FALLBACK_SLUG.to_string())
}

/// Find a slug that does not collide, awaiting `is_unique` for each candidate.
///
/// `base` is used as-is first, then suffixed with `-2`, `-3`, ... The base is
/// not re-slugified, so already-clean values from exports survive unchanged.
pub async fn unique_slug<F, Fut, E>(base: &str, mut is_unique: F) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = if base.trim().is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        base.trim().to_string()
    };

    if is_unique(base.clone())
        .await
        .map_err(SlugAsyncError::Predicate)?
    {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(candidate.clone())
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
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
    fn derive_slug_transliterates_chinese() {
        let slug = derive_slug("Rust 基础教程").expect("slug");
        assert_eq!(slug, "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn derive_slug_or_fallback_handles_symbols_only() {
        assert_eq!(derive_slug_or_fallback("!!!"), FALLBACK_SLUG);
        assert_eq!(derive_slug_or_fallback(""), FALLBACK_SLUG);
        assert_eq!(derive_slug_or_fallback("Hello, World"), "hello-world");
    }

    #[tokio::test]
    async fn unique_slug_appends_counter() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let existing = Arc::new(Mutex::new(vec!["hello-world".to_string()]));

        let slug = unique_slug("hello-world", |candidate| {
            let existing = existing.clone();
            async move {
                let guard = existing.lock().await;
                Ok::<bool, std::convert::Infallible>(!guard.contains(&candidate))
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "hello-world-2");
    }

    #[tokio::test]
    async fn unique_slug_exhausts() {
        let result = unique_slug("taken", |_| async {
            Ok::<bool, std::convert::Infallible>(false)
        })
        .await;

        assert!(matches!(
            result,
            Err(SlugAsyncError::Slug(SlugError::Exhausted { ref base })) if base == "taken"
        ));
    }
}
