//! Slug derivation for catalog entries.
//!
//! A slug is the lowercase, hyphen-delimited path segment under which a
//! catalog entry is published. [`assign_slug`] derives it from a title and
//! probes `base`, `base-1`, `base-2`, ... until the supplied predicate reports
//! a free candidate.

use std::future::Future;

/// Substituted when a title contains no ASCII letters or digits at all.
pub const FALLBACK_SLUG: &str = "untitled";

pub fn validate_slug(slug: &str) -> anyhow::Result<()> {
    let is_valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if is_valid {
        Ok(())
    } else {
        Err(anyhow::anyhow!("slug must be lowercase kebab-case"))
    }
}

/// Lower-cases the whole of `title` (Unicode case mapping) and folds every
/// run of characters outside `[a-z0-9]` into a single hyphen. Leading and
/// trailing separators are dropped, so the result is either empty or a valid
/// slug.
pub fn normalize_title(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.to_lowercase().trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// The first candidate probed for `title`.
pub fn base_slug(title: &str) -> String {
    let base = normalize_title(title);
    if base.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        base
    }
}

/// Derives a slug for `title` that `exists` reports as free.
///
/// Candidates are probed in the fixed order `base`, `base-1`, `base-2`, ...
/// and the first one for which `exists` returns `Ok(false)` is returned. An
/// error from `exists` aborts the search and is returned unchanged.
///
/// The result is only free at the instant of the check. Callers persisting
/// the slug must still rely on a unique index and retry on violation.
pub async fn assign_slug<F, Fut, E>(title: &str, mut exists: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let base = base_slug(title);
    let mut candidate = base.clone();
    let mut counter: u64 = 1;

    while exists(candidate.clone()).await? {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }

    Ok(candidate)
}
