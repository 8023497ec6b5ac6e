//! Listing parameters shared by the paginated endpoints.

use crate::errors::{ApiResult, bad_request};

pub const MAX_LIMIT: i64 = 100;
/// Keeps `(page - 1) * limit` within `i64` for every accepted limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Parses `page` (default 1) and `limit` (1..=100, default `default_limit`).
pub fn page_window(
    page: Option<&str>,
    limit: Option<&str>,
    default_limit: i64,
) -> ApiResult<(i64, i64)> {
    let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
        None => 1,
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|page| (1..=MAX_PAGE).contains(page))
            .ok_or_else(|| bad_request("Page must be a positive integer"))?,
    };

    let limit = match limit.map(str::trim).filter(|l| !l.is_empty()) {
        None => default_limit,
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|limit| (1..=MAX_LIMIT).contains(limit))
            .ok_or_else(|| bad_request("Limit must be between 1 and 100"))?,
    };

    Ok((page, limit))
}

/// Translates a sort expression such as `order -createdAt` into an
/// `ORDER BY` clause. Fields are separated by spaces or commas and a leading
/// `-` means descending. Only fields listed in `columns` are accepted, which
/// keeps the clause free of caller-controlled SQL.
pub fn order_by(sort: Option<&str>, default: &str, columns: &[(&str, &str)]) -> ApiResult<String> {
    let expr = sort
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default);

    let mut terms = Vec::new();
    for token in expr.split([' ', ',']).filter(|t| !t.is_empty()) {
        let (field, direction) = match token.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (token.strip_prefix('+').unwrap_or(token), "ASC"),
        };
        let column = columns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .ok_or_else(|| bad_request(format!("Invalid sort field: {field}")))?;
        terms.push(format!("{column} {direction}"));
    }

    if terms.is_empty() {
        return Err(bad_request("Invalid sort expression"));
    }
    Ok(terms.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[(&str, &str)] = &[
        ("createdAt", "created_at"),
        ("order", "order_index"),
        ("title", "title"),
    ];

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None, 10).unwrap(), (1, 10));
        assert_eq!(page_window(Some("3"), Some("25"), 10).unwrap(), (3, 25));
        assert_eq!(page_window(Some(""), Some(" "), 12).unwrap(), (1, 12));
    }

    #[test]
    fn test_page_window_rejects_out_of_range() {
        assert!(page_window(Some("0"), None, 10).is_err());
        assert!(page_window(Some("abc"), None, 10).is_err());
        assert!(page_window(None, Some("0"), 10).is_err());
        assert!(page_window(None, Some("101"), 10).is_err());
    }

    #[test]
    fn test_page_window_rejects_overflowing_page() {
        assert!(page_window(Some("9223372036854775807"), Some("10"), 10).is_err());
        assert!(page_window(Some(&(MAX_PAGE + 1).to_string()), None, 10).is_err());

        let (page, limit) = page_window(Some(&MAX_PAGE.to_string()), Some("100"), 10).unwrap();
        let offset = crate::api::response::Pagination::new(page, limit, 0).offset();
        assert!(offset > 0);
    }

    #[test]
    fn test_order_by() {
        assert_eq!(
            order_by(None, "-createdAt", COLUMNS).unwrap(),
            "created_at DESC"
        );
        assert_eq!(
            order_by(Some("order -createdAt"), "-createdAt", COLUMNS).unwrap(),
            "order_index ASC, created_at DESC"
        );
        assert_eq!(
            order_by(Some("title,+order"), "-createdAt", COLUMNS).unwrap(),
            "title ASC, order_index ASC"
        );
    }

    #[test]
    fn test_order_by_rejects_unknown_fields() {
        assert!(order_by(Some("password"), "-createdAt", COLUMNS).is_err());
        assert!(order_by(Some("title; DROP TABLE projects"), "-createdAt", COLUMNS).is_err());
    }
}
