//! Coercion of loosely typed request bodies into canonical values.
//!
//! The admin UI submits the same logical field in several shapes depending on
//! whether it posts JSON or a multipart form: booleans arrive as `true` or
//! `"true"`, numbers as `3` or `"3"`, lists as arrays or delimited strings and
//! nested objects as objects or JSON-encoded strings. [`Payload`] accepts the
//! union of those shapes so handlers only ever see typed values.
//!
//! Accessors return `Ok(None)` when a field is absent or `null` and
//! `Err(Malformed)` when it is present but cannot be read as the requested
//! type. [`Violations`] collects per-field messages and turns them into a
//! single validation error.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{ApiError, ApiResult, FieldError};
use crate::validation::url::validate_link;

/// A present field whose value could not be coerced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Malformed;

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed value")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn from_value(value: Value) -> ApiResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            Value::Null => Ok(Self::default()),
            _ => Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }

    /// Trimmed text. An explicitly empty field yields `Some("")` so updates
    /// can clear optional values.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Array(items) => items.iter().find_map(scalar_text),
            other => scalar_text(other),
        }
    }

    /// Trimmed text, treating an empty string the same as an absent field.
    pub fn non_empty_text(&self, key: &str) -> Option<String> {
        self.text(key).filter(|text| !text.is_empty())
    }

    /// Optional text that an empty value clears: `None` when absent,
    /// `Some(None)` when sent empty.
    pub fn clearable_text(&self, key: &str) -> Option<Option<String>> {
        self.text(key).map(|text| (!text.is_empty()).then_some(text))
    }

    /// One of the string variants of a serde enum, such as `"in-progress"`.
    pub fn choice<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Malformed> {
        match self.non_empty_text(key) {
            Some(text) => variant(&text).map(Some).ok_or(Malformed),
            None => Ok(None),
        }
    }

    /// Parses the trimmed text with `FromStr`. Empty text counts as absent.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, Malformed> {
        match self.non_empty_text(key) {
            Some(text) => text.parse().map(Some).map_err(|_| Malformed),
            None => Ok(None),
        }
    }

    /// `true`/`false`, their string forms (any case), `1`/`0` and `on`/`off`.
    pub fn flag(&self, key: &str) -> Result<Option<bool>, Malformed> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Some(false)),
                Some(1) => Ok(Some(true)),
                _ => Err(Malformed),
            },
            Some(_) => match self.text(key).map(|t| t.to_ascii_lowercase()).as_deref() {
                Some("true" | "1" | "on") => Ok(Some(true)),
                Some("false" | "0" | "off") => Ok(Some(false)),
                Some("") => Ok(None),
                _ => Err(Malformed),
            },
        }
    }

    /// Whole numbers, also from numeric strings such as `"3"` or `"3.0"`.
    pub fn integer(&self, key: &str) -> Result<Option<i64>, Malformed> {
        match self.number(key)? {
            None => Ok(None),
            Some(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Ok(Some(n as i64)),
            Some(_) => Err(Malformed),
        }
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, Malformed> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(Malformed),
            Some(_) => match self.non_empty_text(key) {
                None => Ok(None),
                Some(text) => match text.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(Some(n)),
                    _ => Err(Malformed),
                },
            },
        }
    }

    /// A list from an array, a comma-separated string or a JSON-encoded
    /// array. Entries are trimmed and empty entries dropped.
    pub fn csv_list(&self, key: &str) -> Option<Vec<String>> {
        self.list(key, ',')
    }

    /// Like [`Payload::csv_list`] but splits strings on newlines, so entries
    /// may themselves contain commas.
    pub fn line_list(&self, key: &str) -> Option<Vec<String>> {
        self.list(key, '\n')
    }

    fn list(&self, key: &str, separator: char) -> Option<Vec<String>> {
        let items = match self.get(key)? {
            Value::Array(items) => items
                .iter()
                .filter_map(scalar_text)
                .flat_map(|item| split_entries(&item, separator))
                .collect(),
            Value::String(raw) => match serde_json::from_str::<Vec<String>>(raw.trim()) {
                Ok(items) if raw.trim_start().starts_with('[') => items
                    .iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
                _ => split_entries(raw, separator),
            },
            other => scalar_text(other).map(|text| vec![text]).unwrap_or_default(),
        };
        Some(items)
    }

    /// A structured value supplied either inline or as a JSON-encoded string.
    pub fn json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Malformed> {
        let value = match self.get(key) {
            None => return Ok(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(None),
            Some(Value::String(raw)) => {
                serde_json::from_str::<Value>(raw).map_err(|_| Malformed)?
            }
            Some(other) => other.clone(),
        };
        serde_json::from_value(value).map(Some).map_err(|_| Malformed)
    }

    /// Calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
    ///
    /// The outer `None` means the field was absent; `Some(None)` means it was
    /// sent empty and should be cleared.
    pub fn date(&self, key: &str) -> Result<Option<Option<NaiveDate>>, Malformed> {
        let Some(text) = self.text(key) else {
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(Some(None));
        }
        if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            return Ok(Some(Some(date)));
        }
        DateTime::parse_from_rfc3339(&text)
            .map(|ts| Some(Some(ts.date_naive())))
            .map_err(|_| Malformed)
    }

    /// String identifiers from an array or a comma-separated string.
    pub fn ids(&self, key: &str) -> Vec<String> {
        self.csv_list(key).unwrap_or_default()
    }
}

/// Reads `raw` as a unit variant of `T` using its serde names.
pub fn variant<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(Value::String(raw.trim().to_string())).ok()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn split_entries(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accumulates rejected fields for a single request.
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<FieldError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Unwraps an accessor result, recording `message` when it was malformed.
    pub fn take<T>(
        &mut self,
        field: &str,
        result: Result<Option<T>, Malformed>,
        message: &str,
    ) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(Malformed) => {
                self.add(field, message);
                None
            }
        }
    }

    /// Records `message` when `value` is missing.
    pub fn require<T>(&mut self, field: &str, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.add(field, message);
        }
        value
    }

    /// Checks a character count against an inclusive range.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize, message: &str) {
        let len = value.chars().count();
        self.check((min..=max).contains(&len), field, message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> ApiResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// An optional http(s) link; an empty value clears it.
pub fn link_field(
    violations: &mut Violations,
    payload: &Payload,
    field: &str,
    message: &str,
) -> Option<Option<String>> {
    match payload.clearable_text(field)? {
        None => Some(None),
        Some(raw) => match validate_link(&raw) {
            Ok(url) => Some(Some(url)),
            Err(_) => {
                violations.add(field, message);
                None
            }
        },
    }
}

pub fn order_field(violations: &mut Violations, payload: &Payload) -> Option<i64> {
    let order = violations.take(
        "order",
        payload.integer("order"),
        "Order must be a positive integer",
    );
    match order {
        Some(order) if order < 0 => {
            violations.add("order", "Order must be a positive integer");
            None
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        Payload::from_value(value).unwrap()
    }

    #[test]
    fn test_rejects_non_object_body() {
        assert!(Payload::from_value(json!([1, 2])).is_err());
        assert!(Payload::from_value(json!("text")).is_err());
        assert!(!Payload::from_value(Value::Null).unwrap().contains("x"));
    }

    #[test]
    fn test_text_trims_and_keeps_empty() {
        let p = payload(json!({"a": "  hi  ", "b": "", "c": null, "d": 5, "e": ["x", "y"]}));
        assert_eq!(p.text("a").as_deref(), Some("hi"));
        assert_eq!(p.text("b").as_deref(), Some(""));
        assert_eq!(p.non_empty_text("b"), None);
        assert_eq!(p.text("c"), None);
        assert_eq!(p.text("d").as_deref(), Some("5"));
        assert_eq!(p.text("e").as_deref(), Some("x"));
        assert!(!p.contains("c"));
    }

    #[test]
    fn test_flag_accepts_wire_forms() {
        let p = payload(json!({
            "a": true, "b": "true", "c": "FALSE", "d": "1", "e": 0, "f": "maybe", "g": ""
        }));
        assert_eq!(p.flag("a"), Ok(Some(true)));
        assert_eq!(p.flag("b"), Ok(Some(true)));
        assert_eq!(p.flag("c"), Ok(Some(false)));
        assert_eq!(p.flag("d"), Ok(Some(true)));
        assert_eq!(p.flag("e"), Ok(Some(false)));
        assert_eq!(p.flag("f"), Err(Malformed));
        assert_eq!(p.flag("g"), Ok(None));
        assert_eq!(p.flag("missing"), Ok(None));
    }

    #[test]
    fn test_numbers_from_strings() {
        let p = payload(json!({"a": "3", "b": 4, "c": "2.5", "d": "abc", "e": " ", "f": 1.5}));
        assert_eq!(p.integer("a"), Ok(Some(3)));
        assert_eq!(p.integer("b"), Ok(Some(4)));
        assert_eq!(p.integer("c"), Err(Malformed));
        assert_eq!(p.number("c"), Ok(Some(2.5)));
        assert_eq!(p.number("d"), Err(Malformed));
        assert_eq!(p.number("e"), Ok(None));
        assert_eq!(p.integer("f"), Err(Malformed));
    }

    #[test]
    fn test_csv_list_shapes() {
        let p = payload(json!({
            "a": "React, Node.js, ,MongoDB",
            "b": ["Rust", " Axum ", ""],
            "c": "[\"Vue\", \"Vite\"]",
            "d": ["a,b", "c"],
            "e": ""
        }));
        assert_eq!(p.csv_list("a").unwrap(), vec!["React", "Node.js", "MongoDB"]);
        assert_eq!(p.csv_list("b").unwrap(), vec!["Rust", "Axum"]);
        assert_eq!(p.csv_list("c").unwrap(), vec!["Vue", "Vite"]);
        assert_eq!(p.csv_list("d").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(p.csv_list("e").unwrap(), Vec::<String>::new());
        assert_eq!(p.csv_list("missing"), None);
    }

    #[test]
    fn test_line_list_keeps_commas() {
        let p = payload(json!({"a": "Source code, documented\n\n  Setup call  \n"}));
        assert_eq!(
            p.line_list("a").unwrap(),
            vec!["Source code, documented", "Setup call"]
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Links {
        github: Option<String>,
    }

    #[test]
    fn test_json_inline_or_encoded() {
        let p = payload(json!({
            "a": {"github": "https://github.com/me"},
            "b": "{\"github\": \"https://github.com/you\"}",
            "c": "{not json",
        }));
        assert_eq!(
            p.json::<Links>("a").unwrap().unwrap().github.as_deref(),
            Some("https://github.com/me")
        );
        assert_eq!(
            p.json::<Links>("b").unwrap().unwrap().github.as_deref(),
            Some("https://github.com/you")
        );
        assert_eq!(p.json::<Links>("c"), Err(Malformed));
        assert_eq!(p.json::<Links>("missing"), Ok(None));
    }

    #[test]
    fn test_date_forms() {
        let p = payload(json!({
            "a": "2024-03-01", "b": "2024-03-01T10:00:00Z", "c": "", "d": "March"
        }));
        let march = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(p.date("a"), Ok(Some(march)));
        assert_eq!(p.date("b"), Ok(Some(march)));
        assert_eq!(p.date("c"), Ok(Some(None)));
        assert_eq!(p.date("d"), Err(Malformed));
        assert_eq!(p.date("missing"), Ok(None));
    }

    #[test]
    fn test_violations_collect_fields() {
        let p = payload(json!({"order": "x", "title": "ab"}));
        let mut violations = Violations::new();

        let order = violations.take(
            "order",
            p.integer("order"),
            "Order must be a positive integer",
        );
        assert_eq!(order, None);
        let title = p.text("title").unwrap_or_default();
        violations.length("title", &title, 3, 100, "Title must be between 3 and 100 characters");
        violations.require("description", p.text("description"), "Description is required");

        match violations.finish() {
            Err(ApiError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["order", "title", "description"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_violations_pass() {
        assert!(Violations::new().finish().is_ok());
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    enum Stage {
        InProgress,
        Done,
    }

    #[test]
    fn test_choice_uses_serde_names() {
        let p = payload(json!({"a": "in-progress", "b": " done ", "c": "InProgress", "d": ""}));
        assert_eq!(p.choice::<Stage>("a"), Ok(Some(Stage::InProgress)));
        assert_eq!(p.choice::<Stage>("b"), Ok(Some(Stage::Done)));
        assert_eq!(p.choice::<Stage>("c"), Err(Malformed));
        assert_eq!(p.choice::<Stage>("d"), Ok(None));
    }

    #[test]
    fn test_clearable_text() {
        let p = payload(json!({"a": " x ", "b": ""}));
        assert_eq!(p.clearable_text("a"), Some(Some("x".to_string())));
        assert_eq!(p.clearable_text("b"), Some(None));
        assert_eq!(p.clearable_text("c"), None);
    }
}
