//! Code list loading.
//!
//! Accepted shapes: `{"codes": [...]}` or a bare array. Elements are kept as
//! they are; anything that is not a usable string is classified later.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::RawCode;

pub fn load_codes(path: impl AsRef<Path>) -> Result<Vec<RawCode>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read codes file: {}", path.display()))?;
    parse_codes(&raw).with_context(|| format!("parse codes file: {}", path.display()))
}

pub fn parse_codes(json: &str) -> Result<Vec<RawCode>> {
    let value: Value = serde_json::from_str(json).context("codes file is not valid JSON")?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("codes") {
            Some(Value::Array(items)) => items,
            Some(other) => bail!("'codes' must be an array, got {}", json_kind(&other)),
            None => bail!("object has no 'codes' key"),
        },
        other => bail!(
            "expected an array or an object with 'codes', got {}",
            json_kind(&other)
        ),
    };
    Ok(items.into_iter().map(RawCode::from).collect())
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_wrapped_and_bare_lists() {
        let wrapped = parse_codes(r#"{"codes": ["A", " B ", 3]}"#).unwrap();
        assert_eq!(wrapped.len(), 3);
        assert_eq!(wrapped[1].as_str(), Some(" B "));
        assert_eq!(wrapped[2].label(), "3");

        let bare = parse_codes(r#"["A", "B"]"#).unwrap();
        assert_eq!(bare, vec![RawCode::from("A"), RawCode::from("B")]);
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_codes(r#""A""#).is_err());
        assert!(parse_codes(r#"{"items": ["A"]}"#).is_err());
        let err = parse_codes(r#"{"codes": "A"}"#).unwrap_err();
        assert!(err.to_string().contains("'codes' must be an array"));
        assert!(parse_codes("not json").is_err());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("codes.json");
        let err = load_codes(&p).unwrap_err();
        assert!(format!("{err:#}").contains("codes.json"));

        fs::write(&p, r#"{"codes": ["X"]}"#).unwrap();
        assert_eq!(load_codes(&p).unwrap(), vec![RawCode::from("X")]);
    }
}
