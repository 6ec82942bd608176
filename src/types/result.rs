//! Result units: the smallest piece of model output (text, structured data or image).

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of completion output.
///
/// Providers split a single logical answer into many physical pieces; adjacent units of the
/// same kind are folded back together with [`combine`]. Units of different kinds keep their
/// order and are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResultUnit {
    Text(String),
    #[serde(rename = "json", alias = "structured")]
    Structured(Value),
    /// Data URI or URL.
    Image(String),
}

impl ResultUnit {
    pub fn text(value: impl Into<String>) -> Self {
        ResultUnit::Text(value.into())
    }

    pub fn structured(value: Value) -> Self {
        ResultUnit::Structured(value)
    }

    pub fn image(value: impl Into<String>) -> Self {
        ResultUnit::Image(value.into())
    }

    /// Build an image unit from raw bytes as a base64 data URI.
    pub fn image_from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        ResultUnit::Image(format!("data:{};base64,{}", mime, encoded))
    }

    /// Wire tag of this unit (`text`, `json` or `image`).
    pub fn tag(&self) -> &'static str {
        match self {
            ResultUnit::Text(_) => "text",
            ResultUnit::Structured(_) => "json",
            ResultUnit::Image(_) => "image",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultUnit::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            ResultUnit::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Merge `next` into `self` in place. Returns `next` back untouched when the kinds differ.
    pub fn absorb(&mut self, next: ResultUnit) -> Option<ResultUnit> {
        match (self, next) {
            (ResultUnit::Text(acc), ResultUnit::Text(s)) => {
                acc.push_str(&s);
                None
            }
            (ResultUnit::Structured(acc), ResultUnit::Structured(v)) => {
                merge_structured(acc, v);
                None
            }
            (_, other) => Some(other),
        }
    }
}

/// Combine two adjacent units.
///
/// Text concatenates. Structured values shallow-merge when both are objects (keys of `b`
/// win) and otherwise fall back to string concatenation. Any other pairing yields `None`:
/// the caller keeps `a` and appends `b` as a new unit.
pub fn combine(a: &ResultUnit, b: &ResultUnit) -> Option<ResultUnit> {
    let mut merged = a.clone();
    match merged.absorb(b.clone()) {
        None => Some(merged),
        Some(_) => None,
    }
}

/// Append `unit` to `units`, merging it into the last unit when [`combine`] allows.
pub fn push_unit(units: &mut Vec<ResultUnit>, unit: ResultUnit) {
    let rest = match units.last_mut() {
        Some(last) => last.absorb(unit),
        None => Some(unit),
    };
    if let Some(unit) = rest {
        units.push(unit);
    }
}

/// Fold a sequence of units with [`push_unit`].
pub fn reduce_units(units: impl IntoIterator<Item = ResultUnit>) -> Vec<ResultUnit> {
    let mut out = Vec::new();
    for unit in units {
        push_unit(&mut out, unit);
    }
    out
}

fn merge_structured(acc: &mut Value, next: Value) {
    match (acc, next) {
        (Value::Object(left), Value::Object(right)) => {
            for (k, v) in right {
                left.insert(k, v);
            }
        }
        (acc, next) => {
            let joined = format!("{}{}", value_text(acc), value_text(&next));
            *acc = Value::String(joined);
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_units_concatenate() {
        let merged = combine(&ResultUnit::text("Hel"), &ResultUnit::text("lo")).unwrap();
        assert_eq!(merged, ResultUnit::text("Hello"));
    }

    #[test]
    fn test_structured_objects_shallow_merge() {
        let a = ResultUnit::structured(json!({"a": 1, "b": {"x": 1}}));
        let b = ResultUnit::structured(json!({"b": {"y": 2}, "c": 3}));
        let merged = combine(&a, &b).unwrap();
        assert_eq!(
            merged,
            ResultUnit::structured(json!({"a": 1, "b": {"y": 2}, "c": 3}))
        );
    }

    #[test]
    fn test_structured_non_objects_fall_back_to_string() {
        let a = ResultUnit::structured(json!("{\"a\":"));
        let b = ResultUnit::structured(json!(1));
        assert_eq!(
            combine(&a, &b).unwrap(),
            ResultUnit::structured(json!("{\"a\":1"))
        );
    }

    #[test]
    fn test_mixed_kinds_never_merge() {
        assert!(combine(&ResultUnit::text("a"), &ResultUnit::image("b")).is_none());
        assert!(combine(&ResultUnit::image("a"), &ResultUnit::image("b")).is_none());
        assert!(combine(&ResultUnit::text("a"), &ResultUnit::structured(json!({}))).is_none());
    }

    #[test]
    fn test_push_unit_preserves_order() {
        let units = reduce_units(vec![
            ResultUnit::text("a"),
            ResultUnit::text("b"),
            ResultUnit::image("img"),
            ResultUnit::text("c"),
        ]);
        assert_eq!(
            units,
            vec![
                ResultUnit::text("ab"),
                ResultUnit::image("img"),
                ResultUnit::text("c"),
            ]
        );
    }

    #[test]
    fn test_wire_format() {
        let unit: ResultUnit = serde_json::from_value(json!({"type": "structured", "value": {"k": 1}})).unwrap();
        assert_eq!(unit, ResultUnit::structured(json!({"k": 1})));
        assert_eq!(
            serde_json::to_value(&unit).unwrap(),
            json!({"type": "json", "value": {"k": 1}})
        );
    }

    #[test]
    fn test_image_from_bytes() {
        let unit = ResultUnit::image_from_bytes("image/png", b"abc");
        assert_eq!(unit, ResultUnit::image("data:image/png;base64,YWJj"));
    }
}
