//! Inbound data sanitization.
//!
//! Pure transformations over parsed values, applied between parsing and
//! deserialization so handlers only ever see sanitized data: operator-key
//! stripping guards the document store against query-operator injection,
//! markup escaping neutralizes executable markup in string fields.

use serde_json::Value;

/// Runs both sanitization passes in order.
pub fn scrub(value: Value) -> Value {
    escape_markup(strip_operators(value))
}

/// Recursively drops object keys that start with `$` or contain `.`.
pub fn strip_operators(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !(key.starts_with('$') || key.contains('.')))
                .map(|(key, inner)| (key, strip_operators(inner)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(strip_operators).collect())
        }
        other => other,
    }
}

/// Recursively entity-escapes `<` and `>` in string values.
pub fn escape_markup(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_text(&s)),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (key, escape_markup(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(escape_markup).collect()),
        other => other,
    }
}

/// Escapes angle brackets in one string.
pub fn escape_text(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_operator_keys() {
        let dirty = json!({
            "name": "The Forest Hiker",
            "$where": "sleep(1000)",
            "price.gt": 1,
            "nested": {"$ne": null, "ok": true}
        });
        let clean = strip_operators(dirty);
        assert_eq!(
            clean,
            json!({
                "name": "The Forest Hiker",
                "nested": {"ok": true}
            })
        );
    }

    #[test]
    fn test_strip_operators_inside_arrays() {
        let dirty = json!([{"$gt": 1}, {"keep": 2}]);
        assert_eq!(strip_operators(dirty), json!([{}, {"keep": 2}]));
    }

    #[test]
    fn test_escape_markup_in_strings() {
        let dirty = json!({"summary": "<script>alert(1)</script> nice"});
        let clean = escape_markup(dirty);
        assert_eq!(
            clean["summary"],
            "&lt;script&gt;alert(1)&lt;/script&gt; nice"
        );
    }

    #[test]
    fn test_scrub_applies_both() {
        let dirty = json!({"$inject": 1, "name": "<b>Tour</b>"});
        let clean = scrub(dirty);
        assert!(clean.get("$inject").is_none());
        assert_eq!(clean["name"], "&lt;b&gt;Tour&lt;/b&gt;");
    }

    #[test]
    fn test_non_string_values_untouched() {
        let value = json!({"price": 497.0, "secret": false});
        assert_eq!(scrub(value.clone()), value);
    }
}
