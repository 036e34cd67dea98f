//! Metadata field reading.
//!
//! Producers write flat documents: a field is a top-level key whose leaf
//! value is read the way the producer meant it.

use serde_json::Value;

/// Usable text stored under a top-level key.
///
/// # Examples
/// ```
/// use herbtrace_core::extraction::field_text;
/// use serde_json::json;
/// let doc = json!({"cropName": " Tulsi ", "harvestDate": ""});
/// assert_eq!(field_text(&doc, "cropName").as_deref(), Some("Tulsi"));
/// assert_eq!(field_text(&doc, "harvestDate"), None);
/// ```
pub fn field_text(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(value_to_text)
}

/// Read a leaf as a usable text value.
///
/// Non-empty strings are trimmed and kept; non-zero numbers are rendered.
/// Empty strings, zero, booleans, null, arrays and objects carry no usable
/// value and yield `None`, so the next candidate key is tried.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => {
            if n.as_f64().map(|f| f == 0.0).unwrap_or(false) {
                None
            } else {
                Some(n.to_string())
            }
        }
        _ => None,
    }
}
