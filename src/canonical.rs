//! Canonical rendering of JSON values.
//!
//! Two values that differ only in object key order render to the same
//! string; any other structural difference renders differently. The output
//! feeds content-derived identifiers and order-insensitive comparison.

use serde_json::Value;

/// Whether array element order is significant when canonicalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayOrder {
    #[default]
    Significant,
    /// Elements are sorted by their own canonical form.
    Insignificant,
}

/// Render a value canonically, keeping array order.
pub fn canonicalize(value: &Value) -> String {
    canonicalize_with(value, ArrayOrder::Significant)
}

/// Render a value canonically with the given array-order treatment.
pub fn canonicalize_with(value: &Value, order: ArrayOrder) -> String {
    let mut out = String::new();
    write_canonical(value, order, &mut out);
    out
}

/// Structural equality ignoring object key order and array order.
pub fn equivalent(a: &Value, b: &Value) -> bool {
    canonicalize_with(a, ArrayOrder::Insignificant) == canonicalize_with(b, ArrayOrder::Insignificant)
}

fn write_canonical(value: &Value, order: ArrayOrder, out: &mut String) {
    match value {
        Value::Array(items) => {
            let mut rendered: Vec<String> = items
                .iter()
                .map(|item| canonicalize_with(item, order))
                .collect();
            if order == ArrayOrder::Insignificant {
                rendered.sort();
            }
            out.push('[');
            out.push_str(&rendered.join(","));
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], order, out);
            }
            out.push('}');
        }
        // Scalars and null use their JSON encoding
        scalar => out.push_str(&scalar.to_string()),
    }
}
