//! Read-side record normalization
//!
//! Stored records may carry amenities written by older clients as
//! `{"S": "wifi"}` wrappers, prices as decimal text or strings, and may
//! lack display fields. Every read path funnels through here.

use serde_json::{json, Map, Value};

use crate::store::{item_to_json, AttributeValue, Item};

const PRICE_FIELDS: [&str; 2] = ["precoHora", "precoDia"];
const BACKFILL_FIELDS: [&str; 3] = ["name", "city", "district"];

/// Render a record with amenities unwrapped
pub fn normalize_record(item: &Item) -> Value {
    let mut out = record_map(item);
    if let Some(amenities) = item.get("amenities") {
        out.insert("amenities".to_string(), normalize_amenities(amenities));
    }
    Value::Object(out)
}

/// Render a record for a listing
///
/// On top of [`normalize_record`], prices are always present as
/// floating-point numbers and display fields default to `""`.
pub fn normalize_listing(item: &Item) -> Value {
    let mut out = match normalize_record(item) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for field in PRICE_FIELDS {
        out.insert(field.to_string(), json!(price_of(item.get(field))));
    }
    for field in BACKFILL_FIELDS {
        out.entry(field).or_insert_with(|| json!(""));
    }
    Value::Object(out)
}

fn record_map(item: &Item) -> Map<String, Value> {
    match item_to_json(item) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Normalize an amenities attribute
///
/// - every element a `{"S": <string>}` wrapper: unwrapped to strings
/// - every element a plain string: unchanged
/// - anything else: replaced with an empty list
///
/// Non-list attributes are rendered unchanged.
pub fn normalize_amenities(value: &AttributeValue) -> Value {
    let AttributeValue::L(elements) = value else {
        return value.to_json();
    };

    let wrapped: Option<Vec<Value>> = elements.iter().map(unwrap_string).collect();
    if let Some(strings) = wrapped {
        return Value::Array(strings);
    }
    if elements.iter().all(|e| matches!(e, AttributeValue::S(_))) {
        return value.to_json();
    }
    Value::Array(Vec::new())
}

fn unwrap_string(element: &AttributeValue) -> Option<Value> {
    match element {
        AttributeValue::M(fields) if fields.len() == 1 => {
            fields.get("S").and_then(AttributeValue::as_str).map(|s| json!(s))
        }
        _ => None,
    }
}

/// Read a stored price as a float, zero when absent or unusable
pub fn price_of(value: Option<&AttributeValue>) -> f64 {
    let parsed = match value {
        Some(AttributeValue::N(text) | AttributeValue::S(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).unwrap_or(0.0)
}

/// Coerce an inbound JSON price, zero when unusable
pub fn coerce_price(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).unwrap_or(0.0)
}
