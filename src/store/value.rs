//! Attribute value model
//!
//! Values are typed the way the key-value store types them. Numbers are
//! kept as canonical decimal text so fixed-point amounts survive a round
//! trip through the store untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::logger;

/// A single stored record: attribute name to typed value
pub type Item = HashMap<String, AttributeValue>;

/// Typed attribute value
///
/// There is deliberately no null variant: an attribute without a value
/// is not part of the item at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number, as decimal text
    N(String),
    /// Boolean
    Bool(bool),
    /// Ordered list
    L(Vec<AttributeValue>),
    /// Nested map
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Build a number attribute from a float
    ///
    /// Non-finite input has no decimal representation and becomes zero.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::N(value.to_string())
        } else {
            Self::N("0".to_string())
        }
    }

    /// Convert a JSON value into an attribute, `None` for JSON `null`
    ///
    /// A `null` nested inside a list or map is dropped rather than stored.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::N(n.to_string())),
            Value::String(s) => Some(Self::S(s.clone())),
            Value::Array(items) => Some(Self::L(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| Self::nested(&format!("[{i}]"), v))
                    .collect(),
            )),
            Value::Object(fields) => Some(Self::M(
                fields
                    .iter()
                    .filter_map(|(k, v)| Self::nested(k, v).map(|av| (k.clone(), av)))
                    .collect(),
            )),
        }
    }

    fn nested(position: &str, value: &Value) -> Option<Self> {
        let converted = Self::from_json(value);
        if converted.is_none() {
            logger::log_debug(&format!("Dropping nested null at {position}"));
        }
        converted
    }

    /// Render the attribute as JSON
    ///
    /// Every number is rendered as a floating-point value. Number text
    /// that does not parse falls back to a JSON string.
    pub fn to_json(&self) -> Value {
        match self {
            Self::S(s) => Value::String(s.clone()),
            Self::N(n) => n
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or_else(|| Value::String(n.clone()), Value::Number),
            Self::Bool(b) => Value::Bool(*b),
            Self::L(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::M(fields) => Value::Object(map_to_json(fields)),
        }
    }

    /// Borrow the inner string of an `S` attribute
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Short type tag, used when logging values without their content
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::Bool(_) => "BOOL",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }
}

/// Render a whole item as a JSON object
pub fn item_to_json(item: &Item) -> Value {
    Value::Object(map_to_json(item))
}

fn map_to_json(fields: &HashMap<String, AttributeValue>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}
