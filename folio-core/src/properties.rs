//! The per-item property bag.
//!
//! Properties are stored exactly as written so that documents round-trip
//! untouched, including keys this build does not understand. Typed access
//! with defaults lives in [`crate::widget::WidgetProps`].

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::color::{is_color_property, Color};
use crate::error::{FolioError, FolioResult};

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Explicit null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integral number.
    Integer(i64),
    /// Fractional number.
    Float(f64),
    /// String value.
    String(String),
    /// Color (only under a color key).
    Color(Color),
}

impl PropertyValue {
    /// Apply the color convention for `key`.
    ///
    /// Integers under a color key become colors; colors under any other key
    /// are flattened to their packed integer.
    #[must_use]
    pub fn normalize(key: &str, value: Self) -> Self {
        match value {
            Self::Integer(n) if is_color_property(key) => {
                Color::from_wire_int(n).map_or(Self::Integer(n), Self::Color)
            }
            Self::Color(color) if !is_color_property(key) => {
                Self::Integer(i64::from(color.to_packed()))
            }
            other => other,
        }
    }

    /// Get the string, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a number from either numeric variant.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the flag, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the color, if this is a color.
    #[must_use]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Whether the value has a JSON form. Only NaN and infinite floats do not.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    /// Whether this is an explicit null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Encode to JSON, packing colors.
    ///
    /// A non-finite float has no JSON form and encodes as null; callers that
    /// must round-trip check [`PropertyValue::is_finite`] first.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(n) => Value::from(*n),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Color(c) => Value::from(c.to_packed()),
        }
    }

    /// Decode a JSON scalar stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::MalformedDocument`] for arrays and objects.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_json(key: &str, value: &Value) -> FolioResult<Self> {
        let raw = match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Float(u as f64)
                } else {
                    Self::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => Self::String(s.clone()),
            Value::Array(_) | Value::Object(_) => {
                return Err(FolioError::MalformedDocument(format!(
                    "property '{key}' must be a string, number, boolean, color or null"
                )));
            }
        };
        Ok(Self::normalize(key, raw))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// String-keyed property map of a canvas item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: BTreeMap<String, PropertyValue>,
}

impl Properties {
    /// Create an empty property map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, applying the color convention for its key.
    ///
    /// Returns the previous value, if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        let key = key.into();
        let value = PropertyValue::normalize(&key, value.into());
        self.entries.insert(key, value)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key)
    }

    /// Whether the key is present (even if null).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Get a string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    /// Get a numeric value.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropertyValue::as_f64)
    }

    /// Get a boolean value.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(PropertyValue::as_bool)
    }

    /// Get a color value.
    #[must_use]
    pub fn get_color(&self, key: &str) -> Option<Color> {
        self.get(key).and_then(PropertyValue::as_color)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Key of the first value with no JSON form, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(key, _)| key.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Decode from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::MalformedDocument`] if any value is not a scalar.
    pub fn from_json(map: &Map<String, Value>) -> FolioResult<Self> {
        let mut entries = BTreeMap::new();
        for (key, value) in map {
            entries.insert(key.clone(), PropertyValue::from_json(key, value)?);
        }
        Ok(Self { entries })
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_under_color_key_becomes_color() {
        let mut props = Properties::new();
        props.insert("color", 0xFF00_FF00_i64);
        assert_eq!(
            props.get("color"),
            Some(&PropertyValue::Color(Color::from_packed(0xFF00_FF00)))
        );
    }

    #[test]
    fn test_color_under_plain_key_is_flattened() {
        let props = Properties::new().with("accent", Color::WHITE);
        assert_eq!(
            props.get("accent"),
            Some(&PropertyValue::Integer(0xFFFF_FFFF))
        );
    }

    #[test]
    fn test_decode_passes_through_non_allowlisted_values() {
        let map = json!({
            "text": "Hi",
            "fontSize": 18,
            "lineHeight": 1.5,
            "isBold": true,
            "imagePath": null,
            "color": 4_278_190_080_u64,
            "borderColor": "#ff0000",
        });
        let props = Properties::from_json(map.as_object().expect("object")).expect("decode");
        assert_eq!(props.get_str("text"), Some("Hi"));
        assert_eq!(props.get("fontSize"), Some(&PropertyValue::Integer(18)));
        assert_eq!(props.get("lineHeight"), Some(&PropertyValue::Float(1.5)));
        assert_eq!(props.get_bool("isBold"), Some(true));
        assert_eq!(props.get("imagePath"), Some(&PropertyValue::Null));
        assert_eq!(props.get_color("color"), Some(Color::BLACK));
        // Strings under color keys are left alone.
        assert_eq!(props.get_str("borderColor"), Some("#ff0000"));
    }

    #[test]
    fn test_decode_rejects_nested_values() {
        let map = json!({ "items": [1, 2, 3] });
        let result = Properties::from_json(map.as_object().expect("object"));
        assert!(matches!(result, Err(FolioError::MalformedDocument(_))));
    }

    #[test]
    fn test_encode_packs_colors() {
        let props = Properties::new()
            .with("backgroundColor", Color::from_argb(0xFF, 0x21, 0x96, 0xF3))
            .with("fontSize", 16.0);
        assert_eq!(
            props.to_json(),
            json!({ "backgroundColor": 0xFF21_96F3_u32, "fontSize": 16.0 })
        );
    }

    #[test]
    fn test_non_finite_floats_are_reported() {
        let props = Properties::new()
            .with("lineHeight", 1.5)
            .with("fontSize", f64::INFINITY);
        assert_eq!(props.first_non_finite(), Some("fontSize"));
        assert!(!PropertyValue::Float(f64::NAN).is_finite());
        assert!(PropertyValue::Integer(i64::MAX).is_finite());
        assert_eq!(Properties::new().with("a", 2.0).first_non_finite(), None);
    }

    #[test]
    fn test_integer_and_float_stay_distinct() {
        let props = Properties::new().with("a", 16).with("b", 16.0);
        let back = Properties::from_json(props.to_json().as_object().expect("object"))
            .expect("decode");
        assert_eq!(back, props);
    }
}
