//! Node attribute values
//!
//! Typed, read-only access to the named parameters of a source node.

use std::collections::HashMap;

use crate::error::ErrorKind;

/// The value of a single node attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int64(i64),
    Float64(f64),
    String(String),
    Int64s(Vec<i64>),
    Float64s(Vec<f64>),
    Strings(Vec<String>),
}

impl AttributeValue {
    /// Name of the stored variant, used in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Int64(_) => <i64 as FromAttribute>::EXPECTED,
            AttributeValue::Float64(_) => <f64 as FromAttribute>::EXPECTED,
            AttributeValue::String(_) => <String as FromAttribute>::EXPECTED,
            AttributeValue::Int64s(_) => <Vec<i64> as FromAttribute>::EXPECTED,
            AttributeValue::Float64s(_) => <Vec<f64> as FromAttribute>::EXPECTED,
            AttributeValue::Strings(_) => <Vec<String> as FromAttribute>::EXPECTED,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(value: Vec<i64>) -> Self {
        Self::Int64s(value)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Float64s(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::Strings(value)
    }
}

/// Conversion from a stored [`AttributeValue`] into a concrete Rust type.
///
/// No numeric coercion happens: an `Int64` attribute cannot be read as `f64`.
pub trait FromAttribute: Sized {
    /// Name of the expected attribute type.
    const EXPECTED: &'static str;

    fn from_attribute(value: &AttributeValue) -> Option<Self>;
}

macro_rules! from_attribute {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromAttribute for $ty {
            const EXPECTED: &'static str = $name;

            fn from_attribute(value: &AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

from_attribute!(i64, Int64, "int");
from_attribute!(f64, Float64, "float");
from_attribute!(String, String, "string");
from_attribute!(Vec<i64>, Int64s, "ints");
from_attribute!(Vec<f64>, Float64s, "floats");
from_attribute!(Vec<String>, Strings, "strings");

/// Immutable attribute map of a source node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: HashMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new(values: HashMap<String, AttributeValue>) -> Self {
        Self { values }
    }

    /// Read `name`, falling back to `default` when it is absent.
    pub fn get<T: FromAttribute>(&self, name: &str, default: T) -> Result<T, ErrorKind> {
        match self.values.get(name) {
            Some(value) => convert(name, value),
            None => Ok(default),
        }
    }

    /// Read `name`, failing when it is absent.
    pub fn get_required<T: FromAttribute>(&self, name: &str) -> Result<T, ErrorKind> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ErrorKind::MissingAttribute {
                name: name.to_string(),
            })?;
        convert(name, value)
    }
}

impl FromIterator<(String, AttributeValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn convert<T: FromAttribute>(name: &str, value: &AttributeValue) -> Result<T, ErrorKind> {
    T::from_attribute(value).ok_or_else(|| ErrorKind::AttributeTypeMismatch {
        name: name.to_string(),
        expected: T::EXPECTED,
        actual: value.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> Attributes {
        [
            ("keepdims".to_string(), AttributeValue::Int64(0)),
            ("axes".to_string(), AttributeValue::Int64s(vec![0, -1])),
            ("mode".to_string(), AttributeValue::from("constant")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn get_returns_stored_value() {
        let attrs = attrs();
        assert_eq!(attrs.get("keepdims", 1i64), Ok(0));
        assert_eq!(attrs.get("axes", Vec::<i64>::new()), Ok(vec![0, -1]));
        assert_eq!(attrs.get("mode", String::new()), Ok("constant".to_string()));
    }

    #[test]
    fn get_falls_back_to_default() {
        let attrs = attrs();
        assert_eq!(attrs.get("noop_with_empty_axes", 0i64), Ok(0));
        assert_eq!(attrs.get("alpha", 0.5f64), Ok(0.5));
    }

    #[test]
    fn get_required_missing() {
        let result = attrs().get_required::<i64>("axis");
        assert_eq!(
            result,
            Err(ErrorKind::MissingAttribute {
                name: "axis".to_string()
            })
        );
    }

    #[test]
    fn scalar_requested_as_sequence() {
        let result = attrs().get("keepdims", Vec::<i64>::new());
        assert_eq!(
            result,
            Err(ErrorKind::AttributeTypeMismatch {
                name: "keepdims".to_string(),
                expected: "ints",
                actual: "int",
            })
        );
    }

    #[test]
    fn no_numeric_coercion() {
        let result = attrs().get_required::<f64>("keepdims");
        assert!(matches!(
            result,
            Err(ErrorKind::AttributeTypeMismatch { .. })
        ));
    }
}
