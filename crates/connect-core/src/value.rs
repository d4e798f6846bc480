//! Host-native values and type descriptors exchanged in converted mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter, return value or variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// No value (return type of procedures).
    Void,
    Bool,
    Int64,
    Float64,
    Text,
    /// Array of the element type. Rank grows with nesting.
    Array(Box<ValueType>),
    /// Any value is accepted.
    Any,
}

impl ValueType {
    /// Create an array type of the given element type.
    pub fn array_of(element: ValueType) -> Self {
        ValueType::Array(Box::new(element))
    }

    /// Get the array rank of this type (0 for scalars).
    pub fn rank(&self) -> usize {
        match self {
            ValueType::Array(element) => 1 + element.rank(),
            _ => 0,
        }
    }

    /// Check whether a value of this type can be passed where `self` is
    /// declared.
    pub fn is_assignable_from(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) => true,
            (ValueType::Array(expected), ValueType::Array(actual)) => {
                expected.is_assignable_from(actual)
            }
            (expected, actual) => expected == actual,
        }
    }

    /// Check whether `value` matches this declared type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Void, Value::Void) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Int64, Value::Int(_)) => true,
            (ValueType::Float64, Value::Float(_)) => true,
            (ValueType::Text, Value::Text(_)) => true,
            (ValueType::Array(element), Value::Array(items)) => {
                items.iter().all(|item| element.accepts(item))
            }
            _ => false,
        }
    }

    /// Get the script-facing name of the type.
    pub fn name(&self) -> String {
        match self {
            ValueType::Void => "void".to_string(),
            ValueType::Bool => "bool".to_string(),
            ValueType::Int64 => "int".to_string(),
            ValueType::Float64 => "float".to_string(),
            ValueType::Text => "string".to_string(),
            ValueType::Array(element) => format!("{}[]", element.name()),
            ValueType::Any => "any".to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A host-native value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Void,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<Value>),
}

impl Value {
    /// Get the runtime type of this value.
    ///
    /// Empty or mixed arrays report `Any` as their element type.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Void => ValueType::Void,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int64,
            Value::Float(_) => ValueType::Float64,
            Value::Text(_) => ValueType::Text,
            Value::Array(items) => {
                let mut types = items.iter().map(Value::value_type);
                let element = match types.next() {
                    Some(first) if types.all(|t| t == first) => first,
                    _ => ValueType::Any,
                };
                ValueType::array_of(element)
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
