//! Dynamic values exchanged with the client under test

use crate::object::{CimObject, CimType};
use indexmap::IndexMap;
use std::fmt;

/// A live value: a scalar, a container, or a registered object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(Box<dyn CimObject>),
}

impl Value {
    /// Wrap a registered type
    pub fn object<T: CimType>(object: T) -> Self {
        Value::Object(Box::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalars are the leaves of a value tree
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&(dyn CimObject + 'static)> {
        match self {
            Value::Object(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    /// Downcast an object value to a concrete registered type
    pub fn downcast_ref<T: CimType>(&self) -> Option<&T> {
        self.as_object().and_then(|object| object.downcast_ref::<T>())
    }

    /// Short description of the value's kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
            Value::Object(object) => object.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Object(object) => write!(f, "{:?}", object),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Marker(u8);

    impl CimType for Marker {
        const TYPE_NAME: &'static str = "Marker";
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::from("x").kind(), "string");
        assert_eq!(Value::object(Marker(1)).kind(), "Marker");
    }

    #[test]
    fn test_object_equality_is_structural() {
        assert_eq!(Value::object(Marker(1)), Value::object(Marker(1)));
        assert_ne!(Value::object(Marker(1)), Value::object(Marker(2)));
        assert_ne!(Value::object(Marker(1)), Value::Int(1));
    }

    #[test]
    fn test_downcast_ref() {
        let value = Value::object(Marker(7));
        assert_eq!(value.downcast_ref::<Marker>(), Some(&Marker(7)));
        assert_eq!(Value::Int(7).downcast_ref::<Marker>(), None);
    }

    #[test]
    fn test_as_object_keeps_the_concrete_type() {
        let value = Value::object(Marker(9));
        let object = value.as_object().unwrap();

        assert_eq!(object.type_name(), "Marker");
        assert_eq!(object.downcast_ref::<Marker>(), Some(&Marker(9)));
        assert!(Value::from("x").as_object().is_none());
    }

    #[test]
    fn test_display() {
        let mut map = IndexMap::new();
        map.insert("Name".to_string(), Value::from("Fritz"));
        let value = Value::List(vec![Value::Map(map), Value::Int(3), Value::Null]);

        assert_eq!(value.to_string(), r#"[{Name: "Fritz"}, 3, null]"#);
    }
}
