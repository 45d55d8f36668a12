//! Named argument access for registry factories

use crate::error::ArgumentError;
use crate::object::CimType;
use crate::value::Value;
use indexmap::IndexMap;

/// Conversion from a built [`Value`] into a plain Rust type
pub trait FromValue: Sized {
    /// Human readable description of the accepted shape
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(x),
            Value::Int(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "a list";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    const EXPECTED: &'static str = "a mapping";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(key, item)| T::from_value(item).map(|item| (key, item)))
                .collect(),
            _ => None,
        }
    }
}

/// The fully built arguments handed to a factory
///
/// Factories take arguments by name; [`Arguments::finish`] rejects any that
/// were not consumed, which is how wrong arity surfaces as an
/// [`ArgumentError`].
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// Remove an argument regardless of its shape
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    /// Take a required argument; `null` counts as missing
    pub fn required<T: FromValue>(&mut self, name: &str) -> Result<T, ArgumentError> {
        self.optional(name)?.ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })
    }

    /// Take an optional argument; absent and `null` both yield `None`
    pub fn optional<T: FromValue>(&mut self, name: &str) -> Result<Option<T>, ArgumentError> {
        match self.take(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => {
                let found = value.kind();
                T::from_value(value)
                    .map(Some)
                    .ok_or_else(|| wrong_type(name, T::EXPECTED, found))
            }
        }
    }

    /// Take an optional argument holding a registered object of type `T`
    pub fn optional_object<T: CimType>(&mut self, name: &str) -> Result<Option<T>, ArgumentError> {
        match self.take(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match value.downcast_ref::<T>() {
                Some(object) => Ok(Some(object.clone())),
                None => Err(wrong_type(name, T::TYPE_NAME, value.kind())),
            },
        }
    }

    /// Take a required argument holding a registered object of type `T`
    pub fn required_object<T: CimType>(&mut self, name: &str) -> Result<T, ArgumentError> {
        self.optional_object(name)?
            .ok_or_else(|| ArgumentError::Missing {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail if any argument was left unconsumed
    pub fn finish(self) -> Result<(), ArgumentError> {
        match self.values.into_iter().next() {
            Some((name, _)) => Err(ArgumentError::Unexpected { name }),
            None => Ok(()),
        }
    }
}

fn wrong_type(name: &str, expected: &'static str, found: &str) -> ArgumentError {
    ArgumentError::WrongType {
        name: name.to_string(),
        expected,
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, Value)]) -> Arguments {
        Arguments::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_required_and_optional() {
        let mut a = args(&[("classname", "CIM_Foo".into()), ("namespace", Value::Null)]);

        let classname: String = a.required("classname").unwrap();
        let namespace: Option<String> = a.optional("namespace").unwrap();
        let host: Option<String> = a.optional("host").unwrap();

        assert_eq!(classname, "CIM_Foo");
        assert_eq!(namespace, None);
        assert_eq!(host, None);
        assert!(a.finish().is_ok());
    }

    #[test]
    fn test_missing_required() {
        let mut a = Arguments::default();
        let result: Result<String, _> = a.required("classname");
        assert!(matches!(result, Err(ArgumentError::Missing { name }) if name == "classname"));
    }

    #[test]
    fn test_wrong_type() {
        let mut a = args(&[("classname", Value::Int(5))]);
        let result: Result<String, _> = a.required("classname");
        assert_eq!(
            result,
            Err(ArgumentError::WrongType {
                name: "classname".into(),
                expected: "a string",
                found: "integer".into(),
            })
        );
    }

    #[test]
    fn test_leftover_argument_is_rejected() {
        let mut a = args(&[("classname", "X".into()), ("bogus", Value::Bool(true))]);
        let _: String = a.required("classname").unwrap();
        assert_eq!(
            a.finish(),
            Err(ArgumentError::Unexpected {
                name: "bogus".into()
            })
        );
    }

    #[test]
    fn test_list_with_mismatched_element() {
        let mut a = args(&[(
            "names",
            Value::List(vec!["a".into(), Value::Int(1)]),
        )]);
        let result: Result<Vec<String>, _> = a.required("names");
        assert!(matches!(result, Err(ArgumentError::WrongType { expected: "a list", .. })));
    }
}
