//! Declarative value specifications
//!
//! A value specification is a YAML tree where any mapping carrying the
//! [`OBJECT_TAG`] key describes an object to construct:
//!
//! ```yaml
//! InstanceName:
//!   pywbem_object: CIMInstanceName
//!   classname: PyWBEM_Person
//!   keybindings:
//!     Name: Fritz
//! ```
//!
//! Every other key of such a mapping is a named constructor argument, itself a
//! value specification.

use crate::error::SpecError;
use crate::value::Value;
use indexmap::IndexMap;
use serde_yaml::Value as Yaml;

/// Mapping key that marks a constructed object
pub const OBJECT_TAG: &str = "pywbem_object";

/// A declarative, recursively nested description of a value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSpec {
    /// A literal leaf: null, boolean, number or string
    Scalar(Value),
    List(Vec<ValueSpec>),
    Map(IndexMap<String, ValueSpec>),
    Constructed(ConstructedSpec),
}

/// An object to be built by the factory registered under `type_name`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructedSpec {
    pub type_name: String,
    pub arguments: IndexMap<String, ValueSpec>,
}

impl ConstructedSpec {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            arguments: IndexMap::new(),
        }
    }

    /// Add a named argument
    pub fn arg(mut self, name: impl Into<String>, spec: impl Into<ValueSpec>) -> Self {
        self.arguments.insert(name.into(), spec.into());
        self
    }
}

impl ValueSpec {
    /// Convert a YAML fragment into a value specification
    pub fn from_yaml(yaml: &Yaml) -> Result<Self, SpecError> {
        Self::from_yaml_at(yaml, "$")
    }

    fn from_yaml_at(yaml: &Yaml, path: &str) -> Result<Self, SpecError> {
        match yaml {
            Yaml::Null => Ok(ValueSpec::Scalar(Value::Null)),
            Yaml::Bool(b) => Ok(ValueSpec::Scalar(Value::Bool(*b))),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ValueSpec::Scalar(Value::Int(i)))
                } else if n.is_f64() {
                    n.as_f64()
                        .map(|x| ValueSpec::Scalar(Value::Float(x)))
                        .ok_or_else(|| SpecError::NumberOutOfRange {
                            path: path.to_string(),
                        })
                } else {
                    Err(SpecError::NumberOutOfRange {
                        path: path.to_string(),
                    })
                }
            }
            Yaml::String(s) => Ok(ValueSpec::Scalar(Value::String(s.clone()))),
            Yaml::Sequence(seq) => seq
                .iter()
                .enumerate()
                .map(|(i, item)| Self::from_yaml_at(item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(ValueSpec::List),
            Yaml::Mapping(map) => {
                let mut type_name = None;
                let mut entries = IndexMap::with_capacity(map.len());

                for (key, value) in map {
                    let Some(key) = key.as_str() else {
                        return Err(SpecError::NonStringKey {
                            path: path.to_string(),
                        });
                    };
                    let child_path = format!("{}.{}", path, key);

                    if key == OBJECT_TAG {
                        let name = value.as_str().ok_or(SpecError::InvalidTypeName {
                            tag: OBJECT_TAG,
                            path: child_path,
                        })?;
                        type_name = Some(name.to_string());
                    } else {
                        entries.insert(key.to_string(), Self::from_yaml_at(value, &child_path)?);
                    }
                }

                Ok(match type_name {
                    Some(type_name) => ValueSpec::Constructed(ConstructedSpec {
                        type_name,
                        arguments: entries,
                    }),
                    None => ValueSpec::Map(entries),
                })
            }
            Yaml::Tagged(tagged) => Err(SpecError::UnsupportedTag {
                tag: tagged.tag.to_string(),
                path: path.to_string(),
            }),
        }
    }

    /// Whether the tree contains no constructed objects
    pub fn is_plain(&self) -> bool {
        match self {
            ValueSpec::Scalar(_) => true,
            ValueSpec::List(items) => items.iter().all(ValueSpec::is_plain),
            ValueSpec::Map(map) => map.values().all(ValueSpec::is_plain),
            ValueSpec::Constructed(_) => false,
        }
    }
}

impl From<Value> for ValueSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::List(items) => ValueSpec::List(items.into_iter().map(Into::into).collect()),
            Value::Map(map) => {
                ValueSpec::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            scalar => ValueSpec::Scalar(scalar),
        }
    }
}

impl From<ConstructedSpec> for ValueSpec {
    fn from(spec: ConstructedSpec) -> Self {
        ValueSpec::Constructed(spec)
    }
}

impl From<&str> for ValueSpec {
    fn from(s: &str) -> Self {
        ValueSpec::Scalar(Value::from(s))
    }
}

impl From<bool> for ValueSpec {
    fn from(b: bool) -> Self {
        ValueSpec::Scalar(Value::Bool(b))
    }
}

impl From<i64> for ValueSpec {
    fn from(i: i64) -> Self {
        ValueSpec::Scalar(Value::Int(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ValueSpec {
        let yaml: Yaml = serde_yaml::from_str(yaml).unwrap();
        ValueSpec::from_yaml(&yaml).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse("42"), ValueSpec::Scalar(Value::Int(42)));
        assert_eq!(parse("1.5"), ValueSpec::Scalar(Value::Float(1.5)));
        assert_eq!(parse("true"), ValueSpec::Scalar(Value::Bool(true)));
        assert_eq!(parse("~"), ValueSpec::Scalar(Value::Null));
        assert_eq!(parse("Fritz"), ValueSpec::from("Fritz"));
    }

    #[test]
    fn test_constructed_object() {
        let spec = parse(
            r#"
pywbem_object: CIMInstanceName
classname: PyWBEM_Person
keybindings:
  Name: Fritz
"#,
        );

        let ValueSpec::Constructed(constructed) = spec else {
            panic!("expected constructed spec");
        };
        assert_eq!(constructed.type_name, "CIMInstanceName");
        assert_eq!(constructed.arguments.len(), 2);
        assert_eq!(
            constructed.arguments["classname"],
            ValueSpec::from("PyWBEM_Person")
        );
        assert!(matches!(constructed.arguments["keybindings"], ValueSpec::Map(_)));
    }

    #[test]
    fn test_argument_order_is_preserved() {
        let spec = parse("pywbem_object: T\nz: 1\na: 2\nm: 3\n");
        let ValueSpec::Constructed(constructed) = spec else {
            panic!("expected constructed spec");
        };
        let names: Vec<_> = constructed.arguments.keys().map(String::as_str).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn test_non_string_type_name() {
        let yaml: Yaml = serde_yaml::from_str("pywbem_object: 5").unwrap();
        assert!(matches!(
            ValueSpec::from_yaml(&yaml),
            Err(SpecError::InvalidTypeName { .. })
        ));
    }

    #[test]
    fn test_non_string_key() {
        let yaml: Yaml = serde_yaml::from_str("{1: a}").unwrap();
        assert!(matches!(
            ValueSpec::from_yaml(&yaml),
            Err(SpecError::NonStringKey { .. })
        ));
    }

    #[test]
    fn test_is_plain() {
        assert!(parse("[1, {a: b}]").is_plain());
        assert!(!parse("[{pywbem_object: X}]").is_plain());
    }
}
