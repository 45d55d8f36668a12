//! CIM object types exposed to test cases
//!
//! Each type is registered under its CIM-XML name so test cases can build
//! arguments and expected results with `pywbem_object: CIMInstance` etc.

use indexmap::IndexMap;
use wbem_core::{ArgumentError, Arguments, CimType, Constructible, TypeRegistryBuilder, Value};

/// Path to an instance: class name plus key property values
#[derive(Debug, Clone, PartialEq)]
pub struct CimInstanceName {
    pub classname: String,
    pub keybindings: IndexMap<String, Value>,
    pub namespace: Option<String>,
    pub host: Option<String>,
}

impl CimInstanceName {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            keybindings: IndexMap::new(),
            namespace: None,
            host: None,
        }
    }

    pub fn with_keybinding(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keybindings.insert(name.into(), value.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl CimType for CimInstanceName {
    const TYPE_NAME: &'static str = "CIMInstanceName";
}

impl Constructible for CimInstanceName {
    fn construct(args: &mut Arguments) -> Result<Self, ArgumentError> {
        let name = Self {
            classname: args.required("classname")?,
            keybindings: args.optional("keybindings")?.unwrap_or_default(),
            namespace: args.optional("namespace")?,
            host: args.optional("host")?,
        };

        for (key, value) in &name.keybindings {
            let valid = match value {
                Value::String(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_) => true,
                Value::Object(object) => object.is::<CimInstanceName>(),
                _ => false,
            };
            if !valid {
                return Err(ArgumentError::Invalid {
                    name: "keybindings".to_string(),
                    reason: format!("key '{}' has unsupported value {}", key, value.kind()),
                });
            }
        }
        Ok(name)
    }
}

/// A named, typed property value
///
/// The CIM type is optional; when absent it is inferred from the value and
/// ignored for equality.
#[derive(Debug, Clone)]
pub struct CimProperty {
    pub name: String,
    pub value: Value,
    pub cim_type: Option<String>,
}

impl CimProperty {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            cim_type: None,
        }
    }

    pub fn with_type(mut self, cim_type: impl Into<String>) -> Self {
        self.cim_type = Some(cim_type.into());
        self
    }

    /// Explicit CIM type, or the one implied by the value
    pub fn effective_type(&self) -> &str {
        match &self.cim_type {
            Some(cim_type) => cim_type,
            None => infer_type(&self.value),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.value, Value::List(_))
    }
}

fn infer_type(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Int(_) => "sint64",
        Value::Float(_) => "real64",
        Value::Object(object) if object.is::<CimInstanceName>() => "reference",
        Value::List(items) => items.iter().find(|v| !v.is_null()).map_or("string", infer_type),
        _ => "string",
    }
}

impl PartialEq for CimProperty {
    fn eq(&self, other: &Self) -> bool {
        let types_match = match (&self.cim_type, &other.cim_type) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        self.name == other.name && self.value == other.value && types_match
    }
}

impl CimType for CimProperty {
    const TYPE_NAME: &'static str = "CIMProperty";
}

impl Constructible for CimProperty {
    fn construct(args: &mut Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            name: args.required("name")?,
            value: args.optional("value")?.unwrap_or(Value::Null),
            cim_type: args.optional("type")?,
        })
    }
}

/// An instance of a CIM class
#[derive(Debug, Clone, PartialEq)]
pub struct CimInstance {
    pub classname: String,
    pub properties: IndexMap<String, CimProperty>,
    pub path: Option<CimInstanceName>,
}

impl CimInstance {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            properties: IndexMap::new(),
            path: None,
        }
    }

    pub fn with_property(mut self, property: CimProperty) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    pub fn with_path(mut self, path: CimInstanceName) -> Self {
        self.path = Some(path);
        self
    }

    /// Value of a property, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).map(|p| &p.value)
    }
}

impl CimType for CimInstance {
    const TYPE_NAME: &'static str = "CIMInstance";
}

impl Constructible for CimInstance {
    fn construct(args: &mut Arguments) -> Result<Self, ArgumentError> {
        let classname = args.required("classname")?;
        let properties = match args.take("properties") {
            None | Some(Value::Null) => IndexMap::new(),
            // name: value, or name: CIMProperty
            Some(Value::Map(map)) => map
                .into_iter()
                .map(|(name, value)| {
                    let property = match value.downcast_ref::<CimProperty>() {
                        Some(property) => CimProperty {
                            name: name.clone(),
                            ..property.clone()
                        },
                        None => CimProperty::new(name.clone(), value),
                    };
                    (name, property)
                })
                .collect(),
            Some(Value::List(items)) => items
                .into_iter()
                .map(|item| match item.downcast_ref::<CimProperty>() {
                    Some(property) => Ok((property.name.clone(), property.clone())),
                    None => Err(ArgumentError::Invalid {
                        name: "properties".to_string(),
                        reason: format!("list items must be CIMProperty, got {}", item.kind()),
                    }),
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(ArgumentError::WrongType {
                    name: "properties".to_string(),
                    expected: "mapping or list of CIMProperty",
                    found: other.kind().to_string(),
                })
            }
        };

        Ok(Self {
            classname,
            properties,
            path: args.optional_object("path")?,
        })
    }
}

/// Path to a class
#[derive(Debug, Clone, PartialEq)]
pub struct CimClassName {
    pub classname: String,
    pub namespace: Option<String>,
    pub host: Option<String>,
}

impl CimClassName {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            namespace: None,
            host: None,
        }
    }
}

impl CimType for CimClassName {
    const TYPE_NAME: &'static str = "CIMClassName";
}

impl Constructible for CimClassName {
    fn construct(args: &mut Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            classname: args.required("classname")?,
            namespace: args.optional("namespace")?,
            host: args.optional("host")?,
        })
    }
}

/// Register every CIM type this client exposes
pub fn register_types(registry: TypeRegistryBuilder) -> TypeRegistryBuilder {
    registry
        .register_type::<CimInstanceName>()
        .register_type::<CimInstance>()
        .register_type::<CimProperty>()
        .register_type::<CimClassName>()
}
