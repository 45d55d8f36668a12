//! Type registry mapping type names to factories
//!
//! The registry is assembled once at harness startup from the types the
//! client under test exposes, then frozen. Lookups during test execution
//! never mutate it, so a single registry can be shared across threads.

use crate::arguments::Arguments;
use crate::error::{ArgumentError, BuildError};
use crate::object::Constructible;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Construction capability for one type name
pub type Factory = Arc<dyn Fn(Arguments) -> Result<Value, ArgumentError> + Send + Sync>;

/// Immutable table of factories indexed by type name
#[derive(Clone, Default)]
pub struct TypeRegistry {
    factories: HashMap<String, Factory>,
}

impl TypeRegistry {
    /// Start assembling a registry
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Look up the factory for a type name
    pub fn resolve(&self, type_name: &str) -> Result<&Factory, BuildError> {
        trace!(type_name = %type_name, "Resolving type");
        self.factories
            .get(type_name)
            .ok_or_else(|| BuildError::UnknownType {
                type_name: type_name.to_string(),
                path: "$".to_string(),
            })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// All registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Mutable stage of a [`TypeRegistry`]
#[derive(Default)]
pub struct TypeRegistryBuilder {
    factories: HashMap<String, Factory>,
}

impl TypeRegistryBuilder {
    /// Register a factory under `type_name`
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register<F>(mut self, type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, ArgumentError> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        debug!(type_name = %type_name, "Registering type");

        if self
            .factories
            .insert(type_name.clone(), Arc::new(factory))
            .is_some()
        {
            warn!(type_name = %type_name, "Replacing previously registered type");
        }
        self
    }

    /// Register a [`Constructible`] type under its own type name
    pub fn register_type<T: Constructible>(self) -> Self {
        self.register(T::TYPE_NAME, |mut args: Arguments| {
            let object = T::construct(&mut args)?;
            args.finish()?;
            Ok(Value::object(object))
        })
    }

    /// Freeze the registry
    pub fn build(self) -> TypeRegistry {
        debug!(count = self.factories.len(), "Type registry built");
        TypeRegistry {
            factories: self.factories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::CimType;

    #[derive(Debug, Clone, PartialEq)]
    struct ClassName {
        classname: String,
    }

    impl CimType for ClassName {
        const TYPE_NAME: &'static str = "ClassName";
    }

    impl Constructible for ClassName {
        fn construct(args: &mut Arguments) -> Result<Self, ArgumentError> {
            Ok(Self {
                classname: args.required("classname")?,
            })
        }
    }

    fn class_args(classname: &str) -> Arguments {
        let mut values = indexmap::IndexMap::new();
        values.insert("classname".to_string(), Value::from(classname));
        Arguments::new(values)
    }

    #[test]
    fn test_resolve_registered_type() {
        let registry = TypeRegistry::builder().register_type::<ClassName>().build();

        let factory = registry.resolve("ClassName").unwrap();
        let value = factory(class_args("CIM_Foo")).unwrap();

        assert_eq!(
            value.downcast_ref::<ClassName>(),
            Some(&ClassName {
                classname: "CIM_Foo".into()
            })
        );
    }

    #[test]
    fn test_resolve_unknown_type() {
        let registry = TypeRegistry::builder().build();
        assert!(matches!(
            registry.resolve("CIMNothing"),
            Err(BuildError::UnknownType { type_name, .. }) if type_name == "CIMNothing"
        ));
    }

    #[test]
    fn test_register_closure_factory() {
        let registry = TypeRegistry::builder()
            .register("Echo", |mut args: Arguments| {
                Ok(args.take("value").unwrap_or(Value::Null))
            })
            .build();

        assert!(registry.contains("Echo"));
        assert_eq!(registry.len(), 1);
        let factory = registry.resolve("Echo").unwrap();
        assert_eq!(factory(Arguments::default()).unwrap(), Value::Null);
    }

    #[test]
    fn test_register_type_rejects_extra_arguments() {
        let registry = TypeRegistry::builder().register_type::<ClassName>().build();
        let mut values = indexmap::IndexMap::new();
        values.insert("classname".to_string(), Value::from("CIM_Foo"));
        values.insert("extra".to_string(), Value::Int(1));

        let factory = registry.resolve("ClassName").unwrap();
        assert_eq!(
            factory(Arguments::new(values)),
            Err(ArgumentError::Unexpected {
                name: "extra".into()
            })
        );
    }

    #[test]
    fn test_type_names_sorted() {
        let registry = TypeRegistry::builder()
            .register("B", |_| Ok(Value::Null))
            .register("A", |_| Ok(Value::Null))
            .build();
        assert_eq!(registry.type_names(), ["A", "B"]);
    }
}
