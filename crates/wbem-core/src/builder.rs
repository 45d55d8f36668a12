//! Object graph builder
//!
//! Materializes a [`ValueSpec`] tree into a live [`Value`]. Children are
//! built before their parent, so a factory always receives fully built
//! arguments. Specs are trees, so no cycle detection is needed.

use crate::arguments::Arguments;
use crate::error::{BuildError, BuildResult};
use crate::registry::TypeRegistry;
use crate::value::Value;
use crate::value_spec::{ConstructedSpec, ValueSpec};
use indexmap::IndexMap;
use tracing::trace;

/// Builds values against a frozen [`TypeRegistry`]
#[derive(Debug, Clone, Copy)]
pub struct ObjectBuilder<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> ObjectBuilder<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Build a single value
    pub fn build(&self, spec: &ValueSpec) -> BuildResult<Value> {
        self.build_at(spec, "$")
    }

    /// Build a named argument mapping, e.g. the arguments of an operation
    pub fn build_arguments(
        &self,
        specs: &IndexMap<String, ValueSpec>,
    ) -> BuildResult<IndexMap<String, Value>> {
        specs
            .iter()
            .map(|(name, spec)| Ok((name.clone(), self.build_at(spec, name)?)))
            .collect()
    }

    fn build_at(&self, spec: &ValueSpec, path: &str) -> BuildResult<Value> {
        match spec {
            ValueSpec::Scalar(value) => Ok(value.clone()),
            ValueSpec::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.build_at(item, &format!("{}[{}]", path, i)))
                .collect::<BuildResult<Vec<_>>>()
                .map(Value::List),
            ValueSpec::Map(map) => map
                .iter()
                .map(|(key, item)| {
                    Ok((key.clone(), self.build_at(item, &format!("{}.{}", path, key))?))
                })
                .collect::<BuildResult<IndexMap<_, _>>>()
                .map(Value::Map),
            ValueSpec::Constructed(constructed) => self.construct(constructed, path),
        }
    }

    fn construct(&self, spec: &ConstructedSpec, path: &str) -> BuildResult<Value> {
        let mut arguments = IndexMap::with_capacity(spec.arguments.len());
        for (name, child) in &spec.arguments {
            let value = self.build_at(child, &format!("{}.{}", path, name))?;
            arguments.insert(name.clone(), value);
        }

        let factory = self
            .registry
            .resolve(&spec.type_name)
            .map_err(|_| BuildError::UnknownType {
                type_name: spec.type_name.clone(),
                path: path.to_string(),
            })?;

        trace!(type_name = %spec.type_name, path = %path, "Constructing object");

        factory(Arguments::new(arguments)).map_err(|source| BuildError::Argument {
            type_name: spec.type_name.clone(),
            path: path.to_string(),
            source,
        })
    }
}
