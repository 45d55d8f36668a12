//! Core value model for the WBEM client test harness
//!
//! This crate turns declarative, nested test case fragments into live values:
//!
//! - [`Value`] - the dynamic value a client operation accepts or returns
//! - [`CimObject`] - object-safe wrapper around any registered Rust type
//! - [`ValueSpec`] - the declarative description of a value, parsed from YAML
//! - [`TypeRegistry`] - maps type names (e.g. `CIMInstanceName`) to factories
//! - [`ObjectBuilder`] - recursively materializes a [`ValueSpec`] into a [`Value`]
//!
//! # Example
//!
//! ```ignore
//! use wbem_core::{ObjectBuilder, TypeRegistry, ValueSpec};
//!
//! let registry = TypeRegistry::builder()
//!     .register_type::<CimInstanceName>()
//!     .build();
//!
//! let spec = ValueSpec::from_yaml(&yaml)?;
//! let value = ObjectBuilder::new(&registry).build(&spec)?;
//! ```

mod arguments;
mod builder;
mod error;
mod object;
mod registry;
mod value;
mod value_spec;

pub use arguments::{Arguments, FromValue};
pub use builder::ObjectBuilder;
pub use error::{ArgumentError, BuildError, BuildResult, SpecError};
pub use object::{CimObject, CimType, Constructible};
pub use registry::{Factory, TypeRegistry, TypeRegistryBuilder};
pub use value::Value;
pub use value_spec::{ConstructedSpec, ValueSpec, OBJECT_TAG};

/// Ordered argument mapping passed to factories and client operations
pub type ArgumentMap = indexmap::IndexMap<String, Value>;
