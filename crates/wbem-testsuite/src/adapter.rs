//! Wires the reference WBEM client into the harness
//!
//! Operation names and argument names follow the CIM-XML intrinsic method
//! parameters (`InstanceName`, `LocalOnly`, ...), plus a lowercase
//! `namespace` argument where the operation takes one.

use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wbem_client::{
    CimClassName, CimInstance, CimInstanceName, InstanceOptions, WbemConnection, WbemError,
};
use wbem_core::{ArgumentError, ArgumentMap, Arguments, TypeRegistryBuilder, Value};
use wbem_harness::{ClientError, ClientFactory, ClientUnderTest, ErrorKind};
use wbem_testcase::ConnectionParams;
use wbem_transport::TransportSlot;

/// Operations the adapter exposes to test cases
pub const OPERATIONS: [&str; 7] = [
    "GetInstance",
    "EnumerateInstanceNames",
    "EnumerateInstances",
    "DeleteInstance",
    "CreateInstance",
    "ModifyInstance",
    "EnumerateClassNames",
];

#[derive(Debug, Error)]
enum CallError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Wbem(#[from] WbemError),
    #[error("unsupported operation '{0}'")]
    Unsupported(String),
}

impl From<CallError> for ClientError {
    fn from(error: CallError) -> Self {
        match error {
            CallError::Argument(e @ ArgumentError::Invalid { .. }) => {
                ClientError::new(ErrorKind::ValueError, e.to_string())
            }
            CallError::Argument(e) => ClientError::new(ErrorKind::TypeError, e.to_string()),
            CallError::Wbem(e) => client_error(e),
            e @ CallError::Unsupported(_) => ClientError::new(ErrorKind::TypeError, e.to_string()),
        }
    }
}

/// Classify a client error; every variant maps to exactly one kind
pub fn client_error(error: WbemError) -> ClientError {
    let kind = match &error {
        WbemError::Cim { .. } => ErrorKind::CimError,
        WbemError::Http { .. } => ErrorKind::HttpError,
        WbemError::Auth(_) => ErrorKind::AuthError,
        WbemError::Parse(_) => ErrorKind::ParseError,
        WbemError::Connection(_) => ErrorKind::ConnectionError,
        WbemError::Timeout(_) => ErrorKind::TimeoutError,
        WbemError::Value(_) => ErrorKind::ValueError,
        WbemError::Type(_) => ErrorKind::TypeError,
    };
    let client_error = ClientError::new(kind, error.to_string());
    match error.status_code() {
        Some(status) => client_error.with_status(status),
        None => client_error,
    }
}

/// Creates [`WbemConnection`]s for test cases
#[derive(Debug, Default, Clone, Copy)]
pub struct WbemClientFactory;

impl ClientFactory for WbemClientFactory {
    fn register_types(&self, registry: TypeRegistryBuilder) -> TypeRegistryBuilder {
        wbem_client::register_types(registry)
    }

    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn ClientUnderTest>, ClientError> {
        let mut conn = WbemConnection::new(&params.url).map_err(client_error)?;
        if let Some((user, password)) = &params.credentials {
            conn = conn.with_credentials(user.as_str(), password.as_str());
        }
        if let Some(namespace) = &params.namespace {
            conn = conn.with_default_namespace(namespace.as_str());
        }
        if let Some(timeout) = params.timeout {
            conn = conn.with_timeout(Duration::from_secs(timeout));
        }
        Ok(Box::new(WbemClientAdapter {
            conn: conn.with_debug(params.debug),
        }))
    }
}

/// A [`WbemConnection`] driven by operation name
#[derive(Debug)]
pub struct WbemClientAdapter {
    conn: WbemConnection,
}

impl WbemClientAdapter {
    pub fn new(conn: WbemConnection) -> Self {
        Self { conn }
    }

    fn execute(&self, call: Call) -> Result<Value, WbemError> {
        let value = match call {
            Call::GetInstance { name, options } => {
                Value::object(self.conn.get_instance(&name, &options)?)
            }
            Call::EnumerateInstanceNames {
                classname,
                namespace,
            } => {
                let names = self
                    .conn
                    .enumerate_instance_names(&classname, namespace.as_deref())?;
                Value::List(names.into_iter().map(Value::object).collect())
            }
            Call::EnumerateInstances {
                classname,
                namespace,
                options,
            } => {
                let instances =
                    self.conn
                        .enumerate_instances(&classname, namespace.as_deref(), &options)?;
                Value::List(instances.into_iter().map(Value::object).collect())
            }
            Call::DeleteInstance { name } => {
                self.conn.delete_instance(&name)?;
                Value::Null
            }
            Call::CreateInstance {
                instance,
                namespace,
            } => Value::object(self.conn.create_instance(&instance, namespace.as_deref())?),
            Call::ModifyInstance {
                instance,
                include_qualifiers,
                property_list,
            } => {
                self.conn
                    .modify_instance(&instance, include_qualifiers, property_list.as_deref())?;
                Value::Null
            }
            Call::EnumerateClassNames {
                namespace,
                classname,
                deep_inheritance,
            } => {
                let names = self.conn.enumerate_class_names(
                    namespace.as_deref(),
                    classname.as_deref(),
                    deep_inheritance,
                )?;
                Value::List(names.into_iter().map(|n| Value::String(n.classname)).collect())
            }
        };
        Ok(value)
    }
}

/// One operation call with its arguments unpacked
#[derive(Debug)]
enum Call {
    GetInstance {
        name: CimInstanceName,
        options: InstanceOptions,
    },
    EnumerateInstanceNames {
        classname: String,
        namespace: Option<String>,
    },
    EnumerateInstances {
        classname: String,
        namespace: Option<String>,
        options: InstanceOptions,
    },
    DeleteInstance {
        name: CimInstanceName,
    },
    CreateInstance {
        instance: CimInstance,
        namespace: Option<String>,
    },
    ModifyInstance {
        instance: CimInstance,
        include_qualifiers: Option<bool>,
        property_list: Option<Vec<String>>,
    },
    EnumerateClassNames {
        namespace: Option<String>,
        classname: Option<String>,
        deep_inheritance: Option<bool>,
    },
}

impl Call {
    /// Take this operation's arguments; leftovers are rejected afterwards
    fn parse(operation: &str, args: &mut Arguments) -> Result<Self, CallError> {
        let call = match operation {
            "GetInstance" => Call::GetInstance {
                name: args.required_object("InstanceName")?,
                options: instance_options(args)?,
            },
            "EnumerateInstanceNames" => {
                let (classname, namespace) = class_argument(args)?;
                Call::EnumerateInstanceNames {
                    classname,
                    namespace,
                }
            }
            "EnumerateInstances" => {
                let (classname, namespace) = class_argument(args)?;
                Call::EnumerateInstances {
                    classname,
                    namespace,
                    options: instance_options(args)?,
                }
            }
            "DeleteInstance" => Call::DeleteInstance {
                name: args.required_object("InstanceName")?,
            },
            "CreateInstance" => Call::CreateInstance {
                instance: args.required_object("NewInstance")?,
                namespace: args.optional("namespace")?,
            },
            "ModifyInstance" => Call::ModifyInstance {
                instance: args.required_object("ModifiedInstance")?,
                include_qualifiers: args.optional("IncludeQualifiers")?,
                property_list: args.optional("PropertyList")?,
            },
            "EnumerateClassNames" => Call::EnumerateClassNames {
                namespace: args.optional("namespace")?,
                classname: optional_classname(args)?,
                deep_inheritance: args.optional("DeepInheritance")?,
            },
            other => return Err(CallError::Unsupported(other.to_string())),
        };
        Ok(call)
    }
}

impl ClientUnderTest for WbemClientAdapter {
    fn transport(&self) -> &TransportSlot {
        self.conn.transport()
    }

    fn has_operation(&self, operation: &str) -> bool {
        OPERATIONS.contains(&operation)
    }

    fn call(&self, operation: &str, arguments: ArgumentMap) -> Result<Value, ClientError> {
        debug!(operation, arguments = arguments.len(), "Calling WBEM operation");
        let mut args = Arguments::new(arguments);
        let call = Call::parse(operation, &mut args)?;
        args.finish().map_err(CallError::from)?;
        self.execute(call).map_err(client_error)
    }
}

fn instance_options(args: &mut Arguments) -> Result<InstanceOptions, ArgumentError> {
    Ok(InstanceOptions {
        local_only: args.optional("LocalOnly")?,
        deep_inheritance: args.optional("DeepInheritance")?,
        include_qualifiers: args.optional("IncludeQualifiers")?,
        include_class_origin: args.optional("IncludeClassOrigin")?,
        property_list: args.optional("PropertyList")?,
    })
}

/// `ClassName` as a string or a `CIMClassName`, plus `namespace`
///
/// A namespace given as argument wins over the class name's own.
fn class_argument(args: &mut Arguments) -> Result<(String, Option<String>), ArgumentError> {
    let namespace = args.optional::<String>("namespace")?;
    match args.take("ClassName") {
        Some(Value::String(classname)) => Ok((classname, namespace)),
        Some(value) => match value.downcast_ref::<CimClassName>() {
            Some(name) => Ok((name.classname.clone(), namespace.or(name.namespace.clone()))),
            None => Err(ArgumentError::WrongType {
                name: "ClassName".to_string(),
                expected: "string or CIMClassName",
                found: value.kind().to_string(),
            }),
        },
        None => Err(ArgumentError::Missing {
            name: "ClassName".to_string(),
        }),
    }
}

fn optional_classname(args: &mut Arguments) -> Result<Option<String>, ArgumentError> {
    match args.take("ClassName") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(classname)) => Ok(Some(classname)),
        Some(value) => match value.downcast_ref::<CimClassName>() {
            Some(name) => Ok(Some(name.classname.clone())),
            None => Err(ArgumentError::WrongType {
                name: "ClassName".to_string(),
                expected: "string or CIMClassName",
                found: value.kind().to_string(),
            }),
        },
    }
}
