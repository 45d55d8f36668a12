//! WBEM connection and intrinsic operations

use crate::cimxml;
use crate::error::{WbemError, WbemResult};
use crate::types::{CimClassName, CimInstance, CimInstanceName};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, instrument, trace};
use wbem_transport::{HttpRequest, TransportError, TransportSlot};
use wbem_xml::XmlElement;

/// Namespace used when neither the call nor the connection names one
pub const DEFAULT_NAMESPACE: &str = "root/cimv2";

/// First message ID issued by a connection
pub const FIRST_MESSAGE_ID: u64 = 1001;

/// Optional flags shared by the instance retrieval operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceOptions {
    pub local_only: Option<bool>,
    pub deep_inheritance: Option<bool>,
    pub include_qualifiers: Option<bool>,
    pub include_class_origin: Option<bool>,
    pub property_list: Option<Vec<String>>,
}

impl InstanceOptions {
    fn push_params(&self, params: &mut Vec<(&'static str, String)>) {
        let flags = [
            ("LocalOnly", self.local_only),
            ("DeepInheritance", self.deep_inheritance),
            ("IncludeQualifiers", self.include_qualifiers),
            ("IncludeClassOrigin", self.include_class_origin),
        ];
        for (name, flag) in flags {
            if let Some(flag) = flag {
                params.push((name, cimxml::bool_value(flag)));
            }
        }
        if let Some(list) = &self.property_list {
            params.push(("PropertyList", cimxml::string_array(list)));
        }
    }
}

/// A client connection to one WBEM server
///
/// Constructing a connection never touches the network; every operation
/// sends exactly one request through the connection's [`TransportSlot`].
pub struct WbemConnection {
    url: String,
    credentials: Option<(String, String)>,
    default_namespace: String,
    timeout: Option<Duration>,
    debug: bool,
    transport: TransportSlot,
    next_message_id: AtomicU64,
    last_raw_request: Mutex<Option<String>>,
    last_raw_reply: Mutex<Option<String>>,
}

impl WbemConnection {
    /// Create a connection for `url`; a URL without scheme gets `http://`
    pub fn new(url: &str) -> WbemResult<Self> {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(WbemError::Value("URL must not be empty".to_string()));
        }
        let url = match url.split_once("://") {
            Some(("http" | "https", rest)) if !rest.is_empty() => url.to_string(),
            Some((scheme, _)) => {
                return Err(WbemError::Value(format!(
                    "unsupported URL scheme '{}' in '{}'",
                    scheme, url
                )))
            }
            None => format!("http://{}", url),
        };

        Ok(Self {
            url,
            credentials: None,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            timeout: None,
            debug: false,
            transport: TransportSlot::unconfigured(),
            next_message_id: AtomicU64::new(FIRST_MESSAGE_ID),
            last_raw_request: Mutex::new(None),
            last_raw_reply: Mutex::new(None),
        })
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into().trim_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep the raw XML of the last request and reply
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_transport(mut self, transport: TransportSlot) -> Self {
        self.transport = transport;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn transport(&self) -> &TransportSlot {
        &self.transport
    }

    pub fn last_raw_request(&self) -> Option<String> {
        self.last_raw_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_raw_reply(&self) -> Option<String> {
        self.last_raw_reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn namespace_or_default<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace
            .map(|ns| ns.trim_matches('/'))
            .unwrap_or(&self.default_namespace)
    }

    /// Send one intrinsic method call and return its `IRETURNVALUE`
    fn imethod_call(
        &self,
        method: &str,
        namespace: &str,
        params: &[(&str, String)],
    ) -> WbemResult<Option<XmlElement>> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        let body = cimxml::imethod_request(message_id, method, namespace, params);

        let mut request = HttpRequest::post(format!("{}/cimom", self.url))
            .header("Content-type", r#"application/xml; charset="utf-8""#)
            .header("Content-length", body.len().to_string())
            .header("CIMOperation", "MethodCall")
            .header("CIMMethod", method)
            .header("CIMObject", namespace);
        if let Some((user, password)) = &self.credentials {
            let token = STANDARD.encode(format!("{}:{}", user, password));
            request = request.header("Authorization", format!("Basic {}", token));
        }
        let request = request.body(body);

        if self.debug {
            *self
                .last_raw_request
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(request.body.clone());
        }

        debug!(method, namespace, message_id, "Sending CIM-XML request");
        let response = self.transport.send(request).map_err(|e| match e {
            TransportError::Timeout { .. } => WbemError::Timeout(e.to_string()),
            _ => WbemError::Connection(e.to_string()),
        })?;
        trace!(status = response.status, bytes = response.body.len(), "Received response");

        if self.debug {
            *self
                .last_raw_reply
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(response.body.clone());
        }

        match response.status {
            200 => {}
            401 => {
                return Err(WbemError::Auth(format!(
                    "server rejected credentials for {}",
                    self.url
                )))
            }
            status => {
                let reason = response
                    .headers
                    .get("CIMError")
                    .map(str::to_string)
                    .unwrap_or_else(|| reason_phrase(status).to_string());
                return Err(WbemError::Http { status, reason });
            }
        }

        cimxml::imethod_response(&response.body, method)
    }

    /// Retrieve one instance
    ///
    /// The returned instance's path is the requested name, qualified with
    /// the namespace the request went to.
    #[instrument(skip_all, fields(classname = %name.classname))]
    pub fn get_instance(
        &self,
        name: &CimInstanceName,
        options: &InstanceOptions,
    ) -> WbemResult<CimInstance> {
        validate_classname(&name.classname)?;
        let namespace = self.namespace_or_default(name.namespace.as_deref());
        debug!(keys = %cimxml::keybinding_summary(&name.keybindings), "GetInstance");

        let mut params = vec![("InstanceName", cimxml::instance_name(name))];
        options.push_params(&mut params);

        let ret = self
            .imethod_call("GetInstance", namespace, &params)?
            .ok_or_else(|| WbemError::parse("GetInstance response has no IRETURNVALUE"))?;
        let element = ret
            .child("INSTANCE")
            .ok_or_else(|| WbemError::parse("GetInstance response has no INSTANCE"))?;

        let mut path = name.clone();
        path.namespace = Some(namespace.to_string());
        Ok(cimxml::decode_instance(element)?.with_path(path))
    }

    /// Names of all instances of a class
    #[instrument(skip(self))]
    pub fn enumerate_instance_names(
        &self,
        classname: &str,
        namespace: Option<&str>,
    ) -> WbemResult<Vec<CimInstanceName>> {
        validate_classname(classname)?;
        let namespace = self.namespace_or_default(namespace);
        let params = [("ClassName", cimxml::class_name(classname))];

        let Some(ret) = self.imethod_call("EnumerateInstanceNames", namespace, &params)? else {
            return Ok(Vec::new());
        };
        ret.elements()
            .map(|element| {
                let mut name = cimxml::decode_instance_name(element)?;
                name.namespace = Some(namespace.to_string());
                Ok(name)
            })
            .collect()
    }

    /// All instances of a class, each with its path
    #[instrument(skip(self, options))]
    pub fn enumerate_instances(
        &self,
        classname: &str,
        namespace: Option<&str>,
        options: &InstanceOptions,
    ) -> WbemResult<Vec<CimInstance>> {
        validate_classname(classname)?;
        let namespace = self.namespace_or_default(namespace);
        let mut params = vec![("ClassName", cimxml::class_name(classname))];
        options.push_params(&mut params);

        let Some(ret) = self.imethod_call("EnumerateInstances", namespace, &params)? else {
            return Ok(Vec::new());
        };
        ret.elements()
            .map(|element| {
                let mut instance = cimxml::decode_named_instance(element)?;
                if let Some(path) = &mut instance.path {
                    path.namespace = Some(namespace.to_string());
                }
                Ok(instance)
            })
            .collect()
    }

    #[instrument(skip_all, fields(classname = %name.classname))]
    pub fn delete_instance(&self, name: &CimInstanceName) -> WbemResult<()> {
        validate_classname(&name.classname)?;
        let namespace = self.namespace_or_default(name.namespace.as_deref());
        let params = [("InstanceName", cimxml::instance_name(name))];

        self.imethod_call("DeleteInstance", namespace, &params)?;
        Ok(())
    }

    /// Create an instance and return the name the server assigned
    #[instrument(skip_all, fields(classname = %instance.classname))]
    pub fn create_instance(
        &self,
        instance: &CimInstance,
        namespace: Option<&str>,
    ) -> WbemResult<CimInstanceName> {
        validate_classname(&instance.classname)?;
        let namespace = self.namespace_or_default(
            namespace.or_else(|| instance.path.as_ref().and_then(|p| p.namespace.as_deref())),
        );
        let params = [("NewInstance", cimxml::instance(instance))];

        let ret = self
            .imethod_call("CreateInstance", namespace, &params)?
            .ok_or_else(|| WbemError::parse("CreateInstance response has no IRETURNVALUE"))?;
        let element = ret
            .child("INSTANCENAME")
            .ok_or_else(|| WbemError::parse("CreateInstance response has no INSTANCENAME"))?;

        let mut name = cimxml::decode_instance_name(element)?;
        name.namespace = Some(namespace.to_string());
        Ok(name)
    }

    /// Replace an instance; the instance must carry its path
    #[instrument(skip_all, fields(classname = %instance.classname))]
    pub fn modify_instance(
        &self,
        instance: &CimInstance,
        include_qualifiers: Option<bool>,
        property_list: Option<&[String]>,
    ) -> WbemResult<()> {
        let path = instance
            .path
            .as_ref()
            .ok_or_else(|| WbemError::Value("ModifiedInstance must have a path".to_string()))?;
        validate_classname(&path.classname)?;
        let namespace = self.namespace_or_default(path.namespace.as_deref());

        let mut params = vec![("ModifiedInstance", cimxml::named_instance(path, instance))];
        if let Some(flag) = include_qualifiers {
            params.push(("IncludeQualifiers", cimxml::bool_value(flag)));
        }
        if let Some(list) = property_list {
            params.push(("PropertyList", cimxml::string_array(list)));
        }

        self.imethod_call("ModifyInstance", namespace, &params)?;
        Ok(())
    }

    /// Names of the subclasses of `classname`, or of the top-level classes
    #[instrument(skip(self))]
    pub fn enumerate_class_names(
        &self,
        namespace: Option<&str>,
        classname: Option<&str>,
        deep_inheritance: Option<bool>,
    ) -> WbemResult<Vec<CimClassName>> {
        let namespace = self.namespace_or_default(namespace);
        let mut params = Vec::new();
        if let Some(classname) = classname {
            validate_classname(classname)?;
            params.push(("ClassName", cimxml::class_name(classname)));
        }
        if let Some(flag) = deep_inheritance {
            params.push(("DeepInheritance", cimxml::bool_value(flag)));
        }

        let Some(ret) = self.imethod_call("EnumerateClassNames", namespace, &params)? else {
            return Ok(Vec::new());
        };
        ret.elements()
            .map(|element| {
                let mut name = cimxml::decode_class_name(element)?;
                name.namespace = Some(namespace.to_string());
                Ok(name)
            })
            .collect()
    }
}

impl std::fmt::Debug for WbemConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WbemConnection")
            .field("url", &self.url)
            .field("user", &self.credentials.as_ref().map(|(user, _)| user))
            .field("default_namespace", &self.default_namespace)
            .finish_non_exhaustive()
    }
}

fn validate_classname(classname: &str) -> WbemResult<()> {
    if classname.is_empty() {
        return Err(WbemError::Value("class name must not be empty".to_string()));
    }
    Ok(())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ => "Unexpected Status",
    }
}
