//! Fake client used to drive the harness end to end
//!
//! Speaks a small subset of CIM-XML: one `GetInstance` operation whose
//! request and response look like the real thing, plus a few operations
//! that misbehave on purpose.

#![allow(dead_code)]

use indexmap::IndexMap;
use std::sync::{Arc, Mutex};
use wbem_core::{
    ArgumentError, ArgumentMap, Arguments, CimType, Constructible, TypeRegistryBuilder, Value,
};
use wbem_harness::{ClientError, ClientFactory, ClientUnderTest, ErrorKind};
use wbem_testcase::ConnectionParams;
use wbem_transport::{HttpRequest, TransportError, TransportSlot};
use wbem_xml::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceName {
    pub classname: String,
    pub keybindings: IndexMap<String, Value>,
}

impl CimType for InstanceName {
    const TYPE_NAME: &'static str = "CIMInstanceName";
}

impl Constructible for InstanceName {
    fn construct(args: &mut Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            classname: args.required("classname")?,
            keybindings: args.optional("keybindings")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub classname: String,
    pub properties: IndexMap<String, Value>,
}

impl CimType for Instance {
    const TYPE_NAME: &'static str = "CIMInstance";
}

impl Constructible for Instance {
    fn construct(args: &mut Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            classname: args.required("classname")?,
            properties: args.optional("properties")?.unwrap_or_default(),
        })
    }
}

pub struct FakeClient {
    url: String,
    slot: TransportSlot,
}

impl FakeClient {
    fn get_instance(&self, arguments: ArgumentMap) -> Result<Value, ClientError> {
        let mut args = Arguments::new(arguments);
        let name: InstanceName = args
            .required_object("InstanceName")
            .map_err(|e| ClientError::new(ErrorKind::TypeError, e.to_string()))?;

        let keybindings: String = name
            .keybindings
            .iter()
            .map(|(key, value)| {
                format!(
                    r#"<KEYBINDING NAME="{}"><KEYVALUE VALUETYPE="string">{}</KEYVALUE></KEYBINDING>"#,
                    key,
                    value.as_str().map_or_else(|| value.to_string(), str::to_string)
                )
            })
            .collect();
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8" ?><CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="1001" PROTOCOLVERSION="1.0"><SIMPLEREQ><IMETHODCALL NAME="GetInstance"><IPARAMVALUE NAME="InstanceName"><INSTANCENAME CLASSNAME="{}">{}</INSTANCENAME></IPARAMVALUE></IMETHODCALL></SIMPLEREQ></MESSAGE></CIM>"#,
            name.classname, keybindings
        );

        let request = HttpRequest::post(format!("{}/cimom", self.url))
            .header("content-type", "application/xml")
            .header("CIMOperation", "MethodCall")
            .header("CIMMethod", "GetInstance")
            .body(body);

        let response = self.slot.send(request).map_err(|e| match e {
            TransportError::Timeout { .. } => ClientError::new(ErrorKind::TimeoutError, e.to_string()),
            _ => ClientError::new(ErrorKind::ConnectionError, e.to_string()),
        })?;
        if response.status != 200 {
            return Err(ClientError::new(
                ErrorKind::HttpError,
                format!("HTTP status {}", response.status),
            ));
        }

        let root = wbem_xml::parse(&response.body)
            .map_err(|e| ClientError::new(ErrorKind::ParseError, e.to_string()))?;
        if let Some(error) = find(&root, "ERROR") {
            let code = error
                .attribute("CODE")
                .and_then(|c| c.parse().ok())
                .unwrap_or(1);
            return Err(ClientError::new(
                ErrorKind::CimError,
                error.attribute("DESCRIPTION").unwrap_or_default(),
            )
            .with_status(code));
        }

        let instance = find(&root, "INSTANCE")
            .ok_or_else(|| ClientError::new(ErrorKind::ParseError, "no INSTANCE in response"))?;
        let properties = instance
            .elements()
            .filter(|e| e.name == "PROPERTY")
            .filter_map(|p| {
                let name = p.attribute("NAME")?.to_string();
                let value = p.child("VALUE").map_or(Value::Null, |v| Value::String(v.text()));
                Some((name, value))
            })
            .collect();

        Ok(Value::object(Instance {
            classname: instance.attribute("CLASSNAME").unwrap_or_default().to_string(),
            properties,
        }))
    }
}

fn find<'a>(element: &'a XmlElement, name: &str) -> Option<&'a XmlElement> {
    if element.name == name {
        return Some(element);
    }
    element.elements().find_map(|child| find(child, name))
}

impl ClientUnderTest for FakeClient {
    fn transport(&self) -> &TransportSlot {
        &self.slot
    }

    fn has_operation(&self, operation: &str) -> bool {
        matches!(operation, "GetInstance" | "Validate" | "Explode")
    }

    fn call(&self, operation: &str, arguments: ArgumentMap) -> Result<Value, ClientError> {
        match operation {
            "GetInstance" => self.get_instance(arguments),
            // Rejects its argument without touching the network
            "Validate" => Err(ClientError::new(ErrorKind::ValueError, "rejected")),
            "Explode" => panic!("client blew up"),
            other => unreachable!("operation {} not exposed", other),
        }
    }
}

/// Hands out fake clients and keeps their transport slots for inspection
#[derive(Default)]
pub struct FakeFactory {
    slots: Mutex<Vec<TransportSlot>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Slots of every client constructed so far
    pub fn slots(&self) -> Vec<TransportSlot> {
        self.slots.lock().unwrap().clone()
    }
}

impl ClientFactory for FakeFactory {
    fn register_types(&self, registry: TypeRegistryBuilder) -> TypeRegistryBuilder {
        registry
            .register_type::<InstanceName>()
            .register_type::<Instance>()
    }

    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn ClientUnderTest>, ClientError> {
        if !params.url.starts_with("http") {
            return Err(ClientError::new(
                ErrorKind::ValueError,
                format!("invalid URL '{}'", params.url),
            ));
        }
        let slot = TransportSlot::unconfigured();
        self.slots.lock().unwrap().push(slot.clone());
        Ok(Box::new(FakeClient {
            url: params.url.clone(),
            slot,
        }))
    }
}

pub const PERSON_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<CIM CIMVERSION="2.0" DTDVERSION="2.0">
  <MESSAGE ID="1001" PROTOCOLVERSION="1.0">
    <SIMPLERSP>
      <IMETHODRESPONSE NAME="GetInstance">
        <IRETURNVALUE>
          <INSTANCE CLASSNAME="PyWBEM_Person">
            <PROPERTY NAME="Name" TYPE="string"><VALUE>Fritz</VALUE></PROPERTY>
            <PROPERTY NAME="Address" TYPE="string"><VALUE>Fritz Town</VALUE></PROPERTY>
          </INSTANCE>
        </IRETURNVALUE>
      </IMETHODRESPONSE>
    </SIMPLERSP>
  </MESSAGE>
</CIM>
"#;
