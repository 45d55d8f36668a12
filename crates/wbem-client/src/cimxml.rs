//! CIM-XML message encoding and decoding
//!
//! Requests are written compactly, the way a real client puts them on the
//! wire. Responses are parsed with `wbem-xml` and walked element by element.

use crate::error::{WbemError, WbemResult};
use crate::types::{CimClassName, CimInstance, CimInstanceName, CimProperty};
use indexmap::IndexMap;
use quick_xml::escape::escape;
use wbem_core::Value;
use wbem_xml::XmlElement;

pub const CIM_VERSION: &str = "2.0";
pub const DTD_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "1.0";

/// Full request document for an intrinsic method call
pub fn imethod_request(
    message_id: u64,
    method: &str,
    namespace: &str,
    params: &[(&str, String)],
) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="utf-8" ?><CIM CIMVERSION="{}" DTDVERSION="{}"><MESSAGE ID="{}" PROTOCOLVERSION="{}"><SIMPLEREQ><IMETHODCALL NAME="{}">"#,
        CIM_VERSION,
        DTD_VERSION,
        message_id,
        PROTOCOL_VERSION,
        escape(method)
    );
    xml.push_str(&local_namespace_path(namespace));
    for (name, value) in params {
        xml.push_str(&format!(
            r#"<IPARAMVALUE NAME="{}">{}</IPARAMVALUE>"#,
            escape(*name),
            value
        ));
    }
    xml.push_str("</IMETHODCALL></SIMPLEREQ></MESSAGE></CIM>");
    xml
}

fn local_namespace_path(namespace: &str) -> String {
    let parts: String = namespace
        .split('/')
        .filter(|part| !part.is_empty())
        .map(|part| format!(r#"<NAMESPACE NAME="{}"/>"#, escape(part)))
        .collect();
    format!("<LOCALNAMESPACEPATH>{}</LOCALNAMESPACEPATH>", parts)
}

/// Wire text of a scalar; `None` for null
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("TRUE".to_string()),
        Value::Bool(false) => Some("FALSE".to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(x) => Some(x.to_string()),
        Value::String(s) => Some(escape(s.as_str()).into_owned()),
        other => Some(escape(other.to_string().as_str()).into_owned()),
    }
}

pub fn bool_value(value: bool) -> String {
    format!("<VALUE>{}</VALUE>", if value { "TRUE" } else { "FALSE" })
}

pub fn string_array(values: &[String]) -> String {
    let items: String = values
        .iter()
        .map(|v| format!("<VALUE>{}</VALUE>", escape(v.as_str())))
        .collect();
    format!("<VALUE.ARRAY>{}</VALUE.ARRAY>", items)
}

pub fn class_name(classname: &str) -> String {
    format!(r#"<CLASSNAME NAME="{}"/>"#, escape(classname))
}

pub fn instance_name(name: &CimInstanceName) -> String {
    let mut xml = format!(r#"<INSTANCENAME CLASSNAME="{}">"#, escape(name.classname.as_str()));
    for (key, value) in &name.keybindings {
        xml.push_str(&format!(r#"<KEYBINDING NAME="{}">"#, escape(key.as_str())));
        match value.downcast_ref::<CimInstanceName>() {
            Some(reference) => {
                xml.push_str("<VALUE.REFERENCE>");
                xml.push_str(&instance_name(reference));
                xml.push_str("</VALUE.REFERENCE>");
            }
            None => {
                let value_type = match value {
                    Value::Bool(_) => "boolean",
                    Value::Int(_) | Value::Float(_) => "numeric",
                    _ => "string",
                };
                xml.push_str(&format!(
                    r#"<KEYVALUE VALUETYPE="{}">{}</KEYVALUE>"#,
                    value_type,
                    value_text(value).unwrap_or_default()
                ));
            }
        }
        xml.push_str("</KEYBINDING>");
    }
    xml.push_str("</INSTANCENAME>");
    xml
}

pub fn instance(instance: &CimInstance) -> String {
    let mut xml = format!(r#"<INSTANCE CLASSNAME="{}">"#, escape(instance.classname.as_str()));
    for property in instance.properties.values() {
        xml.push_str(&self::property(property));
    }
    xml.push_str("</INSTANCE>");
    xml
}

/// `VALUE.NAMEDINSTANCE` for an instance with a path
pub fn named_instance(name: &CimInstanceName, inst: &CimInstance) -> String {
    format!(
        "<VALUE.NAMEDINSTANCE>{}{}</VALUE.NAMEDINSTANCE>",
        instance_name(name),
        instance(inst)
    )
}

fn property(property: &CimProperty) -> String {
    let name = escape(property.name.as_str());
    let cim_type = property.effective_type();

    match &property.value {
        Value::List(items) => {
            let values: String = items
                .iter()
                .map(|item| match value_text(item) {
                    Some(text) => format!("<VALUE>{}</VALUE>", text),
                    None => "<VALUE.NULL/>".to_string(),
                })
                .collect();
            format!(
                r#"<PROPERTY.ARRAY NAME="{}" TYPE="{}"><VALUE.ARRAY>{}</VALUE.ARRAY></PROPERTY.ARRAY>"#,
                name, cim_type, values
            )
        }
        Value::Object(_) => match property.value.downcast_ref::<CimInstanceName>() {
            Some(reference) => format!(
                r#"<PROPERTY.REFERENCE NAME="{}"><VALUE.REFERENCE>{}</VALUE.REFERENCE></PROPERTY.REFERENCE>"#,
                name,
                instance_name(reference)
            ),
            None => format!(r#"<PROPERTY NAME="{}" TYPE="{}"/>"#, name, cim_type),
        },
        value => match value_text(value) {
            Some(text) => format!(
                r#"<PROPERTY NAME="{}" TYPE="{}"><VALUE>{}</VALUE></PROPERTY>"#,
                name, cim_type, text
            ),
            None => format!(r#"<PROPERTY NAME="{}" TYPE="{}"/>"#, name, cim_type),
        },
    }
}

/// Parse a response and return its `IRETURNVALUE`, if any
///
/// An `ERROR` element becomes [`WbemError::Cim`].
pub fn imethod_response(body: &str, method: &str) -> WbemResult<Option<XmlElement>> {
    let root = wbem_xml::parse(body).map_err(|e| WbemError::parse(e.to_string()))?;
    if root.name != "CIM" {
        return Err(WbemError::parse(format!(
            "expected root element CIM, got {}",
            root.name
        )));
    }

    let response = expect_child(&root, "MESSAGE")
        .and_then(|message| expect_child(message, "SIMPLERSP"))
        .and_then(|simple| expect_child(simple, "IMETHODRESPONSE"))?;

    match response.attribute("NAME") {
        Some(name) if name == method => {}
        other => {
            return Err(WbemError::parse(format!(
                "expected IMETHODRESPONSE for {}, got {}",
                method,
                other.unwrap_or("(unnamed)")
            )))
        }
    }

    if let Some(error) = response.child("ERROR") {
        let status = required_attribute(error, "CODE")?
            .parse()
            .map_err(|_| WbemError::parse("ERROR CODE is not an integer"))?;
        return Err(WbemError::Cim {
            status,
            description: error.attribute("DESCRIPTION").unwrap_or_default().to_string(),
        });
    }

    Ok(response.child("IRETURNVALUE").cloned())
}

fn expect_child<'a>(element: &'a XmlElement, name: &str) -> WbemResult<&'a XmlElement> {
    element
        .child(name)
        .ok_or_else(|| WbemError::parse(format!("{} has no {} element", element.name, name)))
}

fn required_attribute<'a>(element: &'a XmlElement, name: &str) -> WbemResult<&'a str> {
    element
        .attribute(name)
        .ok_or_else(|| WbemError::parse(format!("{} has no {} attribute", element.name, name)))
}

fn expect_name(element: &XmlElement, name: &str) -> WbemResult<()> {
    if element.name == name {
        Ok(())
    } else {
        Err(WbemError::parse(format!(
            "expected {} element, got {}",
            name, element.name
        )))
    }
}

pub fn decode_instance_name(element: &XmlElement) -> WbemResult<CimInstanceName> {
    expect_name(element, "INSTANCENAME")?;
    let mut name = CimInstanceName::new(required_attribute(element, "CLASSNAME")?);

    for binding in element.elements() {
        expect_name(binding, "KEYBINDING")?;
        let key = required_attribute(binding, "NAME")?;
        let value = if let Some(keyvalue) = binding.child("KEYVALUE") {
            decode_keyvalue(keyvalue)?
        } else if let Some(reference) = binding.child("VALUE.REFERENCE") {
            Value::object(decode_reference(reference)?)
        } else {
            return Err(WbemError::parse(format!("KEYBINDING {} has no value", key)));
        };
        name.keybindings.insert(key.to_string(), value);
    }
    Ok(name)
}

fn decode_keyvalue(element: &XmlElement) -> WbemResult<Value> {
    let text = element.text();
    match element.attribute("VALUETYPE").unwrap_or("string") {
        "string" => Ok(Value::String(text)),
        "boolean" => parse_bool(&text),
        "numeric" => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| text.trim().parse::<f64>().map(Value::Float))
            .map_err(|_| WbemError::parse(format!("invalid numeric key value '{}'", text))),
        other => Err(WbemError::parse(format!("unknown VALUETYPE '{}'", other))),
    }
}

/// Instance path inside a `VALUE.REFERENCE`
fn decode_reference(element: &XmlElement) -> WbemResult<CimInstanceName> {
    let inner = element
        .elements()
        .next()
        .ok_or_else(|| WbemError::parse("empty VALUE.REFERENCE"))?;

    match inner.name.as_str() {
        "INSTANCENAME" => decode_instance_name(inner),
        "LOCALINSTANCEPATH" => {
            let mut name = decode_instance_name(expect_child(inner, "INSTANCENAME")?)?;
            name.namespace = Some(decode_namespace(expect_child(inner, "LOCALNAMESPACEPATH")?));
            Ok(name)
        }
        "INSTANCEPATH" => {
            let path = expect_child(inner, "NAMESPACEPATH")?;
            let mut name = decode_instance_name(expect_child(inner, "INSTANCENAME")?)?;
            name.host = Some(expect_child(path, "HOST")?.text());
            name.namespace = Some(decode_namespace(expect_child(path, "LOCALNAMESPACEPATH")?));
            Ok(name)
        }
        other => Err(WbemError::parse(format!(
            "unsupported reference element {}",
            other
        ))),
    }
}

fn decode_namespace(element: &XmlElement) -> String {
    element
        .elements()
        .filter_map(|ns| ns.attribute("NAME"))
        .collect::<Vec<_>>()
        .join("/")
}

pub fn decode_instance(element: &XmlElement) -> WbemResult<CimInstance> {
    expect_name(element, "INSTANCE")?;
    let mut instance = CimInstance::new(required_attribute(element, "CLASSNAME")?);

    for child in element.elements() {
        let property = match child.name.as_str() {
            "PROPERTY" | "PROPERTY.ARRAY" | "PROPERTY.REFERENCE" => decode_property(child)?,
            "QUALIFIER" => continue,
            other => {
                return Err(WbemError::parse(format!(
                    "unexpected {} in INSTANCE",
                    other
                )))
            }
        };
        instance.properties.insert(property.name.clone(), property);
    }
    Ok(instance)
}

/// `VALUE.NAMEDINSTANCE`: an instance together with its path
pub fn decode_named_instance(element: &XmlElement) -> WbemResult<CimInstance> {
    expect_name(element, "VALUE.NAMEDINSTANCE")?;
    let path = decode_instance_name(expect_child(element, "INSTANCENAME")?)?;
    Ok(decode_instance(expect_child(element, "INSTANCE")?)?.with_path(path))
}

pub fn decode_class_name(element: &XmlElement) -> WbemResult<CimClassName> {
    expect_name(element, "CLASSNAME")?;
    Ok(CimClassName::new(required_attribute(element, "NAME")?))
}

fn decode_property(element: &XmlElement) -> WbemResult<CimProperty> {
    let name = required_attribute(element, "NAME")?;

    if element.name == "PROPERTY.REFERENCE" {
        let value = match element.child("VALUE.REFERENCE") {
            Some(reference) => Value::object(decode_reference(reference)?),
            None => Value::Null,
        };
        return Ok(CimProperty::new(name, value).with_type("reference"));
    }

    let cim_type = required_attribute(element, "TYPE")?;
    let value = if element.name == "PROPERTY.ARRAY" {
        match element.child("VALUE.ARRAY") {
            Some(array) => array
                .elements()
                .map(|item| match item.name.as_str() {
                    "VALUE.NULL" => Ok(Value::Null),
                    _ => parse_typed(&item.text(), cim_type),
                })
                .collect::<WbemResult<Vec<_>>>()
                .map(Value::List)?,
            None => Value::Null,
        }
    } else {
        match element.child("VALUE") {
            Some(value) => parse_typed(&value.text(), cim_type)?,
            None => Value::Null,
        }
    };

    Ok(CimProperty::new(name, value).with_type(cim_type))
}

fn parse_bool(text: &str) -> WbemResult<Value> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => Err(WbemError::parse(format!("invalid boolean '{}'", text))),
    }
}

/// Convert `VALUE` text to a value of the given CIM type
fn parse_typed(text: &str, cim_type: &str) -> WbemResult<Value> {
    match cim_type {
        "string" | "char16" | "datetime" => Ok(Value::String(text.to_string())),
        "boolean" => parse_bool(text),
        "uint8" | "uint16" | "uint32" | "uint64" | "sint8" | "sint16" | "sint32" | "sint64" => {
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| WbemError::parse(format!("invalid {} value '{}'", cim_type, text)))
        }
        "real32" | "real64" => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| WbemError::parse(format!("invalid {} value '{}'", cim_type, text))),
        other => Err(WbemError::parse(format!("unknown CIM type '{}'", other))),
    }
}

/// Keybindings as a plain map, for diagnostics
pub fn keybinding_summary(keybindings: &IndexMap<String, Value>) -> String {
    keybindings
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
