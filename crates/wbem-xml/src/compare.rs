//! Equivalence check and structural diff

use crate::error::XmlResult;
use crate::tree::{parse, XmlElement, XmlNode};
use std::fmt;

/// What differs at a given location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlDifferenceKind {
    TagName,
    AttributeValue,
    MissingAttribute,
    ExtraAttribute,
    Text,
    ChildCount,
    NodeKind,
}

impl fmt::Display for XmlDifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlDifferenceKind::TagName => write!(f, "tag"),
            XmlDifferenceKind::AttributeValue => write!(f, "attribute"),
            XmlDifferenceKind::MissingAttribute => write!(f, "missing attribute"),
            XmlDifferenceKind::ExtraAttribute => write!(f, "extra attribute"),
            XmlDifferenceKind::Text => write!(f, "text"),
            XmlDifferenceKind::ChildCount => write!(f, "children"),
            XmlDifferenceKind::NodeKind => write!(f, "node kind"),
        }
    }
}

/// One structural difference between two documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDifference {
    /// Element path such as `/CIM/MESSAGE/SIMPLEREQ/IMETHODCALL`
    pub path: String,
    pub kind: XmlDifferenceKind,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for XmlDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): expected {:?}, got {:?}",
            self.path, self.kind, self.expected, self.actual
        )
    }
}

/// Whether two payloads are structurally equivalent
///
/// Fails with [`XmlParseError`](crate::XmlParseError) if either input is
/// not well-formed.
pub fn equivalent(expected: &str, actual: &str) -> XmlResult<bool> {
    Ok(diff(expected, actual)?.is_empty())
}

/// All structural differences between two payloads
pub fn diff(expected: &str, actual: &str) -> XmlResult<Vec<XmlDifference>> {
    let expected = parse(expected)?;
    let actual = parse(actual)?;
    Ok(diff_trees(&expected, &actual))
}

/// All structural differences between two parsed documents
pub fn diff_trees(expected: &XmlElement, actual: &XmlElement) -> Vec<XmlDifference> {
    let mut differences = Vec::new();
    diff_elements(
        &format!("/{}", expected.name),
        expected,
        actual,
        &mut differences,
    );
    differences
}

fn diff_elements(
    path: &str,
    expected: &XmlElement,
    actual: &XmlElement,
    differences: &mut Vec<XmlDifference>,
) {
    if expected.name != actual.name {
        // Different elements; their contents are not comparable
        differences.push(XmlDifference {
            path: path.to_string(),
            kind: XmlDifferenceKind::TagName,
            expected: expected.name.clone(),
            actual: actual.name.clone(),
        });
        return;
    }

    for (name, expected_value) in &expected.attributes {
        match actual.attributes.get(name) {
            Some(actual_value) if actual_value == expected_value => {}
            Some(actual_value) => differences.push(XmlDifference {
                path: format!("{}@{}", path, name),
                kind: XmlDifferenceKind::AttributeValue,
                expected: expected_value.clone(),
                actual: actual_value.clone(),
            }),
            None => differences.push(XmlDifference {
                path: format!("{}@{}", path, name),
                kind: XmlDifferenceKind::MissingAttribute,
                expected: expected_value.clone(),
                actual: String::new(),
            }),
        }
    }
    for (name, actual_value) in &actual.attributes {
        if !expected.attributes.contains_key(name) {
            differences.push(XmlDifference {
                path: format!("{}@{}", path, name),
                kind: XmlDifferenceKind::ExtraAttribute,
                expected: String::new(),
                actual: actual_value.clone(),
            });
        }
    }

    if expected.children.len() != actual.children.len() {
        differences.push(XmlDifference {
            path: path.to_string(),
            kind: XmlDifferenceKind::ChildCount,
            expected: describe_children(&expected.children),
            actual: describe_children(&actual.children),
        });
    }

    for (index, (expected_child, actual_child)) in expected
        .children
        .iter()
        .zip(actual.children.iter())
        .enumerate()
    {
        match (expected_child, actual_child) {
            (XmlNode::Element(e), XmlNode::Element(a)) => {
                let child_path = format!("{}/{}", path, indexed(&e.name, index));
                diff_elements(&child_path, e, a, differences);
            }
            (XmlNode::Text(e), XmlNode::Text(a)) => {
                if e != a {
                    differences.push(XmlDifference {
                        path: format!("{}/text()", path),
                        kind: XmlDifferenceKind::Text,
                        expected: e.clone(),
                        actual: a.clone(),
                    });
                }
            }
            (e, a) => differences.push(XmlDifference {
                path: format!("{}/node()[{}]", path, index),
                kind: XmlDifferenceKind::NodeKind,
                expected: describe_node(e),
                actual: describe_node(a),
            }),
        }
    }
}

fn indexed(name: &str, index: usize) -> String {
    if index == 0 {
        name.to_string()
    } else {
        format!("{}[{}]", name, index)
    }
}

fn describe_node(node: &XmlNode) -> String {
    match node {
        XmlNode::Element(element) => format!("<{}>", element.name),
        XmlNode::Text(text) => text.clone(),
    }
}

fn describe_children(children: &[XmlNode]) -> String {
    children
        .iter()
        .map(describe_node)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPACT: &str = r#"<?xml version="1.0" encoding="utf-8" ?><CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="1001" PROTOCOLVERSION="1.0"><SIMPLEREQ><IMETHODCALL NAME="GetInstance"><LOCALNAMESPACEPATH><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></LOCALNAMESPACEPATH><IPARAMVALUE NAME="InstanceName"><INSTANCENAME CLASSNAME="PyWBEM_Person"><KEYBINDING NAME="Name"><KEYVALUE VALUETYPE="string">Fritz</KEYVALUE></KEYBINDING></INSTANCENAME></IPARAMVALUE></IMETHODCALL></SIMPLEREQ></MESSAGE></CIM>"#;

    const PRETTY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<CIM CIMVERSION="2.0" DTDVERSION="2.0">

  <MESSAGE ID="1001" PROTOCOLVERSION="1.0">
    <SIMPLEREQ>
      <IMETHODCALL NAME="GetInstance">
        <LOCALNAMESPACEPATH>
          <NAMESPACE NAME="root"/>
          <NAMESPACE NAME="cimv2"/>
        </LOCALNAMESPACEPATH>
        <IPARAMVALUE NAME="InstanceName">
          <INSTANCENAME CLASSNAME="PyWBEM_Person">
            <KEYBINDING NAME="Name">
              <KEYVALUE VALUETYPE="string">Fritz</KEYVALUE>
            </KEYBINDING>
          </INSTANCENAME>
        </IPARAMVALUE>
      </IMETHODCALL>
    </SIMPLEREQ>
  </MESSAGE>
</CIM>
"#;

    #[test]
    fn test_inter_tag_whitespace_is_insignificant() {
        assert!(equivalent(PRETTY, COMPACT).unwrap());
        assert!(equivalent(COMPACT, PRETTY).unwrap());
    }

    #[test]
    fn test_attribute_order_is_insignificant() {
        assert!(equivalent(r#"<A x="1" y="2"/>"#, r#"<A y="2" x="1"/>"#).unwrap());
    }

    #[test]
    fn test_self_closing_equals_empty_pair() {
        assert!(equivalent("<A><B/></A>", "<A><B></B></A>").unwrap());
    }

    #[test]
    fn test_attribute_value_is_significant() {
        let differences = diff(r#"<A x="1"/>"#, r#"<A x="2"/>"#).unwrap();
        assert_eq!(
            differences,
            vec![XmlDifference {
                path: "/A@x".into(),
                kind: XmlDifferenceKind::AttributeValue,
                expected: "1".into(),
                actual: "2".into(),
            }]
        );
    }

    #[test]
    fn test_missing_and_extra_attributes() {
        let differences = diff(r#"<A x="1"/>"#, r#"<A y="1"/>"#).unwrap();
        let kinds: Vec<_> = differences.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                XmlDifferenceKind::MissingAttribute,
                XmlDifferenceKind::ExtraAttribute
            ]
        );
    }

    #[test]
    fn test_child_order_is_significant() {
        let expected = r#"<A><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></A>"#;
        let actual = r#"<A><NAMESPACE NAME="cimv2"/><NAMESPACE NAME="root"/></A>"#;
        assert!(!equivalent(expected, actual).unwrap());

        let differences = diff(expected, actual).unwrap();
        assert_eq!(differences[0].path, "/A/NAMESPACE@NAME");
        assert_eq!(differences[1].path, "/A/NAMESPACE[1]@NAME");
    }

    #[test]
    fn test_leaf_text_is_significant() {
        assert!(!equivalent("<V>Fritz</V>", "<V>Fritz </V>").unwrap());
        assert!(!equivalent("<V>Fritz</V>", "<V>Franz</V>").unwrap());
    }

    #[test]
    fn test_whitespace_only_leaf_is_text() {
        // A leaf keeps its whitespace, so a pretty-printed empty element must be written <B/>
        let differences = diff("<A>\n  <B>\n  </B>\n</A>", "<A><B/></A>").unwrap();
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].path, "/A/B");
        assert_eq!(differences[0].kind, XmlDifferenceKind::ChildCount);

        assert!(!equivalent("<VALUE> </VALUE>", "<VALUE/>").unwrap());
        assert!(equivalent("<A>\n  <B/>\n</A>", "<A><B/></A>").unwrap());
    }

    #[test]
    fn test_tag_name_mismatch_stops_descent() {
        let differences = diff("<A><B><C/></B></A>", "<A><X><Y/></X></A>").unwrap();
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].kind, XmlDifferenceKind::TagName);
        assert_eq!(differences[0].path, "/A/B");
    }

    #[test]
    fn test_child_count_mismatch() {
        let differences = diff("<A><B/><C/></A>", "<A><B/></A>").unwrap();
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].kind, XmlDifferenceKind::ChildCount);
        assert_eq!(differences[0].expected, "<B> <C>");
    }

    #[test]
    fn test_text_versus_element() {
        let differences = diff("<A>text</A>", "<A><B/></A>").unwrap();
        assert_eq!(differences[0].kind, XmlDifferenceKind::NodeKind);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(equivalent("<A>", "<A/>").is_err());
        assert!(equivalent("<A/>", "<A></B>").is_err());
    }
}
