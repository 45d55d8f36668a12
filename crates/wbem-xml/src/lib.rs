//! Structural XML comparison for CIM-XML payloads
//!
//! CIM-XML is order sensitive for repeated elements, so two payloads are
//! equivalent when they have the same element tree in the same order, the
//! same attributes (in any declaration order) and the same text. Whitespace
//! that only separates sibling elements is ignored; whitespace inside a leaf
//! value is not.
//!
//! ```ignore
//! use wbem_xml::equivalent;
//!
//! assert!(equivalent("<A>\n  <B/>\n</A>", "<A><B/></A>")?);
//! ```

mod compare;
mod error;
mod tree;

pub use compare::{diff, diff_trees, equivalent, XmlDifference, XmlDifferenceKind};
pub use error::{XmlParseError, XmlResult};
pub use tree::{parse, XmlElement, XmlNode};
