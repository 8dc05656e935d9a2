//! Generic XML to JSON tree conversion.
//!
//! The listings provider speaks XML; downstream consumers want JSON. This
//! module turns an XML document into a `serde_json::Value` tree with the
//! conventional mapping:
//!
//! - an element with only text becomes a string
//! - an empty element becomes `null`
//! - an element with children becomes an object keyed by child name
//! - repeated sibling names collapse into an array
//! - attributes become `"@name"` keys; mixed content keeps its text under
//!   `"#text"`
//!
//! Note the repeated-sibling rule means a single `<db>` child produces an
//! object where two produce an array - exactly the provider quirk the
//! normalizer has to smooth over.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure to convert an XML document into a JSON tree.
#[derive(Debug, Error)]
pub enum XmlTreeError {
    #[error("invalid XML: {0}")]
    Parse(String),

    #[error("document has no root element")]
    NoRootElement,

    #[error("document ended before all elements were closed")]
    Truncated,

    #[error("closing tag with no matching open element")]
    UnexpectedClose,
}

/// One element currently being built.
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String, children: Map<String, Value>) -> Self {
        Self {
            name,
            children,
            text: String::new(),
        }
    }

    /// Collapse a finished element into its JSON value.
    fn finish(self) -> Value {
        let text = self.text.trim();
        if self.children.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else if text.is_empty() {
            Value::Object(self.children)
        } else {
            let mut children = self.children;
            children.insert("#text".to_string(), Value::String(text.to_string()));
            Value::Object(children)
        }
    }
}

/// Insert a child value, collapsing repeated names into an array.
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(siblings)) => siblings.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

/// Read attributes of a start/empty tag into `"@name"` keys.
fn attribute_map(tag: &quick_xml::events::BytesStart<'_>) -> Map<String, Value> {
    let mut map = Map::new();
    for attr in tag.attributes().flatten() {
        let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        map.insert(key, Value::String(value));
    }
    map
}

/// Parse an XML document into a JSON tree.
///
/// The result is an object with one key, the root element's name. Plain
/// text with no enclosing element is not a document and fails with
/// [`XmlTreeError::NoRootElement`].
pub fn xml_to_value(xml: &str) -> Result<Value, XmlTreeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root = Map::new();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| XmlTreeError::Parse(e.to_string()))?;

        match event {
            Event::Start(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                let children = attribute_map(&tag);
                stack.push(Frame::new(name, children));
            }
            Event::Empty(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                let attrs = attribute_map(&tag);
                let value = if attrs.is_empty() {
                    Value::Null
                } else {
                    Value::Object(attrs)
                };
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::Text(text) => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| XmlTreeError::Parse(e.to_string()))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&unescaped);
                }
                // Text outside any element is not part of the tree.
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or(XmlTreeError::UnexpectedClose)?;
                let name = frame.name.clone();
                let value = frame.finish();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlTreeError::Truncated);
    }
    if root.is_empty() {
        return Err(XmlTreeError::NoRootElement);
    }

    Ok(Value::Object(root))
}
