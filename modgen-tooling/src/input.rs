//! Buffered, format-aware input documents.
//!
//! A [`TransformInput`] reads its source once into memory. Every template of a
//! module then works from the same bytes, so nothing is consumed between
//! templates and the caller never has to rewind a stream.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Key prefix for XML attributes in the decoded document.
const XML_ATTRIBUTE_PREFIX: &str = "@";
/// Key for XML character data in the decoded document.
const XML_TEXT_KEY: &str = "#text";

/// How the input bytes are decoded into the `doc` template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
    Xml,
    /// Undecoded; `doc` is the text itself.
    Text,
}

impl DocumentFormat {
    /// Pick a format from a file extension, falling back to [`DocumentFormat::Text`].
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            "xml" | "xsd" | "wsdl" => Self::Xml,
            _ => Self::Text,
        }
    }

    fn from_name(name: Option<&str>) -> Self {
        name.and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Text)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Xml => "xml",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// One input document, buffered in memory.
#[derive(Debug, Clone)]
pub struct TransformInput {
    name: Option<String>,
    bytes: Vec<u8>,
    format: DocumentFormat,
}

impl TransformInput {
    /// Read a document from disk. The file name selects the format.
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let bytes = std::fs::read(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Ok(Self::from_bytes(bytes, name))
    }

    /// Drain `reader` into memory. `name` selects the format and feeds input naming.
    pub fn from_reader(mut reader: impl Read, name: Option<&str>) -> Result<Self, InputError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| InputError::Read {
                path: PathBuf::from(name.unwrap_or("<stream>")),
                source,
            })?;
        Ok(Self::from_bytes(bytes, name.map(str::to_string)))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>, name: Option<String>) -> Self {
        let format = DocumentFormat::from_name(name.as_deref());
        Self {
            name,
            bytes: bytes.into(),
            format,
        }
    }

    /// Override the format picked from the name.
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> Result<&str, InputError> {
        std::str::from_utf8(&self.bytes).map_err(|source| InputError::Utf8 {
            name: self.display_name(),
            source,
        })
    }

    /// Decode the bytes according to [`format`](Self::format).
    pub fn document(&self) -> Result<Value, InputError> {
        let text = self.text()?;
        let parse_error = |message: String| InputError::Parse {
            name: self.display_name(),
            format: self.format,
            message,
        };

        match self.format {
            DocumentFormat::Json => {
                serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))
            }
            DocumentFormat::Toml => toml::from_str::<toml::Table>(text)
                .map(|table| toml_to_value(toml::Value::Table(table)))
                .map_err(|e| parse_error(e.to_string())),
            DocumentFormat::Xml => xml_to_value(text).map_err(parse_error),
            DocumentFormat::Text => Ok(Value::String(text.to_string())),
        }
    }

    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<stream>".to_string())
    }
}

/// Convert a TOML value, rendering datetimes as their RFC 3339 text.
fn toml_to_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => {
            serde_json::Number::from_f64(f).map_or_else(|| Value::String(f.to_string()), Value::Number)
        }
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_value(value)))
                .collect(),
        ),
    }
}

/// An element under construction while walking the XML events.
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: BTreeMap<String, Vec<Value>>,
    child_order: Vec<String>,
    text: String,
}

impl XmlNode {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn add_child(&mut self, name: String, value: Value) {
        if !self.children.contains_key(&name) {
            self.child_order.push(name.clone());
        }
        self.children.entry(name).or_default().push(value);
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(text.to_string());
        }

        let mut map = Map::new();
        for (key, value) in self.attributes {
            map.insert(format!("{XML_ATTRIBUTE_PREFIX}{key}"), Value::String(value));
        }
        let mut children = self.children;
        for name in self.child_order {
            if let Some(mut values) = children.remove(&name) {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::Array(values)
                };
                map.insert(name, value);
            }
        }
        if !text.is_empty() {
            map.insert(XML_TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        Value::Object(map)
    }
}

/// Map an XML document onto a JSON value rooted at `{ "<root>": ... }`.
fn xml_to_value(text: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(ref e) => stack.push(XmlNode::open(e)?),
            Event::Empty(ref e) => {
                let node = XmlNode::open(e)?;
                close_node(node, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                close_node(node, &mut stack, &mut root)?;
            }
            Event::Text(ref e) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&e.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(e) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }
    let (name, value) = root.ok_or_else(|| "document has no root element".to_string())?;
    let mut map = Map::new();
    map.insert(name, value);
    Ok(Value::Object(map))
}

fn close_node(
    node: XmlNode,
    stack: &mut [XmlNode],
    root: &mut Option<(String, Value)>,
) -> Result<(), String> {
    let name = node.name.clone();
    let value = node.into_value();
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None if root.is_none() => *root = Some((name, value)),
        None => return Err(format!("second root element <{name}>")),
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read input {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("input {name} is not valid UTF-8: {source}")]
    Utf8 {
        name: String,
        source: std::str::Utf8Error,
    },
    #[error("failed to parse {name} as {format}: {message}")]
    Parse {
        name: String,
        format: DocumentFormat,
        message: String,
    },
}
