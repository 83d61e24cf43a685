// Start of file: /src/utils/xml.rs

/*
    * XML rendering of problem documents under a `<problem>` root.
    *
    * Objects become nested elements, arrays become repeated siblings named
    * after their key (an array directly inside an array is wrapped in an
    * element with `<item>` children) and scalars become text. Keys are
    * rewritten into valid XML names one character at a time.
*/

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::problem::ProblemDocument;

pub const ROOT_ELEMENT: &str = "problem";
pub const NAMESPACE: &str = "urn:ietf:rfc:7807";
const LIST_ITEM_ELEMENT: &str = "item";

#[derive(Debug, Error)]
#[error("failed to render problem as XML: {0}")]
pub struct XmlRenderError(pub String);

// * NCName rules: the root declares a default namespace, so `:` would start an unbound prefix
fn is_name_start_char(ch: char) -> bool {
    matches!(ch,
        'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch)
        || matches!(ch,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Turns an arbitrary key into a valid XML element name. Every invalid
/// character is replaced by `_` in place; an empty key becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return "_".to_owned();
    }

    name.chars()
        .enumerate()
        .map(|(position, ch)| {
            let valid: bool = if position == 0 { is_name_start_char(ch) } else { is_name_char(ch) };
            if valid { ch } else { '_' }
        })
        .collect()
}

/// Replaces characters XML 1.0 does not allow in text with U+FFFD.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\t' | '\n' | '\r' => ch,
            '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => '\u{FFFD}',
            _ => ch,
        })
        .collect()
}

struct ProblemXmlWriter {
    writer: Writer<Vec<u8>>,
}

impl ProblemXmlWriter {
    fn new() -> Self {
        Self { writer: Writer::new(Vec::with_capacity(256)) }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), XmlRenderError> {
        self.writer
            .write_event(event)
            .map_err(|e| XmlRenderError(e.to_string()))
    }

    fn document(mut self, fields: &Map<String, Value>) -> Result<Vec<u8>, XmlRenderError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root: BytesStart<'_> = BytesStart::new(ROOT_ELEMENT);
        root.push_attribute(("xmlns", NAMESPACE));
        self.event(Event::Start(root))?;
        for (key, value) in fields {
            self.member(&sanitize_name(key), value)?;
        }
        self.event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;

        Ok(self.writer.into_inner())
    }

    // * A member whose value is a non-empty array expands into siblings
    fn member(&mut self, name: &str, value: &Value) -> Result<(), XmlRenderError> {
        match value {
            Value::Array(items) if !items.is_empty() => {
                for item in items {
                    self.element(name, item)?;
                }
                Ok(())
            }
            _ => self.element(name, value),
        }
    }

    fn element(&mut self, name: &str, value: &Value) -> Result<(), XmlRenderError> {
        let text: String = match value {
            Value::Null => return self.event(Event::Empty(BytesStart::new(name))),
            Value::Array(items) if items.is_empty() => {
                return self.event(Event::Empty(BytesStart::new(name)));
            }
            Value::Object(map) if map.is_empty() => {
                return self.event(Event::Empty(BytesStart::new(name)));
            }
            Value::Object(map) => {
                self.event(Event::Start(BytesStart::new(name)))?;
                for (key, child) in map {
                    self.member(&sanitize_name(key), child)?;
                }
                return self.event(Event::End(BytesEnd::new(name)));
            }
            Value::Array(items) => {
                self.event(Event::Start(BytesStart::new(name)))?;
                for item in items {
                    self.element(LIST_ITEM_ELEMENT, item)?;
                }
                return self.event(Event::End(BytesEnd::new(name)));
            }
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::String(string) => sanitize_text(string),
        };

        self.event(Event::Start(BytesStart::new(name)))?;
        self.event(Event::Text(BytesText::new(&text)))?;
        self.event(Event::End(BytesEnd::new(name)))
    }
}

/// Renders the full document.
pub fn encode(document: &ProblemDocument) -> Result<Vec<u8>, XmlRenderError> {
    ProblemXmlWriter::new().document(document.fields())
}

/// Renders the document and never fails: falls back to the canonical fields,
/// then to an empty `<problem/>` root.
pub fn render(document: &ProblemDocument) -> Vec<u8> {
    encode(document)
        .or_else(|_| ProblemXmlWriter::new().document(&document.canonical_fields()))
        .unwrap_or_else(|_| {
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><{ROOT_ELEMENT} xmlns="{NAMESPACE}"/>"#).into_bytes()
        })
}

/// Renders a bare map under the problem root.
pub fn encode_fields(fields: &Map<String, Value>) -> Result<Vec<u8>, XmlRenderError> {
    ProblemXmlWriter::new().document(fields)
}

// End of file: /src/utils/xml.rs
