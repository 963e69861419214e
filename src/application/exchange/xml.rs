//! Namespace-aware element tree over `quick-xml`.
//!
//! Import documents are read fully into a tree before any entity is produced,
//! so a malformed document is rejected as a whole.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::application::exchange::ExchangeError;

/// Namespace permanently bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    /// Concatenated text and CDATA directly inside this element.
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// `namespace` is `""` for elements outside any namespace.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref().unwrap_or("") == namespace
    }

    pub fn child(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.is(namespace, name))
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children
            .iter()
            .filter(move |child| child.is(namespace, name))
    }

    /// First child whose namespace starts with `prefix`.
    pub fn child_in(&self, namespace_prefix: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| {
            child.name == name
                && child
                    .namespace
                    .as_deref()
                    .is_some_and(|ns| ns.starts_with(namespace_prefix))
        })
    }

    /// Trimmed text of the first matching child.
    pub fn child_text(&self, namespace: &str, name: &str) -> Option<&str> {
        self.child(namespace, name).map(|child| child.text.trim())
    }

    pub fn attribute(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name && attr.namespace.as_deref().unwrap_or("") == namespace)
            .map(|attr| attr.value.as_str())
    }

    /// Remove and return the first matching child.
    pub fn take_child(&mut self, namespace: &str, name: &str) -> Option<XmlElement> {
        let index = self
            .children
            .iter()
            .position(|child| child.is(namespace, name))?;
        Some(self.children.remove(index))
    }

    pub fn into_children_named(self, namespace: &str, name: &str) -> Vec<XmlElement> {
        self.children
            .into_iter()
            .filter(|child| child.is(namespace, name))
            .collect()
    }
}

/// Parse `input` into its root element.
pub fn parse_document(input: &str) -> Result<XmlElement, ExchangeError> {
    let mut reader = NsReader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (resolved, event) = match reader.read_resolved_event() {
            Ok(pair) => pair,
            Err(err) => return Err(ExchangeError::invalid(format!("malformed XML: {err}"))),
        };
        let namespace = namespace_uri(resolved)?;

        match event {
            Event::Start(start) => {
                let element = open_element(&reader, namespace, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, namespace, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ExchangeError::invalid("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let value = text
                        .unescape()
                        .map_err(|err| ExchangeError::invalid(format!("bad text node: {err}")))?;
                    current.text.push_str(&value);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    let value = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|err| ExchangeError::invalid(format!("bad CDATA: {err}")))?;
                    current.text.push_str(&value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ExchangeError::invalid("document ended inside an element"));
    }
    root.ok_or_else(|| ExchangeError::invalid("document has no root element"))
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>, ExchangeError> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ExchangeError::invalid(format!(
            "undeclared namespace prefix `{}`",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<XmlElement, ExchangeError> {
    let name = utf8_name(start.local_name().as_ref())?;

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute
            .map_err(|err| ExchangeError::invalid(format!("malformed attribute: {err}")))?;
        let key = attribute.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }

        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let attr_namespace = if key.starts_with(b"xml:") {
            Some(XML_NS.to_string())
        } else {
            namespace_uri(resolved)?
        };
        let value = attribute
            .unescape_value()
            .map_err(|err| ExchangeError::invalid(format!("bad attribute value: {err}")))?;
        attributes.push(XmlAttribute {
            namespace: attr_namespace,
            name: utf8_name(local.as_ref())?,
            value: value.into_owned(),
        });
    }

    Ok(XmlElement {
        namespace,
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ExchangeError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ExchangeError::invalid("document has more than one root element"));
    }
    *root = Some(element);
    Ok(())
}

fn utf8_name(bytes: &[u8]) -> Result<String, ExchangeError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| ExchangeError::invalid(format!("element name is not UTF-8: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_namespaces_and_collects_text() {
        let root = parse_document(
            r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:f="urn:f">
  <title>A &amp; B</title>
  <entry f:parent_id="3"><f:clean><![CDATA[x<y]]></f:clean></entry>
</feed>"#,
        )
        .expect("document");

        assert!(root.is("http://www.w3.org/2005/Atom", "feed"));
        assert_eq!(root.child_text("http://www.w3.org/2005/Atom", "title"), Some("A & B"));

        let entry = root
            .child("http://www.w3.org/2005/Atom", "entry")
            .expect("entry");
        assert_eq!(entry.attribute("urn:f", "parent_id"), Some("3"));
        assert_eq!(entry.child_text("urn:f", "clean"), Some("x<y"));
        assert!(entry.attributes.iter().all(|attr| attr.name != "f"));
    }

    #[test]
    fn unprefixed_elements_have_no_namespace() {
        let root = parse_document("<rss><channel><item/><item/></channel></rss>").expect("rss");
        let channel = root.child("", "channel").expect("channel");
        assert_eq!(channel.children_named("", "item").count(), 2);
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a>").is_err());
        assert!(parse_document("<x:a/>").is_err());
        assert!(parse_document("just text").is_err());
    }
}
