use std::str;

use quick_xml::events::BytesStart;

use crate::errors::Result;

/// One element of the source tree with its attributes in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn from_start(start: &BytesStart) -> Result<Element> {
        let name = str::from_utf8(start.name().as_ref())?.to_string();
        let mut attributes = Vec::new();
        for attribute_res in start.attributes() {
            let attribute = attribute_res?;
            let key = str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Element {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub(crate) fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Direct children with the given tag name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// A top-level element together with its verbatim serialization in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceElement {
    element: Element,
    raw: Vec<u8>,
}

impl SourceElement {
    pub fn new(element: Element, raw: Vec<u8>) -> Self {
        SourceElement { element, raw }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_element(self) -> Element {
        self.element
    }
}
