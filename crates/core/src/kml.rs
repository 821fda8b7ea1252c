//! Minimal XML element tree for building KML documents, written out with `quick-xml`.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Append `<name>text</name>`.
    pub fn text_child(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.child(Element::new(name).text(text))
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// First direct child element with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated direct text content.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Serialize with an XML declaration and two-space indentation.
    ///
    /// Elements holding only text stay on one line; childless ones are self-closed.
    pub fn to_document(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_to(&mut writer)?;

        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> std::io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start));
        }

        writer.write_event(Event::Start(start))?;
        for node in &self.children {
            match node {
                Node::Element(e) => e.write_to(writer)?,
                Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_nested() {
        let doc = Element::new("kml")
            .attr("xmlns", "http://www.opengis.net/kml/2.2")
            .child(Element::new("Document").text_child("name", "Trip").child(Element::new("empty")));

        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n",
            "  <Document>\n",
            "    <name>Trip</name>\n",
            "    <empty/>\n",
            "  </Document>\n",
            "</kml>\n",
        );
        assert_eq!(doc.to_document().unwrap(), expected);
    }

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let doc = Element::new("Placemark")
            .attr("id", r#"a"b"#)
            .text_child("description", "<img src='x.jpg'> & more")
            .to_document()
            .unwrap();

        assert!(doc.contains("&lt;img src="));
        assert!(doc.contains("&amp; more"));
        assert!(!doc.contains(r#"id="a"b""#));

        let parsed = roxmltree::Document::parse(&doc).unwrap();
        let root = parsed.root_element();
        assert_eq!(root.attribute("id"), Some(r#"a"b"#));
        let description = root.children().find(|n| n.has_tag_name("description")).unwrap();
        assert_eq!(description.text(), Some("<img src='x.jpg'> & more"));
    }

    #[test]
    fn test_find_and_attribute() {
        let el = Element::new("PhotoOverlay")
            .attr("id", "photo-1")
            .text_child("open", "0")
            .text_child("visibility", "1");
        assert_eq!(el.attribute("id"), Some("photo-1"));
        assert_eq!(el.find("visibility").map(Element::text_content), Some("1".into()));
        assert!(el.find("missing").is_none());
    }
}
