//! Minimal element tree over `quick-xml` events.
//!
//! Feeds are read as a generic tree rather than bound to an RSS schema, so
//! callers look things up by element name (`descendants("item")`,
//! `child("title")`) wherever they happen to sit in the document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// SEC-003: Maximum element nesting depth.
/// Prevents unbounded memory use from maliciously deep documents.
pub const MAX_XML_DEPTH: usize = 256;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Document-level failures. Any of these makes the whole body unusable.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The reader rejected the markup (syntax error, mismatched end tag, bad
    /// attribute, undeclared entity, invalid UTF-8).
    #[error("XML parse error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Character data appeared before or after the root element.
    #[error("Text outside the root element at byte {0}")]
    ContentOutsideRoot(u64),

    /// The document ended while elements were still open.
    #[error("Unclosed element <{0}> at end of document")]
    Unclosed(String),

    /// The body contained no element at all.
    #[error("Document has no root element")]
    NoRoot,

    /// A second top-level element followed the root.
    #[error("Document has more than one root element (found <{0}>)")]
    MultipleRoots(String),

    /// SEC-003: Nesting exceeded [`MAX_XML_DEPTH`].
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(XmlElement),
    Text(String),
}

/// One element with its children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    children: Vec<Node>,
}

/// A parsed document: exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parses a UTF-8 XML body into a tree.
    ///
    /// Comments, processing instructions and the DOCTYPE are skipped. DTD
    /// entity declarations are never expanded. A leading byte-order mark is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed markup or attributes, undeclared
    /// entities, invalid UTF-8, text outside the root, unclosed elements, a
    /// missing or duplicated root, or nesting beyond [`MAX_XML_DEPTH`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        // Open elements, innermost last. Closed elements are folded into their parent.
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            buf.clear();
            let event = reader.read_event_into(&mut buf).map_err(|e| ParseError::Syntax {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(e) => {
                    if stack.len() >= MAX_XML_DEPTH {
                        return Err(ParseError::MaxDepthExceeded(MAX_XML_DEPTH));
                    }
                    let name = decode_name(e.name().as_ref(), &reader)?;
                    check_attributes(&e, &reader)?;
                    if stack.is_empty() && root.is_some() {
                        return Err(ParseError::MultipleRoots(name));
                    }
                    stack.push(XmlElement::new(name));
                }
                Event::Empty(e) => {
                    let name = decode_name(e.name().as_ref(), &reader)?;
                    check_attributes(&e, &reader)?;
                    let element = XmlElement::new(name);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None if root.is_some() => {
                            return Err(ParseError::MultipleRoots(element.name));
                        }
                        None => root = Some(element),
                    }
                }
                Event::End(_) => {
                    // quick-xml has already checked the end name matches
                    let Some(closed) = stack.pop() else {
                        return Err(syntax_error(&reader, "unexpected end tag"));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(closed)),
                        None => root = Some(closed),
                    }
                }
                Event::Text(e) => {
                    let Some(parent) = stack.last_mut() else {
                        // Only whitespace may sit between top-level constructs
                        if !e.iter().all(|b| matches!(*b, b' ' | b'\t' | b'\r' | b'\n')) {
                            return Err(ParseError::ContentOutsideRoot(
                                reader.buffer_position() as u64,
                            ));
                        }
                        continue;
                    };
                    // Undeclared entities and invalid UTF-8 fail the whole document
                    let text = e
                        .unescape()
                        .map_err(|err| syntax_error(&reader, err))?;
                    parent.children.push(Node::Text(text.into_owned()));
                }
                Event::CData(e) => {
                    let Some(parent) = stack.last_mut() else {
                        return Err(ParseError::ContentOutsideRoot(
                            reader.buffer_position() as u64,
                        ));
                    };
                    let text = std::str::from_utf8(&e).map_err(|err| syntax_error(&reader, err))?;
                    parent.children.push(Node::Text(text.to_owned()));
                }
                Event::Eof => break,
                // Decl, PI, Comment, DocType
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(ParseError::Unclosed(open.name));
        }

        root.map(|root| Self { root }).ok_or(ParseError::NoRoot)
    }

    /// The document's single top-level element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// All elements named `name` anywhere in the document, root included,
    /// in document order.
    pub fn descendants<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        std::iter::once(&self.root)
            .filter(move |root| root.name == name)
            .chain(self.root.descendants(name))
    }
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Qualified element name as written, e.g. `item` or `media:content`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First direct child element named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    /// Direct child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Elements named `name` at any depth below this one, in document order.
    /// The element itself is not included.
    pub fn descendants<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        Descendants {
            stack: vec![self.children.iter()],
        }
        .filter(move |el| el.name == name)
    }

    /// Concatenated text of this element and everything below it.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }
}

/// Pre-order walk without recursion. Depth is bounded by [`MAX_XML_DEPTH`].
struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(Node::Element(el)) => {
                    self.stack.push(el.children.iter());
                    return Some(el);
                }
                Some(_) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

fn syntax_error(reader: &Reader<&[u8]>, message: impl ToString) -> ParseError {
    ParseError::Syntax {
        position: reader.buffer_position() as u64,
        message: message.to_string(),
    }
}

fn decode_name(raw: &[u8], reader: &Reader<&[u8]>) -> Result<String, ParseError> {
    reader
        .decoder()
        .decode(raw)
        .map(|name| name.into_owned())
        .map_err(|e| syntax_error(reader, e))
}

/// Attributes are not kept, but they still have to be well-formed.
fn check_attributes(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<(), ParseError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax_error(reader, e))?;
        attr.decode_and_unescape_value(reader.decoder())
            .map_err(|e| syntax_error(reader, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> Result<XmlDocument, ParseError> {
        XmlDocument::parse(xml.as_bytes())
    }

    #[test]
    fn test_descendants_any_depth_in_document_order() {
        let doc = parse(
            "<root><item>1</item><group><item>2</item><deep><item>3</item></deep></group><item>4</item></root>",
        )
        .unwrap();
        let texts: Vec<String> = doc
            .descendants("item")
            .map(|el| el.text())
            .collect();
        assert_eq!(texts, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_nested_items_are_both_found() {
        let doc = parse("<rss><item><item>inner</item></item></rss>").unwrap();
        assert_eq!(doc.descendants("item").count(), 2);
    }

    #[test]
    fn test_root_matches_descendant_query() {
        let doc = parse("<item><title>solo</title></item>").unwrap();
        assert_eq!(doc.descendants("item").count(), 1);
    }

    #[test]
    fn test_child_is_direct_only_and_first() {
        let doc = parse(
            "<item><media><title>nested</title></media><title>first</title><title>second</title></item>",
        )
        .unwrap();
        let item = doc.root();
        assert_eq!(item.child("title").unwrap().text(), "first");
        assert!(item.child("missing").is_none());
    }

    #[test]
    fn test_text_concatenates_descendants() {
        let doc = parse("<d>Hello <b>bold</b> world</d>").unwrap();
        assert_eq!(doc.root().text(), "Hello bold world");
    }

    #[test]
    fn test_text_preserves_whitespace() {
        let doc = parse("<t>\n  spaced  \n</t>").unwrap();
        assert_eq!(doc.root().text(), "\n  spaced  \n");
    }

    #[test]
    fn test_entities_and_cdata() {
        let doc = parse("<d>Fish &amp; Chips <![CDATA[<b>raw</b>]]></d>").unwrap();
        assert_eq!(doc.root().text(), "Fish & Chips <b>raw</b>");
    }

    #[test]
    fn test_undeclared_entity_fails_document() {
        assert!(matches!(
            parse("<rss><a>fine</a><b>non&nbsp;breaking</b></rss>"),
            Err(ParseError::Syntax { .. })
        ));
        assert!(parse("<rss><t>Fish & Chips</t></rss>").is_err());
        assert!(parse("<rss><t>&copy; 2025</t></rss>").is_err());
    }

    #[test]
    fn test_character_references_decoded() {
        let doc = parse("<t>caf&#233; &#x2014; &lt;ok&gt;</t>").unwrap();
        assert_eq!(doc.root().text(), "caf\u{e9} \u{2014} <ok>");
    }

    #[test]
    fn test_well_formed_attributes_accepted() {
        let doc = parse(r#"<rss version="2.0"><item id='a&amp;b'><title>x</title></item></rss>"#)
            .unwrap();
        assert_eq!(doc.descendants("item").count(), 1);
    }

    #[test]
    fn test_empty_element() {
        let doc = parse("<item><image/></item>").unwrap();
        assert_eq!(doc.root().child("image").unwrap().text(), "");
    }

    #[test]
    fn test_bom_and_declaration_skipped() {
        let mut body = b"\xEF\xBB\xBF".to_vec();
        body.extend_from_slice(b"<?xml version=\"1.0\"?><!-- c --><rss/>");
        let doc = XmlDocument::parse(&body).unwrap();
        assert_eq!(doc.root().name(), "rss");
    }

    #[test]
    fn test_qualified_names_kept() {
        let doc = parse("<item><media:image>x</media:image></item>").unwrap();
        assert!(doc.root().child("image").is_none());
        assert!(doc.root().child("media:image").is_some());
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(parse("<not valid xml").is_err());
        assert!(matches!(parse(""), Err(ParseError::NoRoot)));
        assert!(matches!(
            parse("just text"),
            Err(ParseError::ContentOutsideRoot(_))
        ));
        assert!(matches!(
            parse("<rss><channel></rss>"),
            Err(ParseError::Syntax { .. })
        ));
        assert!(matches!(
            parse("<rss><channel>"),
            Err(ParseError::Unclosed(name)) if name == "channel"
        ));
        assert!(matches!(
            parse("<a/><b/>"),
            Err(ParseError::MultipleRoots(name)) if name == "b"
        ));
        assert!(parse("<rss></rss></extra>").is_err());
    }

    #[test]
    fn test_text_around_root_rejected() {
        assert!(matches!(
            parse("<rss><item><title>A</title></item></rss>trailing junk"),
            Err(ParseError::ContentOutsideRoot(_))
        ));
        assert!(matches!(
            parse("junk<rss><item><title>A</title></item></rss>"),
            Err(ParseError::ContentOutsideRoot(_))
        ));
        assert!(matches!(
            parse("<rss/><![CDATA[after]]>"),
            Err(ParseError::ContentOutsideRoot(_))
        ));
        // Whitespace around the root is fine
        assert!(parse("\n  <rss/>\r\n\t").is_ok());
    }

    #[test]
    fn test_bad_attributes_rejected() {
        assert!(matches!(
            parse("<rss><item foo=bar><title>A</title></item></rss>"),
            Err(ParseError::Syntax { .. })
        ));
        assert!(parse(r#"<rss><item a="1" a="2"/></rss>"#).is_err());
        assert!(parse(r#"<rss><item href="a&nbsp;b"/></rss>"#).is_err());
        assert!(parse(r#"<rss a="1" a="2"/>"#).is_err());
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(matches!(
            XmlDocument::parse(
                b"<rss><item><title>A\xff\xfe</title></item><item><title>B</title></item></rss>"
            ),
            Err(ParseError::Syntax { .. })
        ));
        assert!(XmlDocument::parse(b"<rss><d><![CDATA[\xff]]></d></rss>").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!(
            "{}{}",
            "<d>".repeat(MAX_XML_DEPTH + 1),
            "</d>".repeat(MAX_XML_DEPTH + 1)
        );
        assert!(matches!(
            parse(&deep),
            Err(ParseError::MaxDepthExceeded(MAX_XML_DEPTH))
        ));

        let ok = format!(
            "{}{}",
            "<d>".repeat(MAX_XML_DEPTH),
            "</d>".repeat(MAX_XML_DEPTH)
        );
        assert!(parse(&ok).is_ok());
    }
}
