//! Owned vector document model
//!
//! `roxmltree` gives a read-only view over the source text; we copy the
//! `svg` subtree out of it into plain owned nodes that can be edited and
//! written back. Qualified names are resolved at copy time and namespace
//! declarations are kept as ordinary `xmlns` attributes, so the serializer
//! never needs namespace bookkeeping.

use crate::error::DocumentError;

const SVG_TAG: &str = "svg";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A name/value attribute pair, name fully qualified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name (`fill`, `xlink:href`, `xmlns:xlink`)
    pub name: String,
    /// Unescaped value
    pub value: String,
}

/// Document content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data, unescaped
    Text(String),
    /// Comment body
    Comment(String),
    /// Processing instruction
    Instruction {
        /// PI target
        target: String,
        /// PI data
        value: Option<String>,
    },
}

/// An element with its attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Qualified tag name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in source order (namespace declarations first)
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Child nodes
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Value of the attribute named `name`
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set `name` to `value`, replacing in place or appending
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => value.clone_into(&mut attr.value),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn from_node(node: roxmltree::Node<'_, '_>, inherited: Option<roxmltree::Node<'_, '_>>) -> Self {
        let mut attributes = Vec::new();

        for ns in node.namespaces() {
            if ns.name() == Some("xml") {
                continue;
            }
            let declared_above = inherited
                .map(|parent| {
                    parent
                        .namespaces()
                        .any(|p| p.name() == ns.name() && p.uri() == ns.uri())
                })
                .unwrap_or(false);
            if declared_above {
                continue;
            }
            let name = match ns.name() {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            attributes.push(Attribute {
                name,
                value: ns.uri().to_string(),
            });
        }

        for attr in node.attributes() {
            attributes.push(Attribute {
                name: qualified_name(node, attr.namespace(), attr.name()),
                value: attr.value().to_string(),
            });
        }

        let tag = node.tag_name();
        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(Node::Element(Self::from_node(child, Some(node))))
                } else if child.is_text() {
                    child.text().map(|t| Node::Text(t.to_string()))
                } else if child.is_comment() {
                    child.text().map(|t| Node::Comment(t.to_string()))
                } else {
                    child.pi().map(|pi| Node::Instruction {
                        target: pi.target.to_string(),
                        value: pi.value.map(str::to_string),
                    })
                }
            })
            .collect();

        Self {
            name: qualified_name(node, tag.namespace(), tag.name()),
            attributes,
            children,
        }
    }

    fn visit_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.visit_mut(f);
            }
        }
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            escape_into(&attr.value, true, out);
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.write(out),
                Node::Text(text) => escape_into(text, false, out),
                Node::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                Node::Instruction { target, value } => {
                    out.push_str("<?");
                    out.push_str(target);
                    if let Some(value) = value {
                        out.push(' ');
                        out.push_str(value);
                    }
                    out.push_str("?>");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// An editable copy of a template's root `svg` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgDocument {
    root: Element,
}

impl SvgDocument {
    /// Parse `markup` and copy out its root vector element.
    ///
    /// The root is the document element when it is an `svg`, otherwise the
    /// first `svg` element in document order. DTDs are accepted since
    /// exported templates often carry one.
    ///
    /// # Errors
    /// - `DocumentError::Malformed` if the markup is not well-formed
    /// - `DocumentError::MissingSvgRoot` if no `svg` element exists
    pub fn parse(markup: &str) -> Result<Self, DocumentError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(markup, options)?;

        let svg = doc
            .root_element()
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == SVG_TAG)
            .ok_or(DocumentError::MissingSvgRoot)?;

        Ok(Self {
            root: Element::from_node(svg, None),
        })
    }

    /// The root `svg` element
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// First element in document order whose `attribute` equals `value`
    #[must_use]
    pub fn find_by_attribute(&self, attribute: &str, value: &str) -> Option<&Element> {
        fn find<'a>(element: &'a Element, attribute: &str, value: &str) -> Option<&'a Element> {
            if element.attribute(attribute) == Some(value) {
                return Some(element);
            }
            element.children.iter().find_map(|child| match child {
                Node::Element(e) => find(e, attribute, value),
                _ => None,
            })
        }
        find(&self.root, attribute, value)
    }

    /// Visit every element in document order (pre-order)
    pub fn for_each_element_mut<F: FnMut(&mut Element)>(&mut self, mut f: F) {
        self.root.visit_mut(&mut f);
    }

    /// Serialize the root element back to markup
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.root.write(&mut out);
        out
    }
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(XML_NS) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn escape_into(input: &str, in_attribute: bool, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\n' if in_attribute => out.push_str("&#10;"),
            _ => out.push(ch),
        }
    }
}
