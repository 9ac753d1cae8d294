//! Read-only handles into a parsed HTML document.
//!
//! The parsed [`Document`] owns every node in one `ego_tree` arena. A [`DomNode`] is a
//! `Copy` handle (tree + node id); parent/child/sibling links are index lookups, so
//! holding handles never keeps anything alive beyond the document itself.

use std::collections::VecDeque;
use std::fmt;
use std::sync::LazyLock;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};

use docbind_shared::Result;

use crate::selector::{Selector, compile_chain};

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A parsed HTML document. Owns the node arena.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document. Malformed markup is repaired by the HTML5 parser.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// The document node.
    pub fn root(&self) -> DomNode<'_> {
        DomNode::new(self.html.tree.root())
    }

    /// The `<body>` element. The HTML5 parser always synthesizes one.
    pub fn body(&self) -> Option<DomNode<'_>> {
        self.root().select_first(std::slice::from_ref(&*BODY))
    }

    /// First element matching `selector` anywhere in the document.
    pub fn find(&self, selector: &str) -> Result<Option<DomNode<'_>>> {
        self.root().query_selector(selector, &[])
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.html.tree.values().count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DomNode
// ---------------------------------------------------------------------------

/// Handle to one node of a [`Document`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DomNode<'a> {
    node: NodeRef<'a, Node>,
}

impl<'a> DomNode<'a> {
    fn new(node: NodeRef<'a, Node>) -> Self {
        Self { node }
    }

    fn wrap(node: Option<NodeRef<'a, Node>>) -> Option<Self> {
        node.map(Self::new)
    }

    // --- Relations ---

    pub fn parent(&self) -> Option<DomNode<'a>> {
        Self::wrap(self.node.parent())
    }

    pub fn first_child(&self) -> Option<DomNode<'a>> {
        Self::wrap(self.node.first_child())
    }

    pub fn next_sibling(&self) -> Option<DomNode<'a>> {
        Self::wrap(self.node.next_sibling())
    }

    pub fn prev_sibling(&self) -> Option<DomNode<'a>> {
        Self::wrap(self.node.prev_sibling())
    }

    /// Children in document order.
    pub fn children(&self) -> impl Iterator<Item = DomNode<'a>> + 'a {
        self.node.children().map(Self::new)
    }

    /// Nearest following sibling that is an element.
    pub fn next_element(&self) -> Option<DomNode<'a>> {
        self.node
            .next_siblings()
            .find(|n| n.value().is_element())
            .map(Self::new)
    }

    /// Nearest preceding sibling that is an element.
    pub fn prev_element(&self) -> Option<DomNode<'a>> {
        self.node
            .prev_siblings()
            .find(|n| n.value().is_element())
            .map(Self::new)
    }

    // --- Node data ---

    pub fn is_element(&self) -> bool {
        self.node.value().is_element()
    }

    pub fn is_text(&self) -> bool {
        self.node.value().is_text()
    }

    /// Content of a text node; `None` for every other node kind.
    pub fn text(&self) -> Option<&'a str> {
        match self.node.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        }
    }

    /// Lowercase tag name; empty for non-element nodes.
    pub fn tag_name(&self) -> &'a str {
        match self.node.value() {
            Node::Element(element) => element.name(),
            _ => "",
        }
    }

    /// Attribute value, looked up case-insensitively.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        match self.node.value() {
            Node::Element(element) => element
                .attrs()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value),
            _ => None,
        }
    }

    // --- Serialization ---

    /// The node and its subtree re-serialized as HTML.
    pub fn outer_markup(&self) -> String {
        let mut out = String::new();
        serialize(self.node, &mut out);
        out
    }

    /// Only the children re-serialized as HTML.
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in self.node.children() {
            serialize(child, &mut out);
        }
        out
    }

    /// Depth-first concatenation of every text descendant. Markup is dropped, not
    /// translated; see the scraper's prose extraction for that.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        collect_text(self.node, &mut out);
        out
    }

    // --- Selection ---

    /// Whether this node matches `selector`.
    pub fn matches(&self, selector: &str) -> Result<bool> {
        Ok(Selector::parse(selector)?.matches(self.node.value()))
    }

    /// All descendants matching `selector`; each match is then searched again with
    /// the `nested` chain, one selector per level.
    pub fn query_selector_all(&self, selector: &str, nested: &[&str]) -> Result<Vec<DomNode<'a>>> {
        let chain = compile_chain(selector, nested)?;
        Ok(self.select_all(&chain))
    }

    /// First result of [`query_selector_all`](Self::query_selector_all).
    pub fn query_selector(&self, selector: &str, nested: &[&str]) -> Result<Option<DomNode<'a>>> {
        let chain = compile_chain(selector, nested)?;
        Ok(self.select_first(&chain))
    }

    /// [`query_selector_all`](Self::query_selector_all) over precompiled selectors.
    ///
    /// Scan order: each sibling list is walked in full before descending, starting with
    /// this node's children.
    pub fn select_all(&self, chain: &[Selector]) -> Vec<DomNode<'a>> {
        let mut out = Vec::new();
        self.scan(chain, &mut |found| {
            out.push(found);
            false
        });
        out
    }

    /// First result of [`select_all`](Self::select_all), without scanning further.
    pub fn select_first(&self, chain: &[Selector]) -> Option<DomNode<'a>> {
        let mut first = None;
        self.scan(chain, &mut |found| {
            first = Some(found);
            true
        });
        first
    }

    /// Visit matches in scan order; `visit` returns `true` to stop.
    fn scan(&self, chain: &[Selector], visit: &mut dyn FnMut(DomNode<'a>) -> bool) -> bool {
        let Some((selector, rest)) = chain.split_first() else {
            return false;
        };

        let mut queue: VecDeque<NodeRef<'a, Node>> = self.node.first_child().into_iter().collect();

        while let Some(head) = queue.pop_front() {
            let mut cursor = Some(head);
            while let Some(node) = cursor {
                if node.value().is_element() || node.value().is_document() {
                    if selector.matches(node.value()) {
                        let found = DomNode::new(node);
                        let stop = if rest.is_empty() {
                            visit(found)
                        } else {
                            found.scan(rest, visit)
                        };
                        if stop {
                            return true;
                        }
                    }
                    if let Some(child) = node.first_child() {
                        queue.push_back(child);
                    }
                }
                cursor = node.next_sibling();
            }
        }

        false
    }

    /// Nearest following sibling matching `selector`.
    pub fn next(&self, selector: &str) -> Result<Option<DomNode<'a>>> {
        Ok(self.next_matching(&Selector::parse(selector)?))
    }

    /// Nearest preceding sibling matching `selector`.
    pub fn previous(&self, selector: &str) -> Result<Option<DomNode<'a>>> {
        Ok(self.previous_matching(&Selector::parse(selector)?))
    }

    pub fn next_matching(&self, selector: &Selector) -> Option<DomNode<'a>> {
        self.node
            .next_siblings()
            .find(|n| selector.matches(n.value()))
            .map(Self::new)
    }

    pub fn previous_matching(&self, selector: &Selector) -> Option<DomNode<'a>> {
        self.node
            .prev_siblings()
            .find(|n| selector.matches(n.value()))
            .map(Self::new)
    }

    /// Nearest ancestor matching `selector`.
    pub fn closest(&self, selector: &str) -> Result<Option<DomNode<'a>>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .node
            .ancestors()
            .find(|n| selector.matches(n.value()))
            .map(Self::new))
    }

    /// True iff this node is a sibling strictly after `from` and, when `to` is given,
    /// strictly before `to`. False when `from` is absent.
    pub fn between(&self, from: Option<DomNode<'a>>, to: Option<DomNode<'a>>) -> bool {
        let Some(from) = from else {
            return false;
        };

        from.node
            .next_siblings()
            .take_while(|n| to.is_none_or(|to| *n != to.node))
            .any(|n| n == self.node)
    }
}

impl fmt::Display for DomNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outer_markup())
    }
}

impl fmt::Debug for DomNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.value() {
            Node::Element(element) => write!(f, "DomNode(<{}>)", element.name()),
            Node::Text(text) => write!(f, "DomNode({:?})", &**text),
            Node::Document => f.write_str("DomNode(#document)"),
            _ => f.write_str("DomNode(#other)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) | Node::Document | Node::Fragment => collect_text(child, out),
            _ => {}
        }
    }
}

fn serialize(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                out.push_str(&element.html());
            }
        }
        Node::Text(text) => escape_text(text, out),
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Doctype(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype.name());
            out.push('>');
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                serialize(child, out);
            }
        }
        _ => {}
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}
