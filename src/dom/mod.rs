//! Arena-backed HTML document model.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Ids are never
//! reused, so a node keeps its identity after it is detached from the tree.
//! That identity is what the include engine keys its processed set on.
//!
//! # Module Structure
//!
//! - `parse` - inert HTML5 parsing via `scraper` (scripts come out already started)
//! - `html` - escaping and serialization
//!
//! # Script Execution Model
//!
//! Every script element carries an "already started" flag. Parsed scripts
//! have it set, so moving them around never makes them runnable. Only a
//! script built with [`Document::create_element`] starts unflagged; once
//! such a script is inserted under the document root,
//! [`Document::take_runnable_scripts`] hands it out exactly once.

mod html;
mod parse;

/// Stable handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element payload: tag name, ordered attributes and the script flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Only meaningful for `<script>`.
    pub already_started: bool,
}

impl Element {
    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set (or append) an attribute value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document or fragment root.
    Root,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable HTML tree. Also used for parsed fragments.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only its root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            doctype: None,
        }
    }

    /// Parse HTML into an inert document.
    pub fn parse(html: &str) -> Self {
        parse::parse(html)
    }

    #[inline]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub(crate) fn set_doctype(&mut self, doctype: impl Into<String>) {
        self.doctype = Some(doctype.into());
    }

    /// Serialize the whole document back to HTML.
    pub fn to_html(&self) -> String {
        html::serialize(self)
    }

    // ========================================================================
    // Node access
    // ========================================================================

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(elem) = self.element_mut(id) {
            elem.set_attr(name, value);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Subtree of `id` in tree order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Attached elements carrying `attr`, in tree order.
    pub fn elements_with_attr(&self, attr: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|e| e.attr(attr).is_some()))
            .collect()
    }

    /// Attached elements with the given tag name, in tree order.
    pub fn elements_by_name(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|e| e.is(name)))
            .collect()
    }

    // ========================================================================
    // Construction and mutation
    // ========================================================================

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element. Scripts created here are runnable.
    pub fn create_element(&mut self, name: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeData::Element(Element {
            name: name.to_ascii_lowercase(),
            attrs,
            already_started: false,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    pub(crate) fn push_parsed(&mut self, data: NodeData) -> NodeId {
        self.push(data)
    }

    /// Detach `id` from its parent, if any.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Put `replacement` where `old` was, detaching `old`.
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) {
        self.replace_with_many(old, &[replacement]);
    }

    /// Put `replacements` (in order) where `old` was, detaching `old`.
    ///
    /// A no-op when `old` has no parent.
    pub fn replace_with_many(&mut self, old: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        for &node in replacements {
            self.detach(node);
        }
        let siblings = &mut self.nodes[parent.0].children;
        let Some(index) = siblings.iter().position(|&child| child == old) else {
            return;
        };
        siblings.splice(index..=index, replacements.iter().copied());
        for &node in replacements {
            self.nodes[node.0].parent = Some(parent);
        }
        self.nodes[old.0].parent = None;
    }

    /// Deep-clone `node` of `other` into this arena, returning the detached copy.
    ///
    /// The script flag travels with the clone.
    pub fn import_node(&mut self, other: &Document, node: NodeId) -> NodeId {
        let copy = self.push(other.data(node).clone());
        for &child in other.children(node) {
            let child_copy = self.import_node(other, child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// Replace `marker` with deep clones of the fragment root's children.
    ///
    /// Returns the inserted top-level nodes.
    pub fn replace_with_fragment(&mut self, marker: NodeId, fragment: &Document) -> Vec<NodeId> {
        let inserted: Vec<NodeId> = fragment
            .children(fragment.root())
            .iter()
            .map(|&child| self.import_node(fragment, child))
            .collect();
        self.replace_with_many(marker, &inserted);
        inserted
    }

    /// Collect attached scripts under `inserted` that have not started yet,
    /// flagging each as started. Tree order.
    pub fn take_runnable_scripts(&mut self, inserted: &[NodeId]) -> Vec<NodeId> {
        let mut runnable = Vec::new();
        for &top in inserted {
            if !self.is_attached(top) {
                continue;
            }
            let mut subtree = vec![top];
            subtree.extend(self.descendants(top));
            for id in subtree {
                if let Some(elem) = self.element_mut(id)
                    && elem.is("script")
                    && !elem.already_started
                {
                    elem.already_started = true;
                    runnable.push(id);
                }
            }
        }
        runnable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_replace_with_keeps_position() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("p", Vec::new());
        let b = doc.create_element("div", Vec::new());
        let c = doc.create_element("p", Vec::new());
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);

        let x = doc.create_element("span", Vec::new());
        let y = doc.create_element("em", Vec::new());
        doc.replace_with_many(b, &[x, y]);

        assert_eq!(doc.children(root), &[a, x, y, c]);
        assert_eq!(doc.parent(b), None);
        assert!(!doc.is_attached(b));
        assert!(doc.is_attached(y));
    }

    #[test]
    fn test_replace_detached_is_noop() {
        let mut doc = Document::new();
        let a = doc.create_element("p", Vec::new());
        let b = doc.create_element("p", Vec::new());
        doc.replace_with(a, b);
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn test_elements_with_attr_tree_order() {
        let doc = Document::parse(
            r#"<div data-include="a"><span data-include="b"></span></div><p data-include="c"></p>"#,
        );
        let found: Vec<_> = doc
            .elements_with_attr("data-include")
            .into_iter()
            .map(|id| doc.attr(id, "data-include").unwrap().to_string())
            .collect();
        assert_eq!(found, ["a", "b", "c"]);
    }

    #[test]
    fn test_replace_with_fragment_imports_children() {
        let mut doc = Document::parse(r#"<main><div id="slot"></div></main>"#);
        let fragment = Document::parse("<h1>Title</h1><p>Body</p>");
        let slot = doc.elements_with_attr("id")[0];

        let inserted = doc.replace_with_fragment(slot, &fragment);

        assert_eq!(inserted.len(), 2);
        assert_eq!(doc.to_html(), "<main><h1>Title</h1><p>Body</p></main>");
        // fragment is untouched
        assert_eq!(fragment.to_html(), "<h1>Title</h1><p>Body</p>");
    }

    #[test]
    fn test_parsed_scripts_are_not_runnable() {
        let mut doc = Document::parse("<script>var a = 1;</script>");
        let all = doc.children(doc.root()).to_vec();
        assert!(doc.take_runnable_scripts(&all).is_empty());
    }

    #[test]
    fn test_fresh_scripts_run_once() {
        let mut doc = Document::new();
        let root = doc.root();
        let script = doc.create_element("script", attrs(&[("type", "module")]));
        doc.append_child(root, script);

        assert_eq!(doc.take_runnable_scripts(&[script]), vec![script]);
        assert!(doc.take_runnable_scripts(&[script]).is_empty());
    }

    #[test]
    fn test_detached_scripts_do_not_run() {
        let mut doc = Document::new();
        let script = doc.create_element("script", Vec::new());
        assert!(doc.take_runnable_scripts(&[script]).is_empty());
        // still runnable once inserted
        let root = doc.root();
        doc.append_child(root, script);
        assert_eq!(doc.take_runnable_scripts(&[script]), vec![script]);
    }

    #[test]
    fn test_set_attr_overwrites() {
        let mut doc = Document::new();
        let a = doc.create_element("a", attrs(&[("href", "/x")]));
        doc.set_attr(a, "href", "/docs/x");
        doc.set_attr(a, "rel", "next");
        assert_eq!(doc.attr(a, "href"), Some("/docs/x"));
        assert_eq!(doc.element(a).unwrap().attrs.len(), 2);
    }

    #[test]
    fn test_text_content() {
        let doc = Document::parse("<p>Hello <b>world</b>!</p>");
        let p = doc.elements_by_name("p")[0];
        assert_eq!(doc.text_content(p), "Hello world!");
    }
}
