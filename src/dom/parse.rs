//! Inert HTML parsing on top of `scraper` (html5ever).
//!
//! Nothing parsed here is live: every `<script>` comes out with its
//! "already started" flag set.
//!
//! Input that looks like a whole page (a doctype, or a leading `<html>`,
//! `<head>` or `<body>` tag) goes through the document algorithm and keeps
//! its `<html>` element. Anything else is a fragment parsed in `<body>`
//! context, so its top-level nodes land directly under the root.

use scraper::{ElementRef, Html, Node};

use super::{Document, Element, NodeData, NodeId};

/// Parse a document or fragment.
///
/// html5ever recovers from any input, so this never fails.
pub fn parse(html: &str) -> Document {
    let mut doc = Document::new();
    let root = doc.root();

    let (doctype, rest) = split_doctype(html);
    if let Some(doctype) = doctype {
        doc.set_doctype(doctype);
    }

    if doctype.is_some() || starts_with_page_tag(rest) {
        let parsed = Html::parse_document(html);
        convert_element(&mut doc, root, parsed.root_element());
    } else {
        // `root_element` is the synthetic `<html>` wrapper of the fragment.
        let parsed = Html::parse_fragment(html);
        convert_children(&mut doc, root, parsed.root_element());
    }

    doc
}

/// Split off a leading `<!DOCTYPE ...>` (case-insensitive).
fn split_doctype(html: &str) -> (Option<&str>, &str) {
    let trimmed = html.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    if !is_doctype {
        return (None, html);
    }
    match trimmed.find('>') {
        Some(end) => (Some(&trimmed[..=end]), &trimmed[end + 1..]),
        None => (None, html),
    }
}

/// Whether the first tag (after comments and whitespace) opens a page.
fn starts_with_page_tag(html: &str) -> bool {
    let mut rest = html.trim_start();
    while let Some(comment) = rest.strip_prefix("<!--") {
        match comment.find("-->") {
            Some(end) => rest = comment[end + 3..].trim_start(),
            None => return false,
        }
    }
    ["<html", "<head", "<body"].iter().any(|tag| {
        rest.get(..tag.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(tag))
            && rest[tag.len()..]
                .chars()
                .next()
                .is_none_or(|c| c == '>' || c == '/' || c.is_ascii_whitespace())
    })
}

fn convert_element(doc: &mut Document, parent: NodeId, element: ElementRef<'_>) {
    let value = element.value();
    let name = value.name().to_string();

    // Namespaced attributes arrive by local name (`xlink:href` is `href`);
    // the first occurrence wins.
    let mut attrs: Vec<(String, String)> = Vec::new();
    for (key, val) in value.attrs() {
        if !attrs.iter().any(|(k, _)| k == key) {
            attrs.push((key.to_string(), val.to_string()));
        }
    }

    let id = doc.push_parsed(NodeData::Element(Element {
        already_started: name == "script",
        name,
        attrs,
    }));
    doc.append_child(parent, id);

    convert_children(doc, id, element);
}

fn convert_children(doc: &mut Document, parent: NodeId, element: ElementRef<'_>) {
    for child in element.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    convert_element(doc, parent, child);
                }
            }
            Node::Text(text) => {
                let id = doc.create_text(&*text.text);
                doc.append_child(parent, id);
            }
            Node::Comment(comment) => {
                let id = doc.create_comment(&*comment.comment);
                doc.append_child(parent, id);
            }
            _ => {}
        }
    }
}
