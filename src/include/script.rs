//! Script handling for injected fragments.
//!
//! Parsed `<script>` elements are inert. Before a fragment is inserted,
//! each one is swapped for a freshly created element carrying the same
//! attributes and body. Once the fresh copies are attached they are
//! handed to a [`ScriptHost`], in document order, exactly once.

use url::Url;

use crate::debug;
use crate::dom::{Document, NodeId};

/// What a script runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptKind {
    Inline(String),
    /// `src` resolved against the page location.
    External(Url),
}

/// A script ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub kind: ScriptKind,
    pub attrs: Vec<(String, String)>,
}

impl Script {
    /// Build from an attached script element. `None` when `src` can't be
    /// resolved or the node is not an element.
    pub fn from_node(doc: &Document, id: NodeId, location: &Url) -> Option<Self> {
        let elem = doc.element(id)?;
        let kind = match elem.attr("src").filter(|src| !src.is_empty()) {
            Some(src) => match location.join(src) {
                Ok(url) => ScriptKind::External(url),
                Err(err) => {
                    debug!("include"; "skipping script with bad src `{}`: {}", src, err);
                    return None;
                }
            },
            None => ScriptKind::Inline(doc.text_content(id)),
        };
        Some(Self {
            kind,
            attrs: elem.attrs.clone(),
        })
    }
}

/// Executes scripts that became live through an include.
pub trait ScriptHost {
    fn run(&mut self, script: Script);
}

/// Host that only keeps a record of what would have run.
///
/// Used for offline assembly: the scripts stay in the output markup and
/// execute when a browser loads the page.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub scripts: Vec<Script>,
}

impl ScriptHost for RecordingHost {
    fn run(&mut self, script: Script) {
        match &script.kind {
            ScriptKind::Inline(body) => debug!("include"; "script: inline ({} bytes)", body.len()),
            ScriptKind::External(url) => debug!("include"; "script: {}", url),
        }
        self.scripts.push(script);
    }
}

/// Replace every parsed script in `fragment` with a fresh copy.
///
/// External scripts keep only their attributes; inline scripts also keep
/// their body. Returns the number of scripts replaced.
pub fn rematerialize_scripts(fragment: &mut Document) -> usize {
    let scripts = fragment.elements_by_name("script");
    for &old in &scripts {
        let Some(elem) = fragment.element(old) else {
            continue;
        };
        let attrs = elem.attrs.clone();
        let external = elem.attr("src").is_some_and(|src| !src.is_empty());
        let body = (!external).then(|| fragment.text_content(old));

        let fresh = fragment.create_element("script", attrs);
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            let text = fragment.create_text(body);
            fragment.append_child(fresh, text);
        }
        fragment.replace_with(old, fresh);
    }
    scripts.len()
}

/// Run every not-yet-started script under the freshly inserted nodes.
pub fn run_inserted_scripts<H: ScriptHost>(
    doc: &mut Document,
    inserted: &[NodeId],
    location: &Url,
    host: &mut H,
) -> usize {
    let mut ran = 0;
    for id in doc.take_runnable_scripts(inserted) {
        if let Some(script) = Script::from_node(doc, id, location) {
            host.run(script);
            ran += 1;
        }
    }
    ran
}

// ============================================================================
// tests
// ============================================================================
