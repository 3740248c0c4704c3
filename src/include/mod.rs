//! Fragment inclusion engine.
//!
//! Replaces every element carrying the include attribute with the parsed
//! markup behind its URL, until no unprocessed marker is left.
//!
//! # Pass Model
//!
//! ```text
//! pass N:
//!   frontier = attached markers not yet processed (tree order)
//!   empty?  -> done
//!   fetch all concurrently (per-fetch timeout)
//!   as each settles:
//!     ok  -> parse, prefix root URLs, absolutize nested markers,
//!            refresh scripts, replace marker, run new scripts
//!     err -> replace marker with an inline error element
//!   mark marker processed
//!   yield, then broadcast IncludesReady { pass: N }
//! ```
//!
//! Nested markers surface in the next pass. Processed markers are tracked
//! by node identity, so a marker is fetched at most once. A pass limit
//! turns include cycles into visible errors instead of an endless loop.

mod error;
mod rewrite;
mod script;
mod source;


pub use error::IncludeError;
pub use rewrite::{absolutize_directives, prefix_root_urls, resolve_directive};
pub use script::{RecordingHost, ScriptHost, rematerialize_scripts};
pub use source::{FileSource, FragmentSource, HttpSource, SiteSource, fetch_with_timeout};

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use rustc_hash::FxHashSet;
use tokio::sync::broadcast;
use url::Url;

use crate::base::{BasePath, PageContext, resolve_base_path};
use crate::config::IncludeConfig;
use crate::dom::{Document, NodeId};
use crate::{debug, log};

/// Inline style of error elements.
const ERROR_STYLE: &str = "color:#b00020;background:#fff3f3;border:1px solid #f3c2c2;\
padding:.5rem;border-radius:.25rem;font:14px/1.4 system-ui,sans-serif";

/// Capacity of the completion event channel.
const EVENT_CAPACITY: usize = 64;

// ============================================================================
// Public types
// ============================================================================

/// Broadcast after every pass, once that pass's insertions are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludesReady {
    /// 1-based pass number.
    pub pass: usize,
}

/// One marker that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeFailure {
    /// Absolute URL when known, otherwise the raw directive.
    pub url: String,
    pub reason: String,
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionReport {
    /// Passes that had work to do.
    pub passes: usize,
    /// Markers replaced with fragment content.
    pub included: usize,
    /// Scripts handed to the host.
    pub scripts: usize,
    pub failures: Vec<IncludeFailure>,
}

impl InclusionReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Settings shared by every marker of a run.
struct Context {
    config: IncludeConfig,
    base: BasePath,
    location: Url,
}

impl Context {
    /// Parse a fetched body and prepare it for insertion.
    fn prepare(&self, body: &str, url: &Url) -> Document {
        let mut fragment = Document::parse(body);
        prefix_root_urls(&mut fragment, &self.base, &self.config.attribute);
        absolutize_directives(&mut fragment, &self.config.attribute, &self.base, url);
        rematerialize_scripts(&mut fragment);
        fragment
    }

    /// Swap `marker` for a visible error element and record the failure.
    fn fail(
        &self,
        doc: &mut Document,
        marker: NodeId,
        url: &str,
        err: &IncludeError,
        report: &mut InclusionReport,
    ) {
        log!("include"; "failed: {}: {}", if url.is_empty() { "<empty>" } else { url }, err);

        let message = if url.is_empty() {
            format!("Include failed: {err}")
        } else {
            format!("Include failed: {url}: {err}")
        };
        let element = doc.create_element(
            "div",
            vec![
                (self.config.error_attribute.clone(), String::new()),
                ("style".into(), ERROR_STYLE.into()),
            ],
        );
        let text = doc.create_text(message);
        doc.append_child(element, text);
        doc.replace_with(marker, element);

        report.failures.push(IncludeFailure {
            url: url.to_string(),
            reason: err.to_string(),
        });
    }
}

/// Drives inclusion for one document.
///
/// `S` fetches fragment bodies; `H` receives scripts that become live.
pub struct IncludeEngine<S, H> {
    ctx: Context,
    source: S,
    host: H,
    processed: FxHashSet<NodeId>,
    ready: broadcast::Sender<IncludesReady>,
}

impl<S: FragmentSource, H: ScriptHost> IncludeEngine<S, H> {
    pub fn new(config: &IncludeConfig, base: BasePath, location: Url, source: S, host: H) -> Self {
        let (ready, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            ctx: Context {
                config: config.clone(),
                base,
                location,
            },
            source,
            host,
            processed: FxHashSet::default(),
            ready,
        }
    }

    /// Listen for per-pass completion events.
    pub fn subscribe(&self) -> broadcast::Receiver<IncludesReady> {
        self.ready.subscribe()
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Run passes until no unprocessed marker is attached.
    pub async fn run(&mut self, doc: &mut Document) -> InclusionReport {
        let mut report = InclusionReport::default();

        for pass in 1.. {
            let frontier: Vec<NodeId> = doc
                .elements_with_attr(&self.ctx.config.attribute)
                .into_iter()
                .filter(|id| !self.processed.contains(id))
                .collect();
            if frontier.is_empty() {
                break;
            }

            report.passes = pass;
            debug!("include"; "pass {}: {} marker(s)", pass, frontier.len());

            if pass > self.ctx.config.max_passes {
                self.give_up(doc, frontier, &mut report);
            } else {
                self.run_pass(doc, frontier, &mut report).await;
            }

            // let observers see this pass's insertions before the event
            tokio::task::yield_now().await;
            // no subscribers is fine
            let _ = self.ready.send(IncludesReady { pass });
        }

        report
    }

    async fn run_pass(
        &mut self,
        doc: &mut Document,
        frontier: Vec<NodeId>,
        report: &mut InclusionReport,
    ) {
        let timeout = self.ctx.config.timeout();
        let source = &self.source;
        let mut pending = FuturesUnordered::new();

        for marker in frontier {
            let directive = doc
                .attr(marker, &self.ctx.config.attribute)
                .unwrap_or_default()
                .trim()
                .to_string();

            let resolved = if directive.is_empty() {
                Err(IncludeError::EmptyDirective)
            } else {
                resolve_directive(&directive, &self.ctx.base, &self.ctx.location)
            };

            match resolved {
                Ok(url) => pending.push(fetch_marker(source, marker, url, timeout)),
                Err(err) => {
                    self.ctx.fail(doc, marker, &directive, &err, report);
                    self.processed.insert(marker);
                }
            }
        }

        // first settled, first inserted
        while let Some((marker, url, fetched)) = pending.next().await {
            self.processed.insert(marker);

            // an enclosing marker of this pass may have been replaced already
            if !doc.is_attached(marker) {
                debug!("include"; "skipped {}: marker was replaced by its parent", url);
                continue;
            }

            match fetched {
                Ok(body) => {
                    let fragment = self.ctx.prepare(&body, &url);
                    let inserted = doc.replace_with_fragment(marker, &fragment);
                    report.included += 1;
                    report.scripts += script::run_inserted_scripts(
                        doc,
                        &inserted,
                        &self.ctx.location,
                        &mut self.host,
                    );
                    debug!("include"; "included {}", url);
                }
                Err(err) => self.ctx.fail(doc, marker, url.as_str(), &err, report),
            }
        }
    }

    /// Fail every remaining marker once the pass limit is hit.
    fn give_up(&mut self, doc: &mut Document, frontier: Vec<NodeId>, report: &mut InclusionReport) {
        let err = IncludeError::PassLimit(self.ctx.config.max_passes);
        for marker in frontier {
            let directive = doc
                .attr(marker, &self.ctx.config.attribute)
                .unwrap_or_default()
                .to_string();
            self.ctx.fail(doc, marker, &directive, &err, report);
            self.processed.insert(marker);
        }
    }
}

async fn fetch_marker<S: FragmentSource>(
    source: &S,
    marker: NodeId,
    url: Url,
    timeout: std::time::Duration,
) -> (NodeId, Url, Result<String, IncludeError>) {
    let fetched = fetch_with_timeout(source, &url, timeout).await;
    (marker, url, fetched)
}

// ============================================================================
// Entry point
// ============================================================================

/// Resolve the base path for `doc` and run inclusion on it.
///
/// Returns the report and the host so callers can inspect executed
/// scripts.
pub async fn include_document<S: FragmentSource, H: ScriptHost>(
    doc: &mut Document,
    location: Url,
    config: &IncludeConfig,
    source: S,
    host: H,
) -> (InclusionReport, H) {
    let ctx = PageContext::from_document(doc, location.clone()).with_override(config.base.clone());
    let base = resolve_base_path(&ctx, config);

    let mut engine = IncludeEngine::new(config, base, location, source, host);
    let mut ready = engine.subscribe();

    let report = {
        let run = engine.run(doc);
        tokio::pin!(run);
        loop {
            tokio::select! {
                biased;
                report = &mut run => break report,
                Ok(event) = ready.recv() => {
                    debug!("include"; "pass {} ready", event.pass);
                }
            }
        }
    };
    // events sent during the final poll of `run`
    while let Ok(event) = ready.try_recv() {
        debug!("include"; "pass {} ready", event.pass);
    }

    (report, engine.into_host())
}
