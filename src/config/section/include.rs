//! `[include]` section configuration.
//!
//! Controls marker discovery, fetching and base-path detection.
//!
//! # Example
//!
//! ```toml
//! [include]
//! attribute = "data-include"              # Marker attribute naming the fragment URL
//! error_attribute = "data-include-error"  # Attribute set on inline error elements
//! timeout_secs = 10                       # Per-fragment fetch timeout
//! max_passes = 32                         # Upper bound on convergence passes
//! base = "/handbook"                      # Optional: force the base path
//! asset_suffix = "/assets/includes.js"    # Loader path used for self-location
//! hosting_suffix = ".github.io"           # Hosts whose first path segment is the base
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeConfig {
    pub attribute: String,
    pub error_attribute: String,
    pub timeout_secs: u64,
    pub max_passes: usize,

    /// Explicit base path override, used verbatim.
    pub base: Option<String>,

    pub asset_suffix: String,
    pub hosting_suffix: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            attribute: "data-include".into(),
            error_attribute: "data-include-error".into(),
            timeout_secs: 10,
            max_passes: 32,
            base: None,
            asset_suffix: "/assets/includes.js".into(),
            hosting_suffix: ".github.io".into(),
        }
    }
}

impl IncludeConfig {
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.attribute.trim().is_empty() {
            diag.error("include.attribute", "marker attribute name must not be empty");
        }
        if self.error_attribute.trim().is_empty() {
            diag.error(
                "include.error_attribute",
                "error attribute name must not be empty",
            );
        }
        if self.timeout_secs == 0 {
            diag.error("include.timeout_secs", "timeout must be greater than 0");
        }
        if self.max_passes == 0 {
            diag.error_with_hint(
                "include.max_passes",
                "pass limit must be greater than 0",
                "nested includes need one pass per level",
            );
        }
        if !self.asset_suffix.starts_with('/') {
            diag.error("include.asset_suffix", "asset suffix must start with `/`");
        }
    }
}
