//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "public"               # Output directory (relative to config)
//! fragment_dirs = ["partials"]    # Fragment-only dirs under site root, not emitted as pages
//! remote = false                  # Fetch fragments from `site.url` over HTTP
//! strict = false                  # Exit non-zero when any include failed
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Build output directory.
    pub output: PathBuf,

    /// Directories (relative to the site root) holding fragments only.
    pub fragment_dirs: Vec<PathBuf>,

    /// Fetch fragments over HTTP instead of reading the site root.
    pub remote: bool,

    /// Treat include failures as a build error.
    pub strict: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            output: "public".into(),
            fragment_dirs: vec!["partials".into()],
            remote: false,
            strict: false,
        }
    }
}

impl BuildSectionConfig {
    /// Whether a site-relative path lives in a fragment directory.
    pub fn is_fragment(&self, rel: &Path) -> bool {
        self.fragment_dirs.iter().any(|dir| rel.starts_with(dir))
    }
}
