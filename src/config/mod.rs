//! Configuration management for `includer.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build/     # [build]
//! │   ├── include    # [include]
//! │   └── site/      # [site]
//! ├── types/         # ConfigError, ConfigDiagnostics
//! ├── util           # config discovery, path helpers
//! └── mod.rs         # IncluderConfig (this file)
//! ```
//!
//! # Precedence
//!
//! CLI flags > `INCLUDER_BASE` (base only) > `includer.toml` > defaults.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_against};

pub use section::{BuildSectionConfig, IncludeConfig, SiteSectionConfig};
pub use types::{ConfigDiagnostics, ConfigError};

use crate::{
    cli::{BuildArgs, Cli, Commands, IncludeArgs},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable forcing the base path.
pub const BASE_ENV: &str = "INCLUDER_BASE";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing includer.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncluderConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding the config file; relative paths resolve against it
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSectionConfig,

    #[serde(default)]
    pub include: IncludeConfig,

    #[serde(default)]
    pub build: BuildSectionConfig,
}

impl IncluderConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. A missing file is not an
    /// error: defaults apply, rooted at cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Resolve paths and apply CLI and environment overrides.
    fn finalize(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Build { args } => self.apply_build_args(args),
            Commands::Page { include, .. } => self.apply_include_args(include),
        }

        if self.include.base.is_none()
            && let Ok(base) = std::env::var(BASE_ENV)
        {
            self.include.base = Some(base);
        }

        self.site.root = resolve_against(&self.root, &self.site.root);
        self.build.output = resolve_against(&self.root, &self.build.output);
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.site.root, args.root.as_ref());
        Self::update_option(&mut self.build.output, args.output.as_ref());
        Self::update_option(&mut self.site.url, args.site_url.as_ref());
        Self::update_option(&mut self.build.remote, args.remote.as_ref());
        self.build.strict |= args.strict;
        self.apply_include_args(&args.include);
    }

    fn apply_include_args(&mut self, args: &IncludeArgs) {
        if let Some(base) = &args.base {
            self.include.base = Some(base.clone());
        }
        Self::update_option(&mut self.include.timeout_secs, args.timeout.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate all sections, collecting every problem before failing.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.site.validate(&mut diag);
        self.include.validate(&mut diag);
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Site root directory as an absolute-ish path.
    pub fn site_root(&self) -> &Path {
        &self.site.root
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> IncluderConfig {
    let (parsed, ignored) = IncluderConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<IncluderConfig, _> = toml::from_str("[site\nurl = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[site]\nurl = \"https://example.com/\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = IncluderConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.site.url, "https://example.com/");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_finalize_applies_cli_overrides() {
        let cli = Cli::try_parse_from([
            "includer",
            "build",
            "-o",
            "dist",
            "-U",
            "https://alice.github.io/handbook/",
            "--base",
            "/handbook/",
            "-t",
            "2",
            "--strict",
        ])
        .unwrap();

        let mut config = IncluderConfig {
            root: PathBuf::from("/work"),
            ..IncluderConfig::default()
        };
        config.finalize(&cli);

        assert_eq!(config.build.output, PathBuf::from("/work/dist"));
        assert_eq!(config.site.root, PathBuf::from("/work/."));
        assert_eq!(config.site.url, "https://alice.github.io/handbook/");
        assert_eq!(config.include.base.as_deref(), Some("/handbook/"));
        assert_eq!(config.include.timeout_secs, 2);
        assert!(config.build.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config("[site]\nurl = \"nope\"\n[include]\ntimeout_secs = 0");
        let err = config.validate().unwrap_err();
        let text = format!("{err}");
        assert!(text.contains("site.url"));
        assert!(text.contains("include.timeout_secs"));
    }
}
