//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Assemble static pages from `data-include` HTML fragments
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: includer.toml)
    #[arg(short = 'C', long, default_value = "includer.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Assemble every page of the site into the output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Assemble a single page and print it (or write it to a file)
    #[command(visible_alias = "p")]
    Page {
        /// Page URL (http/https) or path relative to the site root
        target: String,

        /// Write the assembled page to this file instead of stdout
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,

        #[command(flatten)]
        include: IncludeArgs,
    },
}

/// Include options shared by all commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct IncludeArgs {
    /// Force the base path (e.g. "/handbook"), skipping detection
    #[arg(long)]
    pub base: Option<String>,

    /// Per-fragment fetch timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

/// Build command arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Static site directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Output directory path
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Override the public site URL.
    ///
    /// Pages are assembled as if served under this URL, so GitHub Pages
    /// project sites resolve their base path the same way a browser would.
    #[arg(short = 'U', long = "site-url", value_hint = clap::ValueHint::Url)]
    pub site_url: Option<String>,

    /// Fetch fragments from the site URL over HTTP
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub remote: Option<bool>,

    /// Exit with an error when any include failed
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub include: IncludeArgs,
}
