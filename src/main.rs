//! Includer - assemble static pages from `data-include` HTML fragments.

mod base;
mod cli;
mod config;
mod core;
mod dom;
mod include;
mod logger;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::IncluderConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = IncluderConfig::load(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Build { .. } => cli::build::build_site(&config).await.map(|_| ()),
            Commands::Page { target, output, .. } => {
                cli::page::assemble_page(&config, target, output.as_deref())
                    .await
                    .map(|_| ())
            }
        }
    })
}
