//! CLI for cget.

mod commands;

use anyhow::Result;
use cget_core::{config, Global, TagStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_check, run_forget, run_get, run_tag, GetOptions};

/// Top-level CLI for cget.
#[derive(Debug, Parser)]
#[command(name = "cget")]
#[command(about = "cget: conditional HTTP GET with ETag / Last-Modified tracking", long_about = None)]
pub struct Cli {
    /// Tag store file (default: ~/.local/state/cget/tags.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub tags: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a URL, conditionally if a tag is stored for it, and store the new tag.
    Get {
        /// HTTP/HTTPS URL to fetch.
        url: String,
        /// Write the body to FILE instead of stdout. FILE is left untouched if not modified.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Ignore the stored tag and fetch unconditionally.
        #[arg(long)]
        force: bool,
        /// Print response header lines (other than ETag/Last-Modified) to stderr.
        #[arg(long)]
        headers: bool,
    },

    /// Fetch a URL, then re-fetch it conditionally and report whether the copy is current.
    Check {
        /// HTTP/HTTPS URL to check.
        url: String,
    },

    /// Show the stored tag for a URL.
    Tag {
        /// URL the tag was stored for.
        url: String,
    },

    /// Drop the stored tag for a URL so the next fetch is unconditional.
    Forget {
        /// URL the tag was stored for.
        url: String,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let mut store = match &cli.tags {
            Some(path) => TagStore::open_at(path)?,
            None => TagStore::open_default()?,
        };

        match cli.command {
            CliCommand::Get {
                url,
                output,
                force,
                headers,
            } => {
                let global = Global::init()?;
                let opts = GetOptions {
                    output,
                    force,
                    show_headers: headers,
                };
                run_get(&global, &cfg, &mut store, &url, &opts)?;
            }
            CliCommand::Check { url } => {
                let global = Global::init()?;
                run_check(&global, &cfg, &url)?;
            }
            CliCommand::Tag { url } => run_tag(&store, &url),
            CliCommand::Forget { url } => run_forget(&mut store, &url)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
