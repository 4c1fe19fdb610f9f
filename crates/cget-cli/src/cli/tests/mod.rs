//! CLI tests: argument parsing, and the fetch commands against a local server.

use super::Cli;
use cget_core::Global;
use clap::Parser;
use std::sync::OnceLock;

pub(super) fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

/// One transfer-library guard for every test in the binary.
pub(super) fn global() -> &'static Global {
    static GLOBAL: OnceLock<Global> = OnceLock::new();
    GLOBAL.get_or_init(|| Global::init().expect("global init"))
}
