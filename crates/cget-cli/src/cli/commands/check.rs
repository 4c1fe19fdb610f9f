//! `cget check` – fetch, then re-fetch with the returned tag.

use anyhow::{Context, Result};
use cget_core::config::CgetConfig;
use cget_core::{BytesSink, Error, Global, Handle, Sink};

pub fn run_check(global: &Global, cfg: &CgetConfig, url: &str) -> Result<()> {
    let mut handle = Handle::new(global, BytesSink::with_limit(Vec::new(), cfg.max_body_bytes))?;
    handle.apply_config(cfg)?;

    let tag = handle
        .get(url, None)
        .with_context(|| format!("fetch {}", url))?;
    println!("{} bytes, mod: {}", handle.sink().accepted(), tag);

    handle.sink_mut().reset()?;
    match handle.get(url, Some(&tag)) {
        Ok(new_tag) => {
            println!(
                "resource changed: {} bytes, mod: {}",
                handle.sink().accepted(),
                new_tag
            );
        }
        Err(Error::NotModified) => println!("saved page retrieval"),
        Err(e) => return Err(e).with_context(|| format!("re-fetch {}", url)),
    }
    Ok(())
}
