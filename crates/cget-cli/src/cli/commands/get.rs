//! `cget get` – conditional fetch using the stored tag.

use anyhow::{Context, Result};
use cget_core::config::CgetConfig;
use cget_core::{Error, Global, Handle, TagStore, TextSink, WriterSink};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct GetOptions {
    pub output: Option<PathBuf>,
    pub force: bool,
    pub show_headers: bool,
}

/// Where the body goes: stdout, or a temp file renamed over `output` on success
/// so a not-modified or failed fetch leaves the cached copy alone.
struct Target {
    writer: Box<dyn Write>,
    part: Option<(PathBuf, PathBuf)>,
}

impl Target {
    fn open(output: Option<&Path>) -> Result<Self> {
        match output {
            Some(path) => {
                let part = part_path(path);
                let file = File::create(&part)
                    .with_context(|| format!("create {}", part.display()))?;
                Ok(Self {
                    writer: Box::new(BufWriter::new(file)),
                    part: Some((part, path.to_path_buf())),
                })
            }
            None => Ok(Self {
                writer: Box::new(io::stdout().lock()),
                part: None,
            }),
        }
    }
}

pub(crate) fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

pub fn run_get(
    global: &Global,
    cfg: &CgetConfig,
    store: &mut TagStore,
    url: &str,
    opts: &GetOptions,
) -> Result<()> {
    let previous = if opts.force {
        None
    } else {
        store.get(url).cloned()
    };
    let target = Target::open(opts.output.as_deref())?;
    let part = target.part;

    let body = WriterSink::with_limit(target.writer, cfg.max_body_bytes);
    let headers = TextSink::with_limit(String::new(), cfg.max_header_bytes);
    let mut handle = Handle::with_header_sink(global, body, headers)?;
    handle.apply_config(cfg)?;

    let result = handle.get(url, previous.as_ref());
    if opts.show_headers {
        if let Some(h) = handle.header_sink() {
            eprint!("{}", h.get_ref());
        }
    }
    let flushed = handle.sink_mut().get_mut().flush();
    drop(handle);

    match result {
        Ok(tag) => {
            flushed.context("flush output")?;
            if let Some((part, path)) = &part {
                fs::rename(part, path).with_context(|| {
                    format!("rename {} to {}", part.display(), path.display())
                })?;
            }
            tracing::info!("fetched {} (tag {})", url, tag);
            store.put(url, &tag);
            store.save()?;
            Ok(())
        }
        Err(Error::NotModified) => {
            discard(&part);
            tracing::info!("{} not modified", url);
            eprintln!("not modified: {}", url);
            Ok(())
        }
        Err(e) => {
            discard(&part);
            if let Some(status) = e.http_status() {
                tracing::warn!(url, status, "server refused GET");
            }
            Err(e).with_context(|| format!("fetch {}", url))
        }
    }
}

fn discard(part: &Option<(PathBuf, PathBuf)>) {
    if let Some((part, _)) = part {
        if let Err(e) = fs::remove_file(part) {
            tracing::warn!("remove {}: {}", part.display(), e);
        }
    }
}
