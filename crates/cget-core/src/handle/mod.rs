//! Transfer handle: one libcurl easy session bound to a body sink and,
//! optionally, a header sink.
//!
//! `get` performs a blocking GET on the calling thread. With a previous
//! freshness tag the request is made conditional (If-Modified-Since from the
//! tag's timestamp, If-None-Match from its etag) and an unchanged resource
//! yields `Error::NotModified`.

mod collector;
mod header;

use std::time::Duration;

use curl::easy::{Easy2, List, TimeCondition};

use crate::config::CgetConfig;
use crate::error::{Error, Result};
use crate::global::Global;
use crate::sink::{Discard, Sink};
use crate::tag::FreshnessTag;

use collector::Collector;

/// Maximum number of redirects followed per request.
pub const MAX_REDIRECTS: u32 = 8;

/// Owns one transfer session. Not `Clone`: sessions are not shareable.
/// Reusable after a failed `get`.
pub struct Handle<'g, B: Sink, H: Sink = Discard> {
    easy: Easy2<Collector<B, H>>,
    _global: &'g Global,
}

impl<'g, B: Sink> Handle<'g, B, Discard> {
    /// Create a handle writing response bodies to `body`.
    pub fn new(global: &'g Global, body: B) -> Result<Self> {
        Self::build(global, Collector::new(body, None))
    }
}

impl<'g, B: Sink, H: Sink> Handle<'g, B, H> {
    /// Create a handle that also forwards every non-tag response header line to `headers`.
    pub fn with_header_sink(global: &'g Global, body: B, headers: H) -> Result<Self> {
        Self::build(global, Collector::new(body, Some(headers)))
    }

    fn build(global: &'g Global, collector: Collector<B, H>) -> Result<Self> {
        let mut easy = Easy2::new(collector);
        easy.signal(false)?;
        easy.accept_encoding("gzip, deflate")?;
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTS)?;
        easy.fail_on_error(true)?;
        Ok(Self {
            easy,
            _global: global,
        })
    }

    /// GET `url`, conditionally if `previous` is given, and return the
    /// freshness tag of the response.
    ///
    /// Body bytes go to the body sink; the sink is not reset between calls,
    /// but is finished after every transfer, successful or not.
    pub fn get(&mut self, url: &str, previous: Option<&FreshnessTag>) -> Result<FreshnessTag> {
        self.easy.get_mut().tag = FreshnessTag::default();
        self.easy.url(url)?;

        let mut list = List::new();
        match previous {
            Some(prev) => {
                self.easy.time_condition(TimeCondition::IfModifiedSince)?;
                self.easy.time_value(prev.mtime())?;
                // Sent even when the etag is empty.
                list.append(&format!("If-None-Match: {}", prev.etag()))?;
            }
            None => {
                self.easy.time_condition(TimeCondition::None)?;
                self.easy.time_value(0)?;
            }
        }
        self.easy.http_headers(list)?;

        tracing::debug!(url, conditional = previous.is_some(), "GET");
        let performed = self.easy.perform();
        let collector = self.easy.get_mut();
        collector.body.finish();
        if let Some(headers) = collector.headers.as_mut() {
            headers.finish();
        }
        if let Err(e) = performed {
            return Err(self.transfer_failure(url, e));
        }

        if self.easy.time_condition_unmet()? {
            tracing::debug!(url, "not modified (condition unmet)");
            return Err(Error::NotModified);
        }
        let status = self.easy.response_code()?;
        if status == 304 {
            // Same outcome as the condition flag, checked separately in case
            // libcurl does not flag an If-None-Match miss.
            tracing::debug!(url, "not modified (304)");
            return Err(Error::NotModified);
        }
        if status >= 400 {
            return Err(Error::Http {
                url: url.to_string(),
                status,
            });
        }

        let tag = self.easy.get_ref().tag.clone();
        tracing::debug!(url, status, tag = %tag, "GET complete");
        Ok(tag)
    }

    fn transfer_failure(&mut self, url: &str, e: curl::Error) -> Error {
        if e.is_http_returned_error() {
            if let Ok(status) = self.easy.response_code() {
                if status >= 400 {
                    tracing::debug!(url, status, "GET returned HTTP error");
                    return Error::Http {
                        url: url.to_string(),
                        status,
                    };
                }
            }
        }
        if e.is_write_error() {
            let collector = self.easy.get_mut();
            let io_err = collector
                .body
                .take_error()
                .or_else(|| collector.headers.as_mut().and_then(|h| h.take_error()));
            if let Some(io_err) = io_err {
                return Error::Io(io_err);
            }
        }
        tracing::warn!(url, "GET failed: {}", e);
        Error::Transport(e)
    }

    pub fn set_user_agent(&mut self, agent: &str) -> Result<()> {
        Ok(self.easy.useragent(agent)?)
    }

    /// Overall transfer timeout.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        Ok(self.easy.timeout(timeout)?)
    }

    /// Apply the transfer settings from the config file (user agent, timeout).
    pub fn apply_config(&mut self, cfg: &CgetConfig) -> Result<()> {
        if let Some(agent) = cfg.user_agent.as_deref() {
            self.set_user_agent(agent)?;
        }
        if let Some(secs) = cfg.timeout_secs {
            self.set_timeout(Duration::from_secs(secs))?;
        }
        Ok(())
    }

    pub fn sink(&self) -> &B {
        &self.easy.get_ref().body
    }

    pub fn sink_mut(&mut self) -> &mut B {
        &mut self.easy.get_mut().body
    }

    pub fn header_sink(&self) -> Option<&H> {
        self.easy.get_ref().headers.as_ref()
    }

    pub fn header_sink_mut(&mut self) -> Option<&mut H> {
        self.easy.get_mut().headers.as_mut()
    }
}
