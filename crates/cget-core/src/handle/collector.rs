//! Easy2 handler: routes body chunks to the body sink, collects the freshness
//! tag from headers and forwards the remaining header lines.

use crate::sink::Sink;
use crate::tag::FreshnessTag;

use super::header;

/// Transfer state for one `Handle`. Implements curl's Handler for Easy2.
pub(crate) struct Collector<B, H> {
    pub(crate) body: B,
    pub(crate) headers: Option<H>,
    pub(crate) tag: FreshnessTag,
}

impl<B: Sink, H: Sink> Collector<B, H> {
    pub(crate) fn new(body: B, headers: Option<H>) -> Self {
        Self {
            body,
            headers,
            tag: FreshnessTag::default(),
        }
    }
}

impl<B: Sink, H: Sink> curl::easy::Handler for Collector<B, H> {
    fn header(&mut self, data: &[u8]) -> bool {
        if header::is_status_line(data) {
            // A redirect or interim response ends here; only the final one counts.
            self.tag = FreshnessTag::default();
        }
        if header::inspect(data, &mut self.tag) {
            return true;
        }
        match self.headers.as_mut() {
            Some(sink) => {
                let ok = sink.accept(data);
                if !ok {
                    tracing::warn!(
                        "header sink rejected {} bytes after {}; aborting transfer",
                        data.len(),
                        sink.accepted()
                    );
                }
                ok
            }
            None => true,
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if self.body.accept(data) {
            Ok(data.len())
        } else {
            tracing::warn!(
                "body sink rejected {} bytes after {}; aborting transfer",
                data.len(),
                self.body.accepted()
            );
            Ok(0) // abort transfer
        }
    }
}
