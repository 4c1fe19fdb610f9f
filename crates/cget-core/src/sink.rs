//! Bounded output sinks for response bodies and header lines.
//!
//! A sink appends each chunk it is offered to a destination it does not
//! manage the lifetime of (pass `&mut String`, `&mut Vec<u8>`, `&mut File`),
//! or owns one if the caller prefers (`String::new()`, `io::stdout()`).
//! Every sink has a byte ceiling; a chunk that would push the destination past
//! it is rejected whole and the transfer feeding the sink is aborted. There is
//! no partial accept.

use std::borrow::BorrowMut;
use std::io::{self, Write};

use crate::error::{Error, Result};

/// Default ceiling for every sink: 4 MiB.
pub const DEFAULT_MAX_BYTES: usize = 4 * 1024 * 1024;

/// Destination for transfer data.
pub trait Sink {
    /// Append `data`. Returns false, leaving the destination untouched, if the
    /// accumulated size would exceed the ceiling or the destination failed.
    fn accept(&mut self, data: &[u8]) -> bool;

    /// Clear accumulated state so the sink can be reused for the next request.
    fn reset(&mut self) -> Result<()>;

    /// Bytes accumulated so far.
    fn accepted(&self) -> usize;

    /// Destination failure recorded by the last rejected `accept`, if any.
    fn take_error(&mut self) -> Option<io::Error> {
        None
    }

    /// End of one transfer. Anything the sink still holds back is settled
    /// here, so nothing carries into the next response.
    fn finish(&mut self) {}
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn accept(&mut self, data: &[u8]) -> bool {
        (**self).accept(data)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn accepted(&self) -> usize {
        (**self).accepted()
    }

    fn take_error(&mut self) -> Option<io::Error> {
        (**self).take_error()
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn accept(&mut self, data: &[u8]) -> bool {
        (**self).accept(data)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn accepted(&self) -> usize {
        (**self).accepted()
    }

    fn take_error(&mut self) -> Option<io::Error> {
        (**self).take_error()
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

/// Accumulates UTF-8 text into a `String`.
///
/// A multi-byte character split across two chunks is held back until the rest
/// arrives; invalid sequences become U+FFFD. The ceiling applies to the decoded
/// text plus any held-back bytes. A character still incomplete when the
/// transfer finishes becomes U+FFFD, or is dropped if that would break the
/// ceiling.
#[derive(Debug)]
pub struct TextSink<S = String> {
    dest: S,
    pending: Vec<u8>,
    max: usize,
}

impl<S: BorrowMut<String>> TextSink<S> {
    pub fn new(dest: S) -> Self {
        Self::with_limit(dest, DEFAULT_MAX_BYTES)
    }

    pub fn with_limit(dest: S, max: usize) -> Self {
        Self {
            dest,
            pending: Vec::new(),
            max,
        }
    }

    pub fn limit(&self) -> usize {
        self.max
    }

    pub fn get_ref(&self) -> &String {
        self.dest.borrow()
    }

    pub fn into_inner(self) -> S {
        self.dest
    }
}

impl<S: BorrowMut<String>> Sink for TextSink<S> {
    fn accept(&mut self, data: &[u8]) -> bool {
        let mut bytes = Vec::with_capacity(self.pending.len() + data.len());
        bytes.extend_from_slice(&self.pending);
        bytes.extend_from_slice(data);
        let (text, carry) = decode_utf8(&bytes);

        let current: &String = self.dest.borrow();
        if current.len() + text.len() + carry.len() > self.max {
            return false;
        }
        self.dest.borrow_mut().push_str(&text);
        self.pending = carry.to_vec();
        true
    }

    fn reset(&mut self) -> Result<()> {
        self.dest.borrow_mut().clear();
        self.pending.clear();
        Ok(())
    }

    fn accepted(&self) -> usize {
        let current: &String = self.dest.borrow();
        current.len() + self.pending.len()
    }

    fn finish(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let current: &String = self.dest.borrow();
        if current.len() + char::REPLACEMENT_CHARACTER.len_utf8() <= self.max {
            self.dest.borrow_mut().push(char::REPLACEMENT_CHARACTER);
        } else {
            tracing::debug!(
                bytes = self.pending.len(),
                "dropping truncated character at ceiling"
            );
        }
        self.pending.clear();
    }
}

/// Decode as much of `bytes` as possible. Returns the text and the trailing
/// bytes of an incomplete character.
fn decode_utf8(bytes: &[u8]) -> (String, &[u8]) {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(s) => {
                out.push_str(s);
                return (out, &[]);
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                match e.error_len() {
                    None => return (out, &rest[valid..]),
                    Some(n) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        rest = &rest[valid + n..];
                    }
                }
            }
        }
    }
}

/// Accumulates raw bytes into a `Vec<u8>`.
#[derive(Debug)]
pub struct BytesSink<V = Vec<u8>> {
    dest: V,
    max: usize,
}

impl<V: BorrowMut<Vec<u8>>> BytesSink<V> {
    pub fn new(dest: V) -> Self {
        Self::with_limit(dest, DEFAULT_MAX_BYTES)
    }

    pub fn with_limit(dest: V, max: usize) -> Self {
        Self { dest, max }
    }

    pub fn limit(&self) -> usize {
        self.max
    }

    pub fn get_ref(&self) -> &Vec<u8> {
        self.dest.borrow()
    }

    pub fn into_inner(self) -> V {
        self.dest
    }
}

impl<V: BorrowMut<Vec<u8>>> Sink for BytesSink<V> {
    fn accept(&mut self, data: &[u8]) -> bool {
        let current: &Vec<u8> = self.dest.borrow();
        if current.len() + data.len() > self.max {
            return false;
        }
        self.dest.borrow_mut().extend_from_slice(data);
        true
    }

    fn reset(&mut self) -> Result<()> {
        self.dest.borrow_mut().clear();
        Ok(())
    }

    fn accepted(&self) -> usize {
        let current: &Vec<u8> = self.dest.borrow();
        current.len()
    }
}

/// Streams data into an `io::Write`, counting what it has written.
///
/// A stream cannot be truncated, so `reset` is a usage error; use
/// `reset_to` to continue with a fresh destination.
#[derive(Debug)]
pub struct WriterSink<W> {
    dest: W,
    seen: usize,
    max: usize,
    error: Option<io::Error>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(dest: W) -> Self {
        Self::with_limit(dest, DEFAULT_MAX_BYTES)
    }

    pub fn with_limit(dest: W, max: usize) -> Self {
        Self {
            dest,
            seen: 0,
            max,
            error: None,
        }
    }

    pub fn limit(&self) -> usize {
        self.max
    }

    /// Rebind to `dest`, zero the byte count and return the previous destination.
    pub fn reset_to(&mut self, dest: W) -> W {
        self.seen = 0;
        self.error = None;
        std::mem::replace(&mut self.dest, dest)
    }

    pub fn get_ref(&self) -> &W {
        &self.dest
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.dest
    }

    pub fn into_inner(self) -> W {
        self.dest
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn accept(&mut self, data: &[u8]) -> bool {
        if self.seen + data.len() > self.max {
            return false;
        }
        if let Err(e) = self.dest.write_all(data) {
            tracing::warn!("output stream write failed: {}", e);
            self.error = Some(e);
            return false;
        }
        self.seen += data.len();
        true
    }

    fn reset(&mut self) -> Result<()> {
        Err(Error::Usage(
            "unable to clear an output stream; rebind it with reset_to".to_string(),
        ))
    }

    fn accepted(&self) -> usize {
        self.seen
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

/// Accepts and drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Sink for Discard {
    fn accept(&mut self, _data: &[u8]) -> bool {
        true
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn accepted(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_sink_rejects_over_ceiling_without_appending() {
        let mut s = String::new();
        let mut sink = TextSink::with_limit(&mut s, 8);
        assert!(sink.accept(b"hello"));
        assert!(!sink.accept(b"world"));
        assert_eq!(sink.accepted(), 5);
        assert!(sink.accept(b"abc"));
        assert!(!sink.accept(b"x"));
        assert_eq!(s, "helloabc");
    }

    #[test]
    fn text_sink_counts_existing_content() {
        let mut s = String::from("12345");
        let mut sink = TextSink::with_limit(&mut s, 6);
        assert!(!sink.accept(b"ab"));
        assert!(sink.accept(b"a"));
        assert_eq!(s, "12345a");
    }

    #[test]
    fn text_sink_joins_split_characters() {
        let euro = "€".as_bytes();
        let mut sink = TextSink::new(String::new());
        assert!(sink.accept(&euro[..1]));
        assert_eq!(sink.get_ref(), "");
        assert_eq!(sink.accepted(), 1);
        assert!(sink.accept(&euro[1..]));
        assert_eq!(sink.get_ref(), "€");
    }

    #[test]
    fn text_sink_finish_settles_truncated_character() {
        let mut sink = TextSink::new(String::new());
        assert!(sink.accept(b"abc\xe2"));
        assert_eq!(sink.get_ref(), "abc");
        sink.finish();
        assert_eq!(sink.get_ref(), "abc\u{fffd}");
        assert_eq!(sink.accepted(), 6);

        // The next transfer starts clean instead of completing the old character.
        assert!(sink.accept(b"\x82\xacdef"));
        assert_eq!(sink.get_ref(), "abc\u{fffd}\u{fffd}\u{fffd}def");
    }

    #[test]
    fn text_sink_finish_respects_ceiling() {
        let mut sink = TextSink::with_limit(String::new(), 5);
        assert!(sink.accept(b"abcd\xe2"));
        sink.finish();
        assert_eq!(sink.get_ref(), "abcd");
        assert_eq!(sink.accepted(), 4);
        sink.finish();
        assert_eq!(sink.get_ref(), "abcd");
    }

    #[test]
    fn text_sink_replaces_invalid_bytes() {
        let mut sink = TextSink::new(String::new());
        assert!(sink.accept(b"a\xffb"));
        assert_eq!(sink.get_ref(), "a\u{fffd}b");
    }

    #[test]
    fn text_sink_reset_clears_destination() {
        let mut s = String::new();
        {
            let mut sink = TextSink::with_limit(&mut s, 4);
            assert!(sink.accept(b"abcd"));
            sink.reset().unwrap();
            assert_eq!(sink.accepted(), 0);
            assert!(sink.accept(b"efgh"));
        }
        assert_eq!(s, "efgh");
    }

    #[test]
    fn bytes_sink_never_exceeds_ceiling() {
        let mut v = Vec::new();
        let mut sink = BytesSink::with_limit(&mut v, 10);
        let mut total = 0;
        for chunk in [&b"abc"[..], b"defg", b"hijk", b"lmn", b"o"] {
            if sink.accept(chunk) {
                total += chunk.len();
            }
            assert!(sink.accepted() <= 10);
        }
        assert_eq!(total, 10);
        assert_eq!(v, b"abcdefglmn");
    }

    #[test]
    fn bytes_sink_exact_ceiling_is_accepted() {
        let mut sink = BytesSink::with_limit(Vec::new(), 4);
        assert!(sink.accept(b"abcd"));
        assert!(!sink.accept(b"e"));
        assert_eq!(sink.get_ref().as_slice(), b"abcd");
    }

    #[test]
    fn bytes_sink_default_limit_is_four_mib() {
        let sink = BytesSink::new(Vec::new());
        assert_eq!(sink.limit(), 4 * 1024 * 1024);
    }

    #[test]
    fn writer_sink_counts_and_rejects() {
        let mut out: Vec<u8> = Vec::new();
        let mut sink = WriterSink::with_limit(&mut out, 6);
        assert!(sink.accept(b"abc"));
        assert!(!sink.accept(b"defg"));
        assert!(sink.accept(b"def"));
        assert_eq!(sink.accepted(), 6);
        assert!(sink.take_error().is_none());
        drop(sink);
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn writer_sink_reset_requires_new_destination() {
        let mut sink = WriterSink::with_limit(Vec::new(), 4);
        assert!(sink.accept(b"abcd"));
        assert!(matches!(sink.reset(), Err(Error::Usage(_))));
        assert!(!sink.accept(b"e"));

        let old = sink.reset_to(Vec::new());
        assert_eq!(old, b"abcd");
        assert_eq!(sink.accepted(), 0);
        assert!(sink.accept(b"efgh"));
        assert_eq!(sink.into_inner(), b"efgh");
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_sink_records_destination_failure() {
        let mut sink = WriterSink::new(Broken);
        assert!(!sink.accept(b"data"));
        assert_eq!(sink.accepted(), 0);
        let err = sink.take_error().expect("recorded error");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(sink.take_error().is_none());
    }

    #[test]
    fn sinks_work_through_trait_objects() {
        let mut sinks: Vec<Box<dyn Sink>> = vec![
            Box::new(TextSink::with_limit(String::new(), 3)),
            Box::new(BytesSink::with_limit(Vec::new(), 3)),
            Box::new(WriterSink::with_limit(Vec::new(), 3)),
        ];
        for sink in sinks.iter_mut() {
            assert!(sink.accept(b"ab"));
            assert!(!sink.accept(b"cd"));
            assert_eq!(sink.accepted(), 2);
        }
    }

    #[test]
    fn discard_accepts_everything() {
        let mut d = Discard;
        assert!(d.accept(&[0u8; 10_000]));
        assert_eq!(d.accepted(), 0);
        assert!(d.reset().is_ok());
    }
}
