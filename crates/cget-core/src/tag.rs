//! Freshness tag: the (ETag, Last-Modified) pair a caller keeps between
//! requests to make the next one conditional.

use std::fmt;
use std::str::FromStr;

/// Entity tag plus last-modified time (seconds since the Unix epoch, 0 = unknown).
///
/// Two tags are equal when both timestamps are non-zero and equal, or when
/// both etags are non-empty and equal. Either match suffices; equality is not
/// transitive, so there is no `Eq` or `Hash`.
#[derive(Debug, Clone, Default)]
pub struct FreshnessTag {
    etag: String,
    mtime: i64,
}

impl FreshnessTag {
    pub fn new(etag: impl Into<String>, mtime: i64) -> Self {
        Self {
            etag: etag.into(),
            mtime,
        }
    }

    /// Entity tag exactly as the server sent it (quotes kept); empty if none.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Last-modified time in seconds since the epoch; 0 if none.
    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    /// True if the tag carries neither an etag nor a timestamp.
    pub fn is_empty(&self) -> bool {
        self.etag.is_empty() && self.mtime == 0
    }

    pub(crate) fn set_etag(&mut self, etag: impl Into<String>) {
        self.etag = etag.into();
    }

    pub(crate) fn set_mtime(&mut self, mtime: i64) {
        self.mtime = mtime;
    }
}

impl PartialEq for FreshnessTag {
    fn eq(&self, other: &Self) -> bool {
        (self.mtime != 0 && self.mtime == other.mtime)
            || (!self.etag.is_empty() && self.etag == other.etag)
    }
}

/// Serialized form `<mtime> <etag>`. Not round-trip safe for etags that
/// start with whitespace.
impl fmt::Display for FreshnessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mtime, self.etag)
    }
}

/// Error parsing a serialized tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError(String);

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid freshness tag: {}", self.0)
    }
}

impl std::error::Error for ParseTagError {}

impl FromStr for FreshnessTag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start();
        let (mtime, etag) = match s.split_once(char::is_whitespace) {
            Some((mtime, rest)) => (mtime, rest.trim()),
            None => (s.trim_end(), ""),
        };
        let mtime = mtime
            .parse::<i64>()
            .map_err(|_| ParseTagError(format!("bad timestamp {:?}", mtime)))?;
        Ok(FreshnessTag::new(etag, mtime))
    }
}
