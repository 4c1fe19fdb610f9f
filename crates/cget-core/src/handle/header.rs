//! Per-line response header inspection: pick out `ETag` and `Last-Modified`.

use chrono::{DateTime, NaiveDateTime};

use crate::tag::FreshnessTag;

const LAST_MODIFIED: &[u8] = b"Last-Modified:";
const ETAG: &[u8] = b"ETag:";

/// Inspect one raw header line and record freshness information in `tag`.
///
/// Returns true if the line was a `Last-Modified` or `ETag` header (consumed
/// here); other lines, including status lines, are left for the caller. An
/// unparsable date leaves the timestamp at zero; a blank etag leaves it unset.
pub(crate) fn inspect(line: &[u8], tag: &mut FreshnessTag) -> bool {
    if let Some(value) = strip_prefix_ignore_case(line, LAST_MODIFIED) {
        if let Some(ts) = parse_http_date(&String::from_utf8_lossy(value)) {
            tag.set_mtime(ts);
        }
        return true;
    }
    if let Some(value) = strip_prefix_ignore_case(line, ETAG) {
        let value = trim_ascii(value);
        if !value.is_empty() {
            tag.set_etag(String::from_utf8_lossy(value));
        }
        return true;
    }
    false
}

/// True for `HTTP/1.1 200 OK`-style lines, which start each (possibly redirected) response.
pub(crate) fn is_status_line(line: &[u8]) -> bool {
    line.len() >= 5 && line[..5].eq_ignore_ascii_case(b"HTTP/")
}

fn strip_prefix_ignore_case<'a>(line: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    if line.len() > prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn trim_ascii(value: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n');
    let start = value.iter().position(|b| !is_ws(b)).unwrap_or(value.len());
    let end = value.iter().rposition(|b| !is_ws(b)).map_or(start, |i| i + 1);
    &value[start..end]
}

/// Parse an HTTP date (RFC 1123, RFC 850 or asctime) into seconds since the epoch.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.timestamp());
    }
    for fmt in ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    None
}
