//! Single byte-range resolution for `Range: bytes=<first>-<last>` headers.
//!
//! Only one range is ever served. Anything that is not exactly one `bytes=` range
//! (multiple ranges, other units, stray whitespace) is treated as if no header was
//! sent and the whole resource is served.

use http::StatusCode;
use lazy_regex::{lazy_regex, Lazy, Regex};

use crate::{ShapingError, ShapingResult};

static RANGE_HEADER: Lazy<Regex> = lazy_regex!(r"^bytes=(\d*)-(\d*)$");

/// An inclusive serving window `[start, end]` within a resource of `total` bytes.
///
/// Always satisfies `start <= end < total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Number of bytes in the window.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A window is never empty; provided for API completeness alongside `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when the window covers the entire resource.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total
    }

    /// 206 for a strict sub-window, 200 when the whole resource is served.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.is_full() {
            StatusCode::OK
        } else {
            StatusCode::PARTIAL_CONTENT
        }
    }

    /// `Content-Range` value, e.g. `bytes 0-25/26`.
    #[must_use]
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// `Content-Range` value sent with a 416 response.
#[must_use]
pub fn unsatisfied_content_range(total: u64) -> String {
    format!("bytes */{total}")
}

/// Resolves an optional raw `Range` header value against a resource of `total` bytes.
///
/// # Errors
///
/// [`ShapingError::RangeNotSatisfiable`] when the parsed window starts after it ends,
/// ends at or past `total`, or when `total` is zero.
pub fn resolve(range_header: Option<&str>, total: u64) -> ShapingResult<ByteRange> {
    if total == 0 {
        return Err(ShapingError::RangeNotSatisfiable { total });
    }

    let (start, end) = range_header
        .and_then(|raw| requested_bounds(raw, total))
        .unwrap_or((0, total - 1));

    if start > end || end >= total {
        probe_trace::debug!(
            "range {:?} not satisfiable for {} bytes",
            range_header,
            total
        );
        return Err(ShapingError::RangeNotSatisfiable { total });
    }

    Ok(ByteRange { start, end, total })
}

/// Extracts `(first, last)` from a header value, `None` when the header does not
/// match the single-range grammar. `total` must be at least one.
fn requested_bounds(raw: &str, total: u64) -> Option<(u64, u64)> {
    let captures = RANGE_HEADER.captures(raw)?;
    let first = captures.get(1).map_or("", |m| m.as_str());
    let last = captures.get(2).map_or("", |m| m.as_str());

    match (first.is_empty(), last.is_empty()) {
        (true, true) => Some((0, total - 1)),
        // suffix form: the final `last` bytes, or everything when `last >= total`
        (true, false) => Some((total.saturating_sub(saturating(last)), total - 1)),
        (false, true) => Some((saturating(first), total - 1)),
        (false, false) => Some((saturating(first), saturating(last))),
    }
}

/// Digit strings too long for a `u64` pin to `u64::MAX`, so an oversized bound is
/// reported as unsatisfiable rather than ignored.
fn saturating(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(header: &str, total: u64) -> ShapingResult<(u64, u64)> {
        resolve(Some(header), total).map(|r| (r.start, r.end))
    }

    #[test]
    fn missing_header_serves_everything() {
        for total in [1, 2, 26, 1000, 102_400] {
            let range = resolve(None, total).expect("should resolve");
            assert_eq!((range.start, range.end), (0, total - 1));
            assert!(range.is_full());
            assert_eq!(range.status(), StatusCode::OK);
        }
    }

    #[test]
    fn unparsable_header_serves_everything() {
        for header in [
            "",
            "bytes",
            "bytes=a-b",
            "items=0-5",
            "bytes=0-5,7-9",
            " bytes=0-5",
            "bytes=0-5 ",
        ] {
            assert_eq!(window(header, 26), Ok((0, 25)), "header {header:?}");
        }
    }

    #[test]
    fn overflowing_bounds_are_not_satisfiable() {
        for header in [
            "bytes=99999999999999999999999-",
            "bytes=0-99999999999999999999999",
            "bytes=99999999999999999999999-99999999999999999999999",
        ] {
            assert_eq!(
                window(header, 26),
                Err(ShapingError::RangeNotSatisfiable { total: 26 }),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn overflowing_suffix_serves_everything() {
        assert_eq!(window("bytes=-99999999999999999999999", 26), Ok((0, 25)));
    }

    #[test]
    fn empty_bounds_serve_everything() {
        assert_eq!(window("bytes=-", 10), Ok((0, 9)));
    }

    #[test]
    fn suffix_form_serves_tail() {
        for total in 1..=40u64 {
            for suffix in 1..=total {
                assert_eq!(
                    window(&format!("bytes=-{suffix}"), total),
                    Ok((total - suffix, total - 1))
                );
            }
        }
    }

    #[test]
    fn oversized_suffix_serves_everything() {
        assert_eq!(window("bytes=-500", 26), Ok((0, 25)));
    }

    #[test]
    fn zero_suffix_is_not_satisfiable() {
        assert_eq!(
            window("bytes=-0", 26),
            Err(ShapingError::RangeNotSatisfiable { total: 26 })
        );
    }

    #[test]
    fn prefix_form_runs_to_end() {
        assert_eq!(window("bytes=10-", 26), Ok((10, 25)));
        assert_eq!(window("bytes=25-", 26), Ok((25, 25)));
        assert_eq!(
            window("bytes=26-", 26),
            Err(ShapingError::RangeNotSatisfiable { total: 26 })
        );
    }

    #[test]
    fn explicit_windows_resolve_and_pick_status() {
        let total = 12u64;
        for first in 0..total {
            for last in first..total {
                let range = resolve(Some(&format!("bytes={first}-{last}")), total)
                    .expect("window inside resource should resolve");
                assert_eq!((range.start, range.end), (first, last));
                assert_eq!(range.len(), last - first + 1);

                let expected = if first == 0 && last == total - 1 {
                    StatusCode::OK
                } else {
                    StatusCode::PARTIAL_CONTENT
                };
                assert_eq!(range.status(), expected);
            }
        }
    }

    #[test]
    fn inverted_or_overlong_windows_fail() {
        let total = 12u64;
        for first in 0..total + 3 {
            for last in 0..total + 3 {
                if first <= last && last < total {
                    continue;
                }
                assert_eq!(
                    window(&format!("bytes={first}-{last}"), total),
                    Err(ShapingError::RangeNotSatisfiable { total }),
                    "bytes={first}-{last}"
                );
            }
        }
    }

    #[test]
    fn zero_length_resource_is_not_satisfiable() {
        assert_eq!(
            resolve(None, 0),
            Err(ShapingError::RangeNotSatisfiable { total: 0 })
        );
    }

    #[test]
    fn content_range_values() {
        let range = resolve(Some("bytes=3-7"), 26).expect("should resolve");
        assert_eq!(range.content_range(), "bytes 3-7/26");
        assert_eq!(unsatisfied_content_range(26), "bytes */26");
    }
}
