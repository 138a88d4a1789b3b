//! Byte offset to line number mapping.
//!
//! `LineTracker` discovers line starts lazily: queries at or past the scan cursor
//! extend the cache by scanning forward, while queries behind it are answered by
//! binary search over the lines already discovered. Both paths agree on a single
//! line numbering: the first line is 1, and `\n`, `\r\n` and a lone `\r` each end
//! a line.
//!
//! The cache lives behind a `RefCell`, so a tracker is cheap to query through a
//! shared reference but is deliberately not `Sync`: one tracker belongs to one query.

use crate::models::Interval;
use std::cell::RefCell;

#[derive(Debug)]
struct LineCache {
    /// `starts[n]` is the byte offset where line `n + 1` begins
    starts: Vec<usize>,
    /// Every byte before this offset has been scanned for line breaks
    scanned: usize,
}

#[derive(Debug)]
pub struct LineTracker<'a> {
    source: &'a str,
    cache: RefCell<LineCache>,
}

impl<'a> LineTracker<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            cache: RefCell::new(LineCache {
                starts: vec![0],
                scanned: 0,
            }),
        }
    }

    /// 1-indexed line containing `offset`. Offsets past the end map to the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.source.len());
        let mut cache = self.cache.borrow_mut();
        if offset >= cache.scanned {
            self.scan_until(&mut cache, offset);
        }
        cache.starts.partition_point(|&start| start <= offset)
    }

    /// Inclusive 1-indexed `(first, last)` lines covered by `interval`.
    ///
    /// # Arguments
    ///
    /// * `interval` - Byte range into the tracked source
    ///
    /// # Returns
    ///
    /// The first and last line; an empty interval gives the same line twice.
    pub fn line_range(&self, interval: Interval) -> (usize, usize) {
        let start = self.line_of(interval.start);
        let last_byte = if interval.end > interval.start {
            interval.end - 1
        } else {
            interval.start
        };
        (start, self.line_of(last_byte))
    }

    /// 1-indexed `(line, column)` of `offset`, the column counted in characters.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_of(offset);
        let line_start = self.cache.borrow().starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        (line, column)
    }

    /// Text of line `line_nr` without its terminator, or `None` outside the file.
    pub fn get(&self, line_nr: usize) -> Option<&'a str> {
        if line_nr == 0 {
            return None;
        }

        let mut cache = self.cache.borrow_mut();
        while cache.starts.len() <= line_nr && cache.scanned < self.source.len() {
            let next = self.next_break_end(cache.scanned);
            self.scan_until(&mut cache, next);
        }

        let start = *cache.starts.get(line_nr - 1)?;
        let end = cache
            .starts
            .get(line_nr)
            .copied()
            .unwrap_or(self.source.len());
        let text = &self.source[start..end];
        Some(
            text.strip_suffix("\r\n")
                .or_else(|| text.strip_suffix('\n'))
                .or_else(|| text.strip_suffix('\r'))
                .unwrap_or(text),
        )
    }

    /// Offset just past the next line break at or after `from`, or the end of input.
    fn next_break_end(&self, from: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut i = from;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => return i + 1,
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => return i + 1,
                _ => i += 1,
            }
        }
        bytes.len()
    }

    fn scan_until(&self, cache: &mut LineCache, target: usize) {
        let bytes = self.source.as_bytes();
        let target = target.min(bytes.len());
        while cache.scanned < target {
            let i = cache.scanned;
            match bytes[i] {
                b'\n' => cache.starts.push(i + 1),
                // the `\n` of a `\r\n` pair records the break
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => cache.starts.push(i + 1),
                _ => {}
            }
            cache.scanned += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SOURCE: &str = "Host: https://serenity.co\nAuthorization: $auth\nGET /cargo";

    #[test]
    fn test_forward_queries() {
        let lines = LineTracker::new(SOURCE);
        assert_eq!(lines.line_of(0), 1);
        assert_eq!(lines.line_of(26), 2);
        assert_eq!(lines.line_of(47), 3);
        assert_eq!(lines.line_of(SOURCE.len()), 3);
    }

    #[test]
    fn test_backward_queries_use_cache() {
        let lines = LineTracker::new(SOURCE);
        assert_eq!(lines.line_of(50), 3);
        assert_eq!(lines.line_of(30), 2);
        assert_eq!(lines.line_of(3), 1);
        assert_eq!(lines.line_range(Interval::new(26, 46)), (2, 2));
        assert_eq!(lines.line_range(Interval::new(26, 46)), (2, 2));
    }

    #[test]
    fn test_line_range_spans_lines() {
        let source = "POST /cargo\n{\n    \"id\": \"$cargo\"\n}";
        let lines = LineTracker::new(source);
        assert_eq!(lines.line_range(Interval::new(0, source.len())), (1, 4));
    }

    #[test]
    fn test_interval_ending_at_newline_stays_on_line() {
        let lines = LineTracker::new("GET /a\nGET /b");
        assert_eq!(lines.line_range(Interval::new(0, 7)), (1, 1));
        assert_eq!(lines.line_range(Interval::new(7, 7)), (2, 2));
    }

    #[test]
    fn test_get_line_text() {
        let lines = LineTracker::new(SOURCE);
        assert_eq!(lines.get(2), Some("Authorization: $auth"));
        assert_eq!(lines.get(1), Some("Host: https://serenity.co"));
        assert_eq!(lines.get(3), Some("GET /cargo"));
        assert_eq!(lines.get(4), None);
        assert_eq!(lines.get(0), None);
    }

    #[test]
    fn test_crlf_counts_once() {
        let lines = LineTracker::new("a\r\nb\rc\n");
        assert_eq!(lines.line_of(0), 1);
        assert_eq!(lines.line_of(1), 1);
        assert_eq!(lines.line_of(2), 1);
        assert_eq!(lines.line_of(3), 2);
        assert_eq!(lines.line_of(5), 3);
        assert_eq!(lines.get(1), Some("a"));
        assert_eq!(lines.get(2), Some("b"));
        assert_eq!(lines.get(3), Some("c"));
        assert_eq!(lines.get(4), Some(""));
        assert_eq!(lines.get(5), None);
    }

    #[test]
    fn test_position_counts_characters() {
        let lines = LineTracker::new("$ship = \"café\"\n  $crew = 9");
        assert_eq!(lines.position(0), (1, 1));
        assert_eq!(lines.position(18), (2, 3));
        assert_eq!(lines.position(15), (1, 15));
    }

    #[test]
    fn test_empty_source() {
        let lines = LineTracker::new("");
        assert_eq!(lines.line_of(0), 1);
        assert_eq!(lines.get(1), Some(""));
        assert_eq!(lines.get(2), None);
    }

    fn naive_line_of(source: &str, offset: usize) -> usize {
        let bytes = source.as_bytes();
        let mut line = 1;
        for i in 0..offset.min(bytes.len()) {
            match bytes[i] {
                b'\n' => line += 1,
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line += 1,
                _ => {}
            }
        }
        line
    }

    proptest! {
        #[test]
        fn prop_any_query_order_matches_naive_numbering(
            source in "[a \n\r]{0,64}",
            offsets in proptest::collection::vec(0usize..70, 1..20),
        ) {
            let lines = LineTracker::new(&source);
            for offset in offsets {
                prop_assert_eq!(lines.line_of(offset), naive_line_of(&source, offset));
            }
        }

        #[test]
        fn prop_get_matches_str_lines(source in "[ab \n]{0,64}") {
            let lines = LineTracker::new(&source);
            for (i, expected) in source.split('\n').enumerate() {
                prop_assert_eq!(lines.get(i + 1), Some(expected));
            }
        }
    }
}
