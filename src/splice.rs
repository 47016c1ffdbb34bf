//! Insertion of one segment sequence into another.
//!
//! Positions follow array-insertion semantics: a negative index counts from the
//! end, so `-1` inserts *before* the last element. This keeps a closing segment
//! at the tail of a live playlist in place.

use std::ops::Range;

use tracing::{debug, warn};

/// Index used when neither a valid percent nor an index is given:
/// right before the last segment.
pub const DEFAULT_INDEX: isize = -1;

/// A segment that can carry a discontinuity marker
pub trait Discontinuity {
    fn set_discontinuity(&mut self);
}

impl Discontinuity for m3u8_rs::MediaSegment {
    fn set_discontinuity(&mut self) {
        self.discontinuity = true;
    }
}

/// Where to insert the source sequence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpliceRequest {
    pub index: Option<isize>,
    /// Position as a share of the destination length, from 0 to 100
    pub percent: Option<f64>,
}

impl SpliceRequest {
    pub fn at_index(index: isize) -> Self {
        Self {
            index: Some(index),
            percent: None,
        }
    }

    pub fn at_percent(percent: f64) -> Self {
        Self {
            index: None,
            percent: Some(percent),
        }
    }

    /// Resolve the requested position into an index for a destination of `len` segments.
    ///
    /// A percent wins when it lands strictly inside the destination
    /// (`0 < index < len`). Otherwise the explicit index is used,
    /// then [`DEFAULT_INDEX`].
    pub fn resolve_index(&self, len: usize) -> isize {
        let fallback = self.index.unwrap_or(DEFAULT_INDEX);

        let Some(percent) = self.percent else {
            return fallback;
        };

        let index = percent_to_index(len, percent);
        if index > 0 && (index as usize) < len {
            index
        } else {
            warn!(
                "Splice at {percent}% resolves to index {index}, \
                outside of 1..{len}. Using index {fallback} instead"
            );
            fallback
        }
    }
}

/// `ceil(len * percent / 100) - 1`
///
/// 100% gives `len - 1`, which is accepted and inserts at the same place as
/// [`DEFAULT_INDEX`]: before the last segment.
pub fn percent_to_index(len: usize, percent: f64) -> isize {
    let position = (len as f64 * percent / 100.0).ceil();
    // NaN saturates to 0
    position as isize - 1
}

/// Clamp an index with array-insertion semantics into `0..=len`
pub fn insertion_point(len: usize, index: isize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        (index as usize).min(len)
    }
}

/// Result of a splice
#[derive(Debug, Clone, PartialEq)]
pub struct Spliced<T> {
    pub segments: Vec<T>,
    /// Where the source segments ended up
    pub inserted: Range<usize>,
}

impl<T: Discontinuity> Spliced<T> {
    /// Mark the decoding discontinuities the splice introduced: on the first
    /// inserted segment and on the destination segment resuming after the run.
    ///
    /// Nothing is marked when nothing was inserted.
    pub fn mark_discontinuities(&mut self) {
        if self.inserted.is_empty() {
            return;
        }
        if self.inserted.start > 0 {
            self.segments[self.inserted.start].set_discontinuity();
        }
        if let Some(resumed) = self.segments.get_mut(self.inserted.end) {
            resumed.set_discontinuity();
        }
    }
}

/// Insert a copy of `source` into a copy of `destination` at the requested position.
///
/// Both inputs are left untouched and every segment of the result is a fresh
/// clone, so the result shares nothing with the inputs.
pub fn splice<T: Clone>(destination: &[T], source: &[T], request: &SpliceRequest) -> Spliced<T> {
    let index = request.resolve_index(destination.len());
    let at = insertion_point(destination.len(), index);
    debug!(
        "Splicing {} segments into {} at index {index} (position {at})",
        source.len(),
        destination.len()
    );

    let mut segments = Vec::with_capacity(destination.len() + source.len());
    segments.extend_from_slice(&destination[..at]);
    segments.extend_from_slice(source);
    segments.extend_from_slice(&destination[at..]);

    Spliced {
        segments,
        inserted: at..at + source.len(),
    }
}

#[cfg(test)]
mod tests {
    use m3u8_rs::MediaSegment;

    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn segment(uri: &str) -> MediaSegment {
        MediaSegment {
            uri: uri.to_string(),
            duration: 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn percent_resolution() {
        let request = SpliceRequest::at_percent(50.0);
        assert_eq!(request.resolve_index(10), 4);
        assert_eq!(SpliceRequest::at_percent(33.0).resolve_index(10), 3);
    }

    #[test]
    fn full_percent_lands_before_the_last_segment() {
        for len in [2, 5, 10] {
            let index = SpliceRequest::at_percent(100.0).resolve_index(len);
            assert_eq!(index, len as isize - 1);
            assert_eq!(
                insertion_point(len, index),
                insertion_point(len, DEFAULT_INDEX)
            );
        }
    }

    #[test]
    fn percent_at_the_start_falls_back_to_index() {
        let request = SpliceRequest {
            index: Some(2),
            percent: Some(10.0),
        };
        // ceil(10 * 10 / 100) - 1 == 0, never splice at the very start
        assert_eq!(request.resolve_index(10), 2);
    }

    #[test]
    fn percent_wins_over_index() {
        let request = SpliceRequest {
            index: Some(1),
            percent: Some(80.0),
        };
        assert_eq!(request.resolve_index(10), 7);
    }

    #[test]
    fn out_of_range_percents_fall_back() {
        assert_eq!(SpliceRequest::at_percent(0.0).resolve_index(10), DEFAULT_INDEX);
        assert_eq!(SpliceRequest::at_percent(150.0).resolve_index(10), DEFAULT_INDEX);
        assert_eq!(SpliceRequest::at_percent(-20.0).resolve_index(10), DEFAULT_INDEX);
        assert_eq!(SpliceRequest::at_percent(f64::NAN).resolve_index(10), DEFAULT_INDEX);
    }

    #[test]
    fn no_position_defaults_to_before_last() {
        assert_eq!(SpliceRequest::default().resolve_index(10), DEFAULT_INDEX);
    }

    #[test]
    fn insertion_points() {
        assert_eq!(insertion_point(3, -1), 2);
        assert_eq!(insertion_point(3, -3), 0);
        assert_eq!(insertion_point(3, -10), 0);
        assert_eq!(insertion_point(3, 1), 1);
        assert_eq!(insertion_point(3, 3), 3);
        assert_eq!(insertion_point(3, 42), 3);
        assert_eq!(insertion_point(0, -1), 0);
        assert_eq!(insertion_point(0, 5), 0);
    }

    #[test]
    fn inserts_a_contiguous_run() {
        let destination = names(&["X", "Y", "Z"]);
        let source = names(&["A", "B"]);
        let spliced = splice(&destination, &source, &SpliceRequest::at_index(1));

        assert_eq!(spliced.segments, names(&["X", "A", "B", "Y", "Z"]));
        assert_eq!(spliced.inserted, 1..3);
    }

    #[test]
    fn default_keeps_the_closing_segment_last() {
        let destination = names(&["X", "Y", "END"]);
        let source = names(&["A"]);
        let spliced = splice(&destination, &source, &SpliceRequest::default());

        assert_eq!(spliced.segments, names(&["X", "Y", "A", "END"]));
    }

    #[test]
    fn empty_source_is_a_no_op() {
        let destination = vec![segment("a.ts"), segment("b.ts")];
        let spliced = splice(&destination, &[], &SpliceRequest::at_index(1));

        assert_eq!(spliced.segments, destination);
        assert!(spliced.inserted.is_empty());
    }

    #[test]
    fn empty_destination_collapses_to_start() {
        let source = names(&["A", "B"]);
        for request in [
            SpliceRequest::default(),
            SpliceRequest::at_index(7),
            SpliceRequest::at_percent(50.0),
        ] {
            let spliced = splice(&[], &source, &request);
            assert_eq!(spliced.segments, source);
            assert_eq!(spliced.inserted, 0..2);
        }
    }

    #[test]
    fn result_does_not_alias_inputs() {
        let mut destination = vec![segment("x.ts"), segment("y.ts")];
        let mut source = vec![segment("a.ts")];
        let spliced = splice(&destination, &source, &SpliceRequest::at_index(1));

        destination[0].uri = "changed.ts".to_string();
        source[0].duration = 99.0;

        assert_eq!(spliced.segments[0].uri, "x.ts");
        assert_eq!(spliced.segments[1].duration, 2.0);
    }

    #[test]
    fn marks_both_splice_boundaries() {
        let destination = vec![segment("x.ts"), segment("y.ts"), segment("z.ts")];
        let source = vec![segment("a.ts"), segment("b.ts")];
        let mut spliced = splice(&destination, &source, &SpliceRequest::at_index(1));
        spliced.mark_discontinuities();

        let marks: Vec<bool> = spliced.segments.iter().map(|s| s.discontinuity).collect();
        assert_eq!(marks, [false, true, false, true, false]);
    }

    #[test]
    fn nothing_to_mark_without_neighbours() {
        let source = vec![segment("a.ts")];
        let mut spliced = splice(&[], &source, &SpliceRequest::default());
        spliced.mark_discontinuities();
        assert!(!spliced.segments[0].discontinuity);

        let destination = vec![segment("x.ts")];
        let mut spliced = splice(&destination, &[], &SpliceRequest::default());
        spliced.mark_discontinuities();
        assert!(!spliced.segments[0].discontinuity);
    }
}
