// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time primitives: positions, intervals and edges.

use serde::{Deserialize, Serialize};

/// Timeline position or duration, in timeline ticks.
pub type Time = u64;

/// Which boundary of an interval an edit operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    /// The start boundary.
    Start,
    /// The end boundary.
    End,
}

/// A half-open time interval `[start, start + duration)` with a source
/// in-point.
///
/// Two intervals that merely touch (one's end equals the other's start) are
/// abutting, not overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Position on the timeline.
    pub start: Time,
    /// Extent on the timeline.
    pub duration: Time,
    /// Offset into the underlying resource at which playback begins.
    pub in_point: Time,
}

impl Interval {
    /// Create an interval.
    pub fn new(start: Time, duration: Time, in_point: Time) -> Self {
        Self {
            start,
            duration,
            in_point,
        }
    }

    /// Exclusive end position (`start + duration`).
    pub fn end(&self) -> Time {
        self.start + self.duration
    }

    /// Whether two intervals overlap under half-open semantics.
    ///
    /// Zero-duration intervals never overlap anything.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Whether `time` falls inside the interval.
    pub fn contains(&self, time: Time) -> bool {
        time >= self.start && time < self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abutting_intervals_do_not_overlap() {
        let a = Interval::new(0, 50, 0);
        let b = Interval::new(50, 50, 0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn overlapping_intervals_detected() {
        let a = Interval::new(0, 60, 0);
        let b = Interval::new(50, 50, 0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn zero_duration_never_overlaps() {
        let a = Interval::new(10, 0, 0);
        let b = Interval::new(0, 100, 0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn contains_is_half_open() {
        let a = Interval::new(10, 10, 0);
        assert!(a.contains(10));
        assert!(a.contains(19));
        assert!(!a.contains(20));
    }
}
