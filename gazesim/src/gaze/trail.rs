//! Bounded FIFO of recent saccades for path visualization.

use std::collections::VecDeque;

use crate::geometry::Point2D;

/// One saccadic jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSegment {
    pub start: Point2D,
    pub end: Point2D,
}

impl TrailSegment {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Ring buffer of the most recent saccades; oldest evicted first.
#[derive(Debug, Clone)]
pub struct Trail {
    segments: VecDeque<TrailSegment>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            segments: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment. No-op when the trail is disabled (capacity 0).
    pub fn push(&mut self, segment: TrailSegment) {
        if self.capacity == 0 {
            return;
        }
        while self.segments.len() >= self.capacity {
            self.segments.pop_front();
        }
        self.segments.push_back(segment);
    }

    /// Segments from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TrailSegment> {
        self.segments.iter()
    }

    pub fn to_vec(&self) -> Vec<TrailSegment> {
        self.segments.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(i: usize) -> TrailSegment {
        TrailSegment {
            start: Point2D::new(i as f64, 0.0),
            end: Point2D::new(i as f64 + 1.0, 0.0),
        }
    }

    #[test]
    fn test_trail_evicts_oldest() {
        let mut trail = Trail::new(7);
        for i in 0..10 {
            trail.push(seg(i));
            assert!(trail.len() <= 7);
        }
        assert_eq!(trail.len(), 7);
        // Oldest surviving is segment 3 (segments 3-9)
        let kept = trail.to_vec();
        assert_eq!(kept.first(), Some(&seg(3)));
        assert_eq!(kept.last(), Some(&seg(9)));
    }

    #[test]
    fn test_trail_disabled() {
        let mut trail = Trail::new(0);
        trail.push(seg(0));
        assert!(trail.is_empty());
    }

    #[test]
    fn test_segment_length() {
        let s = TrailSegment {
            start: Point2D::ZERO,
            end: Point2D::new(3.0, 4.0),
        };
        assert_eq!(s.length(), 5.0);
    }
}
