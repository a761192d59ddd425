//! Frame scheduling: which chunks each animation frame shows.
//!
//! A frame shows two codes with two chunks each. The four indices are spread
//! a quarter of the stream apart, so within a few frames every chunk shows up
//! in several different pairings and a missed camera frame costs little.

/// Chunk indices carried by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlots {
    /// Indices embedded in the left code.
    pub left: (usize, usize),
    /// Indices embedded in the right code.
    pub right: (usize, usize),
}

impl FrameSlots {
    /// All four indices, left code first.
    pub fn indices(&self) -> [usize; 4] {
        [self.left.0, self.left.1, self.right.0, self.right.1]
    }
}

/// Rotating schedule over `total` chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    total: usize,
    offset: usize,
}

impl Schedule {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            offset: total / 4,
        }
    }

    /// Number of chunks being scheduled.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Distance between the four indices of a frame. Zero below four chunks.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Frames in one full cycle.
    pub fn cycle_len(&self) -> usize {
        self.total
    }

    /// Indices shown on `frame`. `None` when there is nothing to schedule.
    pub fn slots(&self, frame: usize) -> Option<FrameSlots> {
        if self.total == 0 {
            return None;
        }

        let n = self.total;
        let at = |step: usize| (frame % n + (step * self.offset) % n) % n;

        Some(FrameSlots {
            left: (at(0), at(1)),
            right: (at(2), at(3)),
        })
    }

    /// Frame index following `frame`, wrapping at the cycle length.
    pub fn next_frame(&self, frame: usize) -> usize {
        if self.total == 0 {
            0
        } else {
            (frame + 1) % self.total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_six_chunk_sequence() {
        let schedule = Schedule::new(6);
        assert_eq!(schedule.offset(), 1);

        let frame0 = schedule.slots(0).unwrap();
        assert_eq!(frame0.left, (0, 1));
        assert_eq!(frame0.right, (2, 3));

        let frame1 = schedule.slots(1).unwrap();
        assert_eq!(frame1.left, (1, 2));
        assert_eq!(frame1.right, (3, 4));
    }

    #[test]
    fn test_wraps_modulo_total() {
        let schedule = Schedule::new(6);
        let frame5 = schedule.slots(5).unwrap();
        assert_eq!(frame5.indices(), [5, 0, 1, 2]);
        assert_eq!(schedule.slots(11), schedule.slots(5));
        assert_eq!(schedule.next_frame(5), 0);
    }

    #[test]
    fn test_quarter_spacing() {
        let schedule = Schedule::new(16);
        assert_eq!(schedule.slots(3).unwrap().indices(), [3, 7, 11, 15]);
    }

    #[test]
    fn test_fewer_than_four_chunks() {
        let schedule = Schedule::new(3);
        assert_eq!(schedule.offset(), 0);
        assert_eq!(schedule.slots(2).unwrap().indices(), [2, 2, 2, 2]);
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(Schedule::new(1).slots(7).unwrap().indices(), [0, 0, 0, 0]);
        assert_eq!(Schedule::new(0).slots(0), None);
        assert_eq!(Schedule::new(0).next_frame(3), 0);
    }

    #[test]
    fn test_cycle_covers_every_chunk() {
        for total in 1..40 {
            let schedule = Schedule::new(total);
            let seen: HashSet<usize> = (0..schedule.cycle_len())
                .flat_map(|f| schedule.slots(f).unwrap().indices())
                .collect();
            assert_eq!(seen.len(), total);
        }
    }
}
