//! Candidate split record and the "take best" merge.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// One candidate split of a frontier node.
///
/// `gain` is the impurity decrease of the candidate; the sentinel
/// [`Split::NONE`] carries `gain = -f64::MAX` (finite, so comparisons stay
/// total) and means "no valid split".
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Split {
    /// Impurity decrease; higher is better.
    pub gain: f64,
    /// Feature value at the chosen bin's upper edge; rows with
    /// `value <= threshold` go left.
    pub threshold: f64,
    /// Global column id of the split feature; -1 in the sentinel.
    pub column: i32,
    /// Number of rows on the left side.
    pub n_left: u32,
}

impl Split {
    /// "No valid split" sentinel.
    pub const NONE: Split = Split {
        gain: -f64::MAX,
        threshold: 0.0,
        column: -1,
        n_left: 0,
    };

    pub fn is_valid(&self) -> bool {
        self.gain > -f64::MAX
    }

    /// Total order over candidates: maximize gain, then prefer the smaller
    /// column, the smaller threshold, and finally the larger left count.
    ///
    /// Because the order is total, merging candidates through
    /// [`Split::update`] yields the same winner in any arrival order.
    fn beats(&self, other: &Split) -> bool {
        if self.gain != other.gain {
            return self.gain > other.gain;
        }
        if self.column != other.column {
            return self.column < other.column;
        }
        if self.threshold != other.threshold {
            return self.threshold < other.threshold;
        }
        self.n_left > other.n_left
    }

    /// Take `candidate` if it beats the current best.
    pub fn update(&mut self, candidate: Split) {
        if candidate.beats(self) {
            *self = candidate;
        }
    }
}

impl Default for Split {
    fn default() -> Self {
        Split::NONE
    }
}
