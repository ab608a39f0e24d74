//! The fixed parameter-index traversal schedule.
//!
//! Coordinate descent visits parameters in a hand-tuned order that groups
//! the three components of each gate and walks related gates together
//! across orientations. The single-layer table below is preserved verbatim
//! from the original tuning — it has no algorithmic derivation and a
//! documented one remains future work; do not regenerate it.
//!
//! The schedule is pure by position: `index_at(p)` is a function of `p`
//! alone, so resuming a run only needs the number of draws already made.

use crate::variant::PARAMS_PER_LAYER;

/// Hand-tuned single-layer traversal order.
pub const LAYER_SCHEDULE: [usize; PARAMS_PER_LAYER] = [
    39, 40, 41, 45, 46, 47, 51, 52, 53, 36, 37, 38, 42, 43, 44, 48, 49, 50, //
    3, 4, 5, 9, 10, 11, 15, 16, 17, 21, 22, 23, 27, 28, 29, 33, 34, 35, //
    0, 1, 2, 6, 7, 8, 12, 13, 14, 18, 19, 20, 24, 25, 26, 30, 31, 32,
];

/// Cyclic index schedule over all parameters of a `layers`-deep ansatz.
///
/// One full cycle visits every index exactly once: the single-layer table,
/// repeated layer-major with an offset of `54·layer`.
#[derive(Debug, Clone)]
pub struct IndexSchedule {
    layers: usize,
    position: usize,
}

impl IndexSchedule {
    /// Create a schedule for `layers` ansatz layers, positioned at the
    /// start of the first cycle.
    pub fn new(layers: usize) -> Self {
        debug_assert!(layers >= 1);
        Self { layers, position: 0 }
    }

    /// Total number of parameter indices in one cycle.
    pub fn n_params(&self) -> usize {
        self.layers * PARAMS_PER_LAYER
    }

    /// The index drawn at an absolute position, independent of cursor
    /// state.
    pub fn index_at(&self, position: usize) -> usize {
        let in_cycle = position % self.n_params();
        let layer = in_cycle / PARAMS_PER_LAYER;
        LAYER_SCHEDULE[in_cycle % PARAMS_PER_LAYER] + layer * PARAMS_PER_LAYER
    }

    /// Draw the next index and advance the cursor.
    pub fn next_index(&mut self) -> usize {
        let index = self.index_at(self.position);
        self.position += 1;
        index
    }

    /// Advance the cursor by `draws` positions without yielding them.
    ///
    /// Used on resume: the cursor must be realigned by exactly as many
    /// draws as steps already completed.
    pub fn advance_by(&mut self, draws: usize) {
        self.position += draws;
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_layer_draws_match_table() {
        let mut schedule = IndexSchedule::new(1);
        let drawn: Vec<usize> = (0..PARAMS_PER_LAYER).map(|_| schedule.next_index()).collect();
        assert_eq!(drawn, LAYER_SCHEDULE.to_vec());
        // Wraparound restarts the cycle.
        assert_eq!(schedule.next_index(), LAYER_SCHEDULE[0]);
    }

    #[test]
    fn test_two_layers_offset_second_block() {
        let schedule = IndexSchedule::new(2);
        assert_eq!(schedule.index_at(0), 39);
        assert_eq!(schedule.index_at(PARAMS_PER_LAYER), 39 + PARAMS_PER_LAYER);
        assert_eq!(
            schedule.index_at(2 * PARAMS_PER_LAYER - 1),
            32 + PARAMS_PER_LAYER
        );
    }

    #[test]
    fn test_advance_by_matches_replayed_draws() {
        let mut replayed = IndexSchedule::new(3);
        for _ in 0..77 {
            replayed.next_index();
        }

        let mut skipped = IndexSchedule::new(3);
        skipped.advance_by(77);

        assert_eq!(skipped.position(), replayed.position());
        assert_eq!(skipped.next_index(), replayed.next_index());
    }

    proptest! {
        /// Any consecutive block of n_params draws is a permutation of
        /// 0..n_params, from any starting offset.
        #[test]
        fn prop_full_cycle_is_a_permutation(layers in 1usize..4, offset in 0usize..400) {
            let mut schedule = IndexSchedule::new(layers);
            schedule.advance_by(offset);

            let n = schedule.n_params();
            let mut seen = vec![false; n];
            for _ in 0..n {
                let index = schedule.next_index();
                prop_assert!(index < n);
                prop_assert!(!seen[index], "index {} drawn twice in one cycle", index);
                seen[index] = true;
            }
            prop_assert!(seen.iter().all(|&s| s));
        }
    }
}
