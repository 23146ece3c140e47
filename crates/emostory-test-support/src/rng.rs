//! Test RNG: deterministic `DeterministicRng` implementations for tests.

use emostory_core::rng::DeterministicRng;

/// An RNG that returns values from predetermined sequences. Panics if a
/// sequence is exhausted. Used to pin the simulated affect device to a
/// specific emotion and confidence.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    fractions: Vec<f64>,
    index: usize,
    fraction_index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given integer values. `next_f64`
    /// returns `0.0`.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self {
            values,
            fractions: Vec::new(),
            index: 0,
            fraction_index: 0,
        }
    }

    /// Also script the values returned by `next_f64`.
    #[must_use]
    pub fn with_fractions(mut self, fractions: Vec<f64>) -> Self {
        self.fractions = fractions;
        self
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
        let val = self.values[self.index];
        self.index += 1;
        val
    }

    fn next_f64(&mut self) -> f64 {
        if self.fractions.is_empty() {
            return 0.0;
        }
        let val = self.fractions[self.fraction_index];
        self.fraction_index += 1;
        val
    }
}
