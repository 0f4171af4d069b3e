use std::ops::Add;

/// Counters for one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    num_pairs: usize,
    num_in_range: usize,
}

impl PassStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pair(&mut self) {
        self.num_pairs += 1;
    }

    pub fn record_in_range(&mut self) {
        self.num_in_range += 1;
    }

    pub fn num_pairs(&self) -> usize {
        self.num_pairs
    }

    pub fn num_in_range(&self) -> usize {
        self.num_in_range
    }

    pub fn num_out_of_range(&self) -> usize {
        self.num_pairs - self.num_in_range
    }
}

impl Add for PassStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            num_pairs: self.num_pairs + other.num_pairs,
            num_in_range: self.num_in_range + other.num_in_range,
        }
    }
}
