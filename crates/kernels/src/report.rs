//! Per-step flux accounting returned by kernels.

use serde::{Deserialize, Serialize};

/// Fine-grained cost report from one kernel execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluxReport {
    pub cycle_cost: u64,
    /// Hamming weight of the data the kernel read.
    pub hw_in_cost: u64,
    /// Hamming weight of the data the kernel wrote.
    pub hw_out_cost: u64,
}

impl FluxReport {
    pub fn new(cycle_cost: u64, hw_in_cost: u64, hw_out_cost: u64) -> Self {
        Self {
            cycle_cost,
            hw_in_cost,
            hw_out_cost,
        }
    }

    /// Fold another step's report into this accumulator.
    pub fn accumulate(&mut self, other: &FluxReport) {
        self.cycle_cost += other.cycle_cost;
        self.hw_in_cost += other.hw_in_cost;
        self.hw_out_cost += other.hw_out_cost;
    }

    pub fn total(&self) -> u64 {
        self.cycle_cost + self.hw_in_cost + self.hw_out_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_and_total() {
        let mut acc = FluxReport::default();
        acc.accumulate(&FluxReport::new(10, 2, 3));
        acc.accumulate(&FluxReport::new(5, 1, 0));
        assert_eq!(acc, FluxReport::new(15, 3, 3));
        assert_eq!(acc.total(), 21);
    }
}
