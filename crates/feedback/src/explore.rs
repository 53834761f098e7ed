//! Exploration policy: occasionally pick a suboptimal plan to generate
//! informative feedback.

use tracing::debug;

pub const DEFAULT_EXPLORATION_RATE: f64 = 0.10;

/// Epsilon-greedy exploration with a per-worker RNG. The RNG is seedable
/// and the rate overridable so tests can pin decisions.
pub struct ExplorationPolicy {
    rate: f64,
    rng: fastrand::Rng,
}

impl ExplorationPolicy {
    pub fn new() -> Self {
        Self {
            rate: DEFAULT_EXPLORATION_RATE,
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rate: DEFAULT_EXPLORATION_RATE,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Deterministic override: 0.0 never explores, 1.0 always does.
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.clamp(0.0, 1.0);
    }

    pub fn should_explore(&mut self) -> bool {
        let draw = self.rng.f64();
        let explore = draw < self.rate;
        if explore {
            debug!(draw, rate = self.rate, "exploration triggered");
        }
        explore
    }
}

impl Default for ExplorationPolicy {
    fn default() -> Self {
        Self::new()
    }
}
