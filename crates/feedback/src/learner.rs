//! Belief reconciliation: bounded credit assignment from prediction error.

use crate::explore::ExplorationPolicy;
use fluxdispatch_executor::PerformanceRecord;
use fluxdispatch_kernels::beliefs::{HardwareProfile, SharedProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Which belief entries an executed plan is allowed to blame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningContext {
    pub path_name: String,
    pub transform_key: Option<String>,
    pub main_operation: Option<String>,
    pub sensitivity_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Relative deviation below which beliefs are left alone.
    pub quark_threshold: f64,
    pub learning_rate: f64,
    pub learning_rate_base_cost: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            quark_threshold: 0.15,
            learning_rate: 0.1,
            learning_rate_base_cost: 0.05,
        }
    }
}

/// Completes the cognitive cycle: compares predicted flux against the
/// observed record and mutates the shared profile under one write lock.
///
/// When a context carries several keys they all fire on the same
/// deviation, which can double-count a single error. Deliberately kept:
/// the attribution is aggressive but bounded by the clamps.
pub struct FeedbackLoop {
    profile: SharedProfile,
    config: FeedbackConfig,
    exploration: ExplorationPolicy,
}

impl FeedbackLoop {
    pub fn new(profile: SharedProfile) -> Self {
        Self {
            profile,
            config: FeedbackConfig::default(),
            exploration: ExplorationPolicy::new(),
        }
    }

    pub fn with_config(mut self, config: FeedbackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_exploration(mut self, exploration: ExplorationPolicy) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn config(&self) -> FeedbackConfig {
        self.config
    }

    pub fn exploration_mut(&mut self) -> &mut ExplorationPolicy {
        &mut self.exploration
    }

    pub fn should_explore(&mut self) -> bool {
        self.exploration.should_explore()
    }

    pub fn learn(&self, context: &LearningContext, predicted: f64, record: &PerformanceRecord) {
        let observed = record.holistic_flux;
        debug!(
            path = %context.path_name,
            predicted,
            observed,
            "analyzing feedback"
        );

        if predicted == 0.0 && observed == 0.0 {
            debug!("predicted and observed flux both zero, beliefs stable");
            return;
        }

        if predicted == 0.0 {
            self.blame_from_zero_prediction(context, observed);
            return;
        }

        let deviation = (observed - predicted) / predicted;
        if deviation.abs() < self.config.quark_threshold {
            debug!(deviation, "deviation within threshold, beliefs stable");
            return;
        }

        info!(
            path = %context.path_name,
            deviation,
            "flux quark detected, updating beliefs"
        );
        let mut beliefs = self.profile.write();
        let mut assigned = false;

        if let Some(key) = &context.transform_key {
            if let Some(entry) = beliefs.transform_costs.get_mut(key) {
                let old = *entry;
                *entry = HardwareProfile::clamp_cost(
                    *entry + (observed - predicted) * self.config.learning_rate,
                );
                info!(key = %key, old, new = *entry, "updated transform cost");
                assigned = true;
            }
        }
        if let Some(key) = &context.main_operation {
            if let Some(entry) = beliefs.base_operational_costs.get_mut(key) {
                let old = *entry;
                *entry = HardwareProfile::clamp_cost(
                    *entry + *entry * deviation * self.config.learning_rate_base_cost,
                );
                info!(key = %key, old, new = *entry, "updated base cost");
                assigned = true;
            }
        }
        if let Some(key) = &context.sensitivity_key {
            if let Some(entry) = beliefs.flux_sensitivities.get_mut(key) {
                let old = *entry;
                *entry = HardwareProfile::clamp_sensitivity(
                    *entry * (1.0 + deviation * self.config.learning_rate),
                );
                info!(key = %key, old, new = *entry, "updated sensitivity");
                assigned = true;
            }
        }

        if !assigned {
            warn!(
                path = %context.path_name,
                "could not assign credit for flux quark: no matching belief entry"
            );
        }
    }

    /// A cost materialized out of a zero prediction: set the transform
    /// belief outright, or bump the sensitivity from a floor.
    fn blame_from_zero_prediction(&self, context: &LearningContext, observed: f64) {
        info!(
            path = %context.path_name,
            observed,
            "flux quark: predicted zero but observed cost"
        );
        let mut beliefs = self.profile.write();

        if let Some(key) = &context.transform_key {
            if let Some(entry) = beliefs.transform_costs.get_mut(key) {
                let old = *entry;
                *entry = HardwareProfile::clamp_cost(observed);
                info!(key = %key, old, new = *entry, "transform cost set to observed");
                return;
            }
        }
        if let Some(key) = &context.sensitivity_key {
            if let Some(entry) = beliefs.flux_sensitivities.get_mut(key) {
                let old = *entry;
                *entry = HardwareProfile::clamp_sensitivity(
                    entry.max(0.01) + observed * self.config.learning_rate,
                );
                info!(key = %key, old, new = *entry, "sensitivity bumped from floor");
                return;
            }
        }
        warn!(path = %context.path_name, "no belief entry to blame for observed cost");
    }

    pub fn profile_handle(&self) -> SharedProfile {
        self.profile.clone()
    }
}
