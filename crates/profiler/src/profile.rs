//! The per-task data profile consumed by the planner.

use crate::sensor::DeviceStatus;
use serde::{Deserialize, Serialize};

/// Spectral, structural and environmental characteristics of a task's
/// input data. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    /// Mean absolute successive difference over the real input.
    pub amplitude_flux: f64,
    /// Magnitude-weighted mean normalized frequency, in [0, 0.5].
    pub spectral_centroid: f64,
    /// Normalized spectral entropy, in [0, 1].
    pub spectral_entropy: f64,
    /// Total set-bit count over the raw input bytes.
    pub hamming_weight: u64,
    /// 1 − hammingWeight / totalBits, in [0, 1].
    pub sparsity_ratio: f64,

    pub power_watts: f64,
    pub temperature_c: f64,
    pub net_latency_ms: f64,
    pub net_bandwidth_mbps: f64,
    pub io_throughput_mbps: f64,
    pub quality_score: f64,
}

impl DataProfile {
    /// Zeroed data features over a given environment.
    pub fn with_environment(status: DeviceStatus) -> Self {
        Self {
            amplitude_flux: 0.0,
            spectral_centroid: 0.0,
            spectral_entropy: 0.0,
            hamming_weight: 0,
            sparsity_ratio: 0.0,
            power_watts: status.current_watts,
            temperature_c: status.current_temp_c,
            net_latency_ms: status.latency_ms,
            net_bandwidth_mbps: status.bandwidth_mbps,
            io_throughput_mbps: status.throughput_mbps,
            quality_score: status.score,
        }
    }
}

impl Default for DataProfile {
    fn default() -> Self {
        Self::with_environment(DeviceStatus::fallback())
    }
}

/// A task's type tag paired with its data profile; everything the planner
/// needs to rank candidate strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedContext {
    pub task_type: String,
    pub profile: DataProfile,
}
