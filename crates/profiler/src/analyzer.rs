//! The data profiler: pure feature extraction over a task's input payload.

use crate::profile::{DataProfile, EnrichedContext};
use crate::sensor::{DeviceStatus, NullProbe, SensorProbe};
use fluxdispatch_kernels::hamming::buffer_hamming;
use fluxdispatch_kernels::spectral::magnitude_bins;
use fluxdispatch_kernels::task::Task;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const MAGNITUDE_EPSILON: f64 = 1e-9;

/// Profiles task data before planning. Analysis never fails: degenerate
/// inputs and sensor outages degrade to zeroed features and defaults,
/// counted rather than propagated.
pub struct DataProfiler {
    probe: Box<dyn SensorProbe>,
    device_id: String,
    override_next: Mutex<Option<DeviceStatus>>,
    sensor_failures: AtomicU64,
}

impl DataProfiler {
    pub fn new() -> Self {
        Self::with_probe(Box::new(NullProbe), "local-node")
    }

    pub fn with_probe(probe: Box<dyn SensorProbe>, device_id: impl Into<String>) -> Self {
        Self {
            probe,
            device_id: device_id.into(),
            override_next: Mutex::new(None),
            sensor_failures: AtomicU64::new(0),
        }
    }

    /// Inject an exact environmental record for the next `analyze` call
    /// only; consumed on use.
    pub fn override_next_status(&self, status: DeviceStatus) {
        *self.override_next.lock() = Some(status);
    }

    /// Number of sensor reads that fell back to defaults.
    pub fn sensor_failures(&self) -> u64 {
        self.sensor_failures.load(Ordering::Relaxed)
    }

    pub fn analyze(&self, task: &Task) -> EnrichedContext {
        let mut profile = DataProfile::with_environment(self.environment());

        let bytes = task.input_a.as_bytes();
        if !bytes.is_empty() {
            profile.hamming_weight = buffer_hamming(&task.input_a);
            profile.sparsity_ratio =
                1.0 - profile.hamming_weight as f64 / (8.0 * bytes.len() as f64);
        }

        if let Some(view) = task.input_a.real_view() {
            let n = task.num_elements.min(view.len());
            let samples = &view[..n];
            profile.amplitude_flux = amplitude_flux(samples);
            let (centroid, entropy) = spectral_features(samples);
            profile.spectral_centroid = centroid;
            profile.spectral_entropy = entropy;
        }

        debug!(
            task_id = task.id,
            task_type = %task.op,
            amplitude_flux = profile.amplitude_flux,
            spectral_centroid = profile.spectral_centroid,
            spectral_entropy = profile.spectral_entropy,
            hamming_weight = profile.hamming_weight,
            sparsity = profile.sparsity_ratio,
            "profiled task data"
        );

        EnrichedContext {
            task_type: task.op.clone(),
            profile,
        }
    }

    fn environment(&self) -> DeviceStatus {
        if let Some(forced) = self.override_next.lock().take() {
            return forced;
        }
        match self.probe.device_status(&self.device_id) {
            Some(status) => status,
            None => {
                self.sensor_failures.fetch_add(1, Ordering::Relaxed);
                debug!(device_id = %self.device_id, "sensor unavailable, using defaults");
                DeviceStatus::fallback()
            }
        }
    }
}

impl Default for DataProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean absolute successive difference; zero for fewer than two samples.
fn amplitude_flux(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let sum: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    sum / (samples.len() - 1) as f64
}

/// Spectral centroid and normalized entropy over the half-spectrum.
/// Both zero when the magnitude mass is (numerically) empty.
fn spectral_features(samples: &[f64]) -> (f64, f64) {
    let n = samples.len();
    if n < 2 {
        return (0.0, 0.0);
    }
    let bins = magnitude_bins(samples);
    let total: f64 = bins.iter().sum();
    if total < MAGNITUDE_EPSILON {
        return (0.0, 0.0);
    }

    let centroid = bins
        .iter()
        .enumerate()
        .map(|(k, &mag)| (k as f64 / n as f64) * mag)
        .sum::<f64>()
        / total;

    let mut entropy = 0.0;
    for &mag in &bins {
        let p = mag / total;
        if p > MAGNITUDE_EPSILON {
            entropy -= p * p.log2();
        }
    }
    let entropy = if bins.len() > 1 {
        entropy / (bins.len() as f64).log2()
    } else {
        0.0
    };

    (centroid, entropy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::StaticProbe;
    use fluxdispatch_kernels::task::Buffer;

    fn f64_task(data: Vec<f64>) -> Task {
        let n = data.len();
        Task::new(1, "CONVOLUTION", Buffer::F64(data), Buffer::F64(vec![0.0; n]))
    }

    #[test]
    fn test_amplitude_flux() {
        assert_eq!(amplitude_flux(&[]), 0.0);
        assert_eq!(amplitude_flux(&[3.0]), 0.0);
        // |2-1| + |0-2| + |4-0| = 7 over 3 gaps
        assert!((amplitude_flux(&[1.0, 2.0, 0.0, 4.0]) - 7.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hamming_and_sparsity() {
        let task = Task::new(
            1,
            "TEST_HW_CALC",
            Buffer::Bytes(vec![0x01, 0xF0, 0x03, 0xFF]),
            Buffer::Bytes(vec![0]),
        );
        let ctx = DataProfiler::new().analyze(&task);
        assert_eq!(ctx.profile.hamming_weight, 15);
        assert!((ctx.profile.sparsity_ratio - (1.0 - 15.0 / 32.0)).abs() < 1e-12);
    }

    #[test]
    fn test_sparsity_stays_in_unit_interval() {
        for data in [vec![0u8; 16], vec![0xFF; 16], (0..64).collect::<Vec<u8>>()] {
            let task = Task::new(1, "T", Buffer::Bytes(data), Buffer::Bytes(vec![0]));
            let s = DataProfiler::new().analyze(&task).profile.sparsity_ratio;
            assert!((0.0..=1.0).contains(&s), "sparsity {s} out of range");
        }
    }

    #[test]
    fn test_constant_signal_has_zero_flux_and_entropy() {
        let ctx = DataProfiler::new().analyze(&f64_task(vec![5.0; 16]));
        assert_eq!(ctx.profile.amplitude_flux, 0.0);
        // All mass in the DC bin.
        assert_eq!(ctx.profile.spectral_centroid, 0.0);
        assert!(ctx.profile.spectral_entropy.abs() < 1e-9);
    }

    #[test]
    fn test_alternating_signal_has_high_centroid_flux() {
        let data: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let ctx = DataProfiler::new().analyze(&f64_task(data));
        assert!(ctx.profile.amplitude_flux > 1.9);
        // Nyquist-dominated spectrum.
        assert!(ctx.profile.spectral_centroid > 0.4);
        assert!(ctx.profile.spectral_entropy >= 0.0 && ctx.profile.spectral_entropy <= 1.0);
    }

    #[test]
    fn test_empty_input_uses_defaults() {
        let task = Task::new(1, "T", Buffer::F64(vec![]), Buffer::F64(vec![]));
        let ctx = DataProfiler::new().analyze(&task);
        assert_eq!(ctx.profile, DataProfile::default());
    }

    #[test]
    fn test_sensor_failure_counted() {
        let profiler = DataProfiler::new();
        profiler.analyze(&f64_task(vec![1.0, 2.0]));
        profiler.analyze(&f64_task(vec![1.0, 2.0]));
        assert_eq!(profiler.sensor_failures(), 2);
    }

    #[test]
    fn test_probe_and_one_shot_override() {
        let status = DeviceStatus {
            current_temp_c: 90.0,
            ..DeviceStatus::fallback()
        };
        let profiler = DataProfiler::with_probe(Box::new(StaticProbe::new(status)), "edge-7");
        let ctx = profiler.analyze(&f64_task(vec![1.0, 2.0]));
        assert_eq!(ctx.profile.temperature_c, 90.0);
        assert_eq!(profiler.sensor_failures(), 0);

        profiler.override_next_status(DeviceStatus {
            score: 0.1,
            ..DeviceStatus::fallback()
        });
        let forced = profiler.analyze(&f64_task(vec![1.0, 2.0]));
        assert_eq!(forced.profile.quality_score, 0.1);
        // Consumed: the probe answers again.
        let after = profiler.analyze(&f64_task(vec![1.0, 2.0]));
        assert_eq!(after.profile.quality_score, 0.95);
    }
}
