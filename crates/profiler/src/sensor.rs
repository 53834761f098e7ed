//! Environmental sensor interface.
//!
//! The dispatcher treats environment data as advisory: a missing device,
//! field or transport simply falls back to the documented defaults and a
//! failure counter, never an error.

use serde::{Deserialize, Serialize};

pub const DEFAULT_POWER_WATTS: f64 = 75.5;
pub const DEFAULT_TEMP_C: f64 = 65.2;
pub const DEFAULT_LATENCY_MS: f64 = 15.3;
pub const DEFAULT_BANDWIDTH_MBPS: f64 = 980.0;
pub const DEFAULT_IO_THROUGHPUT_MBPS: f64 = 250.0;
pub const DEFAULT_QUALITY_SCORE: f64 = 0.95;

/// One environmental reading as reported by a device endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub current_watts: f64,
    pub current_temp_c: f64,
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
    pub throughput_mbps: f64,
    pub score: f64,
}

impl DeviceStatus {
    /// Documented defaults used whenever the sensor is unavailable.
    pub fn fallback() -> Self {
        Self {
            current_watts: DEFAULT_POWER_WATTS,
            current_temp_c: DEFAULT_TEMP_C,
            latency_ms: DEFAULT_LATENCY_MS,
            bandwidth_mbps: DEFAULT_BANDWIDTH_MBPS,
            throughput_mbps: DEFAULT_IO_THROUGHPUT_MBPS,
            score: DEFAULT_QUALITY_SCORE,
        }
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Pluggable sensor client. Returning `None` means the device (or the
/// whole transport) is unavailable.
pub trait SensorProbe: Send + Sync {
    fn device_status(&self, device_id: &str) -> Option<DeviceStatus>;
}

/// Probe with no backing transport; always unavailable.
#[derive(Debug, Default)]
pub struct NullProbe;

impl SensorProbe for NullProbe {
    fn device_status(&self, _device_id: &str) -> Option<DeviceStatus> {
        None
    }
}

/// Probe that always reports a fixed record. Useful in tests and for
/// pinning an environment in benchmarks.
#[derive(Debug)]
pub struct StaticProbe {
    status: DeviceStatus,
}

impl StaticProbe {
    pub fn new(status: DeviceStatus) -> Self {
        Self { status }
    }
}

impl SensorProbe for StaticProbe {
    fn device_status(&self, _device_id: &str) -> Option<DeviceStatus> {
        Some(self.status)
    }
}
