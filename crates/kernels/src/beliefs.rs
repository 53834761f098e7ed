//! The mutable belief store: learned cost model of the hardware.

use crate::error::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Shared handle with one exclusive writer at a time.
pub type SharedProfile = Arc<RwLock<HardwareProfile>>;

/// The hardware's known performance characteristics.
///
/// Three flat maps from operation name to scalar belief. The planner reads
/// them to predict plan cost; the feedback loop and the fusion engine are
/// the only writers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Base cost of an operation on "silent" data.
    pub base_operational_costs: BTreeMap<String, f64>,
    /// Fixed cost of changing data representation (e.g. an FFT).
    pub transform_costs: BTreeMap<String, f64>,
    /// Learnable lambdas relating profile features to per-operation cost.
    pub flux_sensitivities: BTreeMap<String, f64>,
}

impl HardwareProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline beliefs. These would normally come from a calibration run;
    /// the constants are conceptual generic-CPU costs.
    pub fn seeded() -> Self {
        let mut p = Self::default();

        p.base_operational_costs.insert("CONV_DIRECT".into(), 200.0);
        p.base_operational_costs
            .insert("ELEMENT_WISE_MULTIPLY".into(), 50.0);
        p.base_operational_costs.insert("GEMM_NAIVE".into(), 500.0);
        p.base_operational_costs
            .insert("GEMM_FLUX_ADAPTIVE".into(), 450.0);
        p.base_operational_costs
            .insert("SAXPY_STANDARD".into(), 100.0);
        p.base_operational_costs
            .insert("EXECUTE_JIT_SAXPY".into(), 70.0);

        p.transform_costs.insert("FFT_FORWARD".into(), 300.0);
        p.transform_costs.insert("FFT_INVERSE".into(), 280.0);
        p.transform_costs.insert("JIT_COMPILE_SAXPY".into(), 1000.0);
        p.transform_costs
            .insert("TRANSFORM_TIME_TO_FREQ".into(), 200_000.0);
        p.transform_costs
            .insert("TRANSFORM_JIT_COMPILE_SAXPY".into(), 75_000.0);

        p.flux_sensitivities.insert("lambda_Conv_Amp".into(), 1.0);
        p.flux_sensitivities.insert("lambda_Conv_Freq".into(), 0.8);
        p.flux_sensitivities.insert("lambda_Sparsity".into(), 150.0);
        p.flux_sensitivities
            .insert("lambda_SAXPY_generic".into(), 0.5);

        // Per-operation Hamming-weight sensitivities.
        p.flux_sensitivities
            .insert("SAXPY_STANDARD_lambda_hw_combined".into(), 0.1);
        p.flux_sensitivities
            .insert("EXECUTE_JIT_SAXPY_lambda_hw_combined".into(), 0.05);
        p.flux_sensitivities
            .insert("GEMM_NAIVE_lambda_hw_combined".into(), 0.2);
        p.flux_sensitivities
            .insert("GEMM_FLUX_ADAPTIVE_lambda_hw_combined".into(), 0.15);
        p.flux_sensitivities
            .insert("CONV_DIRECT_lambda_hw_combined".into(), 0.25);

        p
    }

    pub fn shared_seeded() -> SharedProfile {
        Arc::new(RwLock::new(Self::seeded()))
    }

    pub fn base_cost(&self, op: &str) -> Option<f64> {
        self.base_operational_costs.get(op).copied()
    }

    pub fn transform_cost(&self, op: &str) -> Option<f64> {
        self.transform_costs.get(op).copied()
    }

    /// Missing sensitivities contribute zero rather than failing.
    pub fn sensitivity_or_zero(&self, key: &str) -> f64 {
        self.flux_sensitivities.get(key).copied().unwrap_or(0.0)
    }

    /// Cost entries never fall below 1.0 after an update.
    pub fn clamp_cost(value: f64) -> f64 {
        value.max(1.0)
    }

    /// Sensitivities never go negative.
    pub fn clamp_sensitivity(value: f64) -> f64 {
        value.max(0.0)
    }

    /// Deterministic key/value dump of all three blocks. A pure view: two
    /// consecutive calls produce identical output.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "===== Current Beliefs (Hardware Profile) =====");
        let _ = writeln!(out, "base_operational_costs:");
        for (op, cost) in &self.base_operational_costs {
            let _ = writeln!(out, "  - {op}: {cost}");
        }
        let _ = writeln!(out, "transform_costs:");
        for (op, cost) in &self.transform_costs {
            let _ = writeln!(out, "  - {op}: {cost}");
        }
        let _ = writeln!(out, "flux_sensitivities:");
        for (key, value) in &self.flux_sensitivities {
            let _ = writeln!(out, "  - {key}: {value}");
        }
        let _ = writeln!(out, "==============================================");
        out
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read(path)?;
        let profile = serde_json::from_slice(&data)?;
        Ok(profile)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec_pretty(self)?;
        fs::write(path, blob)?;
        Ok(())
    }
}
