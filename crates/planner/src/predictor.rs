//! The predictive core: flux cost simulation against the belief store.

use crate::strategy::{builtin_candidates, PlanStrategy};
use fluxdispatch_kernels::beliefs::{HardwareProfile, SharedProfile};
use fluxdispatch_kernels::error::{DispatchError, Result};
use fluxdispatch_kernels::plan::ExecutionPlan;
use fluxdispatch_profiler::{DataProfile, EnrichedContext};
use tracing::{debug, info};

/// Generates candidate plans for a task and ranks them by predicted
/// holistic flux, cheapest first.
pub struct Planner {
    profile: SharedProfile,
    llm_strategy: Option<Box<dyn PlanStrategy>>,
    llm_enabled: bool,
}

impl Planner {
    pub fn new(profile: SharedProfile) -> Self {
        Self {
            profile,
            llm_strategy: None,
            llm_enabled: false,
        }
    }

    pub fn with_llm_strategy(mut self, strategy: Box<dyn PlanStrategy>) -> Self {
        self.llm_strategy = Some(strategy);
        self
    }

    pub fn set_llm_enabled(&mut self, enabled: bool) {
        self.llm_enabled = enabled;
    }

    /// Candidate plans with predicted cost filled, ascending. Ties keep
    /// generation order. An empty candidate set is an error the dispatcher
    /// turns into a task abort.
    pub fn candidates(&self, context: &EnrichedContext) -> Result<Vec<ExecutionPlan>> {
        let mut plans = Vec::new();

        if self.llm_enabled {
            if let Some(strategy) = &self.llm_strategy {
                plans = strategy.propose(context);
                if plans.is_empty() {
                    debug!(
                        strategy = strategy.name(),
                        task_type = %context.task_type,
                        "plan strategy returned nothing, falling back to builtin table"
                    );
                }
            }
        }
        if plans.is_empty() {
            plans = builtin_candidates(&context.task_type);
        }
        if plans.is_empty() {
            return Err(DispatchError::NoCandidatePlan(context.task_type.clone()));
        }

        {
            let beliefs = self.profile.read();
            for plan in &mut plans {
                plan.predicted_flux = predict_flux(&beliefs, plan, &context.profile);
                debug!(
                    path = %plan.path_name,
                    predicted_flux = plan.predicted_flux,
                    "simulated candidate"
                );
            }
        }

        plans.sort_by(|a, b| {
            a.predicted_flux
                .partial_cmp(&b.predicted_flux)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        info!(
            task_type = %context.task_type,
            best = %plans[0].path_name,
            predicted_flux = plans[0].predicted_flux,
            "ranked candidate plans"
        );
        Ok(plans)
    }

    pub fn profile_handle(&self) -> SharedProfile {
        self.profile.clone()
    }
}

/// Holistic flux of a plan: per-step transform and base costs plus the
/// data-dependent dynamic term, all scaled by the environment multiplier.
pub fn predict_flux(beliefs: &HardwareProfile, plan: &ExecutionPlan, data: &DataProfile) -> f64 {
    let mut total = 0.0;

    for step in &plan.steps {
        if let Some(cost) = beliefs.transform_cost(&step.op) {
            total += cost;
        }
        if let Some(base) = beliefs.base_cost(&step.op) {
            total += base + dynamic_cost(beliefs, &step.op, data);
        }
    }

    total * environment_multiplier(data, plan)
}

/// The f(profile, λ) term translating data complexity into cost for one
/// base operation. Missing sensitivities contribute zero.
fn dynamic_cost(beliefs: &HardwareProfile, op: &str, data: &DataProfile) -> f64 {
    let shape_term = match op {
        "CONV_DIRECT" => {
            data.amplitude_flux * beliefs.sensitivity_or_zero("lambda_Conv_Amp")
                + data.spectral_centroid * beliefs.sensitivity_or_zero("lambda_Conv_Freq")
        }
        "GEMM_NAIVE" | "GEMM_FLUX_ADAPTIVE" => {
            (1.0 - data.sparsity_ratio) * beliefs.sensitivity_or_zero("lambda_Sparsity")
        }
        "SAXPY_STANDARD" => {
            data.amplitude_flux * beliefs.sensitivity_or_zero("lambda_SAXPY_generic")
        }
        "EXECUTE_JIT_SAXPY" => {
            data.amplitude_flux * beliefs.sensitivity_or_zero("lambda_SAXPY_generic") * 0.5
        }
        _ => 0.0,
    };

    let hw_key = format!("{op}_lambda_hw_combined");
    shape_term + data.hamming_weight as f64 * beliefs.sensitivity_or_zero(&hw_key)
}

/// Environmental scaling applied to a plan's subtotal.
fn environment_multiplier(data: &DataProfile, plan: &ExecutionPlan) -> f64 {
    let mut multiplier = 1.0;

    if data.temperature_c > 85.0 {
        multiplier *= 1.5;
    }
    if data.power_watts > 100.0 {
        multiplier *= 1.0 + 0.005 * (data.power_watts - 100.0);
    }
    if data.net_latency_ms > 100.0
        && plan
            .steps
            .iter()
            .any(|s| s.op.starts_with("NETWORK_") || s.op.starts_with("REMOTE_"))
    {
        multiplier *= 1.2;
    }
    if data.io_throughput_mbps > 0.0
        && data.io_throughput_mbps < 50.0
        && plan
            .steps
            .iter()
            .any(|s| s.op.starts_with("DISK_") || s.op.starts_with("LOAD_"))
    {
        multiplier *= 1.15;
    }

    let q = data.quality_score;
    if q <= 0.0 {
        multiplier *= 10.0;
    } else if q < 1.0 {
        multiplier /= q;
    }

    multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxdispatch_kernels::plan::PlanStep;

    fn clean_environment(data: &mut DataProfile) {
        data.quality_score = 1.0;
        data.power_watts = 50.0;
        data.temperature_c = 40.0;
        data.net_latency_ms = 5.0;
        data.io_throughput_mbps = 500.0;
    }

    fn context(task_type: &str, data: DataProfile) -> EnrichedContext {
        EnrichedContext {
            task_type: task_type.into(),
            profile: data,
        }
    }

    #[test]
    fn test_predict_sums_transform_and_base_costs() {
        let beliefs = HardwareProfile::seeded();
        let mut data = DataProfile::default();
        clean_environment(&mut data);

        let plan = ExecutionPlan::new(
            "Frequency Domain (FFT)",
            vec![
                PlanStep::new("FFT_FORWARD", "input", "temp_freq"),
                PlanStep::new("ELEMENT_WISE_MULTIPLY", "temp_freq", "temp_result"),
                PlanStep::new("FFT_INVERSE", "temp_result", "output"),
            ],
        );
        // 300 + 50 + 280, no dynamic term for any of the three.
        assert!((predict_flux(&beliefs, &plan, &data) - 630.0).abs() < 1e-9);
    }

    #[test]
    fn test_dynamic_term_scales_with_amplitude_flux() {
        let beliefs = HardwareProfile::seeded();
        let mut data = DataProfile::default();
        clean_environment(&mut data);
        let plan = ExecutionPlan::new(
            "Time Domain (Direct)",
            vec![PlanStep::new("CONV_DIRECT", "input", "output")],
        );

        let quiet = predict_flux(&beliefs, &plan, &data);
        data.amplitude_flux = 50.0;
        let spiky = predict_flux(&beliefs, &plan, &data);
        assert!((spiky - quiet - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_hamming_term_raises_prediction() {
        let beliefs = HardwareProfile::seeded();
        let mut low = DataProfile::default();
        clean_environment(&mut low);
        let mut high = low.clone();
        low.hamming_weight = 1;
        high.hamming_weight = 64;

        let plan = ExecutionPlan::new(
            "Standard SAXPY",
            vec![PlanStep::new("SAXPY_STANDARD", "input", "output")],
        );
        assert!(predict_flux(&beliefs, &plan, &high) > predict_flux(&beliefs, &plan, &low));
    }

    #[test]
    fn test_missing_lambda_contributes_zero() {
        let mut beliefs = HardwareProfile::seeded();
        beliefs.flux_sensitivities.clear();
        let mut data = DataProfile::default();
        clean_environment(&mut data);
        data.amplitude_flux = 100.0;
        data.hamming_weight = 1000;

        let plan = ExecutionPlan::new(
            "Time Domain (Direct)",
            vec![PlanStep::new("CONV_DIRECT", "input", "output")],
        );
        assert!((predict_flux(&beliefs, &plan, &data) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_environment_multipliers() {
        let beliefs = HardwareProfile::seeded();
        let plan = ExecutionPlan::new(
            "Naive GEMM",
            vec![PlanStep::new("GEMM_NAIVE", "input", "output")],
        );
        let mut data = DataProfile::default();
        clean_environment(&mut data);
        data.sparsity_ratio = 1.0;
        let baseline = predict_flux(&beliefs, &plan, &data);

        let mut hot = data.clone();
        hot.temperature_c = 90.0;
        assert!((predict_flux(&beliefs, &plan, &hot) - baseline * 1.5).abs() < 1e-9);

        let mut hungry = data.clone();
        hungry.power_watts = 140.0;
        assert!((predict_flux(&beliefs, &plan, &hungry) - baseline * 1.2).abs() < 1e-9);

        let mut degraded = data.clone();
        degraded.quality_score = 0.5;
        assert!((predict_flux(&beliefs, &plan, &degraded) - baseline * 2.0).abs() < 1e-9);

        let mut dead = data.clone();
        dead.quality_score = 0.0;
        assert!((predict_flux(&beliefs, &plan, &dead) - baseline * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_latency_multiplier_needs_network_step() {
        let beliefs = HardwareProfile::seeded();
        let mut data = DataProfile::default();
        clean_environment(&mut data);
        data.net_latency_ms = 250.0;
        data.sparsity_ratio = 1.0;

        let local = ExecutionPlan::new(
            "Naive GEMM",
            vec![PlanStep::new("GEMM_NAIVE", "input", "output")],
        );
        let remote = ExecutionPlan::new(
            "Remote GEMM",
            vec![
                PlanStep::new("NETWORK_FETCH", "input", "input"),
                PlanStep::new("GEMM_NAIVE", "input", "output"),
            ],
        );
        let local_flux = predict_flux(&beliefs, &local, &data);
        // NETWORK_FETCH has no belief entries; only the multiplier differs.
        assert!((predict_flux(&beliefs, &remote, &data) - local_flux * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_sorted_ascending() {
        let planner = Planner::new(HardwareProfile::shared_seeded());
        let mut data = DataProfile::default();
        clean_environment(&mut data);
        data.sparsity_ratio = 0.0;

        let ranked = planner.candidates(&context("GEMM", data)).unwrap();
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].predicted_flux <= ranked[1].predicted_flux);
        // Dense data: the flux-adaptive path (450 + 150) beats naive (500 + 150).
        assert_eq!(ranked[0].path_name, "Flux-Adaptive GEMM");
        assert!(ranked.iter().all(|p| p.predicted_flux >= 0.0));
    }

    #[test]
    fn test_unknown_task_type_yields_no_candidate_plan() {
        let planner = Planner::new(HardwareProfile::shared_seeded());
        let err = planner
            .candidates(&context("TRANSMOGRIFY", DataProfile::default()))
            .unwrap_err();
        assert_eq!(err.code(), "NO_CANDIDATE_PLAN");
    }

    struct FixedStrategy;

    impl PlanStrategy for FixedStrategy {
        fn name(&self) -> &str {
            "fixed"
        }

        fn propose(&self, _context: &EnrichedContext) -> Vec<ExecutionPlan> {
            vec![ExecutionPlan::new(
                "Proposed Direct",
                vec![PlanStep::new("CONV_DIRECT", "input", "output")],
            )]
        }
    }

    struct EmptyStrategy;

    impl PlanStrategy for EmptyStrategy {
        fn name(&self) -> &str {
            "empty"
        }

        fn propose(&self, _context: &EnrichedContext) -> Vec<ExecutionPlan> {
            Vec::new()
        }
    }

    #[test]
    fn test_llm_strategy_used_when_enabled() {
        let mut planner = Planner::new(HardwareProfile::shared_seeded())
            .with_llm_strategy(Box::new(FixedStrategy));
        let ctx = context("CONVOLUTION", DataProfile::default());

        // Disabled: builtin table wins.
        let ranked = planner.candidates(&ctx).unwrap();
        assert_eq!(ranked.len(), 2);

        planner.set_llm_enabled(true);
        let ranked = planner.candidates(&ctx).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].path_name, "Proposed Direct");
    }

    #[test]
    fn test_empty_llm_strategy_falls_back() {
        let mut planner = Planner::new(HardwareProfile::shared_seeded())
            .with_llm_strategy(Box::new(EmptyStrategy));
        planner.set_llm_enabled(true);
        let ranked = planner
            .candidates(&context("CONVOLUTION", DataProfile::default()))
            .unwrap();
        assert_eq!(ranked.len(), 2);
    }
}
