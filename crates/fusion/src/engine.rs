//! The fusion engine: periodic adjacent-pair mining over plan history.

use fluxdispatch_kernels::beliefs::SharedProfile;
use fluxdispatch_kernels::error::{DispatchError, Result};
use fluxdispatch_kernels::plan::{ExecutionPlan, PlanStep};
use fluxdispatch_kernels::registry::{Kernel, SharedRegistry};
use fluxdispatch_kernels::report::FluxReport;
use fluxdispatch_kernels::task::Task;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

/// Base cost assumed for a fusion operand missing from the profile.
const DEFAULT_OPERAND_COST: f64 = 100.0;
/// Estimated efficiency gain of a fused kernel over its two operands.
const FUSION_GAIN: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// How often an adjacent pair must appear before it is fused.
    pub fusion_threshold: usize,
    /// Analyze after every this many recorded plans.
    pub analysis_interval: u64,
    /// History ring size; overflow drops the oldest plan.
    pub history_capacity: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            fusion_threshold: 10,
            analysis_interval: 5,
            history_capacity: 256,
        }
    }
}

struct FusionState {
    history: VecDeque<ExecutionPlan>,
    recorded: u64,
}

/// Observes executed plans and installs fused kernels for frequent
/// adjacent operation pairs. Fusion is best-effort: analysis failures are
/// logged and swallowed, never surfaced to the dispatch loop.
pub struct FusionEngine {
    registry: SharedRegistry,
    profile: SharedProfile,
    config: Mutex<FusionConfig>,
    state: Mutex<FusionState>,
}

impl FusionEngine {
    pub fn new(registry: SharedRegistry, profile: SharedProfile) -> Self {
        Self::with_config(registry, profile, FusionConfig::default())
    }

    pub fn with_config(
        registry: SharedRegistry,
        profile: SharedProfile,
        config: FusionConfig,
    ) -> Self {
        Self {
            registry,
            profile,
            config: Mutex::new(config),
            state: Mutex::new(FusionState {
                history: VecDeque::with_capacity(config.history_capacity),
                recorded: 0,
            }),
        }
    }

    pub fn config(&self) -> FusionConfig {
        *self.config.lock()
    }

    pub fn set_config(&self, config: FusionConfig) {
        *self.config.lock() = config;
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn recorded_count(&self) -> u64 {
        self.state.lock().recorded
    }

    pub fn reset_counter(&self) {
        let mut state = self.state.lock();
        state.recorded = 0;
        state.history.clear();
    }

    /// Append an executed plan; every `analysis_interval` records, mine the
    /// ring for fusion candidates.
    pub fn record_executed_plan(&self, plan: &ExecutionPlan) {
        let config = self.config();
        let due = {
            let mut state = self.state.lock();
            state.history.push_back(plan.clone());
            while state.history.len() > config.history_capacity {
                state.history.pop_front();
            }
            state.recorded += 1;
            debug!(
                path = %plan.path_name,
                recorded = state.recorded,
                history = state.history.len(),
                "recorded executed plan"
            );
            config.analysis_interval > 0 && state.recorded % config.analysis_interval == 0
        };

        if due {
            if let Err(e) = self.analyze_and_fuse(&config) {
                warn!(error = %e, code = e.code(), "pattern analysis failed");
            }
        }
    }

    /// Scan history for adjacent operation pairs and fuse the frequent
    /// ones. Public so operators can force an analysis pass.
    pub fn analyze_and_fuse(&self, config: &FusionConfig) -> Result<()> {
        let counts = self.pair_counts();
        if counts.is_empty() {
            debug!("no fusable sequences in plan history");
            return Ok(());
        }

        for ((first, second), count) in counts {
            debug!(first = %first, second = %second, count, "observed adjacent pair");
            if count >= config.fusion_threshold {
                self.install_fused_kernel(&first, &second)?;
            }
        }
        Ok(())
    }

    fn pair_counts(&self) -> BTreeMap<(String, String), usize> {
        let state = self.state.lock();
        let beliefs = self.profile.read();
        let mut counts = BTreeMap::new();

        for plan in &state.history {
            for pair in plan.steps.windows(2) {
                let (a, b) = (&pair[0].op, &pair[1].op);
                if a == b {
                    continue;
                }
                // Meta-steps stage or consume transient kernels and are
                // not fusable operations.
                if is_meta_step(a) || is_meta_step(b) {
                    continue;
                }
                if beliefs.base_cost(a).is_none() || beliefs.base_cost(b).is_none() {
                    continue;
                }
                *counts.entry((a.clone(), b.clone())).or_insert(0) += 1;
            }
        }
        counts
    }

    fn install_fused_kernel(&self, first: &str, second: &str) -> Result<()> {
        let fused_name = fused_kernel_name(first, second);
        {
            let registry = self.registry.read();
            if registry.contains(&fused_name) {
                debug!(kernel = %fused_name, "fused kernel already installed");
                return Ok(());
            }
        }

        let estimated_cost = {
            let beliefs = self.profile.read();
            let cost_a = beliefs.base_cost(first).unwrap_or(DEFAULT_OPERAND_COST);
            let cost_b = beliefs.base_cost(second).unwrap_or(DEFAULT_OPERAND_COST);
            FUSION_GAIN * (cost_a + cost_b)
        };

        self.registry.write().register(FusedKernel {
            name: fused_name.clone(),
        });
        self.profile
            .write()
            .base_operational_costs
            .insert(fused_name.clone(), estimated_cost);

        info!(
            kernel = %fused_name,
            estimated_cost,
            "installed fused kernel"
        );
        Ok(())
    }
}

/// Derived name for the fusion of two operations; derivation is the
/// identity that makes installs idempotent.
pub fn fused_kernel_name(first: &str, second: &str) -> String {
    format!("FUSED_{first}_{second}")
}

fn is_meta_step(op: &str) -> bool {
    op.starts_with("JIT_") || op.starts_with("EXECUTE_")
}

/// Placeholder callable registered for a fused pair. Real code generation
/// for fused kernels would slot in here; the entry already participates in
/// cost prediction and learning.
struct FusedKernel {
    name: String,
}

impl Kernel for FusedKernel {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, task: &mut Task, _step: &PlanStep) -> std::result::Result<FluxReport, DispatchError> {
        debug!(kernel = %self.name, task_id = task.id, "executing fused kernel placeholder");
        Ok(FluxReport::default())
    }
}
