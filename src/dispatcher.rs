//! The top-level dispatcher: wires the cognitive loop together per task.

use fluxdispatch_executor::{PerformanceRecord, PlanExecutor};
use fluxdispatch_feedback::{FeedbackLoop, LearningContext};
use fluxdispatch_fusion::FusionEngine;
use fluxdispatch_kernels::beliefs::{HardwareProfile, SharedProfile};
use fluxdispatch_kernels::error::{DispatchError, Result};
use fluxdispatch_kernels::plan::ExecutionPlan;
use fluxdispatch_kernels::registry::{KernelRegistry, SharedRegistry};
use fluxdispatch_kernels::task::{KernelSpec, Task};
use fluxdispatch_profiler::DataProfiler;
use std::path::Path;
use tracing::{info, warn};

/// The dispatcher runtime: one instance per worker.
///
/// A single task runs Profile → Predict → Execute → Learn → Record in
/// strict sequence on the calling thread. Concurrent tasks belong on
/// independent environments; the belief store and registry they would
/// share are already behind reader/writer locks.
pub struct DispatchEnvironment {
    profile: SharedProfile,
    registry: SharedRegistry,
    profiler: DataProfiler,
    planner: fluxdispatch_planner::Planner,
    executor: PlanExecutor,
    feedback: FeedbackLoop,
    fusion: FusionEngine,
    last_record: PerformanceRecord,
    last_plan: Option<ExecutionPlan>,
    last_context: Option<LearningContext>,
}

impl DispatchEnvironment {
    pub fn new() -> Self {
        let profile = HardwareProfile::shared_seeded();
        let registry = KernelRegistry::shared_with_defaults();
        info!("dispatch environment online");
        Self {
            profiler: DataProfiler::new(),
            planner: fluxdispatch_planner::Planner::new(profile.clone()),
            executor: PlanExecutor::new(registry.clone()),
            feedback: FeedbackLoop::new(profile.clone()),
            fusion: FusionEngine::new(registry.clone(), profile.clone()),
            profile,
            registry,
            last_record: PerformanceRecord::default(),
            last_plan: None,
            last_context: None,
        }
    }

    /// Run the full loop for one task. On error the task is aborted:
    /// beliefs and plan history are left untouched.
    pub fn execute(&mut self, task: &mut Task) -> Result<()> {
        validate_task(task)?;

        let context = self.profiler.analyze(task);
        let candidates = self.planner.candidates(&context)?;

        let mut explored = false;
        let chosen = if self.feedback.should_explore() {
            if candidates.len() > 1 {
                explored = true;
                info!(
                    task_id = task.id,
                    suboptimal = %candidates[1].path_name,
                    optimal = %candidates[0].path_name,
                    "exploration: choosing suboptimal plan"
                );
                candidates[1].clone()
            } else {
                info!(task_id = task.id, "exploration desired but no alternative path");
                candidates[0].clone()
            }
        } else {
            candidates[0].clone()
        };

        let record = self.executor.execute(&chosen, task)?;
        self.last_record = record.clone();

        let learning = learning_context(&chosen, &task.op, explored);
        self.feedback
            .learn(&learning, chosen.predicted_flux, &record);
        self.fusion.record_executed_plan(&chosen);

        self.last_plan = Some(chosen);
        self.last_context = Some(learning);
        Ok(())
    }

    /// Most recent performance record; empty before any task has run.
    pub fn last_performance_record(&self) -> &PerformanceRecord {
        &self.last_record
    }

    /// Deterministic dump of the current beliefs.
    pub fn beliefs_report(&self) -> String {
        self.profile.read().report()
    }

    pub fn print_beliefs(&self) {
        print!("{}", self.beliefs_report());
    }

    pub fn save_beliefs(&self, path: &Path) -> Result<()> {
        self.profile.read().save_to_file(path)
    }

    pub fn load_beliefs(&self, path: &Path) -> Result<()> {
        let loaded = HardwareProfile::load_from_file(path)?;
        *self.profile.write() = loaded;
        Ok(())
    }

    // White-box accessors for inspection and tests.

    pub fn profile_handle(&self) -> SharedProfile {
        self.profile.clone()
    }

    pub fn registry_handle(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn profiler(&self) -> &DataProfiler {
        &self.profiler
    }

    pub fn planner(&self) -> &fluxdispatch_planner::Planner {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut fluxdispatch_planner::Planner {
        &mut self.planner
    }

    pub fn executor_mut(&mut self) -> &mut PlanExecutor {
        &mut self.executor
    }

    pub fn feedback_mut(&mut self) -> &mut FeedbackLoop {
        &mut self.feedback
    }

    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    pub fn last_plan(&self) -> Option<&ExecutionPlan> {
        self.last_plan.as_ref()
    }

    pub fn last_learning_context(&self) -> Option<&LearningContext> {
        self.last_context.as_ref()
    }
}

impl Default for DispatchEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Intake validation: cheap structural checks before any work is spent.
fn validate_task(task: &Task) -> Result<()> {
    if task.op.is_empty() {
        return Err(DispatchError::TaskRejected("empty task type".into()));
    }
    if let KernelSpec::OpaqueBinary { blob } = &task.kernel {
        if blob.is_empty() {
            warn!(task_id = task.id, "opaque kernel module with empty blob");
            return Err(DispatchError::TaskRejected(
                "opaque kernel module is empty".into(),
            ));
        }
    }
    if task.num_elements > 0 && task.output.is_empty() {
        return Err(DispatchError::TaskRejected(
            "output buffer required when element count is non-zero".into(),
        ));
    }
    Ok(())
}

/// Map an executed plan back to the belief entries it may blame.
fn learning_context(plan: &ExecutionPlan, task_type: &str, explored: bool) -> LearningContext {
    let mut ctx = LearningContext {
        path_name: plan.path_name.clone(),
        ..Default::default()
    };
    if explored {
        ctx.path_name.push_str(" (Exploratory)");
    }

    let mut transform_focused = false;
    if plan.path_name.contains("FFT") {
        ctx.transform_key = Some("TRANSFORM_TIME_TO_FREQ".into());
        transform_focused = true;
    } else if plan.path_name.contains("JIT Compiled SAXPY") {
        ctx.transform_key = Some("TRANSFORM_JIT_COMPILE_SAXPY".into());
        ctx.main_operation = Some("EXECUTE_JIT_SAXPY".into());
        ctx.sensitivity_key = Some("lambda_SAXPY_generic".into());
        transform_focused = true;
    }

    if !transform_focused || ctx.main_operation.is_some() {
        match task_type {
            "CONVOLUTION" if !transform_focused => {
                ctx.main_operation = Some("CONV_DIRECT".into());
                ctx.sensitivity_key = Some("lambda_Conv_Amp".into());
            }
            "GEMM" => {
                ctx.main_operation = plan
                    .steps
                    .iter()
                    .find(|s| s.op == "GEMM_NAIVE" || s.op == "GEMM_FLUX_ADAPTIVE")
                    .map(|s| s.op.clone());
                ctx.sensitivity_key = Some("lambda_Sparsity".into());
            }
            "SAXPY" if !transform_focused => {
                ctx.main_operation = Some("SAXPY_STANDARD".into());
                ctx.sensitivity_key = Some("lambda_SAXPY_generic".into());
            }
            _ => {}
        }
    }

    ctx
}
