//! Step-by-step plan execution with flux measurement.

use crate::jit::{JitSpecializer, StagedKernel};
use fluxdispatch_kernels::error::{DispatchError, Result};
use fluxdispatch_kernels::plan::ExecutionPlan;
use fluxdispatch_kernels::registry::SharedRegistry;
use fluxdispatch_kernels::report::FluxReport;
use fluxdispatch_kernels::task::Task;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// What actually happened when a plan ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub latency_ns: u64,
    pub cycle_cost: u64,
    pub hw_in_cost: u64,
    pub hw_out_cost: u64,
    /// cycle + hwIn + hwOut, the unit plans are compared in.
    pub holistic_flux: f64,
}

impl PerformanceRecord {
    fn from_flux(latency_ns: u64, flux: FluxReport) -> Self {
        Self {
            latency_ns,
            cycle_cost: flux.cycle_cost,
            hw_in_cost: flux.hw_in_cost,
            hw_out_cost: flux.hw_out_cost,
            holistic_flux: flux.total() as f64,
        }
    }
}

/// Executes a chosen plan against a task, one step at a time, through the
/// shared kernel registry. Owns the JIT specializer and the kernel it
/// stages; a staged kernel never outlives its plan execution.
pub struct PlanExecutor {
    registry: SharedRegistry,
    jit: JitSpecializer,
    staged: Option<StagedKernel>,
}

impl PlanExecutor {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            jit: JitSpecializer::new(),
            staged: None,
        }
    }

    pub fn with_jit(mut self, jit: JitSpecializer) -> Self {
        self.jit = jit;
        self
    }

    pub fn jit_mut(&mut self) -> &mut JitSpecializer {
        &mut self.jit
    }

    pub fn execute(&mut self, plan: &ExecutionPlan, task: &mut Task) -> Result<PerformanceRecord> {
        info!(
            task_id = task.id,
            path = %plan.path_name,
            steps = plan.steps.len(),
            "executing plan"
        );
        let start = Instant::now();
        self.staged = None;
        task.scratch.clear();

        let mut accumulated = FluxReport::default();
        for step in &plan.steps {
            debug!(op = %step.op, src = %step.src, dst = %step.dst, "dispatching step");
            let report = match step.op.as_str() {
                "JIT_COMPILE_SAXPY" => {
                    self.staged = Some(self.jit.compile_saxpy(task)?);
                    // Compilation itself reports no flux.
                    FluxReport::default()
                }
                "EXECUTE_JIT_SAXPY" => {
                    let kernel = self.staged.as_ref().ok_or(DispatchError::JitPrecondition)?;
                    kernel.invoke(task)?
                }
                op => {
                    let kernel = {
                        let registry = self.registry.read();
                        registry
                            .get(op)
                            .ok_or_else(|| DispatchError::KernelMissing(op.to_string()))?
                    };
                    kernel.run(task, step)?
                }
            };
            accumulated.accumulate(&report);
        }

        self.staged = None;
        let latency_ns = start.elapsed().as_nanos() as u64;
        let record = PerformanceRecord::from_flux(latency_ns, accumulated);
        info!(
            task_id = task.id,
            latency_ns = record.latency_ns,
            cycle_cost = record.cycle_cost,
            hw_in_cost = record.hw_in_cost,
            hw_out_cost = record.hw_out_cost,
            holistic_flux = record.holistic_flux,
            "execution complete"
        );
        Ok(record)
    }

    pub fn registry_handle(&self) -> SharedRegistry {
        self.registry.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxdispatch_kernels::plan::PlanStep;
    use fluxdispatch_kernels::registry::KernelRegistry;
    use fluxdispatch_kernels::task::{Buffer, TaskParams};

    fn executor() -> PlanExecutor {
        PlanExecutor::new(KernelRegistry::shared_with_defaults())
    }

    fn saxpy_plan() -> ExecutionPlan {
        ExecutionPlan::new(
            "Standard SAXPY",
            vec![PlanStep::new("SAXPY_STANDARD", "input", "output")],
        )
    }

    fn jit_plan() -> ExecutionPlan {
        ExecutionPlan::new(
            "JIT Compiled SAXPY",
            vec![
                PlanStep::new("JIT_COMPILE_SAXPY", "input", "input"),
                PlanStep::new("EXECUTE_JIT_SAXPY", "input", "output"),
            ],
        )
    }

    #[test]
    fn test_execute_standard_saxpy() {
        let mut task = Task::new(
            1,
            "SAXPY",
            Buffer::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            Buffer::F32(vec![10.0; 5]),
        )
        .with_params(TaskParams::Saxpy { a: 1.0 });

        let record = executor().execute(&saxpy_plan(), &mut task).unwrap();
        assert_eq!(task.output.as_f32().unwrap(), &[11.0, 12.0, 13.0, 14.0, 15.0]);
        assert!(record.cycle_cost >= 10);
        assert_eq!(
            record.holistic_flux,
            (record.cycle_cost + record.hw_in_cost + record.hw_out_cost) as f64
        );
    }

    #[test]
    fn test_execute_jit_pipeline() {
        let mut task = Task::new(
            2,
            "SAXPY",
            Buffer::F32(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            Buffer::F32(vec![1.0; 6]),
        )
        .with_params(TaskParams::Saxpy { a: 3.0 });

        let record = executor().execute(&jit_plan(), &mut task).unwrap();
        assert_eq!(task.output.as_f32().unwrap()[0], 4.0);
        assert_eq!(record.cycle_cost, 12);
    }

    #[test]
    fn test_jit_execute_without_compile_fails() {
        let plan = ExecutionPlan::new(
            "broken",
            vec![PlanStep::new("EXECUTE_JIT_SAXPY", "input", "output")],
        );
        let mut task = Task::new(3, "SAXPY", Buffer::F32(vec![1.0]), Buffer::F32(vec![0.0]));
        let err = executor().execute(&plan, &mut task).unwrap_err();
        assert_eq!(err.code(), "JIT_PRECONDITION");
    }

    #[test]
    fn test_staged_kernel_does_not_leak_across_plans() {
        let mut ex = executor();
        let mut task = Task::new(
            4,
            "SAXPY",
            Buffer::F32(vec![1.0, 2.0]),
            Buffer::F32(vec![0.0; 2]),
        )
        .with_params(TaskParams::Saxpy { a: 1.0 });
        ex.execute(&jit_plan(), &mut task).unwrap();

        // A bare execute step in the next plan must fail again.
        let plan = ExecutionPlan::new(
            "broken",
            vec![PlanStep::new("EXECUTE_JIT_SAXPY", "input", "output")],
        );
        let err = ex.execute(&plan, &mut task).unwrap_err();
        assert_eq!(err.code(), "JIT_PRECONDITION");
    }

    #[test]
    fn test_missing_kernel_aborts() {
        let plan = ExecutionPlan::new(
            "phantom",
            vec![PlanStep::new("WARP_DRIVE", "input", "output")],
        );
        let mut task = Task::new(5, "SAXPY", Buffer::F32(vec![1.0]), Buffer::F32(vec![0.0]));
        let err = executor().execute(&plan, &mut task).unwrap_err();
        assert_eq!(err.code(), "KERNEL_MISSING");
    }

    #[test]
    fn test_fft_convolution_plan_end_to_end() {
        let plan = ExecutionPlan::new(
            "Frequency Domain (FFT)",
            vec![
                PlanStep::new("FFT_FORWARD", "input", "temp_freq"),
                PlanStep::new("ELEMENT_WISE_MULTIPLY", "temp_freq", "temp_result"),
                PlanStep::new("FFT_INVERSE", "temp_result", "output"),
            ],
        );
        let mut task = Task::new(
            6,
            "CONVOLUTION",
            Buffer::F64(vec![1.0, 2.0, 3.0, 4.0]),
            Buffer::F64(vec![0.0; 4]),
        )
        .with_input_b(Buffer::F64(vec![1.0]));

        let record = executor().execute(&plan, &mut task).unwrap();
        let out = task.output.as_f64().unwrap();
        for (y, expected) in out.iter().zip([1.0, 2.0, 3.0, 4.0]) {
            assert!((y - expected).abs() < 1e-6);
        }
        assert!(record.cycle_cost > 0);
    }
}
