//! Just-in-time SAXPY specialization.
//!
//! The specializer inspects the task's data and hands back a nullary
//! kernel wrapper tuned for it: a sparse form when most of x is zero, a
//! dense form otherwise. The wrapper lives for one plan execution only;
//! the fusion layer, not the JIT, is the system's learning cache.

use fluxdispatch_kernels::error::{DispatchError, Result};
use fluxdispatch_kernels::hamming::popcount_f32;
use fluxdispatch_kernels::report::FluxReport;
use fluxdispatch_kernels::saxpy::{saxpy_dense, saxpy_sparse};
use fluxdispatch_kernels::task::{Task, TaskParams};
use tracing::{debug, warn};

/// A staged kernel produced by the specializer, invoked by the executor
/// when the plan reaches its execute step.
pub struct StagedKernel {
    label: String,
    run: Box<dyn Fn(&mut Task) -> Result<FluxReport> + Send + Sync>,
}

impl StagedKernel {
    pub fn new(
        label: impl Into<String>,
        run: Box<dyn Fn(&mut Task) -> Result<FluxReport> + Send + Sync>,
    ) -> Self {
        Self {
            label: label.into(),
            run,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn invoke(&self, task: &mut Task) -> Result<FluxReport> {
        (self.run)(task)
    }
}

/// Pluggable kernel generator (e.g. LLM code synthesis). `None` means the
/// strategy has nothing to offer and the local specializer takes over.
pub trait JitStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn synthesize(&self, task: &Task) -> Option<StagedKernel>;
}

/// Local SAXPY specializer with an optional pluggable front end.
pub struct JitSpecializer {
    strategy: Option<Box<dyn JitStrategy>>,
    strategy_enabled: bool,
}

impl JitSpecializer {
    pub fn new() -> Self {
        Self {
            strategy: None,
            strategy_enabled: false,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn JitStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn set_strategy_enabled(&mut self, enabled: bool) {
        self.strategy_enabled = enabled;
    }

    /// Build a SAXPY kernel specialized for this task's data.
    pub fn compile_saxpy(&self, task: &Task) -> Result<StagedKernel> {
        let a = match task.params {
            TaskParams::Saxpy { a } => a,
            _ => {
                warn!(
                    task_id = task.id,
                    "saxpy scalar missing from parameter bag, defaulting to 1.0"
                );
                1.0
            }
        };

        if self.strategy_enabled {
            if let Some(strategy) = &self.strategy {
                if let Some(kernel) = strategy.synthesize(task) {
                    debug!(strategy = strategy.name(), "using synthesized jit kernel");
                    return Ok(kernel);
                }
                debug!(
                    strategy = strategy.name(),
                    "jit strategy produced nothing, specializing locally"
                );
            }
        }

        let x = task
            .input_a
            .as_f32()
            .ok_or_else(|| DispatchError::TaskRejected("jit saxpy expects f32 input".into()))?;
        let zero_ratio = if x.is_empty() {
            1.0
        } else {
            x.iter().filter(|&&v| v == 0.0).count() as f64 / x.len() as f64
        };
        let sparse = zero_ratio > 0.5;
        debug!(
            task_id = task.id,
            zero_ratio,
            specialization = if sparse { "sparse" } else { "dense" },
            "compiled saxpy kernel"
        );

        Ok(Self::specialized_saxpy(a, sparse))
    }

    fn specialized_saxpy(a: f32, sparse: bool) -> StagedKernel {
        let label = if sparse { "SPARSE_SAXPY" } else { "DENSE_SAXPY" };
        StagedKernel::new(
            label,
            Box::new(move |task: &mut Task| {
                let n = task.num_elements;
                let x = task
                    .input_a
                    .as_f32()
                    .ok_or_else(|| {
                        DispatchError::TaskRejected("jit saxpy expects f32 input".into())
                    })?;
                let y = task
                    .output
                    .as_f32_mut()
                    .ok_or_else(|| {
                        DispatchError::TaskRejected("jit saxpy expects f32 output".into())
                    })?;
                if n == 0 || x.len() < n || y.len() < n {
                    return Err(DispatchError::TaskRejected(format!(
                        "jit saxpy needs {n} elements, have x={} y={}",
                        x.len(),
                        y.len()
                    )));
                }

                let mut report = FluxReport {
                    hw_in_cost: popcount_f32(&x[..n]) + popcount_f32(&y[..n]),
                    ..Default::default()
                };
                if sparse {
                    saxpy_sparse(a, &x[..n], &mut y[..n]);
                } else {
                    saxpy_dense(a, &x[..n], &mut y[..n]);
                }
                report.hw_out_cost = popcount_f32(&y[..n]);
                report.cycle_cost = n as u64 * 2;
                Ok(report)
            }),
        )
    }
}

impl Default for JitSpecializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxdispatch_kernels::task::Buffer;

    fn saxpy_task(a: Option<f32>, x: Vec<f32>, y: Vec<f32>) -> Task {
        let mut task = Task::new(9, "SAXPY", Buffer::F32(x), Buffer::F32(y));
        if let Some(a) = a {
            task = task.with_params(TaskParams::Saxpy { a });
        }
        task
    }

    #[test]
    fn test_dense_specialization_for_dense_data() {
        let jit = JitSpecializer::new();
        let task = saxpy_task(Some(2.0), vec![1.0, 2.0, 3.0, 4.0], vec![0.0; 4]);
        let kernel = jit.compile_saxpy(&task).unwrap();
        assert_eq!(kernel.label(), "DENSE_SAXPY");
    }

    #[test]
    fn test_sparse_specialization_for_sparse_data() {
        let jit = JitSpecializer::new();
        let task = saxpy_task(
            Some(2.0),
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0],
            vec![0.0; 8],
        );
        let kernel = jit.compile_saxpy(&task).unwrap();
        assert_eq!(kernel.label(), "SPARSE_SAXPY");
    }

    #[test]
    fn test_invoke_computes_saxpy_and_reports() {
        let jit = JitSpecializer::new();
        let mut task = saxpy_task(Some(2.5), vec![1.0, 2.0, 0.0, 4.0], vec![10.0; 4]);
        let kernel = jit.compile_saxpy(&task).unwrap();
        let report = kernel.invoke(&mut task).unwrap();
        assert_eq!(task.output.as_f32().unwrap(), &[12.5, 15.0, 10.0, 20.0]);
        assert_eq!(report.cycle_cost, 8);
        assert!(report.hw_in_cost > 0);
        assert!(report.hw_out_cost > 0);
    }

    #[test]
    fn test_missing_scalar_defaults_to_one() {
        let jit = JitSpecializer::new();
        let mut task = saxpy_task(None, vec![3.0, 4.0], vec![1.0, 1.0]);
        let kernel = jit.compile_saxpy(&task).unwrap();
        kernel.invoke(&mut task).unwrap();
        assert_eq!(task.output.as_f32().unwrap(), &[4.0, 5.0]);
    }

    struct CountingStrategy;

    impl JitStrategy for CountingStrategy {
        fn name(&self) -> &str {
            "counting"
        }

        fn synthesize(&self, _task: &Task) -> Option<StagedKernel> {
            Some(StagedKernel::new(
                "STRATEGY_SAXPY",
                Box::new(|_task| Ok(FluxReport::new(1, 0, 0))),
            ))
        }
    }

    struct SilentStrategy;

    impl JitStrategy for SilentStrategy {
        fn name(&self) -> &str {
            "silent"
        }

        fn synthesize(&self, _task: &Task) -> Option<StagedKernel> {
            None
        }
    }

    #[test]
    fn test_strategy_kernel_preferred_when_enabled() {
        let mut jit = JitSpecializer::new().with_strategy(Box::new(CountingStrategy));
        let task = saxpy_task(Some(1.0), vec![1.0], vec![0.0]);

        // Disabled: local specialization.
        assert_eq!(jit.compile_saxpy(&task).unwrap().label(), "DENSE_SAXPY");

        jit.set_strategy_enabled(true);
        assert_eq!(jit.compile_saxpy(&task).unwrap().label(), "STRATEGY_SAXPY");
    }

    #[test]
    fn test_silent_strategy_falls_back_to_local() {
        let mut jit = JitSpecializer::new().with_strategy(Box::new(SilentStrategy));
        jit.set_strategy_enabled(true);
        let task = saxpy_task(Some(1.0), vec![1.0], vec![0.0]);
        assert_eq!(jit.compile_saxpy(&task).unwrap().label(), "DENSE_SAXPY");
    }
}
