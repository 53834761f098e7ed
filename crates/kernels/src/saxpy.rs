//! SAXPY kernels: the standard registry entry plus the sparse/dense
//! specializations handed out by the JIT engine.

use crate::error::{DispatchError, Result};
use crate::hamming::popcount_f32;
use crate::plan::PlanStep;
use crate::registry::Kernel;
use crate::report::FluxReport;
use crate::task::{Task, TaskParams};
use tracing::debug;

/// y ← a·x + y over the dense range.
pub fn saxpy_dense(a: f32, x: &[f32], y: &mut [f32]) {
    for (yi, xi) in y.iter_mut().zip(x.iter()) {
        *yi = a * *xi + *yi;
    }
}

/// y ← a·x + y skipping zero x entries. Cheaper on sparse inputs; the
/// arithmetic result is identical.
pub fn saxpy_sparse(a: f32, x: &[f32], y: &mut [f32]) {
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        if xi != 0.0 {
            *yi = a * xi + *yi;
        }
    }
}

/// Standard SAXPY registry kernel. Input A is x; the output buffer is y and
/// is updated in place.
pub struct SaxpyStandard;

impl Kernel for SaxpyStandard {
    fn name(&self) -> &str {
        "SAXPY_STANDARD"
    }

    fn run(&self, task: &mut Task, _step: &PlanStep) -> Result<FluxReport> {
        let a = match task.params {
            TaskParams::Saxpy { a } => a,
            _ => 1.0,
        };
        let n = task.num_elements;
        let x = task
            .input_a
            .as_f32()
            .ok_or_else(|| DispatchError::TaskRejected("SAXPY_STANDARD expects f32 input".into()))?;
        let y = task
            .output
            .as_f32_mut()
            .ok_or_else(|| DispatchError::TaskRejected("SAXPY_STANDARD expects f32 output".into()))?;
        if n == 0 || x.len() < n || y.len() < n {
            return Err(DispatchError::TaskRejected(format!(
                "SAXPY_STANDARD needs {n} elements, have x={} y={}",
                x.len(),
                y.len()
            )));
        }

        let mut report = FluxReport::default();
        report.hw_in_cost = popcount_f32(&x[..n]) + popcount_f32(&y[..n]);

        if a == 0.0 {
            // alpha of zero makes the whole operation a no-op.
            debug!(task_id = task.id, "saxpy skipped: alpha is zero");
        } else {
            saxpy_dense(a, &x[..n], &mut y[..n]);
        }

        report.hw_out_cost = popcount_f32(&y[..n]);
        report.cycle_cost = n as u64 * 2;
        Ok(report)
    }
}
