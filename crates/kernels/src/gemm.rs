//! GEMM kernels over flat row-major buffers.

use crate::error::{DispatchError, Result};
use crate::hamming::popcount_f32;
use crate::plan::PlanStep;
use crate::registry::Kernel;
use crate::report::FluxReport;
use crate::task::{Task, TaskParams};
use ndarray::ArrayView2;
use rayon::prelude::*;

struct GemmBuffers<'a> {
    a: &'a [f32],
    b: &'a [f32],
    c: &'a mut [f32],
    m: usize,
    n: usize,
    k: usize,
}

fn gemm_buffers(task: &mut Task) -> Result<GemmBuffers<'_>> {
    let (m, n, k) = match task.params {
        TaskParams::Gemm { m, n, k } => (m, n, k),
        _ => {
            return Err(DispatchError::TaskRejected(
                "GEMM requires m/n/k dimensions in the parameter bag".into(),
            ))
        }
    };
    if m == 0 || n == 0 || k == 0 {
        return Err(DispatchError::TaskRejected(
            "GEMM dimensions must be non-zero".into(),
        ));
    }
    let a = task
        .input_a
        .as_f32()
        .ok_or_else(|| DispatchError::TaskRejected("GEMM expects f32 input A".into()))?;
    let b = task
        .input_b
        .as_ref()
        .and_then(|b| b.as_f32())
        .ok_or_else(|| DispatchError::TaskRejected("GEMM expects f32 input B".into()))?;
    let c = task
        .output
        .as_f32_mut()
        .ok_or_else(|| DispatchError::TaskRejected("GEMM expects f32 output".into()))?;
    if a.len() < m * k || b.len() < k * n || c.len() < m * n {
        return Err(DispatchError::TaskRejected(format!(
            "GEMM buffer sizes too small for {m}x{n}x{k}"
        )));
    }
    Ok(GemmBuffers {
        a: &a[..m * k],
        b: &b[..k * n],
        c: &mut c[..m * n],
        m,
        n,
        k,
    })
}

/// Baseline dense GEMM, C = A·B.
pub struct GemmNaive;

impl Kernel for GemmNaive {
    fn name(&self) -> &str {
        "GEMM_NAIVE"
    }

    fn run(&self, task: &mut Task, _step: &PlanStep) -> Result<FluxReport> {
        let bufs = gemm_buffers(task)?;
        let mut report = FluxReport {
            hw_in_cost: popcount_f32(bufs.a) + popcount_f32(bufs.b),
            ..Default::default()
        };

        let a = ArrayView2::from_shape((bufs.m, bufs.k), bufs.a)
            .map_err(|e| DispatchError::TaskRejected(format!("GEMM A shape: {e}")))?;
        let b = ArrayView2::from_shape((bufs.k, bufs.n), bufs.b)
            .map_err(|e| DispatchError::TaskRejected(format!("GEMM B shape: {e}")))?;
        let product = a.dot(&b);
        for (dst, src) in bufs.c.iter_mut().zip(product.iter()) {
            *dst = *src;
        }

        report.hw_out_cost = popcount_f32(bufs.c);
        report.cycle_cost = 2 * (bufs.m * bufs.n * bufs.k) as u64;
        Ok(report)
    }
}

/// Sparsity-aware GEMM: rows computed in parallel, zero products skipped.
/// Reported cycle cost is proportional to the multiply-adds actually
/// executed, so sparse inputs observe a genuinely cheaper run.
pub struct GemmFluxAdaptive;

impl Kernel for GemmFluxAdaptive {
    fn name(&self) -> &str {
        "GEMM_FLUX_ADAPTIVE"
    }

    fn run(&self, task: &mut Task, _step: &PlanStep) -> Result<FluxReport> {
        let bufs = gemm_buffers(task)?;
        let mut report = FluxReport {
            hw_in_cost: popcount_f32(bufs.a) + popcount_f32(bufs.b),
            ..Default::default()
        };

        let (a, b, n, k) = (bufs.a, bufs.b, bufs.n, bufs.k);
        let executed: u64 = bufs
            .c
            .par_chunks_mut(n)
            .enumerate()
            .map(|(i, row)| {
                let mut madds = 0u64;
                for (j, out) in row.iter_mut().enumerate() {
                    let mut sum = 0.0f32;
                    for p in 0..k {
                        let av = a[i * k + p];
                        let bv = b[p * n + j];
                        if av != 0.0 && bv != 0.0 {
                            sum += av * bv;
                            madds += 1;
                        }
                    }
                    *out = sum;
                }
                madds
            })
            .sum();

        report.hw_out_cost = popcount_f32(bufs.c);
        report.cycle_cost = 2 * executed;
        Ok(report)
    }
}
