//! Convolution kernels: direct time-domain form and the three-step
//! frequency-domain pipeline. Both compute the circular convolution of
//! input A with the filter in input B, so the two paths agree bitwise up
//! to floating-point rounding.

use crate::error::{DispatchError, Result};
use crate::hamming::popcount_f64;
use crate::plan::PlanStep;
use crate::registry::Kernel;
use crate::report::FluxReport;
use crate::spectral;
use crate::task::Task;

fn signal(task: &Task) -> Result<Vec<f64>> {
    let view = task
        .input_a
        .real_view()
        .ok_or_else(|| DispatchError::TaskRejected("convolution expects real-valued input A".into()))?;
    let n = task.num_elements.min(view.len());
    if n == 0 {
        return Err(DispatchError::TaskRejected(
            "convolution over an empty signal".into(),
        ));
    }
    Ok(view[..n].to_vec())
}

fn filter(task: &Task) -> Result<Vec<f64>> {
    let view = task
        .input_b
        .as_ref()
        .and_then(|b| b.real_view())
        .ok_or_else(|| DispatchError::TaskRejected("convolution expects a filter in input B".into()))?;
    if view.is_empty() {
        return Err(DispatchError::TaskRejected("empty convolution filter".into()));
    }
    Ok(view.into_owned())
}

fn write_output(task: &mut Task, values: &[f64]) -> Result<()> {
    let out = task
        .output
        .as_f64_mut()
        .ok_or_else(|| DispatchError::TaskRejected("convolution expects f64 output".into()))?;
    if out.len() < values.len() {
        return Err(DispatchError::TaskRejected(format!(
            "output buffer holds {} elements, need {}",
            out.len(),
            values.len()
        )));
    }
    out[..values.len()].copy_from_slice(values);
    Ok(())
}

/// Time-domain circular convolution.
pub struct ConvDirect;

impl Kernel for ConvDirect {
    fn name(&self) -> &str {
        "CONV_DIRECT"
    }

    fn run(&self, task: &mut Task, _step: &PlanStep) -> Result<FluxReport> {
        let x = signal(task)?;
        let mut h = filter(task)?;
        let n = x.len();
        h.truncate(n);

        let mut y = vec![0.0f64; n];
        for (i, out) in y.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (j, &hj) in h.iter().enumerate() {
                let idx = (i + n - j) % n;
                sum += hj * x[idx];
            }
            *out = sum;
        }
        write_output(task, &y)?;

        Ok(FluxReport {
            cycle_cost: 2 * (n * h.len()) as u64,
            hw_in_cost: popcount_f64(&x) + popcount_f64(&h),
            hw_out_cost: popcount_f64(&y),
        })
    }
}

/// Forward transform of input A into the step's scratch slot.
pub struct FftForward;

impl Kernel for FftForward {
    fn name(&self) -> &str {
        "FFT_FORWARD"
    }

    fn run(&self, task: &mut Task, step: &PlanStep) -> Result<FluxReport> {
        let x = signal(task)?;
        let spectrum = spectral::forward_spectrum(&x);
        let report = FluxReport {
            cycle_cost: spectral::fft_cycles(x.len()),
            hw_in_cost: popcount_f64(&x),
            hw_out_cost: popcount_f64(&spectrum),
        };
        task.scratch.put(&step.dst, spectrum);
        Ok(report)
    }
}

/// Pointwise product of a staged spectrum with the filter's spectrum.
pub struct ElementWiseMultiply;

impl Kernel for ElementWiseMultiply {
    fn name(&self) -> &str {
        "ELEMENT_WISE_MULTIPLY"
    }

    fn run(&self, task: &mut Task, step: &PlanStep) -> Result<FluxReport> {
        let staged = task
            .scratch
            .get(&step.src)
            .ok_or_else(|| {
                DispatchError::TaskRejected(format!("missing staged spectrum '{}'", step.src))
            })?
            .to_vec();
        let n = staged.len() / 2;

        // Filter padded (or truncated) to the signal length keeps the
        // product a circular convolution.
        let mut h = filter(task)?;
        h.resize(n, 0.0);
        let h_spectrum = spectral::forward_spectrum(&h);
        let product = spectral::multiply_spectra(&staged, &h_spectrum);

        let report = FluxReport {
            cycle_cost: 6 * n as u64,
            hw_in_cost: popcount_f64(&staged),
            hw_out_cost: popcount_f64(&product),
        };
        task.scratch.put(&step.dst, product);
        Ok(report)
    }
}

/// Inverse transform of a staged spectrum into the task's output buffer.
pub struct FftInverse;

impl Kernel for FftInverse {
    fn name(&self) -> &str {
        "FFT_INVERSE"
    }

    fn run(&self, task: &mut Task, step: &PlanStep) -> Result<FluxReport> {
        let staged = task
            .scratch
            .get(&step.src)
            .ok_or_else(|| {
                DispatchError::TaskRejected(format!("missing staged spectrum '{}'", step.src))
            })?
            .to_vec();
        let restored = spectral::inverse_real(&staged);
        write_output(task, &restored)?;
        Ok(FluxReport {
            cycle_cost: spectral::fft_cycles(restored.len()),
            hw_in_cost: popcount_f64(&staged),
            hw_out_cost: popcount_f64(&restored),
        })
    }
}
