//! Spectral primitives shared by the profiler and the frequency-domain
//! convolution kernels. The FFT itself is an external primitive (rustfft).

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Forward complex FFT of a real signal, returned interleaved
/// `[re0, im0, re1, im1, ...]` with one bin per input sample.
pub fn forward_spectrum(samples: &[f64]) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let mut buf: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buf);
    interleave(&buf)
}

/// Inverse FFT of an interleaved spectrum; returns the real parts, scaled
/// by 1/N as rustfft leaves transforms unnormalized.
pub fn inverse_real(spectrum: &[f64]) -> Vec<f64> {
    let n = spectrum.len() / 2;
    if n == 0 {
        return Vec::new();
    }
    let mut buf = deinterleave(spectrum);
    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(n).process(&mut buf);
    let scale = 1.0 / n as f64;
    buf.iter().map(|c| c.re * scale).collect()
}

/// Pointwise complex product of two interleaved spectra of equal length.
pub fn multiply_spectra(a: &[f64], b: &[f64]) -> Vec<f64> {
    let bins = (a.len() / 2).min(b.len() / 2);
    let mut out = Vec::with_capacity(bins * 2);
    for i in 0..bins {
        let (ar, ai) = (a[2 * i], a[2 * i + 1]);
        let (br, bi) = (b[2 * i], b[2 * i + 1]);
        out.push(ar * br - ai * bi);
        out.push(ar * bi + ai * br);
    }
    out
}

/// Magnitudes of the non-redundant half-spectrum of a real signal:
/// exactly ⌊N/2⌋+1 bins for N ≥ 2 input samples.
pub fn magnitude_bins(samples: &[f64]) -> Vec<f64> {
    let n = samples.len();
    if n < 2 {
        return Vec::new();
    }
    let spectrum = forward_spectrum(samples);
    (0..n / 2 + 1)
        .map(|i| (spectrum[2 * i].powi(2) + spectrum[2 * i + 1].powi(2)).sqrt())
        .collect()
}

/// Conventional N·log2(N) cycle estimate for an N-point transform.
pub fn fft_cycles(n: usize) -> u64 {
    if n < 2 {
        return 0;
    }
    (n as f64 * (n as f64).log2() * 5.0) as u64
}

fn interleave(buf: &[Complex<f64>]) -> Vec<f64> {
    let mut out = Vec::with_capacity(buf.len() * 2);
    for c in buf {
        out.push(c.re);
        out.push(c.im);
    }
    out
}

fn deinterleave(data: &[f64]) -> Vec<Complex<f64>> {
    data.chunks_exact(2)
        .map(|p| Complex::new(p[0], p[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_inverse_round_trip() {
        let signal = vec![1.0, 2.0, -1.0, 0.5, 0.0, 3.0, -2.0, 1.5];
        let spectrum = forward_spectrum(&signal);
        assert_eq!(spectrum.len(), signal.len() * 2);
        let restored = inverse_real(&spectrum);
        for (a, b) in signal.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn test_magnitude_bin_count() {
        assert_eq!(magnitude_bins(&[1.0; 8]).len(), 5);
        assert_eq!(magnitude_bins(&[1.0; 9]).len(), 5);
        assert_eq!(magnitude_bins(&[1.0]).len(), 0);
        assert!(magnitude_bins(&[]).is_empty());
    }

    #[test]
    fn test_dc_signal_concentrates_in_bin_zero() {
        let bins = magnitude_bins(&[1.0; 16]);
        assert!((bins[0] - 16.0).abs() < 1e-9);
        for b in &bins[1..] {
            assert!(b.abs() < 1e-9);
        }
    }

    #[test]
    fn test_fft_cycles() {
        assert_eq!(fft_cycles(0), 0);
        assert_eq!(fft_cycles(1), 0);
        // 8 * 3 * 5
        assert_eq!(fft_cycles(8), 120);
    }
}
