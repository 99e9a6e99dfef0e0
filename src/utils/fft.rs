//! FFT wrapper around rustfft
//!
//! [`FrameFft`] holds a fixed-size plan plus its buffers; it is cheap to
//! clone (plans are shared), so every worker of a frame analysis can own one.

use std::fmt;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::FftPlanner;

/// Fixed-size forward/inverse FFT with its own buffers
#[derive(Clone)]
pub struct FrameFft {
    forward: Arc<dyn rustfft::Fft<f64>>,
    inverse: Arc<dyn rustfft::Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl FrameFft {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            forward,
            inverse,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Number of points of the transform
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bins from DC up to and including Nyquist
    pub fn number_of_frequencies(&self) -> usize {
        self.buffer.len() / 2 + 1
    }

    /// Copy `samples` into the buffer, zero-padding to the transform size
    pub fn load_real(&mut self, samples: &[f64]) {
        for (i, c) in self.buffer.iter_mut().enumerate() {
            *c = Complex::new(samples.get(i).copied().unwrap_or(0.0), 0.0);
        }
    }

    /// In-place forward transform of the buffer
    pub fn forward(&mut self) {
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
    }

    /// In-place inverse transform of the buffer (not normalised)
    pub fn inverse(&mut self) {
        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
    }

    pub fn buffer(&self) -> &[Complex<f64>] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.buffer
    }
}

impl fmt::Debug for FrameFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameFft").field("size", &self.size()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    /// Direct DFT of a real sequence zero-padded to `n` points
    fn dft(input: &[f64], n: usize) -> Vec<Complex<f64>> {
        (0..n)
            .map(|k| {
                input.iter().enumerate().fold(Complex::new(0.0, 0.0), |sum, (i, &x)| {
                    let phase = -2.0 * PI * (k * i) as f64 / n as f64;
                    sum + Complex::new(x * phase.cos(), x * phase.sin())
                })
            })
            .collect()
    }

    #[test]
    fn test_frame_fft_dc() {
        let mut fft = FrameFft::new(8);
        fft.load_real(&[1.0; 8]);
        fft.forward();
        assert_relative_eq!(fft.buffer()[0].re, 8.0, epsilon = 1e-10);
        assert_relative_eq!(fft.buffer()[0].im, 0.0, epsilon = 1e-10);
        for c in &fft.buffer()[1..] {
            assert_relative_eq!(c.norm(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_frame_fft_matches_dft() {
        let n = 16;
        let input: Vec<f64> = (0..12)
            .map(|i| (2.0 * PI * i as f64 / n as f64).sin())
            .collect();
        let expected = dft(&input, n);

        let mut frame_fft = FrameFft::new(n);
        assert_eq!(frame_fft.number_of_frequencies(), 9);
        frame_fft.load_real(&input);
        frame_fft.forward();
        for (a, b) in frame_fft.buffer().iter().zip(&expected) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }

        let copy = frame_fft.clone();
        frame_fft.inverse();
        assert_relative_eq!(frame_fft.buffer()[3].re / n as f64, input[3], epsilon = 1e-10);
        assert_eq!(copy.size(), n);
    }
}
