//! Complex spectrum of one frame
//!
//! A [`Spectrum`] holds bins `0..=N/2` of the Fourier transform of a frame,
//! scaled by the sampling period so that its values approximate the
//! continuous transform. The spectrogram analysis keeps one per workspace
//! and refills it for every frame.

use num_complex::Complex;

use crate::utils::FrameFft;

/// Complex spectrum from DC up to the Nyquist frequency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    real: Vec<f64>,
    imag: Vec<f64>,
    /// Bin width (Hz)
    df: f64,
    /// Nyquist frequency of the analysed sound
    max_frequency: f64,
}

impl Spectrum {
    /// Empty spectrum with room for the bins of an `fft_size`-point transform
    pub fn with_fft_size(fft_size: usize, sampling_period: f64) -> Self {
        let number_of_bins = fft_size / 2 + 1;
        Self {
            real: vec![0.0; number_of_bins],
            imag: vec![0.0; number_of_bins],
            df: 1.0 / (fft_size as f64 * sampling_period),
            max_frequency: 0.5 / sampling_period,
        }
    }

    /// Fill the bins from the forward transform held by `fft`
    pub fn set_from_frame_fft(&mut self, fft: &FrameFft, sampling_period: f64) {
        self.set_from_transform(fft.buffer(), sampling_period);
    }

    fn set_from_transform(&mut self, transform: &[Complex<f64>], sampling_period: f64) {
        for ((re, im), c) in self.real.iter_mut().zip(&mut self.imag).zip(transform) {
            *re = c.re * sampling_period;
            *im = c.im * sampling_period;
        }
    }

    pub fn num_bins(&self) -> usize {
        self.real.len()
    }

    pub fn get_frequency_from_bin(&self, bin: usize) -> f64 {
        bin as f64 * self.df
    }

    pub fn df(&self) -> f64 {
        self.df
    }

    pub fn max_frequency(&self) -> f64 {
        self.max_frequency
    }

    pub fn real(&self) -> &[f64] {
        &self.real
    }

    pub fn imag(&self) -> &[f64] {
        &self.imag
    }

    /// `re^2 + im^2` of a bin
    pub fn get_power(&self, bin: usize) -> Option<f64> {
        let re = self.real.get(bin)?;
        let im = self.imag.get(bin)?;
        Some(re * re + im * im)
    }
}
