//! Sound type: the input of all sound-based frame analyses
//!
//! A Sound holds mono samples with a sampling frequency and a start time.
//! Sample `i` is centred at `start_time + (i + 0.5) / sample_rate`, so a
//! Sound is itself a sampled object with one "frame" per sample.

use std::f64::consts::PI;

use crate::sampled::{Sampled, SampledDomain};
use crate::{PraatError, Result};

/// Mono samples on a uniform time axis
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    samples: Vec<f64>,
    /// Sample rate in Hz
    sample_rate: f64,
    /// Start of the time domain (usually 0.0)
    start_time: f64,
}

impl Sound {
    /// Sound starting at time zero, copying `samples`
    ///
    /// # Example
    /// ```
    /// use praat_sampled::Sound;
    ///
    /// let samples = vec![0.0, 0.5, 1.0, 0.5, 0.0, -0.5, -1.0, -0.5];
    /// let sound = Sound::from_samples(&samples, 44100.0);
    /// assert_eq!(sound.sample_rate(), 44100.0);
    /// ```
    pub fn from_samples(samples: &[f64], sample_rate: f64) -> Self {
        Self::from_samples_owned(samples.to_vec(), sample_rate)
    }

    /// Sound starting at time zero, taking ownership of `samples`
    pub fn from_samples_owned(samples: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
            start_time: 0.0,
        }
    }

    /// Same samples, shifted to start at `start_time`
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Total duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Time just after the last sample
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }

    /// Sampling period, `1 / sample_rate` (Praat's `dx`)
    pub fn dx(&self) -> f64 {
        1.0 / self.sample_rate
    }

    /// Centre of the first sample (Praat's `x1`)
    pub fn x1(&self) -> f64 {
        self.start_time + 0.5 * self.dx()
    }

    /// Time of the centre of sample `index`
    pub fn index_to_time(&self, index: usize) -> f64 {
        self.start_time + (index as f64 + 0.5) / self.sample_rate
    }

    /// Nearest sample index for `time`; may lie outside the sound
    pub fn time_to_index(&self, time: f64) -> isize {
        ((time - self.start_time) * self.sample_rate - 0.5).round() as isize
    }

    /// Frame layout of a short-term analysis
    ///
    /// Fits as many windows of `window_duration` as possible, `time_step`
    /// apart, centred in the sound. Returns `(number_of_frames, first_time)`.
    pub fn short_term_analysis(&self, window_duration: f64, time_step: f64) -> Result<(usize, f64)> {
        if !(time_step > 0.0) {
            return Err(PraatError::InvalidParameter(format!(
                "time step ({time_step}) must be positive"
            )));
        }
        let duration = self.duration();
        if !(window_duration > 0.0) || window_duration > duration {
            return Err(PraatError::InvalidParameter(format!(
                "analysis window ({window_duration} s) does not fit in the sound ({duration} s)"
            )));
        }
        let number_of_frames = ((duration - window_duration) / time_step).floor() as usize + 1;
        let first_time = self.x1()
            + 0.5
                * ((self.samples.len() as f64 - 1.0) * self.dx()
                    - (number_of_frames as f64 - 1.0) * time_step);
        Ok((number_of_frames, first_time))
    }

    /// Pre-emphasised copy
    ///
    /// The filter is: y[n] = x[n] - alpha * x[n-1]
    /// where alpha = exp(-2 * pi * from_frequency / sample_rate).
    /// A non-positive or above-Nyquist frequency leaves the sound unchanged.
    pub fn pre_emphasis(&self, from_frequency: f64) -> Sound {
        let mut result = self.clone();
        result.pre_emphasize_in_place(from_frequency);
        result
    }

    pub fn pre_emphasize_in_place(&mut self, from_frequency: f64) {
        if from_frequency <= 0.0 || from_frequency >= 0.5 * self.sample_rate {
            return;
        }
        let alpha = (-2.0 * PI * from_frequency / self.sample_rate).exp();
        for i in (1..self.samples.len()).rev() {
            self.samples[i] -= alpha * self.samples[i - 1];
        }
    }

    /// Sine wave `amplitude * sin(2 pi f t + phase)`
    ///
    /// # Arguments
    /// * `frequency` - Frequency in Hz
    /// * `duration` - Duration in seconds
    /// * `sample_rate` - Sample rate in Hz
    /// * `amplitude` - Peak amplitude
    /// * `phase` - Initial phase in radians
    pub fn create_tone(
        frequency: f64,
        duration: f64,
        sample_rate: f64,
        amplitude: f64,
        phase: f64,
    ) -> Sound {
        let n_samples = (duration * sample_rate).round() as usize;
        let omega = 2.0 * PI * frequency / sample_rate;
        let samples = (0..n_samples)
            .map(|i| amplitude * (omega * i as f64 + phase).sin())
            .collect();
        Sound::from_samples_owned(samples, sample_rate)
    }

    pub fn create_silence(duration: f64, sample_rate: f64) -> Sound {
        let n_samples = (duration * sample_rate).round() as usize;
        Sound::from_samples_owned(vec![0.0; n_samples], sample_rate)
    }

    /// Create a train of unit impulses at `frequency` pulses per second
    pub fn create_pulse_train(frequency: f64, duration: f64, sample_rate: f64) -> Sound {
        let n_samples = (duration * sample_rate).round() as usize;
        let mut samples = vec![0.0; n_samples];
        if frequency > 0.0 {
            let period = sample_rate / frequency;
            let mut k = 0usize;
            loop {
                let index = (k as f64 * period).round() as usize;
                if index >= n_samples {
                    break;
                }
                samples[index] = 1.0;
                k += 1;
            }
        }
        Sound::from_samples_owned(samples, sample_rate)
    }
}

impl Sampled for Sound {
    fn domain(&self) -> SampledDomain {
        SampledDomain {
            xmin: self.start_time,
            xmax: self.end_time(),
            nx: self.samples.len(),
            dx: self.dx(),
            x1: self.x1(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sound_timing() {
        let sound = Sound::from_samples(&[0.0; 100], 1000.0).with_start_time(0.5);
        assert_relative_eq!(sound.duration(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(sound.end_time(), 0.6, epsilon = 1e-12);
        assert_relative_eq!(sound.x1(), 0.5005, epsilon = 1e-12);
        assert_eq!(sound.time_to_index(sound.index_to_time(42)), 42);
        assert_eq!(sound.domain().nx, 100);
    }

    #[test]
    fn test_short_term_analysis() {
        let sound = Sound::create_silence(1.0, 10000.0);
        let (nx, t1) = sound.short_term_analysis(0.5, 0.25).unwrap();
        assert_eq!(nx, 3);
        assert_relative_eq!(t1, 0.25, epsilon = 1e-12);
        // frames are centred in the sound
        let last = t1 + (nx - 1) as f64 * 0.25;
        assert_relative_eq!(t1 - sound.start_time(), sound.end_time() - last, epsilon = 1e-9);
        assert!(sound.short_term_analysis(2.0, 0.01).is_err());
        assert!(sound.short_term_analysis(0.05, 0.0).is_err());
    }

    #[test]
    fn test_pre_emphasis() {
        let sound = Sound::from_samples(&[1.0, 1.0, 1.0], 1000.0);
        let emphasized = sound.pre_emphasis(50.0);
        let alpha = (-2.0 * PI * 50.0 / 1000.0).exp();
        assert_relative_eq!(emphasized.samples()[0], 1.0);
        assert_relative_eq!(emphasized.samples()[1], 1.0 - alpha, epsilon = 1e-12);
        assert_relative_eq!(emphasized.samples()[2], 1.0 - alpha, epsilon = 1e-12);
        assert_eq!(sound.pre_emphasis(0.0), sound);
    }

    #[test]
    fn test_pulse_train() {
        let sound = Sound::create_pulse_train(100.0, 0.1, 10000.0);
        let pulses = sound.samples().iter().filter(|&&s| s == 1.0).count();
        assert_eq!(pulses, 10);
        assert_eq!(sound.samples()[100], 1.0);
    }
}
