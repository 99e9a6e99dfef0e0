//! Sound frames: a Sound seen through the frame layout of an analysis
//!
//! A sound-based analysis produces one output frame per analysis window,
//! not one per sample. [`SoundFrames`] pairs the Sound with the short-term
//! frame layout of the output, so the orchestrator can check it against the
//! output like any other sampled input. [`SoundFrameBuffer`] is the part of a
//! workspace that copies and windows the samples of one frame.

use crate::sampled::{Sampled, SampledDomain};
use crate::sound::Sound;
use crate::window::WindowShape;
use crate::{PraatError, Result};

/// A Sound with the frame layout of a short-term analysis
#[derive(Debug, Clone)]
pub struct SoundFrames {
    sound: Sound,
    domain: SampledDomain,
    physical_analysis_width: f64,
    frame_size: usize,
}

impl SoundFrames {
    /// Lay out frames of `physical_analysis_width` seconds, `time_step` apart
    pub fn new(sound: Sound, physical_analysis_width: f64, time_step: f64) -> Result<Self> {
        let (nx, x1) = sound.short_term_analysis(physical_analysis_width, time_step)?;
        let frame_size = (physical_analysis_width * sound.sample_rate()).round() as usize;
        if frame_size < 2 {
            return Err(PraatError::InvalidParameter(format!(
                "analysis window of {physical_analysis_width} s holds fewer than 2 samples"
            )));
        }
        let domain = SampledDomain::new(sound.start_time(), sound.end_time(), nx, time_step, x1)?;
        Ok(Self {
            sound,
            domain,
            physical_analysis_width,
            frame_size,
        })
    }

    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    /// Number of samples in one frame
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn physical_analysis_width(&self) -> f64 {
        self.physical_analysis_width
    }

    /// Index of the first sample of `frame`; negative if the frame starts
    /// before the sound
    pub fn frame_begin(&self, frame: usize) -> isize {
        let centre = self.domain.index_to_x(frame);
        let start = centre - 0.5 * self.physical_analysis_width;
        self.sound.time_to_index(start + 0.5 * self.sound.dx())
    }
}

impl Sampled for SoundFrames {
    fn domain(&self) -> SampledDomain {
        self.domain
    }
}

/// Windowed samples of the current sound frame
#[derive(Debug, Clone)]
pub struct SoundFrameBuffer {
    window: Vec<f64>,
    samples: Vec<f64>,
    frame_begin: usize,
    subtract_mean: bool,
}

impl SoundFrameBuffer {
    pub fn new(frame_size: usize, window_shape: WindowShape, subtract_mean: bool) -> Self {
        Self {
            window: window_shape.frame_window(frame_size),
            samples: vec![0.0; frame_size],
            frame_begin: 0,
            subtract_mean,
        }
    }

    /// Copy frame `frame` of `input` and multiply it by the window
    ///
    /// Samples outside the sound count as zero.
    pub fn load(&mut self, input: &SoundFrames, frame: usize) {
        let sound = input.sound().samples();
        let begin = input.frame_begin(frame);
        self.frame_begin = begin.max(0) as usize;

        for (i, sample) in self.samples.iter_mut().enumerate() {
            let index = begin + i as isize;
            *sample = if index >= 0 && (index as usize) < sound.len() {
                sound[index as usize]
            } else {
                0.0
            };
        }
        if self.subtract_mean {
            let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
            self.samples.iter_mut().for_each(|s| *s -= mean);
        }
        for (sample, &w) in self.samples.iter_mut().zip(&self.window) {
            *sample *= w;
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn window(&self) -> &[f64] {
        &self.window
    }

    /// Index of the first sample of the loaded frame
    pub fn frame_begin(&self) -> usize {
        self.frame_begin
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.samples.iter().map(|s| s * s).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sound_frames_layout() {
        let sound = Sound::create_silence(1.0, 10000.0);
        let frames = SoundFrames::new(sound, 0.5, 0.25).unwrap();
        assert_eq!(frames.nx(), 3);
        assert_eq!(frames.frame_size(), 5000);
        assert_eq!(frames.frame_begin(0), 0);
        assert_eq!(frames.frame_begin(2), 5000);
        assert_relative_eq!(frames.domain().xmax, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_buffer_load() {
        let samples: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let sound = Sound::from_samples_owned(samples, 100.0);
        let frames = SoundFrames::new(sound, 0.1, 0.1).unwrap();
        let mut buffer = SoundFrameBuffer::new(frames.frame_size(), WindowShape::Rectangular, false);
        buffer.load(&frames, 3);
        assert_eq!(buffer.frame_begin(), 30);
        assert_relative_eq!(buffer.samples()[0], 30.0);
        assert_relative_eq!(buffer.samples()[9], 39.0);

        let mut centred = SoundFrameBuffer::new(frames.frame_size(), WindowShape::Rectangular, true);
        centred.load(&frames, 3);
        let mean: f64 = centred.samples().iter().sum::<f64>() / 10.0;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
    }
}
