//! Spectrogram: power spectral density per frame
//!
//! Sound to Spectrogram:
//! 1. Lay out frames of the physical window width (twice the effective
//!    width for a Gaussian window)
//! 2. Multiply each frame by the window and zero-pad it to the FFT size
//! 3. Take the spectrum (scaled by the sampling period)
//! 4. Store `(re^2 + im^2) / (sum w^2 dx df)` for bins `0..=N/2`

use crate::config::ThreadingConfig;
use crate::frame_into_frame::{FrameIntoFrameState, SampledFrameIntoSampledFrame};
use crate::sampled::{Sampled, SampledDomain, SampledFrames};
use crate::sampled_into_sampled::SampledIntoSampled;
use crate::sound::Sound;
use crate::sound_frame::{SoundFrameBuffer, SoundFrames};
use crate::spectrum::Spectrum;
use crate::status::{SoundFrameInfo, SoundIntoSpectrogramStatus};
use crate::utils::FrameFft;
use crate::window::WindowShape;
use crate::{PraatError, Result};

/// Power spectral density for every frame of a sampled time axis
///
/// Frame `i` holds the densities of bins `0..num_freq_bins()`, bin `k` at
/// frequency `k * freq_step()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    domain: SampledDomain,
    num_freq_bins: usize,
    freq_step: f64,
    /// Nyquist frequency of the analysed sound
    freq_max: f64,
    frames: Vec<Vec<f64>>,
}

impl Spectrogram {
    /// Spectrogram with `domain.nx` frames of zeros
    pub fn new(domain: SampledDomain, num_freq_bins: usize, freq_step: f64, freq_max: f64) -> Result<Self> {
        if !(freq_step > 0.0) {
            return Err(PraatError::InvalidParameter(format!(
                "frequency step ({freq_step}) must be positive"
            )));
        }
        Ok(Self {
            domain,
            num_freq_bins,
            freq_step,
            freq_max,
            frames: vec![vec![0.0; num_freq_bins]; domain.nx],
        })
    }

    pub fn frame(&self, index: usize) -> Option<&[f64]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_freq_bins(&self) -> usize {
        self.num_freq_bins
    }

    pub fn freq_step(&self) -> f64 {
        self.freq_step
    }

    pub fn freq_max(&self) -> f64 {
        self.freq_max
    }

    pub fn time_step(&self) -> f64 {
        self.domain.dx
    }

    pub fn get_time_from_frame(&self, frame: usize) -> f64 {
        self.domain.index_to_x(frame)
    }

    pub fn get_frequency_from_bin(&self, bin: usize) -> f64 {
        bin as f64 * self.freq_step
    }

    /// Frame nearest to `time`, `None` more than half a step outside the frames
    pub fn get_frame_from_time(&self, time: f64) -> Option<usize> {
        let position = (time - self.domain.x1) / self.domain.dx;
        if self.frames.is_empty() || position < -0.5 || position > self.frames.len() as f64 - 0.5 {
            return None;
        }
        Some(self.domain.x_to_nearest_index(time))
    }

    /// Bin nearest to `frequency`, `None` outside `[0, freq_max]`
    pub fn get_bin_from_frequency(&self, frequency: f64) -> Option<usize> {
        if !(0.0..=self.freq_max).contains(&frequency) || self.num_freq_bins == 0 {
            return None;
        }
        let bin = (frequency / self.freq_step).round() as usize;
        Some(bin.min(self.num_freq_bins - 1))
    }

    /// Power spectral density (Pa^2/Hz) at the nearest frame and bin
    pub fn get_power_at(&self, time: f64, frequency: f64) -> Option<f64> {
        let frame = self.get_frame_from_time(time)?;
        let bin = self.get_bin_from_frequency(frequency)?;
        self.frames.get(frame)?.get(bin).copied()
    }

    pub fn get_power_db_at(&self, time: f64, frequency: f64) -> Option<f64> {
        self.get_power_at(time, frequency).map(|p| {
            if p > 0.0 {
                10.0 * p.log10()
            } else {
                f64::NEG_INFINITY
            }
        })
    }

    /// All bins of the frame nearest to `time`
    pub fn get_time_slice(&self, time: f64) -> Option<&[f64]> {
        self.frame(self.get_frame_from_time(time)?)
    }

    /// The bin nearest to `frequency` across all frames
    pub fn get_frequency_slice(&self, frequency: f64) -> Option<Vec<f64>> {
        let bin = self.get_bin_from_frequency(frequency)?;
        Some(self.frames.iter().map(|frame| frame.get(bin).copied().unwrap_or(0.0)).collect())
    }

    /// Sum of all densities times the time and frequency steps
    pub fn total_energy(&self) -> f64 {
        self.frames.iter().flatten().sum::<f64>() * self.domain.dx * self.freq_step
    }
}

impl Sampled for Spectrogram {
    fn domain(&self) -> SampledDomain {
        self.domain
    }
}

impl SampledFrames for Spectrogram {
    type Frame = Vec<f64>;

    fn frames(&self) -> &[Vec<f64>] {
        &self.frames
    }

    fn frames_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.frames
    }
}

/// Windowed FFT of one sound frame into one spectrogram frame
#[derive(Debug, Clone)]
pub struct SoundFrameIntoSpectrogramFrame {
    state: FrameIntoFrameState,
    frame: SoundFrameBuffer,
    fft: FrameFft,
    spectrum: Spectrum,
    psd: Vec<f64>,
    sampling_period: f64,
    /// `1 / (sum w^2 dx df)`
    density_scale: f64,
}

impl SoundFrameIntoSpectrogramFrame {
    pub fn new(input: &SoundFrames, window_shape: WindowShape, fast: bool) -> Self {
        let frame_size = input.frame_size();
        let fft_size = if fast { frame_size.next_power_of_two() } else { frame_size };
        let sampling_period = input.sound().dx();
        let frame = SoundFrameBuffer::new(frame_size, window_shape, false);
        let spectrum = Spectrum::with_fft_size(fft_size, sampling_period);
        let window_energy: f64 = frame.window().iter().map(|w| w * w).sum();
        let density_scale = 1.0 / (window_energy * sampling_period * spectrum.df());
        Self {
            state: FrameIntoFrameState::default(),
            fft: FrameFft::new(fft_size),
            psd: vec![0.0; spectrum.num_bins()],
            frame,
            spectrum,
            sampling_period,
            density_scale,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    pub fn number_of_frequencies(&self) -> usize {
        self.fft.number_of_frequencies()
    }

    pub fn frequency_step(&self) -> f64 {
        self.spectrum.df()
    }
}

impl SampledFrameIntoSampledFrame for SoundFrameIntoSpectrogramFrame {
    type Input = SoundFrames;
    type Output = Spectrogram;
    type Status = SoundFrameInfo;

    fn allocate_output_frames(&mut self, _input: &SoundFrames, output: &mut Spectrogram) -> Result<()> {
        if output.num_freq_bins != self.psd.len() {
            return Err(PraatError::InvalidParameter(format!(
                "spectrogram has {} frequency bins, the analysis produces {}",
                output.num_freq_bins,
                self.psd.len()
            )));
        }
        for frame in output.frames_mut() {
            frame.clear();
            frame.resize(self.psd.len(), 0.0);
        }
        Ok(())
    }

    fn get_input_frame(&mut self, input: &SoundFrames) -> Result<()> {
        self.frame.load(input, self.state.current_frame);
        Ok(())
    }

    fn input_frame_to_output_frame(&mut self) -> Result<bool> {
        self.fft.load_real(self.frame.samples());
        self.fft.forward();
        self.spectrum.set_from_frame_fft(&self.fft, self.sampling_period);
        for (bin, density) in self.psd.iter_mut().enumerate() {
            *density = self.spectrum.get_power(bin).unwrap_or(0.0) * self.density_scale;
        }
        Ok(true)
    }

    fn save_output_frame(&mut self, frame: &mut Vec<f64>) -> Result<()> {
        frame.clear();
        frame.extend_from_slice(&self.psd);
        Ok(())
    }

    fn frame_status(&self) -> SoundFrameInfo {
        SoundFrameInfo {
            info: self.state.frame_analysis_info,
            frame_begin: self.frame.frame_begin(),
        }
    }

    fn state(&self) -> &FrameIntoFrameState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FrameIntoFrameState {
        &mut self.state
    }
}

impl Sound {
    /// Short-term power spectral density
    ///
    /// # Arguments
    /// * `effective_analysis_width` - Effective window duration (s)
    /// * `time_step` - Time between frame centres (s); non-positive selects
    ///   an eighth of the effective width
    /// * `window_shape` - Analysis window
    /// * `fast` - Zero-pad frames to a power of two
    /// * `config` - Threading configuration
    pub fn to_spectrogram_frames(
        &self,
        effective_analysis_width: f64,
        time_step: f64,
        window_shape: WindowShape,
        fast: bool,
        config: &ThreadingConfig,
    ) -> Result<Spectrogram> {
        self.to_spectrogram_frames_with_status(
            effective_analysis_width,
            time_step,
            window_shape,
            fast,
            config,
        )
        .map(|(spectrogram, _)| spectrogram)
    }

    /// Same as [`Sound::to_spectrogram_frames`], also returning the per-frame status
    pub fn to_spectrogram_frames_with_status(
        &self,
        effective_analysis_width: f64,
        time_step: f64,
        window_shape: WindowShape,
        fast: bool,
        config: &ThreadingConfig,
    ) -> Result<(Spectrogram, SoundIntoSpectrogramStatus)> {
        if !(effective_analysis_width > 0.0) {
            return Err(PraatError::InvalidParameter(format!(
                "analysis width ({effective_analysis_width}) must be positive"
            )));
        }
        let time_step = if time_step > 0.0 {
            time_step
        } else {
            effective_analysis_width / 8.0
        };
        let width = window_shape.physical_analysis_width(effective_analysis_width);
        let frames = SoundFrames::new(self.clone(), width, time_step)?;

        let workspace = SoundFrameIntoSpectrogramFrame::new(&frames, window_shape, fast);
        let mut spectrogram = Spectrogram::new(
            frames.domain(),
            workspace.number_of_frequencies(),
            workspace.frequency_step(),
            0.5 * self.sample_rate(),
        )?;
        let config = config.with_status_updates(true);
        let mut status = SoundIntoSpectrogramStatus::new(frames.nx());
        SampledIntoSampled::create(&frames, &mut spectrogram, workspace, &mut status, config)?
            .analyse_threaded()?;
        Ok((spectrogram, status))
    }
}
