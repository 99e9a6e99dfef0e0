//! Linear prediction coefficients per frame
//!
//! An [`Lpc`] object stores, for every frame, the coefficients of the
//! prediction polynomial `A(z) = 1 + a[1] z^-1 + ... + a[p] z^-p` (the leading
//! 1 is implicit) and the prediction error ("gain").
//!
//! Sound to LPC with Burg's method:
//! 1. Pre-emphasise the sound
//! 2. Lay out frames of twice the effective analysis width
//! 3. Multiply every frame by Praat's Gaussian window
//! 4. Run Burg's recursion and store `a[k] = -c[k]`

use crate::config::ThreadingConfig;
use crate::frame_into_frame::{FrameIntoFrameState, SampledFrameIntoSampledFrame};
use crate::polynomial::Polynomial;
use crate::roots::Roots;
use crate::sampled::{Sampled, SampledDomain, SampledFrames};
use crate::sampled_into_sampled::SampledIntoSampled;
use crate::sound::Sound;
use crate::sound_frame::{SoundFrameBuffer, SoundFrames};
use crate::status::{FrameAnalysisInfo, SoundFrameInfo, SoundIntoLpcStatus};
use crate::utils::BurgWorkspace;
use crate::window::WindowShape;
use crate::{PraatError, Result};

/// Coefficients of one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LpcFrame {
    a: Vec<f64>,
    gain: f64,
}

impl LpcFrame {
    /// Frame with `number_of_coefficients` zero coefficients
    pub fn new(number_of_coefficients: usize) -> Self {
        Self {
            a: vec![0.0; number_of_coefficients],
            gain: 0.0,
        }
    }

    pub fn from_coefficients(a: &[f64], gain: f64) -> Self {
        Self { a: a.to_vec(), gain }
    }

    /// `a[1..=p]`, without the leading 1
    pub fn coefficients(&self) -> &[f64] {
        &self.a
    }

    pub fn number_of_coefficients(&self) -> usize {
        self.a.len()
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Replace the contents of the frame without reallocating if possible
    pub fn set(&mut self, a: &[f64], gain: f64) {
        self.a.clear();
        self.a.extend_from_slice(a);
        self.gain = gain;
    }

    /// `z^p A(z)` as a polynomial in `z`, ascending coefficients
    pub fn to_polynomial(&self) -> Polynomial {
        let mut coefficients: Vec<f64> = self.a.iter().rev().copied().collect();
        coefficients.push(1.0);
        Polynomial::from_coefficients(-1.0, 1.0, &coefficients)
    }

    /// True if all zeros of `A(z)` lie strictly inside the unit circle
    pub fn is_stable(&self) -> Result<bool> {
        if self.a.is_empty() {
            return Ok(true);
        }
        Ok(Roots::from_polynomial(&self.to_polynomial())?.all_inside_unit_circle())
    }
}

/// LPC coefficients for every frame of a sampled time axis
#[derive(Debug, Clone, PartialEq)]
pub struct Lpc {
    domain: SampledDomain,
    /// Sampling period of the sound the coefficients describe
    sampling_period: f64,
    max_n_coefficients: usize,
    frames: Vec<LpcFrame>,
}

impl Lpc {
    /// Create an LPC with `domain.nx` empty frames
    pub fn new(domain: SampledDomain, sampling_period: f64, max_n_coefficients: usize) -> Self {
        Self {
            domain,
            sampling_period,
            max_n_coefficients,
            frames: vec![LpcFrame::default(); domain.nx],
        }
    }

    /// Create an LPC from existing frames
    pub fn from_frames(
        domain: SampledDomain,
        sampling_period: f64,
        max_n_coefficients: usize,
        frames: Vec<LpcFrame>,
    ) -> Result<Self> {
        if frames.len() != domain.nx {
            return Err(PraatError::InvalidParameter(format!(
                "{} frames given for a domain of {} frames",
                frames.len(),
                domain.nx
            )));
        }
        if !(sampling_period > 0.0) {
            return Err(PraatError::InvalidParameter(format!(
                "sampling period ({sampling_period}) must be positive"
            )));
        }
        if let Some(frame) = frames
            .iter()
            .find(|f| f.number_of_coefficients() > max_n_coefficients)
        {
            return Err(PraatError::InvalidParameter(format!(
                "frame has {} coefficients, maximum is {max_n_coefficients}",
                frame.number_of_coefficients()
            )));
        }
        Ok(Self {
            domain,
            sampling_period,
            max_n_coefficients,
            frames,
        })
    }

    pub fn sampling_period(&self) -> f64 {
        self.sampling_period
    }

    /// Nyquist frequency of the analysed sound
    pub fn maximum_frequency(&self) -> f64 {
        0.5 / self.sampling_period
    }

    pub fn max_n_coefficients(&self) -> usize {
        self.max_n_coefficients
    }

    pub fn frame(&self, index: usize) -> Option<&LpcFrame> {
        self.frames.get(index)
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Time of the centre of frame `index`
    pub fn get_time_from_frame(&self, index: usize) -> f64 {
        self.domain.index_to_x(index)
    }
}

impl Sampled for Lpc {
    fn domain(&self) -> SampledDomain {
        self.domain
    }
}

impl SampledFrames for Lpc {
    type Frame = LpcFrame;

    fn frames(&self) -> &[LpcFrame] {
        &self.frames
    }

    fn frames_mut(&mut self) -> &mut [LpcFrame] {
        &mut self.frames
    }
}

/// Burg analysis of one sound frame into one LPC frame
#[derive(Debug, Clone)]
pub struct SoundFrameIntoLpcFrameBurg {
    state: FrameIntoFrameState,
    order: usize,
    frame: SoundFrameBuffer,
    burg: BurgWorkspace,
    coefficients: Vec<f64>,
    gain: f64,
}

impl SoundFrameIntoLpcFrameBurg {
    pub fn new(input: &SoundFrames, prediction_order: usize) -> Self {
        let frame_size = input.frame_size();
        Self {
            state: FrameIntoFrameState::default(),
            order: prediction_order,
            frame: SoundFrameBuffer::new(frame_size, WindowShape::Gaussian, false),
            burg: BurgWorkspace::new(frame_size, prediction_order),
            coefficients: vec![0.0; prediction_order],
            gain: 0.0,
        }
    }
}

impl SampledFrameIntoSampledFrame for SoundFrameIntoLpcFrameBurg {
    type Input = SoundFrames;
    type Output = Lpc;
    type Status = SoundFrameInfo;

    fn allocate_output_frames(&mut self, _input: &SoundFrames, output: &mut Lpc) -> Result<()> {
        if self.order > output.max_n_coefficients {
            return Err(PraatError::InvalidParameter(format!(
                "prediction order {} exceeds the LPC maximum of {}",
                self.order, output.max_n_coefficients
            )));
        }
        for frame in output.frames_mut() {
            *frame = LpcFrame::new(self.order);
        }
        Ok(())
    }

    fn get_input_frame(&mut self, input: &SoundFrames) -> Result<()> {
        self.frame.load(input, self.state.current_frame);
        Ok(())
    }

    fn input_frame_to_output_frame(&mut self) -> Result<bool> {
        if self.frame.sum_of_squares() == 0.0 {
            self.coefficients.iter_mut().for_each(|a| *a = 0.0);
            self.gain = 0.0;
            self.state.frame_analysis_info = FrameAnalysisInfo::NoEnergy;
            return Ok(false);
        }
        self.gain = self.burg.compute(self.frame.samples(), &mut self.coefficients);
        self.coefficients.iter_mut().for_each(|a| *a = -*a);
        Ok(true)
    }

    fn save_output_frame(&mut self, frame: &mut LpcFrame) -> Result<()> {
        frame.set(&self.coefficients, self.gain);
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
    /// LPC analysis with Burg's method
    ///
    /// # Arguments
    /// * `prediction_order` - Number of coefficients per frame
    /// * `effective_analysis_width` - Effective window duration (s); frames are twice as long
    /// * `time_step` - Time between frame centres (s)
    /// * `pre_emphasis_frequency` - Pre-emphasis from this frequency (Hz, 0 for none)
    /// * `config` - Threading configuration
    pub fn to_lpc_burg(
        &self,
        prediction_order: usize,
        effective_analysis_width: f64,
        time_step: f64,
        pre_emphasis_frequency: f64,
        config: &ThreadingConfig,
    ) -> Result<Lpc> {
        self.to_lpc_burg_with_status(
            prediction_order,
            effective_analysis_width,
            time_step,
            pre_emphasis_frequency,
            config,
        )
        .map(|(lpc, _)| lpc)
    }

    /// Same as [`Sound::to_lpc_burg`], also returning the per-frame status
    pub fn to_lpc_burg_with_status(
        &self,
        prediction_order: usize,
        effective_analysis_width: f64,
        time_step: f64,
        pre_emphasis_frequency: f64,
        config: &ThreadingConfig,
    ) -> Result<(Lpc, SoundIntoLpcStatus)> {
        if prediction_order == 0 {
            return Err(PraatError::InvalidParameter(
                "prediction order must be at least 1".to_string(),
            ));
        }
        let width = WindowShape::Gaussian.physical_analysis_width(effective_analysis_width);
        let frames = SoundFrames::new(self.pre_emphasis(pre_emphasis_frequency), width, time_step)?;
        if frames.frame_size() <= prediction_order {
            return Err(PraatError::InvalidParameter(format!(
                "analysis window holds {} samples, too few for prediction order {}",
                frames.frame_size(),
                prediction_order
            )));
        }

        let mut lpc = Lpc::new(frames.domain(), self.dx(), prediction_order);
        let config = config.with_status_updates(true);
        let mut status = SoundIntoLpcStatus::new(frames.nx());
        let workspace = SoundFrameIntoLpcFrameBurg::new(&frames, prediction_order);
        let errors =
            SampledIntoSampled::create(&frames, &mut lpc, workspace, &mut status, config)?
                .analyse_threaded()?;
        if errors > 0 {
            log::warn!("Sound to LPC (Burg): {errors} frame(s) without energy");
        }
        Ok((lpc, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lpc_frame_stability() {
        // A(z) = 1 - 1.6 z^-1 + 0.95 z^-2: poles at radius sqrt(0.95)
        assert!(LpcFrame::from_coefficients(&[-1.6, 0.95], 1.0).is_stable().unwrap());
        // pole at z = 1.5
        assert!(!LpcFrame::from_coefficients(&[-1.5], 1.0).is_stable().unwrap());
        assert!(LpcFrame::new(0).is_stable().unwrap());
    }

    #[test]
    fn test_lpc_from_frames_validation() {
        let domain = SampledDomain::new(0.0, 1.0, 2, 0.5, 0.25).unwrap();
        let frames = vec![LpcFrame::new(2), LpcFrame::new(3)];
        assert!(Lpc::from_frames(domain, 1e-4, 2, frames.clone()).is_err());
        assert!(Lpc::from_frames(domain, 1e-4, 3, frames[..1].to_vec()).is_err());
        let lpc = Lpc::from_frames(domain, 1e-4, 3, frames).unwrap();
        assert_relative_eq!(lpc.maximum_frequency(), 5000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_burg_on_tone() {
        let sound = Sound::create_tone(500.0, 0.3, 8000.0, 0.5, 0.0);
        let config = ThreadingConfig::single_threaded().with_status_updates(true);
        let (lpc, status) = sound.to_lpc_burg_with_status(4, 0.025, 0.01, 50.0, &config).unwrap();
        assert!(lpc.num_frames() > 20);
        assert_eq!(status.number_of_problem_frames(), 0);
        for frame in lpc.frames() {
            assert_eq!(frame.number_of_coefficients(), 4);
            assert!(frame.gain() >= 0.0);
        }
        assert!(status.get(1).unwrap().frame_begin > status.get(0).unwrap().frame_begin);
    }

    #[test]
    fn test_burg_on_silence_reports_no_energy() {
        let sound = Sound::create_silence(0.2, 8000.0);
        let config = ThreadingConfig::default().with_status_updates(true);
        let (lpc, status) = sound.to_lpc_burg_with_status(6, 0.025, 0.01, 0.0, &config).unwrap();
        assert_eq!(status.number_of_problem_frames(), lpc.num_frames());
        assert_eq!(status.get(0).unwrap().info, FrameAnalysisInfo::NoEnergy);
        assert!(lpc.frames()[0].coefficients().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn test_burg_rejects_short_sound() {
        let sound = Sound::create_tone(500.0, 0.01, 8000.0, 0.5, 0.0);
        let config = ThreadingConfig::default();
        assert!(sound.to_lpc_burg(10, 0.025, 0.01, 50.0, &config).is_err());
    }
}
