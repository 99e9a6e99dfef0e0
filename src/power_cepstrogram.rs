//! Power cepstrogram: power cepstrum per frame
//!
//! Sound to PowerCepstrogram:
//! 1. Pre-emphasise the sound
//! 2. Lay out Gaussian frames of effective width `3 / pitch_floor`
//! 3. Per frame: subtract the mean, window, FFT (scaled by the sampling
//!    period), take `ln(re^2 + im^2)`, inverse FFT, and store the squared
//!    magnitudes of quefrency bins `q = k dx`, `k = 0..=N/2`
//!
//! The trend, peak and cepstral peak prominence (CPP) of a single power
//! cepstrum are computed on a [`CepstrumWorkspace`], which works in dB.

use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::config::ThreadingConfig;
use crate::frame_into_frame::{FrameIntoFrameState, SampledFrameIntoSampledFrame};
use crate::matrix::Matrix;
use crate::sampled::{Sampled, SampledDomain, SampledFrames};
use crate::sampled_into_sampled::SampledIntoSampled;
use crate::sound::Sound;
use crate::sound_frame::{SoundFrameBuffer, SoundFrames};
use crate::status::{SoundFrameInfo, SoundIntoPowerCepstrogramStatus};
use crate::utils::FrameFft;
use crate::window::WindowShape;
use crate::{PraatError, Result};

/// Default lower end of the trend fit range (s)
pub const DEFAULT_QMIN_FIT: f64 = 0.001;
/// Default time step of the cepstrogram (s)
pub const DEFAULT_TIME_STEP: f64 = 0.002;
/// Maximum number of fit-range bins the robust fit draws slopes from
///
/// Longer fit ranges are decimated evenly, so one fit evaluates at most
/// `n (n - 1) / 2` slopes for this `n`.
pub const MAXIMUM_NUMBER_OF_SLOPE_POINTS: usize = 128;

/// Shape of the trend line through the cepstrum in dB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrendLineType {
    /// `dB = slope * q + intercept`
    Linear,
    /// `dB = slope * ln(q) + intercept`
    #[default]
    ExponentialDecay,
}

/// How the trend line is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrendFitMethod {
    LeastSquares,
    /// Theil-Sen: median of pairwise slopes, median intercept
    ///
    /// Slopes are taken between at most [`MAXIMUM_NUMBER_OF_SLOPE_POINTS`]
    /// evenly spread bins of the fit range.
    #[default]
    Robust,
}

/// Quefrency range and model of a trend fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CepstrumTrendParameters {
    /// Lower end of the fit range (s); non-positive selects [`DEFAULT_QMIN_FIT`]
    pub qmin_fit: f64,
    /// Upper end of the fit range (s); non-positive selects the highest quefrency
    pub qmax_fit: f64,
    pub line_type: TrendLineType,
    pub fit_method: TrendFitMethod,
}

impl Default for CepstrumTrendParameters {
    fn default() -> Self {
        Self {
            qmin_fit: DEFAULT_QMIN_FIT,
            qmax_fit: 0.0,
            line_type: TrendLineType::default(),
            fit_method: TrendFitMethod::default(),
        }
    }
}

/// A fitted trend line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub line_type: TrendLineType,
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    fn abscissa(line_type: TrendLineType, quefrency: f64) -> f64 {
        match line_type {
            TrendLineType::Linear => quefrency,
            TrendLineType::ExponentialDecay => quefrency.ln(),
        }
    }

    /// Trend in dB at `quefrency`
    pub fn value_at(&self, quefrency: f64) -> f64 {
        self.slope * Self::abscissa(self.line_type, quefrency) + self.intercept
    }
}

fn to_db(power: f64) -> f64 {
    10.0 * (power + 1e-30).log10()
}

/// Median of `values`, reordering them
fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        upper
    } else {
        let lower_max = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        0.5 * (lower_max + upper)
    }
}

/// At most `maximum` bins spread evenly over `first..=last`, both ends included
fn decimated_bins(first: usize, last: usize, maximum: usize) -> Vec<usize> {
    let n = last - first + 1;
    let m = n.min(maximum.max(2));
    if m == n {
        return (first..=last).collect();
    }
    (0..m)
        .map(|i| first + (i * (n - 1) + (m - 1) / 2) / (m - 1))
        .collect()
}

/// Parabola through `(-1, y0), (0, y1), (1, y2)`: offset and value of its extremum
fn parabolic_peak(y0: f64, y1: f64, y2: f64) -> (f64, f64) {
    let denominator = 2.0 * (y0 + y2 - 2.0 * y1);
    if denominator.abs() < 1e-12 {
        return (0.0, y1);
    }
    let offset = (y0 - y2) / denominator;
    let peak = y1 - (y0 - y2) * (y0 - y2) / (4.0 * denominator);
    (offset.clamp(-0.5, 0.5), peak)
}

/// Trend, peak and CPP of one power cepstrum, on reusable buffers
#[derive(Debug, Clone)]
pub struct CepstrumWorkspace {
    db: Vec<f64>,
    dq: f64,
    parameters: CepstrumTrendParameters,
    fit_first: usize,
    fit_last: usize,
    peak_first: usize,
    peak_last: usize,
    slope_bins: Vec<usize>,
    scratch: Vec<f64>,
    residuals: Vec<f64>,
    trend: TrendLine,
    number_of_tries: usize,
    peak_db: f64,
    peak_quefrency: f64,
}

impl CepstrumWorkspace {
    /// Workspace for cepstra of `number_of_quefrencies` bins, `dq` apart
    ///
    /// Fails if the fit range holds fewer than two bins.
    pub fn new(number_of_quefrencies: usize, dq: f64, parameters: CepstrumTrendParameters) -> Result<Self> {
        if !(dq > 0.0) || number_of_quefrencies < 3 {
            return Err(PraatError::InvalidParameter(format!(
                "a power cepstrum needs at least 3 quefrencies and a positive step (got {number_of_quefrencies}, {dq})"
            )));
        }
        let last_bin = number_of_quefrencies - 1;
        let qmin_fit = if parameters.qmin_fit > 0.0 { parameters.qmin_fit } else { DEFAULT_QMIN_FIT };
        let mut fit_first = (qmin_fit / dq).ceil() as usize;
        if parameters.line_type == TrendLineType::ExponentialDecay {
            fit_first = fit_first.max(1);
        }
        let fit_last = if parameters.qmax_fit > 0.0 {
            ((parameters.qmax_fit / dq).floor() as usize).min(last_bin)
        } else {
            last_bin
        };
        if fit_last <= fit_first {
            return Err(PraatError::InvalidParameter(format!(
                "trend fit range [{qmin_fit}, {}] s holds fewer than 2 quefrencies",
                parameters.qmax_fit
            )));
        }
        let slope_bins = decimated_bins(fit_first, fit_last, MAXIMUM_NUMBER_OF_SLOPE_POINTS);
        let number_of_slopes = slope_bins.len() * (slope_bins.len() - 1) / 2;
        Ok(Self {
            db: vec![0.0; number_of_quefrencies],
            dq,
            parameters: CepstrumTrendParameters { qmin_fit, ..parameters },
            fit_first,
            fit_last,
            peak_first: 1,
            peak_last: last_bin - 1,
            slope_bins,
            scratch: Vec::with_capacity(number_of_slopes),
            residuals: Vec::with_capacity(fit_last - fit_first + 1),
            trend: TrendLine {
                line_type: parameters.line_type,
                slope: 0.0,
                intercept: 0.0,
            },
            number_of_tries: 0,
            peak_db: f64::NAN,
            peak_quefrency: f64::NAN,
        })
    }

    /// Restrict the peak search to the periods of `[pitch_floor, pitch_ceiling]`
    pub fn set_pitch_range(&mut self, pitch_floor: f64, pitch_ceiling: f64) -> Result<()> {
        if !(pitch_floor > 0.0) || !(pitch_ceiling > pitch_floor) {
            return Err(PraatError::InvalidParameter(format!(
                "pitch range [{pitch_floor}, {pitch_ceiling}] Hz is not valid"
            )));
        }
        let first = ((1.0 / pitch_ceiling / self.dq).ceil() as usize).max(1);
        let last = ((1.0 / pitch_floor / self.dq).floor() as usize).min(self.db.len() - 2);
        if last < first {
            return Err(PraatError::InvalidParameter(format!(
                "no quefrencies between 1/{pitch_ceiling} and 1/{pitch_floor} s"
            )));
        }
        self.peak_first = first;
        self.peak_last = last;
        Ok(())
    }

    pub fn quefrency(&self, bin: usize) -> f64 {
        bin as f64 * self.dq
    }

    /// Load a power cepstrum and convert it to dB
    pub fn load_power(&mut self, power: &[f64]) {
        for (db, &p) in self.db.iter_mut().zip(power) {
            *db = to_db(p);
        }
    }

    pub fn db(&self) -> &[f64] {
        &self.db
    }

    /// Write the current cepstrum back as power
    pub fn write_power(&self, power: &mut [f64]) {
        for (p, &db) in power.iter_mut().zip(&self.db) {
            *p = 10f64.powf(db / 10.0);
        }
    }

    pub fn trend(&self) -> TrendLine {
        self.trend
    }

    pub fn number_of_tries(&self) -> usize {
        self.number_of_tries
    }

    pub fn peak_db(&self) -> f64 {
        self.peak_db
    }

    pub fn peak_quefrency(&self) -> f64 {
        self.peak_quefrency
    }

    /// Fit the trend line over the fit range
    pub fn fit_trend(&mut self) -> TrendLine {
        let line_type = self.parameters.line_type;
        let (first, last) = (self.fit_first, self.fit_last);
        let x = |k: usize| TrendLine::abscissa(line_type, k as f64 * self.dq);

        let (slope, intercept, tries) = match self.parameters.fit_method {
            TrendFitMethod::LeastSquares => {
                let n = (last - first + 1) as f64;
                let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
                for k in first..=last {
                    let (xk, yk) = (x(k), self.db[k]);
                    sx += xk;
                    sy += yk;
                    sxx += xk * xk;
                    sxy += xk * yk;
                }
                let denominator = n * sxx - sx * sx;
                let slope = if denominator != 0.0 { (n * sxy - sx * sy) / denominator } else { 0.0 };
                (slope, (sy - slope * sx) / n, 1)
            }
            TrendFitMethod::Robust => {
                self.scratch.clear();
                for (a, &i) in self.slope_bins.iter().enumerate() {
                    for &j in &self.slope_bins[a + 1..] {
                        let dx = x(j) - x(i);
                        if dx != 0.0 {
                            self.scratch.push((self.db[j] - self.db[i]) / dx);
                        }
                    }
                }
                let tries = self.scratch.len();
                let slope = median(&mut self.scratch);
                self.residuals.clear();
                for k in first..=last {
                    self.residuals.push(self.db[k] - slope * x(k));
                }
                (slope, median(&mut self.residuals), tries)
            }
        };
        self.trend = TrendLine {
            line_type,
            slope,
            intercept,
        };
        self.number_of_tries = tries;
        self.trend
    }

    /// Subtract the fitted trend from the dB values
    ///
    /// With an exponential-decay trend the value at `q = 0` is left as is.
    pub fn subtract_trend(&mut self) {
        let first = match self.trend.line_type {
            TrendLineType::Linear => 0,
            TrendLineType::ExponentialDecay => 1,
        };
        for k in first..self.db.len() {
            let q = k as f64 * self.dq;
            self.db[k] -= self.trend.value_at(q);
        }
    }

    /// Locate the highest bin in the peak range and refine it with a parabola
    ///
    /// Returns false if that bin is not a local maximum; peak value and
    /// position are then those of the bin itself.
    pub fn find_peak(&mut self) -> bool {
        let mut best = self.peak_first;
        for k in self.peak_first..=self.peak_last {
            if self.db[k] > self.db[best] {
                best = k;
            }
        }
        let (y0, y1, y2) = (self.db[best - 1], self.db[best], self.db[best + 1]);
        if y0 < y1 && y1 >= y2 {
            let (offset, value) = parabolic_peak(y0, y1, y2);
            self.peak_db = value;
            self.peak_quefrency = (best as f64 + offset) * self.dq;
            true
        } else {
            self.peak_db = y1;
            self.peak_quefrency = best as f64 * self.dq;
            false
        }
    }

    /// Cepstral peak prominence: peak height above the trend line (dB)
    pub fn cpp(&self) -> f64 {
        self.peak_db - self.trend.value_at(self.peak_quefrency)
    }
}

/// One frame of a power cepstrogram
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCepstrum {
    values: Vec<f64>,
    dq: f64,
}

impl PowerCepstrum {
    /// Power values of bins `q = k * dq`, `k = 0, 1, ...`
    pub fn new(values: Vec<f64>, dq: f64) -> Self {
        Self { values, dq }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn number_of_quefrencies(&self) -> usize {
        self.values.len()
    }

    pub fn quefrency_step(&self) -> f64 {
        self.dq
    }

    pub fn get_quefrency_from_bin(&self, bin: usize) -> f64 {
        bin as f64 * self.dq
    }

    pub fn values_db(&self) -> Vec<f64> {
        self.values.iter().map(|&p| to_db(p)).collect()
    }

    pub fn fit_trend(&self, parameters: CepstrumTrendParameters) -> Result<TrendLine> {
        let mut workspace = CepstrumWorkspace::new(self.values.len(), self.dq, parameters)?;
        workspace.load_power(&self.values);
        Ok(workspace.fit_trend())
    }

    /// Peak in dB and its quefrency within the pitch range; `None` if the
    /// highest bin there is not a local maximum
    pub fn get_peak(&self, pitch_floor: f64, pitch_ceiling: f64) -> Result<Option<(f64, f64)>> {
        let mut workspace =
            CepstrumWorkspace::new(self.values.len(), self.dq, CepstrumTrendParameters::default())?;
        workspace.set_pitch_range(pitch_floor, pitch_ceiling)?;
        workspace.load_power(&self.values);
        Ok(workspace
            .find_peak()
            .then(|| (workspace.peak_db(), workspace.peak_quefrency())))
    }

    /// Cepstral peak prominence (dB)
    pub fn get_peak_prominence(
        &self,
        pitch_floor: f64,
        pitch_ceiling: f64,
        parameters: CepstrumTrendParameters,
    ) -> Result<f64> {
        let mut workspace = CepstrumWorkspace::new(self.values.len(), self.dq, parameters)?;
        workspace.set_pitch_range(pitch_floor, pitch_ceiling)?;
        workspace.load_power(&self.values);
        workspace.fit_trend();
        workspace.find_peak();
        Ok(workspace.cpp())
    }
}

/// Power cepstra for every frame of a sampled time axis
///
/// A matrix whose rows are quefrency bins `q = k dq`, `k = 0..nq`.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCepstrogram {
    matrix: Matrix,
}

impl PowerCepstrogram {
    pub fn new(domain: SampledDomain, number_of_quefrencies: usize, quefrency_step: f64) -> Result<Self> {
        let maximum_quefrency = (number_of_quefrencies.max(2) - 1) as f64 * quefrency_step;
        Ok(Self {
            matrix: Matrix::new(domain, 0.0, maximum_quefrency, number_of_quefrencies, quefrency_step, 0.0)?,
        })
    }

    /// Take a matrix with quefrency rows starting at 0
    pub fn from_matrix(matrix: Matrix) -> Result<Self> {
        if matrix.y1() != 0.0 {
            return Err(PraatError::InvalidParameter(format!(
                "first quefrency must be 0, not {}",
                matrix.y1()
            )));
        }
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn into_matrix(self) -> Matrix {
        self.matrix
    }

    pub fn number_of_quefrencies(&self) -> usize {
        self.matrix.ny()
    }

    pub fn quefrency_step(&self) -> f64 {
        self.matrix.dy()
    }

    pub fn num_frames(&self) -> usize {
        self.matrix.num_frames()
    }

    pub fn get_time_from_frame(&self, frame: usize) -> f64 {
        self.domain().index_to_x(frame)
    }

    /// Copy of frame `index` as a single power cepstrum
    pub fn frame(&self, index: usize) -> Option<PowerCepstrum> {
        self.matrix
            .column(index)
            .map(|values| PowerCepstrum::new(values.to_vec(), self.quefrency_step()))
    }
}

impl Sampled for PowerCepstrogram {
    fn domain(&self) -> SampledDomain {
        self.matrix.domain()
    }
}

impl SampledFrames for PowerCepstrogram {
    type Frame = Vec<f64>;

    fn frames(&self) -> &[Vec<f64>] {
        self.matrix.frames()
    }

    fn frames_mut(&mut self) -> &mut [Vec<f64>] {
        self.matrix.frames_mut()
    }
}

/// Power cepstrum of one sound frame
#[derive(Debug, Clone)]
pub struct SoundFrameIntoPowerCepstrogramFrame {
    state: FrameIntoFrameState,
    frame: SoundFrameBuffer,
    fft: FrameFft,
    sampling_period: f64,
    cepstrum: Vec<f64>,
}

impl SoundFrameIntoPowerCepstrogramFrame {
    pub fn new(input: &SoundFrames) -> Self {
        let frame_size = input.frame_size();
        let fft = FrameFft::new(frame_size.next_power_of_two());
        Self {
            state: FrameIntoFrameState::default(),
            frame: SoundFrameBuffer::new(frame_size, WindowShape::Gaussian, true),
            cepstrum: vec![0.0; fft.number_of_frequencies()],
            fft,
            sampling_period: input.sound().dx(),
        }
    }

    pub fn number_of_quefrencies(&self) -> usize {
        self.cepstrum.len()
    }
}

impl SampledFrameIntoSampledFrame for SoundFrameIntoPowerCepstrogramFrame {
    type Input = SoundFrames;
    type Output = PowerCepstrogram;
    type Status = SoundFrameInfo;

    fn allocate_output_frames(&mut self, _input: &SoundFrames, output: &mut PowerCepstrogram) -> Result<()> {
        if output.number_of_quefrencies() != self.cepstrum.len() {
            return Err(PraatError::InvalidParameter(format!(
                "cepstrogram has {} quefrencies, the analysis produces {}",
                output.number_of_quefrencies(),
                self.cepstrum.len()
            )));
        }
        for frame in output.frames_mut() {
            frame.clear();
            frame.resize(self.cepstrum.len(), 0.0);
        }
        Ok(())
    }

    fn get_input_frame(&mut self, input: &SoundFrames) -> Result<()> {
        self.frame.load(input, self.state.current_frame);
        Ok(())
    }

    fn input_frame_to_output_frame(&mut self) -> Result<bool> {
        let dx = self.sampling_period;
        self.fft.load_real(self.frame.samples());
        self.fft.forward();
        for c in self.fft.buffer_mut() {
            let power = (c.re * dx).powi(2) + (c.im * dx).powi(2);
            *c = Complex::new((power + 1e-300).ln(), 0.0);
        }
        self.fft.inverse();
        let scale = 1.0 / self.fft.size() as f64;
        for (value, c) in self.cepstrum.iter_mut().zip(self.fft.buffer()) {
            *value = c.norm_sqr() * scale * scale;
        }
        Ok(true)
    }

    fn save_output_frame(&mut self, frame: &mut Vec<f64>) -> Result<()> {
        frame.clear();
        frame.extend_from_slice(&self.cepstrum);
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
    /// Short-term power cepstrum
    ///
    /// # Arguments
    /// * `pitch_floor` - Lowest expected pitch (Hz); the effective window is `3 / pitch_floor`
    /// * `time_step` - Time between frame centres (s); non-positive selects 0.002
    /// * `pre_emphasis_frequency` - Pre-emphasis from this frequency (Hz, 0 for none)
    /// * `config` - Threading configuration
    pub fn to_power_cepstrogram(
        &self,
        pitch_floor: f64,
        time_step: f64,
        pre_emphasis_frequency: f64,
        config: &ThreadingConfig,
    ) -> Result<PowerCepstrogram> {
        self.to_power_cepstrogram_with_status(pitch_floor, time_step, pre_emphasis_frequency, config)
            .map(|(cepstrogram, _)| cepstrogram)
    }

    /// Same as [`Sound::to_power_cepstrogram`], also returning the per-frame status
    pub fn to_power_cepstrogram_with_status(
        &self,
        pitch_floor: f64,
        time_step: f64,
        pre_emphasis_frequency: f64,
        config: &ThreadingConfig,
    ) -> Result<(PowerCepstrogram, SoundIntoPowerCepstrogramStatus)> {
        if !(pitch_floor > 0.0) {
            return Err(PraatError::InvalidParameter(format!(
                "pitch floor ({pitch_floor}) must be positive"
            )));
        }
        let time_step = if time_step > 0.0 { time_step } else { DEFAULT_TIME_STEP };
        let width = WindowShape::Gaussian.physical_analysis_width(3.0 / pitch_floor);
        let frames = SoundFrames::new(self.pre_emphasis(pre_emphasis_frequency), width, time_step)?;

        let workspace = SoundFrameIntoPowerCepstrogramFrame::new(&frames);
        let mut cepstrogram =
            PowerCepstrogram::new(frames.domain(), workspace.number_of_quefrencies(), self.dx())?;
        let config = config.with_status_updates(true);
        let mut status = SoundIntoPowerCepstrogramStatus::new(frames.nx());
        SampledIntoSampled::create(&frames, &mut cepstrogram, workspace, &mut status, config)?
            .analyse_threaded()?;
        Ok((cepstrogram, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_cepstrum(dq: f64, n: usize, slope: f64, intercept: f64, line_type: TrendLineType) -> PowerCepstrum {
        let values = (0..n)
            .map(|k| {
                let q = k as f64 * dq;
                let x = match line_type {
                    TrendLineType::Linear => q,
                    TrendLineType::ExponentialDecay => q.max(dq).ln(),
                };
                10f64.powf((slope * x + intercept) / 10.0)
            })
            .collect();
        PowerCepstrum::new(values, dq)
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&mut []).is_nan());
    }

    #[test]
    fn test_parabolic_peak() {
        let (offset, value) = parabolic_peak(1.0, 2.0, 1.0);
        assert_relative_eq!(offset, 0.0);
        assert_relative_eq!(value, 2.0);
        // y = -(x - 0.25)^2
        let (offset, value) = parabolic_peak(-1.5625, -0.0625, -0.5625);
        assert_relative_eq!(offset, 0.25, epsilon = 1e-12);
        assert_relative_eq!(value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trend_fits_recover_line() {
        for line_type in [TrendLineType::Linear, TrendLineType::ExponentialDecay] {
            let cepstrum = line_cepstrum(0.001, 40, -200.0, -20.0, line_type);
            for fit_method in [TrendFitMethod::LeastSquares, TrendFitMethod::Robust] {
                let parameters = CepstrumTrendParameters {
                    qmin_fit: 0.002,
                    qmax_fit: 0.03,
                    line_type,
                    fit_method,
                };
                let trend = cepstrum.fit_trend(parameters).unwrap();
                assert_relative_eq!(trend.slope, -200.0, epsilon = 1e-6);
                assert_relative_eq!(trend.intercept, -20.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_robust_fit_ignores_outlier() {
        let mut cepstrum = line_cepstrum(0.001, 40, -100.0, 0.0, TrendLineType::Linear);
        cepstrum.values[10] *= 1e6;
        let parameters = CepstrumTrendParameters {
            qmin_fit: 0.001,
            qmax_fit: 0.039,
            line_type: TrendLineType::Linear,
            fit_method: TrendFitMethod::Robust,
        };
        let trend = cepstrum.fit_trend(parameters).unwrap();
        assert_relative_eq!(trend.slope, -100.0, epsilon = 1e-6);
        assert_relative_eq!(trend.value_at(0.02), -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_decimated_bins() {
        assert_eq!(decimated_bins(3, 7, 10), vec![3, 4, 5, 6, 7]);
        let bins = decimated_bins(10, 4106, 128);
        assert_eq!(bins.len(), 128);
        assert_eq!(bins[0], 10);
        assert_eq!(bins[127], 4106);
        assert!(bins.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_robust_fit_on_long_cepstrum_is_bounded() {
        // 44.1 kHz, 60 Hz pitch floor: 4097 quefrencies
        let dq = 1.0 / 44100.0;
        let mut cepstrum = line_cepstrum(dq, 4097, -30.0, 5.0, TrendLineType::ExponentialDecay);
        for k in (100..4000).step_by(397) {
            cepstrum.values[k] *= 1e4;
        }
        let mut workspace = CepstrumWorkspace::new(4097, dq, CepstrumTrendParameters::default()).unwrap();
        workspace.load_power(cepstrum.values());
        let trend = workspace.fit_trend();

        let limit = MAXIMUM_NUMBER_OF_SLOPE_POINTS * (MAXIMUM_NUMBER_OF_SLOPE_POINTS - 1) / 2;
        assert!(workspace.number_of_tries() > 0);
        assert!(workspace.number_of_tries() <= limit);
        assert_relative_eq!(trend.slope, -30.0, epsilon = 1e-6);
        assert_relative_eq!(trend.intercept, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_peak_and_prominence() {
        let mut cepstrum = line_cepstrum(0.001, 40, -100.0, 0.0, TrendLineType::Linear);
        // 30 dB bump at 10 ms
        cepstrum.values[10] *= 1000.0;
        let (peak_db, quefrency) = cepstrum.get_peak(60.0, 330.0).unwrap().unwrap();
        assert_relative_eq!(quefrency, 0.010, epsilon = 1e-4);
        assert!(peak_db > 0.0);
        let parameters = CepstrumTrendParameters {
            qmin_fit: 0.001,
            qmax_fit: 0.039,
            line_type: TrendLineType::Linear,
            fit_method: TrendFitMethod::Robust,
        };
        let cpp = cepstrum.get_peak_prominence(60.0, 330.0, parameters).unwrap();
        assert!(cpp > 25.0 && cpp < 35.0, "cpp {cpp}");
    }

    #[test]
    fn test_flat_cepstrum_has_no_peak() {
        let cepstrum = PowerCepstrum::new(vec![1.0; 40], 0.001);
        assert!(cepstrum.get_peak(60.0, 330.0).unwrap().is_none());
    }

    #[test]
    fn test_workspace_rejects_bad_ranges() {
        let parameters = CepstrumTrendParameters {
            qmin_fit: 0.01,
            qmax_fit: 0.01,
            ..Default::default()
        };
        assert!(CepstrumWorkspace::new(40, 0.001, parameters).is_err());
        let mut workspace = CepstrumWorkspace::new(40, 0.001, CepstrumTrendParameters::default()).unwrap();
        assert!(workspace.set_pitch_range(300.0, 200.0).is_err());
        // periods beyond the last bin
        assert!(workspace.set_pitch_range(10.0, 20.0).is_err());
    }

    #[test]
    fn test_subtract_trend_flattens_line() {
        let cepstrum = line_cepstrum(0.001, 40, -50.0, 10.0, TrendLineType::Linear);
        let parameters = CepstrumTrendParameters {
            qmin_fit: 0.001,
            qmax_fit: 0.039,
            line_type: TrendLineType::Linear,
            fit_method: TrendFitMethod::LeastSquares,
        };
        let mut workspace = CepstrumWorkspace::new(40, 0.001, parameters).unwrap();
        workspace.load_power(cepstrum.values());
        workspace.fit_trend();
        workspace.subtract_trend();
        for &db in workspace.db() {
            assert_relative_eq!(db, 0.0, epsilon = 1e-6);
        }
        let mut power = vec![0.0; 40];
        workspace.write_power(&mut power);
        assert_relative_eq!(power[5], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pulse_train_cepstral_peak() {
        let sound = Sound::create_pulse_train(100.0, 0.5, 10000.0);
        let cepstrogram = sound
            .to_power_cepstrogram(60.0, 0.02, 0.0, &ThreadingConfig::default())
            .unwrap();
        assert!(cepstrogram.num_frames() > 0);
        assert_relative_eq!(cepstrogram.quefrency_step(), 1e-4);
        let frame = cepstrogram.frame(cepstrogram.num_frames() / 2).unwrap();
        let (_, quefrency) = frame.get_peak(60.0, 330.0).unwrap().unwrap();
        assert_relative_eq!(quefrency, 0.01, epsilon = 2e-4);
    }

    #[test]
    fn test_parameters_serde() {
        let parameters = CepstrumTrendParameters::default();
        let json = serde_json::to_string(&parameters).unwrap();
        let back: CepstrumTrendParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parameters);
        let partial: CepstrumTrendParameters = serde_json::from_str(r#"{"fit_method":"LeastSquares"}"#).unwrap();
        assert_eq!(partial.fit_method, TrendFitMethod::LeastSquares);
        assert_eq!(partial.line_type, TrendLineType::ExponentialDecay);
    }
}
