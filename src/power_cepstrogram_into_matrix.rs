//! Trend, cepstral peak and CPP for every frame of a power cepstrogram
//!
//! Per frame the cepstrum is converted to dB and a trend line is fitted.
//! The result is either the detrended cepstrogram, or a table with one
//! column per frame and the rows
//!
//! | row | value |
//! |-----|-------|
//! | 0 | frame time (s) |
//! | 1 | trend slope |
//! | 2 | trend intercept (dB) |
//! | 3 | peak (dB) |
//! | 4 | peak quefrency (s) |
//! | 5 | cepstral peak prominence (dB) |

use crate::config::ThreadingConfig;
use crate::frame_into_frame::{FrameIntoFrameState, SampledFrameIntoSampledFrame};
use crate::matrix::Matrix;
use crate::power_cepstrogram::{CepstrumTrendParameters, CepstrumWorkspace, PowerCepstrogram};
use crate::sampled::{Sampled, SampledDomain, SampledFrames};
use crate::sampled_into_sampled::SampledIntoSampled;
use crate::status::{CepstrumTrendInfo, FrameAnalysisInfo, PowerCepstrogramIntoMatrixStatus};
use crate::{PraatError, Result};

/// Number of rows of the peak prominence table
pub const NUMBER_OF_TABLE_ROWS: usize = 6;

pub const DEFAULT_PITCH_FLOOR: f64 = 60.0;
pub const DEFAULT_PITCH_CEILING: f64 = 330.0;

/// What the transform writes per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatrixContent {
    /// The cepstrum minus its trend, as power
    Detrended,
    /// Time, trend, peak and CPP
    PeakTable,
}

/// Cepstral analysis of one cepstrogram frame into one matrix column
#[derive(Debug, Clone)]
pub struct PowerCepstrogramFrameIntoMatrixFrame {
    state: FrameIntoFrameState,
    workspace: CepstrumWorkspace,
    domain: SampledDomain,
    content: MatrixContent,
}

impl PowerCepstrogramFrameIntoMatrixFrame {
    /// Transform writing the peak prominence table
    pub fn peak_table(
        input: &PowerCepstrogram,
        pitch_floor: f64,
        pitch_ceiling: f64,
        trend: CepstrumTrendParameters,
    ) -> Result<Self> {
        let mut workspace =
            CepstrumWorkspace::new(input.number_of_quefrencies(), input.quefrency_step(), trend)?;
        workspace.set_pitch_range(pitch_floor, pitch_ceiling)?;
        Ok(Self {
            state: FrameIntoFrameState::default(),
            workspace,
            domain: input.domain(),
            content: MatrixContent::PeakTable,
        })
    }

    /// Transform writing the detrended cepstrum
    pub fn detrended(input: &PowerCepstrogram, trend: CepstrumTrendParameters) -> Result<Self> {
        Ok(Self {
            state: FrameIntoFrameState::default(),
            workspace: CepstrumWorkspace::new(input.number_of_quefrencies(), input.quefrency_step(), trend)?,
            domain: input.domain(),
            content: MatrixContent::Detrended,
        })
    }

    fn number_of_rows(&self) -> usize {
        match self.content {
            MatrixContent::Detrended => self.workspace.db().len(),
            MatrixContent::PeakTable => NUMBER_OF_TABLE_ROWS,
        }
    }
}

impl SampledFrameIntoSampledFrame for PowerCepstrogramFrameIntoMatrixFrame {
    type Input = PowerCepstrogram;
    type Output = Matrix;
    type Status = CepstrumTrendInfo;

    fn allocate_output_frames(&mut self, _input: &PowerCepstrogram, output: &mut Matrix) -> Result<()> {
        let rows = self.number_of_rows();
        if output.ny() != rows {
            return Err(PraatError::InvalidParameter(format!(
                "output matrix has {} rows, expected {rows}",
                output.ny()
            )));
        }
        for frame in output.frames_mut() {
            frame.clear();
            frame.resize(rows, 0.0);
        }
        Ok(())
    }

    fn get_input_frame(&mut self, input: &PowerCepstrogram) -> Result<()> {
        let frame = self.state.current_frame;
        let column = input.matrix().column(frame).ok_or_else(|| {
            PraatError::Analysis(format!("power cepstrogram has no frame {frame}"))
        })?;
        self.workspace.load_power(column);
        Ok(())
    }

    fn input_frame_to_output_frame(&mut self) -> Result<bool> {
        self.workspace.fit_trend();
        match self.content {
            MatrixContent::Detrended => {
                self.workspace.subtract_trend();
                Ok(true)
            }
            MatrixContent::PeakTable => {
                if self.workspace.find_peak() {
                    Ok(true)
                } else {
                    self.state.frame_analysis_info = FrameAnalysisInfo::NoPeak;
                    Ok(false)
                }
            }
        }
    }

    fn save_output_frame(&mut self, frame: &mut Vec<f64>) -> Result<()> {
        match self.content {
            MatrixContent::Detrended => self.workspace.write_power(frame),
            MatrixContent::PeakTable => {
                let trend = self.workspace.trend();
                let row = [
                    self.domain.index_to_x(self.state.current_frame),
                    trend.slope,
                    trend.intercept,
                    self.workspace.peak_db(),
                    self.workspace.peak_quefrency(),
                    self.workspace.cpp(),
                ];
                frame.clear();
                frame.extend_from_slice(&row);
            }
        }
        Ok(())
    }

    fn frame_status(&self) -> CepstrumTrendInfo {
        let trend = self.workspace.trend();
        CepstrumTrendInfo {
            info: self.state.frame_analysis_info,
            start_frame: self.state.start_frame,
            slope: trend.slope,
            intercept: trend.intercept,
            number_of_tries: self.workspace.number_of_tries(),
        }
    }

    fn state(&self) -> &FrameIntoFrameState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FrameIntoFrameState {
        &mut self.state
    }
}

impl PowerCepstrogram {
    /// Trend, peak and cepstral peak prominence of every frame
    ///
    /// # Arguments
    /// * `pitch_floor`, `pitch_ceiling` - The peak is searched between
    ///   `1 / pitch_ceiling` and `1 / pitch_floor`; non-positive values select 60 and 330 Hz
    /// * `trend` - Fit range and model of the trend line
    /// * `config` - Threading configuration
    pub fn to_peak_prominence_matrix(
        &self,
        pitch_floor: f64,
        pitch_ceiling: f64,
        trend: CepstrumTrendParameters,
        config: &ThreadingConfig,
    ) -> Result<Matrix> {
        self.to_peak_prominence_matrix_with_status(pitch_floor, pitch_ceiling, trend, config)
            .map(|(matrix, _)| matrix)
    }

    /// Same as [`PowerCepstrogram::to_peak_prominence_matrix`], also
    /// returning the per-frame status
    pub fn to_peak_prominence_matrix_with_status(
        &self,
        pitch_floor: f64,
        pitch_ceiling: f64,
        trend: CepstrumTrendParameters,
        config: &ThreadingConfig,
    ) -> Result<(Matrix, PowerCepstrogramIntoMatrixStatus)> {
        let pitch_floor = if pitch_floor > 0.0 { pitch_floor } else { DEFAULT_PITCH_FLOOR };
        let pitch_ceiling = if pitch_ceiling > 0.0 { pitch_ceiling } else { DEFAULT_PITCH_CEILING };
        let workspace =
            PowerCepstrogramFrameIntoMatrixFrame::peak_table(self, pitch_floor, pitch_ceiling, trend)?;
        let mut matrix = Matrix::with_numbered_rows(self.domain(), NUMBER_OF_TABLE_ROWS)?;
        let config = config.with_status_updates(true);
        let mut status = PowerCepstrogramIntoMatrixStatus::new(self.nx());
        let errors = SampledIntoSampled::create(self, &mut matrix, workspace, &mut status, config)?
            .analyse_threaded()?;
        if errors > 0 {
            log::warn!("PowerCepstrogram to Matrix: {errors} frame(s) without a cepstral peak");
        }
        Ok((matrix, status))
    }

    /// Cepstral peak prominence of every frame (dB)
    pub fn get_cpp_values(
        &self,
        pitch_floor: f64,
        pitch_ceiling: f64,
        trend: CepstrumTrendParameters,
        config: &ThreadingConfig,
    ) -> Result<Vec<f64>> {
        let matrix = self.to_peak_prominence_matrix(pitch_floor, pitch_ceiling, trend, config)?;
        matrix
            .row(NUMBER_OF_TABLE_ROWS - 1)
            .ok_or_else(|| PraatError::Analysis("peak prominence table has no CPP row".to_string()))
    }

    /// Copy of the cepstrogram with every frame's trend removed
    pub fn subtract_trend(
        &self,
        trend: CepstrumTrendParameters,
        config: &ThreadingConfig,
    ) -> Result<PowerCepstrogram> {
        let workspace = PowerCepstrogramFrameIntoMatrixFrame::detrended(self, trend)?;
        let mut detrended = PowerCepstrogram::new(
            self.domain(),
            self.number_of_quefrencies(),
            self.quefrency_step(),
        )?
        .into_matrix();
        let mut status = PowerCepstrogramIntoMatrixStatus::new(self.nx());
        SampledIntoSampled::create(self, &mut detrended, workspace, &mut status, *config)?
            .analyse_threaded()?;
        PowerCepstrogram::from_matrix(detrended)
    }
}
