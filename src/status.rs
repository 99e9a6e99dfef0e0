//! Per-frame diagnostics of a frame-by-frame analysis
//!
//! A status object has one record per output frame. During a threaded run
//! every record is written by exactly one worker: the one that owns the
//! frame. Each analysis kind has its own record type; the common part is the
//! [`FrameAnalysisInfo`] code.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of the analysis of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameAnalysisInfo {
    /// The frame was analysed without problems
    #[default]
    Ok,
    /// The grid search could not isolate all roots within 10 grid halvings
    TooManyBisections,
    /// One or more bracketed roots were not found; fewer values were saved
    MissingRoots,
    /// Reconstructed polynomials have different numbers of coefficients
    InconsistentPolynomials,
    /// The input frame has no energy
    NoEnergy,
    /// No peak could be located in the search interval
    NoPeak,
}

impl FrameAnalysisInfo {
    pub fn is_ok(self) -> bool {
        self == FrameAnalysisInfo::Ok
    }

    /// Numeric code as written in status tables
    pub fn code(self) -> i32 {
        match self {
            FrameAnalysisInfo::Ok => 0,
            FrameAnalysisInfo::TooManyBisections => 1,
            FrameAnalysisInfo::MissingRoots => 2,
            FrameAnalysisInfo::InconsistentPolynomials => 3,
            FrameAnalysisInfo::NoEnergy => 4,
            FrameAnalysisInfo::NoPeak => 5,
        }
    }
}

impl fmt::Display for FrameAnalysisInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One per-frame record of a status object
pub trait FrameStatus: Clone + Default + Send + fmt::Debug {
    fn info(&self) -> FrameAnalysisInfo;

    /// Column names after "frame" and "info" in the status table
    fn extra_columns() -> &'static [&'static str] {
        &[]
    }

    /// Values for [`FrameStatus::extra_columns`], tab separated
    fn write_extra(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

/// Status record that only holds the analysis info
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    pub info: FrameAnalysisInfo,
}

impl FrameStatus for FrameInfo {
    fn info(&self) -> FrameAnalysisInfo {
        self.info
    }
}

/// Status record for analyses that read frames from a Sound
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoundFrameInfo {
    pub info: FrameAnalysisInfo,
    /// Index of the first sound sample of the frame
    pub frame_begin: usize,
}

impl FrameStatus for SoundFrameInfo {
    fn info(&self) -> FrameAnalysisInfo {
        self.info
    }

    fn extra_columns() -> &'static [&'static str] {
        &["begin"]
    }

    fn write_extra(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t{}", self.frame_begin)
    }
}

/// Status record for cepstral trend analyses
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CepstrumTrendInfo {
    pub info: FrameAnalysisInfo,
    /// First frame of the chunk the frame was analysed in
    pub start_frame: usize,
    pub slope: f64,
    pub intercept: f64,
    /// Number of slopes evaluated by the fit
    pub number_of_tries: usize,
}

impl FrameStatus for CepstrumTrendInfo {
    fn info(&self) -> FrameAnalysisInfo {
        self.info
    }

    fn extra_columns() -> &'static [&'static str] {
        &["begin", "slope", "intercept", "ntries"]
    }

    fn write_extra(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\t{}\t{}\t{}\t{}",
            self.start_frame, self.slope, self.intercept, self.number_of_tries
        )
    }
}

/// Per-frame diagnostics for a complete analysis
#[derive(Debug, Clone, PartialEq)]
pub struct SampledIntoSampledStatus<R: FrameStatus> {
    records: Vec<R>,
}

/// Status of LPC <-> line spectral frequency conversions
pub type LpcAndLineSpectralFrequenciesStatus = SampledIntoSampledStatus<FrameInfo>;
/// Status of Sound to LPC analyses
pub type SoundIntoLpcStatus = SampledIntoSampledStatus<SoundFrameInfo>;
/// Status of Sound to Spectrogram analyses
pub type SoundIntoSpectrogramStatus = SampledIntoSampledStatus<SoundFrameInfo>;
/// Status of Sound to PowerCepstrogram analyses
pub type SoundIntoPowerCepstrogramStatus = SampledIntoSampledStatus<SoundFrameInfo>;
/// Status of PowerCepstrogram to Matrix analyses
pub type PowerCepstrogramIntoMatrixStatus = SampledIntoSampledStatus<CepstrumTrendInfo>;

impl<R: FrameStatus> SampledIntoSampledStatus<R> {
    /// Create a status object with one default record per frame
    pub fn new(number_of_frames: usize) -> Self {
        Self {
            records: vec![R::default(); number_of_frames],
        }
    }

    pub fn number_of_frames(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }

    /// Record of frame `index` (0-based)
    pub fn get(&self, index: usize) -> Option<&R> {
        self.records.get(index)
    }

    /// Analysis info of every frame, in frame order
    pub fn frame_infos(&self) -> Vec<FrameAnalysisInfo> {
        self.records.iter().map(|r| r.info()).collect()
    }

    /// Number of frames whose analysis reported a problem
    pub fn number_of_problem_frames(&self) -> usize {
        self.records.iter().filter(|r| !r.info().is_ok()).count()
    }
}

/// Tab-separated status table, one line per frame (frame numbers 1-based)
impl<R: FrameStatus> fmt::Display for SampledIntoSampledStatus<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame\tinfo")?;
        for column in R::extra_columns() {
            write!(f, "\t{column}")?;
        }
        writeln!(f)?;
        for (i, record) in self.records.iter().enumerate() {
            write!(f, "{}\t{}", i + 1, record.info())?;
            record.write_extra(f)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_status_is_ok() {
        let status = LpcAndLineSpectralFrequenciesStatus::new(5);
        assert_eq!(status.number_of_frames(), 5);
        assert_eq!(status.number_of_problem_frames(), 0);
        assert!(status.frame_infos().iter().all(|i| i.is_ok()));
    }

    #[test]
    fn test_status_table() {
        let mut status = PowerCepstrogramIntoMatrixStatus::new(2);
        status.records_mut()[1] = CepstrumTrendInfo {
            info: FrameAnalysisInfo::NoPeak,
            start_frame: 1,
            slope: -2.0,
            intercept: 10.0,
            number_of_tries: 3,
        };
        let table = status.to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "frame\tinfo\tbegin\tslope\tintercept\tntries");
        assert_eq!(lines[2], "2\t5\t1\t-2\t10\t3");
        assert_eq!(status.number_of_problem_frames(), 1);
    }
}
