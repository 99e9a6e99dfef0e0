//! praat-sampled: frame-by-frame analysis of Praat's Sampled objects
//!
//! Many of Praat's analyses turn one sampled object into another sampled
//! object with the same time domain and frame layout: each output frame is
//! computed from the input frame with the same index, independently of all
//! other frames. This crate implements that pattern once, as a
//! multi-threaded pipeline, and provides the analyses built on top of it.
//!
//! # Core Types
//!
//! - [`SampledIntoSampled`] - Drives a frame transform over all frames, in parallel
//! - [`SampledFrameIntoSampledFrame`] - The per-frame transform contract
//! - [`SampledIntoSampledStatus`] - Per-frame diagnostics of a run
//! - [`Lpc`] - Linear prediction coefficients per frame
//! - [`LineSpectralFrequencies`] - Line spectral frequencies per frame
//! - [`Spectrogram`] - Power spectral density per frame
//! - [`PowerCepstrogram`] - Power cepstrum per frame
//! - [`Matrix`] - Generic frame-by-row matrix (cepstral peak prominence tables)
//!
//! # Analyses
//!
//! - LPC to line spectral frequencies and back (Rothweiler's polynomial reduction)
//! - Sound to LPC with Burg's method
//! - Sound to Spectrogram
//! - Sound to PowerCepstrogram, and PowerCepstrogram to trend/peak/CPP tables

pub mod config;
pub mod sampled;
pub mod status;
pub mod frame_into_frame;
pub mod thread_runner;
pub mod sampled_into_sampled;

pub mod polynomial;
pub mod roots;

pub mod sound;
pub mod window;
pub mod sound_frame;
pub mod lpc;
pub mod line_spectral_frequencies;
pub mod lpc_and_line_spectral_frequencies;
pub mod spectrum;
pub mod spectrogram;
pub mod matrix;
pub mod power_cepstrogram;
pub mod power_cepstrogram_into_matrix;

pub mod utils;

// Re-export main types at crate root
pub use config::ThreadingConfig;
pub use sampled::{Sampled, SampledDomain, SampledFrames};
pub use status::{FrameAnalysisInfo, FrameStatus, SampledIntoSampledStatus};
pub use frame_into_frame::{FramePhase, FrameIntoFrameState, SampledFrameIntoSampledFrame};
pub use sampled_into_sampled::SampledIntoSampled;
pub use polynomial::Polynomial;
pub use roots::Roots;
pub use sound::Sound;
pub use window::{praat_gaussian_window, WindowShape};
pub use lpc::{Lpc, LpcFrame};
pub use line_spectral_frequencies::{LineSpectralFrequencies, LineSpectralFrequenciesFrame};
pub use spectrum::Spectrum;
pub use spectrogram::Spectrogram;
pub use matrix::Matrix;
pub use power_cepstrogram::{
    CepstrumTrendParameters, CepstrumWorkspace, PowerCepstrogram, PowerCepstrum, TrendFitMethod,
    TrendLine, TrendLineType,
};

use thiserror::Error;

/// Errors that can occur in sampled analyses
#[derive(Error, Debug)]
pub enum PraatError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("The domains of the input [{input_xmin}, {input_xmax}] and the output [{output_xmin}, {output_xmax}] should be equal")]
    UnequalDomains {
        input_xmin: f64,
        input_xmax: f64,
        output_xmin: f64,
        output_xmax: f64,
    },

    #[error("The sampling of the input (nx={input_nx}, dx={input_dx}, x1={input_x1}) and the output (nx={output_nx}, dx={output_dx}, x1={output_x1}) should be equal")]
    UnequalSampling {
        input_nx: usize,
        input_dx: f64,
        input_x1: f64,
        output_nx: usize,
        output_dx: f64,
        output_x1: f64,
    },

    #[error("Frame {frame} could not be analysed: {source}")]
    WorkerFault {
        frame: usize,
        #[source]
        source: Box<PraatError>,
    },

    #[error("Thread pool could not be built: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, PraatError>;
