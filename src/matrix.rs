//! Matrix with a sampled time axis
//!
//! Columns are frames on the time axis, rows are sampled along `y`
//! (`y1, y1 + dy, ...`). Each frame stores its `ny` row values.

use crate::sampled::{Sampled, SampledDomain, SampledFrames};
use crate::{PraatError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    domain: SampledDomain,
    ymin: f64,
    ymax: f64,
    ny: usize,
    dy: f64,
    y1: f64,
    frames: Vec<Vec<f64>>,
}

impl Matrix {
    /// Matrix of zeros with `domain.nx` columns and `ny` rows
    pub fn new(domain: SampledDomain, ymin: f64, ymax: f64, ny: usize, dy: f64, y1: f64) -> Result<Self> {
        if !(ymax > ymin) {
            return Err(PraatError::InvalidParameter(format!(
                "ymax ({ymax}) must be greater than ymin ({ymin})"
            )));
        }
        if !(dy > 0.0) {
            return Err(PraatError::InvalidParameter(format!("dy ({dy}) must be positive")));
        }
        Ok(Self {
            domain,
            ymin,
            ymax,
            ny,
            dy,
            y1,
            frames: vec![vec![0.0; ny]; domain.nx],
        })
    }

    /// Matrix whose rows are numbered `1..=ny`
    pub fn with_numbered_rows(domain: SampledDomain, ny: usize) -> Result<Self> {
        Self::new(domain, 0.5, ny as f64 + 0.5, ny, 1.0, 1.0)
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn y1(&self) -> f64 {
        self.y1
    }

    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// `y` of row `row` (0-based)
    pub fn row_to_y(&self, row: usize) -> f64 {
        self.y1 + row as f64 * self.dy
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn column(&self, frame: usize) -> Option<&[f64]> {
        self.frames.get(frame).map(Vec::as_slice)
    }

    pub fn get_value(&self, row: usize, frame: usize) -> Option<f64> {
        self.frames.get(frame)?.get(row).copied()
    }

    /// Values of one row across all frames
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.ny {
            return None;
        }
        self.frames.iter().map(|frame| frame.get(row).copied()).collect()
    }
}

impl Sampled for Matrix {
    fn domain(&self) -> SampledDomain {
        self.domain
    }
}

impl SampledFrames for Matrix {
    type Frame = Vec<f64>;

    fn frames(&self) -> &[Vec<f64>] {
        &self.frames
    }

    fn frames_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.frames
    }
}
