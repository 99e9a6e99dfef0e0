//! Line spectral frequencies per frame
//!
//! The line spectral frequencies of an order-`p` prediction polynomial are
//! `p` interlaced frequencies in `(0, maximum_frequency)`. A frame may hold
//! fewer than `p` values when some could not be located.

use crate::sampled::{Sampled, SampledDomain, SampledFrames};
use crate::{PraatError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSpectralFrequenciesFrame {
    frequencies: Vec<f64>,
}

impl LineSpectralFrequenciesFrame {
    /// Empty frame with room for `capacity` frequencies
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frequencies: Vec::with_capacity(capacity),
        }
    }

    pub fn from_frequencies(frequencies: &[f64]) -> Self {
        Self {
            frequencies: frequencies.to_vec(),
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn number_of_frequencies(&self) -> usize {
        self.frequencies.len()
    }

    pub fn capacity(&self) -> usize {
        self.frequencies.capacity()
    }

    /// Replace the frequencies; stays within the allocated capacity when
    /// `frequencies` fits
    pub fn set(&mut self, frequencies: &[f64]) {
        self.frequencies.clear();
        self.frequencies.extend_from_slice(frequencies);
    }

    /// True if the frequencies increase strictly
    pub fn is_strictly_increasing(&self) -> bool {
        self.frequencies.windows(2).all(|w| w[0] < w[1])
    }
}

/// Line spectral frequencies for every frame of a sampled time axis
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpectralFrequencies {
    domain: SampledDomain,
    /// Upper end of the frequency range (Nyquist of the analysed sound)
    maximum_frequency: f64,
    maximum_number_of_frequencies: usize,
    frames: Vec<LineSpectralFrequenciesFrame>,
}

impl LineSpectralFrequencies {
    /// Create with `domain.nx` empty frames
    pub fn new(
        domain: SampledDomain,
        maximum_number_of_frequencies: usize,
        maximum_frequency: f64,
    ) -> Self {
        Self {
            domain,
            maximum_frequency,
            maximum_number_of_frequencies,
            frames: vec![LineSpectralFrequenciesFrame::default(); domain.nx],
        }
    }

    pub fn from_frames(
        domain: SampledDomain,
        maximum_number_of_frequencies: usize,
        maximum_frequency: f64,
        frames: Vec<LineSpectralFrequenciesFrame>,
    ) -> Result<Self> {
        if frames.len() != domain.nx {
            return Err(PraatError::InvalidParameter(format!(
                "{} frames given for a domain of {} frames",
                frames.len(),
                domain.nx
            )));
        }
        if !(maximum_frequency > 0.0) {
            return Err(PraatError::InvalidParameter(format!(
                "maximum frequency ({maximum_frequency}) must be positive"
            )));
        }
        if frames
            .iter()
            .any(|f| f.number_of_frequencies() > maximum_number_of_frequencies)
        {
            return Err(PraatError::InvalidParameter(format!(
                "a frame has more than {maximum_number_of_frequencies} frequencies"
            )));
        }
        Ok(Self {
            domain,
            maximum_frequency,
            maximum_number_of_frequencies,
            frames,
        })
    }

    pub fn maximum_frequency(&self) -> f64 {
        self.maximum_frequency
    }

    pub fn maximum_number_of_frequencies(&self) -> usize {
        self.maximum_number_of_frequencies
    }

    pub fn frame(&self, index: usize) -> Option<&LineSpectralFrequenciesFrame> {
        self.frames.get(index)
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }
}

impl Sampled for LineSpectralFrequencies {
    fn domain(&self) -> SampledDomain {
        self.domain
    }
}

impl SampledFrames for LineSpectralFrequencies {
    type Frame = LineSpectralFrequenciesFrame;

    fn frames(&self) -> &[LineSpectralFrequenciesFrame] {
        &self.frames
    }

    fn frames_mut(&mut self) -> &mut [LineSpectralFrequenciesFrame] {
        &mut self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_set_keeps_capacity() {
        let mut frame = LineSpectralFrequenciesFrame::with_capacity(4);
        let capacity = frame.capacity();
        frame.set(&[100.0, 200.0, 300.0]);
        assert_eq!(frame.number_of_frequencies(), 3);
        assert_eq!(frame.capacity(), capacity);
        assert!(frame.is_strictly_increasing());
        frame.set(&[300.0, 200.0]);
        assert!(!frame.is_strictly_increasing());
    }

    #[test]
    fn test_from_frames_validation() {
        let domain = SampledDomain::new(0.0, 1.0, 1, 1.0, 0.5).unwrap();
        let frames = vec![LineSpectralFrequenciesFrame::from_frequencies(&[1.0, 2.0, 3.0])];
        assert!(LineSpectralFrequencies::from_frames(domain, 2, 5000.0, frames.clone()).is_err());
        assert!(LineSpectralFrequencies::from_frames(domain, 3, 0.0, frames.clone()).is_err());
        let lsf = LineSpectralFrequencies::from_frames(domain, 3, 5000.0, frames).unwrap();
        assert_eq!(lsf.frame(0).unwrap().number_of_frequencies(), 3);
    }
}
