//! Sampled objects: the shared time axis of frame-based analyses
//!
//! A sampled object has a domain `[xmin, xmax]` and `nx` frames with centres
//! `x1, x1 + dx, ..., x1 + (nx - 1) dx`. Two sampled objects that take part in
//! one frame-by-frame analysis must agree on all five numbers.

use crate::{PraatError, Result};

/// Domain and frame layout of a sampled object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledDomain {
    /// Start of the domain
    pub xmin: f64,
    /// End of the domain
    pub xmax: f64,
    /// Number of frames
    pub nx: usize,
    /// Distance between frame centres
    pub dx: f64,
    /// Centre of the first frame
    pub x1: f64,
}

impl SampledDomain {
    pub fn new(xmin: f64, xmax: f64, nx: usize, dx: f64, x1: f64) -> Result<Self> {
        if !(xmax > xmin) {
            return Err(PraatError::InvalidParameter(format!(
                "xmax ({xmax}) must be greater than xmin ({xmin})"
            )));
        }
        if !(dx > 0.0) {
            return Err(PraatError::InvalidParameter(format!(
                "dx ({dx}) must be positive"
            )));
        }
        Ok(Self { xmin, xmax, nx, dx, x1 })
    }

    /// Time (or other x-value) of the centre of frame `index` (0-based)
    pub fn index_to_x(&self, index: usize) -> f64 {
        self.x1 + index as f64 * self.dx
    }

    /// Nearest frame index for `x`, clamped to the valid range
    pub fn x_to_nearest_index(&self, x: f64) -> usize {
        if self.nx == 0 {
            return 0;
        }
        let position = ((x - self.x1) / self.dx).round();
        position.max(0.0).min((self.nx - 1) as f64) as usize
    }

    /// Total duration of the domain
    pub fn duration(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Fail unless both objects have the same domain
    pub fn require_equal_domains(&self, other: &SampledDomain) -> Result<()> {
        if self.xmin != other.xmin || self.xmax != other.xmax {
            return Err(PraatError::UnequalDomains {
                input_xmin: self.xmin,
                input_xmax: self.xmax,
                output_xmin: other.xmin,
                output_xmax: other.xmax,
            });
        }
        Ok(())
    }

    /// Fail unless both objects have the same frame layout
    pub fn require_equal_sampling(&self, other: &SampledDomain) -> Result<()> {
        if self.x1 != other.x1 || self.nx != other.nx || self.dx != other.dx {
            return Err(PraatError::UnequalSampling {
                input_nx: self.nx,
                input_dx: self.dx,
                input_x1: self.x1,
                output_nx: other.nx,
                output_dx: other.dx,
                output_x1: other.x1,
            });
        }
        Ok(())
    }

    /// Fail unless domain and frame layout are both equal
    pub fn require_equal_domains_and_sampling(&self, other: &SampledDomain) -> Result<()> {
        self.require_equal_domains(other)?;
        self.require_equal_sampling(other)
    }
}

/// An object with a sampled time axis
pub trait Sampled {
    fn domain(&self) -> SampledDomain;

    /// Number of frames
    fn nx(&self) -> usize {
        self.domain().nx
    }
}

/// A sampled object whose frames can be written one by one
///
/// The frames are stored contiguously so that disjoint ranges can be handed
/// to different threads.
pub trait SampledFrames: Sampled {
    type Frame: Send;

    fn frames(&self) -> &[Self::Frame];

    fn frames_mut(&mut self) -> &mut [Self::Frame];
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_index_to_x() {
        let domain = SampledDomain::new(0.0, 1.0, 10, 0.1, 0.05).unwrap();
        assert_relative_eq!(domain.index_to_x(0), 0.05, epsilon = 1e-12);
        assert_relative_eq!(domain.index_to_x(9), 0.95, epsilon = 1e-12);
        assert_eq!(domain.x_to_nearest_index(0.52), 5);
        assert_eq!(domain.x_to_nearest_index(-3.0), 0);
        assert_eq!(domain.x_to_nearest_index(3.0), 9);
    }

    #[test]
    fn test_invalid_domain() {
        assert!(SampledDomain::new(1.0, 1.0, 10, 0.1, 0.05).is_err());
        assert!(SampledDomain::new(0.0, 1.0, 10, 0.0, 0.05).is_err());
    }

    #[test]
    fn test_require_equal() {
        let a = SampledDomain::new(0.0, 1.0, 10, 0.1, 0.05).unwrap();
        let b = SampledDomain { nx: 11, ..a };
        let c = SampledDomain { xmax: 1.5, ..a };
        assert!(a.require_equal_domains_and_sampling(&a).is_ok());
        assert!(matches!(
            a.require_equal_domains_and_sampling(&b),
            Err(PraatError::UnequalSampling { .. })
        ));
        assert!(matches!(
            a.require_equal_domains_and_sampling(&c),
            Err(PraatError::UnequalDomains { .. })
        ));
    }
}
