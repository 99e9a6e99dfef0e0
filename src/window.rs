//! Analysis windows for sound frames
//!
//! Every sound-based frame analysis multiplies the samples of a frame by a
//! window before analysing it. Apart from the textbook shapes, Praat uses one
//! special Gaussian window for LPC-type analyses (see [`praat_gaussian_window`]),
//! and that Gaussian is also what [`WindowShape::Gaussian`] produces for a frame.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Window shapes available for frame analyses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowShape {
    Rectangular,
    /// Bartlett window
    Triangular,
    Parabolic,
    /// Raised cosine
    Hanning,
    Hamming,
    /// Praat's Gaussian with the `exp(-12)` edge removed
    #[default]
    Gaussian,
    /// Kaiser window with `beta = 2 pi`
    Kaiser,
}

impl WindowShape {
    /// Window value at `position`, normalised to `[-0.5, 0.5]` with 0 the centre
    pub fn value_at(self, position: f64) -> f64 {
        if position.abs() > 0.5 {
            return 0.0;
        }
        match self {
            WindowShape::Rectangular => 1.0,
            WindowShape::Triangular => 1.0 - 2.0 * position.abs(),
            WindowShape::Parabolic => 1.0 - 4.0 * position * position,
            WindowShape::Hanning => 0.5 + 0.5 * (2.0 * PI * position).cos(),
            WindowShape::Hamming => 0.54 + 0.46 * (2.0 * PI * position).cos(),
            WindowShape::Gaussian => {
                let edge = (-12.0_f64).exp();
                ((-48.0 * position * position).exp() - edge) / (1.0 - edge)
            }
            WindowShape::Kaiser => {
                let beta = 2.0 * PI;
                let x = 2.0 * position;
                bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / bessel_i0(beta)
            }
        }
    }

    /// Window of `size` samples for a sound frame
    ///
    /// The Gaussian shape gives exactly [`praat_gaussian_window`]; the other
    /// shapes are sampled at the sample centres.
    pub fn frame_window(self, size: usize) -> Vec<f64> {
        match self {
            WindowShape::Gaussian => praat_gaussian_window(size),
            shape => (0..size)
                .map(|i| shape.value_at((i as f64 + 0.5) / size as f64 - 0.5))
                .collect(),
        }
    }

    /// Duration of the frame needed for a given effective analysis width
    ///
    /// A Gaussian window is effectively only half as wide as its support.
    pub fn physical_analysis_width(self, effective_analysis_width: f64) -> f64 {
        match self {
            WindowShape::Gaussian => 2.0 * effective_analysis_width,
            _ => effective_analysis_width,
        }
    }
}

/// Modified Bessel function of order 0 (Abramowitz & Stegun 9.8.1, 9.8.2)
fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let y = (x / 3.75).powi(2);
        1.0 + y
            * (3.5156229
                + y * (3.0899424
                    + y * (1.2067492 + y * (0.2659732 + y * (0.0360768 + y * 0.0045813)))))
    } else {
        let y = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + y * (0.01328592
                    + y * (0.00225319
                        + y * (-0.00157565
                            + y * (0.00916281
                                + y * (-0.02057706
                                    + y * (0.02635537
                                        + y * (-0.01647633 + y * 0.00392377))))))))
    }
}

/// Praat's Gaussian window for LPC analysis
///
/// `w[i] = (exp(-48 (i - imid)^2 / (n + 1)^2) - exp(-12)) / (1 - exp(-12))`
/// with `imid = (n - 1) / 2`, so the window reaches zero just outside the frame.
pub fn praat_gaussian_window(size: usize) -> Vec<f64> {
    let edge = (-12.0_f64).exp();
    let imid = (size as f64 - 1.0) / 2.0;
    let denominator = (size + 1) as f64;
    (0..size)
        .map(|i| {
            let d = (i as f64 - imid) / denominator;
            ((-48.0 * d * d).exp() - edge) / (1.0 - edge)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangular_window() {
        let window = WindowShape::Rectangular.frame_window(10);
        assert_eq!(window.len(), 10);
        for &v in &window {
            assert_relative_eq!(v, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_windows_are_symmetric() {
        for shape in [
            WindowShape::Triangular,
            WindowShape::Parabolic,
            WindowShape::Hanning,
            WindowShape::Hamming,
            WindowShape::Gaussian,
            WindowShape::Kaiser,
        ] {
            let window = shape.frame_window(101);
            for i in 0..50 {
                assert_relative_eq!(window[i], window[100 - i], epsilon = 1e-10);
            }
            assert!(window[50] > 0.99, "{shape:?} centre {}", window[50]);
        }
    }

    #[test]
    fn test_praat_gaussian_window_edges() {
        let window = praat_gaussian_window(200);
        assert!(window[0] > 0.0);
        assert!(window[0] < 1e-4);
        assert!(praat_gaussian_window(0).is_empty());
    }

    #[test]
    fn test_physical_analysis_width() {
        assert_relative_eq!(WindowShape::Gaussian.physical_analysis_width(0.025), 0.05);
        assert_relative_eq!(WindowShape::Hanning.physical_analysis_width(0.025), 0.025);
    }

    #[test]
    fn test_bessel_i0() {
        assert_relative_eq!(bessel_i0(0.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(bessel_i0(1.0), 1.2660658777520082, epsilon = 1e-6);
        assert_relative_eq!(bessel_i0(2.0), 2.2795853023360673, epsilon = 1e-5);
    }
}
