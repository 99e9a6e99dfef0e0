//! Conversion between LPC coefficients and line spectral frequencies
//!
//! LPC to line spectral frequencies follows Rothweiler (1999), "On
//! polynomial reduction in the computation of LSP frequencies":
//!
//! 1. Form `Fs(z) = A(z) + z^-(p+1) A(1/z)` and `Fa(z) = A(z) - z^-(p+1) A(1/z)`
//! 2. Divide out the trivial zeros at `z = -1` and `z = 1`
//! 3. Rewrite the symmetric halves as polynomials `g_sum`, `g_dif` in
//!    `x = 2 cos(w)` on `[-2, 2]`
//! 4. Locate the roots of `g_sum` on a grid (halving the grid when roots are
//!    missed), then each root of `g_dif` between two neighbouring `g_sum` roots
//! 5. `f = arccos(x / 2) / pi * maximum_frequency`, interleaved sum/dif
//!
//! The way back multiplies the second-order sections of both polynomials
//! and averages them.

use std::f64::consts::PI;

use crate::config::ThreadingConfig;
use crate::frame_into_frame::{FrameIntoFrameState, SampledFrameIntoSampledFrame};
use crate::line_spectral_frequencies::{LineSpectralFrequencies, LineSpectralFrequenciesFrame};
use crate::lpc::{Lpc, LpcFrame};
use crate::polynomial::Polynomial;
use crate::roots::Roots;
use crate::sampled::{Sampled, SampledFrames};
use crate::sampled_into_sampled::SampledIntoSampled;
use crate::status::{FrameAnalysisInfo, FrameInfo, LpcAndLineSpectralFrequenciesStatus};
use crate::{PraatError, Result};

/// Grid step for the root search of `g_sum`, in units of `x = 2 cos(w)`
pub const DEFAULT_GRID_SIZE: f64 = 0.02;

/// Maximum number of times the root-search grid is halved
pub const MAXIMUM_NUMBER_OF_BISECTIONS: usize = 10;

/// In-place Chebyshev reduction of a symmetric half polynomial to `x = 2 cos(w)`
fn cos2x(g: &mut [f64]) {
    let n = g.len();
    for i in 2..n {
        for j in (i + 1..n).rev() {
            g[j - 2] -= g[j];
        }
        g[i - 2] -= 2.0 * g[i];
    }
}

/// `g_sum` of the coefficients `a[1..=p]`
fn fill_sum_polynomial(a: &[f64], g: &mut Polynomial) {
    let p = a.len();
    g.set_number_of_coefficients(p + 2);
    let c = g.coefficients_mut();
    c[0] = 1.0;
    c[p + 1] = 1.0;
    for i in 1..=p {
        c[p + 1 - i] = a[i - 1] + a[p - i];
    }
    if p % 2 == 0 {
        g.divide_first_order_factor(-1.0);
    }
    g.keep_upper_coefficients((p + 1) / 2);
    cos2x(g.coefficients_mut());
}

/// `g_dif` of the coefficients `a[1..=p]`
fn fill_dif_polynomial(a: &[f64], g: &mut Polynomial) {
    let p = a.len();
    g.set_number_of_coefficients(p + 2);
    let c = g.coefficients_mut();
    c[0] = 1.0;
    c[p + 1] = -1.0;
    for i in 1..=p {
        c[p + 1 - i] = -a[i - 1] + a[p - i];
    }
    if p % 2 == 0 {
        g.divide_first_order_factor(1.0);
    } else {
        g.divide_second_order_factor(1.0);
    }
    let half_order = g.number_of_coefficients() / 2;
    g.keep_upper_coefficients(half_order);
    cos2x(g.coefficients_mut());
}

/// Scan `[xmin, xmax]` of `p` in steps of `grid_size` and collect simple
/// real roots in increasing order; returns the number found
fn search_roots_on_grid(p: &Polynomial, roots: &mut Roots, grid_size: f64) -> usize {
    roots.clear();
    let degree = p.degree();
    let mut xmin = p.xmin();
    while xmin < p.xmax() && roots.number_of_roots() < degree {
        let xmax = (xmin + grid_size).min(p.xmax());
        if let Some(root) = p.find_one_simple_real_root_ridders(xmin, xmax) {
            // a root on a grid point is found from both sides
            if roots.last_real() != Some(root) && !roots.push_real(root) {
                break;
            }
        }
        xmin = xmax;
    }
    roots.number_of_roots()
}

/// LPC frame into line spectral frequency frame
#[derive(Debug, Clone)]
pub struct LpcFrameIntoLineSpectralFrequenciesFrame {
    state: FrameIntoFrameState,
    grid_size: f64,
    maximum_frequency: f64,
    a: Vec<f64>,
    gsum: Polynomial,
    gdif: Polynomial,
    roots: Roots,
    frequencies: Vec<f64>,
}

impl LpcFrameIntoLineSpectralFrequenciesFrame {
    /// Workspace for `input`; a non-positive `grid_size` selects the default
    pub fn new(input: &Lpc, grid_size: f64) -> Self {
        let capacity = input.max_n_coefficients() + 2;
        Self {
            state: FrameIntoFrameState::default(),
            grid_size: if grid_size > 0.0 { grid_size } else { DEFAULT_GRID_SIZE },
            maximum_frequency: input.maximum_frequency(),
            a: Vec::with_capacity(input.max_n_coefficients()),
            gsum: Polynomial::new(-2.0, 2.0, capacity),
            gdif: Polynomial::new(-2.0, 2.0, capacity),
            roots: Roots::new(capacity / 2 + 1),
            frequencies: Vec::with_capacity(input.max_n_coefficients()),
        }
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    fn to_frequency(&self, x: f64) -> f64 {
        (0.5 * x).clamp(-1.0, 1.0).acos() / PI * self.maximum_frequency
    }
}

impl SampledFrameIntoSampledFrame for LpcFrameIntoLineSpectralFrequenciesFrame {
    type Input = Lpc;
    type Output = LineSpectralFrequencies;
    type Status = FrameInfo;

    fn allocate_output_frames(
        &mut self,
        input: &Lpc,
        output: &mut LineSpectralFrequencies,
    ) -> Result<()> {
        let capacity = output.maximum_number_of_frequencies();
        if capacity < input.max_n_coefficients() {
            return Err(PraatError::InvalidParameter(format!(
                "room for {capacity} frequencies, but the LPC has up to {} coefficients",
                input.max_n_coefficients()
            )));
        }
        self.maximum_frequency = output.maximum_frequency();
        for frame in output.frames_mut() {
            *frame = LineSpectralFrequenciesFrame::with_capacity(capacity);
        }
        Ok(())
    }

    fn get_input_frame(&mut self, input: &Lpc) -> Result<()> {
        let frame = input
            .frame(self.state.current_frame)
            .ok_or_else(|| PraatError::Analysis(format!("no LPC frame {}", self.state.current_frame)))?;
        self.a.clear();
        self.a.extend_from_slice(frame.coefficients());
        Ok(())
    }

    fn input_frame_to_output_frame(&mut self) -> Result<bool> {
        self.frequencies.clear();
        if self.a.is_empty() {
            return Ok(true);
        }
        fill_sum_polynomial(&self.a, &mut self.gsum);
        fill_dif_polynomial(&self.a, &mut self.gdif);
        let half_order_gsum = self.gsum.degree();
        let half_order_gdif = self.gdif.degree();

        let mut grid_size = self.grid_size;
        let mut number_of_bisections = 0;
        let mut number_of_roots = 0;
        while number_of_roots < half_order_gsum && number_of_bisections < MAXIMUM_NUMBER_OF_BISECTIONS {
            number_of_roots = search_roots_on_grid(&self.gsum, &mut self.roots, grid_size);
            grid_size *= 0.5;
            number_of_bisections += 1;
        }
        if number_of_roots < half_order_gsum {
            self.state.frame_analysis_info = FrameAnalysisInfo::TooManyBisections;
        }

        // the highest root of g_sum gives the lowest frequency
        let k = number_of_roots;
        let mut missing = false;
        for i in 0..k.max(half_order_gdif) {
            if i < k {
                let x = self.roots.real(k - 1 - i).unwrap_or(f64::NAN);
                let frequency = self.to_frequency(x);
                self.frequencies.push(frequency);
            }
            if i < half_order_gdif {
                // g_dif roots lie between consecutive g_sum roots
                let root = if i < k {
                    let xmax = self.roots.real(k - 1 - i).unwrap_or(self.gsum.xmin());
                    let xmin = if i + 1 == k {
                        self.gsum.xmin()
                    } else {
                        self.roots.real(k - 2 - i).unwrap_or(self.gsum.xmin())
                    };
                    self.gdif.find_one_simple_real_root_ridders(xmin, xmax)
                } else {
                    None
                };
                match root {
                    Some(x) => {
                        let frequency = self.to_frequency(x);
                        self.frequencies.push(frequency);
                    }
                    None => missing = true,
                }
            }
        }
        if missing && self.state.frame_analysis_info.is_ok() {
            self.state.frame_analysis_info = FrameAnalysisInfo::MissingRoots;
        }
        Ok(self.state.frame_analysis_info.is_ok())
    }

    fn save_output_frame(&mut self, frame: &mut LineSpectralFrequenciesFrame) -> Result<()> {
        debug_assert!(self.frequencies.len() <= frame.capacity());
        frame.set(&self.frequencies);
        Ok(())
    }

    fn frame_status(&self) -> FrameInfo {
        FrameInfo {
            info: self.state.frame_analysis_info,
        }
    }

    fn state(&self) -> &FrameIntoFrameState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FrameIntoFrameState {
        &mut self.state
    }
}

/// Line spectral frequency frame into LPC frame
#[derive(Debug, Clone)]
pub struct LineSpectralFrequenciesFrameIntoLpcFrame {
    state: FrameIntoFrameState,
    maximum_frequency: f64,
    frequencies: Vec<f64>,
    omegas: Vec<f64>,
    fs: Polynomial,
    fa: Polynomial,
    a: Vec<f64>,
}

impl LineSpectralFrequenciesFrameIntoLpcFrame {
    pub fn new(input: &LineSpectralFrequencies) -> Self {
        let n = input.maximum_number_of_frequencies();
        Self {
            state: FrameIntoFrameState::default(),
            maximum_frequency: input.maximum_frequency(),
            frequencies: Vec::with_capacity(n),
            omegas: Vec::with_capacity(n / 2 + 1),
            fs: Polynomial::new(-1.0, 1.0, n + 3),
            fa: Polynomial::new(-1.0, 1.0, n + 3),
            a: Vec::with_capacity(n),
        }
    }

    /// `-2 cos(w)` of every second frequency, starting at `first`
    fn fill_omegas(&mut self, first: usize) {
        self.omegas.clear();
        for f in self.frequencies.iter().skip(first).step_by(2) {
            self.omegas.push(-2.0 * (f / self.maximum_frequency * PI).cos());
        }
    }
}

impl SampledFrameIntoSampledFrame for LineSpectralFrequenciesFrameIntoLpcFrame {
    type Input = LineSpectralFrequencies;
    type Output = Lpc;
    type Status = FrameInfo;

    fn allocate_output_frames(
        &mut self,
        input: &LineSpectralFrequencies,
        output: &mut Lpc,
    ) -> Result<()> {
        for (lpc_frame, lsf_frame) in output.frames_mut().iter_mut().zip(input.frames()) {
            *lpc_frame = LpcFrame::new(lsf_frame.number_of_frequencies());
        }
        Ok(())
    }

    fn get_input_frame(&mut self, input: &LineSpectralFrequencies) -> Result<()> {
        let frame = input.frame(self.state.current_frame).ok_or_else(|| {
            PraatError::Analysis(format!("no line spectral frequency frame {}", self.state.current_frame))
        })?;
        self.frequencies.clear();
        self.frequencies.extend_from_slice(frame.frequencies());
        Ok(())
    }

    fn input_frame_to_output_frame(&mut self) -> Result<bool> {
        let n = self.frequencies.len();
        self.a.clear();

        self.fill_omegas(0);
        self.fs.init_from_product_of_second_order_terms(&self.omegas);
        self.fill_omegas(1);
        self.fa.init_from_product_of_second_order_terms(&self.omegas);
        if n % 2 == 0 {
            self.fs.multiply_first_order_factor(-1.0); // * (z + 1)
            self.fa.multiply_first_order_factor(1.0); // * (z - 1)
        } else {
            self.fa.multiply_second_order_factor(1.0); // * (z^2 - 1)
        }

        if self.fs.number_of_coefficients() != self.fa.number_of_coefficients() {
            self.a.resize(n, 0.0);
            self.state.frame_analysis_info = FrameAnalysisInfo::InconsistentPolynomials;
            return Ok(false);
        }

        // A(z) = (Fs(z) + Fa(z)) / 2 without the unit end coefficients
        self.a.resize(n, 0.0);
        let (fs, fa) = (self.fs.coefficients(), self.fa.coefficients());
        for i in 1..=n {
            self.a[n - i] = 0.5 * (fs[i] + fa[i]);
        }
        Ok(true)
    }

    fn save_output_frame(&mut self, frame: &mut LpcFrame) -> Result<()> {
        frame.set(&self.a, 0.0);
        Ok(())
    }

    fn frame_status(&self) -> FrameInfo {
        FrameInfo {
            info: self.state.frame_analysis_info,
        }
    }

    fn state(&self) -> &FrameIntoFrameState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FrameIntoFrameState {
        &mut self.state
    }
}

impl Lpc {
    /// Line spectral frequencies of every frame
    ///
    /// # Arguments
    /// * `grid_size` - Initial root-search step in `x = 2 cos(w)` (non-positive for 0.02)
    /// * `config` - Threading configuration
    pub fn to_line_spectral_frequencies(
        &self,
        grid_size: f64,
        config: &ThreadingConfig,
    ) -> Result<LineSpectralFrequencies> {
        let mut output = LineSpectralFrequencies::new(
            self.domain(),
            self.max_n_coefficients(),
            self.maximum_frequency(),
        );
        self.to_line_spectral_frequencies_into(&mut output, grid_size, config)?;
        Ok(output)
    }

    /// Same as [`Lpc::to_line_spectral_frequencies`], also returning the per-frame status
    pub fn to_line_spectral_frequencies_with_status(
        &self,
        grid_size: f64,
        config: &ThreadingConfig,
    ) -> Result<(LineSpectralFrequencies, LpcAndLineSpectralFrequenciesStatus)> {
        let mut output = LineSpectralFrequencies::new(
            self.domain(),
            self.max_n_coefficients(),
            self.maximum_frequency(),
        );
        let status = self.to_line_spectral_frequencies_into(&mut output, grid_size, config)?;
        Ok((output, status))
    }

    /// Convert into an existing [`LineSpectralFrequencies`] with the same time axis
    pub fn to_line_spectral_frequencies_into(
        &self,
        output: &mut LineSpectralFrequencies,
        grid_size: f64,
        config: &ThreadingConfig,
    ) -> Result<LpcAndLineSpectralFrequenciesStatus> {
        let config = config.with_status_updates(true);
        let mut status = LpcAndLineSpectralFrequenciesStatus::new(output.nx());
        let workspace = LpcFrameIntoLineSpectralFrequenciesFrame::new(self, grid_size);
        let errors = SampledIntoSampled::create(self, output, workspace, &mut status, config)?
            .analyse_threaded()?;
        if errors > 0 {
            log::warn!("LPC to line spectral frequencies: {errors} frame(s) have issues");
        }
        Ok(status)
    }
}

impl LineSpectralFrequencies {
    /// LPC coefficients of every frame
    pub fn to_lpc(&self, config: &ThreadingConfig) -> Result<Lpc> {
        self.to_lpc_with_status(config).map(|(lpc, _)| lpc)
    }

    /// Same as [`LineSpectralFrequencies::to_lpc`], also returning the per-frame status
    pub fn to_lpc_with_status(
        &self,
        config: &ThreadingConfig,
    ) -> Result<(Lpc, LpcAndLineSpectralFrequenciesStatus)> {
        let mut lpc = Lpc::new(
            self.domain(),
            0.5 / self.maximum_frequency(),
            self.maximum_number_of_frequencies(),
        );
        let status = self.to_lpc_into(&mut lpc, config)?;
        Ok((lpc, status))
    }

    /// Convert into an existing [`Lpc`] with the same time axis
    pub fn to_lpc_into(
        &self,
        output: &mut Lpc,
        config: &ThreadingConfig,
    ) -> Result<LpcAndLineSpectralFrequenciesStatus> {
        let config = config.with_status_updates(true);
        let mut status = LpcAndLineSpectralFrequenciesStatus::new(output.nx());
        let workspace = LineSpectralFrequenciesFrameIntoLpcFrame::new(self);
        let errors = SampledIntoSampled::create(self, output, workspace, &mut status, config)?
            .analyse_threaded()?;
        if errors > 0 {
            log::warn!("line spectral frequencies to LPC: {errors} frame(s) have issues");
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampled::SampledDomain;
    use approx::assert_relative_eq;

    fn single_frame_lpc(a: &[f64], sampling_period: f64) -> Lpc {
        let domain = SampledDomain::new(0.0, 0.01, 1, 0.01, 0.005).unwrap();
        Lpc::from_frames(domain, sampling_period, a.len(), vec![LpcFrame::from_coefficients(a, 1.0)])
            .unwrap()
    }

    #[test]
    fn test_cos2x() {
        // c0 (z^2 + z^-2) + c1 (z + z^-1) + c2 = c0 x^2 + c1 x + (c2 - 2 c0)
        let mut g = [3.0, 2.0, 1.0];
        cos2x(&mut g);
        assert_eq!(g, [1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_sum_and_dif_polynomials() {
        let a = [-1.6, 0.95];
        let mut gsum = Polynomial::new(-2.0, 2.0, 4);
        let mut gdif = Polynomial::new(-2.0, 2.0, 4);
        fill_sum_polynomial(&a, &mut gsum);
        fill_dif_polynomial(&a, &mut gdif);
        assert_eq!(gsum.degree(), 1);
        assert_eq!(gdif.degree(), 1);
        assert_relative_eq!(gsum.evaluate(1.65), 0.0, epsilon = 1e-12);
        assert_relative_eq!(gdif.evaluate(1.55), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_search_deduplicates_border_roots() {
        // roots at -1, 0 and 1, all on grid points
        let p = Polynomial::from_coefficients(-2.0, 2.0, &[0.0, -1.0, 0.0, 1.0]);
        let mut roots = Roots::new(4);
        assert_eq!(search_roots_on_grid(&p, &mut roots, 0.5), 3);
        assert_relative_eq!(roots.real(0).unwrap(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(roots.real(2).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_second_order_frequencies() {
        let lpc = single_frame_lpc(&[-1.6, 0.95], 1.0 / 10000.0);
        let config = ThreadingConfig::single_threaded();
        let lsf = lpc.to_line_spectral_frequencies(0.0, &config).unwrap();
        let frequencies = lsf.frame(0).unwrap().frequencies();
        assert_eq!(frequencies.len(), 2);
        assert_relative_eq!(frequencies[0], (0.825f64).acos() / PI * 5000.0, epsilon = 1e-9);
        assert_relative_eq!(frequencies[1], (0.775f64).acos() / PI * 5000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frequencies_follow_output_maximum_frequency() {
        let lpc = single_frame_lpc(&[-1.6, 0.95], 1.0 / 10000.0);
        let config = ThreadingConfig::single_threaded();
        let mut output = LineSpectralFrequencies::new(lpc.domain(), 2, 4000.0);
        let status = lpc.to_line_spectral_frequencies_into(&mut output, 0.0, &config).unwrap();
        assert_eq!(status.number_of_problem_frames(), 0);
        let frequencies = output.frame(0).unwrap().frequencies();
        assert_relative_eq!(frequencies[0], (0.825f64).acos() / PI * 4000.0, epsilon = 1e-9);
        assert_relative_eq!(frequencies[1], (0.775f64).acos() / PI * 4000.0, epsilon = 1e-9);
        assert!(frequencies.iter().all(|&f| f > 0.0 && f < output.maximum_frequency()));
    }

    #[test]
    fn test_odd_order_round_trip() {
        // A(z) = (1 - 0.5 z^-1)(1 - 1.2 z^-1 + 0.8 z^-2)
        let a = [-1.7, 1.4, -0.4];
        let lpc = single_frame_lpc(&a, 1.0 / 8000.0);
        let config = ThreadingConfig::single_threaded();
        let lsf = lpc.to_line_spectral_frequencies(0.02, &config).unwrap();
        let frame = lsf.frame(0).unwrap();
        assert_eq!(frame.number_of_frequencies(), 3);
        assert!(frame.is_strictly_increasing());

        let back = lsf.to_lpc(&config).unwrap();
        let coefficients = back.frame(0).unwrap().coefficients();
        assert_eq!(coefficients.len(), 3);
        for (x, y) in coefficients.iter().zip(&a) {
            assert_relative_eq!(*x, *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_empty_frame() {
        let lpc = single_frame_lpc(&[], 1.0 / 8000.0);
        let config = ThreadingConfig::single_threaded();
        let lsf = lpc.to_line_spectral_frequencies(0.02, &config).unwrap();
        assert_eq!(lsf.frame(0).unwrap().number_of_frequencies(), 0);
        let back = lsf.to_lpc(&config).unwrap();
        assert_eq!(back.frame(0).unwrap().number_of_coefficients(), 0);
    }
}
