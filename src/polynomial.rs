//! Real polynomials over a finite domain
//!
//! Coefficients are stored in ascending order: `c[0] + c[1] x + ... + c[n-1] x^(n-1)`.
//! A polynomial is created once with enough capacity for the largest frame
//! of an analysis and then logically resized for every frame, so the
//! per-frame operations never reallocate.

use num_complex::Complex;

use crate::{PraatError, Result};

/// Maximum number of Ridders iterations before giving up on a bracket
const MAX_RIDDERS_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    xmin: f64,
    xmax: f64,
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Create an empty polynomial with room for `capacity` coefficients
    pub fn new(xmin: f64, xmax: f64, capacity: usize) -> Self {
        Self {
            xmin,
            xmax,
            coefficients: Vec::with_capacity(capacity),
        }
    }

    pub fn from_coefficients(xmin: f64, xmax: f64, coefficients: &[f64]) -> Self {
        Self {
            xmin,
            xmax,
            coefficients: coefficients.to_vec(),
        }
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn coefficients_mut(&mut self) -> &mut [f64] {
        &mut self.coefficients
    }

    pub fn number_of_coefficients(&self) -> usize {
        self.coefficients.len()
    }

    /// Degree of the polynomial (0 for constants and for the empty polynomial)
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn capacity(&self) -> usize {
        self.coefficients.capacity()
    }

    /// Replace all coefficients
    pub fn set_coefficients(&mut self, coefficients: &[f64]) {
        self.coefficients.clear();
        self.coefficients.extend_from_slice(coefficients);
    }

    /// Change the number of coefficients; new ones are zero
    pub fn set_number_of_coefficients(&mut self, n: usize) {
        self.coefficients.resize(n, 0.0);
    }

    /// Keep only the coefficients `c[first..]`, shifted down to start at 0
    pub fn keep_upper_coefficients(&mut self, first: usize) {
        let first = first.min(self.coefficients.len());
        self.coefficients.drain(..first);
    }

    /// Value at `x` (Horner's scheme)
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    /// Divide by `(x - a)` in place; returns the remainder
    pub fn divide_first_order_factor(&mut self, a: f64) -> f64 {
        let n = self.coefficients.len();
        if n == 0 {
            return 0.0;
        }
        let c = &mut self.coefficients;
        let mut r = c[n - 1];
        for j in (0..n - 1).rev() {
            let t = c[j];
            c[j] = r;
            r = t + r * a;
        }
        c.truncate(n - 1);
        r
    }

    /// Divide by `(x^2 - a)` in place, discarding the remainder
    pub fn divide_second_order_factor(&mut self, a: f64) {
        let n = self.coefficients.len();
        if n < 3 {
            self.coefficients.clear();
            return;
        }
        let c = &mut self.coefficients;
        for j in (2..n).rev() {
            c[j - 2] += a * c[j];
        }
        c.drain(..2);
    }

    /// Multiply by `(x - a)` in place
    pub fn multiply_first_order_factor(&mut self, a: f64) {
        let n = self.coefficients.len();
        if n == 0 {
            return;
        }
        let c = &mut self.coefficients;
        c.push(c[n - 1]);
        for k in (1..n).rev() {
            c[k] = c[k - 1] - a * c[k];
        }
        c[0] *= -a;
    }

    /// Multiply by `(x^2 - a)` in place
    pub fn multiply_second_order_factor(&mut self, a: f64) {
        let n = self.coefficients.len();
        if n == 0 {
            return;
        }
        let c = &mut self.coefficients;
        c.push(0.0);
        c.push(0.0);
        for k in (0..n + 2).rev() {
            let shifted = if k >= 2 { c[k - 2] } else { 0.0 };
            c[k] = shifted - a * c[k];
        }
    }

    /// Set to the product of `(x^2 + a_i x + 1)` over all `a_i`
    pub fn init_from_product_of_second_order_terms(&mut self, a: &[f64]) {
        self.coefficients.clear();
        self.coefficients.push(1.0);
        for &ai in a {
            let n = self.coefficients.len();
            let c = &mut self.coefficients;
            c.push(0.0);
            c.push(0.0);
            for k in (0..n + 2).rev() {
                let mut value = c[k];
                if k >= 1 {
                    value += ai * c[k - 1];
                }
                if k >= 2 {
                    value += c[k - 2];
                }
                c[k] = value;
            }
        }
    }

    /// Find one simple real root in `[xmin, xmax]` with Ridders' method
    ///
    /// Returns `None` if the polynomial has the same sign at both ends of the
    /// bracket.
    pub fn find_one_simple_real_root_ridders(&self, xmin: f64, xmax: f64) -> Option<f64> {
        let (mut x1, mut x2) = (xmin, xmax);
        let mut f1 = self.evaluate(x1);
        if f1 == 0.0 {
            return Some(x1);
        }
        let mut f2 = self.evaluate(x2);
        if f2 == 0.0 {
            return Some(x2);
        }
        if (f1 < 0.0 && f2 < 0.0) || (f1 > 0.0 && f2 > 0.0) {
            return None;
        }

        let tolerance = 4.0 * f64::EPSILON * (xmin.abs() + xmax.abs()).max(1.0);
        let mut root = f64::NAN;
        for _ in 0..MAX_RIDDERS_ITERATIONS {
            let x3 = 0.5 * (x1 + x2);
            let f3 = self.evaluate(x3);
            if f3 == 0.0 {
                return Some(x3);
            }
            let s = (f3 * f3 - f1 * f2).sqrt();
            if s == 0.0 {
                return Some(x3);
            }
            let direction = if f1 < f2 { -1.0 } else { 1.0 };
            let x4 = x3 + (x3 - x1) * direction * f3 / s;
            if (x4 - root).abs() <= tolerance {
                return Some(x4);
            }
            root = x4;
            let f4 = self.evaluate(x4);
            if f4 == 0.0 {
                return Some(root);
            }

            if (f3 < 0.0) != (f4 < 0.0) {
                x1 = x3;
                f1 = f3;
                x2 = root;
                f2 = f4;
            } else if (f1 < 0.0) != (f4 < 0.0) {
                x2 = root;
                f2 = f4;
            } else {
                x1 = root;
                f1 = f4;
            }
            if (x2 - x1).abs() <= tolerance {
                return Some(root);
            }
        }
        log::trace!("Ridders: no convergence in [{xmin}, {xmax}], last estimate {root}");
        Some(root)
    }

    /// All complex roots, as eigenvalues of the companion matrix
    pub fn to_roots(&self) -> Result<Vec<Complex<f64>>> {
        let mut n = self.coefficients.len();
        while n > 0 && self.coefficients[n - 1] == 0.0 {
            n -= 1;
        }
        if n == 0 {
            return Err(PraatError::Analysis(
                "the zero polynomial has no defined roots".to_string(),
            ));
        }
        let degree = n - 1;
        if degree == 0 {
            return Ok(Vec::new());
        }
        let leading = self.coefficients[degree];
        if degree == 1 {
            return Ok(vec![Complex::new(-self.coefficients[0] / leading, 0.0)]);
        }

        let mut companion = nalgebra::DMatrix::<f64>::zeros(degree, degree);
        for i in 1..degree {
            companion[(i, i - 1)] = 1.0;
        }
        for i in 0..degree {
            companion[(i, degree - 1)] = -self.coefficients[i] / leading;
        }
        let eigenvalues = companion.complex_eigenvalues();
        Ok(eigenvalues.iter().map(|c| Complex::new(c.re, c.im)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_coefficients(p: &Polynomial, expected: &[f64]) {
        assert_eq!(p.number_of_coefficients(), expected.len());
        for (c, e) in p.coefficients().iter().zip(expected) {
            assert_relative_eq!(*c, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_evaluate() {
        // 6 - 5x + x^2
        let p = Polynomial::from_coefficients(-10.0, 10.0, &[6.0, -5.0, 1.0]);
        assert_relative_eq!(p.evaluate(2.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.evaluate(0.0), 6.0, epsilon = 1e-12);
        assert_relative_eq!(p.evaluate(4.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_divide_first_order_factor() {
        let mut p = Polynomial::from_coefficients(-2.0, 2.0, &[-1.0, 0.0, 1.0]);
        let remainder = p.divide_first_order_factor(1.0);
        assert_relative_eq!(remainder, 0.0, epsilon = 1e-12);
        assert_coefficients(&p, &[1.0, 1.0]);
    }

    #[test]
    fn test_divide_second_order_factor() {
        // (x^2 - 1)(x + 2) = x^3 + 2x^2 - x - 2
        let mut p = Polynomial::from_coefficients(-2.0, 2.0, &[-2.0, -1.0, 2.0, 1.0]);
        p.divide_second_order_factor(1.0);
        assert_coefficients(&p, &[2.0, 1.0]);
    }

    #[test]
    fn test_multiply_factors() {
        let mut p = Polynomial::new(-2.0, 2.0, 8);
        p.set_coefficients(&[1.0, 1.0]);
        p.multiply_first_order_factor(1.0);
        assert_coefficients(&p, &[-1.0, 0.0, 1.0]);

        p.set_coefficients(&[2.0, 1.0]);
        p.multiply_second_order_factor(1.0);
        assert_coefficients(&p, &[-2.0, -1.0, 2.0, 1.0]);

        p.set_coefficients(&[3.0]);
        p.multiply_second_order_factor(4.0);
        assert_coefficients(&p, &[-12.0, 0.0, 3.0]);
    }

    #[test]
    fn test_product_of_second_order_terms() {
        let mut p = Polynomial::new(-1.0, 1.0, 8);
        // (x^2 + 2x + 1)(x^2 - x + 1) = x^4 + x^3 + 0x^2 + x + 1
        p.init_from_product_of_second_order_terms(&[2.0, -1.0]);
        assert_coefficients(&p, &[1.0, 1.0, 0.0, 1.0, 1.0]);
        p.init_from_product_of_second_order_terms(&[]);
        assert_coefficients(&p, &[1.0]);
    }

    #[test]
    fn test_ridders() {
        let p = Polynomial::from_coefficients(-2.0, 2.0, &[-2.0, 0.0, 1.0]);
        let root = p.find_one_simple_real_root_ridders(0.0, 2.0).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), epsilon = 1e-12);
        assert!(p.find_one_simple_real_root_ridders(-1.0, 1.0).is_none());
        // root on the border of the bracket
        let q = Polynomial::from_coefficients(-2.0, 2.0, &[-1.0, 1.0]);
        assert_eq!(q.find_one_simple_real_root_ridders(1.0, 2.0), Some(1.0));
    }

    #[test]
    fn test_to_roots() {
        let p = Polynomial::from_coefficients(-10.0, 10.0, &[6.0, -5.0, 1.0]);
        let mut roots: Vec<f64> = p.to_roots().unwrap().iter().map(|r| r.re).collect();
        roots.sort_by(|a, b| a.total_cmp(b));
        assert_relative_eq!(roots[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(roots[1], 3.0, epsilon = 1e-10);

        let q = Polynomial::from_coefficients(-10.0, 10.0, &[1.0, 0.0, 1.0]);
        for root in q.to_roots().unwrap() {
            assert_relative_eq!(root.re, 0.0, epsilon = 1e-10);
            assert_relative_eq!(root.im.abs(), 1.0, epsilon = 1e-10);
        }
    }
}
