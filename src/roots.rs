//! Fixed-capacity container of polynomial roots

use num_complex::Complex;

use crate::polynomial::Polynomial;
use crate::Result;

/// Roots of a polynomial, reused from frame to frame
#[derive(Debug, Clone, PartialEq)]
pub struct Roots {
    roots: Vec<Complex<f64>>,
    capacity: usize,
}

impl Roots {
    pub fn new(capacity: usize) -> Self {
        Self {
            roots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// All roots of `polynomial`
    pub fn from_polynomial(polynomial: &Polynomial) -> Result<Self> {
        let roots = polynomial.to_roots()?;
        let capacity = roots.len();
        Ok(Self { roots, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn number_of_roots(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.roots.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.roots.clear();
    }

    /// Append a root; returns false when the container is full
    pub fn push(&mut self, root: Complex<f64>) -> bool {
        if self.is_full() {
            return false;
        }
        self.roots.push(root);
        true
    }

    pub fn push_real(&mut self, root: f64) -> bool {
        self.push(Complex::new(root, 0.0))
    }

    pub fn roots(&self) -> &[Complex<f64>] {
        &self.roots
    }

    /// Real part of root `index` (0-based)
    pub fn real(&self, index: usize) -> Option<f64> {
        self.roots.get(index).map(|r| r.re)
    }

    pub fn last_real(&self) -> Option<f64> {
        self.roots.last().map(|r| r.re)
    }

    /// True if every root lies strictly inside the unit circle
    pub fn all_inside_unit_circle(&self) -> bool {
        self.roots.iter().all(|r| r.norm() < 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_capacity() {
        let mut roots = Roots::new(2);
        assert!(roots.push_real(0.5));
        assert!(roots.push_real(-0.5));
        assert!(!roots.push_real(0.1));
        assert_eq!(roots.number_of_roots(), 2);
        assert_eq!(roots.last_real(), Some(-0.5));
        roots.clear();
        assert!(roots.is_empty());
        assert_eq!(roots.capacity(), 2);
    }

    #[test]
    fn test_from_polynomial() {
        // (x - 0.5)(x + 0.25) = x^2 - 0.25 x - 0.125
        let p = Polynomial::from_coefficients(-1.0, 1.0, &[-0.125, -0.25, 1.0]);
        let roots = Roots::from_polynomial(&p).unwrap();
        assert_eq!(roots.number_of_roots(), 2);
        assert!(roots.all_inside_unit_circle());
    }
}
