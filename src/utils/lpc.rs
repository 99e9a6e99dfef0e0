//! Burg's method for linear prediction
//!
//! The recursion follows Praat's VECburg. The coefficients it produces use
//! the predictor convention `x[n] ~ sum_k c[k] x[n-k]`; LPC frames store
//! `a[k] = -c[k]` so that `A(z) = 1 + a[1] z^-1 + ... + a[p] z^-p`.

/// Reusable buffers for Burg's recursion
///
/// The buffers grow to the largest frame seen and are then reused, so one
/// workspace per thread is enough for a whole analysis.
#[derive(Debug, Clone, Default)]
pub struct BurgWorkspace {
    b1: Vec<f64>,
    b2: Vec<f64>,
    aa: Vec<f64>,
}

impl BurgWorkspace {
    pub fn new(frame_size: usize, order: usize) -> Self {
        Self {
            b1: vec![0.0; frame_size],
            b2: vec![0.0; frame_size],
            aa: vec![0.0; order],
        }
    }

    /// Predictor coefficients of `samples` into `c`; returns the mean-square
    /// prediction error
    ///
    /// The order is `c.len()`. On an all-zero frame `c` is zeroed and the
    /// error is 0.
    pub fn compute(&mut self, samples: &[f64], c: &mut [f64]) -> f64 {
        let n = samples.len();
        let m = c.len();
        c.iter_mut().for_each(|x| *x = 0.0);

        if n <= 2 {
            if m > 0 {
                c[0] = -1.0;
            }
            return match n {
                2 => 0.5 * (samples[0] * samples[0] + samples[1] * samples[1]),
                1 => samples[0] * samples[0],
                _ => 0.0,
            };
        }

        let p: f64 = samples.iter().map(|x| x * x).sum();
        let mut xms = p / n as f64;
        if xms <= 0.0 {
            return xms;
        }

        if self.b1.len() < n {
            self.b1.resize(n, 0.0);
            self.b2.resize(n, 0.0);
        }
        if self.aa.len() < m {
            self.aa.resize(m, 0.0);
        }
        let (b1, b2, aa) = (&mut self.b1, &mut self.b2, &mut self.aa);

        // b1 = x[0..n-1], b2 = x[1..n]
        b1[0] = samples[0];
        b2[n - 2] = samples[n - 1];
        for j in 1..n - 1 {
            b1[j] = samples[j];
            b2[j - 1] = samples[j];
        }

        for i in 0..m {
            let mut num = 0.0;
            let mut den = 0.0;
            for j in 0..n - i - 1 {
                num += b1[j] * b2[j];
                den += b1[j] * b1[j] + b2[j] * b2[j];
            }
            if den <= 0.0 {
                return 0.0;
            }

            c[i] = 2.0 * num / den;
            xms *= 1.0 - c[i] * c[i];
            for j in 0..i {
                c[j] = aa[j] - c[i] * aa[i - j - 1];
            }

            if i + 1 < m {
                aa[..=i].copy_from_slice(&c[..=i]);
                for j in 0..n - i - 2 {
                    b1[j] -= aa[i] * b2[j];
                    b2[j] = b2[j + 1] - aa[i] * b1[j + 1];
                }
            }
        }
        xms
    }
}
