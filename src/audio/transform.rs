//! Cosine transform used by the smoother and the spectral interpolator
//!
//! The concealment code only depends on [`CosineTransform`]: a forward
//! transform producing integer coefficients ordered from lowest to highest
//! frequency, and an inverse that reconstructs samples from them.
//! [`DirectDct`] is the orthonormal DCT-II / DCT-III pair evaluated directly
//! from cached cosine tables.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use parking_lot::Mutex;

/// Forward/inverse cosine transform pair
pub trait CosineTransform: Send + Sync {
    /// Time domain to frequency domain, one coefficient per sample
    fn forward(&self, samples: &[i16]) -> Vec<i32>;

    /// Frequency domain back to samples, saturated to the i16 range
    fn inverse(&self, coeffs: &[i32]) -> Vec<i16>;
}

/// Orthonormal DCT evaluated as a matrix product
///
/// `X[k] = s(k) * sum_n x[n] * cos(pi / N * (n + 0.5) * k)` with
/// `s(0) = sqrt(1/N)` and `s(k) = sqrt(2/N)` otherwise. The scaled basis is
/// cached per length, so repeated 160/320-point transforms do not recompute
/// cosines.
#[derive(Default)]
pub struct DirectDct {
    bases: Mutex<HashMap<usize, Arc<[f64]>>>,
}

impl DirectDct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scaled basis for length `n`, row-major by frequency
    fn basis(&self, n: usize) -> Arc<[f64]> {
        let mut bases = self.bases.lock();
        bases
            .entry(n)
            .or_insert_with(|| {
                let factor = PI / n as f64;
                let dc = (1.0 / n as f64).sqrt();
                let ac = (2.0 / n as f64).sqrt();

                let mut table = Vec::with_capacity(n * n);
                for k in 0..n {
                    let scale = if k == 0 { dc } else { ac };
                    for i in 0..n {
                        table.push(scale * (factor * (i as f64 + 0.5) * k as f64).cos());
                    }
                }
                table.into()
            })
            .clone()
    }
}

impl CosineTransform for DirectDct {
    fn forward(&self, samples: &[i16]) -> Vec<i32> {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }
        let basis = self.basis(n);

        basis
            .chunks_exact(n)
            .map(|row| {
                let sum: f64 = row
                    .iter()
                    .zip(samples)
                    .map(|(&c, &x)| c * x as f64)
                    .sum();
                sum.round() as i32
            })
            .collect()
    }

    fn inverse(&self, coeffs: &[i32]) -> Vec<i16> {
        let n = coeffs.len();
        if n == 0 {
            return Vec::new();
        }
        let basis = self.basis(n);

        let mut out = vec![0.0f64; n];
        for (row, &c) in basis.chunks_exact(n).zip(coeffs) {
            if c == 0 {
                continue;
            }
            let c = c as f64;
            for (acc, &b) in out.iter_mut().zip(row.iter()) {
                *acc += c * b;
            }
        }

        // `as` saturates float-to-int conversions
        out.into_iter().map(|v| v.round() as i16).collect()
    }
}
