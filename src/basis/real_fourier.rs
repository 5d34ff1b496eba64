//! Real Fourier basis: interleaved `cos(k θ)` / `-sin(k θ)` pairs.

use super::BasisParams;
use super::kernel::LaneKernel;
use crate::spectral_error::SpectralError;
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Real periodic basis with coefficients `[cos0, -sin0, cos1, -sin1, ..]`.
///
/// The `-sin0` slot is identically zero on the grid; the backward transform
/// always writes zero there.
#[derive(Clone, Debug, PartialEq)]
pub struct RealFourierBasis {
    pub(crate) params: BasisParams,
}

impl RealFourierBasis {
    pub fn new(params: BasisParams) -> Result<Self, SpectralError> {
        if params.size() % 2 != 0 {
            return Err(params.invalid(format!(
                "real Fourier needs an even mode count, got {}",
                params.size()
            )));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &BasisParams {
        &self.params
    }

    pub fn grid(&self, n: usize) -> Array1<f64> {
        let (a, _) = self.params.bounds();
        let dx = self.params.length() / n as f64;
        Array1::from_shape_fn(n, |g| a + dx * g as f64)
    }

    fn mode_value(j: usize, theta: f64) -> f64 {
        let k = (j / 2) as f64;
        if j % 2 == 0 {
            (k * theta).cos()
        } else {
            -(k * theta).sin()
        }
    }

    pub fn evaluate_modes(&self, x: f64) -> Vec<Complex64> {
        let (a, _) = self.params.bounds();
        let theta = 2.0 * PI * (x - a) / self.params.length();
        (0..self.params.size())
            .map(|j| Complex64::new(Self::mode_value(j, theta), 0.0))
            .collect()
    }

    pub(crate) fn forward_kernel(&self, grid: usize) -> LaneKernel {
        let m = self.params.size();
        LaneKernel::Dense(Array2::from_shape_fn((grid, m), |(g, j)| {
            Self::mode_value(j, 2.0 * PI * g as f64 / grid as f64)
        }))
    }

    pub(crate) fn backward_kernel(&self, grid: usize) -> LaneKernel {
        let m = self.params.size();
        let n = grid as f64;
        LaneKernel::Dense(Array2::from_shape_fn((m, grid), |(j, g)| {
            let weight = match j {
                0 => 1.0 / n,
                1 => 0.0,
                _ => 2.0 / n,
            };
            weight * Self::mode_value(j, 2.0 * PI * g as f64 / n)
        }))
    }
}
