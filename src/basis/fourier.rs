//! Complex Fourier basis: `exp(i k 2π (x - a) / L)` on a periodic interval.

use super::BasisParams;
use super::kernel::{LaneKernel, SpectrumDirection, cached_plan};
use crate::spectral_error::SpectralError;
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Complex exponentials, FFT-backed.
///
/// Coefficient `j` carries wavenumber `k_j` in FFT order
/// (`0, 1, .., ceil(M/2)-1, -floor(M/2), .., -1`).
#[derive(Clone, Debug, PartialEq)]
pub struct FourierBasis {
    pub(crate) params: BasisParams,
}

impl FourierBasis {
    pub fn new(params: BasisParams) -> Result<Self, SpectralError> {
        Ok(Self { params })
    }

    pub fn params(&self) -> &BasisParams {
        &self.params
    }

    /// Integer wavenumber of coefficient `j`.
    pub fn wavenumber(&self, j: usize) -> isize {
        let m = self.params.size();
        if j < m.div_ceil(2) {
            j as isize
        } else {
            j as isize - m as isize
        }
    }

    /// `n` evenly spaced points starting at `a`, excluding `b`.
    pub fn grid(&self, n: usize) -> Array1<f64> {
        let (a, _) = self.params.bounds();
        let dx = self.params.length() / n as f64;
        Array1::from_shape_fn(n, |g| a + dx * g as f64)
    }

    pub fn evaluate_modes(&self, x: f64) -> Vec<Complex64> {
        let (a, _) = self.params.bounds();
        let theta = 2.0 * PI * (x - a) / self.params.length();
        (0..self.params.size())
            .map(|j| Complex64::from_polar(1.0, self.wavenumber(j) as f64 * theta))
            .collect()
    }

    pub(crate) fn forward_kernel(&self, grid: usize) -> LaneKernel {
        LaneKernel::Spectrum {
            plan: cached_plan(grid, true),
            modes: self.params.size(),
            grid,
            direction: SpectrumDirection::ToGrid,
        }
    }

    pub(crate) fn backward_kernel(&self, grid: usize) -> LaneKernel {
        LaneKernel::Spectrum {
            plan: cached_plan(grid, false),
            modes: self.params.size(),
            grid,
            direction: SpectrumDirection::ToCoeff,
        }
    }
}
