//! Chebyshev polynomials of the first kind on the Gauss (interior root) grid.
//!
//! With `G` grid points `ξ_g = -cos(π (g + ½) / G)` the discrete
//! orthogonality
//!
//! ```text
//! Σ_g T_n(ξ_g) T_m(ξ_g) = G      (n = m = 0)
//!                       = G / 2  (n = m > 0)
//!                       = 0      (n ≠ m),    n, m < G
//! ```
//!
//! gives an exact backward transform for every `G >= M`.

use super::BasisParams;
use super::kernel::LaneKernel;
use crate::spectral_error::SpectralError;
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Clone, Debug, PartialEq)]
pub struct ChebyshevBasis {
    pub(crate) params: BasisParams,
}

impl ChebyshevBasis {
    pub fn new(params: BasisParams) -> Result<Self, SpectralError> {
        Ok(Self { params })
    }

    pub fn params(&self) -> &BasisParams {
        &self.params
    }

    /// Gauss nodes on `[-1, 1]`, ascending.
    pub fn native_grid(n: usize) -> Array1<f64> {
        Array1::from_shape_fn(n, |g| -(PI * (g as f64 + 0.5) / n as f64).cos())
    }

    pub fn grid(&self, n: usize) -> Array1<f64> {
        Self::native_grid(n).mapv(|xi| self.params.from_native(xi))
    }

    /// `T_0(ξ) .. T_{m-1}(ξ)` by the three-term recurrence.
    fn polynomials(m: usize, xi: f64) -> Vec<f64> {
        let mut t = Vec::with_capacity(m);
        t.push(1.0);
        if m > 1 {
            t.push(xi);
        }
        for n in 2..m {
            let next = 2.0 * xi * t[n - 1] - t[n - 2];
            t.push(next);
        }
        t
    }

    pub fn evaluate_modes(&self, x: f64) -> Vec<Complex64> {
        Self::polynomials(self.params.size(), self.params.to_native(x))
            .into_iter()
            .map(|v| Complex64::new(v, 0.0))
            .collect()
    }

    pub(crate) fn forward_kernel(&self, grid: usize) -> LaneKernel {
        let m = self.params.size();
        let mut matrix = Array2::zeros((grid, m));
        for (g, &xi) in Self::native_grid(grid).iter().enumerate() {
            for (n, t) in Self::polynomials(m, xi).into_iter().enumerate() {
                matrix[[g, n]] = t;
            }
        }
        LaneKernel::Dense(matrix)
    }

    pub(crate) fn backward_kernel(&self, grid: usize) -> LaneKernel {
        let m = self.params.size();
        let mut matrix = Array2::zeros((m, grid));
        for (g, &xi) in Self::native_grid(grid).iter().enumerate() {
            for (n, t) in Self::polynomials(m, xi).into_iter().enumerate() {
                let weight = if n == 0 { 1.0 } else { 2.0 };
                matrix[[n, g]] = weight * t / grid as f64;
            }
        }
        LaneKernel::Dense(matrix)
    }
}
