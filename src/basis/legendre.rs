//! Legendre polynomials on the Gauss–Legendre quadrature grid.

use super::BasisParams;
use super::kernel::LaneKernel;
use crate::spectral_error::SpectralError;
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use std::f64::consts::PI;

const NEWTON_TOL: f64 = 1e-15;
const NEWTON_MAX_ITERS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct LegendreBasis {
    pub(crate) params: BasisParams,
}

/// Gauss–Legendre nodes (ascending) and weights on `[-1, 1]`.
///
/// Newton iteration on `P_n` from the asymptotic initial guess; the weights
/// sum to 2.
pub fn gauss_legendre(n: usize) -> (Array1<f64>, Array1<f64>) {
    let mut nodes = Array1::zeros(n);
    let mut weights = Array1::zeros(n);
    for i in 0..n {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..NEWTON_MAX_ITERS {
            let (p, p_prev) = legendre_pair(n, x);
            dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < NEWTON_TOL {
                break;
            }
        }
        // the guess runs from +1 downward; store ascending
        nodes[n - 1 - i] = x;
        weights[n - 1 - i] = 2.0 / ((1.0 - x * x) * dp * dp);
    }
    (nodes, weights)
}

/// `(P_n(x), P_{n-1}(x))` for `n >= 1`.
fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    let (mut p_prev, mut p) = (1.0, x);
    for k in 2..=n {
        let k = k as f64;
        let next = ((2.0 * k - 1.0) * x * p - (k - 1.0) * p_prev) / k;
        p_prev = p;
        p = next;
    }
    (p, p_prev)
}

impl LegendreBasis {
    pub fn new(params: BasisParams) -> Result<Self, SpectralError> {
        Ok(Self { params })
    }

    pub fn params(&self) -> &BasisParams {
        &self.params
    }

    pub fn grid(&self, n: usize) -> Array1<f64> {
        gauss_legendre(n).0.mapv(|xi| self.params.from_native(xi))
    }

    /// `P_0(ξ) .. P_{m-1}(ξ)`.
    fn polynomials(m: usize, xi: f64) -> Vec<f64> {
        let mut p = Vec::with_capacity(m);
        p.push(1.0);
        if m > 1 {
            p.push(xi);
        }
        for n in 1..m.saturating_sub(1) {
            let nf = n as f64;
            let next = ((2.0 * nf + 1.0) * xi * p[n] - nf * p[n - 1]) / (nf + 1.0);
            p.push(next);
        }
        p
    }

    pub fn evaluate_modes(&self, x: f64) -> Vec<Complex64> {
        Self::polynomials(self.params.size(), self.params.to_native(x))
            .into_iter()
            .map(|v| Complex64::new(v, 0.0))
            .collect()
    }

    pub(crate) fn forward_kernel(&self, grid: usize) -> LaneKernel {
        let m = self.params.size();
        let (nodes, _) = gauss_legendre(grid);
        let mut matrix = Array2::zeros((grid, m));
        for (g, &xi) in nodes.iter().enumerate() {
            for (n, p) in Self::polynomials(m, xi).into_iter().enumerate() {
                matrix[[g, n]] = p;
            }
        }
        LaneKernel::Dense(matrix)
    }

    pub(crate) fn backward_kernel(&self, grid: usize) -> LaneKernel {
        let m = self.params.size();
        let (nodes, weights) = gauss_legendre(grid);
        let mut matrix = Array2::zeros((m, grid));
        for (g, (&xi, &w)) in nodes.iter().zip(weights.iter()).enumerate() {
            for (n, p) in Self::polynomials(m, xi).into_iter().enumerate() {
                matrix[[n, g]] = (2.0 * n as f64 + 1.0) / 2.0 * w * p;
            }
        }
        LaneKernel::Dense(matrix)
    }
}
