//! Single-axis spectral bases.
//!
//! A [`Basis`] is the function space of one array axis. It owns the grid
//! for that axis and the 1D transforms between coefficient space (expansion
//! coefficients) and grid space (sampled values). The family set is closed:
//!
//! | family        | capability    | grid                         |
//! |---------------|---------------|------------------------------|
//! | `Fourier`     | separable     | evenly spaced, periodic      |
//! | `RealFourier` | separable     | evenly spaced, periodic      |
//! | `Chebyshev`   | non-separable | Gauss (interior roots)       |
//! | `Legendre`    | non-separable | Gauss–Legendre quadrature    |
//!
//! Several bases can be glued into one logical axis with
//! [`CompositeBasis`](composite::CompositeBasis).
//!
//! ## Grid sizes
//! The grid of a basis with `M` modes at scale `s` has
//! [`grid_size(s, M)`](grid_size) points. Coefficient length is always `M`;
//! the forward transform zero-pads high modes up to the grid and the
//! backward transform truncates them again.

pub mod chebyshev;
pub mod composite;
pub mod fourier;
pub mod kernel;
pub mod legendre;
pub mod real_fourier;

use crate::algs::transform::apply_along_axis;
use crate::spectral_error::SpectralError;
use ndarray::{Array1, ArrayD};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

pub use chebyshev::ChebyshevBasis;
pub use composite::{CompositeBasis, ContinuityRow, SegmentSpan};
pub use fourier::FourierBasis;
pub use kernel::LaneKernel;
pub use legendre::LegendreBasis;
pub use real_fourier::RealFourierBasis;

/// Number of grid points for `modes` coefficients at `scale`.
///
/// Rounds half up: `floor(scale * modes + 0.5)`. Every consumer (grids,
/// layout shapes, transform padding) goes through this function so the
/// three always agree.
#[inline]
pub fn grid_size(scale: f64, modes: usize) -> usize {
    (scale * modes as f64 + 0.5).floor() as usize
}

/// Algebraic structure of a basis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Operators are diagonal across modes; the axis may stay distributed.
    Separable,
    /// Operators couple modes; the axis is kept local for linear solves.
    Nonseparable,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Separable => "separable",
            Capability::Nonseparable => "nonseparable",
        }
    }
}

/// Validated parameters shared by every basis family.
///
/// Deserialization goes through [`BasisParams::new`] and
/// [`BasisParams::with_dealias`], so a decoded value is always valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBasisParams")]
pub struct BasisParams {
    name: String,
    size: usize,
    bounds: (f64, f64),
    dealias: f64,
}

#[derive(Deserialize)]
struct RawBasisParams {
    name: String,
    size: usize,
    bounds: (f64, f64),
    #[serde(default = "unit_dealias")]
    dealias: f64,
}

fn unit_dealias() -> f64 {
    1.0
}

impl TryFrom<RawBasisParams> for BasisParams {
    type Error = SpectralError;

    fn try_from(raw: RawBasisParams) -> Result<Self, Self::Error> {
        BasisParams::new(raw.name, raw.size, raw.bounds)?.with_dealias(raw.dealias)
    }
}

impl BasisParams {
    /// Validate `size > 0` and a finite, non-degenerate interval.
    pub fn new(
        name: impl Into<String>,
        size: usize,
        bounds: (f64, f64),
    ) -> Result<Self, SpectralError> {
        let params = Self {
            name: name.into(),
            size,
            bounds,
            dealias: 1.0,
        };
        if size == 0 {
            return Err(params.invalid("mode count must be positive"));
        }
        let (a, b) = bounds;
        if !a.is_finite() || !b.is_finite() {
            return Err(params.invalid(format!("interval [{a}, {b}) must be finite")));
        }
        if a >= b {
            return Err(params.invalid(format!(
                "interval [{a}, {b}) is degenerate: left must be < right"
            )));
        }
        Ok(params)
    }

    /// Replace the dealias scale (must be finite and >= 1).
    pub fn with_dealias(mut self, dealias: f64) -> Result<Self, SpectralError> {
        if !dealias.is_finite() || dealias < 1.0 {
            return Err(self.invalid(format!("dealias scale {dealias} must be finite and >= 1")));
        }
        self.dealias = dealias;
        Ok(self)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        self.bounds
    }

    #[inline]
    pub fn dealias(&self) -> f64 {
        self.dealias
    }

    /// Interval length `b - a`.
    #[inline]
    pub fn length(&self) -> f64 {
        self.bounds.1 - self.bounds.0
    }

    /// Map a native coordinate in `[-1, 1]` onto `[a, b]`.
    #[inline]
    pub fn from_native(&self, xi: f64) -> f64 {
        self.bounds.0 + self.length() * (xi + 1.0) / 2.0
    }

    /// Map a problem coordinate in `[a, b]` onto `[-1, 1]`.
    #[inline]
    pub fn to_native(&self, x: f64) -> f64 {
        2.0 * (x - self.bounds.0) / self.length() - 1.0
    }

    /// Validate a scale factor against this basis.
    pub fn check_scale(&self, scale: f64) -> Result<(), SpectralError> {
        if scale.is_finite() && scale >= 1.0 {
            Ok(())
        } else {
            Err(SpectralError::InvalidScale {
                basis: self.name.clone(),
                scale,
            })
        }
    }

    pub(crate) fn invalid(&self, reason: impl Into<String>) -> SpectralError {
        SpectralError::InvalidBasisConfig {
            basis: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// One axis' spectral function space.
#[derive(Clone, Debug, PartialEq)]
pub enum Basis {
    Fourier(FourierBasis),
    RealFourier(RealFourierBasis),
    Chebyshev(ChebyshevBasis),
    Legendre(LegendreBasis),
}

impl Basis {
    /// Complex exponentials on `[a, b)`.
    pub fn fourier(
        name: impl Into<String>,
        size: usize,
        bounds: (f64, f64),
    ) -> Result<Self, SpectralError> {
        Ok(Basis::Fourier(FourierBasis::new(BasisParams::new(name, size, bounds)?)?))
    }

    /// Real cosine/sine pairs on `[a, b)`; `size` must be even.
    pub fn real_fourier(
        name: impl Into<String>,
        size: usize,
        bounds: (f64, f64),
    ) -> Result<Self, SpectralError> {
        Ok(Basis::RealFourier(RealFourierBasis::new(BasisParams::new(
            name, size, bounds,
        )?)?))
    }

    /// Chebyshev polynomials of the first kind on `[a, b]`.
    pub fn chebyshev(
        name: impl Into<String>,
        size: usize,
        bounds: (f64, f64),
    ) -> Result<Self, SpectralError> {
        Ok(Basis::Chebyshev(ChebyshevBasis::new(BasisParams::new(
            name, size, bounds,
        )?)?))
    }

    /// Legendre polynomials on `[a, b]`.
    pub fn legendre(
        name: impl Into<String>,
        size: usize,
        bounds: (f64, f64),
    ) -> Result<Self, SpectralError> {
        Ok(Basis::Legendre(LegendreBasis::new(BasisParams::new(
            name, size, bounds,
        )?)?))
    }

    /// Same basis with a different dealias scale.
    pub fn with_dealias(self, dealias: f64) -> Result<Self, SpectralError> {
        Ok(match self {
            Basis::Fourier(b) => Basis::Fourier(FourierBasis::new(b.params.with_dealias(dealias)?)?),
            Basis::RealFourier(b) => {
                Basis::RealFourier(RealFourierBasis::new(b.params.with_dealias(dealias)?)?)
            }
            Basis::Chebyshev(b) => {
                Basis::Chebyshev(ChebyshevBasis::new(b.params.with_dealias(dealias)?)?)
            }
            Basis::Legendre(b) => {
                Basis::Legendre(LegendreBasis::new(b.params.with_dealias(dealias)?)?)
            }
        })
    }

    pub fn params(&self) -> &BasisParams {
        match self {
            Basis::Fourier(b) => &b.params,
            Basis::RealFourier(b) => &b.params,
            Basis::Chebyshev(b) => &b.params,
            Basis::Legendre(b) => &b.params,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.params().name()
    }

    /// Mode count `M` (coefficient-space length).
    #[inline]
    pub fn size(&self) -> usize {
        self.params().size()
    }

    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        self.params().bounds()
    }

    #[inline]
    pub fn dealias(&self) -> f64 {
        self.params().dealias()
    }

    pub fn capability(&self) -> Capability {
        match self {
            Basis::Fourier(_) | Basis::RealFourier(_) => Capability::Separable,
            Basis::Chebyshev(_) | Basis::Legendre(_) => Capability::Nonseparable,
        }
    }

    /// Whether grid values are complex even for real coefficients.
    pub fn requires_complex(&self) -> bool {
        matches!(self, Basis::Fourier(_))
    }

    /// Grid-space length at `scale`.
    #[inline]
    pub fn grid_size(&self, scale: f64) -> usize {
        grid_size(scale, self.size())
    }

    /// Sample positions at `scale`, ascending.
    pub fn grid(&self, scale: f64) -> Result<Array1<f64>, SpectralError> {
        self.params().check_scale(scale)?;
        let n = self.grid_size(scale);
        Ok(match self {
            Basis::Fourier(b) => b.grid(n),
            Basis::RealFourier(b) => b.grid(n),
            Basis::Chebyshev(b) => b.grid(n),
            Basis::Legendre(b) => b.grid(n),
        })
    }

    /// Values of every mode at position `x`, in coefficient order.
    pub fn evaluate_modes(&self, x: f64) -> Vec<Complex64> {
        match self {
            Basis::Fourier(b) => b.evaluate_modes(x),
            Basis::RealFourier(b) => b.evaluate_modes(x),
            Basis::Chebyshev(b) => b.evaluate_modes(x),
            Basis::Legendre(b) => b.evaluate_modes(x),
        }
    }

    /// Coefficients → grid values along `axis` of `data`.
    pub fn transform_forward(
        &self,
        data: &ArrayD<Complex64>,
        axis: usize,
        scale: f64,
    ) -> Result<ArrayD<Complex64>, SpectralError> {
        self.params().check_scale(scale)?;
        apply_along_axis(data, axis, &self.forward_kernel(self.grid_size(scale)))
    }

    /// Grid values → coefficients along `axis` of `data`.
    pub fn transform_backward(
        &self,
        data: &ArrayD<Complex64>,
        axis: usize,
        scale: f64,
    ) -> Result<ArrayD<Complex64>, SpectralError> {
        self.params().check_scale(scale)?;
        apply_along_axis(data, axis, &self.backward_kernel(self.grid_size(scale)))
    }

    pub(crate) fn forward_kernel(&self, grid: usize) -> LaneKernel {
        match self {
            Basis::Fourier(b) => b.forward_kernel(grid),
            Basis::RealFourier(b) => b.forward_kernel(grid),
            Basis::Chebyshev(b) => b.forward_kernel(grid),
            Basis::Legendre(b) => b.forward_kernel(grid),
        }
    }

    pub(crate) fn backward_kernel(&self, grid: usize) -> LaneKernel {
        match self {
            Basis::Fourier(b) => b.backward_kernel(grid),
            Basis::RealFourier(b) => b.backward_kernel(grid),
            Basis::Chebyshev(b) => b.backward_kernel(grid),
            Basis::Legendre(b) => b.backward_kernel(grid),
        }
    }
}
