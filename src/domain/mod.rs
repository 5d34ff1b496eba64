//! Tensor-product domains: an ordered set of axis bases plus the grid dtype.

use crate::basis::{Basis, Capability, CompositeBasis, LaneKernel};
use crate::algs::transform::apply_along_axis;
use crate::distributor::layout::Layout;
use crate::spectral_error::SpectralError;
use ndarray::{Array1, ArrayD, s};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Element type of grid-space data.
///
/// Storage is always `Complex64`; `Real` only promises that grid values have
/// zero imaginary part, which rules out the complex Fourier basis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridDtype {
    Real,
    #[default]
    Complex,
}

impl GridDtype {
    pub fn as_str(self) -> &'static str {
        match self {
            GridDtype::Real => "real",
            GridDtype::Complex => "complex",
        }
    }
}

/// The function space of one domain axis.
#[derive(Clone, Debug, PartialEq)]
pub enum AxisBasis {
    Single(Basis),
    Composite(CompositeBasis),
}

impl From<Basis> for AxisBasis {
    fn from(b: Basis) -> Self {
        AxisBasis::Single(b)
    }
}

impl From<CompositeBasis> for AxisBasis {
    fn from(c: CompositeBasis) -> Self {
        AxisBasis::Composite(c)
    }
}

impl AxisBasis {
    pub fn name(&self) -> &str {
        match self {
            AxisBasis::Single(b) => b.name(),
            AxisBasis::Composite(c) => c.name(),
        }
    }

    /// Coefficient-space length (independent of scale).
    pub fn coeff_size(&self) -> usize {
        match self {
            AxisBasis::Single(b) => b.size(),
            AxisBasis::Composite(c) => c.size(),
        }
    }

    pub fn grid_size(&self, scale: f64) -> usize {
        match self {
            AxisBasis::Single(b) => b.grid_size(scale),
            AxisBasis::Composite(c) => c.grid_size(scale),
        }
    }

    pub fn dealias(&self) -> f64 {
        match self {
            AxisBasis::Single(b) => b.dealias(),
            AxisBasis::Composite(c) => c.dealias(),
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            AxisBasis::Single(b) => b.capability(),
            AxisBasis::Composite(c) => c.capability(),
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match self {
            AxisBasis::Single(b) => b.bounds(),
            AxisBasis::Composite(c) => c.bounds(),
        }
    }

    pub fn requires_complex(&self) -> bool {
        match self {
            AxisBasis::Single(b) => b.requires_complex(),
            AxisBasis::Composite(c) => c.requires_complex(),
        }
    }

    pub fn check_scale(&self, scale: f64) -> Result<(), SpectralError> {
        match self {
            AxisBasis::Single(b) => b.params().check_scale(scale),
            AxisBasis::Composite(c) => c.check_scale(scale),
        }
    }

    /// Full global grid at `scale`.
    pub fn grid(&self, scale: f64) -> Result<Array1<f64>, SpectralError> {
        match self {
            AxisBasis::Single(b) => b.grid(scale),
            AxisBasis::Composite(c) => c.grid(scale),
        }
    }

    pub(crate) fn forward_kernel(&self, scale: f64) -> LaneKernel {
        match self {
            AxisBasis::Single(b) => b.forward_kernel(b.grid_size(scale)),
            AxisBasis::Composite(c) => c.forward_kernel(scale),
        }
    }

    pub(crate) fn backward_kernel(&self, scale: f64) -> LaneKernel {
        match self {
            AxisBasis::Single(b) => b.backward_kernel(b.grid_size(scale)),
            AxisBasis::Composite(c) => c.backward_kernel(scale),
        }
    }

    /// Coefficients → grid values along `axis`.
    pub fn transform_forward(
        &self,
        data: &ArrayD<Complex64>,
        axis: usize,
        scale: f64,
    ) -> Result<ArrayD<Complex64>, SpectralError> {
        self.check_scale(scale)?;
        apply_along_axis(data, axis, &self.forward_kernel(scale))
    }

    /// Grid values → coefficients along `axis`.
    pub fn transform_backward(
        &self,
        data: &ArrayD<Complex64>,
        axis: usize,
        scale: f64,
    ) -> Result<ArrayD<Complex64>, SpectralError> {
        self.check_scale(scale)?;
        apply_along_axis(data, axis, &self.backward_kernel(scale))
    }
}

/// Ordered tuple of `N >= 1` axis bases. Axis `N-1` is the one the
/// transform path starts with as local.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisSet {
    axes: Vec<AxisBasis>,
    dtype: GridDtype,
}

impl AxisSet {
    /// # Errors
    /// - `EmptyAxisSet` for zero axes,
    /// - `DtypeMismatch` if a complex-only basis is used with real data.
    pub fn new(axes: Vec<AxisBasis>, dtype: GridDtype) -> Result<Self, SpectralError> {
        if axes.is_empty() {
            return Err(SpectralError::EmptyAxisSet);
        }
        if dtype == GridDtype::Real {
            if let Some((axis, b)) = axes.iter().enumerate().find(|(_, b)| b.requires_complex()) {
                return Err(SpectralError::DtypeMismatch {
                    axis,
                    basis: b.name().to_string(),
                    required: GridDtype::Complex.as_str(),
                });
            }
        }
        Ok(Self { axes, dtype })
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[AxisBasis] {
        &self.axes
    }

    pub fn axis(&self, axis: usize) -> Result<&AxisBasis, SpectralError> {
        self.axes.get(axis).ok_or(SpectralError::OutOfRange {
            axis,
            axes: self.axes.len(),
        })
    }

    pub fn dtype(&self) -> GridDtype {
        self.dtype
    }

    /// Per-axis dealias scale factors.
    pub fn dealias_scales(&self) -> Vec<f64> {
        self.axes.iter().map(AxisBasis::dealias).collect()
    }

    pub fn coeff_shape(&self) -> Vec<usize> {
        self.axes.iter().map(AxisBasis::coeff_size).collect()
    }

    pub fn check_scales(&self, scales: &[f64]) -> Result<(), SpectralError> {
        if scales.len() != self.axes.len() {
            return Err(SpectralError::ScaleCountMismatch {
                expected: self.axes.len(),
                got: scales.len(),
            });
        }
        self.axes
            .iter()
            .zip(scales)
            .try_for_each(|(b, &s)| b.check_scale(s))
    }

    /// Global extent of every axis given which axes are in grid space.
    pub fn global_shape(
        &self,
        grid_flags: &[bool],
        scales: &[f64],
    ) -> Result<Vec<usize>, SpectralError> {
        self.check_scales(scales)?;
        if grid_flags.len() != self.axes.len() {
            return Err(SpectralError::ShapeMismatch {
                expected: vec![self.axes.len()],
                got: vec![grid_flags.len()],
            });
        }
        Ok(self
            .axes
            .iter()
            .zip(grid_flags.iter().zip(scales))
            .map(|(b, (&grid, &s))| if grid { b.grid_size(s) } else { b.coeff_size() })
            .collect())
    }

    pub fn grid_shape(&self, scales: &[f64]) -> Result<Vec<usize>, SpectralError> {
        self.global_shape(&vec![true; self.axes.len()], scales)
    }

    /// This process' slice of `axis`' grid under `layout`.
    pub fn build_grid(
        &self,
        axis: usize,
        scale: f64,
        layout: &Layout,
    ) -> Result<Array1<f64>, SpectralError> {
        let basis = self.axis(axis)?;
        if layout.ndim() != self.axes.len() {
            return Err(SpectralError::OutOfRange {
                axis,
                axes: layout.ndim(),
            });
        }
        let full = basis.grid(scale)?;
        let block = layout.axis_block(axis, full.len());
        Ok(full.slice(s![block]).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributor::layout::block_partition;
    use crate::distributor::{Distributor, ProcessContext};

    fn domain() -> AxisSet {
        AxisSet::new(
            vec![
                Basis::real_fourier("x", 8, (0.0, 1.0)).unwrap().into(),
                Basis::real_fourier("y", 6, (0.0, 1.0))
                    .unwrap()
                    .with_dealias(1.5)
                    .unwrap()
                    .into(),
                Basis::chebyshev("z", 5, (-1.0, 1.0)).unwrap().into(),
            ],
            GridDtype::Real,
        )
        .unwrap()
    }

    #[test]
    fn shapes_follow_grid_flags() {
        let d = domain();
        assert_eq!(d.axis_count(), 3);
        assert_eq!(d.coeff_shape(), vec![8, 6, 5]);
        let scales = d.dealias_scales();
        assert_eq!(scales, vec![1.0, 1.5, 1.0]);
        assert_eq!(d.global_shape(&[false, true, true], &scales).unwrap(), vec![8, 9, 5]);
        assert_eq!(
            d.global_shape(&[true; 3], &[1.0, 1.0]).unwrap_err(),
            SpectralError::ScaleCountMismatch { expected: 3, got: 2 }
        );
    }

    #[test]
    fn out_of_range_axis() {
        let d = domain();
        assert_eq!(
            d.axis(3).unwrap_err(),
            SpectralError::OutOfRange { axis: 3, axes: 3 }
        );
    }

    #[test]
    fn complex_fourier_needs_complex_dtype() {
        let err = AxisSet::new(
            vec![Basis::fourier("x", 8, (0.0, 1.0)).unwrap().into()],
            GridDtype::Real,
        )
        .unwrap_err();
        assert!(matches!(err, SpectralError::DtypeMismatch { axis: 0, .. }));
        assert!(matches!(
            AxisSet::new(vec![], GridDtype::Complex),
            Err(SpectralError::EmptyAxisSet)
        ));
    }

    #[test]
    fn build_grid_rejects_layout_of_other_domain() {
        let one_axis = AxisSet::new(
            vec![Basis::chebyshev("z", 5, (-1.0, 1.0)).unwrap().into()],
            GridDtype::Real,
        )
        .unwrap();
        let dist = Distributor::serial(one_axis).unwrap();
        assert_eq!(
            domain().build_grid(2, 1.0, dist.grid_layout()).unwrap_err(),
            SpectralError::OutOfRange { axis: 2, axes: 1 }
        );
    }

    #[test]
    fn build_grid_slices_distributed_axis() {
        let ctx = ProcessContext::new(1, 2).unwrap();
        let dist = Distributor::new(domain(), Some(vec![2]), ctx).unwrap();
        // axis 1 starts split over the 2-process mesh dim
        let layout = &dist.layouts()[0];
        let local = dist.domain().build_grid(1, 1.5, layout).unwrap();
        let full = dist.domain().axis(1).unwrap().grid(1.5).unwrap();
        let block = block_partition(9, 2, 1);
        assert_eq!(local.len(), block.len());
        assert_eq!(local[0], full[block.start]);
    }
}
