//! Process-local block of a distributed field.

use crate::distributor::Distributor;
use crate::spectral_error::SpectralError;
use ndarray::{ArrayD, ArrayViewMutD, IxDyn};
use num_complex::Complex64;

/// Local data of one field plus the layout it is currently in.
///
/// The local shape always equals the distributor's local shape for
/// `(layout, scales)`; only the distributor moves the array between layouts.
/// The array remembers the chain it was built on and is rejected once the
/// distributor is reconfigured.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributedArray {
    data: ArrayD<Complex64>,
    layout: usize,
    scales: Vec<f64>,
    chain: u64,
}

impl DistributedArray {
    /// Zero field in layout `layout` at the domain's dealias scales.
    pub fn zeros(dist: &Distributor, layout: usize) -> Result<Self, SpectralError> {
        Self::zeros_with_scales(dist, layout, dist.domain().dealias_scales())
    }

    /// Zero field at explicit per-axis scales.
    pub fn zeros_with_scales(
        dist: &Distributor,
        layout: usize,
        scales: Vec<f64>,
    ) -> Result<Self, SpectralError> {
        let shape = dist.local_shape(layout, &scales)?;
        Ok(Self {
            data: ArrayD::zeros(IxDyn(&shape)),
            layout,
            scales,
            chain: dist.chain_id(),
        })
    }

    /// Wrap an existing local block.
    ///
    /// # Errors
    /// `ShapeMismatch` if `data` is not shaped like `layout` at `scales`.
    pub fn from_local(
        dist: &Distributor,
        layout: usize,
        scales: Vec<f64>,
        data: ArrayD<Complex64>,
    ) -> Result<Self, SpectralError> {
        let expected = dist.local_shape(layout, &scales)?;
        if data.shape() != expected.as_slice() {
            return Err(SpectralError::ShapeMismatch {
                expected,
                got: data.shape().to_vec(),
            });
        }
        Ok(Self {
            data,
            layout,
            scales,
            chain: dist.chain_id(),
        })
    }

    /// Fill this process' block from a function of the *global* index.
    pub fn from_global_fn<F>(
        dist: &Distributor,
        layout: usize,
        scales: Vec<f64>,
        f: F,
    ) -> Result<Self, SpectralError>
    where
        F: Fn(&[usize]) -> Complex64,
    {
        let global = dist.global_shape(layout, &scales)?;
        let l = dist.layout(layout)?;
        let shape = l.local_shape(&global);
        let start = l.start(&global);
        let mut index = vec![0; shape.len()];
        let data = ArrayD::from_shape_fn(IxDyn(&shape), |local| {
            for (k, slot) in index.iter_mut().enumerate() {
                *slot = start[k] + local[k];
            }
            f(&index)
        });
        Ok(Self {
            data,
            layout,
            scales,
            chain: dist.chain_id(),
        })
    }

    /// Local block.
    pub fn data(&self) -> &ArrayD<Complex64> {
        &self.data
    }

    /// Mutable view; the shape cannot change through it.
    pub fn data_mut(&mut self) -> ArrayViewMutD<'_, Complex64> {
        self.data.view_mut()
    }

    /// Take the local block.
    pub fn into_data(self) -> ArrayD<Complex64> {
        self.data
    }

    /// Index of the current layout.
    pub fn layout(&self) -> usize {
        self.layout
    }

    /// Per-axis scales the array was built with.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Id of the layout chain the array was built on.
    pub fn chain_id(&self) -> u64 {
        self.chain
    }

    pub(crate) fn replace(&mut self, data: ArrayD<Complex64>, layout: usize) {
        self.data = data;
        self.layout = layout;
    }
}
