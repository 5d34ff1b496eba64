//! One point on the transform path: which axes are in grid space and how
//! each axis is split across the process mesh.

use crate::debug_invariants::DebugInvariants;
use crate::distributor::mesh::ProcessMesh;
use crate::spectral_error::SpectralError;
use itertools::Itertools;
use std::fmt;
use std::ops::Range;

/// Contiguous block `part` of `global` items split into `parts` blocks.
///
/// Blocks have `ceil(global / parts)` items except at the tail, which may be
/// short or empty. Every process computes the same split.
#[inline]
pub fn block_partition(global: usize, parts: usize, part: usize) -> Range<usize> {
    let block = global.div_ceil(parts.max(1));
    let start = (part * block).min(global);
    let end = (start + block).min(global);
    start..end
}

/// Immutable layout descriptor.
///
/// `distribution[axis]` names the mesh dimension that axis is split over, or
/// `None` when the axis is whole on every process. An axis split over a mesh
/// dimension of size one still counts as local.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    index: usize,
    grid_space: Vec<bool>,
    distribution: Vec<Option<usize>>,
    mesh: Vec<usize>,
    coords: Vec<usize>,
}

impl Layout {
    pub(crate) fn new(
        index: usize,
        grid_space: Vec<bool>,
        distribution: Vec<Option<usize>>,
        mesh: &ProcessMesh,
    ) -> Self {
        debug_assert_eq!(grid_space.len(), distribution.len());
        Self {
            index,
            grid_space,
            distribution,
            mesh: mesh.shape().to_vec(),
            coords: mesh.coords().to_vec(),
        }
    }

    /// Position on the path.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ndim(&self) -> usize {
        self.grid_space.len()
    }

    pub fn grid_space(&self) -> &[bool] {
        &self.grid_space
    }

    pub fn distribution(&self) -> &[Option<usize>] {
        &self.distribution
    }

    /// Whether every process holds the full extent of `axis`.
    pub fn is_local(&self, axis: usize) -> bool {
        self.parts(axis) == 1
    }

    /// Locality of every axis.
    pub fn local(&self) -> Vec<bool> {
        (0..self.ndim()).map(|a| self.is_local(a)).collect()
    }

    /// Number of blocks `axis` is split into.
    pub fn parts(&self, axis: usize) -> usize {
        self.distribution[axis].map_or(1, |d| self.mesh[d])
    }

    /// The block of `axis` (global extent `global`) held by this process.
    pub fn axis_block(&self, axis: usize, global: usize) -> Range<usize> {
        match self.distribution[axis] {
            Some(d) => block_partition(global, self.mesh[d], self.coords[d]),
            None => 0..global,
        }
    }

    /// Local extents given the global shape.
    pub fn local_shape(&self, global: &[usize]) -> Vec<usize> {
        global
            .iter()
            .enumerate()
            .map(|(axis, &g)| self.axis_block(axis, g).len())
            .collect()
    }

    /// Global offset of the first local element along each axis.
    pub fn start(&self, global: &[usize]) -> Vec<usize> {
        global
            .iter()
            .enumerate()
            .map(|(axis, &g)| self.axis_block(axis, g).start)
            .collect()
    }
}

fn flags(v: &[bool]) -> String {
    v.iter().map(|&b| if b { 'T' } else { 'F' }).collect()
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dist = self
            .distribution
            .iter()
            .map(|d| d.map_or_else(|| "-".to_string(), |d| d.to_string()))
            .join(",");
        write!(
            f,
            "layout {}: grid={} local={} mesh_dims=[{}]",
            self.index,
            flags(&self.grid_space),
            flags(&self.local()),
            dist
        )
    }
}

impl DebugInvariants for Layout {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Layout");
    }

    /// Each mesh dimension splits at most one axis and the coordinates fit
    /// the mesh.
    fn validate_invariants(&self) -> Result<(), SpectralError> {
        if self.coords.len() != self.mesh.len()
            || self.coords.iter().zip(&self.mesh).any(|(&c, &m)| c >= m)
        {
            return Err(SpectralError::InvariantViolation(format!(
                "layout {}: coords {:?} outside mesh {:?}",
                self.index, self.coords, self.mesh
            )));
        }
        let dims: Vec<usize> = self.distribution.iter().flatten().copied().collect();
        if dims.iter().any(|&d| d >= self.mesh.len()) || !dims.iter().all_unique() {
            return Err(SpectralError::InvariantViolation(format!(
                "layout {}: mesh dims {:?} invalid for mesh {:?}",
                self.index, self.distribution, self.mesh
            )));
        }
        Ok(())
    }
}
