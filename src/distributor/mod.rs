//! # Distributor
//!
//! Owns the process mesh and the layout chain for one [`AxisSet`], and moves
//! [`DistributedArray`]s along that chain.
//!
//! The chain is computed once at construction (see [`path`]) and replayed
//! identically on every process. Only transposes communicate; the decision of
//! *which* edge to take never does. Edges are walked one at a time and only
//! between neighbouring layouts; [`Distributor::change_layout`] walks several.
//!
//! ```
//! use spectral_sieve::prelude::*;
//!
//! let domain = AxisSet::new(
//!     vec![
//!         Basis::real_fourier("x", 8, (0.0, 1.0))?.into(),
//!         Basis::chebyshev("z", 8, (-1.0, 1.0))?.into(),
//!     ],
//!     GridDtype::Real,
//! )?;
//! let dist = Distributor::serial(domain)?;
//! assert_eq!(dist.path_length(), 3);
//!
//! let mut u = DistributedArray::zeros(&dist, 0)?;
//! dist.to_grid(&mut u, &NoComm)?;
//! assert_eq!(u.layout(), dist.grid_layout().index());
//! # Ok::<(), SpectralError>(())
//! ```

pub mod layout;
pub mod mesh;
pub mod path;

pub use layout::Layout;
pub use mesh::{ProcessContext, ProcessMesh};
pub use path::Transition;

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::transpose::{TransposePlan, transpose};
use crate::data::distributed_array::DistributedArray;
use crate::debug_invariants::DebugInvariants;
use crate::domain::AxisSet;
use crate::spectral_error::SpectralError;
use ndarray::Array1;
use std::sync::atomic::{AtomicU64, Ordering};

/// Base tag of transpose messages; edge `i` uses `base + i`.
const TRANSPOSE_TAG: CommTag = CommTag::new(0x5400);

static NEXT_CHAIN: AtomicU64 = AtomicU64::new(1);

fn next_chain_id() -> u64 {
    NEXT_CHAIN.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Debug)]
pub struct Distributor {
    domain: AxisSet,
    context: ProcessContext,
    mesh: ProcessMesh,
    layouts: Vec<Layout>,
    transitions: Vec<Transition>,
    chain: u64,
}

impl Distributor {
    /// Build the layout chain for `domain` on `mesh_shape` (default: one
    /// dimension spanning every process).
    ///
    /// # Errors
    /// `MeshSizeMismatch` if the mesh does not cover `context.size()`
    /// processes, `MeshTooDeep` if it needs more than `N-1` dimensions.
    pub fn new(
        domain: AxisSet,
        mesh_shape: Option<Vec<usize>>,
        context: ProcessContext,
    ) -> Result<Self, SpectralError> {
        let mesh = Self::build_mesh(&domain, mesh_shape, &context)?;
        let path = path::build_path(domain.axis_count(), &mesh)?;
        let dist = Self {
            domain,
            context,
            mesh,
            layouts: path.layouts,
            transitions: path.transitions,
            chain: next_chain_id(),
        };
        crate::debug_invariants!(dist.validate_invariants(), "Distributor::new");
        Ok(dist)
    }

    /// Single-process distributor.
    pub fn serial(domain: AxisSet) -> Result<Self, SpectralError> {
        Self::new(domain, None, ProcessContext::serial())
    }

    fn build_mesh(
        domain: &AxisSet,
        mesh_shape: Option<Vec<usize>>,
        context: &ProcessContext,
    ) -> Result<ProcessMesh, SpectralError> {
        let mesh = match mesh_shape {
            Some(shape) => ProcessMesh::new(shape, context)?,
            None => ProcessMesh::spanning(context),
        };
        mesh.padded(domain.axis_count() - 1)
    }

    /// Replace the process mesh and rebuild the whole chain.
    ///
    /// Either everything is replaced or, on error, nothing is. On success the
    /// chain gets a fresh id, so arrays built against the old chain are
    /// rejected with `StaleLayoutChain`.
    pub fn reconfigure(&mut self, mesh_shape: Vec<usize>) -> Result<(), SpectralError> {
        let mesh = Self::build_mesh(&self.domain, Some(mesh_shape), &self.context)?;
        let path = path::build_path(self.domain.axis_count(), &mesh)?;
        log::debug!(
            "reconfigured distributor: mesh {:?} -> {:?}",
            self.mesh.shape(),
            mesh.shape()
        );
        self.mesh = mesh;
        self.layouts = path.layouts;
        self.transitions = path.transitions;
        self.chain = next_chain_id();
        crate::debug_invariants!(self.validate_invariants(), "Distributor::reconfigure");
        Ok(())
    }

    /// Id of the current layout chain; clones share it.
    pub fn chain_id(&self) -> u64 {
        self.chain
    }

    pub fn domain(&self) -> &AxisSet {
        &self.domain
    }

    pub fn context(&self) -> ProcessContext {
        self.context
    }

    /// The mesh padded to `N-1` dimensions.
    pub fn mesh(&self) -> &ProcessMesh {
        &self.mesh
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn layout(&self, index: usize) -> Result<&Layout, SpectralError> {
        self.layouts.get(index).ok_or(SpectralError::LayoutOutOfRange {
            index,
            len: self.layouts.len(),
        })
    }

    /// `transitions()[i]` joins layouts `i` and `i + 1`.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Layout 0: all axes in coefficient space.
    pub fn coeff_layout(&self) -> &Layout {
        &self.layouts[0]
    }

    /// Layout `L-1`: all axes in grid space.
    pub fn grid_layout(&self) -> &Layout {
        &self.layouts[self.layouts.len() - 1]
    }

    pub fn path_length(&self) -> usize {
        self.layouts.len()
    }

    pub fn transpose_count(&self) -> usize {
        self.transitions.iter().filter(|t| t.is_transpose()).count()
    }

    /// Global shape at layout `index`.
    pub fn global_shape(&self, index: usize, scales: &[f64]) -> Result<Vec<usize>, SpectralError> {
        self.domain
            .global_shape(self.layout(index)?.grid_space(), scales)
    }

    /// This process' shape at layout `index`.
    pub fn local_shape(&self, index: usize, scales: &[f64]) -> Result<Vec<usize>, SpectralError> {
        let global = self.global_shape(index, scales)?;
        Ok(self.layouts[index].local_shape(&global))
    }

    /// This process' grid points along `axis` in the grid-space layout.
    pub fn local_grid(&self, axis: usize, scale: f64) -> Result<Array1<f64>, SpectralError> {
        self.domain.build_grid(axis, scale, self.grid_layout())
    }

    /// [`local_grid`](Self::local_grid) for every axis.
    pub fn local_grids(&self, scales: &[f64]) -> Result<Vec<Array1<f64>>, SpectralError> {
        self.domain.check_scales(scales)?;
        scales
            .iter()
            .enumerate()
            .map(|(axis, &s)| self.local_grid(axis, s))
            .collect()
    }

    /// Move `array` one edge to the neighbouring layout `target`.
    ///
    /// Collective when the edge is a transpose: every process of the mesh
    /// group must make the same call.
    ///
    /// # Errors
    /// `StaleLayoutChain`, `LayoutOutOfRange`, `NonAdjacentLayouts`, or
    /// whatever the transform or exchange reports. On error `array` is left unchanged.
    pub fn apply_transition<C: Communicator>(
        &self,
        array: &mut DistributedArray,
        target: usize,
        comm: &C,
    ) -> Result<(), SpectralError> {
        if array.chain_id() != self.chain {
            return Err(SpectralError::StaleLayoutChain {
                array: array.chain_id(),
                current: self.chain,
            });
        }
        let from = array.layout();
        self.layout(target)?;
        self.layout(from)?;
        if from.abs_diff(target) != 1 {
            return Err(SpectralError::NonAdjacentLayouts { from, to: target });
        }
        if comm.size() != self.mesh.size() || comm.rank() != self.context.rank() {
            return Err(SpectralError::CommError {
                neighbor: comm.rank(),
                reason: format!(
                    "communicator is rank {} of {}, distributor expects rank {} of {}",
                    comm.rank(),
                    comm.size(),
                    self.context.rank(),
                    self.mesh.size()
                ),
            });
        }
        let forward = target > from;
        let edge = from.min(target);
        let scales = array.scales().to_vec();
        let expected = self.local_shape(from, &scales)?;
        if array.data().shape() != expected.as_slice() {
            return Err(SpectralError::ShapeMismatch {
                expected,
                got: array.data().shape().to_vec(),
            });
        }

        log::trace!(
            "rank {}: layout {from} -> {target} via {:?}",
            self.context.rank(),
            self.transitions[edge]
        );
        let data = match self.transitions[edge] {
            Transition::Transform { axis } => {
                let basis = self.domain.axis(axis)?;
                if forward {
                    basis.transform_forward(array.data(), axis, scales[axis])?
                } else {
                    basis.transform_backward(array.data(), axis, scales[axis])?
                }
            }
            Transition::Transpose {
                gather,
                scatter,
                mesh_dim,
            } => {
                let global = self.global_shape(edge, &scales)?;
                let plan = TransposePlan {
                    gather_axis: gather,
                    scatter_axis: scatter,
                    gather_extent: global[gather],
                    scatter_extent: global[scatter],
                    group: self.mesh.group(mesh_dim),
                    position: self.mesh.coords()[mesh_dim],
                };
                let plan = if forward { plan } else { plan.inverse() };
                transpose(array.data(), &plan, comm, TRANSPOSE_TAG.offset(edge as u16))?
            }
        };
        array.replace(data, target);
        Ok(())
    }

    /// Walk `array` edge by edge to layout `target`.
    pub fn change_layout<C: Communicator>(
        &self,
        array: &mut DistributedArray,
        target: usize,
        comm: &C,
    ) -> Result<(), SpectralError> {
        if array.chain_id() != self.chain {
            return Err(SpectralError::StaleLayoutChain {
                array: array.chain_id(),
                current: self.chain,
            });
        }
        self.layout(target)?;
        while array.layout() != target {
            let next = if array.layout() < target {
                array.layout() + 1
            } else {
                array.layout() - 1
            };
            self.apply_transition(array, next, comm)?;
        }
        Ok(())
    }

    /// Walk to the grid-space layout.
    pub fn to_grid<C: Communicator>(
        &self,
        array: &mut DistributedArray,
        comm: &C,
    ) -> Result<(), SpectralError> {
        self.change_layout(array, self.path_length() - 1, comm)
    }

    /// Walk to the coefficient-space layout.
    pub fn to_coeff<C: Communicator>(
        &self,
        array: &mut DistributedArray,
        comm: &C,
    ) -> Result<(), SpectralError> {
        self.change_layout(array, 0, comm)
    }
}

impl DebugInvariants for Distributor {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Distributor");
    }

    fn validate_invariants(&self) -> Result<(), SpectralError> {
        let n = self.domain.axis_count();
        let expected = path::expected_length(n, self.mesh.shape());
        if self.layouts.len() != expected {
            return Err(SpectralError::InvariantViolation(format!(
                "path has {} layouts, expected {expected}",
                self.layouts.len()
            )));
        }
        let first = &self.layouts[0];
        let last = self.grid_layout();
        if first.grid_space().iter().any(|&g| g) || last.grid_space().iter().any(|&g| !g) {
            return Err(SpectralError::InvariantViolation(
                "path must run from all-coefficient to all-grid".into(),
            ));
        }
        if !first.is_local(n - 1) || !last.is_local(0) {
            return Err(SpectralError::InvariantViolation(
                "last axis must start local and axis 0 must end local".into(),
            ));
        }
        path::Path {
            layouts: self.layouts.clone(),
            transitions: self.transitions.clone(),
        }
        .validate_invariants()
    }
}

static_assertions::assert_impl_all!(Distributor: Send, Sync, Clone);
