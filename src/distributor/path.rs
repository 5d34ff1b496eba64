//! Deterministic layout chain from coefficient space to grid space.
//!
//! Every process runs [`build_path`] on the same inputs and gets the same
//! chain, so no negotiation is needed before data moves.
//!
//! ## Algorithm
//! Layout 0 has every axis in coefficient space; the last axis is local and
//! axis `a < N-1` is split over mesh dimension `N-2-a`. Then for each axis
//! from `N-1` down to `0`:
//!
//! 1. If the axis is not the currently local one, hand its mesh dimension
//!    to the currently local axis. When that dimension has more than one
//!    process this is a [`Transition::Transpose`]; otherwise it is a pure
//!    relabel and no layout is emitted.
//! 2. Emit a [`Transition::Transform`] flipping the axis into grid space.
//!
//! The chain therefore has `(N + 1) + #{a < N-1 : mesh[N-2-a] > 1}` layouts.

use crate::distributor::layout::Layout;
use crate::distributor::mesh::ProcessMesh;
use crate::spectral_error::SpectralError;

/// Edge between layout `i` and `i + 1`, described in the coefficient → grid
/// direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Forward basis transform along `axis` (backward when walked in
    /// reverse).
    Transform { axis: usize },
    /// `gather` becomes whole on every process while `scatter` is split over
    /// `mesh_dim` (the roles swap when walked in reverse).
    Transpose {
        gather: usize,
        scatter: usize,
        mesh_dim: usize,
    },
}

impl Transition {
    pub fn is_transpose(&self) -> bool {
        matches!(self, Transition::Transpose { .. })
    }
}

/// Layouts and the transitions joining them (`transitions.len() ==
/// layouts.len() - 1`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub layouts: Vec<Layout>,
    pub transitions: Vec<Transition>,
}

/// Build the chain for an `ndim`-axis domain.
///
/// `mesh` must already have exactly `ndim - 1` dimensions (see
/// [`ProcessMesh::padded`]).
pub fn build_path(ndim: usize, mesh: &ProcessMesh) -> Result<Path, SpectralError> {
    if ndim == 0 {
        return Err(SpectralError::EmptyAxisSet);
    }
    if mesh.ndim() != ndim - 1 {
        return Err(SpectralError::MeshTooDeep {
            mesh: mesh.shape().to_vec(),
            mesh_dims: mesh.ndim(),
            max: ndim - 1,
        });
    }

    let mut grid = vec![false; ndim];
    let mut dist: Vec<Option<usize>> = (0..ndim)
        .map(|axis| (axis + 1 < ndim).then(|| ndim - 2 - axis))
        .collect();
    let mut local_axis = ndim - 1;

    let mut layouts = vec![Layout::new(0, grid.clone(), dist.clone(), mesh)];
    let mut transitions = Vec::with_capacity(2 * ndim);

    for axis in (0..ndim).rev() {
        if axis != local_axis {
            let mesh_dim = dist[axis].ok_or_else(|| {
                SpectralError::InvariantViolation(format!(
                    "axis {axis} has no mesh dimension before its transform"
                ))
            })?;
            dist[local_axis] = Some(mesh_dim);
            dist[axis] = None;
            if mesh.shape()[mesh_dim] > 1 {
                transitions.push(Transition::Transpose {
                    gather: axis,
                    scatter: local_axis,
                    mesh_dim,
                });
                layouts.push(Layout::new(layouts.len(), grid.clone(), dist.clone(), mesh));
            }
            local_axis = axis;
        }
        grid[axis] = true;
        transitions.push(Transition::Transform { axis });
        layouts.push(Layout::new(layouts.len(), grid.clone(), dist.clone(), mesh));
    }

    log::debug!(
        "built transform path: {} layouts, {} transposes, mesh {:?}",
        layouts.len(),
        transitions.iter().filter(|t| t.is_transpose()).count(),
        mesh.shape()
    );
    Ok(Path {
        layouts,
        transitions,
    })
}

/// Expected path length for `ndim` axes on `mesh` (already padded).
pub fn expected_length(ndim: usize, mesh: &[usize]) -> usize {
    (ndim + 1) + mesh.iter().filter(|&&m| m > 1).count()
}

/// Check that each edge changes exactly what it claims to.
pub fn validate_path(path: &Path) -> Result<(), SpectralError> {
    let Path {
        layouts,
        transitions,
    } = path;
    if layouts.len() != transitions.len() + 1 {
        return Err(SpectralError::InvariantViolation(format!(
            "{} layouts joined by {} transitions",
            layouts.len(),
            transitions.len()
        )));
    }
    for (i, (pair, t)) in layouts.windows(2).zip(transitions).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        if a.index() != i || b.index() != i + 1 {
            return Err(SpectralError::InvariantViolation(format!(
                "layout indices {} -> {} at edge {i}",
                a.index(),
                b.index()
            )));
        }
        let (la, lb) = (a.local(), b.local());
        let ok = match *t {
            Transition::Transform { axis } => {
                la == lb
                    && la[axis]
                    && !a.grid_space()[axis]
                    && b.grid_space()[axis]
                    && (0..a.ndim())
                        .all(|k| k == axis || a.grid_space()[k] == b.grid_space()[k])
            }
            Transition::Transpose {
                gather, scatter, ..
            } => {
                a.grid_space() == b.grid_space()
                    && !la[gather]
                    && la[scatter]
                    && lb[gather]
                    && !lb[scatter]
                    && (0..a.ndim())
                        .all(|k| k == gather || k == scatter || la[k] == lb[k])
            }
        };
        if !ok {
            return Err(SpectralError::InvariantViolation(format!(
                "edge {i} ({t:?}) does not match {a} -> {b}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributor::mesh::ProcessContext;

    fn mesh(shape: &[usize], rank: usize) -> ProcessMesh {
        let size = shape.iter().product();
        ProcessMesh::new(shape.to_vec(), &ProcessContext::new(rank, size).unwrap()).unwrap()
    }

    #[test]
    fn serial_three_axes() {
        let p = build_path(3, &mesh(&[1, 1], 0)).unwrap();
        assert_eq!(p.layouts.len(), 4);
        assert!(p.layouts.iter().all(|l| l.local() == vec![true; 3]));
        assert!(p.transitions.iter().all(|t| !t.is_transpose()));
        validate_path(&p).unwrap();
    }

    #[test]
    fn four_by_two_mesh() {
        let p = build_path(3, &mesh(&[4, 2], 3)).unwrap();
        assert_eq!(p.layouts.len(), 6);
        assert_eq!(p.layouts[0].local(), vec![false, false, true]);
        assert_eq!(p.layouts[5].local(), vec![true, false, false]);
        assert_eq!(p.layouts[5].grid_space(), &[true, true, true]);
        assert_eq!(
            p.transitions,
            vec![
                Transition::Transform { axis: 2 },
                Transition::Transpose {
                    gather: 1,
                    scatter: 2,
                    mesh_dim: 0
                },
                Transition::Transform { axis: 1 },
                Transition::Transpose {
                    gather: 0,
                    scatter: 1,
                    mesh_dim: 1
                },
                Transition::Transform { axis: 0 },
            ]
        );
        validate_path(&p).unwrap();
    }

    #[test]
    fn unit_dim_is_relabelled_not_transposed() {
        let p = build_path(3, &mesh(&[1, 2], 1)).unwrap();
        assert_eq!(p.layouts.len(), 5);
        assert_eq!(
            p.transitions[2],
            Transition::Transpose {
                gather: 0,
                scatter: 1,
                mesh_dim: 1
            }
        );
        // terminal mirrors layout 0: axis 2 on dim 0, axis 1 on dim 1
        assert_eq!(p.layouts[4].distribution(), &[None, Some(1), Some(0)]);
        validate_path(&p).unwrap();
    }

    #[test]
    fn one_axis_is_a_single_transform() {
        let p = build_path(1, &mesh(&[], 0)).unwrap();
        assert_eq!(p.layouts.len(), 2);
        assert_eq!(p.transitions, vec![Transition::Transform { axis: 0 }]);
    }

    #[test]
    fn corrupted_path_is_rejected() {
        let mut p = build_path(2, &mesh(&[2], 0)).unwrap();
        p.transitions.swap(0, 1);
        assert!(matches!(
            validate_path(&p),
            Err(SpectralError::InvariantViolation(_))
        ));
    }
}
