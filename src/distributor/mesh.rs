//! Process topology: rank context and the row-major process mesh.

use crate::algs::communicator::Communicator;
use crate::spectral_error::SpectralError;

/// Rank and world size of the calling process.
///
/// Passed explicitly into the distributor so several simulated processes can
/// live in one test binary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProcessContext {
    rank: usize,
    size: usize,
}

impl ProcessContext {
    pub fn new(rank: usize, size: usize) -> Result<Self, SpectralError> {
        if size == 0 || rank >= size {
            return Err(SpectralError::InvalidConfig(format!(
                "rank {rank} is not valid in a world of {size} processes"
            )));
        }
        Ok(Self { rank, size })
    }

    /// A world of one.
    pub fn serial() -> Self {
        Self { rank: 0, size: 1 }
    }

    pub fn from_comm<C: Communicator>(comm: &C) -> Self {
        Self {
            rank: comm.rank(),
            size: comm.size(),
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Cartesian arrangement of processes with row-major rank numbering:
/// `coords[i] = (rank / Π_{j>i} shape[j]) mod shape[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessMesh {
    shape: Vec<usize>,
    rank: usize,
    coords: Vec<usize>,
}

impl ProcessMesh {
    /// Build the mesh and place `ctx.rank()` in it.
    ///
    /// # Errors
    /// `MeshSizeMismatch` if `Π shape != ctx.size()` (a zero entry or an
    /// overflowing product never matches).
    pub fn new(shape: Vec<usize>, ctx: &ProcessContext) -> Result<Self, SpectralError> {
        let product = shape
            .iter()
            .try_fold(1usize, |acc, &m| acc.checked_mul(m))
            .unwrap_or(usize::MAX);
        if product != ctx.size() {
            return Err(SpectralError::MeshSizeMismatch {
                mesh: shape,
                product,
                processes: ctx.size(),
            });
        }
        let coords = row_major_coords(&shape, ctx.rank());
        Ok(Self {
            shape,
            rank: ctx.rank(),
            coords,
        })
    }

    /// One-dimensional mesh over every process.
    pub fn spanning(ctx: &ProcessContext) -> Self {
        Self {
            shape: vec![ctx.size()],
            rank: ctx.rank(),
            coords: vec![ctx.rank()],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of processes (`Π shape`).
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// This process' coordinates.
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    pub fn coords_of(&self, rank: usize) -> Vec<usize> {
        row_major_coords(&self.shape, rank)
    }

    /// Inverse of [`coords_of`](Self::coords_of).
    pub fn rank_of(&self, coords: &[usize]) -> usize {
        coords
            .iter()
            .zip(&self.shape)
            .fold(0, |acc, (&c, &m)| acc * m + c)
    }

    /// Ranks sharing this process' coordinates in every dim except `dim`,
    /// ordered by their coordinate along `dim`.
    pub fn group(&self, dim: usize) -> Vec<usize> {
        let mut coords = self.coords.clone();
        (0..self.shape[dim])
            .map(|c| {
                coords[dim] = c;
                self.rank_of(&coords)
            })
            .collect()
    }

    /// The same mesh with exactly `dims` dimensions.
    ///
    /// Missing trailing dims are filled with 1; surplus trailing dims must
    /// already be 1. Neither changes the rank numbering.
    ///
    /// # Errors
    /// `MeshTooDeep` if a surplus dim is larger than 1.
    pub fn padded(&self, dims: usize) -> Result<Self, SpectralError> {
        let needed = self
            .shape
            .iter()
            .rposition(|&m| m > 1)
            .map_or(0, |i| i + 1);
        if needed > dims {
            return Err(SpectralError::MeshTooDeep {
                mesh: self.shape.clone(),
                mesh_dims: needed,
                max: dims,
            });
        }
        let mut shape = self.shape.clone();
        let mut coords = self.coords.clone();
        shape.resize(dims, 1);
        coords.resize(dims, 0);
        Ok(Self {
            shape,
            rank: self.rank,
            coords,
        })
    }
}

fn row_major_coords(shape: &[usize], rank: usize) -> Vec<usize> {
    let mut coords = vec![0; shape.len()];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        coords[i] = (rank / stride) % shape[i];
        stride *= shape[i];
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(rank: usize, size: usize) -> ProcessContext {
        ProcessContext::new(rank, size).unwrap()
    }

    #[test]
    fn row_major_assignment() {
        let m = ProcessMesh::new(vec![4, 2], &ctx(5, 8)).unwrap();
        assert_eq!(m.coords(), &[2, 1]);
        for r in 0..8 {
            assert_eq!(m.rank_of(&m.coords_of(r)), r);
        }
        assert_eq!(m.coords_of(7), vec![3, 1]);
    }

    #[test]
    fn size_mismatch_is_reported() {
        assert_eq!(
            ProcessMesh::new(vec![4, 2], &ctx(0, 6)).unwrap_err(),
            SpectralError::MeshSizeMismatch {
                mesh: vec![4, 2],
                product: 8,
                processes: 6
            }
        );
        assert!(ProcessMesh::new(vec![0, 2], &ctx(0, 2)).is_err());
        assert!(ProcessMesh::new(vec![usize::MAX, 2], &ctx(0, 2)).is_err());
    }

    #[test]
    fn groups_vary_one_dim() {
        let m = ProcessMesh::new(vec![4, 2], &ctx(5, 8)).unwrap();
        // rank 5 = (2, 1)
        assert_eq!(m.group(0), vec![1, 3, 5, 7]);
        assert_eq!(m.group(1), vec![4, 5]);
    }

    #[test]
    fn padding_keeps_numbering() {
        let m = ProcessMesh::new(vec![3], &ctx(2, 3)).unwrap();
        let p = m.padded(3).unwrap();
        assert_eq!(p.shape(), &[3, 1, 1]);
        assert_eq!(p.coords(), &[2, 0, 0]);
        assert_eq!(p.rank_of(p.coords()), 2);

        let ones = ProcessMesh::new(vec![1, 1], &ctx(0, 1)).unwrap();
        assert_eq!(ones.padded(0).unwrap().shape(), &[] as &[usize]);
        assert_eq!(
            m.padded(0).unwrap_err(),
            SpectralError::MeshTooDeep {
                mesh: vec![3],
                mesh_dims: 1,
                max: 0
            }
        );
    }

    #[test]
    fn bad_context_rejected() {
        assert!(ProcessContext::new(3, 3).is_err());
        assert!(ProcessContext::new(0, 0).is_err());
        assert_eq!(ProcessMesh::spanning(&ctx(1, 4)).coords(), &[1]);
    }
}
