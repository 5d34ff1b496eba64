#![cfg_attr(docsrs, feature(doc_cfg))]
//! # spectral-sieve
//!
//! spectral-sieve is the distributed basis-transform and data-redistribution
//! engine of a spectral PDE code. It takes an N-dimensional field, alternately
//! applies local one-dimensional spectral transforms and global transposes
//! across a process mesh, and moves the field between coefficient space and
//! grid space along a fixed, minimal-communication path that every process
//! computes independently.
//!
//! ## Features
//! - Closed set of bases (complex and real Fourier, Chebyshev, Legendre) and
//!   multi-segment composite axes with exported continuity rows
//! - Tensor-product domains with per-axis dealias padding
//! - Row-major process meshes and a deterministic layout chain
//! - Pluggable communication backends (serial, in-process threads, MPI) for
//!   the transpose exchange
//!
//! ## Determinism
//!
//! Path construction depends only on the axis count and the mesh shape, so
//! every rank derives the same chain without communicating. Block splits use
//! [`block_partition`](distributor::layout::block_partition) everywhere.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! spectral-sieve = "0.3"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```

pub mod algs;
pub mod basis;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod distributor;
pub mod domain;
pub mod spectral_error;

pub use debug_invariants::DebugInvariants;
pub use spectral_error::SpectralError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, LocalComm, NoComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::basis::{Basis, Capability, CompositeBasis, ContinuityRow, grid_size};
    pub use crate::config::{AxisConfig, BasisConfig, DomainConfig};
    pub use crate::data::distributed_array::DistributedArray;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::distributor::{Distributor, Layout, ProcessContext, ProcessMesh, Transition};
    pub use crate::domain::{AxisBasis, AxisSet, GridDtype};
    pub use crate::spectral_error::SpectralError;
}
