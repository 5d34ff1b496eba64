//! SpectralError: Unified error type for spectral-sieve public APIs
//!
//! Every fallible operation in the crate (basis construction, mesh
//! validation, path construction, layout changes and the transpose exchange)
//! reports through this enum. Variants name the violated invariant and carry
//! the offending values so the message is precise enough to act on.

use thiserror::Error;

/// Unified error type for spectral-sieve operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpectralError {
    /// A basis was constructed with invalid parameters.
    #[error("invalid basis `{basis}`: {reason}")]
    InvalidBasisConfig { basis: String, reason: String },
    /// Adjacent composite segments do not share an endpoint.
    #[error(
        "composite basis `{basis}`: segment {interface} ends at {left_end} but segment {} starts at {right_start}",
        .interface + 1
    )]
    InvalidSegmentAdjacency {
        basis: String,
        interface: usize,
        left_end: f64,
        right_start: f64,
    },
    /// Composite segments must all be separable or all non-separable.
    #[error("composite basis `{basis}`: segment {segment} is {found}, expected {expected}")]
    MixedSegmentCapability {
        basis: String,
        segment: usize,
        expected: &'static str,
        found: &'static str,
    },
    /// The product of the mesh shape differs from the number of processes.
    #[error("process mesh {mesh:?} spans {product} processes but {processes} are running")]
    MeshSizeMismatch {
        mesh: Vec<usize>,
        product: usize,
        processes: usize,
    },
    /// The mesh distributes more axes than the domain can spare.
    #[error("process mesh {mesh:?} needs {mesh_dims} dims but only {max} axes may be distributed")]
    MeshTooDeep {
        mesh: Vec<usize>,
        mesh_dims: usize,
        max: usize,
    },
    /// A domain needs at least one axis.
    #[error("axis set must contain at least one axis")]
    EmptyAxisSet,
    /// Axis index outside `[0, axes)`.
    #[error("axis {axis} out of range for {axes}-dimensional domain")]
    OutOfRange { axis: usize, axes: usize },
    /// Layout index outside the path.
    #[error("layout {index} out of range for path of length {len}")]
    LayoutOutOfRange { index: usize, len: usize },
    /// Transitions may only step between neighbouring layouts.
    #[error("layouts {from} and {to} are not adjacent on the transform path")]
    NonAdjacentLayouts { from: usize, to: usize },
    /// A local data block does not have the shape its layout requires.
    #[error("shape mismatch: layout expects {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    /// The array was built against a different layout chain.
    #[error("array belongs to layout chain {array}, distributor is on chain {current}")]
    StaleLayoutChain { array: u64, current: u64 },
    /// Scale factors must be finite and at least one.
    #[error("basis `{basis}`: scale {scale} must be finite and >= 1")]
    InvalidScale { basis: String, scale: f64 },
    /// A scale vector has the wrong number of entries.
    #[error("expected {expected} scale factors, got {got}")]
    ScaleCountMismatch { expected: usize, got: usize },
    /// Basis requires a different grid dtype than the domain declares.
    #[error("axis {axis} (`{basis}`) requires {required} grid data")]
    DtypeMismatch {
        axis: usize,
        basis: String,
        required: &'static str,
    },
    /// Failure in the communication substrate while talking to `neighbor`.
    #[error("communication error with rank {neighbor}: {reason}")]
    CommError { neighbor: usize, reason: String },
    /// A received message has the wrong payload size.
    #[error("buffer size mismatch from rank {neighbor}: expected {expected} bytes, got {got}")]
    BufferSizeMismatch {
        neighbor: usize,
        expected: usize,
        got: usize,
    },
    /// A configuration document could not be turned into a domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An internal structural invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
