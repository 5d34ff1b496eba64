//! Communication and data-movement primitives.

pub mod communicator;
pub mod transform;
pub mod transpose;
pub mod wire;

pub use communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};
pub use transform::apply_along_axis;
pub use transpose::{TransposePlan, transpose};
