//! Data module: process-local field storage
#![warn(missing_docs)]

pub mod distributed_array;

pub use distributed_array::DistributedArray;
