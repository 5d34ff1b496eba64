//! Fixed, versioned, little-endian wire records for transpose payloads.
//!
//! A message is one [`WireHdr`] followed by `count` [`WireComplex`] records.
//! Receivers check the version, kind and exact byte length before trusting
//! the payload.

use crate::spectral_error::SpectralError;
use bytemuck::{Pod, Zeroable};
use num_complex::Complex64;
use std::mem::{align_of, size_of};

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Message kinds.
pub const KIND_TRANSPOSE_BLOCK: u16 = 1;

/// All multi-byte integers in these structs are **little-endian** on the wire.
/// We store them pre-LE with `.to_le()` and decode with `.from_le()`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16, // = WIRE_VERSION.to_le()
    pub kind_le: u16,
    pub reserved_le: u32, // keep zero
    pub count_le: u64,    // number of following records
}

impl WireHdr {
    pub fn new(kind: u16, count: usize) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            reserved_le: 0,
            count_le: (count as u64).to_le(),
        }
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
    pub fn count(&self) -> usize {
        u64::from_le(self.count_le) as usize
    }
}

/// One complex value as two little-endian IEEE-754 doubles.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireComplex {
    pub re_le: u64,
    pub im_le: u64,
}

impl WireComplex {
    pub fn of(v: Complex64) -> Self {
        Self {
            re_le: v.re.to_bits().to_le(),
            im_le: v.im.to_bits().to_le(),
        }
    }
    pub fn get(&self) -> Complex64 {
        Complex64::new(
            f64::from_bits(u64::from_le(self.re_le)),
            f64::from_bits(u64::from_le(self.im_le)),
        )
    }
}

/// Bytes needed for a block of `count` values.
#[inline]
pub fn block_len(count: usize) -> usize {
    size_of::<WireHdr>() + count * size_of::<WireComplex>()
}

/// Frame `values` as one transpose block.
pub fn encode_block<I>(values: I, count: usize) -> Vec<u8>
where
    I: IntoIterator<Item = Complex64>,
{
    let mut out = Vec::with_capacity(block_len(count));
    out.extend_from_slice(bytemuck::bytes_of(&WireHdr::new(KIND_TRANSPOSE_BLOCK, count)));
    for v in values {
        out.extend_from_slice(bytemuck::bytes_of(&WireComplex::of(v)));
    }
    debug_assert_eq!(out.len(), block_len(count));
    out
}

/// Validate and unpack a block received from `neighbor`; it must carry
/// exactly `expected` values.
pub fn decode_block(
    bytes: &[u8],
    expected: usize,
    neighbor: usize,
) -> Result<Vec<Complex64>, SpectralError> {
    let want = block_len(expected);
    if bytes.len() != want {
        return Err(SpectralError::BufferSizeMismatch {
            neighbor,
            expected: want,
            got: bytes.len(),
        });
    }
    let (head, body) = bytes.split_at(size_of::<WireHdr>());
    let hdr: WireHdr = bytemuck::pod_read_unaligned(head);
    if hdr.version() != WIRE_VERSION {
        return Err(SpectralError::CommError {
            neighbor,
            reason: format!(
                "wire version {} does not match local version {WIRE_VERSION}",
                hdr.version()
            ),
        });
    }
    if hdr.kind() != KIND_TRANSPOSE_BLOCK || hdr.count() != expected {
        return Err(SpectralError::CommError {
            neighbor,
            reason: format!(
                "unexpected block header: kind {} with {} values, wanted kind {KIND_TRANSPOSE_BLOCK} with {expected}",
                hdr.kind(),
                hdr.count()
            ),
        });
    }
    let records: Vec<WireComplex> = bytemuck::pod_collect_to_vec(body);
    Ok(records.iter().map(WireComplex::get).collect())
}

// ===== Compile-time sanity checks =========================================

const _: () = {
    // Pod/Zeroable ensures no padding contains uninit when cast to bytes.
    assert!(size_of::<WireHdr>() == 16);
    assert!(size_of::<WireComplex>() == 16);
    assert!(align_of::<WireHdr>() == 8);
};
