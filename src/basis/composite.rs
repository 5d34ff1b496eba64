//! Composite bases: several contiguous segments acting as one axis.
//!
//! Coefficients and grid values are stored segment after segment in
//! interval order. Transforms are block-diagonal, one block per segment.
//! Continuity across interfaces is *not* imposed here; instead
//! [`CompositeBasis::continuity_rows`] exports the endpoint evaluation rows
//! a linear solver needs to impose it.

use super::kernel::{KernelBlock, LaneKernel};
use super::{Basis, Capability, grid_size};
use crate::spectral_error::SpectralError;
use ndarray::Array1;
use num_complex::Complex64;
use std::ops::Range;

/// Relative tolerance used when comparing segment endpoints.
const ADJACENCY_RTOL: f64 = 1e-12;

/// Coefficient and grid ranges owned by one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentSpan {
    pub coeffs: Range<usize>,
    pub grid: Range<usize>,
}

/// Match rows for one segment interface.
///
/// Continuity of the represented function at `position` reads
/// `left · c[left_offset..] == right · c[right_offset..]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuityRow {
    pub interface: usize,
    pub position: f64,
    pub left_offset: usize,
    pub left: Vec<Complex64>,
    pub right_offset: usize,
    pub right: Vec<Complex64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompositeBasis {
    name: String,
    segments: Vec<Basis>,
}

impl CompositeBasis {
    /// Glue `segments` (in interval order) into one axis.
    ///
    /// # Errors
    /// - `InvalidBasisConfig` for fewer than two segments or segments with
    ///   different dealias scales,
    /// - `MixedSegmentCapability` if separable and non-separable segments
    ///   are mixed,
    /// - `InvalidSegmentAdjacency` if `segment[i].right != segment[i+1].left`.
    pub fn new(name: impl Into<String>, segments: Vec<Basis>) -> Result<Self, SpectralError> {
        let name = name.into();
        if segments.len() < 2 {
            return Err(SpectralError::InvalidBasisConfig {
                basis: name,
                reason: format!("composite needs at least 2 segments, got {}", segments.len()),
            });
        }
        let expected = segments[0].capability();
        let dealias = segments[0].dealias();
        for (i, seg) in segments.iter().enumerate().skip(1) {
            if seg.capability() != expected {
                return Err(SpectralError::MixedSegmentCapability {
                    basis: name,
                    segment: i,
                    expected: expected.as_str(),
                    found: seg.capability().as_str(),
                });
            }
            if seg.dealias() != dealias {
                return Err(SpectralError::InvalidBasisConfig {
                    basis: name,
                    reason: format!(
                        "segment {i} dealias {} differs from segment 0 dealias {dealias}",
                        seg.dealias()
                    ),
                });
            }
        }
        for (i, pair) in segments.windows(2).enumerate() {
            let left_end = pair[0].bounds().1;
            let right_start = pair[1].bounds().0;
            let tol = ADJACENCY_RTOL * left_end.abs().max(right_start.abs()).max(1.0);
            if (left_end - right_start).abs() > tol {
                return Err(SpectralError::InvalidSegmentAdjacency {
                    basis: name,
                    interface: i,
                    left_end,
                    right_start,
                });
            }
        }
        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Basis] {
        &self.segments
    }

    pub fn capability(&self) -> Capability {
        self.segments[0].capability()
    }

    pub fn dealias(&self) -> f64 {
        self.segments[0].dealias()
    }

    /// Total coefficient count across segments.
    pub fn size(&self) -> usize {
        self.segments.iter().map(Basis::size).sum()
    }

    /// `[first.left, last.right)`.
    pub fn bounds(&self) -> (f64, f64) {
        let first = self.segments[0].bounds().0;
        let last = self.segments[self.segments.len() - 1].bounds().1;
        (first, last)
    }

    /// Sum of per-segment grid sizes (each rounded on its own).
    pub fn grid_size(&self, scale: f64) -> usize {
        self.segments.iter().map(|s| grid_size(scale, s.size())).sum()
    }

    pub fn check_scale(&self, scale: f64) -> Result<(), SpectralError> {
        if scale.is_finite() && scale >= 1.0 {
            Ok(())
        } else {
            Err(SpectralError::InvalidScale {
                basis: self.name.clone(),
                scale,
            })
        }
    }

    pub fn requires_complex(&self) -> bool {
        self.segments.iter().any(Basis::requires_complex)
    }

    /// Concatenated segment grids at `scale`.
    pub fn grid(&self, scale: f64) -> Result<Array1<f64>, SpectralError> {
        self.check_scale(scale)?;
        let mut points = Vec::with_capacity(self.grid_size(scale));
        for seg in &self.segments {
            points.extend(seg.grid(scale)?.iter().copied());
        }
        Ok(Array1::from(points))
    }

    /// Coefficient and grid ranges of every segment at `scale`.
    pub fn segment_spans(&self, scale: f64) -> Vec<SegmentSpan> {
        let mut coeff_at = 0;
        let mut grid_at = 0;
        self.segments
            .iter()
            .map(|seg| {
                let m = seg.size();
                let g = grid_size(scale, m);
                let span = SegmentSpan {
                    coeffs: coeff_at..coeff_at + m,
                    grid: grid_at..grid_at + g,
                };
                coeff_at += m;
                grid_at += g;
                span
            })
            .collect()
    }

    /// Endpoint match rows for every interface, in interface order.
    pub fn continuity_rows(&self) -> Vec<ContinuityRow> {
        let spans = self.segment_spans(1.0);
        self.segments
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let position = pair[0].bounds().1;
                ContinuityRow {
                    interface: i,
                    position,
                    left_offset: spans[i].coeffs.start,
                    left: pair[0].evaluate_modes(position),
                    right_offset: spans[i + 1].coeffs.start,
                    right: pair[1].evaluate_modes(pair[1].bounds().0),
                }
            })
            .collect()
    }

    pub(crate) fn forward_kernel(&self, scale: f64) -> LaneKernel {
        LaneKernel::Blocks(
            self.segments
                .iter()
                .zip(self.segment_spans(scale))
                .map(|(seg, span)| KernelBlock {
                    kernel: seg.forward_kernel(span.grid.len()),
                    input: span.coeffs,
                    output: span.grid,
                })
                .collect(),
        )
    }

    pub(crate) fn backward_kernel(&self, scale: f64) -> LaneKernel {
        LaneKernel::Blocks(
            self.segments
                .iter()
                .zip(self.segment_spans(scale))
                .map(|(seg, span)| KernelBlock {
                    kernel: seg.backward_kernel(span.grid.len()),
                    input: span.grid,
                    output: span.coeffs,
                })
                .collect(),
        )
    }
}
