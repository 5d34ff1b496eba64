//! Per-lane transform kernels and the process-wide FFT plan cache.
//!
//! A [`LaneKernel`] maps one 1D lane of input (length `input_len`) to one
//! lane of output (length `output_len`). Every basis family lowers its
//! forward/backward transform for a given grid size to one of three shapes:
//! a dense matrix, an FFT with mode padding/truncation, or a block-diagonal
//! stack of other kernels (composite bases).

use dashmap::DashMap;
use ndarray::{Array2, ArrayView1, ArrayViewMut1, s};
use num_complex::Complex64;
use num_traits::Zero;
use once_cell::sync::Lazy;
use rustfft::{Fft, FftPlanner};
use std::ops::Range;
use std::sync::Arc;

/// Plans keyed by `(length, inverse)`.
static PLANS: Lazy<DashMap<(usize, bool), Arc<dyn Fft<f64>>>> = Lazy::new(DashMap::new);

/// Fetch (or build once) the FFT plan for `len` points.
pub fn cached_plan(len: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
    PLANS
        .entry((len, inverse))
        .or_insert_with(|| {
            let mut planner = FftPlanner::<f64>::new();
            if inverse {
                planner.plan_fft_inverse(len)
            } else {
                planner.plan_fft_forward(len)
            }
        })
        .value()
        .clone()
}

/// Number of plans currently cached.
pub fn cached_plan_count() -> usize {
    PLANS.len()
}

/// Direction of an FFT-backed spectrum kernel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpectrumDirection {
    /// Coefficients (length `modes`) → grid values (length `grid`).
    ToGrid,
    /// Grid values (length `grid`) → coefficients (length `modes`).
    ToCoeff,
}

/// One block of a block-diagonal kernel.
#[derive(Clone, Debug)]
pub struct KernelBlock {
    pub input: Range<usize>,
    pub output: Range<usize>,
    pub kernel: LaneKernel,
}

/// A linear map applied lane by lane along one axis.
#[derive(Clone)]
pub enum LaneKernel {
    /// `out = matrix · in`, matrix shape `(output_len, input_len)`.
    Dense(Array2<f64>),
    /// FFT with zero-padding (to grid) or truncation (to coefficients).
    Spectrum {
        plan: Arc<dyn Fft<f64>>,
        modes: usize,
        grid: usize,
        direction: SpectrumDirection,
    },
    /// Independent kernels on disjoint input/output ranges.
    Blocks(Vec<KernelBlock>),
}

impl std::fmt::Debug for LaneKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneKernel::Dense(m) => f.debug_tuple("Dense").field(&m.dim()).finish(),
            LaneKernel::Spectrum {
                modes,
                grid,
                direction,
                ..
            } => f
                .debug_struct("Spectrum")
                .field("modes", modes)
                .field("grid", grid)
                .field("direction", direction)
                .finish(),
            LaneKernel::Blocks(blocks) => f.debug_list().entries(blocks).finish(),
        }
    }
}

impl LaneKernel {
    pub fn input_len(&self) -> usize {
        match self {
            LaneKernel::Dense(m) => m.ncols(),
            LaneKernel::Spectrum {
                modes,
                grid,
                direction,
                ..
            } => match direction {
                SpectrumDirection::ToGrid => *modes,
                SpectrumDirection::ToCoeff => *grid,
            },
            LaneKernel::Blocks(blocks) => blocks.iter().map(|b| b.input.len()).sum(),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            LaneKernel::Dense(m) => m.nrows(),
            LaneKernel::Spectrum {
                modes,
                grid,
                direction,
                ..
            } => match direction {
                SpectrumDirection::ToGrid => *grid,
                SpectrumDirection::ToCoeff => *modes,
            },
            LaneKernel::Blocks(blocks) => blocks.iter().map(|b| b.output.len()).sum(),
        }
    }

    /// Apply to one lane. Lengths must match `input_len`/`output_len`.
    pub fn apply(&self, input: ArrayView1<'_, Complex64>, mut output: ArrayViewMut1<'_, Complex64>) {
        debug_assert_eq!(input.len(), self.input_len());
        debug_assert_eq!(output.len(), self.output_len());
        match self {
            LaneKernel::Dense(matrix) => {
                for (row, out) in matrix.rows().into_iter().zip(output.iter_mut()) {
                    *out = row
                        .iter()
                        .zip(input.iter())
                        .fold(Complex64::zero(), |acc, (&m, &v)| acc + v * m);
                }
            }
            LaneKernel::Spectrum {
                plan,
                modes,
                grid,
                direction,
            } => match direction {
                SpectrumDirection::ToGrid => {
                    let mut buffer = vec![Complex64::zero(); *grid];
                    for (j, &c) in input.iter().enumerate() {
                        buffer[mode_slot(j, *modes, *grid)] = c;
                    }
                    plan.process(&mut buffer);
                    for (out, v) in output.iter_mut().zip(buffer) {
                        *out = v;
                    }
                }
                SpectrumDirection::ToCoeff => {
                    let mut buffer: Vec<Complex64> = input.iter().copied().collect();
                    plan.process(&mut buffer);
                    let norm = 1.0 / *grid as f64;
                    for (j, out) in output.iter_mut().enumerate() {
                        *out = buffer[mode_slot(j, *modes, *grid)] * norm;
                    }
                }
            },
            LaneKernel::Blocks(blocks) => {
                for block in blocks {
                    block.kernel.apply(
                        input.slice(s![block.input.clone()]),
                        output.slice_mut(s![block.output.clone()]),
                    );
                }
            }
        }
    }
}

/// Position of coefficient `j` in an FFT spectrum of length `grid`.
///
/// Coefficients are stored in FFT order `0, 1, .., kmax, -kmax', .., -1`;
/// positive wavenumbers stay at the front and negative ones wrap to the back.
#[inline]
pub(crate) fn mode_slot(j: usize, modes: usize, grid: usize) -> usize {
    let k = if j < modes.div_ceil(2) {
        j as isize
    } else {
        j as isize - modes as isize
    };
    k.rem_euclid(grid as isize) as usize
}
