//! Global transpose within one process-mesh communication group.
//!
//! Before the exchange each process holds block `position` of the gather
//! axis and the whole scatter axis; afterwards it holds the whole gather
//! axis and block `position` of the scatter axis. Values are moved, never
//! combined, so the global array is unchanged.
//!
//! The exchange follows the usual four steps: post all receives, post all
//! sends, wait every receive (recording the first error without returning
//! early), then drain every send.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{block_len, decode_block, encode_block};
use crate::distributor::layout::block_partition;
use crate::spectral_error::SpectralError;
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use num_complex::Complex64;

/// Who talks to whom, and how the two axes are split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransposePlan {
    /// Axis that becomes whole.
    pub gather_axis: usize,
    /// Axis that becomes split.
    pub scatter_axis: usize,
    /// Global extent of the gather axis.
    pub gather_extent: usize,
    /// Global extent of the scatter axis.
    pub scatter_extent: usize,
    /// Ranks of the group, ordered by mesh coordinate.
    pub group: Vec<usize>,
    /// This process' index in `group`.
    pub position: usize,
}

impl TransposePlan {
    /// The plan that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            gather_axis: self.scatter_axis,
            scatter_axis: self.gather_axis,
            gather_extent: self.scatter_extent,
            scatter_extent: self.gather_extent,
            group: self.group.clone(),
            position: self.position,
        }
    }

    fn parts(&self) -> usize {
        self.group.len()
    }

    /// Local shape before the exchange, given the current shape.
    fn input_shape(&self, shape: &[usize]) -> Vec<usize> {
        let mut s = shape.to_vec();
        s[self.gather_axis] =
            block_partition(self.gather_extent, self.parts(), self.position).len();
        s[self.scatter_axis] = self.scatter_extent;
        s
    }

    /// Shape of the block this process receives from group member `k`.
    fn incoming_shape(&self, shape: &[usize], k: usize) -> Vec<usize> {
        let mut s = shape.to_vec();
        s[self.gather_axis] = block_partition(self.gather_extent, self.parts(), k).len();
        s[self.scatter_axis] =
            block_partition(self.scatter_extent, self.parts(), self.position).len();
        s
    }
}

/// Redistribute `data` according to `plan`.
///
/// Collective over `plan.group`: every member must call it with the same
/// `tag` and a matching plan, or the exchange never completes.
pub fn transpose<C: Communicator>(
    data: &ArrayD<Complex64>,
    plan: &TransposePlan,
    comm: &C,
    tag: CommTag,
) -> Result<ArrayD<Complex64>, SpectralError> {
    let ndim = data.ndim();
    for axis in [plan.gather_axis, plan.scatter_axis] {
        if axis >= ndim {
            return Err(SpectralError::OutOfRange { axis, axes: ndim });
        }
    }
    let expected = plan.input_shape(data.shape());
    if data.shape() != expected.as_slice() {
        return Err(SpectralError::ShapeMismatch {
            expected,
            got: data.shape().to_vec(),
        });
    }
    let parts = plan.parts();
    let scatter_block = |k: usize| {
        let r = block_partition(plan.scatter_extent, parts, k);
        data.slice_axis(Axis(plan.scatter_axis), Slice::from(r))
    };
    if block_partition(plan.scatter_extent, parts, plan.position).is_empty() {
        log::warn!(
            "rank {} holds an empty block of axis {} after transpose ({} points over {} processes)",
            comm.rank(),
            plan.scatter_axis,
            plan.scatter_extent,
            parts
        );
    }

    // 1) post all receives
    let mut pending_recvs = Vec::with_capacity(parts);
    for (k, &peer) in plan.group.iter().enumerate() {
        if k == plan.position {
            continue;
        }
        let count: usize = plan.incoming_shape(data.shape(), k).iter().product();
        let mut buf = vec![0u8; block_len(count)];
        let h = comm.irecv(peer, tag.as_u16(), &mut buf);
        pending_recvs.push((k, peer, count, h));
    }

    // 2) post all sends
    let mut pending_sends = Vec::with_capacity(parts);
    for (k, &peer) in plan.group.iter().enumerate() {
        if k == plan.position {
            continue;
        }
        let block = scatter_block(k);
        let bytes = encode_block(block.iter().copied(), block.len());
        pending_sends.push(comm.isend(peer, tag.as_u16(), &bytes));
    }

    // 3) wait for all receives, keep the first error but do not early-return
    let mut incoming: Vec<Option<Vec<Complex64>>> = vec![None; parts];
    let mut maybe_err = None;
    for (k, peer, count, h) in pending_recvs {
        match h.wait() {
            Some(bytes) if maybe_err.is_none() => match decode_block(&bytes, count, peer) {
                Ok(values) => incoming[k] = Some(values),
                Err(e) => maybe_err = Some(e),
            },
            None if maybe_err.is_none() => {
                maybe_err = Some(SpectralError::CommError {
                    neighbor: peer,
                    reason: format!("no transpose block received (tag {:#x})", tag.as_u16()),
                });
            }
            _ => {} // already failed; just drain
        }
    }

    // 4) always drain all send handles before returning
    for send in pending_sends {
        let _ = send.wait();
    }

    if let Some(err) = maybe_err {
        return Err(err);
    }

    // 5) assemble along the gather axis
    let mut out_shape = data.shape().to_vec();
    out_shape[plan.gather_axis] = plan.gather_extent;
    out_shape[plan.scatter_axis] =
        block_partition(plan.scatter_extent, parts, plan.position).len();
    let mut out = ArrayD::<Complex64>::zeros(IxDyn(&out_shape));
    for (k, values) in incoming.into_iter().enumerate() {
        let rows = block_partition(plan.gather_extent, parts, k);
        let mut dst = out.slice_axis_mut(Axis(plan.gather_axis), Slice::from(rows));
        if k == plan.position {
            dst.assign(&scatter_block(k));
            continue;
        }
        let shape = plan.incoming_shape(data.shape(), k);
        let values = values.ok_or_else(|| {
            SpectralError::InvariantViolation(format!("transpose block {k} missing after exchange"))
        })?;
        let block = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| {
            SpectralError::InvariantViolation(format!("transpose block {k}: {e}"))
        })?;
        dst.assign(&block);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{LocalComm, NoComm};

    fn c(v: f64) -> Complex64 {
        Complex64::new(v, -v)
    }

    #[test]
    fn single_member_group_is_identity() {
        let data = ArrayD::from_shape_fn(IxDyn(&[3, 4]), |i| c((i[0] * 4 + i[1]) as f64));
        let plan = TransposePlan {
            gather_axis: 0,
            scatter_axis: 1,
            gather_extent: 3,
            scatter_extent: 4,
            group: vec![0],
            position: 0,
        };
        let out = transpose(&data, &plan, &NoComm, CommTag::new(1)).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn three_ranks_swap_split_axis() {
        // global 5 x 4; axis 0 split over 3 ranks before, axis 1 after
        let global = ArrayD::from_shape_fn(IxDyn(&[5, 4]), |i| c((i[0] * 4 + i[1]) as f64));
        let world = LocalComm::world(3);
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = world
                .iter()
                .enumerate()
                .map(|(r, comm)| {
                    let global = &global;
                    s.spawn(move || {
                        let rows = block_partition(5, 3, r);
                        let local = global.slice_axis(Axis(0), Slice::from(rows)).to_owned();
                        let plan = TransposePlan {
                            gather_axis: 0,
                            scatter_axis: 1,
                            gather_extent: 5,
                            scatter_extent: 4,
                            group: vec![0, 1, 2],
                            position: r,
                        };
                        let out = transpose(&local, &plan, comm, CommTag::new(9)).unwrap();
                        let back = transpose(&out, &plan.inverse(), comm, CommTag::new(10)).unwrap();
                        (out, back, local)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (r, (out, back, local)) in results.into_iter().enumerate() {
            let cols = block_partition(4, 3, r);
            let want = global.slice_axis(Axis(1), Slice::from(cols));
            assert_eq!(out, want);
            assert_eq!(back, local);
        }
    }

    #[test]
    fn wrong_input_shape_is_rejected() {
        let data = ArrayD::<Complex64>::zeros(IxDyn(&[3, 2]));
        let plan = TransposePlan {
            gather_axis: 0,
            scatter_axis: 1,
            gather_extent: 4,
            scatter_extent: 2,
            group: vec![0, 1],
            position: 0,
        };
        assert_eq!(
            transpose(&data, &plan, &NoComm, CommTag::new(1)).unwrap_err(),
            SpectralError::ShapeMismatch {
                expected: vec![2, 2],
                got: vec![3, 2]
            }
        );
    }
}
