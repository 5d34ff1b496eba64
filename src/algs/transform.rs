//! Lane-wise application of a 1D kernel along one axis of an N-d array.

use crate::basis::LaneKernel;
use crate::spectral_error::SpectralError;
use ndarray::{ArrayD, Axis, IxDyn, Zip};
use num_complex::Complex64;

/// Apply `kernel` to every lane of `data` along `axis`.
///
/// The result has the same shape as `data` except along `axis`, where the
/// extent becomes `kernel.output_len()`. Other axes are untouched.
///
/// # Errors
/// - `OutOfRange` if `axis >= data.ndim()`,
/// - `ShapeMismatch` if the lane length differs from `kernel.input_len()`.
pub fn apply_along_axis(
    data: &ArrayD<Complex64>,
    axis: usize,
    kernel: &LaneKernel,
) -> Result<ArrayD<Complex64>, SpectralError> {
    if axis >= data.ndim() {
        return Err(SpectralError::OutOfRange {
            axis,
            axes: data.ndim(),
        });
    }
    if data.len_of(Axis(axis)) != kernel.input_len() {
        let mut expected = data.shape().to_vec();
        expected[axis] = kernel.input_len();
        return Err(SpectralError::ShapeMismatch {
            expected,
            got: data.shape().to_vec(),
        });
    }
    let mut shape = data.shape().to_vec();
    shape[axis] = kernel.output_len();
    let mut out = ArrayD::<Complex64>::zeros(IxDyn(&shape));

    let lanes = Zip::from(out.lanes_mut(Axis(axis))).and(data.lanes(Axis(axis)));
    #[cfg(feature = "rayon")]
    lanes.par_for_each(|dst, src| kernel.apply(src, dst));
    #[cfg(not(feature = "rayon"))]
    lanes.for_each(|dst, src| kernel.apply(src, dst));

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn applies_only_along_requested_axis() {
        // duplicate each lane entry: (2 -> 4) along axis 1
        let k = LaneKernel::Dense(array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0]]);
        let data = ArrayD::from_shape_fn(IxDyn(&[3, 2]), |i| {
            Complex64::new((10 * i[0] + i[1]) as f64, 0.0)
        });
        let out = apply_along_axis(&data, 1, &k).unwrap();
        assert_eq!(out.shape(), &[3, 4]);
        assert_eq!(out[[2, 0]].re, 20.0);
        assert_eq!(out[[2, 3]].re, 21.0);
    }

    #[test]
    fn rejects_bad_axis_and_length() {
        let k = LaneKernel::Dense(array![[1.0, 0.0]]);
        let data = ArrayD::<Complex64>::zeros(IxDyn(&[3, 2]));
        assert_eq!(
            apply_along_axis(&data, 2, &k).unwrap_err(),
            SpectralError::OutOfRange { axis: 2, axes: 2 }
        );
        assert_eq!(
            apply_along_axis(&data, 0, &k).unwrap_err(),
            SpectralError::ShapeMismatch {
                expected: vec![2, 2],
                got: vec![3, 2]
            }
        );
    }
}
