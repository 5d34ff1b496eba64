mod util;
use util::*;

use ndarray::{Axis, Slice};
use num_complex::Complex64;
use spectral_sieve::prelude::*;

const TOL: f64 = 1e-10;

fn families(n: usize) -> Vec<Basis> {
    vec![
        Basis::fourier("f", n, (0.0, 3.0)).unwrap(),
        Basis::real_fourier("r", n, (-1.0, 1.0)).unwrap(),
        Basis::chebyshev("c", n, (0.0, 5.0)).unwrap(),
        Basis::legendre("l", n, (-2.0, 2.0)).unwrap(),
    ]
}

/// Coefficients the basis can represent exactly (real Fourier drops `-sin0`).
fn representable(basis: &AxisBasis, axis: usize, seed: u64, shape: &[usize]) -> ndarray::ArrayD<Complex64> {
    let mut c = random_array(shape, seed);
    let is_real_fourier = match basis {
        AxisBasis::Single(Basis::RealFourier(_)) => true,
        AxisBasis::Composite(comp) => matches!(comp.segments()[0], Basis::RealFourier(_)),
        _ => false,
    };
    if is_real_fourier {
        let mut slot = c.slice_axis_mut(Axis(axis), Slice::from(1..2usize));
        slot.fill(Complex64::new(0.0, 0.0));
    }
    c
}

#[test]
fn every_family_roundtrips_at_several_scales() {
    for n in [8usize, 16, 32] {
        for basis in families(n) {
            let axis: AxisBasis = basis.into();
            for scale in [1.0, 1.25, 1.5, 2.0] {
                let c = representable(&axis, 0, n as u64, &[n]);
                let g = axis.transform_forward(&c, 0, scale).unwrap();
                assert_eq!(g.len(), axis.grid_size(scale));
                let back = axis.transform_backward(&g, 0, scale).unwrap();
                let err = rel_err(&back, &c);
                assert!(err < TOL, "{} n={n} scale={scale}: {err:e}", axis.name());
            }
        }
    }
}

#[test]
fn transforms_leave_other_axes_untouched() {
    let axis: AxisBasis = Basis::chebyshev("c", 6, (0.0, 1.0)).unwrap().into();
    let c = random_array(&[3, 6, 4], 7);
    let g = axis.transform_forward(&c, 1, 1.5).unwrap();
    assert_eq!(g.shape(), &[3, 9, 4]);
    // lane (i, :, k) depends only on lane (i, :, k) of the input
    let lane_in = c.index_axis(Axis(0), 2).index_axis(Axis(1), 3).to_owned().into_dyn();
    let lane_out = axis.transform_forward(&lane_in, 0, 1.5).unwrap();
    let expect = g.index_axis(Axis(0), 2).index_axis(Axis(1), 3).to_owned().into_dyn();
    assert!(rel_err(&lane_out, &expect) < 1e-14);
}

#[test]
fn composite_roundtrip_blockwise() {
    let comp = CompositeBasis::new(
        "z",
        vec![
            Basis::chebyshev("z0", 10, (0.0, 1.0)).unwrap(),
            Basis::chebyshev("z1", 7, (1.0, 4.0)).unwrap(),
            Basis::chebyshev("z2", 12, (4.0, 4.5)).unwrap(),
        ],
    )
    .unwrap();
    let axis: AxisBasis = comp.clone().into();
    for scale in [1.0, 1.5] {
        let c = random_array(&[2, 29], 11);
        let g = axis.transform_forward(&c, 1, scale).unwrap();
        assert_eq!(g.shape()[1], comp.grid_size(scale));
        let back = axis.transform_backward(&g, 1, scale).unwrap();
        assert!(rel_err(&back, &c) < TOL);
    }
}

#[test]
fn composite_blocks_match_segment_transforms() {
    let seg0 = Basis::legendre("a", 5, (0.0, 1.0)).unwrap();
    let seg1 = Basis::legendre("b", 6, (1.0, 2.0)).unwrap();
    let comp = CompositeBasis::new("z", vec![seg0.clone(), seg1.clone()]).unwrap();
    let c = random_array(&[11], 3);
    let axis: AxisBasis = comp.clone().into();
    let g = axis.transform_forward(&c, 0, 1.5).unwrap();
    let spans = comp.segment_spans(1.5);
    for (seg, span) in [seg0, seg1].iter().zip(spans) {
        let part = c.slice_axis(Axis(0), Slice::from(span.coeffs.clone())).to_owned();
        let want = seg.transform_forward(&part, 0, 1.5).unwrap();
        let got = g.slice_axis(Axis(0), Slice::from(span.grid.clone())).to_owned();
        assert!(rel_err(&got, &want) < 1e-14);
    }
}

#[test]
fn domain_roundtrip_over_all_axes() {
    let domain = box_domain(8, 6, 5);
    let scales = domain.dealias_scales();
    let mut data = random_array(&domain.coeff_shape(), 99);
    for (axis, basis) in domain.axes().iter().enumerate() {
        if matches!(basis, AxisBasis::Single(Basis::RealFourier(_))) {
            data.slice_axis_mut(Axis(axis), Slice::from(1..2usize))
                .fill(Complex64::new(0.0, 0.0));
        }
    }
    let mut g = data.clone();
    for axis in (0..3).rev() {
        g = domain.axis(axis).unwrap().transform_forward(&g, axis, scales[axis]).unwrap();
    }
    assert_eq!(g.shape(), domain.grid_shape(&scales).unwrap().as_slice());
    let mut back = g;
    for axis in 0..3 {
        back = domain.axis(axis).unwrap().transform_backward(&back, axis, scales[axis]).unwrap();
    }
    assert!(rel_err(&back, &data) < TOL);
}
