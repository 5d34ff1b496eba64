#![allow(dead_code)]
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use spectral_sieve::prelude::*;

/// Run `f` once per rank of a fresh in-process world, each on its own
/// thread. Results come back in rank order.
pub fn run_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&LocalComm) -> T + Sync,
{
    let world = LocalComm::world(size);
    std::thread::scope(|s| {
        let handles: Vec<_> = world
            .iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank panicked"))
            .collect()
    })
}

/// Three-axis box: two real Fourier axes and a Chebyshev axis.
pub fn box_domain(nx: usize, ny: usize, nz: usize) -> AxisSet {
    AxisSet::new(
        vec![
            Basis::real_fourier("x", nx, (0.0, 2.0)).unwrap().into(),
            Basis::real_fourier("y", ny, (0.0, 1.0))
                .unwrap()
                .with_dealias(1.5)
                .unwrap()
                .into(),
            Basis::chebyshev("z", nz, (-1.0, 1.0)).unwrap().into(),
        ],
        GridDtype::Real,
    )
    .unwrap()
}

/// Deterministic coefficient value for a global index.
///
/// Zero in the `-sin0` slot of the real Fourier axes (0 and 1), which no
/// grid function can represent.
pub fn coeff_at(index: &[usize]) -> Complex64 {
    if index[0] == 1 || index[1] == 1 {
        return Complex64::new(0.0, 0.0);
    }
    let phase = index
        .iter()
        .enumerate()
        .map(|(k, &i)| (k as f64 + 1.3) * i as f64)
        .sum::<f64>();
    Complex64::new(phase.sin() / (1.0 + index[2] as f64), 0.0)
}

/// Random complex array with components in `[-1, 1)`.
pub fn random_array(shape: &[usize], seed: u64) -> ArrayD<Complex64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    ArrayD::from_shape_simple_fn(IxDyn(shape), || {
        Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    })
}

/// `max |a - b| / max |b|`.
pub fn rel_err(a: &ArrayD<Complex64>, b: &ArrayD<Complex64>) -> f64 {
    assert_eq!(a.shape(), b.shape());
    let diff = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max);
    let scale = b.iter().map(|y| y.norm()).fold(0.0, f64::max).max(1e-300);
    diff / scale
}
