mod util;
use util::*;

use spectral_sieve::prelude::*;

#[test]
fn walk_visits_every_layout_in_order() {
    let dist = Distributor::serial(box_domain(8, 6, 5)).unwrap();
    let mut u = DistributedArray::zeros(&dist, 0).unwrap();
    let mut seen = vec![u.layout()];
    for target in 1..dist.path_length() {
        dist.apply_transition(&mut u, target, &NoComm).unwrap();
        seen.push(u.layout());
        let want = dist.local_shape(target, u.scales()).unwrap();
        assert_eq!(u.data().shape(), want.as_slice());
    }
    assert_eq!(seen, (0..dist.path_length()).collect::<Vec<_>>());
    assert_eq!(u.data().shape(), &[8, 9, 5]);
}

#[test]
fn change_layout_walks_backwards_too() {
    let dist = Distributor::serial(box_domain(8, 6, 5)).unwrap();
    let mut u = DistributedArray::zeros(&dist, 3).unwrap();
    dist.change_layout(&mut u, 1, &NoComm).unwrap();
    assert_eq!(u.layout(), 1);
    assert_eq!(
        dist.change_layout(&mut u, 7, &NoComm).unwrap_err(),
        SpectralError::LayoutOutOfRange { index: 7, len: 4 }
    );
}

#[test]
fn local_grids_follow_grid_layout() {
    let ctx = ProcessContext::new(2, 3).unwrap();
    let dist = Distributor::new(box_domain(8, 6, 5), Some(vec![3]), ctx).unwrap();
    let grids = dist.local_grids(&dist.domain().dealias_scales()).unwrap();
    let layout = dist.grid_layout();
    assert_eq!(grids[0].len(), 8);
    assert_eq!(grids[1].len(), 9);
    // z is split 2, 2, 1 over the three ranks
    assert_eq!(grids[2].len(), 1);
    assert!(!layout.is_local(2));
    let full = dist.domain().axis(2).unwrap().grid(1.0).unwrap();
    assert_eq!(grids[2][0], full[4]);
    assert!(matches!(
        dist.local_grids(&[1.0]),
        Err(SpectralError::ScaleCountMismatch { expected: 3, got: 1 })
    ));
}

#[test]
fn layouts_render_as_one_line() {
    let ctx = ProcessContext::new(0, 8).unwrap();
    let dist = Distributor::new(box_domain(8, 8, 8), Some(vec![4, 2]), ctx).unwrap();
    let lines: Vec<String> = dist.layouts().iter().map(ToString::to_string).collect();
    assert_eq!(lines[0], "layout 0: grid=FFF local=FFT mesh_dims=[1,0,-]");
    assert_eq!(lines[5], "layout 5: grid=TTT local=TFF mesh_dims=[-,1,0]");
    assert!(lines.iter().all(|l| !l.contains('\n')));
}

#[test]
fn invariants_hold_after_reconfigure() {
    let ctx = ProcessContext::new(1, 4).unwrap();
    let mut dist = Distributor::new(box_domain(8, 6, 5), None, ctx).unwrap();
    assert_eq!(dist.path_length(), 5);
    dist.reconfigure(vec![2, 2]).unwrap();
    assert_eq!(dist.path_length(), 6);
    dist.validate_invariants().unwrap();
    assert!(matches!(
        dist.reconfigure(vec![2, 1, 2]),
        Err(SpectralError::MeshTooDeep { .. })
    ));
    assert_eq!(dist.mesh().shape(), &[2, 2]);
}

#[test]
fn arrays_from_an_old_chain_are_rejected() {
    let ctx = ProcessContext::new(0, 4).unwrap();
    let mut dist = Distributor::new(box_domain(8, 6, 5), Some(vec![2, 2]), ctx).unwrap();
    let mut u = DistributedArray::zeros(&dist, 0).unwrap();
    let before = dist.chain_id();
    assert_eq!(u.chain_id(), before);

    // same mesh again: local shapes still match, the chain does not
    dist.reconfigure(vec![2, 2]).unwrap();
    assert_ne!(dist.chain_id(), before);
    let err = dist.apply_transition(&mut u, 1, &NoComm).unwrap_err();
    assert_eq!(
        err,
        SpectralError::StaleLayoutChain {
            array: before,
            current: dist.chain_id()
        }
    );
    assert!(matches!(
        dist.change_layout(&mut u, 0, &NoComm),
        Err(SpectralError::StaleLayoutChain { .. })
    ));
    assert_eq!(u.layout(), 0);

    let clone = dist.clone();
    let mut fresh = DistributedArray::zeros(&dist, 0).unwrap();
    assert_eq!(fresh.chain_id(), clone.chain_id());
    clone.change_layout(&mut fresh, 0, &NoComm).unwrap();
}

#[test]
fn arrays_do_not_cross_distributors() {
    let a = Distributor::serial(box_domain(8, 6, 5)).unwrap();
    let b = Distributor::serial(box_domain(8, 6, 5)).unwrap();
    let mut u = DistributedArray::zeros(&a, 0).unwrap();
    assert!(matches!(
        b.apply_transition(&mut u, 1, &NoComm),
        Err(SpectralError::StaleLayoutChain { .. })
    ));
    a.apply_transition(&mut u, 1, &NoComm).unwrap();
}
