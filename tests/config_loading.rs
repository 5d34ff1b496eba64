use spectral_sieve::prelude::*;

const CHANNEL: &str = r#"{
    "axes": [
        { "kind": "real_fourier", "name": "x", "size": 16, "bounds": [0.0, 6.283185307179586], "dealias": 1.5 },
        {
            "name": "z",
            "segments": [
                { "kind": "chebyshev", "name": "z0", "size": 16, "bounds": [0.0, 2.0] },
                { "kind": "chebyshev", "name": "z1", "size": 32, "bounds": [2.0, 8.0] },
                { "kind": "chebyshev", "name": "z2", "size": 16, "bounds": [8.0, 10.0] }
            ]
        }
    ],
    "dtype": "real"
}"#;

#[test]
fn parses_single_and_composite_axes() {
    let cfg: DomainConfig = serde_json::from_str(CHANNEL).unwrap();
    assert_eq!(cfg.mesh, None);
    assert!(matches!(cfg.axes[1], AxisConfig::Composite { .. }));
    let axes = cfg.build_axes().unwrap();
    assert_eq!(axes.dtype(), GridDtype::Real);
    assert_eq!(axes.coeff_shape(), vec![16, 64]);
    assert_eq!(axes.dealias_scales(), vec![1.5, 1.0]);
    assert_eq!(axes.axis(1).unwrap().bounds(), (0.0, 10.0));
}

#[test]
fn builds_distributor_with_default_mesh() {
    let cfg: DomainConfig = serde_json::from_str(CHANNEL).unwrap();
    let dist = cfg.build_distributor(ProcessContext::new(0, 2).unwrap()).unwrap();
    assert_eq!(dist.mesh().shape(), &[2]);
    assert_eq!(dist.path_length(), 4);
}

#[test]
fn dtype_defaults_to_complex() {
    let cfg: DomainConfig = serde_json::from_str(
        r#"{ "axes": [ { "kind": "fourier", "name": "x", "size": 8, "bounds": [0.0, 1.0] } ] }"#,
    )
    .unwrap();
    assert_eq!(cfg.dtype, GridDtype::Complex);
    assert!(cfg.build_axes().is_ok());
}

#[test]
fn real_dtype_rejects_complex_fourier() {
    let cfg: DomainConfig = serde_json::from_str(
        r#"{ "axes": [ { "kind": "fourier", "name": "x", "size": 8, "bounds": [0.0, 1.0] } ],
             "dtype": "real" }"#,
    )
    .unwrap();
    assert_eq!(
        cfg.build_axes().unwrap_err(),
        SpectralError::DtypeMismatch {
            axis: 0,
            basis: "x".into(),
            required: "complex"
        }
    );
}

#[test]
fn unknown_kind_is_a_parse_error() {
    let res: Result<DomainConfig, _> = serde_json::from_str(
        r#"{ "axes": [ { "kind": "hermite", "name": "x", "size": 8, "bounds": [0.0, 1.0] } ] }"#,
    );
    assert!(res.is_err());
}

#[test]
fn mesh_mismatch_surfaces_from_config() {
    let mut cfg: DomainConfig = serde_json::from_str(CHANNEL).unwrap();
    cfg.mesh = Some(vec![3]);
    assert!(matches!(
        cfg.build_distributor(ProcessContext::new(0, 2).unwrap()),
        Err(SpectralError::MeshSizeMismatch { product: 3, processes: 2, .. })
    ));
}

#[test]
fn config_roundtrips_through_json() {
    let cfg: DomainConfig = serde_json::from_str(CHANNEL).unwrap();
    let text = serde_json::to_string(&cfg).unwrap();
    let again: DomainConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(again, cfg);
}
