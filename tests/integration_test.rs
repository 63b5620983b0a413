use std::env;
use std::f64::consts::PI;
use std::fs;

use log::LevelFilter;
use nalgebra::{Matrix3, Vector3};

use mapsym::auxiliary::geometry::proper_rotation_matrix;
use mapsym::drivers::symmetry_detection::{
    ProcessedStructure, SymmetryDetectionDriver, SymmetryDetectionParams,
    SymmetryDetectionResult,
};
use mapsym::drivers::MapSymDriver;
use mapsym::io::{init_logging_to_files, read_mapsym_binary, MapSymFileType};
use mapsym::map::synthetic::{render_blobs, replicate_motif, GaussianBlob};
use mapsym::pointgroup::group_elements::GroupElementOutcome;
use mapsym::pointgroup::recommend::SymmetryRecommendation;
use mapsym::pointgroup::PointGroupKind;

/// A motif lying entirely above the xy-plane, so that only rotations about z can map it onto
/// itself.
fn motif() -> Vec<GaussianBlob> {
    vec![
        GaussianBlob::cylindrical(6.0, 10.0, 4.0, 1.0, 1.5),
        GaussianBlob::cylindrical(4.0, 50.0, 6.0, 0.8, 1.5),
        GaussianBlob::cylindrical(8.0, 35.0, 3.0, 1.2, 1.5),
    ]
}

fn cyclic_rotations(n: u32) -> Vec<Matrix3<f64>> {
    (0..n)
        .map(|k| proper_rotation_matrix(2.0 * PI * f64::from(k) / f64::from(n), &Vector3::z(), 1))
        .collect()
}

fn cyclic_structure(n: u32) -> ProcessedStructure {
    let blobs = replicate_motif(&motif(), &cyclic_rotations(n));
    ProcessedStructure {
        name: format!("c{n}"),
        map: render_blobs(24, 1.0, &blobs).unwrap(),
        centre_shift: Vector3::zeros(),
    }
}

fn dihedral_structure(n: u32) -> ProcessedStructure {
    let ring = replicate_motif(&motif(), &cyclic_rotations(n));
    let flip = [Matrix3::identity(), proper_rotation_matrix(PI, &Vector3::x(), 1)];
    let blobs = replicate_motif(&ring, &flip);
    ProcessedStructure {
        name: format!("d{n}"),
        map: render_blobs(24, 1.0, &blobs).unwrap(),
        centre_shift: Vector3::zeros(),
    }
}

fn params() -> SymmetryDetectionParams {
    SymmetryDetectionParams::builder()
        .resolution(3.0)
        .max_symmetry_fold(8)
        .progressive_sphere_mapping(false)
        .build()
        .unwrap()
}

fn run(params: &SymmetryDetectionParams, structures: &[ProcessedStructure]) -> SymmetryDetectionResult {
    let structures = structures.to_vec();
    let mut driver = SymmetryDetectionDriver::builder()
        .parameters(params)
        .source(&structures)
        .build()
        .unwrap();
    driver.run().unwrap();
    driver.result().unwrap().clone()
}

#[test]
fn test_cyclic_and_dihedral_maps() {
    let params = params()
        .to_builder()
        .write_group_elements(true)
        .build()
        .unwrap();
    let result = run(&params, &[cyclic_structure(3), dihedral_structure(3)]);
    assert_eq!(result.structures.len(), 2);

    let c3 = &result.structures[0];
    assert_eq!(c3.recommendation.kind(), Some(PointGroupKind::Cyclic(3)));
    assert!(c3.recommendation.axes()[0].axis.dot(&Vector3::z()).abs() > 0.99);

    let d3 = &result.structures[1];
    assert_eq!(d3.recommendation.kind(), Some(PointGroupKind::Dihedral(3)));
    assert_eq!(d3.recommendation.folds(), vec![3, 2]);
    let axes = d3.recommendation.axes();
    assert_eq!(axes.len(), 2);
    assert!(axes[0].axis.dot(&Vector3::z()).abs() > 0.99);
    assert!(axes[1].axis.dot(&Vector3::z()).abs() < 0.1);
    assert!(!d3.d_axes().is_empty());
    match d3.group_elements.as_ref() {
        Some(GroupElementOutcome::Complete(set)) => assert_eq!(set.len(), 6),
        other => panic!("Unexpected group elements: {other:?}"),
    }
}

#[test]
fn test_requested_symmetry() {
    let structures = [cyclic_structure(4)];

    let matching = params()
        .to_builder()
        .requested_symmetry(Some("C".to_string()))
        .requested_fold(4)
        .build()
        .unwrap();
    let result = run(&matching, &structures);
    assert_eq!(
        result.structures[0].recommendation.kind(),
        Some(PointGroupKind::Cyclic(4))
    );

    let absent = params()
        .to_builder()
        .requested_symmetry(Some("I".to_string()))
        .build()
        .unwrap();
    let result = run(&absent, &structures);
    assert!(matches!(
        result.structures[0].recommendation,
        SymmetryRecommendation::NotFound { requested: Some(_), .. }
    ));
    assert!(result.structures[0].group_elements.is_none());
}

#[test]
fn test_detection_is_reproducible_and_saved() {
    let dir = env::temp_dir().join(format!("mapsym_integration_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    init_logging_to_files(dir.join("output.log"), dir.join("diagnostics.log"), LevelFilter::Warn)
        .unwrap();

    let name = dir.join("c5").to_string_lossy().to_string();
    let params = params()
        .to_builder()
        .result_save_name(Some(name.clone()))
        .build()
        .unwrap();
    let structures = [cyclic_structure(5)];
    let first = run(&params, &structures);
    let second = run(&params, &structures);
    assert_eq!(first, second);
    assert_eq!(
        first.structures[0].recommendation.kind(),
        Some(PointGroupKind::Cyclic(5))
    );

    let saved: SymmetryDetectionResult = read_mapsym_binary(&name, MapSymFileType::Sym).unwrap();
    assert_eq!(saved, first);

    let report = fs::read_to_string(dir.join("output.log")).unwrap();
    assert!(report.contains("Map Symmetry Detection"));
    assert!(report.contains("Symmetry detection summary"));
    fs::remove_dir_all(dir).unwrap();
}
