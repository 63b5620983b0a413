use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::geometry::proper_rotation_matrix;
use crate::drivers::symmetry_detection::{
    check_symmetry_params, detect_structure_symmetry, ProcessedStructure, StructureSource, SymmetryDetectionDriver,
    SymmetryDetectionParams,
};
use crate::drivers::MapSymDriver;
use crate::error::{
    MapSymError, ES_INVALID_REQUESTED_FOLD, ES_INVALID_REQUESTED_SYMMETRY, ES_INVALID_RESOLUTION,
    ES_INVALID_THRESHOLD, ES_NEGATIVE_AXIS_TOLERANCE, ES_NO_STRUCTURES,
};
use crate::map::synthetic::{render_blobs, replicate_motif, GaussianBlob};
use crate::pointgroup::group_elements::{
    close_group, generators_from_axes, GroupElementOutcome, MAX_GROUP_ELEMENTS, MAX_SYMMETRY_FOLD,
};
use crate::pointgroup::PointGroupKind;

fn c4_structure() -> ProcessedStructure {
    let motif = [
        GaussianBlob::cylindrical(6.0, 10.0, 4.0, 1.0, 1.5),
        GaussianBlob::cylindrical(4.0, 50.0, 6.0, 0.8, 1.5),
        GaussianBlob::cylindrical(8.0, 35.0, 3.0, 1.2, 1.5),
    ];
    let rotations: Vec<Matrix3<f64>> = (0..4)
        .map(|k| proper_rotation_matrix(f64::from(k) * PI / 2.0, &Vector3::z(), 1))
        .collect();
    ProcessedStructure {
        name: "c4".to_string(),
        map: render_blobs(24, 1.0, &replicate_motif(&motif, &rotations)).unwrap(),
        centre_shift: Vector3::new(0.5, -0.25, 0.0),
    }
}

fn structure_from(
    name: &str,
    motif: &[GaussianBlob],
    rotations: &[Matrix3<f64>],
) -> ProcessedStructure {
    ProcessedStructure {
        name: name.to_string(),
        map: render_blobs(24, 1.0, &replicate_motif(motif, rotations)).unwrap(),
        centre_shift: Vector3::zeros(),
    }
}

fn test_params() -> SymmetryDetectionParams {
    SymmetryDetectionParams::builder()
        .resolution(3.0)
        .max_symmetry_fold(8)
        .progressive_sphere_mapping(false)
        .build()
        .unwrap()
}

fn configuration_code(params: &SymmetryDetectionParams, n_structures: usize) -> &'static str {
    check_symmetry_params(params, n_structures).unwrap_err().code()
}

#[test]
fn test_symmetry_detection_params_defaults() {
    let params = SymmetryDetectionParams::builder().build().unwrap();
    assert_eq!(params.resolution, 6.0);
    assert_eq!(params.bandwidth, 0);
    assert!(params.progressive_sphere_mapping);
    assert_eq!(params.max_symmetry_fold, 30);
    assert_eq!(params.peak_neighbours, 1);
    assert!(params.peak_iqr_threshold < 0.0);
    assert_eq!(params.missing_peak_threshold, 0.3);
    assert_eq!(params.axis_comparison_threshold, 0.1);
    assert_eq!(params.minimum_peak_for_axis, 0.3);
    assert!(params.bicubic_interpolation);
    assert_eq!(params.peak_height_tolerance, 0.1);
    assert_eq!(params.requested_symmetry, None);
    assert_eq!(params.requested_fold, 0);
    assert_eq!(params.group_closure_max_passes, 10);
    assert_eq!(params.rotation_grid_oversampling, 2);
    assert!(!params.write_group_elements);
    assert_eq!(params.result_save_name, None);
    assert!(params.to_string().contains("Bandwidth: auto"));
    assert!(params.requested().unwrap().is_none());
}

#[test]
fn test_derived_params_leave_the_original_unchanged() {
    let params = test_params();
    let derived = params
        .to_builder()
        .requested_symmetry(Some("C".to_string()))
        .requested_fold(4)
        .build()
        .unwrap();
    assert_eq!(params.requested_symmetry, None);
    assert_eq!(derived.requested_fold, 4);
    assert_eq!(derived.resolution, params.resolution);
    assert_eq!(derived.max_symmetry_fold, params.max_symmetry_fold);
    assert_eq!(params.to_builder().build().unwrap(), params);
}

#[test]
fn test_check_symmetry_params() {
    let params = test_params();
    assert!(check_symmetry_params(&params, 1).is_ok());
    assert_eq!(configuration_code(&params, 0), ES_NO_STRUCTURES);

    let negative_tolerance = params.to_builder().axis_comparison_threshold(-0.1).build().unwrap();
    assert_eq!(configuration_code(&negative_tolerance, 1), ES_NEGATIVE_AXIS_TOLERANCE);

    let zero_resolution = params.to_builder().resolution(0.0).build().unwrap();
    assert_eq!(configuration_code(&zero_resolution, 1), ES_INVALID_RESOLUTION);

    let bad_fraction = params.to_builder().missing_peak_threshold(1.5).build().unwrap();
    assert_eq!(configuration_code(&bad_fraction, 1), ES_INVALID_THRESHOLD);

    let bad_fold_range = params.to_builder().max_symmetry_fold(1).build().unwrap();
    assert_eq!(configuration_code(&bad_fold_range, 1), ES_INVALID_THRESHOLD);

    let largest_fold = params.to_builder().max_symmetry_fold(MAX_SYMMETRY_FOLD).build().unwrap();
    assert!(check_symmetry_params(&largest_fold, 1).is_ok());
    let too_large_fold = params
        .to_builder()
        .max_symmetry_fold(MAX_SYMMETRY_FOLD + 1)
        .build()
        .unwrap();
    assert_eq!(configuration_code(&too_large_fold, 1), ES_INVALID_THRESHOLD);
    assert_eq!(2 * MAX_SYMMETRY_FOLD as usize, MAX_GROUP_ELEMENTS);

    let bad_type = params
        .to_builder()
        .requested_symmetry(Some("Q".to_string()))
        .build()
        .unwrap();
    assert_eq!(configuration_code(&bad_type, 1), ES_INVALID_REQUESTED_SYMMETRY);

    let bad_fold = params
        .to_builder()
        .requested_symmetry(Some("T".to_string()))
        .requested_fold(3)
        .build()
        .unwrap();
    assert_eq!(configuration_code(&bad_fold, 1), ES_INVALID_REQUESTED_FOLD);
}

#[test]
fn test_structure_source_for_vectors() {
    let params = test_params();
    let structures = vec![c4_structure()];
    assert_eq!(structures.n_structures(), 1);
    assert_eq!(structures.read_structure(0, &params).unwrap().name, "c4");
    assert!(structures.read_structure(1, &params).is_err());
}

#[test]
fn test_driver_without_structures_fails_eagerly() {
    let params = test_params();
    let structures: Vec<ProcessedStructure> = Vec::new();
    let mut driver = SymmetryDetectionDriver::builder()
        .parameters(&params)
        .source(&structures)
        .build()
        .unwrap();
    let err = driver.run().unwrap_err();
    assert_eq!(
        err.downcast_ref::<MapSymError>().map(MapSymError::code),
        Some(ES_NO_STRUCTURES)
    );
    assert!(driver.result().is_err());
}

#[test]
fn test_driver_detects_c4_with_group_elements() {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = test_params()
        .to_builder()
        .write_group_elements(true)
        .build()
        .unwrap();
    let structures = vec![c4_structure()];
    let mut driver = SymmetryDetectionDriver::builder()
        .parameters(&params)
        .source(&structures)
        .build()
        .unwrap();
    driver.run().unwrap();
    let result = driver.result().unwrap();
    assert_eq!(result.structures.len(), 1);
    let structure = &result.structures[0];
    assert_eq!(structure.centre_shift, Vector3::new(0.5, -0.25, 0.0));
    assert_eq!(structure.recommendation.kind(), Some(PointGroupKind::Cyclic(4)));
    let axis = structure.recommendation.axes()[0].axis;
    assert!(axis.dot(&Vector3::z()).abs() > 0.99);
    assert!(structure
        .all_cs()
        .iter()
        .any(|c| c.fold == 4 && c.axis.dot(&Vector3::z()).abs() > 0.99));
    assert!(structure.t_axes().is_empty());
    assert!(structure.o_axes().is_empty());
    assert!(structure.i_axes().is_empty());
    match structure.group_elements.as_ref() {
        Some(GroupElementOutcome::Complete(set)) => {
            assert_eq!(set.len(), 4);
            assert!(set.is_closed(0.1));
        }
        other => panic!("Unexpected group elements: {other:?}"),
    }
    assert!(structure.to_string().contains("Detected cyclic axes"));
}

#[test]
fn test_fourfold_axis_is_not_raised_to_its_multiples() {
    let params = test_params();
    let result = detect_structure_symmetry(&c4_structure(), &params, None).unwrap();
    let on_z: Vec<_> = result
        .all_cs()
        .iter()
        .filter(|c| c.axis.dot(&Vector3::z()).abs() > 0.99)
        .collect();
    assert_eq!(on_z.len(), 1);
    assert_eq!(on_z[0].fold, 4);
    assert!(on_z[0].height > 0.9);
    assert_eq!(result.recommendation.kind(), Some(PointGroupKind::Cyclic(4)));
}

#[test]
fn test_twofold_dihedral_map() {
    let motif = [
        GaussianBlob::cylindrical(6.0, 10.0, 4.0, 1.0, 1.5),
        GaussianBlob::cylindrical(4.0, 50.0, 6.0, 0.8, 1.5),
        GaussianBlob::cylindrical(8.0, 35.0, 3.0, 1.2, 1.5),
    ];
    let rotations = [
        Matrix3::identity(),
        proper_rotation_matrix(PI, &Vector3::z(), 1),
        proper_rotation_matrix(PI, &Vector3::x(), 1),
        proper_rotation_matrix(PI, &Vector3::y(), 1),
    ];
    let structure = structure_from("d2", &motif, &rotations);
    let result = detect_structure_symmetry(&structure, &test_params(), None).unwrap();
    for reference in [Vector3::x(), Vector3::y(), Vector3::z()] {
        let on_axis: Vec<_> = result
            .all_cs()
            .iter()
            .filter(|c| c.axis.dot(&reference).abs() > 0.99)
            .collect();
        assert_eq!(on_axis.len(), 1);
        assert_eq!(on_axis[0].fold, 2);
    }
    assert_eq!(result.recommendation.kind(), Some(PointGroupKind::Dihedral(2)));
    assert_eq!(result.recommendation.folds(), vec![2, 2]);
    assert!(!result.d_axes().is_empty());
}

#[test]
fn test_tetrahedral_map() {
    let kind = PointGroupKind::Tetrahedral;
    let generators = generators_from_axes(
        &kind,
        &Vector3::new(1.0, 1.0, 1.0).normalize(),
        Some(&Vector3::new(1.0, -1.0, -1.0).normalize()),
    )
    .unwrap();
    let (rotations, closed) = close_group(&generators, 0.1, 10);
    assert!(closed);
    assert_eq!(rotations.len(), 12);
    let motif = [
        GaussianBlob {
            centre: Vector3::new(5.0, 2.0, 1.0),
            height: 1.0,
            sigma: 1.5,
        },
        GaussianBlob {
            centre: Vector3::new(1.5, 4.5, -2.5),
            height: 0.7,
            sigma: 1.5,
        },
    ];
    let structure = structure_from("t", &motif, rotations.elements());
    let params = test_params()
        .to_builder()
        .write_group_elements(true)
        .build()
        .unwrap();
    let result = detect_structure_symmetry(&structure, &params, None).unwrap();
    assert_eq!(result.recommendation.kind(), Some(PointGroupKind::Tetrahedral));
    assert_eq!(result.recommendation.axes().len(), 7);
    assert!(!result.t_axes().is_empty());
    assert!(result.o_axes().is_empty());
    match result.group_elements.as_ref() {
        Some(GroupElementOutcome::Complete(set)) => assert_eq!(set.len(), 12),
        other => panic!("Unexpected group elements: {other:?}"),
    }
}
