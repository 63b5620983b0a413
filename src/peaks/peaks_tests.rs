use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::geometry::proper_rotation_matrix;
use crate::harmonics::compute_harmonics;
use crate::map::synthetic::{render_blobs, replicate_motif, GaussianBlob};
use crate::peaks::{
    detect_peaks, folds_to_scan, iqr_threshold, local_maxima, merge_peaks, refine_peak,
    AxisLattice, AxisPeak, PeakSearchSettings,
};
use crate::rotfun::RotationFunctionGrid;
use crate::sampling::{sample_shells, ResolvedSampling, SamplingSettings};

fn c4_grid() -> RotationFunctionGrid {
    let motif = [
        GaussianBlob::cylindrical(6.0, 10.0, 4.0, 1.0, 1.5),
        GaussianBlob::cylindrical(4.0, 50.0, 6.0, 0.8, 1.5),
        GaussianBlob::cylindrical(8.0, 35.0, 3.0, 1.2, 1.5),
    ];
    let rotations: Vec<Matrix3<f64>> = (0..4)
        .map(|k| proper_rotation_matrix(f64::from(k) * PI / 2.0, &Vector3::z(), 1))
        .collect();
    let map = render_blobs(24, 1.0, &replicate_motif(&motif, &rotations)).unwrap();
    let settings = SamplingSettings {
        resolution: 3.0,
        bandwidth: 0,
        sphere_distance: 0.0,
        integration_order: 0,
        progressive: false,
    };
    let sampling = ResolvedSampling::resolve(&map, &settings).unwrap();
    let shells = sample_shells(&map, &sampling);
    let coeffs = compute_harmonics(&shells, sampling.bandwidth).unwrap();
    RotationFunctionGrid::compute(&coeffs, sampling.integration_order, 2).unwrap()
}

fn settings() -> PeakSearchSettings {
    PeakSearchSettings {
        peak_neighbours: 1,
        iqr_threshold: -999.9,
        axis_tolerance: 0.1,
        bicubic_refinement: true,
    }
}

#[test]
fn test_folds_to_scan() {
    assert_eq!(folds_to_scan(8, false), vec![2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(folds_to_scan(12, true), vec![2, 3, 5, 7, 11]);
    assert!(folds_to_scan(1, false).is_empty());
}

#[test]
fn test_local_maxima_are_strict() {
    let values = [1.0, 3.0, 2.0, 5.0, 4.0, 4.0];
    let neighbours = vec![
        vec![1],
        vec![0, 2],
        vec![1, 3],
        vec![2, 4],
        vec![3, 5],
        vec![4],
    ];
    assert_eq!(local_maxima(&values, &neighbours), vec![1, 3]);
}

#[test]
fn test_iqr_threshold() {
    let values: Vec<f64> = (1..=9).rev().map(f64::from).collect();
    assert_relative_eq!(iqr_threshold(&values, 1.5).unwrap(), 5.0 + 1.5 * 4.0);
    assert_relative_eq!(iqr_threshold(&values, 0.0).unwrap(), 5.0);
    assert!(iqr_threshold(&values, -1.0).is_none());
    assert!(iqr_threshold(&[], 1.0).is_none());
}

#[test]
fn test_axis_lattice_neighbourhoods_match_brute_force() {
    let lattice = AxisLattice::new(8, 1);
    assert_relative_eq!(lattice.spacing(), PI / 16.0);
    assert_eq!(lattice.axes().len(), (1024.0 / PI).ceil() as usize);
    let radius = 1.5 * lattice.spacing();
    for (i, a) in lattice.axes().iter().enumerate() {
        let expected: Vec<usize> = lattice
            .axes()
            .iter()
            .enumerate()
            .filter(|(j, b)| *j != i && a.dot(*b) >= radius.cos())
            .map(|(j, _)| j)
            .collect();
        assert_eq!(lattice.neighbours()[i], expected);
        assert!(expected.len() >= 3);
    }
}

#[test]
fn test_merge_peaks_is_idempotent() {
    let peaks = vec![
        AxisPeak { fold: 2, axis: Vector3::new(0.01, 0.0, -1.0).normalize(), height: 0.7 },
        AxisPeak { fold: 2, axis: Vector3::z(), height: 0.9 },
        AxisPeak { fold: 3, axis: Vector3::z(), height: 0.5 },
        AxisPeak { fold: 2, axis: -Vector3::x(), height: 0.6 },
    ];
    let merged = merge_peaks(peaks, 0.1);
    assert_eq!(merged.len(), 3);
    assert_eq!(merged[0].fold, 2);
    assert_relative_eq!(merged[0].height, 0.9);
    assert_relative_eq!(merged[1].axis, Vector3::x());
    assert_eq!(merged[2].fold, 3);
    assert_eq!(merge_peaks(merged.clone(), 0.1), merged);
}

#[test]
fn test_detect_fourfold_axis() {
    let grid = c4_grid();
    let peaks = detect_peaks(&grid, &[2, 4], &settings());
    let c4 = peaks
        .iter()
        .find(|peak| peak.fold == 4 && peak.axis.dot(&Vector3::z()).abs() > 0.99)
        .expect("No fourfold peak along z.");
    assert!(c4.height > 0.85);
    assert_relative_eq!(c4.angle(), PI / 2.0);
    assert!(peaks
        .iter()
        .any(|peak| peak.fold == 2 && peak.axis.dot(&Vector3::z()).abs() > 0.99));

    let filtered = detect_peaks(&grid, &[4], &PeakSearchSettings { iqr_threshold: 0.0, ..settings() });
    assert!(filtered
        .iter()
        .any(|peak| peak.axis.dot(&Vector3::z()).abs() > 0.99));
}

#[test]
fn test_refinement_never_lowers_a_peak() {
    let grid = c4_grid();
    let start = Vector3::new(0.06, 0.02, 1.0).normalize();
    let height = grid.value_at_axis_angle(&start, PI / 2.0);
    let (axis, refined) = refine_peak(&grid, &start, height, PI / 2.0, PI / 26.0);
    assert!(refined >= height);
    assert!(axis.dot(&Vector3::z()) >= start.dot(&Vector3::z()) - 1e-3);
    assert_relative_eq!(axis.norm(), 1.0, epsilon = 1e-12);
}
