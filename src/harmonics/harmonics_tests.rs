use std::f64::consts::PI;

use approx::assert_relative_eq;
use ndarray::{Array2, Array3};

use crate::auxiliary::quadrature::GaussLegendre;
use crate::harmonics::{compute_harmonics, normalised_legendre, triangular_index, HarmonicCoefficients};
use crate::map::VolumeMap;
use crate::sampling::SphericalShell;

fn analytic_shell(bandwidth: usize, f: impl Fn(f64, f64) -> f64) -> SphericalShell {
    let n_theta = 2 * bandwidth;
    let n_phi = 2 * bandwidth + 2;
    let colatitudes = GaussLegendre::new(n_theta);
    let values = Array2::from_shape_fn((n_theta, n_phi), |(j, k)| {
        let theta = colatitudes.nodes[j].acos();
        let phi = 2.0 * PI * k as f64 / n_phi as f64;
        f(theta, phi)
    });
    SphericalShell {
        radius: 1.0,
        bandwidth,
        colatitudes,
        values,
    }
}

#[test]
fn test_normalised_legendre_closed_forms() {
    let x = 0.3f64;
    let s = (1.0 - x * x).sqrt();
    let table = normalised_legendre(4, x);
    assert_eq!(table.len(), 10);
    assert_relative_eq!(table[triangular_index(0, 0)], 1.0 / (4.0 * PI).sqrt(), epsilon = 1e-14);
    assert_relative_eq!(
        table[triangular_index(1, 0)],
        (3.0 / (4.0 * PI)).sqrt() * x,
        epsilon = 1e-14
    );
    assert_relative_eq!(
        table[triangular_index(1, 1)],
        -(3.0 / (8.0 * PI)).sqrt() * s,
        epsilon = 1e-14
    );
    assert_relative_eq!(
        table[triangular_index(2, 0)],
        (5.0 / (16.0 * PI)).sqrt() * (3.0 * x * x - 1.0),
        epsilon = 1e-14
    );
    assert_relative_eq!(
        table[triangular_index(2, 2)],
        (15.0 / (32.0 * PI)).sqrt() * s * s,
        epsilon = 1e-14
    );
}

#[test]
fn test_normalised_legendre_orthonormality() {
    let bandwidth = 12;
    let rule = GaussLegendre::new(2 * bandwidth);
    let tables: Vec<Vec<f64>> = rule
        .nodes
        .iter()
        .map(|&x| normalised_legendre(bandwidth, x))
        .collect();
    for m in [0, 3, 7] {
        for l1 in m..bandwidth {
            for l2 in m..bandwidth {
                let overlap: f64 = 2.0
                    * PI
                    * rule
                        .weights
                        .iter()
                        .zip(tables.iter())
                        .map(|(w, t)| w * t[triangular_index(l1, m)] * t[triangular_index(l2, m)])
                        .sum::<f64>();
                let expected = if l1 == l2 { 1.0 } else { 0.0 };
                assert_relative_eq!(overlap, expected, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_harmonics_of_analytic_shells() {
    let shells = vec![
        analytic_shell(6, |_, _| 1.0),
        analytic_shell(6, |theta, _| theta.cos()),
        analytic_shell(6, |theta, phi| theta.sin() * phi.cos()),
    ];
    let coeffs = compute_harmonics(&shells, 8).unwrap();
    assert_eq!(coeffs.n_shells(), 3);
    assert_eq!(coeffs.bandwidth(), 8);

    assert_relative_eq!(coeffs.get(0, 0, 0).re, (4.0 * PI).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(coeffs.degree_power(0, 1), 0.0, epsilon = 1e-24);

    assert_relative_eq!(coeffs.get(1, 1, 0).re, (4.0 * PI / 3.0).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(coeffs.get(1, 0, 0).norm(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(coeffs.get(1, 1, 1).norm(), 0.0, epsilon = 1e-12);

    let c11 = coeffs.get(2, 1, 1);
    let c1m1 = coeffs.get(2, 1, -1);
    assert_relative_eq!(c11.re, -(2.0 * PI / 3.0).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(c11.im, 0.0, epsilon = 1e-12);
    assert_relative_eq!(c1m1.re, (2.0 * PI / 3.0).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(coeffs.degree_power(2, 2), 0.0, epsilon = 1e-20);

    // Degrees beyond the shell bandwidth are never populated.
    assert_relative_eq!(coeffs.degree_power(0, 7), 0.0);
}

#[test]
fn test_harmonics_of_constant_map() {
    let map = VolumeMap::new(Array3::<f64>::from_elem((16, 16, 16), 2.0), [16.0; 3]).unwrap();
    let shell = SphericalShell::sample(&map, 4.0, 5);
    let coeffs = compute_harmonics(&[shell], 5).unwrap();
    assert_relative_eq!(coeffs.get(0, 0, 0).re, 2.0 * (4.0 * PI).sqrt(), epsilon = 1e-10);
    assert_eq!(HarmonicCoefficients::lm_index(2, -2), 4);
    assert_eq!(HarmonicCoefficients::lm_index(2, 2), 8);
    for l in 1..5 {
        assert_relative_eq!(coeffs.degree_power(0, l), 0.0, epsilon = 1e-18);
    }
}
