use approx::assert_relative_eq;

use crate::rotfun::wigner::{ln_factorial_table, WignerSmallD};

fn table(bandwidth: usize, beta: f64) -> WignerSmallD {
    let ln_fact = ln_factorial_table(2 * bandwidth);
    WignerSmallD::compute(bandwidth, beta, &ln_fact)
}

#[test]
fn test_wigner_identity_at_zero() {
    let d = table(6, 0.0);
    for l in 0..6usize {
        let li = l as i64;
        for mp in -li..=li {
            for m in -li..=li {
                let expected = if mp == m { 1.0 } else { 0.0 };
                assert_relative_eq!(d.get(l, mp, m), expected, epsilon = 1e-13);
            }
        }
    }
}

#[test]
fn test_wigner_closed_forms() {
    let beta = 0.83f64;
    let (s, c) = beta.sin_cos();
    let d = table(4, beta);
    assert_relative_eq!(d.get(0, 0, 0), 1.0);
    assert_relative_eq!(d.get(1, 0, 0), c, epsilon = 1e-14);
    assert_relative_eq!(d.get(1, 1, 0), -s / 2.0f64.sqrt(), epsilon = 1e-14);
    assert_relative_eq!(d.get(1, -1, 0), s / 2.0f64.sqrt(), epsilon = 1e-14);
    assert_relative_eq!(d.get(1, 1, 1), 0.5 * (1.0 + c), epsilon = 1e-14);
    assert_relative_eq!(d.get(1, 1, -1), 0.5 * (1.0 - c), epsilon = 1e-14);
    assert_relative_eq!(d.get(2, 0, 0), 0.5 * (3.0 * c * c - 1.0), epsilon = 1e-14);
    assert_relative_eq!(d.get(2, 2, 0), (3.0f64 / 8.0).sqrt() * s * s, epsilon = 1e-14);
    assert_relative_eq!(d.get(2, 1, 1), 0.5 * (1.0 + c) * (2.0 * c - 1.0), epsilon = 1e-14);
    assert_relative_eq!(d.get(2, 3, 0), 0.0);
    assert_relative_eq!(d.get(5, 0, 0), 0.0);
}

#[test]
fn test_wigner_symmetry_and_orthogonality() {
    for &(bandwidth, beta) in &[(8usize, 0.4f64), (8, 2.9), (64, 1.3), (64, 3.0)] {
        let d = table(bandwidth, beta);
        for &l in &[1usize, bandwidth / 2, bandwidth - 1] {
            let li = l as i64;
            for mp in [-li, -1, 0, li / 2, li] {
                for m in [-li, 0, 1, li] {
                    let sign = if (m - mp).rem_euclid(2) == 0 { 1.0 } else { -1.0 };
                    assert_relative_eq!(d.get(l, mp, m), sign * d.get(l, m, mp), epsilon = 1e-10);
                }
                for mpp in [-li, 0, li] {
                    let overlap: f64 = (-li..=li).map(|m| d.get(l, mp, m) * d.get(l, mpp, m)).sum();
                    let expected = if mp == mpp { 1.0 } else { 0.0 };
                    assert_relative_eq!(overlap, expected, epsilon = 1e-9);
                }
            }
        }
    }
}
