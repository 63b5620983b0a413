use approx::assert_relative_eq;

use crate::auxiliary::interpolation::{bicubic, catmull_rom, tricubic};

#[test]
fn test_catmull_rom_endpoints_and_quadratics() {
    let p = [1.0, 2.0, -0.5, 4.0];
    assert_relative_eq!(catmull_rom(&p, 0.0), 2.0);
    assert_relative_eq!(catmull_rom(&p, 1.0), -0.5, epsilon = 1e-14);

    // Catmull–Rom reproduces quadratics exactly.
    let f = |x: f64| 0.3 * x * x - 1.2 * x + 0.7;
    let p = [f(-1.0), f(0.0), f(1.0), f(2.0)];
    for t in [0.1, 0.25, 0.5, 0.9] {
        assert_relative_eq!(catmull_rom(&p, t), f(t), epsilon = 1e-12);
    }
}

#[test]
fn test_bicubic_reproduces_bilinear_function() {
    let f = |x: f64, y: f64| 1.0 + 2.0 * x - 0.5 * y + 0.25 * x * y;
    let mut patch = [[0.0; 4]; 4];
    for (i, row) in patch.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = f(i as f64 - 1.0, j as f64 - 1.0);
        }
    }
    assert_relative_eq!(bicubic(&patch, 0.3, 0.8), f(0.3, 0.8), epsilon = 1e-12);
    assert_relative_eq!(bicubic(&patch, 0.0, 0.0), f(0.0, 0.0), epsilon = 1e-12);
}

#[test]
fn test_tricubic_on_lattice_and_between() {
    let f = |i: isize, j: isize, k: isize| (i * i) as f64 + 2.0 * j as f64 - (k * j) as f64;
    assert_relative_eq!(tricubic(f, [2.0, -1.0, 3.0]), f(2, -1, 3), epsilon = 1e-12);
    let expected = 1.5 * 1.5 + 2.0 * 0.25 - 0.75 * 0.25;
    assert_relative_eq!(tricubic(f, [1.5, 0.25, 0.75]), expected, epsilon = 1e-12);
}
