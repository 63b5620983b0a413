use approx::assert_relative_eq;

use crate::auxiliary::quadrature::GaussLegendre;

#[test]
fn test_gauss_legendre_small_rules() {
    let rule = GaussLegendre::new(1);
    assert_eq!(rule.len(), 1);
    assert_relative_eq!(rule.nodes[0], 0.0, epsilon = 1e-14);
    assert_relative_eq!(rule.weights[0], 2.0, epsilon = 1e-14);

    let rule = GaussLegendre::new(2);
    assert_relative_eq!(rule.nodes[0], -1.0 / 3.0f64.sqrt(), epsilon = 1e-14);
    assert_relative_eq!(rule.nodes[1], 1.0 / 3.0f64.sqrt(), epsilon = 1e-14);
    assert_relative_eq!(rule.weights[0], 1.0, epsilon = 1e-14);

    let rule = GaussLegendre::new(3);
    assert_relative_eq!(rule.nodes[1], 0.0, epsilon = 1e-14);
    assert_relative_eq!(rule.nodes[2], (3.0f64 / 5.0).sqrt(), epsilon = 1e-14);
    assert_relative_eq!(rule.weights[1], 8.0 / 9.0, epsilon = 1e-14);
    assert_relative_eq!(rule.weights[2], 5.0 / 9.0, epsilon = 1e-14);
}

#[test]
fn test_gauss_legendre_exactness() {
    let rule = GaussLegendre::new(12);
    assert!(rule.nodes.windows(2).all(|w| w[0] < w[1]));
    assert_relative_eq!(rule.weights.iter().sum::<f64>(), 2.0, epsilon = 1e-13);
    assert_relative_eq!(rule.integrate(|x| x.powi(22)), 2.0 / 23.0, epsilon = 1e-13);
    assert_relative_eq!(rule.integrate(|x| x.powi(7)), 0.0, epsilon = 1e-13);

    let rule = GaussLegendre::on_interval(8, 0.0, 3.0);
    assert_relative_eq!(rule.integrate(|r| r * r), 9.0, epsilon = 1e-12);
    assert_relative_eq!(rule.integrate(|r| r.sin()), 1.0 - 3.0f64.cos(), epsilon = 1e-10);
}
