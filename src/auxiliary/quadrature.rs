//! Gauss–Legendre quadrature.

use std::f64::consts::PI;

#[cfg(test)]
#[path = "quadrature_tests.rs"]
mod quadrature_tests;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// A set of Gauss–Legendre nodes and weights on an interval.
#[derive(Clone, Debug)]
pub struct GaussLegendre {
    /// The nodes, in ascending order.
    pub nodes: Vec<f64>,

    /// The weights associated with [`Self::nodes`].
    pub weights: Vec<f64>,
}

impl GaussLegendre {
    /// Computes the `n`-point Gauss–Legendre rule on $`[-1, 1]`$.
    ///
    /// The nodes are the roots of the Legendre polynomial $`P_n`$, located by Newton iterations
    /// starting from the asymptotic estimate $`\cos(\pi (i + 3/4) / (n + 1/2))`$.
    ///
    /// # Arguments
    ///
    /// * `n` - The number of nodes. Must be positive.
    ///
    /// # Returns
    ///
    /// The quadrature rule, exact for polynomials of degree up to $`2n - 1`$.
    #[must_use]
    pub fn new(n: usize) -> Self {
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        #[allow(clippy::cast_precision_loss)]
        let nf = n as f64;
        for i in 0..(n + 1) / 2 {
            #[allow(clippy::cast_precision_loss)]
            let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
            let mut dp = 1.0;
            for _ in 0..MAX_NEWTON_ITERATIONS {
                let (p, dp_z) = legendre_with_derivative(n, z);
                dp = dp_z;
                let z_prev = z;
                z = z_prev - p / dp;
                if (z - z_prev).abs() < 1e-15 {
                    break;
                }
            }
            let (_, dp_z) = legendre_with_derivative(n, z);
            if dp_z.is_finite() {
                dp = dp_z;
            }
            let w = 2.0 / ((1.0 - z * z) * dp * dp);
            nodes[i] = -z;
            nodes[n - 1 - i] = z;
            weights[i] = w;
            weights[n - 1 - i] = w;
        }
        Self { nodes, weights }
    }

    /// Computes the `n`-point Gauss–Legendre rule on $`[a, b]`$.
    #[must_use]
    pub fn on_interval(n: usize, a: f64, b: f64) -> Self {
        let reference = Self::new(n);
        let half_width = 0.5 * (b - a);
        let mid = 0.5 * (a + b);
        Self {
            nodes: reference
                .nodes
                .iter()
                .map(|x| mid + half_width * x)
                .collect(),
            weights: reference.weights.iter().map(|w| w * half_width).collect(),
        }
    }

    /// Returns the number of nodes in this rule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks if this rule has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Integrates a function with this rule.
    pub fn integrate<F>(&self, f: F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        self.nodes
            .iter()
            .zip(self.weights.iter())
            .map(|(&x, &w)| w * f(x))
            .sum()
    }
}

/// Evaluates $`P_n(x)`$ and $`P_n'(x)`$ by the three-term recurrence.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 0.0;
    let mut p = 1.0;
    for j in 1..=n {
        #[allow(clippy::cast_precision_loss)]
        let jf = j as f64;
        let p_next = ((2.0 * jf - 1.0) * x * p - (jf - 1.0) * p_prev) / jf;
        p_prev = p;
        p = p_next;
    }
    #[allow(clippy::cast_precision_loss)]
    let dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
    (p, dp)
}
