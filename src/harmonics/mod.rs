//! Spherical-harmonic decomposition of sampled shells.
//!
//! The harmonics are the orthonormal complex spherical harmonics with the Condon–Shortley phase,
//!
//! ```math
//! Y_l^m(\theta, \phi) = \tilde{P}_l^m(\cos\theta)\, e^{i m \phi},
//! \qquad
//! \int Y_l^m \, \overline{Y_{l'}^{m'}} \, \mathrm{d}\Omega = \delta_{ll'} \delta_{mm'},
//! ```
//!
//! where $`\tilde{P}_l^m`$ are the normalised associated Legendre functions.

use std::f64::consts::PI;

use log;
use ndarray::Array2;
use num_complex::Complex64;
use num_traits::Zero;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::error::{checked_size, try_filled_vec, MapSymError, EA_SIZE_OVERFLOW};
use crate::sampling::SphericalShell;

#[cfg(test)]
#[path = "harmonics_tests.rs"]
mod harmonics_tests;

// =================
// Legendre function
// =================

/// Returns the index of $`(l, m)`$ with $`0 \le m \le l`$ in a triangular table.
#[must_use]
pub fn triangular_index(l: usize, m: usize) -> usize {
    l * (l + 1) / 2 + m
}

/// Tabulates the normalised associated Legendre functions $`\tilde{P}_l^m(x)`$ for
/// $`0 \le m \le l < \textrm{bandwidth}`$.
///
/// The stable recurrences used are
///
/// ```math
/// \tilde{P}_0^0 = \frac{1}{\sqrt{4\pi}}, \quad
/// \tilde{P}_m^m = -\sqrt{\frac{2m + 1}{2m}} \sqrt{1 - x^2}\, \tilde{P}_{m-1}^{m-1}, \quad
/// \tilde{P}_{m+1}^m = x \sqrt{2m + 3}\, \tilde{P}_m^m,
/// ```
///
/// ```math
/// \tilde{P}_l^m = a_l^m \left( x \tilde{P}_{l-1}^m - b_l^m \tilde{P}_{l-2}^m \right), \quad
/// a_l^m = \sqrt{\frac{4l^2 - 1}{l^2 - m^2}}, \quad
/// b_l^m = \sqrt{\frac{(l - 1)^2 - m^2}{4(l - 1)^2 - 1}}.
/// ```
///
/// # Returns
///
/// The values, laid out according to [`triangular_index`].
#[must_use]
pub fn normalised_legendre(bandwidth: usize, x: f64) -> Vec<f64> {
    let mut table = vec![0.0; triangular_index(bandwidth, 0)];
    if bandwidth == 0 {
        return table;
    }
    let sin_theta = (1.0 - x * x).max(0.0).sqrt();
    let mut p_mm = 1.0 / (4.0 * PI).sqrt();
    for m in 0..bandwidth {
        #[allow(clippy::cast_precision_loss)]
        let mf = m as f64;
        if m > 0 {
            p_mm *= -((2.0 * mf + 1.0) / (2.0 * mf)).sqrt() * sin_theta;
        }
        table[triangular_index(m, m)] = p_mm;
        if m + 1 < bandwidth {
            table[triangular_index(m + 1, m)] = x * (2.0 * mf + 3.0).sqrt() * p_mm;
        }
        for l in (m + 2)..bandwidth {
            #[allow(clippy::cast_precision_loss)]
            let lf = l as f64;
            let a = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
            let b = (((lf - 1.0) * (lf - 1.0) - mf * mf) / (4.0 * (lf - 1.0) * (lf - 1.0) - 1.0))
                .sqrt();
            table[triangular_index(l, m)] = a
                * (x * table[triangular_index(l - 1, m)] - b * table[triangular_index(l - 2, m)]);
        }
    }
    table
}

// ==================
// Struct definitions
// ==================

/// Complex spherical-harmonic coefficients of every shell of one structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicCoefficients {
    /// The global bandwidth $`B`$; degrees run over $`0 \le l < B`$.
    bandwidth: usize,

    /// The radius of each shell.
    radii: Vec<f64>,

    /// The coefficients, indexed as `[shell, l² + l + m]`.
    coefficients: Array2<Complex64>,
}

impl HarmonicCoefficients {
    /// Returns the index of $`(l, m)`$ in the flattened degree-order layout.
    #[must_use]
    pub fn lm_index(l: usize, m: i64) -> usize {
        let base = l * l + l;
        if m >= 0 {
            base + usize::try_from(m).unwrap_or(0)
        } else {
            base - usize::try_from(-m).unwrap_or(0)
        }
    }

    /// Returns the global bandwidth.
    #[must_use]
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    /// Returns the shell radii.
    #[must_use]
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Returns the number of shells.
    #[must_use]
    pub fn n_shells(&self) -> usize {
        self.radii.len()
    }

    /// Returns the coefficient $`c_{lm}`$ of a shell.
    #[must_use]
    pub fn get(&self, shell: usize, l: usize, m: i64) -> Complex64 {
        self.coefficients[(shell, Self::lm_index(l, m))]
    }

    /// Returns the power $`\sum_m |c_{lm}|^2`$ of a degree on a shell.
    #[must_use]
    pub fn degree_power(&self, shell: usize, l: usize) -> f64 {
        (0..=2 * l)
            .map(|i| self.coefficients[(shell, l * l + i)].norm_sqr())
            .sum()
    }
}

// =========
// Functions
// =========

/// Computes the spherical-harmonic coefficients of every shell.
///
/// For each shell of bandwidth $`b`$, the longitude sums are forward FFTs of the rings, and
///
/// ```math
/// c_{lm} = \frac{2\pi}{N_\phi} \sum_j w_j \tilde{P}_l^m(x_j) F_m(x_j), \qquad m \ge 0,
/// ```
///
/// with the negative orders filled in by the conjugate symmetry
/// $`c_{l,-m} = (-1)^m \overline{c_{lm}}`$ of real-valued input. Degrees $`l \ge b`$ are zero.
///
/// # Arguments
///
/// * `shells` - The sampled shells, ordered by radius.
/// * `bandwidth` - The global bandwidth $`B`$; no shell may exceed it.
///
/// # Errors
///
/// Errors if the coefficient buffer cannot be allocated.
pub fn compute_harmonics(
    shells: &[SphericalShell],
    bandwidth: usize,
) -> Result<HarmonicCoefficients, MapSymError> {
    log::debug!("Computing spherical harmonics up to bandwidth {bandwidth}...");
    let n_lm = checked_size(&[bandwidth, bandwidth], "the harmonic degree-order layout")?;
    let n_total = checked_size(&[shells.len(), n_lm], "the harmonic coefficient buffer")?;
    let buffer = try_filled_vec(n_total, Complex64::zero(), "harmonic coefficients")?;
    let mut coefficients = Array2::from_shape_vec((shells.len(), n_lm), buffer).map_err(|err| {
        MapSymError::allocation(
            EA_SIZE_OVERFLOW,
            format!("Unable to shape the harmonic coefficient buffer: {err}."),
        )
    })?;

    let mut planner = FftPlanner::<f64>::new();
    for (s, shell) in shells.iter().enumerate() {
        let b = shell.bandwidth.min(bandwidth);
        let n_phi = shell.n_phi();
        let fft = planner.plan_fft_forward(n_phi);
        let mut ring = vec![Complex64::zero(); n_phi];
        #[allow(clippy::cast_precision_loss)]
        let dphi = 2.0 * PI / n_phi as f64;

        // Accumulate the non-negative orders only.
        let mut accum = vec![Complex64::zero(); triangular_index(b, 0)];
        for (j, (&x, &w)) in shell
            .colatitudes
            .nodes
            .iter()
            .zip(shell.colatitudes.weights.iter())
            .enumerate()
        {
            ring.iter_mut()
                .zip(shell.values.row(j).iter())
                .for_each(|(c, &v)| *c = Complex64::new(v, 0.0));
            fft.process(&mut ring);
            let legendre = normalised_legendre(b, x);
            for l in 0..b {
                for m in 0..=l {
                    let idx = triangular_index(l, m);
                    accum[idx] += ring[m] * (w * legendre[idx] * dphi);
                }
            }
        }

        for l in 0..b {
            for m in 0..=l {
                let c = accum[triangular_index(l, m)];
                let mi = i64::try_from(m).unwrap_or(i64::MAX);
                coefficients[(s, HarmonicCoefficients::lm_index(l, mi))] = c;
                if m > 0 {
                    let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
                    coefficients[(s, HarmonicCoefficients::lm_index(l, -mi))] = c.conj() * sign;
                }
            }
        }
    }
    log::debug!("Computing spherical harmonics up to bandwidth {bandwidth}... Done.");

    Ok(HarmonicCoefficients {
        bandwidth,
        radii: shells.iter().map(|shell| shell.radius).collect(),
        coefficients,
    })
}
