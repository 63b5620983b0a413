//! Self-rotation function over $`SO(3)`$.
//!
//! For a real map $`f`$ with shell coefficients $`c_{lm}(r)`$, the self-rotation function is
//!
//! ```math
//! \mathcal{R}(g) \propto \int f(\mathbf{x})\, f(g^{-1}\mathbf{x})\, \mathrm{d}^3\mathbf{x}
//!     = \sum_{l \ge 1} \sum_{m'm} E^l_{m'm}\, e^{i m' \alpha}\, d^l_{m'm}(\beta)\, e^{i m \gamma},
//! \qquad
//! E^l_{m'm} = \int r^2 c_{lm'}(r) \overline{c_{lm}(r)}\, \mathrm{d}r,
//! ```
//!
//! with $`g = R_z(\alpha) R_y(\beta) R_z(\gamma)`$. The degree $`l = 0`$ is left out as it does
//! not depend on $`g`$, and the matrices are scaled so that $`\mathcal{R}(\mathbb{I}) = 1`$. On a
//! regular grid in $`\alpha`$ and $`\gamma`$, each $`\beta`$-slice is a two-dimensional inverse
//! FFT of the $`\beta`$-dependent matrix $`\sum_l E^l_{m'm} d^l_{m'm}(\beta)`$.

use std::f64::consts::PI;
use std::sync::Arc;

use log;
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array2, Array3};
use num_complex::Complex64;
use num_traits::Zero;
use rustfft::{Fft, FftPlanner};

use crate::auxiliary::geometry::{proper_rotation_matrix, zyz_from_rotation};
use crate::auxiliary::interpolation::tricubic;
use crate::auxiliary::quadrature::GaussLegendre;
use crate::error::{checked_size, try_filled_vec, MapSymError, EA_SIZE_OVERFLOW};
use crate::harmonics::HarmonicCoefficients;

pub mod wigner;

use wigner::{ln_factorial_table, WignerSmallD};


/// The largest number of grid values a rotation function may hold before oversampling is
/// reduced.
const MAX_GRID_VALUES: usize = 1 << 24;

// ==================
// Struct definitions
// ==================

// ---------
// Workspace
// ---------

/// Owned FFT plan and buffers for the two-dimensional inverse transforms of one structure.
///
/// The workspace is created for one rotation-function computation and released when it goes out of
/// scope, on success and failure paths alike.
pub struct So3TransformWorkspace {
    size: usize,
    fft: Arc<dyn Fft<f64>>,
    plane: Array2<Complex64>,
    column: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl So3TransformWorkspace {
    /// Plans the transforms and allocates the buffers for an `size` × `size` plane.
    ///
    /// # Errors
    ///
    /// Errors if the buffers cannot be allocated.
    pub fn new(size: usize) -> Result<Self, MapSymError> {
        let zero = Complex64::zero();
        let plane_len = checked_size(&[size, size], "the transform plane")?;
        let plane = Array2::from_shape_vec(
            (size, size),
            try_filled_vec(plane_len, zero, "the transform plane")?,
        )
        .map_err(|err| {
            MapSymError::allocation(
                EA_SIZE_OVERFLOW,
                format!("Unable to shape the transform plane: {err}."),
            )
        })?;
        let fft = FftPlanner::<f64>::new().plan_fft_inverse(size);
        let scratch = try_filled_vec(
            fft.get_inplace_scratch_len(),
            zero,
            "the transform scratch space",
        )?;
        let column = try_filled_vec(size, zero, "the transform column buffer")?;
        log::trace!("Acquired an SO(3) transform workspace of size {size}.");
        Ok(Self {
            size,
            fft,
            plane,
            column,
            scratch,
        })
    }

    /// Returns the side length of the transform plane.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Zeroes the plane.
    pub fn clear(&mut self) {
        self.plane.fill(Complex64::zero());
    }

    /// Returns a mutable view of the plane.
    pub fn plane_mut(&mut self) -> &mut Array2<Complex64> {
        &mut self.plane
    }

    /// Returns the plane.
    #[must_use]
    pub fn plane(&self) -> &Array2<Complex64> {
        &self.plane
    }

    /// Applies the unnormalised two-dimensional inverse FFT to the plane in place, *i.e.*
    /// $`Y_{ag} = \sum_{pq} X_{pq}\, e^{2\pi i (pa + qg)/N}`$.
    pub fn inverse_2d(&mut self) {
        let n = self.size;
        if let Some(rows) = self.plane.as_slice_mut() {
            self.fft.process_with_scratch(rows, &mut self.scratch);
        } else {
            for mut row in self.plane.rows_mut() {
                self.column
                    .iter_mut()
                    .zip(row.iter())
                    .for_each(|(c, &v)| *c = v);
                self.fft
                    .process_with_scratch(&mut self.column, &mut self.scratch);
                row.iter_mut()
                    .zip(self.column.iter())
                    .for_each(|(v, &c)| *v = c);
            }
        }
        for g in 0..n {
            for p in 0..n {
                self.column[p] = self.plane[(p, g)];
            }
            self.fft
                .process_with_scratch(&mut self.column, &mut self.scratch);
            for a in 0..n {
                self.plane[(a, g)] = self.column[a];
            }
        }
    }
}

impl Drop for So3TransformWorkspace {
    fn drop(&mut self) {
        log::trace!("Released an SO(3) transform workspace of size {}.", self.size);
    }
}

// -----------------
// Rotation function
// -----------------

/// The self-rotation function sampled on a regular Euler-angle grid.
///
/// Grid point $`(a, j, g)`$ holds $`\mathcal{R}(R_z(\alpha_a) R_y(\beta_j) R_z(\gamma_g))`$ with
/// $`\alpha_a = 2\pi a / N`$, $`\beta_j = \pi (2j + 1) / 2N`$ and $`\gamma_g = 2\pi g / N`$.
#[derive(Clone, Debug)]
pub struct RotationFunctionGrid {
    /// The harmonic bandwidth the function was computed from.
    bandwidth: usize,

    /// The number of samples along each Euler angle.
    n: usize,

    /// The sampled values, indexed as `[a, j, g]`.
    values: Array3<f64>,
}

impl RotationFunctionGrid {
    /// Computes the self-rotation function of a structure.
    ///
    /// # Arguments
    ///
    /// * `coefficients` - The shell coefficients of the structure.
    /// * `integration_order` - The order of the radial quadrature.
    /// * `oversampling` - The number of grid points per Euler angle relative to $`2B`$. It is
    /// reduced if the grid would otherwise hold more than $`2^{24}`$ values.
    ///
    /// # Errors
    ///
    /// Errors if the grid or the transform workspace cannot be allocated.
    pub fn compute(
        coefficients: &HarmonicCoefficients,
        integration_order: usize,
        oversampling: usize,
    ) -> Result<Self, MapSymError> {
        let bandwidth = coefficients.bandwidth();
        let n = grid_size(bandwidth, oversampling);
        log::debug!("Computing the self-rotation function on a {n}³ Euler-angle grid...");

        let mut correlation = radial_correlation(coefficients, integration_order);
        let total: f64 = correlation
            .iter()
            .skip(1)
            .map(|e| e.diag().iter().map(|c| c.re).sum::<f64>())
            .sum();
        if total > f64::MIN_POSITIVE {
            correlation
                .iter_mut()
                .for_each(|e| e.mapv_inplace(|c| c / total));
        } else {
            log::debug!("The map carries no angular information; the rotation function is zero.");
        }

        let n_values = checked_size(&[n, n, n], "the rotation function grid")?;
        let mut values = Array3::from_shape_vec(
            (n, n, n),
            try_filled_vec(n_values, 0.0, "the rotation function grid")?,
        )
        .map_err(|err| {
            MapSymError::allocation(
                EA_SIZE_OVERFLOW,
                format!("Unable to shape the rotation function grid: {err}."),
            )
        })?;

        let mut workspace = So3TransformWorkspace::new(n)?;
        let ln_fact = ln_factorial_table(2 * bandwidth);
        let lmax = i64::try_from(bandwidth).unwrap_or(i64::MAX) - 1;
        let ni = i64::try_from(n).unwrap_or(i64::MAX);
        let wrap = |k: i64| usize::try_from(k.rem_euclid(ni)).unwrap_or(0);
        for j in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let beta = PI * (2 * j + 1) as f64 / (2 * n) as f64;
            let wigner = WignerSmallD::compute(bandwidth, beta, &ln_fact);
            workspace.clear();
            {
                let plane = workspace.plane_mut();
                for mp in -lmax..=lmax {
                    for m in -lmax..=lmax {
                        let l_start = usize::try_from(mp.abs().max(m.abs()).max(1)).unwrap_or(1);
                        let s: Complex64 = (l_start..bandwidth)
                            .map(|l| {
                                let li = i64::try_from(l).unwrap_or(i64::MAX);
                                let row = usize::try_from(mp + li).unwrap_or(0);
                                let col = usize::try_from(m + li).unwrap_or(0);
                                correlation[l][(row, col)] * wigner.get(l, mp, m)
                            })
                            .sum();
                        plane[(wrap(mp), wrap(m))] = s;
                    }
                }
            }
            workspace.inverse_2d();
            let plane = workspace.plane();
            for a in 0..n {
                for g in 0..n {
                    values[(a, j, g)] = plane[(a, g)].re;
                }
            }
        }
        drop(workspace);
        log::debug!("Computing the self-rotation function on a {n}³ Euler-angle grid... Done.");

        Ok(Self {
            bandwidth,
            n,
            values,
        })
    }

    /// Returns the harmonic bandwidth.
    #[must_use]
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    /// Returns the number of samples along each Euler angle.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Returns the sampled values, indexed as `[a, j, g]`.
    #[must_use]
    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Returns the Euler angles of a grid point.
    #[must_use]
    pub fn euler_angles(&self, a: usize, j: usize, g: usize) -> (f64, f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let (nf, af, jf, gf) = (self.n as f64, a as f64, (2 * j + 1) as f64, g as f64);
        (2.0 * PI * af / nf, PI * jf / (2.0 * nf), 2.0 * PI * gf / nf)
    }

    /// Returns the grid value at arbitrary integer indices, extending the grid periodically in
    /// $`\alpha`$ and $`\gamma`$ and reflectively in $`\beta`$ through
    /// $`(\alpha, -\beta, \gamma) \equiv (\alpha + \pi, \beta, \gamma + \pi)`$.
    #[must_use]
    pub fn sample(&self, a: isize, j: isize, g: isize) -> f64 {
        let n = isize::try_from(self.n).unwrap_or(isize::MAX);
        let half = n / 2;
        let (mut a, mut j, mut g) = (a, j, g);
        if j < 0 {
            j = -j - 1;
            a += half;
            g += half;
        } else if j >= n {
            j = 2 * n - 1 - j;
            a += half;
            g += half;
        }
        let j = j.clamp(0, n - 1);
        let idx = |k: isize| usize::try_from(k.rem_euclid(n)).unwrap_or(0);
        self.values[(idx(a), idx(j), idx(g))]
    }

    /// Evaluates the rotation function at arbitrary Euler angles by tricubic interpolation.
    #[must_use]
    pub fn value_at_euler(&self, alpha: f64, beta: f64, gamma: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let nf = self.n as f64;
        let position = [
            alpha * nf / (2.0 * PI),
            beta * nf / PI - 0.5,
            gamma * nf / (2.0 * PI),
        ];
        tricubic(|a, j, g| self.sample(a, j, g), position)
    }

    /// Evaluates the rotation function at a rotation matrix.
    #[must_use]
    pub fn value_at_rotation(&self, rotation: &Matrix3<f64>) -> f64 {
        let (alpha, beta, gamma) = zyz_from_rotation(rotation);
        self.value_at_euler(alpha, beta, gamma)
    }

    /// Evaluates the rotation function for a rotation through `angle` about `axis`.
    #[must_use]
    pub fn value_at_axis_angle(&self, axis: &Vector3<f64>, angle: f64) -> f64 {
        self.value_at_rotation(&proper_rotation_matrix(angle, axis, 1))
    }

    /// Returns the fold-consistent height of an axis: the smallest value of the rotation function
    /// over the non-trivial rotations $`2\pi k / n`$, $`1 \le k \le \lfloor n/2 \rfloor`$.
    ///
    /// Powers beyond $`n/2`$ are the inverses of those below and carry the same value.
    #[must_use]
    pub fn fold_height(&self, axis: &Vector3<f64>, fold: u32) -> f64 {
        if fold < 2 {
            return self.value_at_rotation(&Matrix3::identity());
        }
        (1..=fold / 2)
            .map(|k| {
                self.value_at_axis_angle(axis, 2.0 * PI * f64::from(k) / f64::from(fold))
            })
            .fold(f64::INFINITY, f64::min)
    }
}

// =========
// Functions
// =========

/// Returns the number of samples per Euler angle, $`2B`$ times the oversampling factor, with the
/// factor lowered until the grid holds at most $`2^{24}`$ values.
#[must_use]
pub fn grid_size(bandwidth: usize, oversampling: usize) -> usize {
    let mut factor = oversampling.max(1);
    while factor > 1
        && (2 * bandwidth * factor)
            .checked_pow(3)
            .map_or(true, |n_values| n_values > MAX_GRID_VALUES)
    {
        factor -= 1;
    }
    2 * bandwidth * factor
}

/// Integrates the rotation-invariant products of shell coefficients over the radius.
///
/// The integral $`E^l_{m'm} = \int_0^{r_\mathrm{max}} r^2 c_{lm'}(r) \overline{c_{lm}(r)}
/// \,\mathrm{d}r`$ uses Gauss–Legendre quadrature with coefficients linearly interpolated between
/// shells and vanishing at the origin.
///
/// # Returns
///
/// One Hermitian $`(2l+1) \times (2l+1)`$ matrix per degree, indexed as `[m' + l, m + l]`.
#[must_use]
pub fn radial_correlation(
    coefficients: &HarmonicCoefficients,
    integration_order: usize,
) -> Vec<Array2<Complex64>> {
    let bandwidth = coefficients.bandwidth();
    let radii = coefficients.radii();
    let mut correlation: Vec<Array2<Complex64>> = (0..bandwidth)
        .map(|l| Array2::zeros((2 * l + 1, 2 * l + 1)))
        .collect();
    let Some(&r_max) = radii.last() else {
        return correlation;
    };
    let rule = GaussLegendre::on_interval(integration_order.max(1), 0.0, r_max);
    let mut interpolated = vec![Complex64::zero(); bandwidth * bandwidth];
    for (&r, &w) in rule.nodes.iter().zip(rule.weights.iter()) {
        // Locate the bracketing shells; below the innermost shell the coefficients fall to zero.
        let upper = radii.partition_point(|&radius| radius < r).min(radii.len() - 1);
        let (lower_weight, upper_weight) = if upper == 0 {
            (0.0, r / radii[0])
        } else {
            let t = (r - radii[upper - 1]) / (radii[upper] - radii[upper - 1]);
            (1.0 - t, t)
        };
        for l in 0..bandwidth {
            let li = i64::try_from(l).unwrap_or(i64::MAX);
            for m in -li..=li {
                let idx = HarmonicCoefficients::lm_index(l, m);
                let upper_c = coefficients.get(upper, l, m) * upper_weight;
                let lower_c = if upper == 0 {
                    Complex64::zero()
                } else {
                    coefficients.get(upper - 1, l, m) * lower_weight
                };
                interpolated[idx] = upper_c + lower_c;
            }
        }
        let weight = w * r * r;
        for (l, e) in correlation.iter_mut().enumerate().skip(1) {
            let base = l * l;
            for p in 0..(2 * l + 1) {
                let cp = interpolated[base + p] * weight;
                for q in 0..(2 * l + 1) {
                    e[(p, q)] += cp * interpolated[base + q].conj();
                }
            }
        }
    }
    correlation
}
