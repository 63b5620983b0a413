//! Geometrical objects and manipulations on rotation axes and rotation matrices.

use std::f64::consts::PI;

use approx;
use nalgebra::{Matrix3, Rotation3, UnitVector3, Vector3};

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod geometry_tests;

// =================
// Utility functions
// =================

/// Returns the rotation angle adjusted to be in the interval $`(-\pi, +\pi]`$.
///
/// # Arguments
///
/// * `rot_ang` - A rotation angle.
///
/// # Returns
///
/// The normalised rotation angle.
#[must_use]
pub fn normalise_rotation_angle(rot_ang: f64) -> f64 {
    let wrapped = rot_ang.rem_euclid(2.0 * PI);
    if wrapped > PI {
        wrapped - 2.0 * PI
    } else {
        wrapped
    }
}

/// Determines the order $`n`$ of the smallest cyclic group $`\mathcal{C}_n`$ containing a
/// rotation through `angle`, *i.e.* the smallest $`n`$ such that `angle` is $`2\pi k/n`$ for some
/// integer $`k`$.
///
/// # Arguments
///
/// * `angle` - An angle of rotation.
/// * `thresh` - A threshold for checking if a floating point number is integral.
/// * `max_order` - Maximum order $`n`$ to try.
///
/// # Returns
///
/// The order, or `None` if `angle` is not a rational multiple of $`2\pi`$ with a denominator not
/// exceeding `max_order`.
#[must_use]
pub fn rotation_order(angle: f64, thresh: f64, max_order: u32) -> Option<u32> {
    let fraction = normalise_rotation_angle(angle).abs() / (2.0 * PI);
    if fraction < thresh {
        return Some(1);
    }
    let mut order: u32 = 1;
    while approx::relative_ne!(
        fraction * f64::from(order),
        (fraction * f64::from(order)).round(),
        max_relative = thresh,
        epsilon = thresh
    ) && order < max_order
    {
        order += 1;
    }
    if approx::relative_eq!(
        fraction * f64::from(order),
        (fraction * f64::from(order)).round(),
        max_relative = thresh,
        epsilon = thresh
    ) {
        Some(order)
    } else {
        None
    }
}

/// Returns a $`3 \times 3`$ rotation matrix in $`\mathbb{R}^3`$ corresponding to a rotation
/// through `angle` about `axis` raised to the power `power`.
///
/// # Arguments
///
/// * `angle` - The angle of rotation.
/// * `axis` - The axis of rotation.
/// * `power` - The power of rotation.
///
/// # Returns
///
/// The rotation matrix.
#[must_use]
pub fn proper_rotation_matrix(angle: f64, axis: &Vector3<f64>, power: i8) -> Matrix3<f64> {
    let normalised_axis = UnitVector3::new_normalize(*axis);
    Rotation3::from_axis_angle(&normalised_axis, (f64::from(power)) * angle).into_inner()
}

/// Returns the rotation matrix $`R_z(\alpha) R_y(\beta) R_z(\gamma)`$ for a set of Euler angles
/// in the $`zyz`$ convention.
#[must_use]
pub fn rotation_from_zyz(alpha: f64, beta: f64, gamma: f64) -> Matrix3<f64> {
    let rz_alpha = Rotation3::from_axis_angle(&Vector3::z_axis(), alpha);
    let ry_beta = Rotation3::from_axis_angle(&Vector3::y_axis(), beta);
    let rz_gamma = Rotation3::from_axis_angle(&Vector3::z_axis(), gamma);
    (rz_alpha * ry_beta * rz_gamma).into_inner()
}

/// Extracts the $`zyz`$ Euler angles of a rotation matrix.
///
/// # Arguments
///
/// * `rotation` - A proper rotation matrix.
///
/// # Returns
///
/// The triple $`(\alpha, \beta, \gamma)`$ with $`\alpha, \gamma \in [0, 2\pi)`$ and
/// $`\beta \in [0, \pi]`$. At the gimbal poles ($`\beta = 0`$ or $`\pi`$) the whole rotation about
/// $`z`$ is assigned to $`\alpha`$ and $`\gamma`$ is zero.
#[must_use]
pub fn zyz_from_rotation(rotation: &Matrix3<f64>) -> (f64, f64, f64) {
    let cos_beta = rotation[(2, 2)].clamp(-1.0, 1.0);
    let beta = cos_beta.acos();
    let sin_beta = beta.sin();
    let (alpha, gamma) = if sin_beta > 1e-10 {
        (
            rotation[(1, 2)].atan2(rotation[(0, 2)]),
            rotation[(2, 1)].atan2(-rotation[(2, 0)]),
        )
    } else if cos_beta > 0.0 {
        (rotation[(1, 0)].atan2(rotation[(0, 0)]), 0.0)
    } else {
        ((-rotation[(0, 1)]).atan2(rotation[(1, 1)]), 0.0)
    };
    (alpha.rem_euclid(2.0 * PI), beta, gamma.rem_euclid(2.0 * PI))
}

/// Extracts the rotation angle in $`[0, \pi]`$ and the unit axis of a proper rotation matrix.
///
/// The axis is read off the antisymmetric part of the matrix, except close to half-turns where
/// that part vanishes and the symmetric part $`\cos\theta\, I + (1 - \cos\theta)\,
/// \hat{n}\hat{n}^{\mathsf{T}}`$ is used instead. For the identity, the axis is $`z`$.
#[must_use]
pub fn angle_axis_from_rotation(rotation: &Matrix3<f64>) -> (f64, Vector3<f64>) {
    let cos_angle = (0.5 * (rotation.trace() - 1.0)).clamp(-1.0, 1.0);
    let angle = cos_angle.acos();
    let skew = Vector3::new(
        rotation[(2, 1)] - rotation[(1, 2)],
        rotation[(0, 2)] - rotation[(2, 0)],
        rotation[(1, 0)] - rotation[(0, 1)],
    );
    if angle < 1e-10 {
        return (0.0, Vector3::z());
    }
    if angle.sin() > 1e-3 {
        return (angle, skew.normalize());
    }
    let nnt = ((rotation + rotation.transpose()) * 0.5 - Matrix3::identity() * cos_angle)
        / (1.0 - cos_angle);
    let (best, _) = (0..3).fold((0, f64::MIN), |(best, best_diag), i| {
        if nnt[(i, i)] > best_diag {
            (i, nnt[(i, i)])
        } else {
            (best, best_diag)
        }
    });
    let mut axis = nnt.column(best).into_owned().normalize();
    if axis.dot(&skew) < 0.0 {
        axis = -axis;
    }
    (angle, axis)
}

/// Returns the standard positive pole of a rotation axis.
///
/// The standard positive hemisphere contains every vector with $`z > 0`$, the half-circle on the
/// $`xy`$-plane with $`x > 0`$, and the positive $`y`$-axis.
///
/// # Arguments
///
/// * `axis` - An axis of rotation.
/// * `thresh` - Threshold for comparisons.
///
/// # Returns
///
/// The normalised positive pole of `axis`.
#[must_use]
pub fn get_standard_positive_pole(axis: &Vector3<f64>, thresh: f64) -> Vector3<f64> {
    let normalised_axis = axis.normalize();
    if check_standard_positive_pole(&normalised_axis, thresh) {
        normalised_axis
    } else {
        -normalised_axis
    }
}

/// Checks if a rotation axis is in the standard positive hemisphere.
#[must_use]
pub fn check_standard_positive_pole(axis: &Vector3<f64>, thresh: f64) -> bool {
    let normalised_axis = axis.normalize();
    if normalised_axis.z > thresh {
        true
    } else if normalised_axis.z < -thresh {
        false
    } else if normalised_axis.x > thresh {
        true
    } else if normalised_axis.x < -thresh {
        false
    } else {
        normalised_axis.y > 0.0
    }
}

/// Checks if two axes represent the same line through the origin, *i.e.* if the absolute value of
/// their dot product exceeds $`1 - \textrm{tolerance}`$.
#[must_use]
pub fn axes_equivalent(axis_a: &Vector3<f64>, axis_b: &Vector3<f64>, tolerance: f64) -> bool {
    axis_a.normalize().dot(&axis_b.normalize()).abs() > 1.0 - tolerance
}

/// Returns a unit vector perpendicular to `axis` together with the one completing a right-handed
/// frame.
#[must_use]
pub fn orthonormal_complement(axis: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let n = axis.normalize();
    let trial = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = (trial - n * n.dot(&trial)).normalize();
    let w = n.cross(&u);
    (u, w)
}

/// Rotates `axis_b` within the plane it spans with `axis_a` so that the two axes subtend exactly
/// the angle whose cosine is `target_cos`. The sign of `axis_b` is first chosen to make the dot
/// product non-negative.
///
/// # Returns
///
/// The idealised second axis, or `None` if the two axes are parallel.
#[must_use]
pub fn idealise_axis_pair(
    axis_a: &Vector3<f64>,
    axis_b: &Vector3<f64>,
    target_cos: f64,
) -> Option<Vector3<f64>> {
    let a = axis_a.normalize();
    let mut b = axis_b.normalize();
    if a.dot(&b) < 0.0 {
        b = -b;
    }
    let perp = b - a * a.dot(&b);
    if perp.norm() < 1e-10 {
        return None;
    }
    let target_cos = target_cos.clamp(0.0, 1.0);
    Some(a * target_cos + perp.normalize() * (1.0 - target_cos * target_cos).sqrt())
}

/// Generates a quasi-uniform set of unit vectors covering the whole sphere using a Fibonacci
/// lattice.
///
/// # Arguments
///
/// * `n` - The number of points.
///
/// # Returns
///
/// The unit vectors, ordered from the north pole to the south pole.
#[must_use]
pub fn fibonacci_sphere(n: usize) -> Vec<Vector3<f64>> {
    let golden_angle = PI * (3.0 - 5.0f64.sqrt());
    #[allow(clippy::cast_precision_loss)]
    let nf = n as f64;
    (0..n)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let i_f = i as f64;
            let z = 1.0 - (2.0 * i_f + 1.0) / nf;
            let rho = (1.0 - z * z).max(0.0).sqrt();
            let phi = golden_angle * i_f;
            Vector3::new(rho * phi.cos(), rho * phi.sin(), z)
        })
        .collect()
}

/// Computes the Frobenius distance between two $`3 \times 3`$ matrices.
#[must_use]
pub fn frobenius_distance(mat_a: &Matrix3<f64>, mat_b: &Matrix3<f64>) -> f64 {
    (mat_a - mat_b).norm()
}
