//! Local cubic interpolation on regular grids.

#[cfg(test)]
#[path = "interpolation_tests.rs"]
mod interpolation_tests;

/// Interpolates between `p[1]` and `p[2]` with the Catmull–Rom cubic through four equally spaced
/// samples.
///
/// # Arguments
///
/// * `p` - Four consecutive samples.
/// * `t` - The fractional position between `p[1]` ($`t = 0`$) and `p[2]` ($`t = 1`$).
///
/// # Returns
///
/// The interpolated value.
#[must_use]
pub fn catmull_rom(p: &[f64; 4], t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p[1]
        + (-p[0] + p[2]) * t
        + (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]) * t2
        + (-p[0] + 3.0 * p[1] - 3.0 * p[2] + p[3]) * t3)
}

/// Interpolates a $`4 \times 4`$ patch of samples bicubically.
///
/// `patch[i][j]` is the sample at offset $`(i - 1, j - 1)`$ from the lower corner of the central
/// cell, and $`(s, t) \in [0, 1]^2`$ locates the target point inside that cell.
#[must_use]
pub fn bicubic(patch: &[[f64; 4]; 4], s: f64, t: f64) -> f64 {
    let rows = [
        catmull_rom(&patch[0], t),
        catmull_rom(&patch[1], t),
        catmull_rom(&patch[2], t),
        catmull_rom(&patch[3], t),
    ];
    catmull_rom(&rows, s)
}

/// Interpolates tricubically a scalar field sampled on an integer lattice.
///
/// # Arguments
///
/// * `sample` - Accessor returning the lattice value at integer indices. It is responsible for
/// any periodic or reflective extension of the lattice.
/// * `position` - Fractional lattice coordinates of the target point.
///
/// # Returns
///
/// The interpolated value.
pub fn tricubic<F>(sample: F, position: [f64; 3]) -> f64
where
    F: Fn(isize, isize, isize) -> f64,
{
    #[allow(clippy::cast_possible_truncation)]
    let base = position.map(|x| x.floor() as isize);
    #[allow(clippy::cast_precision_loss)]
    let frac = [
        position[0] - base[0] as f64,
        position[1] - base[1] as f64,
        position[2] - base[2] as f64,
    ];
    let mut planes = [0.0; 4];
    for (di, plane) in planes.iter_mut().enumerate() {
        let mut rows = [0.0; 4];
        for (dj, row) in rows.iter_mut().enumerate() {
            let mut line = [0.0; 4];
            for (dk, value) in line.iter_mut().enumerate() {
                *value = sample(
                    base[0] + di as isize - 1,
                    base[1] + dj as isize - 1,
                    base[2] + dk as isize - 1,
                );
            }
            *row = catmull_rom(&line, frac[2]);
        }
        *plane = catmull_rom(&rows, frac[1]);
    }
    catmull_rom(&planes, frac[0])
}
