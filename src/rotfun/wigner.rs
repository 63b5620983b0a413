//! Wigner small-$`d`$ matrices.
//!
//! The convention is that of
//! $`D^l_{m'm}(\alpha, \beta, \gamma) = e^{-i m' \alpha} d^l_{m'm}(\beta) e^{-i m \gamma}`$ with
//!
//! ```math
//! d^l_{m'm}(\beta) = \sum_s (-1)^{m' - m + s}
//!     \frac{\sqrt{(l + m')! (l - m')! (l + m)! (l - m)!}}
//!          {(l + m - s)!\, s!\, (m' - m + s)!\, (l - m' - s)!}
//!     \cos^{2l + m - m' - 2s}\frac{\beta}{2} \sin^{m' - m + 2s}\frac{\beta}{2}.
//! ```
//!
//! Only the seed degree $`l = \max(|m|, |m'|)`$ is evaluated from this sum, where it reduces to a
//! single term; higher degrees follow from the three-term recurrence in $`l`$, which remains
//! stable for large degrees.

#[cfg(test)]
#[path = "wigner_tests.rs"]
mod wigner_tests;

/// Tabulated values of $`d^l_{m'm}(\beta)`$ for all $`0 \le l < \textrm{bandwidth}`$ at one
/// value of $`\beta`$.
#[derive(Clone, Debug)]
pub struct WignerSmallD {
    bandwidth: usize,
    beta: f64,
    values: Vec<f64>,
}

impl WignerSmallD {
    /// Computes the table at a given $`\beta`$.
    ///
    /// # Arguments
    ///
    /// * `bandwidth` - One more than the largest degree.
    /// * `beta` - The polar Euler angle.
    /// * `ln_factorials` - A table of $`\ln k!`$ for $`0 \le k \le 2 (\textrm{bandwidth} - 1)`$,
    /// as produced by [`ln_factorial_table`].
    #[must_use]
    pub fn compute(bandwidth: usize, beta: f64, ln_factorials: &[f64]) -> Self {
        let mut values = vec![0.0; Self::offset(bandwidth)];
        if bandwidth == 0 {
            return Self {
                bandwidth,
                beta,
                values,
            };
        }
        let cos_beta = beta.cos();
        let cos_half = (0.5 * beta).cos();
        let sin_half = (0.5 * beta).sin();
        let lmax = i64::try_from(bandwidth - 1).unwrap_or(i64::MAX);

        for mp in -lmax..=lmax {
            for m in -lmax..=lmax {
                let l0 = mp.abs().max(m.abs());
                let mut d_prev = 0.0;
                let mut d_curr = seed(l0, mp, m, cos_half, sin_half, ln_factorials);
                let l0_idx = usize::try_from(l0).unwrap_or(0);
                values[Self::index(l0_idx, mp, m)] = d_curr;
                for j in l0..lmax {
                    let jf = j as f64;
                    let mf = m as f64;
                    let mpf = mp as f64;
                    let j1 = jf + 1.0;
                    let norm_next = ((j1 * j1 - mf * mf) * (j1 * j1 - mpf * mpf)).sqrt();
                    let centre = if j == 0 { 0.0 } else { mf * mpf / (jf * j1) };
                    let a = j1 * (2.0 * jf + 1.0) / norm_next;
                    let b = if j == 0 {
                        0.0
                    } else {
                        j1 * ((jf * jf - mf * mf) * (jf * jf - mpf * mpf)).sqrt() / (jf * norm_next)
                    };
                    let d_next = a * (cos_beta - centre) * d_curr - b * d_prev;
                    d_prev = d_curr;
                    d_curr = d_next;
                    let j1_idx = usize::try_from(j + 1).unwrap_or(0);
                    values[Self::index(j1_idx, mp, m)] = d_curr;
                }
            }
        }
        Self {
            bandwidth,
            beta,
            values,
        }
    }

    /// Returns the number of table entries for all degrees below `l`.
    fn offset(l: usize) -> usize {
        // Sum of (2k + 1)^2 for k < l.
        if l == 0 {
            0
        } else {
            l * (2 * l - 1) * (2 * l + 1) / 3
        }
    }

    fn index(l: usize, mp: i64, m: i64) -> usize {
        let li = i64::try_from(l).unwrap_or(i64::MAX);
        let row = usize::try_from(mp + li).unwrap_or(0);
        let col = usize::try_from(m + li).unwrap_or(0);
        Self::offset(l) + row * (2 * l + 1) + col
    }

    /// Returns the bandwidth of the table.
    #[must_use]
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    /// Returns the value of $`\beta`$ of the table.
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns $`d^l_{m'm}(\beta)`$, which vanishes unless $`|m|, |m'| \le l`$.
    #[must_use]
    pub fn get(&self, l: usize, mp: i64, m: i64) -> f64 {
        let li = i64::try_from(l).unwrap_or(i64::MAX);
        if l >= self.bandwidth || mp.abs() > li || m.abs() > li {
            0.0
        } else {
            self.values[Self::index(l, mp, m)]
        }
    }
}

/// Tabulates $`\ln k!`$ for $`0 \le k \le n`$.
#[must_use]
pub fn ln_factorial_table(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    let mut acc = 0.0;
    table.push(acc);
    for k in 1..=n {
        acc += (k as f64).ln();
        table.push(acc);
    }
    table
}

/// Evaluates $`d^l_{m'm}(\beta)`$ from the explicit sum. Used only at $`l = \max(|m|, |m'|)`$
/// where the sum has a single term; magnitudes are combined in logarithmic form to avoid overflow
/// of the factorials.
fn seed(l: i64, mp: i64, m: i64, cos_half: f64, sin_half: f64, ln_fact: &[f64]) -> f64 {
    let lf = |k: i64| ln_fact[usize::try_from(k).unwrap_or(0)];
    let s_min = 0.max(m - mp);
    let s_max = (l + m).min(l - mp);
    let ln_prefactor = 0.5 * (lf(l + mp) + lf(l - mp) + lf(l + m) + lf(l - m));
    (s_min..=s_max)
        .map(|s| {
            let sign = if (mp - m + s).rem_euclid(2) == 0 {
                1.0
            } else {
                -1.0
            };
            let ln_coeff =
                ln_prefactor - lf(l + m - s) - lf(s) - lf(mp - m + s) - lf(l - mp - s);
            let cos_power = i32::try_from(2 * l + m - mp - 2 * s).unwrap_or(0);
            let sin_power = i32::try_from(mp - m + 2 * s).unwrap_or(0);
            sign * ln_coeff.exp() * cos_half.powi(cos_power) * sin_half.powi(sin_power)
        })
        .sum()
}
