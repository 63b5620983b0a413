//! Peak detection on the self-rotation function in angle-axis form.
//!
//! For a fixed rotation angle $`2\pi/n`$, the rotation function becomes a scalar field over the
//! sphere of rotation axes. This module samples that field on a quasi-uniform lattice, locates
//! its local maxima, discards insignificant ones, optionally refines the survivors below the
//! lattice spacing, and merges detections of the same axis.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;

use log;
use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use primes::is_prime;
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::{
    axes_equivalent, fibonacci_sphere, get_standard_positive_pole, orthonormal_complement,
};
use crate::auxiliary::interpolation::bicubic;
use crate::rotfun::RotationFunctionGrid;

#[cfg(test)]
#[path = "peaks_tests.rs"]
mod peaks_tests;

/// Threshold for deciding the hemisphere of an axis.
const POLE_THRESHOLD: f64 = 1e-7;

/// Number of sub-grid steps per lattice spacing in the bicubic refinement search.
const REFINEMENT_STEPS: i32 = 10;

// ==================
// Struct definitions
// ==================

/// Settings controlling the peak search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakSearchSettings {
    /// The neighbourhood radius in lattice spacings. A sample must exceed every other sample
    /// within $`(k + 1/2)\,s`$ to be a peak.
    pub peak_neighbours: usize,

    /// The IQR multiple $`k`$ above the median of non-peak values that a peak must reach.
    /// Negative values disable the filter.
    pub iqr_threshold: f64,

    /// The tolerance on $`1 - |\hat{a} \cdot \hat{b}|`$ for two axes to be considered the same.
    pub axis_tolerance: f64,

    /// Whether peaks are refined by bicubic interpolation on the tangent plane.
    pub bicubic_refinement: bool,
}

/// A local maximum of the self-rotation function at rotation angle $`2\pi/\textrm{fold}`$.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisPeak {
    /// The fold $`n`$ scanned.
    pub fold: u32,

    /// The unit rotation axis at its standard positive pole.
    pub axis: Vector3<f64>,

    /// The value of the rotation function at the peak.
    pub height: f64,
}

impl AxisPeak {
    /// Returns the rotation angle $`2\pi/n`$.
    #[must_use]
    pub fn angle(&self) -> f64 {
        2.0 * PI / f64::from(self.fold)
    }
}

impl fmt::Display for AxisPeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C{} ({:+.4}, {:+.4}, {:+.4}) {:.4}",
            self.fold, self.axis[0], self.axis[1], self.axis[2], self.height
        )
    }
}

/// A quasi-uniform lattice of axes over the whole sphere with precomputed neighbourhoods.
#[derive(Clone, Debug)]
pub struct AxisLattice {
    /// The nominal angular spacing $`s`$ between neighbouring axes.
    spacing: f64,

    /// The lattice axes.
    axes: Vec<Vector3<f64>>,

    /// For each axis, the indices of all other axes within the neighbourhood radius.
    neighbours: Vec<Vec<usize>>,
}

impl AxisLattice {
    /// Constructs the lattice appropriate for a harmonic bandwidth.
    ///
    /// # Arguments
    ///
    /// * `bandwidth` - The harmonic bandwidth $`B`$; the spacing is $`s = \pi / 2B`$ and the
    /// lattice holds $`\lceil 4\pi / s^2 \rceil`$ axes.
    /// * `peak_neighbours` - The neighbourhood radius in lattice spacings.
    #[must_use]
    pub fn new(bandwidth: usize, peak_neighbours: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let spacing = PI / (2 * bandwidth.max(1)) as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_axes = (4.0 * PI / (spacing * spacing)).ceil() as usize;
        let axes = fibonacci_sphere(n_axes);
        #[allow(clippy::cast_precision_loss)]
        let radius = (peak_neighbours as f64 + 0.5) * spacing;
        let neighbours = neighbourhoods(&axes, radius);
        Self {
            spacing,
            axes,
            neighbours,
        }
    }

    /// Returns the nominal angular spacing.
    #[must_use]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Returns the lattice axes.
    #[must_use]
    pub fn axes(&self) -> &[Vector3<f64>] {
        &self.axes
    }

    /// Returns the neighbourhood of every axis.
    #[must_use]
    pub fn neighbours(&self) -> &[Vec<usize>] {
        &self.neighbours
    }
}

// =========
// Functions
// =========

/// Finds, for every point on the unit sphere, the other points within an angular radius.
///
/// Points are bucketed into cubic cells whose side is the corresponding chord length, so that
/// only the $`3 \times 3 \times 3`$ block of cells around each point needs to be inspected.
fn neighbourhoods(points: &[Vector3<f64>], angular_radius: f64) -> Vec<Vec<usize>> {
    let chord = 2.0 * (0.5 * angular_radius.min(PI)).sin();
    let cell_size = chord.max(1e-6);
    #[allow(clippy::cast_possible_truncation)]
    let cell_key = |p: &Vector3<f64>| -> (i64, i64, i64) {
        (
            (p.x / cell_size).floor() as i64,
            (p.y / cell_size).floor() as i64,
            (p.z / cell_size).floor() as i64,
        )
    };
    let mut cells: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in points.iter().enumerate() {
        cells.entry(cell_key(p)).or_default().push(i);
    }
    let min_dot = angular_radius.min(PI).cos();
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let (cx, cy, cz) = cell_key(p);
            let mut found = Vec::new();
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if let Some(indices) = cells.get(&(cx + dx, cy + dy, cz + dz)) {
                            found.extend(
                                indices
                                    .iter()
                                    .copied()
                                    .filter(|&j| j != i && p.dot(&points[j]) >= min_dot),
                            );
                        }
                    }
                }
            }
            found.sort_unstable();
            found
        })
        .collect()
}

/// Returns the folds to scan: every integer in $`[2, \textrm{max\_fold}]`$, or only the primes.
#[must_use]
pub fn folds_to_scan(max_fold: u32, primes_only: bool) -> Vec<u32> {
    (2..=max_fold)
        .filter(|&n| !primes_only || is_prime(u64::from(n)))
        .collect()
}

/// Returns the indices of the samples strictly greater than all of their neighbours.
#[must_use]
pub fn local_maxima(values: &[f64], neighbours: &[Vec<usize>]) -> Vec<usize> {
    values
        .iter()
        .zip(neighbours.iter())
        .enumerate()
        .filter(|(_, (v, nbs))| nbs.iter().all(|&j| **v > values[j]))
        .map(|(i, _)| i)
        .collect()
}

/// Returns the quantile `q` of sorted data, interpolating linearly between order statistics.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            #[allow(clippy::cast_precision_loss)]
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let lower = pos.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            #[allow(clippy::cast_precision_loss)]
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Computes the significance threshold
/// $`\operatorname{median} + k \cdot \operatorname{IQR}`$ of the non-peak values.
///
/// # Returns
///
/// The threshold, or `None` if the filter is disabled ($`k < 0`$) or there are no values.
#[must_use]
pub fn iqr_threshold(non_peak_values: &[f64], k: f64) -> Option<f64> {
    if k < 0.0 || non_peak_values.is_empty() {
        return None;
    }
    let mut sorted = non_peak_values.to_vec();
    sorted.sort_by_key(|&v| OrderedFloat(v));
    let median = quantile(&sorted, 0.5);
    let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);
    Some(median + k * iqr)
}

/// Refines a peak below the lattice spacing.
///
/// A $`5 \times 5`$ patch of axes with spacing $`s`$ is laid out on the plane tangent to the
/// sphere at `axis`; a Catmull–Rom bicubic surface through the patch is searched over the four
/// central cells, and the best sub-grid axis is accepted only if its directly evaluated height
/// exceeds the original one.
///
/// # Returns
///
/// The refined axis and height.
#[must_use]
pub fn refine_peak(
    grid: &RotationFunctionGrid,
    axis: &Vector3<f64>,
    height: f64,
    angle: f64,
    spacing: f64,
) -> (Vector3<f64>, f64) {
    let (u, w) = orthonormal_complement(axis);
    let point = |x: f64, y: f64| (axis + u * (x * spacing) + w * (y * spacing)).normalize();
    let mut patch = [[0.0; 5]; 5];
    for (i, row) in patch.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let (x, y) = (i as f64 - 2.0, j as f64 - 2.0);
            *value = grid.value_at_axis_angle(&point(x, y), angle);
        }
    }

    let mut best = (0.0, 0.0, patch[2][2]);
    for si in -REFINEMENT_STEPS..=REFINEMENT_STEPS {
        for ti in -REFINEMENT_STEPS..=REFINEMENT_STEPS {
            let x = f64::from(si) / f64::from(REFINEMENT_STEPS);
            let y = f64::from(ti) / f64::from(REFINEMENT_STEPS);
            let (i0, j0) = (usize::from(x >= 0.0), usize::from(y >= 0.0));
            let sub: [[f64; 4]; 4] =
                std::array::from_fn(|r| std::array::from_fn(|c| patch[i0 + r][j0 + c]));
            #[allow(clippy::cast_precision_loss)]
            let value = bicubic(&sub, x + 1.0 - i0 as f64, y + 1.0 - j0 as f64);
            if value > best.2 {
                best = (x, y, value);
            }
        }
    }

    let refined_axis = point(best.0, best.1);
    let refined_height = grid.value_at_axis_angle(&refined_axis, angle);
    if refined_height > height {
        (refined_axis, refined_height)
    } else {
        (axis.normalize(), height)
    }
}

/// Merges peaks of the same fold whose axes agree within the tolerance.
///
/// Peaks are visited in order of decreasing height and a peak is kept only if no higher kept
/// peak of the same fold shares its axis. Axes are reported at their standard positive pole.
/// Applying this function to its own output returns it unchanged.
#[must_use]
pub fn merge_peaks(peaks: Vec<AxisPeak>, axis_tolerance: f64) -> Vec<AxisPeak> {
    let mut sorted = peaks;
    sorted.sort_by_key(|peak| OrderedFloat(-peak.height));
    let mut kept: Vec<AxisPeak> = Vec::with_capacity(sorted.len());
    for peak in sorted {
        let duplicate = kept
            .iter()
            .any(|k| k.fold == peak.fold && axes_equivalent(&k.axis, &peak.axis, axis_tolerance));
        if !duplicate {
            kept.push(AxisPeak {
                axis: get_standard_positive_pole(&peak.axis, POLE_THRESHOLD),
                ..peak
            });
        }
    }
    kept
}

/// Finds the significant peaks of the rotation function at rotation angle $`2\pi/n`$.
///
/// # Arguments
///
/// * `grid` - The rotation function.
/// * `lattice` - The axis lattice.
/// * `fold` - The fold $`n`$.
/// * `settings` - The peak-search settings.
///
/// # Returns
///
/// The merged peaks in order of decreasing height.
#[must_use]
pub fn scan_fold(
    grid: &RotationFunctionGrid,
    lattice: &AxisLattice,
    fold: u32,
    settings: &PeakSearchSettings,
) -> Vec<AxisPeak> {
    let angle = 2.0 * PI / f64::from(fold);
    let values: Vec<f64> = lattice
        .axes()
        .iter()
        .map(|axis| grid.value_at_axis_angle(axis, angle))
        .collect();
    let maxima = local_maxima(&values, lattice.neighbours());

    let threshold = if settings.iqr_threshold < 0.0 {
        None
    } else {
        let mut is_peak = vec![false; values.len()];
        maxima.iter().for_each(|&i| is_peak[i] = true);
        let non_peak: Vec<f64> = values
            .iter()
            .zip(is_peak.iter())
            .filter_map(|(v, p)| if *p { None } else { Some(*v) })
            .collect();
        iqr_threshold(&non_peak, settings.iqr_threshold)
    };

    let peaks: Vec<AxisPeak> = maxima
        .into_iter()
        .filter(|&i| threshold.map_or(true, |t| values[i] >= t))
        .map(|i| {
            let (axis, height) = if settings.bicubic_refinement {
                refine_peak(grid, &lattice.axes()[i], values[i], angle, lattice.spacing())
            } else {
                (lattice.axes()[i], values[i])
            };
            AxisPeak { fold, axis, height }
        })
        .collect();
    let merged = merge_peaks(peaks, settings.axis_tolerance);
    log::debug!("Fold {fold}: {} peak(s) after merging.", merged.len());
    merged
}

/// Scans every requested fold for peaks.
///
/// # Returns
///
/// The peaks of all folds, grouped by increasing fold and by decreasing height within a fold.
#[must_use]
pub fn detect_peaks(
    grid: &RotationFunctionGrid,
    folds: &[u32],
    settings: &PeakSearchSettings,
) -> Vec<AxisPeak> {
    log::debug!("Searching the rotation function for peaks over {} fold(s)...", folds.len());
    let lattice = AxisLattice::new(grid.bandwidth(), settings.peak_neighbours);
    let peaks: Vec<AxisPeak> = folds
        .iter()
        .flat_map(|&fold| scan_fold(grid, &lattice, fold, settings))
        .collect();
    log::debug!(
        "Searching the rotation function for peaks over {} fold(s)... Done. {} peak(s) found.",
        folds.len(),
        peaks.len()
    );
    peaks
}
