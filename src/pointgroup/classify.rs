//! Assembly of detected peaks into cyclic axes and point-group hypotheses.

use std::fmt;

use log;
use nalgebra::{Matrix3, Vector3};
use num::integer::lcm;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::{
    axes_equivalent, get_standard_positive_pole, idealise_axis_pair, proper_rotation_matrix,
};
use crate::peaks::AxisPeak;
use crate::pointgroup::group_elements::{close_group, GroupElementSet};
use crate::pointgroup::{AxisDescriptor, PointGroupKind, SymmetryAxisCandidate};
use crate::rotfun::RotationFunctionGrid;

#[cfg(test)]
#[path = "classify_tests.rs"]
mod classify_tests;

/// Threshold for deciding the hemisphere of an axis.
const POLE_THRESHOLD: f64 = 1e-7;

/// The largest rotation order present in any of the polyhedral groups.
const MAX_ELEMENT_ORDER: u32 = 60;

// ==================
// Struct definitions
// ==================

/// Settings controlling the classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassificationSettings {
    /// The largest fold considered.
    pub max_fold: u32,

    /// The tolerance used for comparing axes and characteristic inter-axis cosines.
    pub axis_tolerance: f64,

    /// The smallest height with which an axis is accepted.
    pub min_peak_height: f64,

    /// The largest fraction of expected axes that may be missing from a composite hypothesis.
    pub missing_peak_threshold: f64,

    /// The height margin below the best-supported fold on an axis within which a larger fold
    /// is preferred.
    pub peak_height_tolerance: f64,

    /// The largest number of multiplication passes when closing a group.
    pub max_closure_passes: usize,
}

/// A point group proposed from the detected cyclic axes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointGroupHypothesis {
    /// The proposed group.
    pub kind: PointGroupKind,

    /// Indices into the cyclic-axis list of the axes that seeded the hypothesis.
    pub seed: Vec<usize>,

    /// The idealised generating axes with their folds.
    pub generators: Vec<(u32, Vector3<f64>)>,

    /// Every rotation axis the group requires, detected or predicted.
    pub axes: Vec<AxisDescriptor>,

    /// For each expected axis, the index of the cyclic axis that matched it.
    pub matches: Vec<Option<usize>>,

    /// The completeness-weighted score.
    pub score: f64,

    /// Whether the hypothesis passed the missing-peak and height criteria.
    pub accepted: bool,
}

impl PointGroupHypothesis {
    /// Returns the number of axes the group requires.
    #[must_use]
    pub fn expected(&self) -> usize {
        self.axes.len()
    }

    /// Returns the number of required axes that were detected.
    #[must_use]
    pub fn found(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }

    /// Returns the number of required axes that were not detected.
    #[must_use]
    pub fn missing(&self) -> usize {
        self.expected() - self.found()
    }

    /// Checks if another hypothesis proposes the same group on the same axes.
    #[must_use]
    pub fn same_as(&self, other: &Self, tolerance: f64) -> bool {
        self.kind == other.kind
            && self.axes.len() == other.axes.len()
            && self.axes.iter().all(|a| {
                other
                    .axes
                    .iter()
                    .any(|b| a.fold == b.fold && axes_equivalent(&a.axis, &b.axis, tolerance))
            })
    }
}

impl fmt::Display for PointGroupHypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<4} {:>3}/{:<3} score {:.4}{}",
            self.kind.to_string(),
            self.found(),
            self.expected(),
            self.score,
            if self.accepted { "" } else { " (rejected)" }
        )
    }
}

/// The detected cyclic axes and every point-group hypothesis built from them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetryClassification {
    /// All detected cyclic axes, by decreasing fold and then decreasing height.
    pub all_cs: Vec<SymmetryAxisCandidate>,

    /// Every (principal, perpendicular twofold) pair of indices into `all_cs`.
    pub d_axes: Vec<[usize; 2]>,

    /// Indices into `all_cs` of the axes of accepted tetrahedral hypotheses.
    pub t_axes: Vec<usize>,

    /// Indices into `all_cs` of the axes of accepted octahedral hypotheses.
    pub o_axes: Vec<usize>,

    /// Indices into `all_cs` of the axes of accepted icosahedral hypotheses.
    pub i_axes: Vec<usize>,

    /// All distinct hypotheses, accepted or not, cyclic first, then dihedral, tetrahedral,
    /// octahedral and icosahedral.
    pub hypotheses: Vec<PointGroupHypothesis>,
}

impl SymmetryClassification {
    /// Returns the accepted hypotheses.
    pub fn accepted(&self) -> impl Iterator<Item = &PointGroupHypothesis> + '_ {
        self.hypotheses.iter().filter(|h| h.accepted)
    }
}

// =========
// Functions
// =========

fn push_distinct(
    hypotheses: &mut Vec<PointGroupHypothesis>,
    hypothesis: PointGroupHypothesis,
    tolerance: f64,
) {
    if !hypotheses.iter().any(|h| h.same_as(&hypothesis, tolerance)) {
        hypotheses.push(hypothesis);
    }
}

/// Checks if a hypothesis of the same group already accounts for both seed axes.
fn covered(hypotheses: &[PointGroupHypothesis], kind: PointGroupKind, seed: [usize; 2]) -> bool {
    hypotheses
        .iter()
        .any(|h| h.kind == kind && seed.iter().all(|i| h.matches.contains(&Some(*i))))
}

fn fold_height(grid: Option<&RotationFunctionGrid>, axis: &Vector3<f64>, fold: u32) -> f64 {
    grid.map_or(0.0, |g| g.fold_height(axis, fold))
}

/// Sorts cyclic axes by decreasing fold and then decreasing height.
pub fn sort_cyclic_axes(candidates: &mut [SymmetryAxisCandidate]) {
    candidates.sort_by_key(|c| (std::cmp::Reverse(c.fold), OrderedFloat(-c.height)));
}

/// Merges cyclic axes of the same fold whose axes agree within the tolerance, keeping the
/// higher one. The result is sorted as in [`sort_cyclic_axes`] and merging it again leaves it
/// unchanged.
#[must_use]
pub fn merge_candidates(
    candidates: Vec<SymmetryAxisCandidate>,
    axis_tolerance: f64,
) -> Vec<SymmetryAxisCandidate> {
    let mut sorted = candidates;
    sort_cyclic_axes(&mut sorted);
    let mut kept: Vec<SymmetryAxisCandidate> = Vec::with_capacity(sorted.len());
    for candidate in sorted {
        if !kept.iter().any(|k| {
            k.fold == candidate.fold && axes_equivalent(&k.axis, &candidate.axis, axis_tolerance)
        }) {
            kept.push(SymmetryAxisCandidate {
                axis: get_standard_positive_pole(&candidate.axis, POLE_THRESHOLD),
                ..candidate
            });
        }
    }
    kept
}

/// Converts peaks into cyclic-axis candidates supported by every non-trivial power of their
/// rotation.
///
/// Without a rotation function, the peak heights are used as they are.
#[must_use]
pub fn candidates_from_peaks(
    peaks: &[AxisPeak],
    grid: Option<&RotationFunctionGrid>,
    settings: &ClassificationSettings,
) -> Vec<SymmetryAxisCandidate> {
    let candidates = peaks
        .iter()
        .filter(|peak| peak.fold >= 2 && peak.fold <= settings.max_fold)
        .map(|peak| SymmetryAxisCandidate {
            fold: peak.fold,
            axis: peak.axis,
            height: grid.map_or(peak.height, |g| g.fold_height(&peak.axis, peak.fold)),
        })
        .filter(|c| c.height >= settings.min_peak_height)
        .collect();
    merge_candidates(candidates, settings.axis_tolerance)
}

/// Reconciles the folds detected on a common axis.
///
/// Candidates on equivalent axes are gathered, and each axis keeps a single fold. With a rotation
/// function, the detected folds are joined by their pairwise least common multiples and by their
/// multiples up to the largest fold, all at their fold-consistent heights. The fold kept is the
/// largest one whose height is within the peak-height tolerance of the best height on the axis,
/// so that a fold is never traded for a weakly supported multiple.
#[must_use]
pub fn consolidate_harmonics(
    candidates: Vec<SymmetryAxisCandidate>,
    grid: Option<&RotationFunctionGrid>,
    settings: &ClassificationSettings,
) -> Vec<SymmetryAxisCandidate> {
    let tol = settings.axis_tolerance;

    // Tallest candidate first, so that it defines the axis of its group.
    let mut pool = merge_candidates(candidates, tol);
    pool.sort_by_key(|c| OrderedFloat(-c.height));
    let mut groups: Vec<Vec<SymmetryAxisCandidate>> = Vec::new();
    for candidate in pool {
        match groups
            .iter_mut()
            .find(|group| axes_equivalent(&group[0].axis, &candidate.axis, tol))
        {
            Some(group) => group.push(candidate),
            None => groups.push(vec![candidate]),
        }
    }

    let consolidated = groups
        .into_iter()
        .filter_map(|mut group| {
            let axis = group[0].axis;
            if let Some(grid) = grid {
                let detected = group.iter().map(|c| c.fold).collect::<Vec<_>>();
                let mut extra = Vec::new();
                for (i, &a) in detected.iter().enumerate() {
                    extra.extend(detected[i + 1..].iter().map(|&b| lcm(a, b)));
                    extra.extend(
                        (2..)
                            .map(|k| a * k)
                            .take_while(|&m| m <= settings.max_fold),
                    );
                }
                extra.retain(|fold| *fold <= settings.max_fold && !detected.contains(fold));
                extra.sort_unstable();
                extra.dedup();
                group.extend(
                    extra
                        .into_iter()
                        .map(|fold| SymmetryAxisCandidate {
                            fold,
                            axis,
                            height: grid.fold_height(&axis, fold),
                        })
                        .filter(|c| c.height >= settings.min_peak_height),
                );
            }
            let best = group
                .iter()
                .map(|c| c.height)
                .fold(f64::NEG_INFINITY, f64::max);
            let chosen = group
                .into_iter()
                .filter(|c| c.height >= best - settings.peak_height_tolerance)
                .max_by_key(|c| (c.fold, OrderedFloat(c.height)))?;
            log::debug!(
                "Axis ({:+.3}, {:+.3}, {:+.3}) kept with fold {} at height {:.4}.",
                chosen.axis[0],
                chosen.axis[1],
                chosen.axis[2],
                chosen.fold,
                chosen.height
            );
            Some(chosen)
        })
        .collect();
    merge_candidates(consolidated, tol)
}

/// Builds and scores a point-group hypothesis from two seed axes.
///
/// The second axis is first idealised to make the exact angle `target_cos` with the first; the
/// two rotations are then closed into a group, the group's rotation axes are matched against
/// the detected ones, and the hypothesis is scored.
///
/// # Returns
///
/// The hypothesis, or `None` if the idealised generators do not produce the expected group.
#[must_use]
pub fn composite_hypothesis(
    kind: PointGroupKind,
    seed: [usize; 2],
    target_cos: f64,
    all_cs: &[SymmetryAxisCandidate],
    grid: Option<&RotationFunctionGrid>,
    settings: &ClassificationSettings,
) -> Option<PointGroupHypothesis> {
    let first = all_cs.get(seed[0])?;
    let second = all_cs.get(seed[1])?;
    let ideal_second = idealise_axis_pair(&first.axis, &second.axis, target_cos)?;
    let generators = vec![
        (first.fold, first.axis),
        (second.fold, get_standard_positive_pole(&ideal_second, POLE_THRESHOLD)),
    ];
    let matrices: Vec<Matrix3<f64>> = generators
        .iter()
        .map(|(fold, axis)| proper_rotation_matrix(std::f64::consts::TAU / f64::from(*fold), axis, 1))
        .collect();
    let (set, closed) = close_group(&matrices, settings.axis_tolerance, settings.max_closure_passes);
    if !closed || set.len() != kind.order() {
        log::debug!(
            "Axes {} and {} do not generate {kind} ({} elements{}).",
            seed[0],
            seed[1],
            set.len(),
            if closed { "" } else { ", not closed" }
        );
        return None;
    }
    Some(score_hypothesis(kind, seed.to_vec(), generators, &set, all_cs, grid, settings))
}

/// Matches the rotation axes of a group against the detected cyclic axes and scores the result.
///
/// An expected axis of order $`n`$ is matched by the highest detected axis along the same line
/// whose fold is a multiple of $`n`$. The hypothesis is accepted if at most
/// $`\lfloor t E \rfloor`$ of the $`E`$ expected axes are missing and every matched height
/// reaches the minimum; its score is $`(F/E)\,\bar{h}`$ where $`F`$ is the number of matched
/// axes and $`\bar{h}`$ their mean height.
#[must_use]
pub fn score_hypothesis(
    kind: PointGroupKind,
    seed: Vec<usize>,
    generators: Vec<(u32, Vector3<f64>)>,
    set: &GroupElementSet,
    all_cs: &[SymmetryAxisCandidate],
    grid: Option<&RotationFunctionGrid>,
    settings: &ClassificationSettings,
) -> PointGroupHypothesis {
    let tol = settings.axis_tolerance;
    let (axes, matches): (Vec<AxisDescriptor>, Vec<Option<usize>>) = set
        .rotation_axes(MAX_ELEMENT_ORDER)
        .into_iter()
        .map(|(axis, order)| {
            let matched = all_cs
                .iter()
                .enumerate()
                .filter(|(_, c)| c.fold % order == 0 && axes_equivalent(&c.axis, &axis, tol))
                .max_by_key(|(i, c)| (OrderedFloat(c.height), std::cmp::Reverse(*i)))
                .map(|(i, _)| i);
            let descriptor = match matched {
                Some(i) => AxisDescriptor {
                    fold: order,
                    axis: all_cs[i].axis,
                    angle: std::f64::consts::TAU / f64::from(order),
                    height: all_cs[i].height,
                    detected: true,
                },
                None => AxisDescriptor {
                    fold: order,
                    axis,
                    angle: std::f64::consts::TAU / f64::from(order),
                    height: fold_height(grid, &axis, order),
                    detected: false,
                },
            };
            (descriptor, matched)
        })
        .unzip();

    let expected = axes.len();
    let found_heights: Vec<f64> = axes.iter().filter(|a| a.detected).map(|a| a.height).collect();
    let found = found_heights.len();
    #[allow(clippy::cast_precision_loss)]
    let (expected_f, found_f) = (expected as f64, found as f64);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let allowed_missing = (settings.missing_peak_threshold * expected_f + 1e-9).floor() as usize;
    let accepted = expected > 0
        && found > 0
        && expected - found <= allowed_missing
        && found_heights.iter().all(|&h| h >= settings.min_peak_height);
    let score = if found > 0 && expected > 0 {
        (found_f / expected_f) * (found_heights.iter().sum::<f64>() / found_f)
    } else {
        0.0
    };
    PointGroupHypothesis {
        kind,
        seed,
        generators,
        axes,
        matches,
        score,
        accepted,
    }
}

/// Proposes and scores every point-group hypothesis supported by a list of cyclic axes.
///
/// # Arguments
///
/// * `all_cs` - The detected cyclic axes, sorted as in [`sort_cyclic_axes`].
/// * `grid` - The rotation function, used to sample the heights of predicted axes.
/// * `settings` - The classification settings.
#[must_use]
pub fn classify_cyclic_axes(
    all_cs: Vec<SymmetryAxisCandidate>,
    grid: Option<&RotationFunctionGrid>,
    settings: &ClassificationSettings,
) -> SymmetryClassification {
    let tol = settings.axis_tolerance;
    let mut hypotheses: Vec<PointGroupHypothesis> = Vec::new();

    // Cyclic
    for (i, c) in all_cs.iter().enumerate() {
        let hypothesis = PointGroupHypothesis {
            kind: PointGroupKind::Cyclic(c.fold),
            seed: vec![i],
            generators: vec![(c.fold, c.axis)],
            axes: vec![AxisDescriptor::from(c)],
            matches: vec![Some(i)],
            score: c.height,
            accepted: c.height >= settings.min_peak_height,
        };
        push_distinct(&mut hypotheses, hypothesis, tol);
    }

    // Dihedral
    let mut d_axes = Vec::new();
    for (i, principal) in all_cs.iter().enumerate() {
        for (j, twofold) in all_cs.iter().enumerate() {
            if i == j || twofold.fold != 2 || principal.axis.dot(&twofold.axis).abs() >= tol {
                continue;
            }
            d_axes.push([i, j]);
            let kind = PointGroupKind::Dihedral(principal.fold);
            if covered(&hypotheses, kind, [i, j]) {
                continue;
            }
            if let Some(h) = composite_hypothesis(kind, [i, j], 0.0, &all_cs, grid, settings) {
                push_distinct(&mut hypotheses, h, tol);
            }
        }
    }

    // Polyhedral
    let t_c3_c3 = 1.0 / 3.0;
    let o_c4_c3 = 1.0 / 3.0f64.sqrt();
    let golden = 0.5 * (1.0 + 5.0f64.sqrt());
    let i_c5_c3 = (1.0 + golden) / (3.0f64.sqrt() * (1.0 + golden * golden).sqrt());
    let i_c5_c5 = 1.0 / 5.0f64.sqrt();
    let seeds: [(PointGroupKind, u32, u32, f64); 5] = [
        (PointGroupKind::Tetrahedral, 3, 3, t_c3_c3),
        (PointGroupKind::Octahedral, 4, 3, o_c4_c3),
        (PointGroupKind::Octahedral, 4, 4, 0.0),
        (PointGroupKind::Icosahedral, 5, 3, i_c5_c3),
        (PointGroupKind::Icosahedral, 5, 5, i_c5_c5),
    ];
    for (kind, fold_a, fold_b, target_cos) in seeds {
        for (i, a) in all_cs.iter().enumerate() {
            if a.fold != fold_a {
                continue;
            }
            for (j, b) in all_cs.iter().enumerate() {
                if b.fold != fold_b || (fold_a == fold_b && j <= i) {
                    continue;
                }
                if (a.axis.dot(&b.axis).abs() - target_cos).abs() >= tol
                    || covered(&hypotheses, kind, [i, j])
                {
                    continue;
                }
                if let Some(h) =
                    composite_hypothesis(kind, [i, j], target_cos, &all_cs, grid, settings)
                {
                    push_distinct(&mut hypotheses, h, tol);
                }
            }
        }
    }

    let axes_of = |kind: PointGroupKind| -> Vec<usize> {
        let mut indices: Vec<usize> = Vec::new();
        hypotheses
            .iter()
            .filter(|h| h.accepted && h.kind == kind)
            .flat_map(|h| h.matches.iter().flatten().copied())
            .for_each(|i| {
                if !indices.contains(&i) {
                    indices.push(i);
                }
            });
        indices
    };
    let t_axes = axes_of(PointGroupKind::Tetrahedral);
    let o_axes = axes_of(PointGroupKind::Octahedral);
    let i_axes = axes_of(PointGroupKind::Icosahedral);

    log::debug!(
        "{} cyclic axis/axes, {} perpendicular pair(s), {} hypothesis/hypotheses ({} accepted).",
        all_cs.len(),
        d_axes.len(),
        hypotheses.len(),
        hypotheses.iter().filter(|h| h.accepted).count()
    );
    SymmetryClassification {
        all_cs,
        d_axes,
        t_axes,
        o_axes,
        i_axes,
        hypotheses,
    }
}

/// Classifies the peaks of a rotation function.
///
/// This converts the peaks into cyclic axes, reconciles the folds found on each axis, and
/// proposes and scores every point group the axes support.
#[must_use]
pub fn classify(
    peaks: &[AxisPeak],
    grid: Option<&RotationFunctionGrid>,
    settings: &ClassificationSettings,
) -> SymmetryClassification {
    log::debug!("Classifying {} peak(s)...", peaks.len());
    let candidates = candidates_from_peaks(peaks, grid, settings);
    let all_cs = consolidate_harmonics(candidates, grid, settings);
    let classification = classify_cyclic_axes(all_cs, grid, settings);
    log::debug!("Classifying {} peak(s)... Done.", peaks.len());
    classification
}
