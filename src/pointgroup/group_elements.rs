//! Generation of the full element set of a point group from its generating rotations.

use std::f64::consts::PI;
use std::fmt;

use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::{
    angle_axis_from_rotation, axes_equivalent, frobenius_distance, get_standard_positive_pole,
    idealise_axis_pair, proper_rotation_matrix, rotation_order,
};
use crate::pointgroup::{AxisDescriptor, PointGroupKind, SymmetryAxisCandidate};

#[cfg(test)]
#[path = "group_elements_tests.rs"]
mod group_elements_tests;

/// The largest number of elements a closure is allowed to accumulate. This exceeds the order of
/// every group of interest, so reaching it signals generators of an infinite group.
pub const MAX_GROUP_ELEMENTS: usize = 240;

/// The largest fold whose dihedral group fits within [`MAX_GROUP_ELEMENTS`].
#[allow(clippy::cast_possible_truncation)]
pub const MAX_SYMMETRY_FOLD: u32 = (MAX_GROUP_ELEMENTS / 2) as u32;

/// Tolerance for identifying rotation axes and orders of exactly generated elements.
const ELEMENT_AXIS_THRESHOLD: f64 = 1e-6;

// ==================
// Struct definitions
// ==================

/// An ordered set of rotation matrices with the identity first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupElementSet {
    elements: Vec<Matrix3<f64>>,
}

impl GroupElementSet {
    /// Returns the elements.
    #[must_use]
    pub fn elements(&self) -> &[Matrix3<f64>] {
        &self.elements
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Checks if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Checks if a rotation is in the set, within a Frobenius-distance tolerance.
    #[must_use]
    pub fn contains(&self, rotation: &Matrix3<f64>, tolerance: f64) -> bool {
        contains_rotation(&self.elements, rotation, tolerance)
    }

    /// Checks if every product of two elements is itself in the set.
    #[must_use]
    pub fn is_closed(&self, tolerance: f64) -> bool {
        self.elements
            .iter()
            .cartesian_product(self.elements.iter())
            .all(|(a, b)| self.contains(&(a * b), tolerance))
    }

    /// Returns every element as nine values in row-major order.
    #[must_use]
    pub fn to_row_major(&self) -> Vec<[f64; 9]> {
        self.elements
            .iter()
            .map(|m| {
                [
                    m[(0, 0)],
                    m[(0, 1)],
                    m[(0, 2)],
                    m[(1, 0)],
                    m[(1, 1)],
                    m[(1, 2)],
                    m[(2, 0)],
                    m[(2, 1)],
                    m[(2, 2)],
                ]
            })
            .collect()
    }

    /// Returns the distinct rotation axes of the set with the largest order of rotation found
    /// about each.
    ///
    /// # Arguments
    ///
    /// * `max_order` - The largest order to try when identifying rotation angles.
    ///
    /// # Returns
    ///
    /// Pairs of positive-pole unit axes and orders, sorted by decreasing order and then by the
    /// position of their first element in the set.
    #[must_use]
    pub fn rotation_axes(&self, max_order: u32) -> Vec<(Vector3<f64>, u32)> {
        let mut axes: Vec<(Vector3<f64>, u32)> = Vec::new();
        for element in &self.elements {
            let (angle, axis) = angle_axis_from_rotation(element);
            let Some(order) = rotation_order(angle, ELEMENT_AXIS_THRESHOLD, max_order) else {
                continue;
            };
            if order < 2 {
                continue;
            }
            let pole = get_standard_positive_pole(&axis, ELEMENT_AXIS_THRESHOLD);
            if let Some(existing) = axes
                .iter_mut()
                .find(|(a, _)| axes_equivalent(a, &pole, ELEMENT_AXIS_THRESHOLD))
            {
                existing.1 = existing.1.max(order);
            } else {
                axes.push((pole, order));
            }
        }
        // Stable: axes of equal order keep their order of appearance.
        axes.sort_by_key(|(_, order)| std::cmp::Reverse(*order));
        axes
    }
}

/// The outcome of a group-element generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GroupElementOutcome {
    /// The generators closed into a group of the expected order.
    Complete(GroupElementSet),

    /// The generators did not close into the expected group. This is a detection-negative
    /// outcome, not an error.
    Degenerate {
        /// The elements accumulated before giving up.
        partial: GroupElementSet,

        /// A description of the degeneracy.
        reason: String,
    },
}

impl GroupElementOutcome {
    /// Returns the complete element set, if any.
    #[must_use]
    pub fn complete(&self) -> Option<&GroupElementSet> {
        match self {
            Self::Complete(set) => Some(set),
            Self::Degenerate { .. } => None,
        }
    }

    /// Returns the elements, complete or partial.
    #[must_use]
    pub fn elements(&self) -> &GroupElementSet {
        match self {
            Self::Complete(set) | Self::Degenerate { partial: set, .. } => set,
        }
    }
}

impl fmt::Display for GroupElementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(set) => write!(f, "{} group element(s)", set.len()),
            Self::Degenerate { partial, reason } => write!(
                f,
                "degenerate generators ({reason}); {} partial element(s)",
                partial.len()
            ),
        }
    }
}

// =========
// Functions
// =========

fn contains_rotation(elements: &[Matrix3<f64>], rotation: &Matrix3<f64>, tolerance: f64) -> bool {
    elements
        .iter()
        .any(|element| frobenius_distance(element, rotation) < tolerance)
}

/// Closes a set of generators under matrix multiplication.
///
/// Each pass multiplies every ordered pair of existing elements and appends the products that
/// are new. The closure is reached once two consecutive passes add nothing.
///
/// # Arguments
///
/// * `generators` - The generating rotations.
/// * `tolerance` - Two rotations are equal if their Frobenius distance is below this value.
/// * `max_passes` - The largest number of multiplication passes.
///
/// # Returns
///
/// The elements in the order identity, generators, then new elements in order of discovery,
/// together with a flag indicating whether closure was reached.
#[must_use]
pub fn close_group(
    generators: &[Matrix3<f64>],
    tolerance: f64,
    max_passes: usize,
) -> (GroupElementSet, bool) {
    let mut elements = vec![Matrix3::identity()];
    for generator in generators {
        if !contains_rotation(&elements, generator, tolerance) {
            elements.push(*generator);
        }
    }

    let mut npasses = 0;
    let mut nstable = 0;
    let mut overflowed = false;
    // Products among elements older than `frontier` were formed in an earlier pass.
    let mut frontier = 0;
    while (nstable < 2 || npasses == 0) && npasses < max_passes && !overflowed {
        npasses += 1;
        let mut extra: Vec<Matrix3<f64>> = Vec::new();
        let pairs = (0..elements.len())
            .cartesian_product(0..elements.len())
            .filter(|&(i, j)| i >= frontier || j >= frontier);
        for (i, j) in pairs {
            let product = elements[i] * elements[j];
            if !contains_rotation(&elements, &product, tolerance)
                && !contains_rotation(&extra, &product, tolerance)
            {
                extra.push(product);
                if elements.len() + extra.len() > MAX_GROUP_ELEMENTS {
                    overflowed = true;
                    break;
                }
            }
        }
        log::debug!(
            "Generating all group elements: {} pass{}, {} element{} (of which {} {} new)",
            npasses,
            if npasses > 1 { "es" } else { "" },
            elements.len() + extra.len(),
            if elements.len() + extra.len() > 1 { "s" } else { "" },
            extra.len(),
            if extra.len() == 1 { "is" } else { "are" },
        );
        frontier = elements.len();
        if extra.is_empty() {
            nstable += 1;
        } else {
            nstable = 0;
            elements.extend(extra);
        }
    }
    let closed = nstable >= 1 && !overflowed;
    if closed {
        log::debug!("Group closure reached with {} elements.", elements.len());
    } else {
        log::debug!(
            "Group closure not reached after {npasses} pass(es) with {} elements.",
            elements.len()
        );
    }
    (GroupElementSet { elements }, closed)
}

/// Returns the generating rotations of a point group from its generating axes.
///
/// The first axis is the principal one (fold $`n`$ for $`\mathcal{C}_n`$ and $`\mathcal{D}_n`$,
/// a threefold axis for $`\mathcal{T}`$, a fourfold axis for $`\mathcal{O}`$ and a fivefold axis
/// for $`\mathcal{I}`$). The second axis is a twofold axis for $`\mathcal{D}_n`$ and a threefold
/// axis for the polyhedral groups; it is ignored for $`\mathcal{C}_n`$.
///
/// # Returns
///
/// The generators, or `None` if a required second axis is missing.
#[must_use]
pub fn generators_from_axes(
    kind: &PointGroupKind,
    principal: &Vector3<f64>,
    secondary: Option<&Vector3<f64>>,
) -> Option<Vec<Matrix3<f64>>> {
    let folds = kind.folds();
    let first = proper_rotation_matrix(2.0 * PI / f64::from(folds[0]), principal, 1);
    match kind {
        PointGroupKind::Cyclic(_) => Some(vec![first]),
        _ => secondary.map(|axis| {
            vec![
                first,
                proper_rotation_matrix(2.0 * PI / f64::from(folds[1]), axis, 1),
            ]
        }),
    }
}

/// Generates the elements of a point group and checks them against the order of the group.
///
/// # Arguments
///
/// * `kind` - The point group expected.
/// * `generators` - The generating rotations.
/// * `tolerance` - The Frobenius-distance tolerance for equality of rotations.
/// * `max_passes` - The largest number of multiplication passes.
///
/// # Returns
///
/// [`GroupElementOutcome::Complete`] if closure is reached with exactly the order of `kind`,
/// or [`GroupElementOutcome::Degenerate`] with the partial set otherwise.
#[must_use]
pub fn generate_group_elements(
    kind: &PointGroupKind,
    generators: &[Matrix3<f64>],
    tolerance: f64,
    max_passes: usize,
) -> GroupElementOutcome {
    let (set, closed) = close_group(generators, tolerance, max_passes);
    if !closed {
        let reason = format!(
            "closure of {kind} not reached within {max_passes} pass(es) ({} elements)",
            set.len()
        );
        log::warn!("Degenerate generators: {reason}.");
        GroupElementOutcome::Degenerate {
            partial: set,
            reason,
        }
    } else if set.len() != kind.order() {
        let reason = format!(
            "{} elements generated, but {kind} has {}",
            set.len(),
            kind.order()
        );
        log::warn!("Degenerate generators: {reason}.");
        GroupElementOutcome::Degenerate {
            partial: set,
            reason,
        }
    } else {
        GroupElementOutcome::Complete(set)
    }
}

/// Finds the stored dihedral axis pair that corresponds to the recommended axes.
///
/// # Arguments
///
/// * `all_cs` - All detected cyclic axes.
/// * `d_pairs` - Indices into `all_cs` of every (principal, twofold) pair proposed as a
/// dihedral group.
/// * `recommended_axes` - The recommended axes, principal first and twofold second.
/// * `tolerance` - The axis-comparison tolerance.
///
/// # Returns
///
/// The first pair whose principal and secondary axes agree with the first and second
/// recommended axes within the tolerance and with matching folds, if any.
#[must_use]
pub fn select_recommended_d_pair(
    all_cs: &[SymmetryAxisCandidate],
    d_pairs: &[[usize; 2]],
    recommended_axes: &[AxisDescriptor],
    tolerance: f64,
) -> Option<[usize; 2]> {
    let [principal, secondary] = match recommended_axes {
        [p, s, ..] => [p, s],
        _ => return None,
    };
    d_pairs.iter().copied().find(|&[i, j]| {
        let (Some(ci), Some(cj)) = (all_cs.get(i), all_cs.get(j)) else {
            return false;
        };
        ci.fold == principal.fold
            && cj.fold == secondary.fold
            && axes_equivalent(&ci.axis, &principal.axis, tolerance)
            && axes_equivalent(&cj.axis, &secondary.axis, tolerance)
    })
}

/// Generates the elements of a dihedral group from a selected pair of detected axes.
///
/// The twofold axis is first made exactly perpendicular to the principal axis.
///
/// # Returns
///
/// [`GroupElementOutcome::Degenerate`] if the two axes are not perpendicular within the
/// tolerance, or if they do not generate the expected group.
#[must_use]
pub fn dihedral_group_elements(
    all_cs: &[SymmetryAxisCandidate],
    pair: [usize; 2],
    tolerance: f64,
    max_passes: usize,
) -> GroupElementOutcome {
    let (Some(principal), Some(secondary)) = (all_cs.get(pair[0]), all_cs.get(pair[1])) else {
        return GroupElementOutcome::Degenerate {
            partial: GroupElementSet {
                elements: vec![Matrix3::identity()],
            },
            reason: format!("axis pair {pair:?} is out of range"),
        };
    };
    let kind = PointGroupKind::Dihedral(principal.fold);
    let dot = principal.axis.dot(&secondary.axis).abs();
    let ideal = if dot < tolerance {
        idealise_axis_pair(&principal.axis, &secondary.axis, 0.0)
    } else {
        None
    };
    let Some(twofold) = ideal else {
        let reason = format!("the axes of {kind} are not perpendicular (|cos| = {dot:.4})");
        log::warn!("Degenerate generators: {reason}.");
        return GroupElementOutcome::Degenerate {
            partial: GroupElementSet {
                elements: vec![Matrix3::identity()],
            },
            reason,
        };
    };
    match generators_from_axes(&kind, &principal.axis, Some(&twofold)) {
        Some(generators) => generate_group_elements(&kind, &generators, tolerance, max_passes),
        None => GroupElementOutcome::Degenerate {
            partial: GroupElementSet {
                elements: vec![Matrix3::identity()],
            },
            reason: format!("no generators could be constructed for {kind}"),
        },
    }
}
