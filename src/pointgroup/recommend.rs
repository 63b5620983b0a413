//! Choice of the recommended symmetry among the accepted point-group hypotheses.

use std::fmt;

use log;
use serde::{Deserialize, Serialize};

use crate::error::WS_SYMMETRY_NOT_FOUND;
use crate::io::format::mapsym_warn;
use crate::pointgroup::classify::{PointGroupHypothesis, SymmetryClassification};
use crate::pointgroup::{AxisDescriptor, PointGroupKind, RequestedSymmetry};

#[cfg(test)]
#[path = "recommend_tests.rs"]
mod recommend_tests;

// ================
// Enum definitions
// ================

/// The outcome of the recommendation stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SymmetryRecommendation {
    /// A symmetry was found.
    Found {
        /// The recommended point group.
        kind: PointGroupKind,

        /// The reported axes: the single axis of $`\mathcal{C}_n`$, the principal axis followed
        /// by the perpendicular twofold axis of $`\mathcal{D}_n`$, or every axis of a polyhedral
        /// group.
        axes: Vec<AxisDescriptor>,

        /// The score of the chosen hypothesis.
        score: f64,

        /// The index of the chosen hypothesis in [`SymmetryClassification::hypotheses`].
        hypothesis: usize,
    },

    /// No symmetry, or no symmetry consistent with the request, was found.
    NotFound {
        /// The request that could not be satisfied, if any.
        requested: Option<RequestedSymmetry>,

        /// A description of why nothing was recommended.
        reason: String,
    },
}

impl SymmetryRecommendation {
    /// Returns the recommended point group, if any.
    #[must_use]
    pub fn kind(&self) -> Option<PointGroupKind> {
        match self {
            Self::Found { kind, .. } => Some(*kind),
            Self::NotFound { .. } => None,
        }
    }

    /// Returns the reported axes, which are empty if nothing was found.
    #[must_use]
    pub fn axes(&self) -> &[AxisDescriptor] {
        match self {
            Self::Found { axes, .. } => axes,
            Self::NotFound { .. } => &[],
        }
    }

    /// Returns the one-letter type tag, or an empty string if nothing was found.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        self.kind().map_or("", |kind| kind.type_tag())
    }

    /// Returns the recommended folds: $`[n]`$ for $`\mathcal{C}_n`$, $`[n, 2]`$ for
    /// $`\mathcal{D}_n`$, and empty for the polyhedral groups or if nothing was found.
    #[must_use]
    pub fn folds(&self) -> Vec<u32> {
        match self.kind() {
            Some(kind @ (PointGroupKind::Cyclic(_) | PointGroupKind::Dihedral(_))) => kind.folds(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for SymmetryRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { kind, axes, score, .. } => {
                writeln!(f, "Recommended symmetry: {kind} (score {score:.4})")?;
                writeln!(f, "{}", "┈".repeat(58))?;
                writeln!(
                    f,
                    "{:>4} {:>9} {:>9} {:>9} {:>9} {:>8} {:>9}",
                    "Fold", "x", "y", "z", "Angle", "Height", "Status"
                )?;
                writeln!(f, "{}", "┈".repeat(58))?;
                for axis in axes {
                    writeln!(f, "{axis}")?;
                }
                writeln!(f, "{}", "┈".repeat(58))?;
            }
            Self::NotFound { requested, reason } => {
                if let Some(requested) = requested {
                    writeln!(f, "Requested symmetry {requested} not found: {reason}")?;
                } else {
                    writeln!(f, "No symmetry found: {reason}")?;
                }
            }
        }
        Ok(())
    }
}

// =========
// Functions
// =========

/// Selects the axes reported for a hypothesis.
fn reported_axes(hypothesis: &PointGroupHypothesis) -> Vec<AxisDescriptor> {
    match hypothesis.kind {
        PointGroupKind::Cyclic(_) => hypothesis.axes.iter().take(1).cloned().collect(),
        PointGroupKind::Dihedral(n) => {
            // The principal axis comes first; for D2 any of the three twofold axes may serve.
            let principal = hypothesis.axes.iter().find(|a| a.fold == n);
            let secondary = principal.and_then(|p| {
                hypothesis
                    .axes
                    .iter()
                    .find(|a| a.fold == 2 && !std::ptr::eq(*a, p))
            });
            principal.into_iter().chain(secondary).cloned().collect()
        }
        PointGroupKind::Tetrahedral | PointGroupKind::Octahedral | PointGroupKind::Icosahedral => {
            hypothesis.axes.clone()
        }
    }
}

/// Recommends a symmetry from the accepted hypotheses of a classification.
///
/// Among the accepted hypotheses, restricted to those satisfying `requested` if given, the best
/// score $`s^*`$ is found. Every hypothesis scoring at least $`s^* - \tau`$ is eligible, and the
/// eligible one of largest group order is chosen, with ties broken by the higher score and then
/// by position.
///
/// # Arguments
///
/// * `classification` - The classification to choose from.
/// * `requested` - The requested symmetry, if any.
/// * `peak_height_tolerance` - The score tolerance $`\tau`$.
///
/// # Returns
///
/// The recommendation. If nothing can be recommended, a warning is logged and
/// [`SymmetryRecommendation::NotFound`] is returned.
#[must_use]
pub fn recommend(
    classification: &SymmetryClassification,
    requested: Option<&RequestedSymmetry>,
    peak_height_tolerance: f64,
) -> SymmetryRecommendation {
    let eligible: Vec<(usize, &PointGroupHypothesis)> = classification
        .hypotheses
        .iter()
        .enumerate()
        .filter(|(_, h)| h.accepted && requested.map_or(true, |r| r.matches(&h.kind)))
        .collect();
    let best_score = eligible
        .iter()
        .map(|(_, h)| h.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let chosen = eligible
        .iter()
        .filter(|(_, h)| h.score >= best_score - peak_height_tolerance)
        .fold(None, |best: Option<&(usize, &PointGroupHypothesis)>, candidate| {
            match best {
                Some(current)
                    if (current.1.kind.order(), current.1.score)
                        >= (candidate.1.kind.order(), candidate.1.score) =>
                {
                    Some(current)
                }
                _ => Some(candidate),
            }
        });

    match chosen {
        Some(&(index, hypothesis)) => {
            log::debug!(
                "Recommending {} from {} eligible hypothesis/hypotheses.",
                hypothesis.kind,
                eligible.len()
            );
            SymmetryRecommendation::Found {
                kind: hypothesis.kind,
                axes: reported_axes(hypothesis),
                score: hypothesis.score,
                hypothesis: index,
            }
        }
        None => {
            let reason = if let Some(requested) = requested {
                format!(
                    "none of the {} accepted hypothesis/hypotheses is of symmetry {requested}",
                    classification.accepted().count()
                )
            } else {
                "no point-group hypothesis was accepted".to_string()
            };
            mapsym_warn!(
                "[{WS_SYMMETRY_NOT_FOUND}] Failed to detect {}: {reason}. Consider checking that \
                 the map is centred on its symmetry centre, lowering the resolution, or relaxing \
                 the peak and missing-axis thresholds.",
                requested.map_or("any symmetry".to_string(), |r| format!("the requested {r}"))
            );
            SymmetryRecommendation::NotFound {
                requested: requested.copied(),
                reason,
            }
        }
    }
}
