//! Rotational point groups of biological assemblies and the axes that characterise them.
//!
//! Only the finite proper point groups $`\mathcal{C}_n`$, $`\mathcal{D}_n`$, $`\mathcal{T}`$,
//! $`\mathcal{O}`$ and $`\mathcal{I}`$ are considered.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{MapSymError, ES_INVALID_REQUESTED_FOLD, ES_INVALID_REQUESTED_SYMMETRY};

pub mod classify;
pub mod group_elements;
pub mod recommend;


// ================
// Enum definitions
// ================

/// An enumerated type for the families of rotational point groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymmetryType {
    /// Cyclic groups $`\mathcal{C}_n`$.
    Cyclic,

    /// Dihedral groups $`\mathcal{D}_n`$.
    Dihedral,

    /// The tetrahedral group $`\mathcal{T}`$.
    Tetrahedral,

    /// The octahedral group $`\mathcal{O}`$.
    Octahedral,

    /// The icosahedral group $`\mathcal{I}`$.
    Icosahedral,
}

impl SymmetryType {
    /// Parses a one-letter type tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "C" => Some(Self::Cyclic),
            "D" => Some(Self::Dihedral),
            "T" => Some(Self::Tetrahedral),
            "O" => Some(Self::Octahedral),
            "I" => Some(Self::Icosahedral),
            _ => None,
        }
    }

    /// Returns the one-letter type tag.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Cyclic => "C",
            Self::Dihedral => "D",
            Self::Tetrahedral => "T",
            Self::Octahedral => "O",
            Self::Icosahedral => "I",
        }
    }

    /// Checks if groups of this type carry a variable fold.
    #[must_use]
    pub fn has_fold(&self) -> bool {
        matches!(self, Self::Cyclic | Self::Dihedral)
    }
}

/// An enumerated type for a concrete rotational point group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointGroupKind {
    /// $`\mathcal{C}_n`$.
    Cyclic(u32),

    /// $`\mathcal{D}_n`$.
    Dihedral(u32),

    /// $`\mathcal{T}`$.
    Tetrahedral,

    /// $`\mathcal{O}`$.
    Octahedral,

    /// $`\mathcal{I}`$.
    Icosahedral,
}

impl PointGroupKind {
    /// Returns the family of this group.
    #[must_use]
    pub fn symmetry_type(&self) -> SymmetryType {
        match self {
            Self::Cyclic(_) => SymmetryType::Cyclic,
            Self::Dihedral(_) => SymmetryType::Dihedral,
            Self::Tetrahedral => SymmetryType::Tetrahedral,
            Self::Octahedral => SymmetryType::Octahedral,
            Self::Icosahedral => SymmetryType::Icosahedral,
        }
    }

    /// Returns the one-letter type tag.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        self.symmetry_type().tag()
    }

    /// Returns the principal fold, which is zero for the polyhedral groups.
    #[must_use]
    pub fn fold(&self) -> u32 {
        match self {
            Self::Cyclic(n) | Self::Dihedral(n) => *n,
            _ => 0,
        }
    }

    /// Returns the fold descriptor: $`[n]`$ for $`\mathcal{C}_n`$, $`[n, 2]`$ for
    /// $`\mathcal{D}_n`$, and the folds of the generating axes for the polyhedral groups.
    #[must_use]
    pub fn folds(&self) -> Vec<u32> {
        match self {
            Self::Cyclic(n) => vec![*n],
            Self::Dihedral(n) => vec![*n, 2],
            Self::Tetrahedral => vec![3, 3],
            Self::Octahedral => vec![4, 3],
            Self::Icosahedral => vec![5, 3],
        }
    }

    /// Returns the number of elements of the group.
    #[must_use]
    pub fn order(&self) -> usize {
        match self {
            Self::Cyclic(n) => *n as usize,
            Self::Dihedral(n) => 2 * (*n as usize),
            Self::Tetrahedral => 12,
            Self::Octahedral => 24,
            Self::Icosahedral => 60,
        }
    }
}

impl fmt::Display for PointGroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cyclic(n) => write!(f, "C{n}"),
            Self::Dihedral(n) => write!(f, "D{n}"),
            Self::Tetrahedral => write!(f, "T"),
            Self::Octahedral => write!(f, "O"),
            Self::Icosahedral => write!(f, "I"),
        }
    }
}

// ==================
// Struct definitions
// ==================

/// A symmetry requested by the caller, to be verified rather than searched for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedSymmetry {
    /// The requested family.
    pub symmetry_type: SymmetryType,

    /// The requested fold, or `0` to accept any fold.
    pub fold: u32,
}

impl RequestedSymmetry {
    /// Interprets a requested type tag and fold.
    ///
    /// # Arguments
    ///
    /// * `tag` - One of `C`, `D`, `T`, `O` or `I`, or an empty string if nothing is requested.
    /// * `fold` - The requested fold, `0` for none.
    ///
    /// # Returns
    ///
    /// The request, or `None` if the tag is empty.
    ///
    /// # Errors
    ///
    /// Errors if the tag is not recognised, if the fold is $`1`$, or if a fold is given for a
    /// polyhedral group.
    pub fn parse(tag: &str, fold: u32) -> Result<Option<Self>, MapSymError> {
        if tag.trim().is_empty() {
            return Ok(None);
        }
        let symmetry_type = SymmetryType::from_tag(tag).ok_or_else(|| {
            MapSymError::configuration(
                ES_INVALID_REQUESTED_SYMMETRY,
                format!(
                    "The requested symmetry `{tag}` is not one of `C`, `D`, `T`, `O` or `I`."
                ),
            )
        })?;
        if fold == 1 || (!symmetry_type.has_fold() && fold != 0) {
            return Err(MapSymError::configuration(
                ES_INVALID_REQUESTED_FOLD,
                format!(
                    "The requested fold {fold} is inconsistent with the requested symmetry `{}`.",
                    symmetry_type.tag()
                ),
            ));
        }
        Ok(Some(Self {
            symmetry_type,
            fold,
        }))
    }

    /// Checks if a point group satisfies this request.
    #[must_use]
    pub fn matches(&self, kind: &PointGroupKind) -> bool {
        kind.symmetry_type() == self.symmetry_type && (self.fold == 0 || kind.fold() == self.fold)
    }
}

impl fmt::Display for RequestedSymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fold == 0 {
            write!(f, "{} (any fold)", self.symmetry_type.tag())
        } else {
            write!(f, "{}{}", self.symmetry_type.tag(), self.fold)
        }
    }
}

/// A detected cyclic symmetry axis.
///
/// The axis is a unit vector at its standard positive pole and the height is the fold-consistent
/// value of the self-rotation function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetryAxisCandidate {
    /// The fold $`n`$ of the axis.
    pub fold: u32,

    /// The unit axis.
    pub axis: Vector3<f64>,

    /// The height of the rotation function supporting the axis.
    pub height: f64,
}

impl SymmetryAxisCandidate {
    /// Returns the rotation angle $`2\pi/n`$.
    #[must_use]
    pub fn angle(&self) -> f64 {
        2.0 * PI / f64::from(self.fold)
    }
}

impl fmt::Display for SymmetryAxisCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C{:<3} ({:+.4}, {:+.4}, {:+.4})  {:.4}",
            self.fold, self.axis[0], self.axis[1], self.axis[2], self.height
        )
    }
}

/// An axis reported for a point group, either detected or predicted from the group geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisDescriptor {
    /// The fold of the axis within the group.
    pub fold: u32,

    /// The unit axis.
    pub axis: Vector3<f64>,

    /// The rotation angle $`2\pi/n`$ in radians.
    pub angle: f64,

    /// The supporting height of the rotation function.
    pub height: f64,

    /// Whether the axis was independently detected, as opposed to predicted.
    pub detected: bool,
}

impl AxisDescriptor {
    /// Returns the descriptor as `[fold, x, y, z, angle, height]`.
    #[must_use]
    pub fn to_array(&self) -> [f64; 6] {
        [
            f64::from(self.fold),
            self.axis[0],
            self.axis[1],
            self.axis[2],
            self.angle,
            self.height,
        ]
    }
}

impl From<&SymmetryAxisCandidate> for AxisDescriptor {
    fn from(candidate: &SymmetryAxisCandidate) -> Self {
        Self {
            fold: candidate.fold,
            axis: candidate.axis,
            angle: candidate.angle(),
            height: candidate.height,
            detected: true,
        }
    }
}

impl fmt::Display for AxisDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4} {:>+9.4} {:>+9.4} {:>+9.4} {:>9.4} {:>8.4} {:>9}",
            self.fold,
            self.axis[0],
            self.axis[1],
            self.axis[2],
            self.angle,
            self.height,
            if self.detected { "detected" } else { "predicted" }
        )
    }
}
